//! Data models
//!
//! Shared between canteen-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod account;
pub mod order;
pub mod product;

// Re-exports
pub use account::*;
pub use order::*;
pub use product::*;
