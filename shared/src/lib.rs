//! Shared types for the campus pre-order system
//!
//! Wire-level request/response types and data models used by the server
//! and by client tooling. JSON is camelCase on the wire; Rust fields stay
//! snake_case (and double as SQLite column names under the `db` feature).

pub mod models;
pub mod request;
pub mod response;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{Account, Order, OrderDetail, OrderItem, OrderStatus, Product, Role};
pub use request::{CartItemInput, CreateOrderRequest, LoginRequest, RegisterRequest};
pub use response::{LoginResponse, OrderConfirmation, UserInfo};
