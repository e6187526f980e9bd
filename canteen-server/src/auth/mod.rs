//! 认证模块
//!
//! JWT + Argon2 认证体系：
//! - [`jwt`] - 令牌签发与校验, [`CurrentUser`] 上下文
//! - [`extractor`] - axum 提取器, 处理函数按参数注入 [`CurrentUser`]
//! - [`password`] - 密码哈希与校验

pub mod extractor;
pub mod jwt;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use password::{hash_password, verify_password};
