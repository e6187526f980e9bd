//! Request types
//!
//! JSON bodies accepted by the API, camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::models::{OrderStatus, Role};

/// Registration payload
///
/// `role` defaults to student; vendors register with `"role": "provider"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// One cart line as submitted by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: i64,
    pub quantity: i64,
}

/// Order creation payload
///
/// `total_price` is the client's own computation. The server recomputes the
/// total from catalog prices and treats this value as advisory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CartItemInput>,
    #[serde(default)]
    pub total_price: Option<f64>,
}

/// Status transition payload for `PATCH /api/orders/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
