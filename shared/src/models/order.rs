//! Order Model
//!
//! An order is a header row plus one or more line items, written together at
//! creation. Line items snapshot the product name, unit price, and vendor at
//! order time, so history stays accurate when the catalog changes later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `ordered → ready → collected`, strictly forward; `collected` is terminal.
/// Transitions are triggered by provider/staff action, never automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    Ordered,
    Ready,
    Collected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Ordered => "ordered",
            OrderStatus::Ready => "ready",
            OrderStatus::Collected => "collected",
        }
    }

    /// Whether moving from `self` to `next` is a legal forward step.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Ordered, OrderStatus::Ready)
                | (OrderStatus::Ordered, OrderStatus::Collected)
                | (OrderStatus::Ready, OrderStatus::Collected)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order header entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub account_id: i64,
    pub total_price: f64,
    /// Unique 6-char A–Z0–9 token presented at pickup
    pub pickup_code: String,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub pickup_date: DateTime<Utc>,
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    /// Product name at order time
    pub product_name: String,
    /// Unit price at order time
    pub unit_price: f64,
    /// Vendor name at order time
    pub provider: String,
    pub quantity: i64,
}

/// Order header with its line items attached (the shape `GET /api/orders`
/// returns)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: i64,
    pub account_id: i64,
    pub total_price: f64,
    pub pickup_code: String,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub pickup_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    pub fn from_parts(header: Order, items: Vec<OrderItem>) -> Self {
        Self {
            id: header.id,
            account_id: header.account_id,
            total_price: header.total_price,
            pickup_code: header.pickup_code,
            status: header.status,
            order_date: header.order_date,
            pickup_date: header.pickup_date,
            items,
        }
    }
}
