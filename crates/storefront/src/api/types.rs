//! Request and response bodies for the storefront backend.
//!
//! Field names follow the backend's JSON contract, which mixes snake_case
//! (cart endpoints) and camelCase (coupon and order endpoints).

use annya_core::{IdempotencyKey, OrderId, ProductId, SessionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `POST /cart/reserve` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub product_id: ProductId,
    pub session_id: SessionId,
}

/// `POST /coupons/verify` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponRequest {
    pub code: String,
    #[serde(rename = "orderTotal", with = "rust_decimal::serde::float")]
    pub order_total: Decimal,
}

/// Payment methods offered at checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Delivery address attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub phone: String,
}

/// `POST /orders` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub session_id: SessionId,
    pub idempotency_key: IdempotencyKey,
}

/// Successful `POST /orders` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    /// Optional flag; only an explicit `false` marks a refusal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub order_id: OrderId,
    pub order_number: String,
}

impl OrderReceipt {
    /// Whether the backend accepted the order. A 2xx body without a
    /// `success` field counts as accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        !matches!(self.success, Some(false))
    }
}

/// Line inside an abandoned-cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
}

/// `POST /cart/save` body: a point-in-time copy of the cart and contact details.
///
/// Absent contact fields are sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonedCartSnapshot {
    pub email: String,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub items: Vec<SnapshotItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub cart_total: Decimal,
    pub session_id: SessionId,
}

/// `POST /cart/convert` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub email: String,
}

/// Error body returned with non-2xx responses.
///
/// `detail` is usually a string but validation failures carry a list.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub(crate) fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Null => None,
            serde_json::Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }
}
