//! Cart value types.

use annya_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog product as handed to the cart by a product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A line in the cart.
///
/// Stored quantities are always at least one; a line whose quantity would
/// drop to zero is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    /// Build a line from a product and a quantity.
    #[must_use]
    pub fn from_product(product: CartProduct, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            quantity,
            category: product.category,
            image: product.image,
        }
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A server-validated discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    #[serde(rename = "discountAmount", with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    /// Discount kind reported by the server (`percent` or `fixed`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Decimal>,
}

impl Coupon {
    /// Create a coupon with just a code and an amount.
    #[must_use]
    pub fn new(code: impl Into<String>, discount_amount: Decimal) -> Self {
        Self {
            code: code.into(),
            discount_amount,
            description: None,
            kind: None,
            value: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_item_reads_browser_shape() {
        // Extra product fields from the catalog are ignored
        let json = r#"{"id":"p1","name":"Solitaire Ring","price":1000,"quantity":2,
                       "category":"Rings","image":"/img/p1.jpg","inStock":true}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id.as_str(), "p1");
        assert_eq!(item.price, Decimal::from(1000));
        assert_eq!(item.line_total(), Decimal::from(2000));
    }

    #[test]
    fn test_cart_item_tolerates_missing_optional_fields() {
        let json = r#"{"id":"p1","name":"Ring","price":99.5,"quantity":1}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.price, Decimal::new(995, 1));
        assert_eq!(item.category, None);
        assert_eq!(item.image, None);
    }

    #[test]
    fn test_coupon_uses_server_field_names() {
        let json = r#"{"code":"FESTIVE","type":"percent","value":10.0,
                       "discountAmount":200.0,"description":"10% off"}"#;
        let coupon: Coupon = serde_json::from_str(json).unwrap();
        assert_eq!(coupon.discount_amount, Decimal::from(200));
        assert_eq!(coupon.kind.as_deref(), Some("percent"));

        let back = serde_json::to_value(&coupon).unwrap();
        assert_eq!(back["discountAmount"], serde_json::json!(200.0));
    }

    #[test]
    fn test_coupon_accepts_null_description() {
        let json = r#"{"code":"X","discountAmount":50,"description":null}"#;
        let coupon: Coupon = serde_json::from_str(json).unwrap();
        assert_eq!(coupon.description, None);
        assert_eq!(coupon.value, None);
    }
}
