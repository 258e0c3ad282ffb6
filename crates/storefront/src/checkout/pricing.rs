//! Order totals.

use rust_decimal::Decimal;

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    /// Discounted subtotals strictly above this ship free.
    pub free_shipping_threshold: Decimal,
    /// Fee charged at or below the threshold.
    pub shipping_fee: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::from(5000),
            shipping_fee: Decimal::from(100),
        }
    }
}

impl ShippingPolicy {
    /// Shipping fee for a discounted subtotal.
    #[must_use]
    pub fn fee_for(&self, discounted_subtotal: Decimal) -> Decimal {
        if discounted_subtotal > self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }
}

/// Breakdown shown on the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// `total = max(subtotal - discount, 0) + shipping`.
    #[must_use]
    pub fn compute(subtotal: Decimal, discount: Decimal, policy: &ShippingPolicy) -> Self {
        let discounted = (subtotal - discount).max(Decimal::ZERO);
        let shipping = policy.fee_for(discounted);
        Self {
            subtotal,
            discount,
            shipping,
            total: discounted + shipping,
        }
    }
}
