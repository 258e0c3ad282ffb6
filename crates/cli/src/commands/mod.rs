//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod coupon;

use annya_core::Price;
use annya_storefront::cart::CartStore;
use annya_storefront::storage::KeyValueStore;
use rust_decimal::Decimal;
use tracing::info;

fn inr(amount: Decimal) -> String {
    Price::inr(amount).display()
}

/// Log every cart line plus the totals.
fn log_cart<S: KeyValueStore>(cart: &CartStore<S>) {
    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }

    for item in cart.items() {
        info!(
            "  {} x{} {} ({})",
            item.id,
            item.quantity,
            item.name,
            inr(item.line_total())
        );
    }
    if let Some(coupon) = cart.coupon() {
        info!("  Coupon {}: -{}", coupon.code, inr(cart.discount()));
    }
    info!(
        "{} item(s), subtotal {}",
        cart.cart_count(),
        inr(cart.cart_total())
    );
}
