//! Coupon commands.

use annya_storefront::AppState;
use tracing::info;

use super::inr;

/// Verify a coupon against the cart subtotal and apply it.
///
/// # Errors
///
/// Returns an error if the state file cannot be opened or the coupon is
/// refused.
pub async fn apply(state: &AppState, code: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = state.open_storefront()?;
    let coupon = store.apply_coupon(code).await?;

    info!(
        "Coupon {} applied: -{}, total now {}",
        coupon.code,
        inr(coupon.discount_amount),
        inr(store.discounted_total())
    );
    Ok(())
}

/// Remove the applied coupon.
///
/// # Errors
///
/// Returns an error if the state file cannot be opened.
pub fn remove(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = state.open_storefront()?;
    match store.cart().coupon().map(|c| c.code.clone()) {
        Some(code) => {
            store.cart_mut().remove_coupon();
            info!("Coupon {code} removed");
        }
        None => info!("No coupon applied"),
    }
    Ok(())
}
