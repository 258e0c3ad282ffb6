//! Cart line commands.

use annya_core::ProductId;
use annya_storefront::AppState;
use annya_storefront::cart::CartProduct;
use rust_decimal::Decimal;
use tracing::info;

use super::log_cart;

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error if the state file cannot be opened.
pub fn add(
    state: &AppState,
    id: String,
    name: String,
    price: Decimal,
    quantity: u32,
    category: Option<String>,
    image: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative".into());
    }

    let mut store = state.open_storefront()?;
    store.cart_mut().add_to_cart(
        CartProduct {
            id: ProductId::new(id),
            name,
            price,
            category,
            image,
        },
        quantity,
    );

    info!("Added to cart");
    log_cart(store.cart());
    Ok(())
}

/// Remove a line from the cart.
///
/// # Errors
///
/// Returns an error if the state file cannot be opened.
pub fn remove(state: &AppState, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = state.open_storefront()?;
    let id = ProductId::new(id);
    if !store.cart().is_in_cart(&id) {
        return Err(format!("{id} is not in the cart").into());
    }

    store.cart_mut().remove_from_cart(&id);
    log_cart(store.cart());
    Ok(())
}

/// Set a line's quantity; anything below 1 removes the line.
///
/// # Errors
///
/// Returns an error if the state file cannot be opened.
pub fn set_quantity(
    state: &AppState,
    id: &str,
    quantity: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = state.open_storefront()?;
    store
        .cart_mut()
        .update_quantity(&ProductId::new(id), quantity);
    log_cart(store.cart());
    Ok(())
}

/// Show the cart.
///
/// # Errors
///
/// Returns an error if the state file cannot be opened.
pub fn show(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let store = state.open_storefront()?;
    log_cart(store.cart());
    if store.cart().coupon().is_some() {
        info!(
            "Total after coupon: {}",
            super::inr(store.discounted_total())
        );
    }
    Ok(())
}

/// Empty the cart and drop the coupon.
///
/// # Errors
///
/// Returns an error if the state file cannot be opened.
pub fn clear(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = state.open_storefront()?;
    store.cart_mut().clear_cart();
    info!("Cart cleared");
    Ok(())
}
