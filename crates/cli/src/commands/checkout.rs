//! Reservation and checkout commands.

use annya_storefront::checkout::FormField;
use annya_storefront::reservation::ReservationOutcome;
use annya_storefront::{AppState, CheckoutError};
use clap::Args;
use secrecy::SecretString;
use tracing::{info, warn};

use super::{inr, log_cart};

/// Shipping details and options for `annya checkout`.
///
/// Fields left out keep their pre-filled or default values.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    city: Option<String>,
    /// PIN code
    #[arg(long)]
    postal_code: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    country: Option<String>,

    /// Coupon to apply before submitting
    #[arg(long)]
    coupon: Option<String>,

    /// Bearer credential for placing the order
    #[arg(long, env = "ANNYA_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Skip the reservation pass
    #[arg(long)]
    no_reserve: bool,
}

impl CheckoutArgs {
    fn fields(&self) -> impl Iterator<Item = (FormField, &str)> {
        [
            (FormField::Email, &self.email),
            (FormField::Phone, &self.phone),
            (FormField::FirstName, &self.first_name),
            (FormField::LastName, &self.last_name),
            (FormField::Address, &self.address),
            (FormField::City, &self.city),
            (FormField::PostalCode, &self.postal_code),
            (FormField::State, &self.state),
            (FormField::Country, &self.country),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
    }
}

/// Reserve stock for every cart line.
///
/// # Errors
///
/// Returns an error for an empty cart or when a line cannot be reserved.
pub async fn reserve(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let store = state.open_storefront()?;
    let outcome = store.reserve().await?;

    if let ReservationOutcome::Reserved(window) = &outcome {
        info!(
            "Reserved {} item(s) for {}",
            store.cart().items().len(),
            window.format_remaining(store.clock().now())
        );
    }
    outcome.into_result()?;
    Ok(())
}

/// Reserve the cart, fill in the shipping form and submit the order.
///
/// # Errors
///
/// Returns a [`CheckoutError`] when the order cannot be placed.
pub async fn run(state: &AppState, args: CheckoutArgs) -> Result<(), Box<dyn std::error::Error>> {
    let token = args
        .token
        .clone()
        .map(SecretString::from)
        .or_else(|| state.config().api.token.clone());

    let mut store = state.open_storefront()?;
    log_cart(store.cart());

    let mut session = if args.no_reserve {
        store.checkout(None)?
    } else {
        store.proceed_to_checkout().await?
    };

    for (field, value) in args.fields() {
        session.set_field(field, value);
    }

    if let Some(code) = &args.coupon {
        match session.apply_coupon(code).await {
            Ok(coupon) => info!("Coupon {} applied", coupon.code),
            Err(e @ CheckoutError::Coupon(_)) => warn!("{}", e.user_message()),
            Err(e) => return Err(e.into()),
        }
    }

    let summary = session.summary();
    info!("Subtotal: {}", inr(summary.subtotal));
    if !summary.discount.is_zero() {
        info!("Discount: -{}", inr(summary.discount));
    }
    if summary.shipping.is_zero() {
        info!("Shipping: Free");
    } else {
        info!("Shipping: {}", inr(summary.shipping));
    }
    info!("Total: {}", inr(summary.total));
    if let Some(left) = session.time_left() {
        info!("Items reserved for {left}");
    }

    let receipt = session.submit_order(token.as_ref()).await?;
    info!(
        order_id = %receipt.order_id,
        "Order {} placed, pay on delivery",
        receipt.order_number
    );
    Ok(())
}
