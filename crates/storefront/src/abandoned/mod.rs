//! Abandoned-cart tracking.
//!
//! While the shopper types their email at checkout, a snapshot of the cart is
//! sent to the backend once typing pauses, so a reminder can be mailed if the
//! order is never placed. Everything here is best-effort: failures are logged
//! and never reach the shopper.

mod debounce;

pub use debounce::Debouncer;

use std::time::Duration;

use annya_core::looks_like_email;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::api::{AbandonedCartSnapshot, ConvertRequest, SnapshotItem, StorefrontApi};
use crate::cart::CartStore;
use crate::checkout::ShippingForm;
use crate::storage::KeyValueStore;

/// Debounced abandoned-cart snapshots and the conversion signal.
#[derive(Debug)]
pub struct AbandonedCartTracker<A> {
    api: A,
    debouncer: Debouncer,
}

impl<A: StorefrontApi> AbandonedCartTracker<A> {
    #[must_use]
    pub const fn new(api: A, quiet: Duration) -> Self {
        Self {
            api,
            debouncer: Debouncer::new(quiet),
        }
    }

    /// React to an edit of the email field.
    ///
    /// Schedules a save when the value contains `@` and the cart has items,
    /// replacing any save still waiting. Returns whether a save was scheduled.
    pub fn on_email_input<S: KeyValueStore>(
        &mut self,
        email: &str,
        cart: &CartStore<S>,
        form: &ShippingForm,
    ) -> bool {
        let email = email.trim();
        if !looks_like_email(email) || cart.is_empty() {
            return false;
        }
        let Some(snapshot) = snapshot(email, cart, form) else {
            return false;
        };

        let api = self.api.clone();
        self.debouncer.schedule(async move {
            match api.save_cart(&snapshot).await {
                Ok(()) => debug!(items = snapshot.items.len(), "Abandoned cart saved"),
                Err(e) => warn!(error = %e, "Abandoned cart save failed (non-critical)"),
            }
        });
        true
    }

    /// Drop a save that is still waiting. Returns whether one was waiting.
    pub fn cancel_pending(&mut self) -> bool {
        let cancelled = self.debouncer.cancel();
        if cancelled {
            debug!("Pending abandoned cart save cancelled");
        }
        cancelled
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Tell the backend the cart for `email` turned into an order.
    ///
    /// Failures are logged and ignored.
    #[instrument(skip(self))]
    pub async fn mark_converted(&self, email: &str) {
        let request = ConvertRequest {
            email: email.to_string(),
        };
        if let Err(e) = self.api.convert_cart(&request).await {
            warn!(error = %e, "Cart conversion tracking failed (non-critical)");
        }
    }
}

/// Point-in-time copy of the cart and contact details.
fn snapshot<S: KeyValueStore>(
    email: &str,
    cart: &CartStore<S>,
    form: &ShippingForm,
) -> Option<AbandonedCartSnapshot> {
    let session_id = cart.session_id()?.clone();
    let items = cart
        .items()
        .iter()
        .map(|item| SnapshotItem {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
        })
        .collect();

    Some(AbandonedCartSnapshot {
        email: email.to_string(),
        customer_name: form.customer_name(),
        phone: form.phone(),
        items,
        cart_total: (cart.cart_total() - cart.discount()).max(Decimal::ZERO),
        session_id,
    })
}
