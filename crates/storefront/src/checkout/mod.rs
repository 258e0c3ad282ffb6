//! Checkout session and idempotent order submission.
//!
//! A [`CheckoutSession`] borrows the cart for its whole lifetime and holds one
//! idempotency key. Every submission attempt in the session carries that key,
//! so a retry after a timeout can never create a second order. The key is
//! discarded only once the order is accepted.
//!
//! # Lifecycle
//!
//! ```text
//! mount ──► Editing ──submit ok──► OrderPlaced
//!              ▲   │
//!              └───┘ submit error (same key on retry)
//! ```
//!
//! With [`KeyScope::Reservation`](crate::config::KeyScope) the key is also
//! persisted together with the reservation window and reused by later
//! sessions until the window ends.

mod form;
mod pricing;

pub use form::{CustomerProfile, FormField, ShippingForm};
pub use pricing::{OrderSummary, ShippingPolicy};

use annya_core::IdempotencyKey;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::abandoned::AbandonedCartTracker;
use crate::api::{ApiError, OrderLine, OrderReceipt, OrderRequest, PaymentMethod, StorefrontApi};
use crate::cart::{CartStore, Coupon};
use crate::clock::SharedClock;
use crate::config::{CheckoutConfig, ExpiryPolicy, KeyScope};
use crate::coupons::CouponValidator;
use crate::error::{CheckoutError, ValidationError, add_breadcrumb};
use crate::reservation::ReservationWindow;
use crate::storage::{KeyValueStore, keys};

/// Where a checkout session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// The shopper can edit the form and submit.
    Editing,
    /// The backend accepted the order.
    OrderPlaced(OrderReceipt),
}

/// Idempotency key persisted for the lifetime of a reservation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCheckoutKey {
    key: IdempotencyKey,
    window: ReservationWindow,
}

/// One visit to the checkout page.
pub struct CheckoutSession<'c, S, A> {
    cart: &'c mut CartStore<S>,
    api: A,
    config: CheckoutConfig,
    clock: SharedClock,
    key: Option<IdempotencyKey>,
    reservation: Option<ReservationWindow>,
    form: ShippingForm,
    tracker: AbandonedCartTracker<A>,
    state: CheckoutState,
}

impl<'c, S: KeyValueStore, A: StorefrontApi> CheckoutSession<'c, S, A> {
    /// Open a checkout session over a hydrated, non-empty cart.
    ///
    /// `reservation` is the window returned by the reservation pass that led
    /// here, if any. The form is pre-filled from a stored customer profile.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CartNotLoaded`] or
    /// [`ValidationError::EmptyCart`]; the caller should send the shopper back
    /// to the cart.
    pub fn mount(
        cart: &'c mut CartStore<S>,
        api: A,
        config: CheckoutConfig,
        clock: SharedClock,
        reservation: Option<ReservationWindow>,
    ) -> Result<Self, CheckoutError> {
        if !cart.is_loaded() {
            return Err(ValidationError::CartNotLoaded.into());
        }
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let (key, reservation) = match config.key_scope {
            KeyScope::View => (IdempotencyKey::mint(), reservation),
            KeyScope::Reservation => resume_key(cart, &clock, reservation),
        };

        let mut form = ShippingForm::default();
        if let Some(profile) = cart.read_entry::<CustomerProfile>(keys::USER) {
            form.prefill(&profile);
        }

        let tracker = AbandonedCartTracker::new(api.clone(), config.cart_save_debounce);

        info!(
            idempotency_key = %key,
            scope = ?config.key_scope,
            items = cart.items().len(),
            "Checkout mounted"
        );
        add_breadcrumb("checkout", "Checkout mounted", None);

        Ok(Self {
            cart,
            api,
            config,
            clock,
            key: Some(key),
            reservation,
            form,
            tracker,
            state: CheckoutState::Editing,
        })
    }

    // =========================================================================
    // Form
    // =========================================================================

    #[must_use]
    pub const fn form(&self) -> &ShippingForm {
        &self.form
    }

    /// Edit a form field. Email edits feed the abandoned-cart tracker.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        self.form.set(field, value);
        if field == FormField::Email {
            self.tracker
                .on_email_input(&self.form.email, self.cart, &self.form);
        }
    }

    // =========================================================================
    // Coupon & totals
    // =========================================================================

    /// Verify and apply a coupon code.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Coupon`] with the previous coupon left in
    /// place, or [`CheckoutError::AlreadyPlaced`].
    pub async fn apply_coupon(&mut self, code: &str) -> Result<Coupon, CheckoutError> {
        self.ensure_editing()?;
        let coupon = CouponValidator::new(self.api.clone())
            .apply(self.cart, code)
            .await?;
        Ok(coupon)
    }

    /// Clear the applied coupon.
    pub fn remove_coupon(&mut self) {
        self.cart.remove_coupon();
    }

    /// Subtotal, discount, shipping and total for the current cart.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary::compute(
            self.cart.cart_total(),
            self.cart.discount(),
            &self.config.shipping,
        )
    }

    // =========================================================================
    // State
    // =========================================================================

    #[must_use]
    pub fn cart(&self) -> &CartStore<S> {
        self.cart
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// The key attached to submissions; `None` once the order is placed.
    #[must_use]
    pub const fn idempotency_key(&self) -> Option<&IdempotencyKey> {
        self.key.as_ref()
    }

    #[must_use]
    pub const fn reservation(&self) -> Option<&ReservationWindow> {
        self.reservation.as_ref()
    }

    /// Countdown text for the reservation banner.
    #[must_use]
    pub fn time_left(&self) -> Option<String> {
        let now = self.clock.now();
        self.reservation.map(|w| w.format_remaining(now))
    }

    /// Whether a reservation window exists and has elapsed.
    #[must_use]
    pub fn is_reservation_expired(&self) -> bool {
        let now = self.clock.now();
        self.reservation.is_some_and(|w| w.is_expired(now))
    }

    /// Whether an abandoned-cart save is waiting to fire.
    #[must_use]
    pub fn has_pending_cart_save(&self) -> bool {
        self.tracker.is_pending()
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit the order with the session's idempotency key.
    ///
    /// On success the pending cart save is cancelled, the conversion signal is
    /// sent, the cart is cleared and the key is discarded. On failure the
    /// session stays editable and a retry reuses the same key.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::AlreadyPlaced`] after a successful submission
    /// - [`CheckoutError::Validation`] for an empty cart or incomplete form
    /// - [`CheckoutError::AuthenticationRequired`] without a credential, or
    ///   when the backend refuses it
    /// - [`CheckoutError::ReservationExpired`] under the enforce policy
    /// - [`CheckoutError::OrderRejected`] when the backend refuses the order
    /// - [`CheckoutError::Transient`] when the outcome is unknown
    pub async fn submit_order(
        &mut self,
        token: Option<&SecretString>,
    ) -> Result<OrderReceipt, CheckoutError> {
        self.ensure_editing()?;
        let key = self.key.clone().ok_or(CheckoutError::AlreadyPlaced)?;

        if self.cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        let (email, shipping_address) = self.form.validate()?;
        let token = token.ok_or(CheckoutError::AuthenticationRequired)?;
        self.check_reservation()?;

        let session_id = self
            .cart
            .session_id()
            .cloned()
            .ok_or(ValidationError::CartNotLoaded)?;

        let order = OrderRequest {
            items: self
                .cart
                .items()
                .iter()
                .map(|item| OrderLine {
                    product_id: item.id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            shipping_address,
            payment_method: PaymentMethod::CashOnDelivery,
            coupon_code: self.cart.coupon().map(|c| c.code.clone()),
            session_id,
            idempotency_key: key,
        };

        add_breadcrumb(
            "checkout",
            "Submitting order",
            Some(&[("idempotency_key", order.idempotency_key.as_str())]),
        );

        let receipt = match self.api.create_order(&order, token).await {
            Ok(receipt) if receipt.is_accepted() => receipt,
            Ok(receipt) => {
                warn!(order_id = %receipt.order_id, "Backend answered success: false");
                return Err(CheckoutError::OrderRejected(
                    "Failed to place order".to_string(),
                ));
            }
            Err(ApiError::Unauthorized(detail)) => {
                warn!(detail = %detail, "Order refused: credential rejected");
                return Err(CheckoutError::AuthenticationRequired);
            }
            Err(e) if e.is_transient() => return Err(CheckoutError::Transient(e).reported()),
            Err(e) => {
                warn!(error = %e, "Order rejected");
                let detail = e.detail().unwrap_or("Failed to place order").to_string();
                return Err(CheckoutError::OrderRejected(detail));
            }
        };

        self.tracker.cancel_pending();
        self.tracker.mark_converted(email.as_str()).await;
        self.cart.clear_cart();
        self.cart.remove_entry(keys::CHECKOUT_KEY);
        self.key = None;

        info!(
            order_id = %receipt.order_id,
            order_number = %receipt.order_number,
            "Order placed"
        );
        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_number", &receipt.order_number)]),
        );

        self.state = CheckoutState::OrderPlaced(receipt.clone());
        Ok(receipt)
    }

    fn ensure_editing(&self) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::Editing => Ok(()),
            CheckoutState::OrderPlaced(_) => Err(CheckoutError::AlreadyPlaced),
        }
    }

    fn check_reservation(&self) -> Result<(), CheckoutError> {
        if self.config.expiry_policy == ExpiryPolicy::Advisory {
            return Ok(());
        }
        match self.reservation {
            Some(window) if !window.is_expired(self.clock.now()) => Ok(()),
            Some(_) | None => {
                warn!("Submission refused: reservation window elapsed");
                Err(CheckoutError::ReservationExpired)
            }
        }
    }
}

/// Reuse the stored key while its window is open, else mint and store a new one.
fn resume_key<S: KeyValueStore>(
    cart: &mut CartStore<S>,
    clock: &SharedClock,
    reservation: Option<ReservationWindow>,
) -> (IdempotencyKey, Option<ReservationWindow>) {
    let now = clock.now();
    let stored = cart
        .read_entry::<StoredCheckoutKey>(keys::CHECKOUT_KEY)
        .filter(|s| !s.window.is_expired(now));

    let (key, window) = match (stored, reservation) {
        (Some(stored), fresh) => {
            debug!(idempotency_key = %stored.key, "Reusing checkout key");
            (stored.key, Some(fresh.unwrap_or(stored.window)))
        }
        (None, fresh) => (IdempotencyKey::mint(), fresh),
    };

    match window {
        Some(window) => cart.write_entry(
            keys::CHECKOUT_KEY,
            &StoredCheckoutKey {
                key: key.clone(),
                window,
            },
        ),
        None => cart.remove_entry(keys::CHECKOUT_KEY),
    }
    (key, window)
}
