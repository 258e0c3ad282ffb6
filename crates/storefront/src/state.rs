//! Storefront state: the hydrated cart plus everything that acts on it.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::api::{ApiClient, StorefrontApi};
use crate::cart::{CartStore, Coupon};
use crate::checkout::CheckoutSession;
use crate::clock::{SharedClock, SystemClock};
use crate::config::{CheckoutConfig, StorefrontConfig};
use crate::coupons::CouponValidator;
use crate::error::{CheckoutError, ValidationError};
use crate::reservation::{ReservationCoordinator, ReservationOutcome, ReservationWindow};
use crate::storage::{FileStore, KeyValueStore};

/// Cart owner and entry point for the cart page and checkout flows.
pub struct Storefront<S, A> {
    cart: CartStore<S>,
    api: A,
    config: CheckoutConfig,
    clock: SharedClock,
}

impl<S: KeyValueStore, A: StorefrontApi> Storefront<S, A> {
    /// Hydrate the cart from `storage`.
    #[must_use]
    pub fn open(storage: S, api: A, config: CheckoutConfig, clock: SharedClock) -> Self {
        Self {
            cart: CartStore::open(storage),
            api,
            config,
            clock,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<S> {
        &mut self.cart
    }

    #[must_use]
    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Verify a coupon code against the cart subtotal and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Coupon`]; the existing coupon is kept.
    pub async fn apply_coupon(&mut self, code: &str) -> Result<Coupon, CheckoutError> {
        let coupon = CouponValidator::new(self.api.clone())
            .apply(&mut self.cart, code)
            .await?;
        Ok(coupon)
    }

    /// Run the reservation pass for every cart line.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty cart.
    pub async fn reserve(&self) -> Result<ReservationOutcome, ValidationError> {
        ReservationCoordinator::new(
            self.api.clone(),
            Arc::clone(&self.clock),
            self.config.reservation_ttl,
        )
        .reserve_cart(&self.cart)
        .await
    }

    /// Reserve the cart and open a checkout session on success.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or [`CheckoutError::Reservation`] naming the
    /// line that could not be reserved.
    pub async fn proceed_to_checkout(
        &mut self,
    ) -> Result<CheckoutSession<'_, S, A>, CheckoutError> {
        let window = self.reserve().await?.into_result()?;
        self.checkout(Some(window))
    }

    /// Open a checkout session, optionally bound to a reservation window.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unloaded or empty cart.
    pub fn checkout(
        &mut self,
        reservation: Option<ReservationWindow>,
    ) -> Result<CheckoutSession<'_, S, A>, CheckoutError> {
        CheckoutSession::mount(
            &mut self.cart,
            self.api.clone(),
            self.config.clone(),
            Arc::clone(&self.clock),
            reservation,
        )
    }

    /// Subtotal after the coupon, floored at zero.
    #[must_use]
    pub fn discounted_total(&self) -> Decimal {
        (self.cart.cart_total() - self.cart.discount()).max(Decimal::ZERO)
    }
}

/// Process-wide state built from [`StorefrontConfig`].
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
}

impl AppState {
    /// Create the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, crate::api::ApiError> {
        let api = ApiClient::new(&config.api)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, api }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Open the storefront over the file store in the configured state directory.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Storage`] if the state file cannot be opened.
    pub fn open_storefront(&self) -> Result<Storefront<FileStore, ApiClient>, CheckoutError> {
        let storage = FileStore::open(&self.inner.config.state_dir)?;
        Ok(Storefront::open(
            storage,
            self.inner.api.clone(),
            self.inner.config.checkout.clone(),
            Arc::new(SystemClock),
        ))
    }
}
