//! Stock reservation before checkout.
//!
//! Every cart line is reserved one at a time, in cart order. The pipeline stops
//! at the first refusal; lines reserved before it stay held until the
//! backend's hold expires. A retry starts again from the first line.

use annya_core::{ProductId, SessionId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::api::{ReservationRequest, StorefrontApi};
use crate::cart::{CartItem, CartStore};
use crate::clock::SharedClock;
use crate::error::{CheckoutError, ValidationError, add_breadcrumb};
use crate::storage::KeyValueStore;

/// Period during which reserved stock is held for the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationWindow {
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ReservationWindow {
    /// Window of length `ttl` starting at `now`, saturating at the latest
    /// representable instant.
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            reserved_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Time left, never negative.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Countdown text such as `4:05`.
    #[must_use]
    pub fn format_remaining(&self, now: DateTime<Utc>) -> String {
        let secs = self.remaining(now).num_seconds();
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

/// The line that could not be reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationFailure {
    pub product_id: ProductId,
    pub name: String,
    pub reason: String,
}

/// Result of a reservation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// Every line is held until the window ends.
    Reserved(ReservationWindow),
    /// A line was refused; later lines were not attempted.
    Rejected(ReservationFailure),
}

impl ReservationOutcome {
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved(_))
    }

    /// Turn a rejection into a [`CheckoutError::Reservation`].
    ///
    /// # Errors
    ///
    /// Returns the rejection as an error.
    pub fn into_result(self) -> Result<ReservationWindow, CheckoutError> {
        match self {
            Self::Reserved(window) => Ok(window),
            Self::Rejected(failure) => Err(CheckoutError::Reservation(failure)),
        }
    }
}

/// Runs the sequential reservation pipeline.
#[derive(Clone)]
pub struct ReservationCoordinator<A> {
    api: A,
    clock: SharedClock,
    ttl: Duration,
}

impl<A: StorefrontApi> ReservationCoordinator<A> {
    #[must_use]
    pub fn new(api: A, clock: SharedClock, ttl: Duration) -> Self {
        Self { api, clock, ttl }
    }

    /// Reserve every line of a hydrated cart.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CartNotLoaded`] before hydration and
    /// [`ValidationError::EmptyCart`] for an empty cart. No request is made in
    /// either case.
    pub async fn reserve_cart<S: KeyValueStore>(
        &self,
        cart: &CartStore<S>,
    ) -> Result<ReservationOutcome, ValidationError> {
        let session_id = cart.session_id().ok_or(ValidationError::CartNotLoaded)?;
        self.reserve_all(cart.items(), session_id).await
    }

    /// Reserve `items` in order, stopping at the first refusal.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCart`] when `items` is empty.
    #[instrument(skip_all, fields(session_id = %session_id, items = items.len()))]
    pub async fn reserve_all(
        &self,
        items: &[CartItem],
        session_id: &SessionId,
    ) -> Result<ReservationOutcome, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyCart);
        }

        for item in items {
            let request = ReservationRequest {
                product_id: item.id.clone(),
                session_id: session_id.clone(),
            };

            if let Err(e) = self.api.reserve(&request).await {
                let reason = e
                    .detail()
                    .map_or_else(|| "Please try again".to_string(), str::to_string);
                warn!(
                    product_id = %item.id,
                    error = %e,
                    "Reservation refused, stopping"
                );
                return Ok(ReservationOutcome::Rejected(ReservationFailure {
                    product_id: item.id.clone(),
                    name: item.name.clone(),
                    reason,
                }));
            }
        }

        let window = ReservationWindow::starting_at(self.clock.now(), self.ttl);
        info!(expires_at = %window.expires_at, "Cart reserved");
        add_breadcrumb("checkout", "Cart reserved", None);
        Ok(ReservationOutcome::Reserved(window))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::CartProduct;
    use crate::clock::FixedClock;
    use crate::mocks::MockApi;
    use crate::storage::MemoryStore;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn coordinator(api: MockApi) -> ReservationCoordinator<MockApi> {
        ReservationCoordinator::new(
            api,
            Arc::new(FixedClock::new(start())),
            Duration::minutes(5),
        )
    }

    fn cart(ids: &[&str]) -> CartStore<MemoryStore> {
        let mut cart = CartStore::open(MemoryStore::new().with_entry("sessionId", "s-1"));
        for id in ids {
            cart.add_to_cart(
                CartProduct {
                    id: ProductId::new(*id),
                    name: format!("Item {id}"),
                    price: Decimal::from(100),
                    category: None,
                    image: None,
                },
                1,
            );
        }
        cart
    }

    #[tokio::test]
    async fn test_reserves_every_item_in_order() {
        let api = MockApi::new();
        let outcome = coordinator(api.clone())
            .reserve_cart(&cart(&["a", "b", "c"]))
            .await
            .unwrap();

        let ReservationOutcome::Reserved(window) = outcome else {
            panic!("expected reservation");
        };
        assert_eq!(window.expires_at, start() + Duration::minutes(5));

        let calls = api.reservations();
        let ids: Vec<_> = calls.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(calls.iter().all(|r| r.session_id.as_str() == "s-1"));
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let api = MockApi::new().with_reservation_failure("b", "Only 0 left in stock");
        let outcome = coordinator(api.clone())
            .reserve_cart(&cart(&["a", "b", "c"]))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReservationOutcome::Rejected(ReservationFailure {
                product_id: ProductId::new("b"),
                name: "Item b".to_string(),
                reason: "Only 0 left in stock".to_string(),
            })
        );
        let ids: Vec<_> = api
            .reservations()
            .iter()
            .map(|r| r.product_id.as_str().to_string())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_cart_makes_no_calls() {
        let api = MockApi::new();
        let err = coordinator(api.clone())
            .reserve_cart(&cart(&[]))
            .await
            .unwrap_err();

        assert!(matches!(err, ValidationError::EmptyCart));
        assert!(api.reservations().is_empty());
    }

    #[tokio::test]
    async fn test_unhydrated_cart_is_refused() {
        let api = MockApi::new();
        let cart = CartStore::unhydrated(MemoryStore::new());
        let err = coordinator(api).reserve_cart(&cart).await.unwrap_err();
        assert!(matches!(err, ValidationError::CartNotLoaded));
    }

    #[tokio::test]
    async fn test_rejection_converts_to_checkout_error() {
        let api = MockApi::new().with_reservation_failure("a", "Held by another shopper");
        let err = coordinator(api)
            .reserve_cart(&cart(&["a"]))
            .await
            .unwrap()
            .into_result()
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            "Could not reserve Item a: Held by another shopper"
        );
    }

    #[test]
    fn test_window_countdown() {
        let window = ReservationWindow::starting_at(start(), Duration::minutes(5));

        assert_eq!(window.format_remaining(start()), "5:00");
        assert_eq!(
            window.format_remaining(start() + Duration::seconds(55)),
            "4:05"
        );
        assert!(!window.is_expired(start() + Duration::seconds(299)));

        let later = start() + Duration::minutes(6);
        assert!(window.is_expired(later));
        assert_eq!(window.remaining(later), Duration::zero());
        assert_eq!(window.format_remaining(later), "0:00");
    }

    #[test]
    fn test_oversized_ttl_saturates() {
        let window = ReservationWindow::starting_at(start(), Duration::days(10_000_000_000));
        assert_eq!(window.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!window.is_expired(start()));
    }
}
