//! Coupon verification.
//!
//! Codes are verified against the backend with the current cart subtotal. A
//! verified coupon replaces whatever coupon the cart held; any failure leaves
//! the cart's coupon untouched.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, CouponRequest, StorefrontApi};
use crate::cart::{CartStore, Coupon};
use crate::error::add_breadcrumb;
use crate::storage::KeyValueStore;

/// Errors that can occur when applying a coupon.
#[derive(Debug, Error)]
pub enum CouponError {
    /// The code is blank.
    #[error("Please enter a coupon code")]
    Empty,

    /// The backend refused the code (unknown, expired, minimum not met).
    #[error("Coupon rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached or failed.
    #[error("Coupon service unavailable: {0}")]
    Unavailable(#[source] ApiError),

    /// The backend returned a negative discount.
    #[error("Coupon returned an invalid discount")]
    InvalidDiscount,
}

impl CouponError {
    /// Text shown next to the coupon field.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Empty => "Please enter a coupon code".to_string(),
            Self::Rejected(detail) => detail.clone(),
            Self::Unavailable(_) => "Failed to apply coupon. Please try again.".to_string(),
            Self::InvalidDiscount => "Invalid coupon code".to_string(),
        }
    }
}

impl From<ApiError> for CouponError {
    fn from(err: ApiError) -> Self {
        if err.is_transient() {
            return Self::Unavailable(err);
        }
        match err.detail() {
            Some(detail) => Self::Rejected(detail.to_string()),
            None => Self::Unavailable(err),
        }
    }
}

/// Resolves coupon codes through the backend.
#[derive(Debug, Clone)]
pub struct CouponValidator<A> {
    api: A,
}

impl<A: StorefrontApi> CouponValidator<A> {
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    /// Verify a code against an order total without touching any cart.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::Empty`] for a blank code (no request is made),
    /// the backend's rejection, or [`CouponError::Unavailable`].
    #[instrument(skip(self))]
    pub async fn verify(&self, code: &str, order_total: Decimal) -> Result<Coupon, CouponError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CouponError::Empty);
        }

        let request = CouponRequest {
            code: code.to_string(),
            order_total,
        };
        let coupon = self.api.verify_coupon(&request).await?;
        if coupon.discount_amount.is_sign_negative() {
            warn!(code, amount = %coupon.discount_amount, "Backend returned negative discount");
            return Err(CouponError::InvalidDiscount);
        }
        Ok(coupon)
    }

    /// Verify a code against the cart subtotal and apply it on success.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify). The cart's existing coupon is unchanged
    /// on error.
    pub async fn apply<S: KeyValueStore>(
        &self,
        cart: &mut CartStore<S>,
        code: &str,
    ) -> Result<Coupon, CouponError> {
        let coupon = self.verify(code, cart.cart_total()).await?;

        info!(
            code = %coupon.code,
            discount = %coupon.discount_amount,
            "Coupon applied"
        );
        add_breadcrumb("cart", "Coupon applied", Some(&[("code", &coupon.code)]));

        cart.apply_coupon(coupon.clone());
        Ok(coupon)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use annya_core::ProductId;

    use super::*;
    use crate::cart::CartProduct;
    use crate::mocks::MockApi;
    use crate::storage::MemoryStore;

    fn cart_worth(amount: i64) -> CartStore<MemoryStore> {
        let mut cart = CartStore::open(MemoryStore::new());
        cart.add_to_cart(
            CartProduct {
                id: ProductId::new("p1"),
                name: "Ring".to_string(),
                price: Decimal::from(amount),
                category: None,
                image: None,
            },
            1,
        );
        cart
    }

    #[tokio::test]
    async fn test_apply_sends_subtotal_and_stores_coupon() {
        let api = MockApi::new().with_coupon(Coupon::new("SAVE200", Decimal::from(200)));
        let mut cart = cart_worth(2000);

        let coupon = CouponValidator::new(api.clone())
            .apply(&mut cart, "  SAVE200 ")
            .await
            .unwrap();

        assert_eq!(coupon.code, "SAVE200");
        assert_eq!(cart.discount(), Decimal::from(200));
        let requests = api.coupon_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].code, "SAVE200");
        assert_eq!(requests[0].order_total, Decimal::from(2000));
    }

    #[tokio::test]
    async fn test_rejection_keeps_existing_coupon() {
        let api = MockApi::new()
            .with_coupon(Coupon::new("OLD", Decimal::from(50)))
            .with_coupon_rejection("EXPIRED", 400, "Coupon has expired");
        let mut cart = cart_worth(2000);
        let validator = CouponValidator::new(api);

        validator.apply(&mut cart, "OLD").await.unwrap();
        let err = validator.apply(&mut cart, "EXPIRED").await.unwrap_err();

        assert!(matches!(&err, CouponError::Rejected(d) if d == "Coupon has expired"));
        assert_eq!(err.user_message(), "Coupon has expired");
        assert_eq!(cart.coupon().unwrap().code, "OLD");
    }

    #[tokio::test]
    async fn test_unknown_code_is_rejected() {
        let api = MockApi::new();
        let mut cart = cart_worth(2000);

        let err = CouponValidator::new(api)
            .apply(&mut cart, "NOPE")
            .await
            .unwrap_err();

        assert!(matches!(err, CouponError::Rejected(_)));
        assert!(cart.coupon().is_none());
    }

    #[tokio::test]
    async fn test_blank_code_makes_no_request() {
        let api = MockApi::new();
        let mut cart = cart_worth(2000);

        let err = CouponValidator::new(api.clone())
            .apply(&mut cart, "   ")
            .await
            .unwrap_err();

        assert!(matches!(err, CouponError::Empty));
        assert!(api.coupon_requests().is_empty());
    }

    #[tokio::test]
    async fn test_server_failure_is_unavailable() {
        let api = MockApi::new().with_coupon_rejection("SAVE", 503, "maintenance");
        let mut cart = cart_worth(2000);

        let err = CouponValidator::new(api)
            .apply(&mut cart, "SAVE")
            .await
            .unwrap_err();

        assert!(matches!(err, CouponError::Unavailable(_)));
        assert!(cart.coupon().is_none());
    }
}
