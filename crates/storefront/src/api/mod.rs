//! Storefront backend API.
//!
//! # Endpoints
//!
//! | Call | Path | Failure handling |
//! |---|---|---|
//! | [`reserve`](StorefrontApi::reserve) | `POST /cart/reserve` | aborts checkout |
//! | [`verify_coupon`](StorefrontApi::verify_coupon) | `POST /coupons/verify` | shown inline |
//! | [`create_order`](StorefrontApi::create_order) | `POST /orders` (bearer) | retryable with the same key |
//! | [`save_cart`](StorefrontApi::save_cart) | `POST /cart/save` | logged only |
//! | [`convert_cart`](StorefrontApi::convert_cart) | `POST /cart/convert` | logged only |
//!
//! [`ApiClient`] talks to the real backend over HTTP; the orchestration code is
//! generic over [`StorefrontApi`] so tests can swap in
//! [`MockApi`](crate::mocks::MockApi).

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{
    AbandonedCartSnapshot, ConvertRequest, CouponRequest, OrderLine, OrderReceipt, OrderRequest,
    PaymentMethod, ReservationRequest, ShippingAddress, SnapshotItem,
};

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;

use crate::cart::Coupon;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The backend rejected the bearer credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The response body could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Message suitable for showing to the shopper, when the backend sent one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } | Self::Unauthorized(message) => Some(message),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// HTTP status, if the backend answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// Whether retrying the same request might succeed.
    ///
    /// Network failures, timeouts, throttling and server errors are transient;
    /// any other 4xx is a definitive answer.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::Unauthorized(_) => false,
        }
    }
}

/// Calls the storefront makes against its backend.
pub trait StorefrontApi: Clone + Send + Sync + 'static {
    /// Reserve one unit of stock for a product on behalf of a session.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (e.g. out of stock) or a transport error.
    fn reserve(
        &self,
        request: &ReservationRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Resolve a coupon code against the current subtotal.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (unknown, expired, minimum not met) or a
    /// transport error.
    fn verify_coupon(
        &self,
        request: &CouponRequest,
    ) -> impl Future<Output = Result<Coupon, ApiError>> + Send;

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the credential is refused, the
    /// backend's rejection, or a transport error.
    fn create_order(
        &self,
        order: &OrderRequest,
        token: &SecretString,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send;

    /// Store an abandoned-cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers only log it.
    fn save_cart(
        &self,
        snapshot: &AbandonedCartSnapshot,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Mark the abandoned cart for an email as converted.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers only log it.
    fn convert_cart(
        &self,
        request: &ConvertRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
