//! Unified error handling with Sentry integration.
//!
//! Primary-flow failures surface as [`CheckoutError`], which knows the text to
//! show the shopper and whether a retry makes sense. Transient order failures
//! are captured to Sentry before being returned.

use annya_core::EmailError;
use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::FormField;
use crate::config::ConfigError;
use crate::coupons::CouponError;
use crate::reservation::ReservationFailure;
use crate::storage::StorageError;

/// Input problems detected before any network call.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Nothing to reserve or order.
    #[error("Your cart is empty")]
    EmptyCart,

    /// The cart has not been hydrated from storage yet.
    #[error("Your cart is still loading")]
    CartNotLoaded,

    /// A required shipping field is blank.
    #[error("{0} is required")]
    MissingField(FormField),

    /// The email address is malformed.
    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Errors that end a checkout step.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Input failed local validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An item could not be reserved.
    #[error("Reservation failed for {}: {}", .0.name, .0.reason)]
    Reservation(ReservationFailure),

    /// A coupon could not be applied.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// No bearer credential is available, or the backend refused it.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The reservation window elapsed and the expiry policy is enforced.
    #[error("Reservation expired")]
    ReservationExpired,

    /// The order service definitively refused the order.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// The order may not have reached the backend; retry with the same key.
    #[error("Order submission failed: {0}")]
    Transient(#[source] ApiError),

    /// The session already produced an order.
    #[error("Order already placed")]
    AlreadyPlaced,

    /// Durable storage could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CheckoutError {
    /// Text shown to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Reservation(f) => format!("Could not reserve {}: {}", f.name, f.reason),
            Self::Coupon(e) => e.user_message(),
            Self::AuthenticationRequired => "Please login to place an order".to_string(),
            Self::ReservationExpired => {
                "Your reservation has expired. Please return to your cart to reserve the items again."
                    .to_string()
            }
            Self::OrderRejected(detail) => detail.clone(),
            Self::Transient(_) => "Failed to place order. Please try again.".to_string(),
            Self::AlreadyPlaced => "Your order has already been placed".to_string(),
            Self::Storage(_) | Self::Config(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Whether resubmitting the same order might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Capture to Sentry and log. Returns `self` for chaining into `Err`.
    #[must_use]
    pub fn reported(self) -> Self {
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Checkout error"
        );
        self
    }
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// checkout steps leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "ring-1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
