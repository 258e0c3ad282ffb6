//! HTTP implementation of [`StorefrontApi`].

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::types::ErrorBody;
use super::{
    AbandonedCartSnapshot, ApiError, ConvertRequest, CouponRequest, OrderReceipt, OrderRequest,
    ReservationRequest, StorefrontApi,
};
use crate::cart::Coupon;
use crate::config::ApiConfig;

/// Characters of a non-JSON error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Client for the storefront backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("annya-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Base URL requests are sent to, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and return the successful response.
    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.inner.client.post(self.endpoint(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(status, &text);

        tracing::debug!(
            path,
            status = %status,
            message = %message,
            "Backend returned non-success status"
        );

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(message));
        }
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// POST a JSON body and parse a JSON response.
    async fn post_for<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let response = self.post(path, body, token).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                path,
                error = %e,
                body = %truncate(&text),
                "Failed to parse backend response"
            );
            ApiError::Parse(e.to_string())
        })
    }
}

impl StorefrontApi for ApiClient {
    #[instrument(skip(self), fields(product_id = %request.product_id))]
    async fn reserve(&self, request: &ReservationRequest) -> Result<(), ApiError> {
        self.post("cart/reserve", request, None).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(code = %request.code))]
    async fn verify_coupon(&self, request: &CouponRequest) -> Result<Coupon, ApiError> {
        self.post_for("coupons/verify", request, None).await
    }

    #[instrument(skip_all, fields(idempotency_key = %order.idempotency_key))]
    async fn create_order(
        &self,
        order: &OrderRequest,
        token: &SecretString,
    ) -> Result<OrderReceipt, ApiError> {
        self.post_for("orders", order, Some(token)).await
    }

    #[instrument(skip_all, fields(items = snapshot.items.len()))]
    async fn save_cart(&self, snapshot: &AbandonedCartSnapshot) -> Result<(), ApiError> {
        self.post("cart/save", snapshot, None).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn convert_cart(&self, request: &ConvertRequest) -> Result<(), ApiError> {
        self.post("cart/convert", request, None).await?;
        Ok(())
    }
}

/// Extract a shopper-facing message from an error response body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.message()
    {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("Request failed with status {}", status.as_u16())
    } else {
        truncate(trimmed)
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
