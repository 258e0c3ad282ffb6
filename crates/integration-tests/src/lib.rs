//! Integration tests for the Annya storefront.
//!
//! Every test drives the real [`ApiClient`] against a [`wiremock`] server
//! standing in for the backend, so request shapes and error mapping are
//! checked on the wire.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p annya-integration-tests
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use annya_core::ProductId;
use annya_storefront::Storefront;
use annya_storefront::api::ApiClient;
use annya_storefront::cart::CartProduct;
use annya_storefront::clock::SystemClock;
use annya_storefront::config::{ApiConfig, CheckoutConfig, StorefrontConfig};
use annya_storefront::storage::MemoryStore;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use url::Url;
use wiremock::MockServer;

/// Credential the mock backend expects on `POST /orders`.
pub const TEST_TOKEN: &str = "test-token";

/// A mock backend plus a client pointed at it.
pub struct TestBackend {
    pub server: MockServer,
}

impl TestBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// API settings for the mock server, with the test credential.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn api_config(&self) -> ApiConfig {
        let base_url = Url::parse(&format!("{}/api", self.server.uri())).unwrap();
        ApiConfig {
            token: Some(token()),
            request_timeout: Duration::from_secs(2),
            ..ApiConfig::new(base_url)
        }
    }

    /// Full configuration with the durable store under `state_dir`.
    #[must_use]
    pub fn config(&self, state_dir: &Path) -> StorefrontConfig {
        StorefrontConfig {
            api: self.api_config(),
            state_dir: state_dir.to_path_buf(),
            checkout: CheckoutConfig {
                cart_save_debounce: Duration::from_millis(50),
                ..CheckoutConfig::default()
            },
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).unwrap()
    }

    /// JSON bodies of every request received on `path`, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if request recording is disabled or a body is not JSON.
    #[allow(clippy::unwrap_used)]
    pub async fn bodies(&self, path: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == path)
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    /// In-memory storefront talking to the mock backend.
    #[must_use]
    pub fn storefront(&self, checkout: CheckoutConfig) -> Storefront<MemoryStore, ApiClient> {
        Storefront::open(
            MemoryStore::new(),
            self.client(),
            checkout,
            Arc::new(SystemClock),
        )
    }
}

#[must_use]
pub fn token() -> SecretString {
    SecretString::from(TEST_TOKEN)
}

#[must_use]
pub fn product(id: &str, name: &str, price: i64) -> CartProduct {
    CartProduct {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Decimal::from(price),
        category: None,
        image: None,
    }
}
