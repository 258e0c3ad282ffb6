//! In-memory backend for tests.
//!
//! [`MockApi`] records every request it receives and answers from scripted
//! responses, so orchestration code can be exercised without a server.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use annya_core::{OrderId, ProductId};
use secrecy::{ExposeSecret, SecretString};

use crate::api::{
    AbandonedCartSnapshot, ApiError, ConvertRequest, CouponRequest, OrderReceipt, OrderRequest,
    ReservationRequest, StorefrontApi,
};
use crate::cart::Coupon;

/// Scripted [`StorefrontApi`].
///
/// Clones share state, so a test can keep one handle for assertions while the
/// code under test owns another.
///
/// Unscripted calls succeed, except coupon verification, which rejects unknown
/// codes with a 404 like the real backend.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    coupons: HashMap<String, Result<Coupon, (u16, String)>>,
    reservation_failures: HashMap<ProductId, (u16, String)>,
    order_failures: VecDeque<(u16, String)>,
    fail_cart_saves: bool,
    fail_converts: bool,

    reservations: Vec<ReservationRequest>,
    coupon_requests: Vec<CouponRequest>,
    orders: Vec<OrderRequest>,
    order_tokens: Vec<String>,
    saves: Vec<AbandonedCartSnapshot>,
    converts: Vec<ConvertRequest>,
}

impl MockApi {
    /// Create a mock where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept `coupon.code` and answer with `coupon`.
    #[must_use]
    pub fn with_coupon(self, coupon: Coupon) -> Self {
        self.state().coupons.insert(coupon.code.clone(), Ok(coupon));
        self
    }

    /// Refuse `code` with the given status and `detail`.
    #[must_use]
    pub fn with_coupon_rejection(self, code: &str, status: u16, detail: &str) -> Self {
        self.state()
            .coupons
            .insert(code.to_string(), Err((status, detail.to_string())));
        self
    }

    /// Refuse reservations of `product_id` with a 409 and `detail`.
    #[must_use]
    pub fn with_reservation_failure(self, product_id: &str, detail: &str) -> Self {
        self.state()
            .reservation_failures
            .insert(ProductId::new(product_id), (409, detail.to_string()));
        self
    }

    /// Fail the next order submission. Queued failures are used in order.
    #[must_use]
    pub fn with_order_failure(self, status: u16, detail: &str) -> Self {
        self.state()
            .order_failures
            .push_back((status, detail.to_string()));
        self
    }

    /// Fail every abandoned-cart save with a 500.
    #[must_use]
    pub fn with_failing_cart_saves(self) -> Self {
        self.state().fail_cart_saves = true;
        self
    }

    /// Fail every conversion signal with a 500.
    #[must_use]
    pub fn with_failing_converts(self) -> Self {
        self.state().fail_converts = true;
        self
    }

    /// Reservation requests received, in order.
    #[must_use]
    pub fn reservations(&self) -> Vec<ReservationRequest> {
        self.state().reservations.clone()
    }

    /// Coupon verification requests received.
    #[must_use]
    pub fn coupon_requests(&self) -> Vec<CouponRequest> {
        self.state().coupon_requests.clone()
    }

    /// Order submissions received, including failed ones.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.state().orders.clone()
    }

    /// Bearer tokens sent with each order submission.
    #[must_use]
    pub fn order_tokens(&self) -> Vec<String> {
        self.state().order_tokens.clone()
    }

    /// Abandoned-cart snapshots received.
    #[must_use]
    pub fn saves(&self) -> Vec<AbandonedCartSnapshot> {
        self.state().saves.clone()
    }

    /// Conversion signals received.
    #[must_use]
    pub fn converts(&self) -> Vec<ConvertRequest> {
        self.state().converts.clone()
    }
}

fn status_error(status: u16, detail: &str) -> ApiError {
    if status == 401 {
        ApiError::Unauthorized(detail.to_string())
    } else {
        ApiError::Api {
            status,
            message: detail.to_string(),
        }
    }
}

impl StorefrontApi for MockApi {
    fn reserve(
        &self,
        request: &ReservationRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        let mut state = self.state();
        state.reservations.push(request.clone());
        let result = match state.reservation_failures.get(&request.product_id) {
            Some((status, detail)) => Err(status_error(*status, detail)),
            None => Ok(()),
        };
        async move { result }
    }

    fn verify_coupon(
        &self,
        request: &CouponRequest,
    ) -> impl Future<Output = Result<Coupon, ApiError>> + Send {
        let mut state = self.state();
        state.coupon_requests.push(request.clone());
        let result = match state.coupons.get(&request.code) {
            Some(Ok(coupon)) => Ok(coupon.clone()),
            Some(Err((status, detail))) => Err(status_error(*status, detail)),
            None => Err(status_error(404, "Invalid coupon code")),
        };
        async move { result }
    }

    fn create_order(
        &self,
        order: &OrderRequest,
        token: &SecretString,
    ) -> impl Future<Output = Result<OrderReceipt, ApiError>> + Send {
        let mut state = self.state();
        state.orders.push(order.clone());
        state.order_tokens.push(token.expose_secret().to_string());
        let attempt = state.orders.len();
        let result = match state.order_failures.pop_front() {
            Some((status, detail)) => Err(status_error(status, &detail)),
            None => Ok(OrderReceipt {
                success: Some(true),
                order_id: OrderId::new(format!("order-{attempt}")),
                order_number: format!("ANN-{}", 1000 + attempt),
            }),
        };
        async move { result }
    }

    fn save_cart(
        &self,
        snapshot: &AbandonedCartSnapshot,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        let mut state = self.state();
        state.saves.push(snapshot.clone());
        let result = if state.fail_cart_saves {
            Err(status_error(500, "cart save failed"))
        } else {
            Ok(())
        };
        async move { result }
    }

    fn convert_cart(
        &self,
        request: &ConvertRequest,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        let mut state = self.state();
        state.converts.push(request.clone());
        let result = if state.fail_converts {
            Err(status_error(500, "convert failed"))
        } else {
            Ok(())
        };
        async move { result }
    }
}
