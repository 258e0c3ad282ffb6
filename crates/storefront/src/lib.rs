//! Annya storefront cart, reservation and checkout.
//!
//! This crate holds the client-side ordering logic of the storefront as a
//! library, allowing it to be driven from the CLI and tested against a mock
//! backend.
//!
//! # Modules
//!
//! - [`cart`] - Durable cart state with a hydration write barrier
//! - [`coupons`] - Coupon verification
//! - [`reservation`] - Sequential stock reservation before checkout
//! - [`checkout`] - Checkout session with idempotent order submission
//! - [`abandoned`] - Debounced abandoned-cart snapshots
//! - [`api`] - Backend HTTP client
//! - [`storage`] - Key-value persistence

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod abandoned;
pub mod api;
pub mod cart;
pub mod checkout;
pub mod clock;
pub mod config;
pub mod coupons;
pub mod error;
pub mod mocks;
pub mod reservation;
pub mod state;
pub mod storage;

pub use error::{CheckoutError, Result, ValidationError};
pub use state::{AppState, Storefront};
