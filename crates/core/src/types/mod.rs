//! Core types for Annya.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;

pub use email::{Email, EmailError, looks_like_email};
pub use id::*;
pub use price::{CurrencyCode, Price};
