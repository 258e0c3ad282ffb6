//! Annya Core - Shared value types.
//!
//! This crate provides the small types used across the Annya components:
//! - `storefront` - Cart, reservation and checkout orchestration
//! - `cli` - Terminal front end for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
