//! Cart state and its durable write-back.
//!
//! [`CartStore`] is the sole owner of the cart lines and the applied coupon.
//! Every mutation goes through it and, once the store has been hydrated from
//! durable storage, is written back immediately.
//!
//! # Hydration barrier
//!
//! A freshly constructed store is empty and not yet loaded. Until
//! [`CartStore::hydrate`] has run, write-back is suppressed so the empty
//! initial state can never clobber a cart saved by a previous run.
//!
//! ```rust
//! use annya_storefront::cart::{CartProduct, CartStore};
//! use annya_storefront::storage::MemoryStore;
//! use rust_decimal::Decimal;
//!
//! let mut cart = CartStore::open(MemoryStore::new());
//! cart.add_to_cart(
//!     CartProduct {
//!         id: "ring-1".into(),
//!         name: "Solitaire Ring".to_string(),
//!         price: Decimal::from(1000),
//!         category: None,
//!         image: None,
//!     },
//!     2,
//! );
//! assert_eq!(cart.cart_total(), Decimal::from(2000));
//! assert_eq!(cart.cart_count(), 2);
//! ```

mod types;

pub use types::{CartItem, CartProduct, Coupon};

use annya_core::{ProductId, SessionId};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::storage::{KeyValueStore, keys};

/// Owner of the cart lines, the applied coupon and the session id.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    items: Vec<CartItem>,
    coupon: Option<Coupon>,
    session_id: Option<SessionId>,
    loaded: bool,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create an empty store that has not read durable storage yet.
    ///
    /// Nothing is written until [`hydrate`](Self::hydrate) has run.
    #[must_use]
    pub const fn unhydrated(storage: S) -> Self {
        Self {
            storage,
            items: Vec::new(),
            coupon: None,
            session_id: None,
            loaded: false,
        }
    }

    /// Create a store and hydrate it from `storage`.
    #[must_use]
    pub fn open(storage: S) -> Self {
        let mut store = Self::unhydrated(storage);
        store.hydrate();
        store
    }

    /// One-time read of the session id, cart and coupon.
    ///
    /// Mints and stores a session id when none exists. Malformed stored values
    /// are logged and treated as absent. Calling this again is a no-op.
    pub fn hydrate(&mut self) {
        if self.loaded {
            return;
        }

        let session_id = match self.storage.get(keys::SESSION_ID) {
            Ok(Some(sid)) if !sid.trim().is_empty() => SessionId::new(sid),
            Ok(_) => {
                let sid = SessionId::mint();
                if let Err(e) = self.storage.set(keys::SESSION_ID, sid.as_str()) {
                    error!(error = %e, "Failed to store new session id");
                }
                debug!(session_id = %sid, "Minted session id");
                sid
            }
            Err(e) => {
                warn!(error = %e, "Failed to read session id, minting a transient one");
                SessionId::mint()
            }
        };

        let items: Vec<CartItem> = self.read_entry(keys::CART).unwrap_or_default();
        self.items = normalize_items(items);
        self.coupon = self.read_entry(keys::COUPON);
        self.session_id = Some(session_id);
        self.loaded = true;

        debug!(
            items = self.items.len(),
            coupon = self.coupon.is_some(),
            "Cart hydrated"
        );
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of a product, merging into an existing line with the same id.
    ///
    /// A quantity of zero is ignored.
    pub fn add_to_cart(&mut self, product: CartProduct, quantity: u32) {
        if quantity == 0 {
            return;
        }

        if let Some(line) = self.items.iter_mut().find(|i| i.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem::from_product(product, quantity));
        }
        self.persist_items();
    }

    /// Remove a line. Removing an absent id is a no-op.
    pub fn remove_from_cart(&mut self, id: &ProductId) {
        self.items.retain(|i| &i.id != id);
        self.persist_items();
    }

    /// Set a line's quantity; anything below one removes the line.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        if quantity < 1 {
            self.remove_from_cart(id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.items.iter_mut().find(|i| &i.id == id) {
            line.quantity = quantity;
        }
        self.persist_items();
    }

    /// Replace the applied coupon.
    pub fn apply_coupon(&mut self, coupon: Coupon) {
        self.coupon = Some(coupon);
        self.persist_coupon();
    }

    /// Clear the applied coupon.
    pub fn remove_coupon(&mut self) {
        self.coupon = None;
        self.persist_coupon();
    }

    /// Empty the cart and drop the coupon together.
    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.persist_items();
        self.persist_coupon();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// `Σ price × quantity`, without any discount.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// `Σ quantity`.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Whether a product is in the cart.
    #[must_use]
    pub fn is_in_cart(&self, id: &ProductId) -> bool {
        self.items.iter().any(|i| &i.id == id)
    }

    /// Discount of the applied coupon, or zero.
    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.coupon
            .as_ref()
            .map_or(Decimal::ZERO, |c| c.discount_amount)
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// Anonymous session id; `None` until hydrated.
    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Whether hydration has completed.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Underlying storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    // =========================================================================
    // Durable entries
    // =========================================================================

    /// Read and parse a JSON entry; unreadable or malformed values are `None`.
    pub(crate) fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Failed to read stored entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Ignoring malformed stored entry");
                None
            }
        }
    }

    /// Serialize and write a JSON entry, honouring the hydration barrier.
    pub(crate) fn write_entry<T: Serialize>(&mut self, key: &str, value: &T) {
        if !self.loaded {
            debug!(key, "Write suppressed until hydration completes");
            return;
        }

        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!(key, error = %e, "Failed to serialize entry");
                return;
            }
        };

        if let Err(e) = self.storage.set(key, &json) {
            error!(key, error = %e, "Failed to write entry");
        }
    }

    /// Delete an entry, honouring the hydration barrier.
    pub(crate) fn remove_entry(&mut self, key: &str) {
        if !self.loaded {
            debug!(key, "Remove suppressed until hydration completes");
            return;
        }

        if let Err(e) = self.storage.remove(key) {
            error!(key, error = %e, "Failed to remove entry");
        }
    }

    fn persist_items(&mut self) {
        let items = std::mem::take(&mut self.items);
        self.write_entry(keys::CART, &items);
        self.items = items;
    }

    fn persist_coupon(&mut self) {
        match self.coupon.clone() {
            Some(coupon) => self.write_entry(keys::COUPON, &coupon),
            None => self.remove_entry(keys::COUPON),
        }
    }
}

/// Enforce the line invariants on data read back from storage.
///
/// Zero-quantity lines are dropped and duplicate ids are merged into the
/// first occurrence.
fn normalize_items(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut out: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            warn!(product_id = %item.id, "Dropping stored cart line with zero quantity");
            continue;
        }
        if let Some(existing) = out.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            out.push(item);
        }
    }
    out
}
