//! Reconciling a pre-login cart with the saved cart after sign-in.
//!
//! When a session becomes authenticated while the anonymous cart still
//! holds items, there are two carts and the shopper picks what survives.
//! Every resolution deletes the anonymous cart; leaving the conflict
//! unresolved keeps it, so it is offered again on the next sign-in.

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

use crate::services::cart::{CartAction, CartItem, CartState, CartStore, load_items};
use crate::storage::{KeyValueStore, keys};

/// Errors from resolving a cart conflict.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Nothing to resolve.
    #[error("no cart conflict is pending")]
    NoPendingConflict,
}

/// How to reconcile the two carts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResolution {
    /// Add the anonymous lines into the saved cart.
    MergeBoth,
    /// Keep the saved cart and drop the anonymous one.
    KeepSaved,
    /// Replace the saved cart with the anonymous one.
    UseAnonymous,
}

impl fmt::Display for MergeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MergeBoth => "merge both carts",
            Self::KeepSaved => "keep saved cart",
            Self::UseAnonymous => "use previous session cart",
        })
    }
}

/// A non-empty anonymous cart found at sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CartConflict {
    anonymous: Vec<CartItem>,
    saved_item_count: u32,
}

impl CartConflict {
    /// Lines of the anonymous cart.
    #[must_use]
    pub fn anonymous_items(&self) -> &[CartItem] {
        &self.anonymous
    }

    /// Units in the anonymous cart.
    #[must_use]
    pub fn anonymous_item_count(&self) -> u32 {
        self.anonymous
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Units in the saved cart when the conflict was detected.
    #[must_use]
    pub const fn saved_item_count(&self) -> u32 {
        self.saved_item_count
    }
}

/// Look for a non-empty anonymous cart to reconcile with `saved`.
///
/// An unreadable anonymous cart counts as empty.
#[must_use]
pub fn detect_conflict(storage: &dyn KeyValueStore, saved: &CartState) -> Option<CartConflict> {
    let anonymous = load_items(storage, keys::ANONYMOUS_CART);
    if anonymous.is_empty() {
        return None;
    }

    info!(
        anonymous_lines = anonymous.len(),
        saved_items = saved.item_count(),
        "Found cart from before sign-in"
    );
    Some(CartConflict {
        anonymous,
        saved_item_count: saved.item_count(),
    })
}

/// Saved lines followed by the anonymous ones, added one by one.
///
/// Lines sharing a variant key have their quantities summed; anything else
/// is appended in anonymous-cart order.
#[must_use]
pub fn merge_items(saved: &[CartItem], anonymous: &[CartItem]) -> Vec<CartItem> {
    let mut state = CartState::with_items(saved.to_vec());
    for item in anonymous {
        state.apply(CartAction::AddItem(item.clone()));
    }
    state.items().to_vec()
}

/// Apply `resolution` to the authenticated cart and delete the anonymous
/// cart.
pub fn resolve(
    cart: &mut CartStore,
    storage: &dyn KeyValueStore,
    conflict: CartConflict,
    resolution: MergeResolution,
) {
    match resolution {
        MergeResolution::MergeBoth => {
            let merged = merge_items(cart.state().items(), &conflict.anonymous);
            cart.replace(merged);
        }
        MergeResolution::KeepSaved => {}
        MergeResolution::UseAnonymous => cart.replace(conflict.anonymous),
    }

    if let Err(e) = storage.remove(keys::ANONYMOUS_CART) {
        warn!(error = %e, "Error removing anonymous cart");
    }

    info!(
        %resolution,
        items = cart.state().item_count(),
        "Cart conflict resolved"
    );
}
