//! Cart store.
//!
//! Wraps a [`CartState`] with persistence: the item list is written to
//! storage after every item-touching action and read back when the store is
//! loaded. Storage failures never reach the caller; they are logged and the
//! cart carries on (an unreadable cart loads as empty).

mod state;

pub use state::{
    AddItemOptions, CartAction, CartItem, CartState, FREE_SHIPPING_THRESHOLD, VariantKey,
};

#[cfg(test)]
pub(crate) use state::tests as fixtures;

use std::sync::Arc;

use tracing::{debug, warn};

use shophub_core::ProductId;

use crate::catalog::Product;
use crate::storage::{self, KeyValueStore, keys};

/// Which storage slot a cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartScope {
    /// Cart built before signing in.
    Anonymous,
    /// Cart saved for the signed-in session.
    Authenticated,
}

impl CartScope {
    /// Storage key holding this scope's items.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Anonymous => keys::ANONYMOUS_CART,
            Self::Authenticated => keys::CART,
        }
    }
}

/// Read a persisted item list, treating any failure as an empty cart.
pub(crate) fn load_items(storage: &dyn KeyValueStore, key: &str) -> Vec<CartItem> {
    match storage::read_json::<Vec<CartItem>>(storage, key) {
        Ok(Some(items)) => {
            debug!(key, items = items.len(), "Loaded cart from storage");
            items
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(error = %e, key, "Error loading cart from storage");
            Vec::new()
        }
    }
}

/// A persisted, reducer-driven shopping cart.
pub struct CartStore {
    state: CartState,
    scope: CartScope,
    storage: Arc<dyn KeyValueStore>,
}

impl CartStore {
    /// Load the cart for `scope` from storage.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>, scope: CartScope) -> Self {
        let items = load_items(storage.as_ref(), scope.storage_key());
        Self {
            state: CartState::with_items(items),
            scope,
            storage,
        }
    }

    /// Current cart contents and totals.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Storage slot the cart is bound to.
    #[must_use]
    pub const fn scope(&self) -> CartScope {
        self.scope
    }

    /// Apply an action and persist the result if the item list may have
    /// changed.
    pub fn dispatch(&mut self, action: CartAction) {
        let persist = action.touches_items();
        self.state.apply(action);
        if persist {
            self.persist();
        }
    }

    /// Add a catalog product.
    pub fn add_item(&mut self, product: &Product, options: AddItemOptions) {
        self.dispatch(CartAction::AddItem(CartItem::from_product(product, options)));
    }

    /// Add an existing cart line.
    pub fn add_line(&mut self, item: CartItem) {
        self.dispatch(CartAction::AddItem(item));
    }

    /// Remove every line for a product.
    pub fn remove_item(&mut self, id: ProductId) {
        self.dispatch(CartAction::RemoveItem(id));
    }

    /// Set a product's quantity; zero or less removes it.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        self.dispatch(CartAction::UpdateQuantity { id, quantity });
    }

    pub fn clear(&mut self) {
        self.dispatch(CartAction::Clear);
    }

    /// Replace every line.
    pub fn replace(&mut self, items: Vec<CartItem>) {
        self.dispatch(CartAction::Replace(items));
    }

    pub fn open(&mut self) {
        self.dispatch(CartAction::Open);
    }

    pub fn close(&mut self) {
        self.dispatch(CartAction::Close);
    }

    pub fn toggle(&mut self) {
        self.dispatch(CartAction::Toggle);
    }

    /// Rebind to another scope, loading that scope's saved items.
    ///
    /// The current items stay saved under the old scope's key.
    pub(crate) fn switch_scope(&mut self, scope: CartScope) {
        if scope == self.scope {
            return;
        }
        let items = load_items(self.storage.as_ref(), scope.storage_key());
        debug!(?scope, items = items.len(), "Switching cart scope");
        self.scope = scope;
        self.state.apply(CartAction::Replace(items));
    }

    /// Write the item list under the current scope's key.
    pub(crate) fn persist(&self) {
        let key = self.scope.storage_key();
        match storage::write_json(self.storage.as_ref(), key, self.state.items()) {
            Ok(()) => debug!(key, items = self.state.items().len(), "Cart saved to storage"),
            Err(e) => warn!(error = %e, key, "Error saving cart to storage"),
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &self.state)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::fixtures::{item, variant};
    use super::*;
    use crate::storage::{MemoryStore, StorageError};

    fn memory() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    /// A store whose every operation fails.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_cart_survives_reload() {
        let storage = memory();
        let mut cart = CartStore::load(Arc::clone(&storage), CartScope::Authenticated);
        cart.add_line(variant(1, 2500, "M", "Blue"));
        cart.add_line(item(2, 1000, 3));
        cart.open();

        let reloaded = CartStore::load(storage, CartScope::Authenticated);
        assert_eq!(reloaded.state().items(), cart.state().items());
        assert_eq!(reloaded.state().total(), Decimal::new(5500, 2));
        // Visibility is UI-only and not persisted
        assert!(!reloaded.state().is_open());
    }

    #[test]
    fn test_scopes_use_separate_keys() {
        let storage = memory();
        let mut cart = CartStore::load(Arc::clone(&storage), CartScope::Anonymous);
        cart.add_line(item(1, 100, 1));

        assert!(storage.get(keys::ANONYMOUS_CART).unwrap().is_some());
        assert!(storage.get(keys::CART).unwrap().is_none());
    }

    #[test]
    fn test_switch_scope_loads_other_cart_and_keeps_old_one_saved() {
        let storage = memory();
        let mut cart = CartStore::load(Arc::clone(&storage), CartScope::Authenticated);
        cart.add_line(item(9, 900, 1));

        cart.switch_scope(CartScope::Anonymous);
        assert!(cart.state().is_empty());
        cart.add_line(item(1, 100, 2));

        cart.switch_scope(CartScope::Authenticated);
        assert_eq!(cart.state().items().len(), 1);
        assert_eq!(cart.state().items().first().unwrap().id, ProductId::new(9));

        let anonymous = load_items(storage.as_ref(), keys::ANONYMOUS_CART);
        assert_eq!(anonymous.len(), 1);
    }

    #[test]
    fn test_corrupt_storage_loads_empty_cart() {
        let storage = memory();
        storage.set(keys::CART, "[{\"id\": \"oops\"").unwrap();

        let cart = CartStore::load(storage, CartScope::Authenticated);
        assert!(cart.state().is_empty());
        assert_eq!(cart.state().total(), Decimal::ZERO);
    }

    #[test]
    fn test_stored_cart_with_overflowing_total_loads_empty() {
        let storage = memory();
        storage
            .set(
                keys::CART,
                r#"[{"id":1,"title":"x","price":5e28,"quantity":2}]"#,
            )
            .unwrap();

        let cart = CartStore::load(storage, CartScope::Authenticated);
        assert!(cart.state().is_empty());
        assert_eq!(cart.state().total(), Decimal::ZERO);
    }

    #[test]
    fn test_storage_failures_are_not_fatal() {
        let mut cart = CartStore::load(Arc::new(BrokenStore), CartScope::Authenticated);
        assert!(cart.state().is_empty());

        cart.add_line(item(1, 1000, 2));
        assert_eq!(cart.state().item_count(), 2);

        cart.remove_item(ProductId::new(1));
        assert!(cart.state().is_empty());
    }

    #[test]
    fn test_clear_persists_empty_list() {
        let storage = memory();
        let mut cart = CartStore::load(Arc::clone(&storage), CartScope::Authenticated);
        cart.add_line(item(1, 1000, 1));
        cart.clear();

        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_add_item_from_product() {
        let product = Product {
            id: ProductId::new(30),
            title: "Key Holder".to_string(),
            description: String::new(),
            price: Decimal::new(3000, 2),
            discount_percentage: 2.92,
            rating: 4.92,
            stock: 54,
            brand: Some("Golden".to_string()),
            category: "home-decoration".to_string(),
            thumbnail: "https://cdn.example/30.jpg".to_string(),
            images: Vec::new(),
        };

        let mut cart = CartStore::load(memory(), CartScope::Anonymous);
        cart.add_item(
            &product,
            AddItemOptions {
                quantity: Some(2),
                ..AddItemOptions::default()
            },
        );
        cart.add_item(&product, AddItemOptions::default());

        let line = cart.state().items().first().unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.brand.as_deref(), Some("Golden"));
        assert_eq!(cart.state().total(), Decimal::new(9000, 2));
    }
}
