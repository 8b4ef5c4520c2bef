//! Shopping session.
//!
//! [`ShopSession`] owns one storage handle and the cart and auth stores
//! built on it. It keeps the cart bound to the right storage slot as the
//! user signs in and out, and raises a [`CartConflict`] when signing in
//! finds a cart left over from before.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::LatencyConfig;
use crate::models::user::{ProfileUpdate, User};
use crate::services::auth::{AuthError, AuthStore, SignupForm, UserDirectory};
use crate::services::cart::{CartScope, CartStore};
use crate::services::checkout::{self, CheckoutError, CheckoutForm, OrderConfirmation};
use crate::services::merge::{self, CartConflict, MergeError, MergeResolution};
use crate::storage::KeyValueStore;

/// One shopper's session over a storage backend.
pub struct ShopSession {
    storage: Arc<dyn KeyValueStore>,
    cart: CartStore,
    auth: AuthStore,
    latency: LatencyConfig,
    pending_merge: Option<CartConflict>,
}

impl ShopSession {
    /// Restore the session saved in `storage`.
    ///
    /// A session restored as signed in is checked for a leftover anonymous
    /// cart straight away.
    #[must_use]
    pub fn open(
        storage: Arc<dyn KeyValueStore>,
        directory: UserDirectory,
        latency: LatencyConfig,
    ) -> Self {
        let auth = AuthStore::load(Arc::clone(&storage), directory, latency);
        let scope = if auth.is_authenticated() {
            CartScope::Authenticated
        } else {
            CartScope::Anonymous
        };
        let cart = CartStore::load(Arc::clone(&storage), scope);

        let pending_merge = if auth.is_authenticated() {
            merge::detect_conflict(storage.as_ref(), cart.state())
        } else {
            None
        };

        debug!(
            authenticated = auth.is_authenticated(),
            items = cart.state().item_count(),
            "Session opened"
        );

        Self {
            storage,
            cart,
            auth,
            latency,
            pending_merge,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthStore {
        &self.auth
    }

    /// Signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.auth.user()
    }

    /// Cart conflict waiting for a decision.
    #[must_use]
    pub const fn pending_merge(&self) -> Option<&CartConflict> {
        self.pending_merge.as_ref()
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if no account matches. A
    /// failed attempt signs out any current user.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let was_authenticated = self.auth.is_authenticated();
        let result = self.auth.login(email, password).await;
        self.sync_cart_scope(was_authenticated);
        result
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` or `AuthError::UserAlreadyExists`.
    pub async fn signup(&mut self, form: SignupForm) -> Result<User, AuthError> {
        let was_authenticated = self.auth.is_authenticated();
        let result = self.auth.signup(form).await;
        self.sync_cart_scope(was_authenticated);
        result
    }

    /// Sign out and go back to the anonymous cart.
    pub fn logout(&mut self) {
        let was_authenticated = self.auth.is_authenticated();
        self.auth.logout();
        self.sync_cart_scope(was_authenticated);
    }

    /// Update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if nobody is signed in.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<User, AuthError> {
        self.auth.update_profile(update).await
    }

    /// Settle the pending cart conflict.
    ///
    /// # Errors
    ///
    /// Returns `MergeError::NoPendingConflict` if there is nothing to settle.
    pub fn resolve_merge(&mut self, resolution: MergeResolution) -> Result<(), MergeError> {
        let conflict = self
            .pending_merge
            .take()
            .ok_or(MergeError::NoPendingConflict)?;
        merge::resolve(&mut self.cart, self.storage.as_ref(), conflict, resolution);
        Ok(())
    }

    /// Put the decision off. The anonymous cart stays in storage and is
    /// offered again on the next sign-in.
    pub fn dismiss_merge(&mut self) {
        if self.pending_merge.take().is_some() {
            debug!("Cart conflict left for later");
        }
    }

    /// Place an order for the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the cart is empty or the form is invalid.
    pub async fn checkout(&mut self, form: &CheckoutForm) -> Result<OrderConfirmation, CheckoutError> {
        checkout::place_order(&mut self.cart, form, &self.latency).await
    }

    /// Flush the cart and end the session.
    pub fn close(self) {
        self.cart.persist();
        info!(
            authenticated = self.auth.is_authenticated(),
            items = self.cart.state().item_count(),
            "Session closed"
        );
    }

    fn sync_cart_scope(&mut self, was_authenticated: bool) {
        match (was_authenticated, self.auth.is_authenticated()) {
            (false, true) => {
                self.cart.switch_scope(CartScope::Authenticated);
                self.pending_merge = merge::detect_conflict(self.storage.as_ref(), self.cart.state());
            }
            (true, false) => {
                self.cart.switch_scope(CartScope::Anonymous);
                self.pending_merge = None;
            }
            _ => {}
        }
    }
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("cart", &self.cart)
            .field("auth", &self.auth)
            .field("pending_merge", &self.pending_merge)
            .finish_non_exhaustive()
    }
}
