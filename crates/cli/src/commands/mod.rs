//! CLI command implementations.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod merge;

use std::sync::Arc;

use rust_decimal::Decimal;
use shophub_core::Price;
use shophub_storefront::catalog::CatalogClient;
use shophub_storefront::config::StorefrontConfig;
use shophub_storefront::services::auth::UserDirectory;
use shophub_storefront::storage::FileStore;
use shophub_storefront::{AppError, ShopSession};

/// Everything a command needs.
pub struct Context {
    pub session: ShopSession,
    pub catalog: CatalogClient,
}

impl Context {
    /// Open the session stored in the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the data directory cannot be created or the
    /// catalog URL is unusable.
    pub fn open(config: &StorefrontConfig) -> Result<Self, AppError> {
        let storage = FileStore::open(&config.data_dir)?;
        tracing::debug!(data_dir = %storage.root().display(), "Using data directory");

        let session = ShopSession::open(Arc::new(storage), UserDirectory::demo(), config.latency);
        let catalog = CatalogClient::new(&config.catalog)?;

        Ok(Self {
            session,
            catalog,
        })
    }

    pub fn close(self) {
        self.session.close();
    }
}

/// Format an amount as US dollars.
pub fn money(amount: Decimal) -> String {
    Price::usd(amount).to_string()
}

#[allow(clippy::print_stderr)]
pub fn print_error(err: &AppError) {
    eprintln!("Error: {}", err.user_message());
}

/// Tell the user about a pending cart conflict, if any.
#[allow(clippy::print_stdout)]
pub fn print_pending_merge(session: &ShopSession) {
    let Some(conflict) = session.pending_merge() else {
        return;
    };
    println!();
    println!("We found items in your cart from before you signed in.");
    println!("  Your saved cart:   {} items", conflict.saved_item_count());
    println!("  Previous session:  {} items", conflict.anonymous_item_count());
    println!("Run `shophub merge both|saved|anonymous` to choose, or `shophub merge later`.");
}
