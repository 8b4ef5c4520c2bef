//! Product catalog API client.
//!
//! # Architecture
//!
//! - Read-only HTTP GET against a `dummyjson`-compatible catalog
//! - The catalog is source of truth - no local sync, direct API calls
//! - In-memory caching via `moka` for API responses (1 hour TTL by default)
//! - Rate-limited and 5xx responses are retried with exponential backoff
//!
//! # Degradation
//!
//! Every listing method has a `try_` variant returning `Result`. The plain
//! variants log the failure and fall back to an empty result so callers
//! always have something to render.
//!
//! # Example
//!
//! ```rust,ignore
//! use shophub_storefront::catalog::CatalogClient;
//!
//! let client = CatalogClient::new(&config.catalog)?;
//!
//! let featured = client.featured_products().await;
//! let page = client.category_page("smartphones", 20, 0).await;
//! ```

mod cache;
pub mod search;
pub mod types;

pub use search::search_products;
pub use types::{Category, Product, ProductPage, display_category_name};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use shophub_core::ProductId;

use crate::config::CatalogConfig;

use cache::{CacheKey, CacheValue};

/// Page size used for the featured products strip.
pub const FEATURED_LIMIT: u32 = 8;

/// Longest `Retry-After` the client is willing to wait.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the catalog.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Non-success status other than 404/429.
    #[error("Catalog returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// First part of the response body.
        body: String,
    },

    /// The configured base URL cannot have paths appended.
    #[error("Invalid catalog base URL: {0}")]
    InvalidBaseUrl(String),
}

impl CatalogError {
    /// Whether repeating the request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Parse(_) | Self::NotFound(_) | Self::InvalidBaseUrl(_) => false,
        }
    }
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the product catalog API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path or the HTTP
    /// client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        if config.base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl(config.base_url.to_string()));
        }

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shophub/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
                max_retries: config.max_retries,
                retry_backoff: config.retry_backoff,
            }),
        })
    }

    /// Build an endpoint URL under the base URL.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// GET a JSON document, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let mut attempt = 0;
        loop {
            match self.get_json_once(url.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.inner.max_retries => {
                    let delay = self.retry_delay(&e, attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Catalog request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        debug!(url = %url, "Catalog request");
        let response = self.inner.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.path().to_string()));
        }

        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }

    fn retry_delay(&self, error: &CatalogError, attempt: u32) -> Duration {
        if let CatalogError::RateLimited(secs) = error {
            return Duration::from_secs(*secs).min(MAX_RETRY_AFTER);
        }
        self.inner
            .retry_backoff
            .saturating_mul(2_u32.saturating_pow(attempt))
    }

    async fn cached_page(&self, key: CacheKey, url: Url) -> Result<ProductPage, CatalogError> {
        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&key).await {
            debug!(?key, "Cache hit for product page");
            return Ok(page);
        }

        let page: ProductPage = self.get_json(url).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Page(page.clone()))
            .await;
        Ok(page)
    }

    /// Drop every cached response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of the full product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn try_product_page(&self, limit: u32, skip: u32) -> Result<ProductPage, CatalogError> {
        let url = self.endpoint(
            &["products"],
            &[("limit", limit.to_string()), ("skip", skip.to_string())],
        )?;
        self.cached_page(CacheKey::Products { limit, skip }, url).await
    }

    /// Get the first `limit` products, or an empty list on failure.
    pub async fn products(&self, limit: u32) -> Vec<Product> {
        match self.try_product_page(limit, 0).await {
            Ok(page) => page.products,
            Err(e) => {
                warn!(error = %e, "Error fetching products");
                Vec::new()
            }
        }
    }

    /// Get the featured products strip, or an empty list on failure.
    pub async fn featured_products(&self) -> Vec<Product> {
        match self.try_product_page(FEATURED_LIMIT, 0).await {
            Ok(page) => page.products,
            Err(e) => {
                warn!(error = %e, "Error fetching featured products");
                Vec::new()
            }
        }
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn try_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", &id.to_string()], &[])?;
        let product: Product = self.get_json(url).await?;
        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Get a single product by ID, or `None` on failure.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        match self.try_product(id).await {
            Ok(product) => Some(product),
            Err(CatalogError::NotFound(_)) => None,
            Err(e) => {
                warn!(error = %e, product_id = %id, "Error fetching product");
                None
            }
        }
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Get every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn try_categories(&self) -> Result<Vec<Category>, CatalogError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["products", "categories"], &[])?;
        let categories: Vec<Category> = self.get_json(url).await?;
        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Get every category, or an empty list on failure.
    pub async fn categories(&self) -> Vec<Category> {
        match self.try_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                warn!(error = %e, "Error fetching categories");
                Vec::new()
            }
        }
    }

    /// Get one page of a category's products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category = %slug))]
    pub async fn try_category_page(
        &self,
        slug: &str,
        limit: u32,
        skip: u32,
    ) -> Result<ProductPage, CatalogError> {
        let url = self.endpoint(
            &["products", "category", slug],
            &[("limit", limit.to_string()), ("skip", skip.to_string())],
        )?;
        let key = CacheKey::Category {
            slug: slug.to_string(),
            limit,
            skip,
        };
        self.cached_page(key, url).await
    }

    /// Get one page of a category's products, or an empty page on failure.
    pub async fn category_page(&self, slug: &str, limit: u32, skip: u32) -> ProductPage {
        match self.try_category_page(slug, limit, skip).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, category = %slug, "Error fetching category products");
                ProductPage::default()
            }
        }
    }
}
