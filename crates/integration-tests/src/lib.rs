//! Integration tests for ShopHub.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shophub-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - HTTP catalog client against a local fixture server
//! - `session_flow` - Browse, cart, sign-in, merge and checkout end to end
//!
//! The fixture server speaks the same JSON as `dummyjson.com` and runs on
//! an ephemeral localhost port, so nothing here touches the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use shophub_storefront::config::CatalogConfig;

/// Products served by the fixture: (id, title, price, brand, category).
const PRODUCTS: &[(i64, &str, f64, Option<&str>, &str)] = &[
    (1, "Essence Mascara Lash Princess", 9.99, Some("Essence"), "beauty"),
    (2, "Eyeshadow Palette with Mirror", 19.99, Some("Glamour Beauty"), "beauty"),
    (3, "Powder Canister", 14.99, Some("Velvet Touch"), "beauty"),
    (4, "Red Lipstick", 12.99, Some("Chic Cosmetics"), "beauty"),
    (6, "Calvin Klein CK One", 49.99, Some("Calvin Klein"), "fragrances"),
    (7, "Chanel Coco Noir Eau De", 129.99, Some("Chanel"), "fragrances"),
    (30, "Key Holder", 30.0, None, "home-decoration"),
    (31, "Mirror", 15.5, None, "home-decoration"),
    (121, "iPhone 5s", 199.99, Some("Apple"), "smartphones"),
    (122, "iPhone 6", 299.99, Some("Apple"), "smartphones"),
];

const CATEGORIES: &[(&str, &str)] = &[
    ("beauty", "Beauty"),
    ("fragrances", "Fragrances"),
    ("home-decoration", "Home Decoration"),
    ("smartphones", "Smartphones"),
];

fn product_json(&(id, title, price, brand, category): &(i64, &str, f64, Option<&str>, &str)) -> Value {
    let mut product = json!({
        "id": id,
        "title": title,
        "description": format!("{title} description"),
        "price": price,
        "discountPercentage": 10.5,
        "rating": 4.5,
        "stock": 25,
        "category": category,
        "thumbnail": format!("https://cdn.example/products/{id}/thumbnail.png"),
        "images": [format!("https://cdn.example/products/{id}/1.png")],
    });
    if let (Some(brand), Some(map)) = (brand, product.as_object_mut()) {
        map.insert("brand".to_string(), json!(brand));
    }
    product
}

#[derive(Default)]
struct FixtureState {
    hits: AtomicUsize,
    failures_remaining: AtomicUsize,
}

impl FixtureState {
    /// Count the request and fail it while failures remain.
    fn check(&self) -> Result<(), StatusCode> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            Err(StatusCode::SERVICE_UNAVAILABLE)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    limit: Option<usize>,
    skip: Option<usize>,
}

fn page(products: &[Value], query: &PageQuery) -> Value {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(30);
    let slice: Vec<&Value> = products.iter().skip(skip).take(limit).collect();
    json!({
        "products": slice,
        "total": products.len(),
        "skip": skip,
        "limit": limit,
    })
}

async fn list_products(
    State(state): State<Arc<FixtureState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, StatusCode> {
    state.check()?;
    let products: Vec<Value> = PRODUCTS.iter().map(product_json).collect();
    Ok(Json(page(&products, &query)))
}

async fn list_categories(
    State(state): State<Arc<FixtureState>>,
) -> Result<Json<Value>, StatusCode> {
    state.check()?;
    let categories: Vec<Value> = CATEGORIES
        .iter()
        .map(|(slug, name)| {
            json!({
                "slug": slug,
                "name": name,
                "url": format!("https://dummyjson.com/products/category/{slug}"),
            })
        })
        .collect();
    Ok(Json(Value::Array(categories)))
}

async fn category_products(
    State(state): State<Arc<FixtureState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, StatusCode> {
    state.check()?;
    let products: Vec<Value> = PRODUCTS
        .iter()
        .filter(|p| p.4 == slug)
        .map(product_json)
        .collect();
    Ok(Json(page(&products, &query)))
}

async fn get_product(
    State(state): State<Arc<FixtureState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    state.check()?;
    PRODUCTS
        .iter()
        .find(|p| p.0 == id)
        .map(|p| Json(product_json(p)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// A local stand-in for the product catalog API.
///
/// The server task is aborted when the fixture is dropped.
pub struct FixtureCatalog {
    base_url: Url,
    state: Arc<FixtureState>,
    handle: JoinHandle<()>,
}

impl FixtureCatalog {
    /// Serve the fixture catalog on an ephemeral localhost port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(FixtureState::default());

        let app = Router::new()
            .route("/products", get(list_products))
            .route("/products/categories", get(list_categories))
            .route("/products/category/{slug}", get(category_products))
            .route("/products/{id}", get(get_product))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                report_server_error(&e);
            }
        });

        Ok(Self {
            base_url,
            state,
            handle,
        })
    }

    /// Base URL of the running server.
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Catalog config pointing at this server, with fast retries.
    #[must_use]
    pub fn config(&self) -> CatalogConfig {
        CatalogConfig {
            retry_backoff: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
            ..CatalogConfig::with_base_url(self.base_url())
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Answer the next `count` requests with 503.
    pub fn fail_next(&self, count: usize) {
        self.state.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Number of products the fixture serves.
    #[must_use]
    pub const fn product_count() -> usize {
        PRODUCTS.len()
    }
}

impl Drop for FixtureCatalog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[allow(clippy::print_stderr)]
fn report_server_error(err: &std::io::Error) {
    eprintln!("fixture catalog stopped: {err}");
}
