//! Catalog client against the local fixture catalog.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use shophub_core::ProductId;
use shophub_integration_tests::FixtureCatalog;
use shophub_storefront::catalog::{CatalogClient, CatalogError, FEATURED_LIMIT, search_products};

async fn fixture() -> (FixtureCatalog, CatalogClient) {
    let server = FixtureCatalog::start().await.unwrap();
    let client = CatalogClient::new(&server.config()).unwrap();
    (server, client)
}

#[tokio::test]
async fn featured_products_are_the_first_page() {
    let (_server, client) = fixture().await;

    let featured = client.featured_products().await;

    assert_eq!(featured.len(), FEATURED_LIMIT as usize);
    let first = featured.first().unwrap();
    assert_eq!(first.id, ProductId::new(1));
    assert_eq!(first.title, "Essence Mascara Lash Princess");
    assert_eq!(first.price, Decimal::new(999, 2));
    assert_eq!(first.brand.as_deref(), Some("Essence"));
}

#[tokio::test]
async fn repeated_requests_are_served_from_cache() {
    let (server, client) = fixture().await;

    let first = client.featured_products().await;
    let second = client.featured_products().await;

    assert_eq!(first, second);
    assert_eq!(server.hits(), 1);

    client.invalidate_cache();
    client.featured_products().await;
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn products_respects_limit() {
    let (_server, client) = fixture().await;

    assert_eq!(client.products(3).await.len(), 3);
    assert_eq!(
        client.products(100).await.len(),
        FixtureCatalog::product_count()
    );
}

#[tokio::test]
async fn categories_decode_slug_and_name() {
    let (_server, client) = fixture().await;

    let categories = client.try_categories().await.unwrap();

    assert_eq!(categories.len(), 4);
    let decor = categories
        .iter()
        .find(|c| c.slug == "home-decoration")
        .unwrap();
    assert_eq!(decor.name, "Home Decoration");
    assert!(decor.url.ends_with("/products/category/home-decoration"));
}

#[tokio::test]
async fn category_page_is_paged() {
    let (_server, client) = fixture().await;

    let page = client.try_category_page("beauty", 2, 2).await.unwrap();

    let ids: Vec<i64> = page.products.iter().map(|p| p.id.as_i64()).collect();
    assert_eq!(ids, vec![3, 4]);
    assert_eq!(page.total, 4);
    assert_eq!(page.skip, 2);
    assert_eq!(page.total_pages(2), 2);
}

#[tokio::test]
async fn unknown_category_is_an_empty_page() {
    let (_server, client) = fixture().await;

    let page = client.category_page("spaceships", 20, 0).await;

    assert!(page.products.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn product_without_brand_decodes() {
    let (_server, client) = fixture().await;

    let product = client.try_product(ProductId::new(30)).await.unwrap();

    assert_eq!(product.title, "Key Holder");
    assert_eq!(product.brand, None);
    assert_eq!(product.price, Decimal::new(30, 0));
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let (server, client) = fixture().await;

    let err = client.try_product(ProductId::new(9999)).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(ref path) if path == "/products/9999"));

    assert_eq!(client.product(ProductId::new(9999)).await, None);
    // Not found is final, never retried.
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let (server, client) = fixture().await;
    server.fail_next(2);

    let product = client.try_product(ProductId::new(121)).await.unwrap();

    assert_eq!(product.title, "iPhone 5s");
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn persistent_failure_degrades_to_empty() {
    let (server, client) = fixture().await;
    server.fail_next(usize::MAX);

    let err = client.try_categories().await.unwrap_err();
    assert!(matches!(err, CatalogError::Status { status: 503, .. }));
    assert_eq!(server.hits(), 3);

    assert!(client.featured_products().await.is_empty());
    assert!(client.categories().await.is_empty());
    assert_eq!(client.product(ProductId::new(1)).await, None);
}

#[tokio::test]
async fn search_filters_fetched_products() {
    let (_server, client) = fixture().await;
    let products = client.products(100).await;

    let by_brand: Vec<i64> = search_products(&products, "apple")
        .iter()
        .map(|p| p.id.as_i64())
        .collect();
    assert_eq!(by_brand, vec![121, 122]);

    let by_category = search_products(&products, "FRAGRANCE");
    assert_eq!(by_category.len(), 2);

    assert!(search_products(&products, "bicycle").is_empty());
}
