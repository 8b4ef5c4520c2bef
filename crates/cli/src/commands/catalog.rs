//! Catalog browsing commands.

use shophub_core::ProductId;
use shophub_storefront::AppError;
use shophub_storefront::catalog::{Product, display_category_name, search_products};

use super::{Context, money};

#[allow(clippy::print_stdout)]
fn print_products<'a>(products: impl IntoIterator<Item = &'a Product>) {
    let mut shown = 0_usize;
    for product in products {
        let brand = product.brand.as_deref().unwrap_or("-");
        println!(
            "{:>5}  {:<40}  {:>10}  {:<20}  {:.1}★",
            product.id,
            product.title,
            money(product.price),
            brand,
            product.rating
        );
        shown += 1;
    }
    if shown == 0 {
        println!("No products found.");
    }
}

/// `shophub products`
pub async fn products(ctx: &Context, limit: u32, search: Option<&str>) -> Result<(), AppError> {
    let products = ctx.catalog.products(limit).await;
    match search {
        Some(query) => print_products(search_products(&products, query)),
        None => print_products(&products),
    }
    Ok(())
}

/// `shophub featured`
pub async fn featured(ctx: &Context) -> Result<(), AppError> {
    print_products(&ctx.catalog.featured_products().await);
    Ok(())
}

/// `shophub categories`
#[allow(clippy::print_stdout)]
pub async fn categories(ctx: &Context) -> Result<(), AppError> {
    let categories = ctx.catalog.categories().await;
    if categories.is_empty() {
        println!("No categories found.");
    }
    for category in categories {
        println!("{:<24}  {}", category.slug, category.name);
    }
    Ok(())
}

/// `shophub category <slug>`
#[allow(clippy::print_stdout)]
pub async fn category(ctx: &Context, slug: &str, limit: u32, page: u32) -> Result<(), AppError> {
    if limit == 0 {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }
    let skip = page.saturating_sub(1).saturating_mul(limit);
    let listing = ctx.catalog.category_page(slug, limit, skip).await;

    println!("{}", display_category_name(slug));
    print_products(&listing.products);
    let pages = listing.total_pages(u64::from(limit));
    if pages > 0 {
        println!();
        println!("Page {} of {pages} ({} products)", page.max(1), listing.total);
    }
    Ok(())
}

/// `shophub product <id>`
#[allow(clippy::print_stdout)]
pub async fn product(ctx: &Context, id: i64) -> Result<(), AppError> {
    let product = ctx.catalog.try_product(ProductId::new(id)).await?;

    println!("{} (#{})", product.title, product.id);
    if let Some(brand) = &product.brand {
        println!("Brand:     {brand}");
    }
    println!("Category:  {}", display_category_name(&product.category));
    println!(
        "Price:     {} ({:.0}% off)",
        product.unit_price(),
        product.discount_percentage
    );
    println!("Rating:    {:.2} / 5", product.rating);
    println!("In stock:  {}", product.stock);
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    Ok(())
}
