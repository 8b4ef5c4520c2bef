//! Cache types for catalog API responses.

use shophub_core::ProductId;

use super::types::{Category, Product, ProductPage};

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products { limit: u32, skip: u32 },
    Product(ProductId),
    Categories,
    Category { slug: String, limit: u32, skip: u32 },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Page(ProductPage),
    Product(Box<Product>),
    Categories(Vec<Category>),
}
