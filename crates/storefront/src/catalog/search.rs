//! Local product search over an already-fetched product list.

use super::types::Product;

/// Maximum number of search results shown at once.
pub const MAX_SEARCH_RESULTS: usize = 12;

/// Filter `products` by a case-insensitive substring of title, brand or
/// category.
///
/// A blank query returns the first [`MAX_SEARCH_RESULTS`] products.
#[must_use]
pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let query = query.trim().to_lowercase();

    products
        .iter()
        .filter(|product| {
            query.is_empty()
                || product.title.to_lowercase().contains(&query)
                || product
                    .brand
                    .as_deref()
                    .is_some_and(|brand| brand.to_lowercase().contains(&query))
                || product.category.to_lowercase().contains(&query)
        })
        .take(MAX_SEARCH_RESULTS)
        .collect()
}
