//! Domain types for the product catalog API.
//!
//! Field names follow the catalog's camelCase JSON. Optional fields default
//! when absent so a sparse product still decodes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shophub_core::{Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Unit price in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Advertised discount (display only, already reflected in `price`).
    #[serde(default)]
    pub discount_percentage: f64,
    /// Average rating out of 5.
    #[serde(default)]
    pub rating: f64,
    /// Units in stock.
    #[serde(default)]
    pub stock: i64,
    /// Brand name, absent for unbranded goods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Category slug.
    #[serde(default)]
    pub category: String,
    /// Thumbnail image URL.
    #[serde(default)]
    pub thumbnail: String,
    /// Gallery image URLs.
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    /// Unit price as a displayable [`Price`].
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::usd(self.price)
    }
}

/// One page of products plus the catalog-wide count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products on this page.
    #[serde(default)]
    pub products: Vec<Product>,
    /// Total number of matching products across all pages.
    #[serde(default)]
    pub total: u64,
    /// Offset of the first product on this page.
    #[serde(default)]
    pub skip: u64,
    /// Page size requested.
    #[serde(default)]
    pub limit: u64,
}

impl ProductPage {
    /// Number of pages of `page_size` needed to show `total` products.
    #[must_use]
    pub const fn total_pages(&self, page_size: u64) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total.div_ceil(page_size)
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// URL-safe identifier (e.g. `mens-shirts`).
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Catalog URL listing the category's products.
    #[serde(default)]
    pub url: String,
}

/// Turn a slug like `mens-shirts` into `Mens Shirts`.
#[must_use]
pub fn display_category_name(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_decodes_catalog_json() {
        let json = r#"{
            "id": 1,
            "title": "Essence Mascara Lash Princess",
            "price": 9.99,
            "discountPercentage": 7.17,
            "rating": 4.94,
            "stock": 5,
            "brand": "Essence",
            "category": "beauty",
            "thumbnail": "https://cdn.example/1/thumbnail.png",
            "tags": ["beauty", "mascara"]
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price, Decimal::new(999, 2));
        assert_eq!(product.brand.as_deref(), Some("Essence"));
        assert!(product.images.is_empty());
        assert_eq!(product.unit_price().to_string(), "$9.99");
    }

    #[test]
    fn test_product_without_brand() {
        let json = r#"{"id": 2, "title": "Apple", "price": 1.99, "category": "groceries"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.brand.is_none());
        assert_eq!(product.thumbnail, "");
    }

    #[test]
    fn test_total_pages() {
        let page = ProductPage {
            total: 41,
            ..ProductPage::default()
        };
        assert_eq!(page.total_pages(20), 3);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(ProductPage::default().total_pages(20), 0);
    }

    #[test]
    fn test_display_category_name() {
        assert_eq!(display_category_name("mens-shirts"), "Mens Shirts");
        assert_eq!(display_category_name("beauty"), "Beauty");
        assert_eq!(display_category_name(""), "");
    }
}
