//! Cart state and the reducer that mutates it.
//!
//! [`CartState::apply`] is the only way the item list changes. After every
//! item-touching action the derived `total` and `item_count` are recomputed
//! from scratch over the whole list; they are never adjusted incrementally.
//!
//! A change whose total cannot be represented is refused: an added or
//! updated line leaves the cart as it was, and a replacement list (stored
//! data being restored) is dropped in favour of an empty cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use shophub_core::{Price, ProductId};

use crate::catalog::Product;

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// A line in the cart: a product snapshot plus the chosen variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog product ID.
    pub id: ProductId,
    /// Product title at the time it was added.
    pub title: String,
    /// Unit price at the time it was added.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Thumbnail image URL.
    #[serde(default)]
    pub thumbnail: String,
    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Advertised discount (display only).
    #[serde(default)]
    pub discount_percentage: f64,
    /// Number of units, always positive once in the cart.
    pub quantity: u32,
    /// Chosen size, if the product has sizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    /// Chosen color, if the product has colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

/// Identity of a cart line: product ID plus variant selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantKey<'a> {
    pub id: ProductId,
    pub size: Option<&'a str>,
    pub color: Option<&'a str>,
}

/// Quantity and variant choices for adding a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddItemOptions {
    /// Units to add. `None` or `Some(0)` adds one.
    pub quantity: Option<u32>,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
}

impl CartItem {
    /// Snapshot a catalog product into a cart line.
    #[must_use]
    pub fn from_product(product: &Product, options: AddItemOptions) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            thumbnail: product.thumbnail.clone(),
            brand: product.brand.clone(),
            discount_percentage: product.discount_percentage,
            quantity: options.quantity.filter(|q| *q > 0).unwrap_or(1),
            selected_size: options.selected_size,
            selected_color: options.selected_color,
        }
    }

    /// This line's identity.
    #[must_use]
    pub fn variant_key(&self) -> VariantKey<'_> {
        VariantKey {
            id: self.id,
            size: self.selected_size.as_deref(),
            color: self.selected_color.as_deref(),
        }
    }

    /// `price × quantity`, saturating at the largest representable amount.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    /// `price × quantity`, or `None` on overflow.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }

    /// Human-readable variant, e.g. `M / Blue`.
    #[must_use]
    pub fn variant_label(&self) -> Option<String> {
        match (self.selected_size.as_deref(), self.selected_color.as_deref()) {
            (Some(size), Some(color)) => Some(format!("{size} / {color}")),
            (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
            (None, None) => None,
        }
    }
}

/// Every way the cart can change.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Add a line, merging into an existing line with the same variant key.
    /// A zero quantity counts as one.
    AddItem(CartItem),
    /// Remove every line for a product.
    RemoveItem(ProductId),
    /// Set the quantity of every line for a product. Values at or below
    /// zero remove the lines.
    UpdateQuantity { id: ProductId, quantity: i64 },
    /// Remove all lines.
    Clear,
    /// Replace the whole item list.
    Replace(Vec<CartItem>),
    Toggle,
    Open,
    Close,
}

impl CartAction {
    /// Whether the action can change the item list (and so must be persisted).
    #[must_use]
    pub const fn touches_items(&self) -> bool {
        !matches!(self, Self::Toggle | Self::Open | Self::Close)
    }
}

/// Cart contents plus derived totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    items: Vec<CartItem>,
    total: Decimal,
    item_count: u32,
    is_open: bool,
}

impl CartState {
    /// A closed cart holding `items`.
    #[must_use]
    pub fn with_items(items: Vec<CartItem>) -> Self {
        let mut state = Self::default();
        state.apply(CartAction::Replace(items));
        state
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// `total` as a displayable price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::usd(self.total)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Whether the cart panel is showing.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// How much more must be spent before shipping is free.
    #[must_use]
    pub fn amount_until_free_shipping(&self) -> Decimal {
        (FREE_SHIPPING_THRESHOLD - self.total).max(Decimal::ZERO)
    }

    /// Apply one action.
    pub fn apply(&mut self, action: CartAction) {
        let restoring = matches!(action, CartAction::Replace(_));
        let previous = action.touches_items().then(|| self.items.clone());

        match action {
            CartAction::AddItem(mut item) => {
                let added = item.quantity.max(1);
                let key = item.variant_key();
                if let Some(existing) = self.items.iter_mut().find(|i| i.variant_key() == key) {
                    existing.quantity = existing.quantity.saturating_add(added);
                } else {
                    item.quantity = added;
                    self.items.push(item);
                }
            }
            CartAction::RemoveItem(id) => {
                self.items.retain(|item| item.id != id);
            }
            CartAction::UpdateQuantity { id, quantity } => {
                let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
                for item in self.items.iter_mut().filter(|item| item.id == id) {
                    item.quantity = quantity;
                }
                self.items.retain(|item| item.quantity > 0);
            }
            CartAction::Clear => self.items.clear(),
            CartAction::Replace(items) => {
                self.items = items.into_iter().filter(|item| item.quantity > 0).collect();
            }
            CartAction::Toggle => self.is_open = !self.is_open,
            CartAction::Open => self.is_open = true,
            CartAction::Close => self.is_open = false,
        }

        if self.recompute() {
            return;
        }

        if restoring {
            warn!(lines = self.items.len(), "Cart total overflows, discarding restored items");
            self.items.clear();
        } else {
            warn!("Cart total would overflow, change ignored");
            self.items = previous.unwrap_or_default();
        }
        self.recompute();
    }

    /// Refresh the derived totals. Returns `false` (leaving them untouched)
    /// if the total overflows.
    fn recompute(&mut self) -> bool {
        let Some(total) = checked_total(&self.items) else {
            return false;
        };
        self.total = total;
        self.item_count = self
            .items
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.quantity));
        true
    }
}

/// Sum of line totals, or `None` if any step overflows.
fn checked_total(items: &[CartItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        total.checked_add(item.checked_line_total()?)
    })
}
