//! Cart commands.

use clap::Subcommand;
use rust_decimal::Decimal;

use shophub_core::ProductId;
use shophub_storefront::AppError;
use shophub_storefront::services::cart::{AddItemOptions, CartScope, CartState};

use super::{Context, money};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product ID
        id: i64,

        /// Number of units
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Selected size
        #[arg(long)]
        size: Option<String>,

        /// Selected color
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a product (every size and color)
    Remove {
        /// Product ID
        id: i64,
    },
    /// Set a product's quantity; 0 removes it
    Update {
        /// Product ID
        id: i64,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

pub async fn run(ctx: &mut Context, action: CartAction) -> Result<(), AppError> {
    match action {
        CartAction::Show => {}
        CartAction::Add {
            id,
            quantity,
            size,
            color,
        } => {
            if quantity == 0 {
                return Err(AppError::BadRequest(
                    "quantity must be at least 1".to_string(),
                ));
            }
            let product = ctx.catalog.try_product(ProductId::new(id)).await?;
            ctx.session.cart_mut().add_item(
                &product,
                AddItemOptions {
                    quantity: Some(quantity),
                    selected_size: size,
                    selected_color: color,
                },
            );
            print_line(&format!("Added {quantity} × {} to cart.", product.title));
        }
        CartAction::Remove { id } => {
            let id = ProductId::new(id);
            ensure_in_cart(ctx.session.cart().state(), id)?;
            ctx.session.cart_mut().remove_item(id);
        }
        CartAction::Update { id, quantity } => {
            let id = ProductId::new(id);
            ensure_in_cart(ctx.session.cart().state(), id)?;
            ctx.session.cart_mut().update_quantity(id, quantity);
        }
        CartAction::Clear => ctx.session.cart_mut().clear(),
    }

    print_cart(ctx.session.cart().state(), ctx.session.cart().scope());
    Ok(())
}

fn ensure_in_cart(state: &CartState, id: ProductId) -> Result<(), AppError> {
    if state.items().iter().any(|item| item.id == id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Product {id} in your cart")))
    }
}

/// Nudge a guest with a non-empty cart to sign in.
fn sign_in_hint(state: &CartState, scope: CartScope) -> Option<String> {
    let count = state.item_count();
    if scope != CartScope::Anonymous || count == 0 {
        return None;
    }
    let plural = if count == 1 { "" } else { "s" };
    Some(format!(
        "Sign in to save your {count} item{plural} and access them on your next visit."
    ))
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}

#[allow(clippy::print_stdout)]
fn print_cart(state: &CartState, scope: CartScope) {
    let owner = match scope {
        CartScope::Anonymous => "Guest cart",
        CartScope::Authenticated => "Your cart",
    };

    if state.is_empty() {
        println!("{owner} is empty.");
        return;
    }

    println!("{owner} ({} items)", state.item_count());
    for item in state.items() {
        let variant = item
            .variant_label()
            .map(|label| format!(" [{label}]"))
            .unwrap_or_default();
        println!(
            "{:>5}  {}{variant}  {} × {} = {}",
            item.id,
            item.title,
            item.quantity,
            money(item.price),
            money(item.line_total())
        );
    }
    println!("Subtotal: {}", state.total_price());

    let remaining = state.amount_until_free_shipping();
    if remaining > Decimal::ZERO {
        println!("Add {} more for free shipping.", money(remaining));
    } else {
        println!("You qualify for free shipping!");
    }

    if let Some(hint) = sign_in_hint(state, scope) {
        println!("{hint}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shophub_storefront::services::cart::CartItem;

    use super::*;

    fn line(id: i64, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Decimal::new(999, 2),
            thumbnail: String::new(),
            brand: None,
            discount_percentage: 0.0,
            quantity,
            selected_size: None,
            selected_color: None,
        }
    }

    #[test]
    fn test_guest_with_items_is_asked_to_sign_in() {
        let state = CartState::with_items(vec![line(1, 2), line(2, 1)]);
        assert_eq!(
            sign_in_hint(&state, CartScope::Anonymous).as_deref(),
            Some("Sign in to save your 3 items and access them on your next visit.")
        );

        let single = CartState::with_items(vec![line(1, 1)]);
        assert!(
            sign_in_hint(&single, CartScope::Anonymous)
                .is_some_and(|hint| hint.starts_with("Sign in to save your 1 item "))
        );
    }

    #[test]
    fn test_no_hint_when_signed_in_or_empty() {
        let state = CartState::with_items(vec![line(1, 2)]);
        assert_eq!(sign_in_hint(&state, CartScope::Authenticated), None);
        assert_eq!(sign_in_hint(&CartState::default(), CartScope::Anonymous), None);
    }

    #[test]
    fn test_missing_line_is_not_found() {
        let state = CartState::with_items(vec![line(1, 1)]);
        assert!(ensure_in_cart(&state, ProductId::new(1)).is_ok());

        let err = ensure_in_cart(&state, ProductId::new(7)).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.user_message(), "Product 7 in your cart was not found");
        assert_eq!(err.exit_code(), 66);
    }
}
