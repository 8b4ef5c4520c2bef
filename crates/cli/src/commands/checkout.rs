//! Checkout command.

use clap::Args;

use shophub_storefront::AppError;
use shophub_storefront::services::checkout::{CheckoutForm, OrderConfirmation, OrderSummary};

use super::{Context, money};

/// Contact, shipping and payment details. Missing contact fields default
/// to the signed-in user's profile.
#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long, default_value = "")]
    address: String,

    #[arg(long, default_value = "")]
    city: String,

    #[arg(long, default_value = "")]
    state: String,

    #[arg(long, default_value = "")]
    zip_code: String,

    #[arg(long, default_value = "US")]
    country: String,

    #[arg(long, default_value = "")]
    card_number: String,

    /// Card expiry as MM/YY
    #[arg(long, default_value = "")]
    expiry_date: String,

    #[arg(long, default_value = "")]
    cvv: String,

    #[arg(long, default_value = "")]
    name_on_card: String,

    /// Only print the order summary
    #[arg(long)]
    summary_only: bool,
}

pub async fn run(ctx: &mut Context, args: CheckoutArgs) -> Result<(), AppError> {
    let subtotal = ctx.session.cart().state().total();
    if args.summary_only {
        print_summary(&OrderSummary::for_subtotal(subtotal));
        return Ok(());
    }

    let user = ctx.session.user();
    let form = CheckoutForm {
        email: args
            .email
            .or_else(|| user.map(|u| u.email.to_string()))
            .unwrap_or_default(),
        first_name: args
            .first_name
            .or_else(|| user.map(|u| u.first_name.clone()))
            .unwrap_or_default(),
        last_name: args
            .last_name
            .or_else(|| user.map(|u| u.last_name.clone()))
            .unwrap_or_default(),
        phone: args
            .phone
            .or_else(|| user.and_then(|u| u.phone.clone()))
            .unwrap_or_default(),
        address: args.address,
        city: args.city,
        state: args.state,
        zip_code: args.zip_code,
        country: args.country,
        card_number: args.card_number,
        expiry_date: args.expiry_date,
        cvv: args.cvv,
        name_on_card: args.name_on_card,
    };

    let confirmation = ctx.session.checkout(&form).await?;
    print_confirmation(&confirmation);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(summary: &OrderSummary) {
    println!("Subtotal:  {}", money(summary.subtotal));
    println!("Tax (8%):  {}", money(summary.tax));
    if summary.has_free_shipping() {
        println!("Shipping:  FREE");
    } else {
        println!("Shipping:  {}", money(summary.shipping));
    }
    println!("Total:     {}", money(summary.total));
}

#[allow(clippy::print_stdout)]
fn print_confirmation(confirmation: &OrderConfirmation) {
    println!("Order Complete!");
    println!("Order #{}", confirmation.order_number);
    println!();
    for item in &confirmation.items {
        println!("  {} × {}  {}", item.quantity, item.title, money(item.line_total()));
    }
    println!();
    print_summary(&confirmation.summary);
    println!();
    println!(
        "Estimated delivery: {}",
        confirmation.estimated_delivery.format("%A, %B %-d")
    );
    println!("A confirmation will be sent to {}.", confirmation.email);
}
