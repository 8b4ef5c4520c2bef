//! Checkout.
//!
//! Validates the checkout form, prices the order and takes a simulated
//! payment. A successful order empties the cart.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Days, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use shophub_core::round_to_cents;

use crate::config::{LatencyConfig, simulate_latency};
use crate::services::cart::{CartItem, CartStore, FREE_SHIPPING_THRESHOLD};
use crate::services::random_base36;
use crate::services::validation::FieldErrors;

/// Sales tax applied to the subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Flat shipping charged below the free-shipping threshold.
pub const STANDARD_SHIPPING: Decimal = Decimal::from_parts(999, 0, 0, false, 2);

/// Days from order to estimated delivery.
const DELIVERY_DAYS: u64 = 5;

const REQUIRED: &str = "This field is required";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));
static CARD_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{16}$").expect("Invalid regex"));
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/[0-9]{2}$").expect("Invalid regex"));
static CVV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("Invalid regex"));

/// Checkout form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckoutField {
    Email,
    FirstName,
    LastName,
    Address,
    City,
    State,
    ZipCode,
    Country,
    Phone,
    CardNumber,
    ExpiryDate,
    Cvv,
    NameOnCard,
}

impl fmt::Display for CheckoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Email => "email",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::ZipCode => "zipCode",
            Self::Country => "country",
            Self::Phone => "phone",
            Self::CardNumber => "cardNumber",
            Self::ExpiryDate => "expiryDate",
            Self::Cvv => "cvv",
            Self::NameOnCard => "nameOnCard",
        })
    }
}

/// Errors that can occur placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("invalid checkout details: {0}")]
    Validation(FieldErrors<CheckoutField>),
}

/// Contact, shipping and card details.
#[derive(Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub name_on_card: String,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: "US".to_string(),
            phone: String::new(),
            card_number: String::new(),
            expiry_date: String::new(),
            cvv: String::new(),
            name_on_card: String::new(),
        }
    }
}

impl fmt::Debug for CheckoutForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("city", &self.city)
            .field("country", &self.country)
            .field("card_number", &"[REDACTED]")
            .field("cvv", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl CheckoutForm {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns the message for each invalid field.
    pub fn validate(&self) -> Result<(), FieldErrors<CheckoutField>> {
        let mut errors = FieldErrors::new();

        if self.email.is_empty() {
            errors.add(CheckoutField::Email, REQUIRED);
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.add(CheckoutField::Email, "Please enter a valid email address");
        }

        let required = [
            (CheckoutField::FirstName, &self.first_name),
            (CheckoutField::LastName, &self.last_name),
            (CheckoutField::Address, &self.address),
            (CheckoutField::City, &self.city),
            (CheckoutField::State, &self.state),
            (CheckoutField::ZipCode, &self.zip_code),
            (CheckoutField::Phone, &self.phone),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.add(field, REQUIRED);
            }
        }

        let card_number: String = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if card_number.is_empty() {
            errors.add(CheckoutField::CardNumber, "Card number is required");
        } else if !CARD_NUMBER_RE.is_match(&card_number) {
            errors.add(
                CheckoutField::CardNumber,
                "Please enter a valid 16-digit card number",
            );
        }

        if self.expiry_date.trim().is_empty() {
            errors.add(CheckoutField::ExpiryDate, "Expiry date is required");
        } else if !EXPIRY_RE.is_match(&self.expiry_date) {
            errors.add(CheckoutField::ExpiryDate, "Please enter date in MM/YY format");
        }

        if self.cvv.trim().is_empty() {
            errors.add(CheckoutField::Cvv, "CVV is required");
        } else if !CVV_RE.is_match(&self.cvv) {
            errors.add(CheckoutField::Cvv, "Please enter a valid CVV");
        }

        if self.name_on_card.trim().is_empty() {
            errors.add(CheckoutField::NameOnCard, "Name on card is required");
        }

        errors.into_result()
    }
}

/// Order pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Price an order from the cart subtotal.
    #[must_use]
    pub fn for_subtotal(subtotal: Decimal) -> Self {
        let tax = round_to_cents(subtotal.saturating_mul(TAX_RATE));
        let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            STANDARD_SHIPPING
        };
        Self {
            subtotal,
            tax,
            shipping,
            total: round_to_cents(subtotal.saturating_add(tax).saturating_add(shipping)),
        }
    }

    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    /// `SH` followed by nine uppercase base-36 characters.
    pub order_number: String,
    pub email: String,
    pub items: Vec<CartItem>,
    pub summary: OrderSummary,
    pub placed_at: DateTime<Utc>,
    pub estimated_delivery: NaiveDate,
}

fn order_number() -> String {
    format!("SH{}", random_base36(9).to_uppercase())
}

/// Validate, pay and empty the cart.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if there is nothing to buy, or
/// `CheckoutError::Validation` if the form is invalid. The cart is left
/// untouched in both cases.
#[instrument(skip_all, fields(items = cart.state().item_count()))]
pub async fn place_order(
    cart: &mut CartStore,
    form: &CheckoutForm,
    latency: &LatencyConfig,
) -> Result<OrderConfirmation, CheckoutError> {
    if cart.state().is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    form.validate().map_err(CheckoutError::Validation)?;

    let summary = OrderSummary::for_subtotal(cart.state().total());
    let items = cart.state().items().to_vec();

    simulate_latency(latency.payment).await;

    let placed_at = Utc::now();
    let confirmation = OrderConfirmation {
        order_number: order_number(),
        email: form.email.trim().to_string(),
        items,
        summary,
        placed_at,
        estimated_delivery: placed_at.date_naive() + Days::new(DELIVERY_DAYS),
    };
    cart.clear();

    info!(
        order_number = %confirmation.order_number,
        total = %confirmation.summary.total,
        "Order placed"
    );
    Ok(confirmation)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::services::cart::CartScope;
    use crate::services::cart::fixtures::item;
    use crate::storage::{KeyValueStore, MemoryStore, keys};

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            email: "demo@shophub.com".to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            address: "1 Market St".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip_code: "94105".to_string(),
            phone: "+1-555-0123".to_string(),
            card_number: "4242 4242 4242 4242".to_string(),
            expiry_date: "12/29".to_string(),
            cvv: "123".to_string(),
            name_on_card: "Demo User".to_string(),
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(valid_form().validate().is_ok());
        assert_eq!(CheckoutForm::default().country, "US");
    }

    #[test]
    fn test_empty_form_flags_required_fields() {
        let errors = CheckoutForm::default().validate().unwrap_err();
        assert_eq!(errors.get(CheckoutField::City), Some(REQUIRED));
        assert_eq!(errors.get(CheckoutField::Phone), Some(REQUIRED));
        assert_eq!(errors.get(CheckoutField::Email), Some(REQUIRED));
        assert_eq!(
            errors.get(CheckoutField::CardNumber),
            Some("Card number is required")
        );
        assert!(!errors.has(CheckoutField::Country));
        assert_eq!(errors.len(), 12);
    }

    #[test]
    fn test_field_formats() {
        let form = CheckoutForm {
            email: "demo@shophub".to_string(),
            card_number: "4242 4242 4242".to_string(),
            expiry_date: "13/29".to_string(),
            cvv: "12a".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get(CheckoutField::Email),
            Some("Please enter a valid email address")
        );
        assert_eq!(
            errors.get(CheckoutField::CardNumber),
            Some("Please enter a valid 16-digit card number")
        );
        assert_eq!(
            errors.get(CheckoutField::ExpiryDate),
            Some("Please enter date in MM/YY format")
        );
        assert_eq!(errors.get(CheckoutField::Cvv), Some("Please enter a valid CVV"));
        assert_eq!(errors.len(), 4);

        let four_digit_cvv = CheckoutForm {
            cvv: "1234".to_string(),
            ..valid_form()
        };
        assert!(four_digit_cvv.validate().is_ok());
    }

    #[test]
    fn test_digit_fields_accept_ascii_digits_only() {
        let form = CheckoutForm {
            card_number: "٤٢٤٢٤٢٤٢٤٢٤٢٤٢٤٢".to_string(),
            expiry_date: "12/٢٩".to_string(),
            cvv: "١٢٣".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has(CheckoutField::CardNumber));
        assert!(errors.has(CheckoutField::ExpiryDate));
        assert!(errors.has(CheckoutField::Cvv));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_blank_email_is_reported_as_invalid() {
        let form = CheckoutForm {
            email: "   ".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get(CheckoutField::Email),
            Some("Please enter a valid email address")
        );
    }

    #[test]
    fn test_summary_saturates_instead_of_overflowing() {
        let summary = OrderSummary::for_subtotal(Decimal::MAX);
        assert_eq!(summary.total, round_to_cents(Decimal::MAX));
    }

    #[test]
    fn test_debug_redacts_card() {
        let rendered = format!("{:?}", valid_form());
        assert!(!rendered.contains("4242"));
        assert!(!rendered.contains("123\""));
    }

    #[test]
    fn test_summary_below_free_shipping() {
        let summary = OrderSummary::for_subtotal(Decimal::new(4999, 2));
        assert_eq!(summary.tax, Decimal::new(400, 2));
        assert_eq!(summary.shipping, STANDARD_SHIPPING);
        assert_eq!(summary.total, Decimal::new(6398, 2));
        assert!(!summary.has_free_shipping());
    }

    #[test]
    fn test_summary_free_shipping_at_threshold() {
        let summary = OrderSummary::for_subtotal(Decimal::new(5000, 2));
        assert_eq!(summary.tax, Decimal::new(400, 2));
        assert!(summary.has_free_shipping());
        assert_eq!(summary.total, Decimal::new(5400, 2));
    }

    #[test]
    fn test_summary_tax_rounds_to_cents() {
        // 8% of 12.34 is 0.9872
        let summary = OrderSummary::for_subtotal(Decimal::new(1234, 2));
        assert_eq!(summary.tax, Decimal::new(99, 2));
        assert_eq!(summary.total, Decimal::new(2332, 2));
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()), CartScope::Anonymous);
        let err = place_order(&mut cart, &valid_form(), &LatencyConfig::none())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_invalid_form_keeps_cart() {
        let mut cart = CartStore::load(Arc::new(MemoryStore::new()), CartScope::Anonymous);
        cart.add_line(item(1, 1000, 1));

        let err = place_order(&mut cart, &CheckoutForm::default(), &LatencyConfig::none())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(cart.state().item_count(), 1);
    }

    #[tokio::test]
    async fn test_successful_order_clears_cart() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut cart = CartStore::load(Arc::clone(&storage), CartScope::Authenticated);
        cart.add_line(item(1, 2500, 2));

        let confirmation = place_order(&mut cart, &valid_form(), &LatencyConfig::none())
            .await
            .unwrap();

        assert!(confirmation.order_number.starts_with("SH"));
        assert_eq!(confirmation.order_number.len(), 11);
        assert!(
            confirmation
                .order_number
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
        assert_eq!(confirmation.items.len(), 1);
        assert_eq!(confirmation.summary.total, Decimal::new(5400, 2));
        assert_eq!(
            confirmation.estimated_delivery,
            confirmation.placed_at.date_naive() + Days::new(5)
        );

        assert!(cart.state().is_empty());
        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
    }
}
