//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Persisted cart reducer
//! - `auth` - Demo sign-in, signup and profile updates
//! - `merge` - Reconciling an anonymous cart with a saved one after sign-in
//! - `checkout` - Form validation, order summary and simulated payment
//! - `validation` - Field-level validation results shared by the forms

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod merge;
pub mod validation;

use rand::Rng;

/// Random base-36 string (`0-9a-z`) of `len` characters.
pub(crate) fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_base36_shape() {
        let id = random_base36(9);
        assert_eq!(id.len(), 9);
        assert!(
            id.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
        assert_ne!(random_base36(16), random_base36(16));
    }
}
