//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// The single currency the store sells in.
pub const CURRENCY: &str = "NGN";

/// Money value object, in minor units (kobo) of [`CURRENCY`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(amount: i64) -> Self { Self(amount) }
    pub fn minor(&self) -> i64 { self.0 }
    pub fn add(&self, other: Money) -> Money { Money(self.0.saturating_add(other.0)) }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0.saturating_mul(i64::from(qty))) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{} {}{}.{:02}", CURRENCY, sign, abs / 100, abs % 100)
    }
}

/// Quantity value object. Never below one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Self { Self(value.max(1)) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn increment(&self) -> Self { Self(self.0.saturating_add(1)) }

    /// Applies a signed delta, clamping the result to `1..=u32::MAX`.
    pub fn adjust(&self, delta: i64) -> Self {
        let next = i64::from(self.0).saturating_add(delta).clamp(1, i64::from(u32::MAX));
        Self(next as u32)
    }
}

impl Default for Quantity { fn default() -> Self { Self::ONE } }
impl From<u32> for Quantity { fn from(value: u32) -> Self { Self::new(value) } }
impl From<Quantity> for u32 { fn from(q: Quantity) -> Self { q.0 } }

/// Shipping and contact details captured at checkout. Every field is mandatory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[validate(custom = "not_blank")]
    pub full_name: String,
    #[validate(custom = "not_blank", email)]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub phone: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub state: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            full_name: "Ada Obi".into(), email: "ada@example.com".into(), phone: "08030000000".into(),
            address: "12 Marina Rd".into(), city: "Lagos".into(), state: "Lagos".into(),
        }
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_minor(1000);
        assert_eq!(a.multiply(2).add(Money::from_minor(500)), Money::from_minor(2500));
        assert_eq!(Money::from_minor(7500).to_string(), "NGN 75.00");
    }

    #[test]
    fn test_quantity_clamps_to_one() {
        let q = Quantity::new(2);
        assert_eq!(q.adjust(-5).value(), 1);
        assert_eq!(q.adjust(3).value(), 5);
        assert_eq!(Quantity::new(0).value(), 1);
        assert_eq!(Quantity::new(u32::MAX).adjust(10).value(), u32::MAX);
    }

    #[test]
    fn test_customer_info_requires_every_field() {
        assert!(customer().validate().is_ok());

        let mut missing_city = customer();
        missing_city.city = "   ".into();
        let errors = missing_city.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("city"));

        let mut bad_email = customer();
        bad_email.email = "not-an-email".into();
        assert!(bad_email.validate().is_err());
    }
}
