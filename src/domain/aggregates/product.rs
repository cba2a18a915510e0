//! Catalog product, as handed to the cart

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::domain::value_objects::Money;

/// The slice of a catalog product the cart needs to capture a line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[validate(length(min = 1))]
    pub id: String,
    pub name: String,
    #[validate(custom = "non_negative")]
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Self { id: id.into(), name: name.into(), price, image: None }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

fn non_negative(price: &Money) -> Result<(), ValidationError> {
    if price.minor() < 0 {
        let mut err = ValidationError::new("range");
        err.message = Some("price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative_price_and_blank_id() {
        assert!(Product::new("p1", "Widget", Money::from_minor(5000)).validate().is_ok());
        assert!(Product::new("p1", "Free sample", Money::ZERO).validate().is_ok());

        let errors = Product::new("p1", "Widget", Money::from_minor(-5000)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
        assert!(Product::new("", "Widget", Money::from_minor(1)).validate().is_err());
    }
}
