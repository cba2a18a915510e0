//! Cart Aggregate

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{Money, Quantity};

/// Ordered line items, at most one per product id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity.value()) }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from a snapshot, merging duplicate ids in first-seen order.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            match cart.items.iter_mut().find(|i| i.id == item.id) {
                Some(existing) => {
                    existing.quantity = Quantity::new(existing.quantity.value().saturating_add(item.quantity.value()));
                }
                None => cart.items.push(item),
            }
        }
        cart
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn item_count(&self) -> u64 { self.items.iter().map(|i| u64::from(i.quantity.value())).sum() }
    pub fn get(&self, id: &str) -> Option<&CartItem> { self.items.iter().find(|i| i.id == id) }

    pub fn total(&self) -> Money {
        self.items.iter().fold(Money::ZERO, |acc, i| acc.add(i.line_total()))
    }

    pub fn add_item(&mut self, product: &Product) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == product.id) {
            existing.quantity = existing.quantity.increment();
        } else {
            self.items.push(CartItem {
                id: product.id.clone(), name: product.name.clone(), unit_price: product.price,
                quantity: Quantity::ONE, image: product.image.clone(),
            });
        }
    }

    /// Returns false when the product is not in the cart.
    pub fn update_quantity(&mut self, id: &str, delta: i64) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => { item.quantity = item.quantity.adjust(delta); true }
            None => false,
        }
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) { self.items.clear(); }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self { Self::from_items(items) }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self { cart.items }
}
