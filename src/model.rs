//! Cart records produced by the pipeline
//!
//! - [`Money`]: exact two-decimal amounts held as cents
//! - [`CartItem`]: one line item, immutable once built
//! - [`CartResult`]: restaurant plus items with a derived total

use serde::{Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU32;

/// Restaurant name used when the page title cannot be read
pub const UNKNOWN_RESTAURANT: &str = "Unknown Restaurant";

/// Non-negative monetary amount with two-decimal precision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Parse a bare decimal amount such as `8`, `8.5` or `8.50`.
    ///
    /// More than two fraction digits is rejected rather than rounded.
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let whole: u64 = whole.parse().ok()?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().ok()? * 10,
            _ => fraction.parse().ok()?,
        };
        whole.checked_mul(100)?.checked_add(fraction).map(Self)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    fn times(self, quantity: NonZeroU32) -> Self {
        Self(self.0.saturating_mul(u64::from(quantity.get())))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.fold(0u64, |acc, m| acc.saturating_add(m.0)))
    }
}

/// One line item of a group order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    name: String,
    quantity: NonZeroU32,
    price: Money,
    description: Option<String>,
    person: Option<String>,
}

impl CartItem {
    /// Create an item with quantity 1. Returns `None` for a blank name.
    pub fn new(name: impl Into<String>, price: Money) -> Option<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            quantity: NonZeroU32::MIN,
            price,
            description: None,
            person: None,
        })
    }

    /// Builder method: set quantity
    pub fn with_quantity(mut self, quantity: NonZeroU32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Builder method: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method: set the ordering participant
    pub fn with_person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn person(&self) -> Option<&str> {
        self.person.as_deref()
    }

    /// Price multiplied by quantity
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// Structured contents of one group order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartResult {
    restaurant: String,
    items: Vec<CartItem>,
    total_price: Money,
}

impl CartResult {
    /// Assemble a result, recomputing the total from `items`.
    ///
    /// A missing or blank restaurant name becomes [`UNKNOWN_RESTAURANT`].
    pub fn assemble(restaurant: Option<&str>, items: Vec<CartItem>) -> Self {
        let restaurant = restaurant
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_RESTAURANT)
            .to_string();
        let total_price = items.iter().map(CartItem::line_total).sum();

        Self {
            restaurant,
            items,
            total_price,
        }
    }

    pub fn restaurant(&self) -> &str {
        &self.restaurant
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }
}
