//! Catalog scanning and luxury item selection.
//!
//! A category page is read into a [`CatalogSnapshot`], the most expensive
//! listing is picked by [`select_luxury`], and [`SelectionExecutor`] clicks
//! through to its detail page and commits it to the cart.

pub mod executor;
pub mod price;
pub mod scanner;
pub mod select;

pub use executor::{SelectionExecutor, SelectionOutcome, SelectionStep};
pub use price::Price;
pub use scanner::CatalogScanner;
pub use select::{select_luxury, Selection};

use crate::driver::ElementHandle;
use std::fmt;

/// One listing on a category page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Position in the snapshot.
    pub index: usize,
    /// Price text as displayed, trimmed.
    pub price_text: String,
    /// Parsed price, `None` if the text did not conform.
    pub price: Option<Price>,
    /// Re-locates the listing's link in the live document.
    pub handle: ElementHandle,
}

/// Listings read from the currently displayed category, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub listings: Vec<Listing>,
}

impl CatalogSnapshot {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Listings whose price parsed.
    pub fn priced(&self) -> impl Iterator<Item = (&Listing, Price)> {
        self.listings
            .iter()
            .filter_map(|l| l.price.map(|p| (l, p)))
    }

    pub fn get(&self, index: usize) -> Option<&Listing> {
        self.listings.get(index)
    }

    /// Every price text seen, parseable or not.
    pub fn observed(&self) -> ObservedPrices {
        ObservedPrices(self.listings.iter().map(|l| l.price_text.clone()).collect())
    }
}

/// Raw price texts kept for failure diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedPrices(pub Vec<String>);

impl ObservedPrices {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ObservedPrices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, text) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", text)?;
        }
        f.write_str("]")
    }
}
