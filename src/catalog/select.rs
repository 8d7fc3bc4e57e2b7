use super::{CatalogSnapshot, Price};
use crate::{Error, Result};

/// The listing picked as the luxury item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub chosen_index: usize,
    pub chosen_price: Price,
}

/// Pick the most expensive parseable listing.
///
/// Single pass, replacing the running best only on a strictly greater price,
/// so the earliest of several equal maxima wins. Fails with
/// [`Error::NoValidListings`] when nothing parsed.
pub fn select_luxury(snapshot: &CatalogSnapshot) -> Result<Selection> {
    let mut best: Option<Selection> = None;
    for (listing, price) in snapshot.priced() {
        match best {
            Some(ref current) if price <= current.chosen_price => {}
            _ => {
                best = Some(Selection {
                    chosen_index: listing.index,
                    chosen_price: price,
                })
            }
        }
    }
    best.ok_or_else(|| Error::NoValidListings {
        observed: snapshot.observed(),
    })
}
