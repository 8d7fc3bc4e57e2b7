use super::{CatalogSnapshot, Listing, Price};
use crate::config::CatalogConfig;
use crate::driver::{ElementHandle, PageDriver};
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Reads the listings of the category currently shown by the driver.
pub struct CatalogScanner<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a CatalogConfig,
}

impl<'a, D: PageDriver> CatalogScanner<'a, D> {
    pub fn new(driver: &'a D, config: &'a CatalogConfig) -> Self {
        Self { driver, config }
    }

    /// Wait for listings to appear and read every price.
    ///
    /// Times out with [`Error::Timeout`] if no listing shows up within
    /// `scan_timeout_ms`. Returns [`Error::NoValidListings`] if none of the
    /// prices parse; unparseable listings are kept and logged otherwise.
    pub async fn scan(&self) -> Result<CatalogSnapshot> {
        self.driver
            .wait_for(&self.config.listing, self.config.scan_timeout_ms)
            .await?;

        let cards = self
            .driver
            .locate_all(&ElementHandle::root(&self.config.listing))
            .await?;
        info!("Found {} listings", cards.len());

        let mut listings = Vec::with_capacity(cards.len());
        for (index, card) in cards.into_iter().enumerate() {
            let price_text = self
                .driver
                .text_of(&card.child(&self.config.price))
                .await?
                .map(|t| t.trim().to_string())
                .unwrap_or_default();
            let price = Price::parse(&price_text, &self.config.currency_prefix);
            match price {
                Some(p) => debug!("listing {}: {}{}", index, self.config.currency_prefix, p),
                None => warn!("listing {}: unparseable price {:?}", index, price_text),
            }
            listings.push(Listing {
                index,
                price_text,
                price,
                handle: card.child(&self.config.link),
            });
        }

        let snapshot = CatalogSnapshot::new(listings);
        let valid = snapshot.priced().count();
        info!("Valid prices: {}/{}", valid, snapshot.len());
        if valid == 0 {
            return Err(Error::NoValidListings {
                observed: snapshot.observed(),
            });
        }
        Ok(snapshot)
    }
}
