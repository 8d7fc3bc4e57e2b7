use super::CartPage;
use crate::catalog::{
    select_luxury, CatalogScanner, CatalogSnapshot, ObservedPrices, Selection, SelectionExecutor,
    SelectionOutcome,
};
use crate::config::StorefrontConfig;
use crate::driver::{ElementHandle, NavigateOptions, PageDriver};
use crate::{Error, Result};
use tracing::info;

/// What `add_luxury_item` picked and went through.
#[derive(Debug, Clone)]
pub struct LuxuryResult {
    pub snapshot: CatalogSnapshot,
    pub selection: Selection,
    pub outcome: SelectionOutcome,
}

impl LuxuryResult {
    /// Price text of the chosen listing as displayed.
    pub fn price_text(&self) -> &str {
        self.snapshot
            .get(self.selection.chosen_index)
            .map(|l| l.price_text.as_str())
            .unwrap_or("")
    }
}

/// Storefront home page and category listings.
pub struct StorefrontPage<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a StorefrontConfig,
}

impl<'a, D: PageDriver> StorefrontPage<'a, D> {
    pub fn new(driver: &'a D, config: &'a StorefrontConfig) -> Self {
        Self { driver, config }
    }

    /// Load the home page and wait until it is usable.
    pub async fn navigate(&self) -> Result<()> {
        info!("Navigating to {}", self.config.base_url);
        let nav = &self.config.navigation;
        self.driver
            .navigate(
                &self.config.base_url,
                NavigateOptions {
                    wait_until: nav.wait_until,
                    timeout_ms: nav.timeout_ms,
                },
            )
            .await?;
        self.driver.wait_for(&nav.ready, nav.ready_timeout_ms).await
    }

    /// Open a category by name and wait for its listings.
    pub async fn select_category(&self, name: &str) -> Result<()> {
        let selector = self
            .config
            .category_selector(name)
            .ok_or_else(|| Error::Config(format!("unknown category '{}'", name)))?;
        info!("Selecting category {}", name);
        self.driver.click(&ElementHandle::root(selector)).await?;
        self.driver
            .wait_for(&self.config.catalog.listing, self.config.catalog.scan_timeout_ms)
            .await
    }

    pub async fn product_count(&self) -> Result<usize> {
        Ok(self.listings().await?.len())
    }

    pub async fn product_titles(&self) -> Result<Vec<String>> {
        self.listing_texts(&self.config.catalog.link).await
    }

    pub async fn product_prices(&self) -> Result<Vec<String>> {
        self.listing_texts(&self.config.catalog.price).await
    }

    /// Read the current category into a snapshot.
    pub async fn scan(&self) -> Result<CatalogSnapshot> {
        CatalogScanner::new(self.driver, &self.config.catalog)
            .scan()
            .await
    }

    /// Find the most expensive listing in the current category and add it to
    /// the cart. Each call rescans the page.
    pub async fn add_luxury_item(&self) -> Result<LuxuryResult> {
        info!("Finding luxury item");
        let snapshot = self.scan().await?;
        let selection = select_luxury(&snapshot)?;
        let outcome = SelectionExecutor::new(self.driver, &self.config.catalog)
            .execute(&snapshot, &selection)
            .await?;
        Ok(LuxuryResult {
            snapshot,
            selection,
            outcome,
        })
    }

    /// Add the listing at `index` of the current category to the cart.
    pub async fn add_product_by_index(&self, index: usize) -> Result<SelectionOutcome> {
        let catalog = &self.config.catalog;
        self.driver
            .wait_for(&catalog.listing, catalog.scan_timeout_ms)
            .await?;
        let count = self.product_count().await?;
        if index >= count {
            return Err(Error::ActionFailed(format!(
                "no listing at index {} ({} shown)",
                index, count
            )));
        }
        info!("Adding listing {} to cart", index);
        let link = ElementHandle::nth(&catalog.listing, index).child(&catalog.link);
        SelectionExecutor::new(self.driver, catalog)
            .commit(&link, ObservedPrices::default())
            .await
    }

    pub async fn open_cart(&self) -> Result<CartPage<'a, D>> {
        CartPage::open(self.driver, &self.config.cart).await
    }

    async fn listings(&self) -> Result<Vec<ElementHandle>> {
        self.driver
            .locate_all(&ElementHandle::root(&self.config.catalog.listing))
            .await
    }

    async fn listing_texts(&self, selector: &str) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        for card in self.listings().await? {
            let text = self.driver.text_of(&card.child(selector)).await?;
            texts.push(text.map(|t| t.trim().to_string()).unwrap_or_default());
        }
        Ok(texts)
    }
}
