use crate::config::CartConfig;
use crate::driver::{ElementHandle, PageDriver};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// One line of the cart table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub title: String,
    pub price_text: String,
}

/// Read-only view of the cart used to confirm what a flow persisted.
#[async_trait(?Send)]
pub trait CartVerifier {
    /// Lines currently shown.
    async fn count(&self) -> Result<usize>;

    /// Line at `index`, in table order.
    async fn line_at(&self, index: usize) -> Result<CartLine>;

    /// Total as displayed.
    async fn total(&self) -> Result<String>;
}

/// The cart page.
///
/// Opening waits for the cart table only. Lines are filled in asynchronously
/// by the store, so callers that expect a number of lines use
/// [`CartPage::wait_for_count`] rather than a one-off [`CartVerifier::count`].
pub struct CartPage<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a CartConfig,
}

impl<'a, D: PageDriver> CartPage<'a, D> {
    /// Attach to a cart page that is already displayed.
    pub fn new(driver: &'a D, config: &'a CartConfig) -> Self {
        Self { driver, config }
    }

    /// Click the cart link and wait for the cart table.
    pub async fn open(driver: &'a D, config: &'a CartConfig) -> Result<Self> {
        info!("Opening cart");
        driver.click(&ElementHandle::root(&config.link)).await?;
        driver.wait_for(&config.table, config.timeout_ms).await?;
        Ok(Self::new(driver, config))
    }

    /// Poll until the cart holds exactly `expected` lines.
    pub async fn wait_for_count(&self, expected: usize, timeout_ms: u64) -> Result<usize> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let count = self.count().await?;
            if count == expected {
                return Ok(count);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "cart shows {} line(s), expected {} after {}ms",
                    count, expected, timeout_ms
                )));
            }
            debug!("cart count {} (waiting for {})", count, expected);
            self.driver.wait_ms(self.config.poll_interval_ms).await;
        }
    }

    /// All lines, in table order.
    pub async fn lines(&self) -> Result<Vec<CartLine>> {
        let count = self.count().await?;
        let mut lines = Vec::with_capacity(count);
        for i in 0..count {
            lines.push(self.line_at(i).await?);
        }
        Ok(lines)
    }

    /// Delete line `index` and wait for the table to shrink.
    pub async fn delete_line(&self, index: usize) -> Result<()> {
        let before = self.count().await?;
        if index >= before {
            return Err(Error::ActionFailed(format!(
                "cannot delete cart line {}: cart has {}",
                index, before
            )));
        }
        info!("Deleting cart line {}", index);
        self.driver
            .click(&self.row(index).child(&self.config.delete))
            .await?;
        self.wait_for_count(before - 1, self.config.timeout_ms)
            .await
            .map(|_| ())
    }

    /// Open the order form.
    pub async fn place_order(&self) -> Result<()> {
        info!("Placing order");
        self.driver
            .click(&ElementHandle::root(&self.config.place_order))
            .await
    }

    fn row(&self, index: usize) -> ElementHandle {
        ElementHandle::nth(&self.config.row, index)
    }
}

#[async_trait(?Send)]
impl<'a, D: PageDriver> CartVerifier for CartPage<'a, D> {
    async fn count(&self) -> Result<usize> {
        Ok(self
            .driver
            .locate_all(&ElementHandle::root(&self.config.row))
            .await?
            .len())
    }

    async fn line_at(&self, index: usize) -> Result<CartLine> {
        let row = self.row(index);
        let title = self.driver.text_of(&row.child(&self.config.title)).await?;
        let price = self.driver.text_of(&row.child(&self.config.price)).await?;
        match (title, price) {
            (Some(title), Some(price)) => Ok(CartLine {
                title: title.trim().to_string(),
                price_text: price.trim().to_string(),
            }),
            _ => Err(Error::ActionFailed(format!("cart line {} not found", index))),
        }
    }

    async fn total(&self) -> Result<String> {
        Ok(self
            .driver
            .text_of(&ElementHandle::root(&self.config.total))
            .await?
            .map(|t| t.trim().to_string())
            .unwrap_or_default())
    }
}
