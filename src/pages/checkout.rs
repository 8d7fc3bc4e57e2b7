use crate::config::CheckoutConfig;
use crate::driver::{ElementHandle, PageDriver};
use crate::Result;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::info;

static ORDER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Id:\s*(\d+)").expect("valid order id regex"));
static ORDER_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Amount:\s*(\d+)").expect("valid order amount regex"));

/// Values for the order modal.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OrderForm {
    pub name: String,
    pub country: String,
    pub city: String,
    pub card: String,
    pub month: String,
    pub year: String,
}

/// The order modal and the purchase confirmation.
pub struct CheckoutPage<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a CheckoutConfig,
}

impl<'a, D: PageDriver> CheckoutPage<'a, D> {
    pub fn new(driver: &'a D, config: &'a CheckoutConfig) -> Self {
        Self { driver, config }
    }

    /// Wait for the form and fill every field.
    pub async fn fill_order(&self, form: &OrderForm) -> Result<()> {
        self.driver
            .wait_for(&self.config.name, self.config.timeout_ms)
            .await?;
        info!("Filling order form for {}", form.name);
        let fields = [
            (&self.config.name, &form.name),
            (&self.config.country, &form.country),
            (&self.config.city, &form.city),
            (&self.config.card, &form.card),
            (&self.config.month, &form.month),
            (&self.config.year, &form.year),
        ];
        for (selector, value) in fields {
            self.driver
                .fill(&ElementHandle::root(selector), value)
                .await?;
        }
        Ok(())
    }

    /// Submit the order and wait for the confirmation.
    pub async fn purchase(&self) -> Result<()> {
        info!("Purchasing");
        self.driver
            .click(&ElementHandle::root(&self.config.purchase))
            .await?;
        self.driver
            .wait_for(&self.config.confirmation, self.config.timeout_ms)
            .await
    }

    /// Submit without waiting for a confirmation.
    pub async fn try_purchase(&self) -> Result<()> {
        self.driver
            .click(&ElementHandle::root(&self.config.purchase))
            .await
    }

    pub async fn confirmation_message(&self) -> Result<String> {
        self.text(&self.config.confirmation).await
    }

    /// The confirmation body ("Id: ... Amount: ... Card Number: ...").
    pub async fn order_details(&self) -> Result<String> {
        self.text(&self.config.details).await
    }

    pub async fn order_id(&self) -> Result<Option<String>> {
        Ok(parse_order_id(&self.order_details().await?))
    }

    pub async fn order_amount(&self) -> Result<Option<String>> {
        Ok(parse_order_amount(&self.order_details().await?))
    }

    /// Dismiss the confirmation.
    pub async fn confirm(&self) -> Result<()> {
        self.driver
            .click(&ElementHandle::root(&self.config.confirm))
            .await
    }

    pub async fn order_modal_visible(&self) -> Result<bool> {
        self.driver
            .is_visible(&ElementHandle::root(&self.config.modal))
            .await
    }

    async fn text(&self, selector: &str) -> Result<String> {
        Ok(self
            .driver
            .text_of(&ElementHandle::root(selector))
            .await?
            .map(|t| t.trim().to_string())
            .unwrap_or_default())
    }
}

pub fn parse_order_id(details: &str) -> Option<String> {
    capture(&ORDER_ID_RE, details)
}

pub fn parse_order_amount(details: &str) -> Option<String> {
    capture(&ORDER_AMOUNT_RE, details)
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
