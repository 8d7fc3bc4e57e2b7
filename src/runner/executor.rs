use crate::catalog::Price;
use crate::config::steps::{AssertCartLineStep, AssertOrderModalStep};
use crate::config::{Step, StorefrontConfig};
use crate::driver::{NavigateOptions, PageDriver};
use crate::pages::{CartPage, CartVerifier, CheckoutPage, LuxuryResult, StorefrontPage};
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// State carried between the steps of one attempt.
#[derive(Default)]
pub struct ScenarioContext {
    /// The last item picked by `add_luxury_item`.
    pub last_luxury: Option<LuxuryResult>,
    pub steps_executed: usize,
}

/// Execute a single scenario step.
pub async fn execute_step<D: PageDriver>(
    driver: &D,
    storefront: &StorefrontConfig,
    step: &Step,
    ctx: &mut ScenarioContext,
) -> Result<()> {
    let home = StorefrontPage::new(driver, storefront);
    let cart = CartPage::new(driver, &storefront.cart);
    let checkout = CheckoutPage::new(driver, &storefront.checkout);

    match step {
        Step::OpenStorefront => home.navigate().await?,
        Step::Goto(s) => {
            info!("goto: {}", s.url);
            let nav = &storefront.navigation;
            driver
                .navigate(
                    &s.url,
                    NavigateOptions {
                        wait_until: nav.wait_until,
                        timeout_ms: nav.timeout_ms,
                    },
                )
                .await?;
        }
        Step::SelectCategory(s) => home.select_category(&s.name).await?,
        Step::AddLuxuryItem => {
            let luxury = home.add_luxury_item().await?;
            info!(
                "add_luxury_item: listing {} ({})",
                luxury.selection.chosen_index,
                luxury.price_text()
            );
            ctx.last_luxury = Some(luxury);
        }
        Step::AddProduct(s) => {
            home.add_product_by_index(s.index).await?;
        }
        Step::OpenCart => {
            home.open_cart().await?;
        }
        Step::AssertCartCount(s) => {
            let count = cart.wait_for_count(s.expected, s.timeout_ms).await?;
            debug!("assert_cart_count: {}", count);
        }
        Step::AssertCartLine(s) => {
            assert_cart_line(&cart, s, storefront, ctx).await?;
        }
        Step::AssertCartTotal(s) => {
            let total = cart.total().await?;
            let prefix = &storefront.catalog.currency_prefix;
            if !same_amount(&total, &s.expected, prefix) {
                return Err(Error::AssertionFailed(format!(
                    "cart total is '{}', expected '{}'",
                    total, s.expected
                )));
            }
        }
        Step::DeleteCartLine(s) => cart.delete_line(s.index).await?,
        Step::PlaceOrder => cart.place_order().await?,
        Step::FillOrder(form) => checkout.fill_order(form).await?,
        Step::Purchase => {
            checkout.purchase().await?;
            info!(
                "purchase: order {}",
                checkout.order_id().await?.unwrap_or_else(|| "?".into())
            );
        }
        Step::TryPurchase => checkout.try_purchase().await?,
        Step::AssertConfirmation(s) => {
            let message = checkout.confirmation_message().await?;
            if message != s.text.trim() {
                return Err(Error::AssertionFailed(format!(
                    "confirmation is '{}', expected '{}'",
                    message, s.text
                )));
            }
        }
        Step::AssertOrderModal(s) => {
            assert_order_modal(driver, &checkout, s, storefront).await?;
        }
        Step::ConfirmOrder => checkout.confirm().await?,
        Step::Wait(s) => {
            debug!("wait: {}ms", s.ms);
            driver.wait_ms(s.ms).await;
        }
        Step::Log(s) => info!("{}", s.message),
        Step::Screenshot(s) => {
            info!("screenshot: {}", s.path);
            let data = driver.screenshot().await?;
            std::fs::write(&s.path, data)?;
        }
    }

    Ok(())
}

async fn assert_cart_line<V: CartVerifier>(
    cart: &V,
    step: &AssertCartLineStep,
    storefront: &StorefrontConfig,
    ctx: &ScenarioContext,
) -> Result<()> {
    let line = cart.line_at(step.index).await?;
    let prefix = &storefront.catalog.currency_prefix;
    debug!("cart line {}: {:?}", step.index, line);

    if let Some(ref needle) = step.title_contains {
        if !line.title.contains(needle.as_str()) {
            return Err(Error::AssertionFailed(format!(
                "cart line {} title is '{}', expected it to contain '{}'",
                step.index, line.title, needle
            )));
        }
    }

    if let Some(ref expected) = step.price {
        if !same_amount(&line.price_text, expected, prefix) {
            return Err(Error::AssertionFailed(format!(
                "cart line {} price is '{}', expected '{}'",
                step.index, line.price_text, expected
            )));
        }
    }

    if step.luxury {
        let luxury = ctx.last_luxury.as_ref().ok_or_else(|| {
            Error::AssertionFailed("no luxury item was added in this scenario".into())
        })?;
        let expected = luxury.selection.chosen_price;
        if Price::parse_lenient(&line.price_text, prefix) != Some(expected) {
            return Err(Error::AssertionFailed(format!(
                "cart line {} price is '{}', luxury item was '{}'",
                step.index,
                line.price_text,
                luxury.price_text()
            )));
        }
    }

    Ok(())
}

async fn assert_order_modal<D: PageDriver>(
    driver: &D,
    checkout: &CheckoutPage<'_, D>,
    step: &AssertOrderModalStep,
    storefront: &StorefrontConfig,
) -> Result<()> {
    let timeout_ms = storefront.checkout.timeout_ms;
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        let visible = checkout.order_modal_visible().await?;
        if visible == step.visible {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Error::AssertionFailed(format!(
                "order modal visible={} after {}ms, expected {}",
                visible, timeout_ms, step.visible
            )));
        }
        driver.wait_ms(storefront.cart.poll_interval_ms).await;
    }
}

/// Compare two displayed amounts by value, falling back to exact text when
/// either side is not an amount.
fn same_amount(actual: &str, expected: &str, prefix: &str) -> bool {
    match (
        Price::parse_lenient(actual, prefix),
        Price::parse_lenient(expected, prefix),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => actual.trim() == expected.trim(),
    }
}
