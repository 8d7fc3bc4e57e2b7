use crate::pages::OrderForm;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// A scenario step.
#[derive(Debug, Clone)]
pub enum Step {
    // Storefront
    OpenStorefront,
    Goto(GotoStep),
    SelectCategory(SelectCategoryStep),
    AddLuxuryItem,
    AddProduct(AddProductStep),

    // Cart
    OpenCart,
    AssertCartCount(AssertCartCountStep),
    AssertCartLine(AssertCartLineStep),
    AssertCartTotal(AssertCartTotalStep),
    DeleteCartLine(DeleteCartLineStep),

    // Checkout
    PlaceOrder,
    FillOrder(OrderForm),
    Purchase,
    TryPurchase,
    AssertConfirmation(AssertConfirmationStep),
    AssertOrderModal(AssertOrderModalStep),
    ConfirmOrder,

    // Misc
    Wait(WaitStep),
    Log(LogStep),
    Screenshot(ScreenshotStep),
}

impl Step {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenStorefront => "open_storefront",
            Self::Goto(_) => "goto",
            Self::SelectCategory(_) => "select_category",
            Self::AddLuxuryItem => "add_luxury_item",
            Self::AddProduct(_) => "add_product",
            Self::OpenCart => "open_cart",
            Self::AssertCartCount(_) => "assert_cart_count",
            Self::AssertCartLine(_) => "assert_cart_line",
            Self::AssertCartTotal(_) => "assert_cart_total",
            Self::DeleteCartLine(_) => "delete_cart_line",
            Self::PlaceOrder => "place_order",
            Self::FillOrder(_) => "fill_order",
            Self::Purchase => "purchase",
            Self::TryPurchase => "try_purchase",
            Self::AssertConfirmation(_) => "assert_confirmation",
            Self::AssertOrderModal(_) => "assert_order_modal",
            Self::ConfirmOrder => "confirm_order",
            Self::Wait(_) => "wait",
            Self::Log(_) => "log",
            Self::Screenshot(_) => "screenshot",
        }
    }
}

const UNIT_STEPS: &[&str] = &[
    "open_storefront",
    "add_luxury_item",
    "open_cart",
    "place_order",
    "purchase",
    "try_purchase",
    "confirm_order",
];

const STEP_NAMES: &[&str] = &[
    "open_storefront",
    "goto",
    "select_category",
    "add_luxury_item",
    "add_product",
    "open_cart",
    "assert_cart_count",
    "assert_cart_line",
    "assert_cart_total",
    "delete_cart_line",
    "place_order",
    "fill_order",
    "purchase",
    "try_purchase",
    "assert_confirmation",
    "assert_order_modal",
    "confirm_order",
    "wait",
    "log",
    "screenshot",
];

fn unit_step(name: &str) -> Option<Step> {
    match name {
        "open_storefront" => Some(Step::OpenStorefront),
        "add_luxury_item" => Some(Step::AddLuxuryItem),
        "open_cart" => Some(Step::OpenCart),
        "place_order" => Some(Step::PlaceOrder),
        "purchase" => Some(Step::Purchase),
        "try_purchase" => Some(Step::TryPurchase),
        "confirm_order" => Some(Step::ConfirmOrder),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StepVisitor)
    }
}

struct StepVisitor;

impl<'de> Visitor<'de> for StepVisitor {
    type Value = Step;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a step (string for unit steps, or map with single key)")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        unit_step(value).ok_or_else(|| de::Error::unknown_variant(value, UNIT_STEPS))
    }

    fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let key: String = map
            .next_key()?
            .ok_or_else(|| de::Error::custom("expected step type key"))?;

        if let Some(step) = unit_step(&key) {
            let _: serde_yaml::Value = map.next_value()?;
            return Ok(step);
        }

        let step = match key.as_str() {
            "goto" => Step::Goto(map.next_value()?),
            "select_category" => Step::SelectCategory(map.next_value()?),
            "add_product" => Step::AddProduct(map.next_value()?),
            "assert_cart_count" => Step::AssertCartCount(map.next_value()?),
            "assert_cart_line" => Step::AssertCartLine(map.next_value()?),
            "assert_cart_total" => Step::AssertCartTotal(map.next_value()?),
            "delete_cart_line" => Step::DeleteCartLine(map.next_value()?),
            "fill_order" => Step::FillOrder(map.next_value()?),
            "assert_confirmation" => Step::AssertConfirmation(map.next_value()?),
            "assert_order_modal" => Step::AssertOrderModal(map.next_value()?),
            "wait" => Step::Wait(map.next_value()?),
            "log" => Step::Log(map.next_value()?),
            "screenshot" => Step::Screenshot(map.next_value()?),
            other => return Err(de::Error::unknown_variant(other, STEP_NAMES)),
        };

        Ok(step)
    }
}

// --- Step payloads ---

fn default_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct GotoStep {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectCategoryStep {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddProductStep {
    pub index: usize,
}

/// Polls the cart until it holds `expected` lines.
#[derive(Debug, Clone, Deserialize)]
pub struct AssertCartCountStep {
    pub expected: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Checks one cart line. Every field that is set must match.
#[derive(Debug, Clone, Deserialize)]
pub struct AssertCartLineStep {
    pub index: usize,
    pub title_contains: Option<String>,
    /// Expected price; compared by amount, so `$1,299.00` matches `1299`.
    pub price: Option<String>,
    /// The line's price must equal the last luxury item selected.
    #[serde(default)]
    pub luxury: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssertCartTotalStep {
    pub expected: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCartLineStep {
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssertConfirmationStep {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssertOrderModalStep {
    #[serde(default = "AssertOrderModalStep::default_visible")]
    pub visible: bool,
}

impl AssertOrderModalStep {
    fn default_visible() -> bool {
        true
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitStep {
    pub ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogStep {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScreenshotStep {
    pub path: String,
}
