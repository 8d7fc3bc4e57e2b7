//! # storefront-e2e
//!
//! End-to-end storefront flows over a browser page driver: browse a
//! category, add its most expensive item to the cart, verify the cart and
//! check out. Scenarios are written in YAML and run deterministically.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storefront_e2e::{Config, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> storefront_e2e::Result<()> {
//! let config = Config::load("demos/laptops-luxury-checkout.yaml")?;
//! let mut runner = Runner::launch(&config.browser).await?;
//! let result = runner.run(&config).await?;
//! println!("Success: {}", result.success);
//! # Ok(())
//! # }
//! ```
//!
//! The page objects can also be driven directly:
//!
//! ```rust,no_run
//! use storefront_e2e::config::StorefrontConfig;
//! use storefront_e2e::pages::{CartVerifier, StorefrontPage};
//! use storefront_e2e::{BrowserConfig, EokaDriver};
//!
//! # #[tokio::main]
//! # async fn main() -> storefront_e2e::Result<()> {
//! let driver = EokaDriver::launch(&BrowserConfig::default()).await?;
//! let storefront = StorefrontConfig::default();
//! let home = StorefrontPage::new(&driver, &storefront);
//! home.navigate().await?;
//! home.select_category("laptops").await?;
//! let luxury = home.add_luxury_item().await?;
//! let cart = home.open_cart().await?;
//! cart.wait_for_count(1, 10_000).await?;
//! println!("{} -> {}", luxury.price_text(), cart.line_at(0).await?.price_text);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod driver;
pub mod pages;
mod runner;

pub use catalog::{CatalogSnapshot, Listing, ObservedPrices, Price, Selection, SelectionStep};
pub use config::{BrowserConfig, Config, ParamDef, Params, Step, StorefrontConfig};
pub use driver::{EokaDriver, ElementHandle, PageDriver};
pub use runner::{RunResult, Runner};

use driver::DialogKind;

/// Result type for storefront-e2e operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or running a scenario.
///
/// Every variant is fatal to the scenario in progress.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("action failed: {0}")]
    ActionFailed(String),

    /// An awaited page condition never became true.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The category scan found no parseable price.
    #[error("no valid listings; observed prices: {observed}")]
    NoValidListings { observed: ObservedPrices },

    /// A bounded wait inside the selection flow expired.
    #[error("selection step '{step}' timed out; observed prices: {observed}")]
    StepTimeout {
        step: SelectionStep,
        observed: ObservedPrices,
    },

    /// Any other failure inside the selection flow, with the prices the
    /// scan observed.
    #[error("selection failed at '{step}': {source}; observed prices: {observed}")]
    Selection {
        step: SelectionStep,
        observed: ObservedPrices,
        #[source]
        source: Box<Error>,
    },

    /// A native dialog opened while no handler was armed.
    #[error("unexpected {kind} dialog: {message:?}")]
    UnexpectedDialog { kind: DialogKind, message: String },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}

impl Error {
    /// Price texts observed by the luxury scan, when the error came from it.
    pub fn observed(&self) -> Option<&ObservedPrices> {
        match self {
            Self::NoValidListings { observed }
            | Self::StepTimeout { observed, .. }
            | Self::Selection { observed, .. } => Some(observed),
            _ => None,
        }
    }
}
