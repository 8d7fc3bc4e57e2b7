pub mod params;
pub mod schema;
pub mod steps;

pub use params::{ParamDef, Params};
pub use schema::{
    BrowserConfig, CartConfig, CatalogConfig, CheckoutConfig, Config, NavigationConfig,
    OnFailure, RetryConfig, StorefrontConfig, Viewport,
};
pub use steps::Step;
