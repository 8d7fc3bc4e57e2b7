//! Page objects for the storefront under test.

pub mod cart;
pub mod checkout;
pub mod storefront;

pub use cart::{CartLine, CartPage, CartVerifier};
pub use checkout::{CheckoutPage, OrderForm};
pub use storefront::{LuxuryResult, StorefrontPage};
