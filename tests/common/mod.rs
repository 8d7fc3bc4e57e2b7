//! In-memory storefront implementing the page driver.
//!
//! Understands the default storefront selectors and keeps just enough state
//! (current view, cart, order modal, dialogs) to run the page objects and the
//! runner without a browser. Every driver call is recorded for ordering checks.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use storefront_e2e::config::StorefrontConfig;
use storefront_e2e::driver::{
    DialogKind, DialogRecord, DialogResponse, ElementHandle, NavigateOptions, PageDriver,
    PathStep,
};
use storefront_e2e::{Error, Price, Result};

const NAVBAR: &str = "#nava";
const LISTING: &str = ".card-block";
const LISTING_PRICE: &str = "h5";
const LISTING_LINK: &str = ".card-title a";
const COMMIT: &str = ".btn.btn-success.btn-lg";
const CART_LINK: &str = "#cartur";
const CART_TABLE: &str = "tbody#tbodyid";
const CART_ROW: &str = "tbody#tbodyid > tr";
const ROW_TITLE: &str = "td:nth-child(2)";
const ROW_PRICE: &str = "td:nth-child(3)";
const ROW_DELETE: &str = "td:nth-child(4) a";
const CART_TOTAL: &str = "#totalp";
const PLACE_ORDER: &str = "button[data-target=\"#orderModal\"]";
const ORDER_MODAL: &str = "#orderModal";
const FORM_FIELDS: &[&str] = &["#name", "#country", "#city", "#card", "#month", "#year"];
const PURCHASE: &str = "button[onclick=\"purchaseOrder()\"]";
const CONFIRMATION: &str = ".sweet-alert h2";
const DETAILS: &str = ".sweet-alert .lead";
const CONFIRM: &str = ".confirm.btn.btn-lg.btn-primary";

pub const ADDED_MESSAGE: &str = "Product added.";
pub const THANK_YOU: &str = "Thank you for your purchase!";

/// Storefront config matching the fake, with timeouts short enough for tests.
pub fn fast_config() -> StorefrontConfig {
    let mut config = StorefrontConfig::default();
    config.base_url = "http://storefront.test/".into();
    config.navigation.ready_timeout_ms = 100;
    config.catalog.scan_timeout_ms = 100;
    config.catalog.commit_timeout_ms = 100;
    config.catalog.dialog_timeout_ms = 100;
    config.catalog.settle_ms = 0;
    config.cart.timeout_ms = 200;
    config.cart.poll_interval_ms = 1;
    config.checkout.timeout_ms = 100;
    config
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub title: String,
    pub price_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    Blank,
    Home,
    DetailLoading,
    Detail(Product),
    Cart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Navbar,
    CartLink,
    Category(String),
    Listing(usize),
    ListingPrice(usize),
    ListingLink(usize),
    Commit,
    CartTable,
    Row(usize),
    RowTitle(usize),
    RowPrice(usize),
    RowDelete(usize),
    Total,
    PlaceOrder,
    Modal,
    Field(String),
    Purchase,
    Confirmation,
    Details,
    Confirm,
}

struct State {
    view: View,
    category: Option<String>,
    catalogs: HashMap<String, Vec<Product>>,
    cart: Vec<Product>,
    hidden_polls: usize,
    armed: Option<DialogResponse>,
    handled: VecDeque<DialogRecord>,
    unexpected: VecDeque<DialogRecord>,
    order_modal: bool,
    form: HashMap<String, String>,
    confirmed_order: Option<String>,
    calls: Vec<String>,
    navigations: usize,

    // fault injection
    dialog_on_commit: bool,
    detail_loads: bool,
    persist_commits: bool,
    failing_navigations: usize,
    failing_clicks: HashMap<String, usize>,
    failing_clear: bool,
    cart_load_polls: usize,
}

pub struct FakeStorefront {
    state: Mutex<State>,
    categories: StorefrontConfig,
}

impl FakeStorefront {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                view: View::Blank,
                category: None,
                catalogs: HashMap::new(),
                cart: Vec::new(),
                hidden_polls: 0,
                armed: None,
                handled: VecDeque::new(),
                unexpected: VecDeque::new(),
                order_modal: false,
                form: HashMap::new(),
                confirmed_order: None,
                calls: Vec::new(),
                navigations: 0,
                dialog_on_commit: true,
                detail_loads: true,
                persist_commits: true,
                failing_navigations: 0,
                failing_clicks: HashMap::new(),
                failing_clear: false,
                cart_load_polls: 2,
            }),
            categories: StorefrontConfig::default(),
        }
    }

    /// The demo laptops and phones categories.
    pub fn demo() -> Self {
        Self::new()
            .with_category(
                "laptops",
                &[
                    ("Sony vaio i5", "$790"),
                    ("Sony vaio i7", "$790"),
                    ("MacBook air", "$700"),
                    ("Dell i7 8gb", "$700"),
                    ("2017 Dell 15.6 Inch", "$700"),
                    ("MacBook Pro", "$1100"),
                ],
            )
            .with_category(
                "phones",
                &[
                    ("Samsung galaxy s6", "$360"),
                    ("Nokia lumia 1520", "$820"),
                    ("Nexus 6", "$650"),
                    ("Iphone 6 32gb", "$790"),
                ],
            )
    }

    /// Listings shown when the named category is selected.
    pub fn with_category(self, name: &str, products: &[(&str, &str)]) -> Self {
        let selector = self
            .categories
            .category_selector(name)
            .unwrap_or(name)
            .to_string();
        let products = products
            .iter()
            .map(|(title, price)| Product {
                title: title.to_string(),
                price_text: price.to_string(),
            })
            .collect();
        self.lock().catalogs.insert(selector, products);
        self
    }

    /// The commit control adds to the cart without raising a dialog.
    pub fn without_dialog(self) -> Self {
        self.lock().dialog_on_commit = false;
        self
    }

    /// Clicking a listing never renders the detail page.
    pub fn detail_never_loads(self) -> Self {
        self.lock().detail_loads = false;
        self
    }

    /// Commits raise their dialog but nothing reaches the cart.
    pub fn dropping_commits(self) -> Self {
        self.lock().persist_commits = false;
        self
    }

    /// The first `n` navigations time out.
    pub fn failing_navigations(self, n: usize) -> Self {
        self.lock().failing_navigations = n;
        self
    }

    /// The first `n` clicks on the element displayed as `target` fail.
    pub fn failing_clicks(self, target: &str, n: usize) -> Self {
        self.lock().failing_clicks.insert(target.to_string(), n);
        self
    }

    /// Disarming a dialog handler fails.
    pub fn failing_clear(self) -> Self {
        self.lock().failing_clear = true;
        self
    }

    /// Cart rows stay hidden for this many row lookups after opening.
    pub fn cart_load_polls(self, n: usize) -> Self {
        self.lock().cart_load_polls = n;
        self
    }

    /// Change the listings of a category in place.
    pub fn set_prices(&self, name: &str, products: &[(&str, &str)]) {
        let selector = self
            .categories
            .category_selector(name)
            .unwrap_or(name)
            .to_string();
        self.lock().catalogs.insert(
            selector,
            products
                .iter()
                .map(|(title, price)| Product {
                    title: title.to_string(),
                    price_text: price.to_string(),
                })
                .collect(),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Index of the first recorded call starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.lock().calls.iter().position(|c| c.starts_with(prefix))
    }

    pub fn cart_titles(&self) -> Vec<String> {
        self.lock().cart.iter().map(|p| p.title.clone()).collect()
    }

    pub fn is_armed(&self) -> bool {
        self.lock().armed.is_some()
    }

    pub fn resets(&self) -> usize {
        self.lock().calls.iter().filter(|c| *c == "reset").count()
    }

    pub fn navigations(&self) -> usize {
        self.lock().navigations
    }

    pub fn confirmed_order(&self) -> Option<String> {
        self.lock().confirmed_order.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl Default for FakeStorefront {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn listings(&self) -> &[Product] {
        match (&self.view, &self.category) {
            (View::Home, Some(cat)) => self.catalogs.get(cat).map(Vec::as_slice).unwrap_or(&[]),
            _ => &[],
        }
    }

    fn visible_rows(&self) -> usize {
        if self.view == View::Cart && self.hidden_polls == 0 {
            self.cart.len()
        } else {
            0
        }
    }

    fn node(&self, path: &[PathStep]) -> Option<Node> {
        let steps: Vec<(&str, usize)> = path
            .iter()
            .map(|s| (s.selector.as_str(), s.nth))
            .collect();
        match steps.as_slice() {
            [(selector, nth)] => self.root_node(selector, *nth),
            [(LISTING, i), (child, 0)] if *i < self.listings().len() => match *child {
                LISTING_PRICE => Some(Node::ListingPrice(*i)),
                LISTING_LINK => Some(Node::ListingLink(*i)),
                _ => None,
            },
            [(CART_ROW, i), (child, 0)] if *i < self.visible_rows() => match *child {
                ROW_TITLE => Some(Node::RowTitle(*i)),
                ROW_PRICE => Some(Node::RowPrice(*i)),
                ROW_DELETE => Some(Node::RowDelete(*i)),
                _ => None,
            },
            _ => None,
        }
    }

    fn root_node(&self, selector: &str, nth: usize) -> Option<Node> {
        if self.view == View::Blank {
            return None;
        }
        let on_cart = self.view == View::Cart;
        let first = nth == 0;
        match selector {
            NAVBAR if first => Some(Node::Navbar),
            CART_LINK if first => Some(Node::CartLink),
            LISTING if nth < self.listings().len() => Some(Node::Listing(nth)),
            COMMIT if first && matches!(self.view, View::Detail(_)) => Some(Node::Commit),
            CART_TABLE if first && on_cart => Some(Node::CartTable),
            CART_ROW if nth < self.visible_rows() => Some(Node::Row(nth)),
            CART_TOTAL if first && on_cart => Some(Node::Total),
            PLACE_ORDER if first && on_cart => Some(Node::PlaceOrder),
            ORDER_MODAL if first && on_cart => Some(Node::Modal),
            PURCHASE if first && on_cart => Some(Node::Purchase),
            CONFIRMATION if first && self.confirmed_order.is_some() => Some(Node::Confirmation),
            DETAILS if first && self.confirmed_order.is_some() => Some(Node::Details),
            CONFIRM if first && self.confirmed_order.is_some() => Some(Node::Confirm),
            field if first && on_cart && FORM_FIELDS.contains(&field) => {
                Some(Node::Field(field.to_string()))
            }
            category
                if first && self.view == View::Home && self.catalogs.contains_key(category) =>
            {
                Some(Node::Category(category.to_string()))
            }
            _ => None,
        }
    }

    fn total(&self) -> String {
        let cents: u64 = self
            .cart
            .iter()
            .filter_map(|p| Price::parse_lenient(&p.price_text, "$"))
            .map(|p| p.cents())
            .sum();
        if cents == 0 {
            String::new()
        } else if cents % 100 == 0 {
            (cents / 100).to_string()
        } else {
            Price::from_cents(cents).to_string()
        }
    }

    fn text(&self, node: &Node) -> String {
        match node {
            Node::Listing(i) => {
                let p = &self.listings()[*i];
                format!("{}\n{}", p.title, p.price_text)
            }
            Node::ListingPrice(i) => format!("  {}\n", self.listings()[*i].price_text),
            Node::ListingLink(i) => self.listings()[*i].title.clone(),
            Node::RowTitle(i) => self.cart[*i].title.clone(),
            Node::RowPrice(i) => self.cart[*i].price_text.clone(),
            Node::RowDelete(_) => "Delete".into(),
            Node::Total => self.total(),
            Node::Confirmation => THANK_YOU.into(),
            Node::Details => self.confirmed_order.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// A native dialog fires. Answered by the armed handler, otherwise queued
    /// as unexpected.
    fn raise(&mut self, kind: DialogKind, message: &str) {
        let record = DialogRecord {
            kind,
            message: message.to_string(),
        };
        if self.armed.take().is_some() {
            self.handled.push_back(record);
        } else {
            self.unexpected.push_back(record);
        }
    }

    fn take_unexpected(&mut self) -> Result<()> {
        match self.unexpected.pop_front() {
            Some(d) => Err(Error::UnexpectedDialog {
                kind: d.kind,
                message: d.message,
            }),
            None => Ok(()),
        }
    }

    fn click(&mut self, node: Node) -> Result<()> {
        match node {
            Node::Category(selector) => self.category = Some(selector),
            Node::ListingLink(i) => {
                let product = self.listings()[i].clone();
                self.view = if self.detail_loads {
                    View::Detail(product)
                } else {
                    View::DetailLoading
                };
            }
            Node::Commit => {
                if let View::Detail(ref product) = self.view {
                    if self.persist_commits {
                        self.cart.push(product.clone());
                    }
                }
                if self.dialog_on_commit {
                    self.raise(DialogKind::Alert, ADDED_MESSAGE);
                }
            }
            Node::CartLink => {
                self.view = View::Cart;
                self.hidden_polls = self.cart_load_polls;
                self.order_modal = false;
            }
            Node::RowDelete(i) => {
                self.cart.remove(i);
            }
            Node::PlaceOrder => self.order_modal = true,
            Node::Purchase => {
                let filled = |k: &str| self.form.get(k).is_some_and(|v| !v.is_empty());
                if filled("#name") && filled("#card") {
                    let details = format!(
                        "Id: 4242\nAmount: {} USD\nCard Number: {}\nName: {}\nDate: 16/10/2026",
                        self.total(),
                        self.form["#card"],
                        self.form["#name"],
                    );
                    self.confirmed_order = Some(details);
                    self.order_modal = false;
                } else {
                    self.raise(DialogKind::Alert, "Please fill out Name and Creditcard.");
                }
            }
            Node::Confirm => {
                self.confirmed_order = None;
                self.cart.clear();
                self.form.clear();
                self.view = View::Home;
                self.category = None;
            }
            _ => {}
        }
        self.take_unexpected()
    }
}

#[async_trait(?Send)]
impl PageDriver for FakeStorefront {
    async fn reset(&self) -> Result<()> {
        let mut state = self.lock();
        state.calls.push("reset".into());
        state.view = View::Blank;
        state.category = None;
        state.cart.clear();
        state.armed = None;
        state.handled.clear();
        state.unexpected.clear();
        state.order_modal = false;
        state.form.clear();
        state.confirmed_order = None;
        Ok(())
    }

    async fn navigate(&self, url: &str, _opts: NavigateOptions) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(format!("navigate:{}", url));
        state.navigations += 1;
        if state.failing_navigations > 0 {
            state.failing_navigations -= 1;
            return Err(Error::Timeout(format!("navigation to {} timed out", url)));
        }
        state.view = if url.ends_with("cart.html") {
            View::Cart
        } else {
            View::Home
        };
        state.category = None;
        state.order_modal = false;
        state.confirmed_order = None;
        Ok(())
    }

    async fn locate_all(&self, handle: &ElementHandle) -> Result<Vec<ElementHandle>> {
        let mut state = self.lock();
        if handle.selector() == CART_ROW && state.view == View::Cart && state.hidden_polls > 0 {
            state.hidden_polls -= 1;
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for i in 0.. {
            let candidate = handle.with_nth(i);
            if state.node(candidate.path()).is_none() {
                break;
            }
            found.push(candidate);
        }
        Ok(found)
    }

    async fn text_of(&self, handle: &ElementHandle) -> Result<Option<String>> {
        let state = self.lock();
        Ok(state.node(handle.path()).map(|n| state.text(&n)))
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(format!("click:{}", handle));
        if let Some(remaining) = state.failing_clicks.get_mut(&handle.to_string()) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::ActionFailed(format!("'{}' is detached", handle)));
            }
        }
        let node = state
            .node(handle.path())
            .ok_or_else(|| Error::ActionFailed(format!("element '{}' not found", handle)))?;
        state.click(node)
    }

    async fn fill(&self, handle: &ElementHandle, value: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(format!("fill:{}={}", handle, value));
        match state.node(handle.path()) {
            Some(Node::Field(field)) => {
                state.form.insert(field, value.to_string());
                Ok(())
            }
            _ => Err(Error::ActionFailed(format!("cannot fill '{}'", handle))),
        }
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool> {
        let state = self.lock();
        Ok(match state.node(handle.path()) {
            Some(Node::Modal) => state.order_modal,
            Some(_) => true,
            None => false,
        })
    }

    async fn on_next_dialog(&self, response: DialogResponse) -> Result<()> {
        let mut state = self.lock();
        state.calls.push("on_next_dialog".into());
        state.take_unexpected()?;
        state.armed = Some(response);
        Ok(())
    }

    async fn wait_for_dialog(&self, timeout_ms: u64) -> Result<DialogRecord> {
        let mut state = self.lock();
        state.calls.push("wait_for_dialog".into());
        state
            .handled
            .pop_front()
            .ok_or_else(|| Error::Timeout(format!("no dialog raised within {}ms", timeout_ms)))
    }

    async fn clear_dialog_handler(&self) -> Result<()> {
        let mut state = self.lock();
        state.calls.push("clear_dialog_handler".into());
        if state.failing_clear {
            return Err(Error::ActionFailed("dialog handler busy".into()));
        }
        state.armed = None;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(format!("wait_for:{}", selector));
        let step = PathStep {
            selector: selector.to_string(),
            nth: 0,
        };
        if state.node(&[step]).is_some() {
            Ok(())
        } else {
            Err(Error::Timeout(format!(
                "'{}' not present after {}ms",
                selector, timeout_ms
            )))
        }
    }

    async fn wait_ms(&self, _ms: u64) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.lock().calls.push("screenshot".into());
        Ok(b"\x89PNG".to_vec())
    }
}
