//! Page driver abstraction.
//!
//! Everything the page objects need from a browser goes through
//! [`PageDriver`]. The production implementation is [`EokaDriver`]; tests use
//! an in-memory storefront.

mod cdp;

pub use cdp::EokaDriver;

use crate::Result;
use async_trait::async_trait;
use std::fmt;

/// One step of an element path: the `nth` match of `selector`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PathStep {
    pub selector: String,
    pub nth: usize,
}

/// Reference to an element, re-resolved against the live document on use.
///
/// The path starts at the document root; each step queries inside the
/// element matched by the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    path: Vec<PathStep>,
}

impl ElementHandle {
    /// First match of `selector` in the document.
    pub fn root(selector: impl Into<String>) -> Self {
        Self::nth(selector, 0)
    }

    /// `nth` match of `selector` in the document.
    pub fn nth(selector: impl Into<String>, nth: usize) -> Self {
        Self {
            path: vec![PathStep {
                selector: selector.into(),
                nth,
            }],
        }
    }

    /// First match of `selector` inside this element.
    pub fn child(&self, selector: impl Into<String>) -> Self {
        self.child_nth(selector, 0)
    }

    /// `nth` match of `selector` inside this element.
    pub fn child_nth(&self, selector: impl Into<String>, nth: usize) -> Self {
        let mut path = self.path.clone();
        path.push(PathStep {
            selector: selector.into(),
            nth,
        });
        Self { path }
    }

    /// Same path, but with the last step pointing at match `nth`.
    pub fn with_nth(&self, nth: usize) -> Self {
        let mut path = self.path.clone();
        if let Some(last) = path.last_mut() {
            last.nth = nth;
        }
        Self { path }
    }

    pub fn path(&self) -> &[PathStep] {
        &self.path
    }

    /// Selector of the last step.
    pub fn selector(&self) -> &str {
        self.path.last().map(|s| s.selector.as_str()).unwrap_or("")
    }

    /// Index of the last step.
    pub fn index(&self) -> usize {
        self.path.last().map(|s| s.nth).unwrap_or(0)
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{}", step.selector)?;
            if step.nth > 0 {
                write!(f, " >> nth={}", step.nth)?;
            }
        }
        Ok(())
    }
}

/// Load milestone a navigation waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    #[default]
    DomContentLoaded,
    Load,
    NetworkIdle,
}

#[derive(Debug, Clone, Copy)]
pub struct NavigateOptions {
    pub wait_until: WaitUntil,
    pub timeout_ms: u64,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitUntil::DomContentLoaded,
            timeout_ms: 30_000,
        }
    }
}

/// How an armed handler answers the next native dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResponse {
    Accept,
    Dismiss,
}

/// Kind of native dialog raised by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    Alert,
    Confirm,
    Prompt,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Alert => "alert",
            Self::Confirm => "confirm",
            Self::Prompt => "prompt",
        })
    }
}

/// A dialog consumed by an armed handler.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct DialogRecord {
    pub kind: DialogKind,
    pub message: String,
}

/// Capabilities the page objects consume from a browser.
///
/// Every method is a suspension point; callers await each one before issuing
/// the next. A driver owns exactly one page, so parallel scenarios need one
/// driver each.
#[async_trait(?Send)]
pub trait PageDriver {
    /// Drop the session: cookies, storage and any armed dialog handler, then
    /// leave the page blank. The store-side cart goes with the session.
    async fn reset(&self) -> Result<()>;

    /// Navigate and wait for `opts.wait_until`.
    async fn navigate(&self, url: &str, opts: NavigateOptions) -> Result<()>;

    /// All elements currently matching the last step of `handle`, each as a
    /// handle with its own index.
    async fn locate_all(&self, handle: &ElementHandle) -> Result<Vec<ElementHandle>>;

    /// Text content, or `None` if the element does not exist.
    async fn text_of(&self, handle: &ElementHandle) -> Result<Option<String>>;

    async fn click(&self, handle: &ElementHandle) -> Result<()>;

    async fn fill(&self, handle: &ElementHandle, value: &str) -> Result<()>;

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool>;

    /// Arm a one-shot handler for the next native dialog.
    async fn on_next_dialog(&self, response: DialogResponse) -> Result<()>;

    /// Wait until the armed handler has consumed a dialog.
    ///
    /// Fails with [`crate::Error::Timeout`] if nothing fires within the bound.
    async fn wait_for_dialog(&self, timeout_ms: u64) -> Result<DialogRecord>;

    /// Drop an armed handler that has not fired.
    async fn clear_dialog_handler(&self) -> Result<()>;

    /// Wait until `selector` matches at least one element.
    ///
    /// Fails with [`crate::Error::Timeout`] when the bound expires.
    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    async fn wait_ms(&self, ms: u64);

    async fn screenshot(&self) -> Result<Vec<u8>>;
}
