use super::{
    DialogRecord, DialogResponse, ElementHandle, NavigateOptions, PageDriver, PathStep, WaitUntil,
};
use crate::config::BrowserConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use eoka::{Browser, Page};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

const POLL_INTERVAL_MS: u64 = 100;

/// Resolves an element path (JSON array of `{selector, nth}`) to an element.
const RESOLVE_JS: &str = r#"
function __sfResolve(path) {
    let node = document;
    for (const step of path) {
        node = node.querySelectorAll(step.selector)[step.nth];
        if (!node) return null;
    }
    return node;
}
"#;

/// Replaces `alert`/`confirm`/`prompt` with recorders.
///
/// An armed response is consumed by the first dialog and cleared. Dialogs
/// raised while nothing is armed land in `unexpected` so the driver can
/// surface them on its next call instead of letting them block the page.
const DIALOG_GUARD_JS: &str = r#"(() => {
    if (window.__sfDialogs) return true;
    const state = window.__sfDialogs = { armed: null, handled: [], unexpected: [] };
    const record = (kind, accepted, dismissed) => function (message) {
        const entry = { kind, message: String(message ?? '') };
        const armed = state.armed;
        if (armed) {
            state.armed = null;
            state.handled.push(entry);
            return armed === 'accept' ? accepted : dismissed;
        }
        state.unexpected.push(entry);
        return dismissed;
    };
    window.alert = record('alert', undefined, undefined);
    window.confirm = record('confirm', true, false);
    window.prompt = record('prompt', '', null);
    return true;
})()"#;

/// [`PageDriver`] backed by an eoka (CDP) browser page.
pub struct EokaDriver {
    browser: Browser,
    page: Page,
    next_token: AtomicU64,
}

impl EokaDriver {
    /// Launch a browser and open a blank page.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            next_token: AtomicU64::new(1),
        })
    }

    /// The underlying page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }

    async fn eval_on<T>(&self, handle: &ElementHandle, body: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let js = format!(
            "(() => {{ {RESOLVE_JS} const el = __sfResolve({path}); {body} }})()",
            path = path_json(handle.path())?
        );
        Ok(self.page.evaluate(&js).await?)
    }

    /// Mark the element with a unique attribute and return a CSS selector for it.
    async fn pin(&self, handle: &ElementHandle) -> Result<String> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let found: bool = self
            .eval_on(
                handle,
                &format!("if (!el) return false; el.setAttribute('data-sf-handle', '{token}'); return true;"),
            )
            .await?;
        if !found {
            return Err(Error::ActionFailed(format!("element '{}' not found", handle)));
        }
        Ok(format!("[data-sf-handle=\"{token}\"]"))
    }

    async fn install_dialog_guard(&self) -> Result<()> {
        let _: bool = self.page.evaluate(DIALOG_GUARD_JS).await?;
        Ok(())
    }

    async fn check_unexpected_dialog(&self) -> Result<()> {
        let pending: Option<DialogRecord> = self
            .page
            .evaluate("(window.__sfDialogs && window.__sfDialogs.unexpected.shift()) || null")
            .await?;
        match pending {
            Some(dialog) => Err(Error::UnexpectedDialog {
                kind: dialog.kind,
                message: dialog.message,
            }),
            None => Ok(()),
        }
    }

    async fn wait_ready_state(&self, complete: bool, timeout_ms: u64) -> Result<()> {
        let js = if complete {
            "document.readyState === 'complete'"
        } else {
            "document.readyState !== 'loading'"
        };
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let ready: bool = self.page.evaluate(js).await?;
            if ready {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "document not ready after {}ms",
                    timeout_ms
                )));
            }
            self.page.wait(POLL_INTERVAL_MS).await;
        }
    }
}

fn path_json(path: &[PathStep]) -> Result<String> {
    Ok(serde_json::to_string(path)?)
}

/// Clears web storage for the current origin. Throws on opaque origins such
/// as `about:blank`, hence the guard.
const CLEAR_STORAGE_JS: &str = r#"(() => {
    try { localStorage.clear(); sessionStorage.clear(); } catch (e) {}
    for (const c of document.cookie.split(';')) {
        const name = c.split('=')[0].trim();
        if (name) document.cookie = name + '=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/';
    }
    return true;
})()"#;

#[async_trait(?Send)]
impl PageDriver for EokaDriver {
    async fn reset(&self) -> Result<()> {
        let cookies = serde_json::to_value(self.page.cookies().await?)?;
        let mut deleted = 0;
        for cookie in cookies.as_array().into_iter().flatten() {
            let Some(name) = cookie.get("name").and_then(|v| v.as_str()) else {
                continue;
            };
            let domain = cookie.get("domain").and_then(|v| v.as_str());
            self.page.delete_cookie(name, domain).await?;
            deleted += 1;
        }
        let _: bool = self.page.evaluate(CLEAR_STORAGE_JS).await?;
        debug!("reset: deleted {} cookie(s)", deleted);
        self.page.goto("about:blank").await?;
        Ok(())
    }

    async fn navigate(&self, url: &str, opts: NavigateOptions) -> Result<()> {
        debug!("navigate: {} ({:?}, {}ms)", url, opts.wait_until, opts.timeout_ms);
        tokio::time::timeout(Duration::from_millis(opts.timeout_ms), self.page.goto(url))
            .await
            .map_err(|_| {
                Error::Timeout(format!("navigation to {} exceeded {}ms", url, opts.timeout_ms))
            })??;

        match opts.wait_until {
            WaitUntil::DomContentLoaded => self.wait_ready_state(false, opts.timeout_ms).await?,
            WaitUntil::Load => self.wait_ready_state(true, opts.timeout_ms).await?,
            WaitUntil::NetworkIdle => {
                self.page
                    .wait_for_network_idle(500, opts.timeout_ms)
                    .await?;
            }
        }
        self.install_dialog_guard().await
    }

    async fn locate_all(&self, handle: &ElementHandle) -> Result<Vec<ElementHandle>> {
        let parent = &handle.path()[..handle.path().len().saturating_sub(1)];
        let js = format!(
            "(() => {{ {RESOLVE_JS} const scope = __sfResolve({parent}); \
             return scope ? scope.querySelectorAll({sel}).length : 0; }})()",
            parent = path_json(parent)?,
            sel = serde_json::to_string(handle.selector())?,
        );
        let count: usize = self.page.evaluate(&js).await?;
        Ok((0..count).map(|i| handle.with_nth(i)).collect())
    }

    async fn text_of(&self, handle: &ElementHandle) -> Result<Option<String>> {
        self.eval_on(handle, "return el ? el.textContent : null;").await
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        let selector = self.pin(handle).await?;
        debug!("click: {}", handle);
        self.page.click(&selector).await?;
        self.check_unexpected_dialog().await
    }

    async fn fill(&self, handle: &ElementHandle, value: &str) -> Result<()> {
        let selector = self.pin(handle).await?;
        debug!("fill: {}", handle);
        self.page.fill(&selector, value).await?;
        Ok(())
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool> {
        self.eval_on(
            handle,
            "if (!el) return false; const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && s.display !== 'none' && s.visibility !== 'hidden';",
        )
        .await
    }

    async fn on_next_dialog(&self, response: DialogResponse) -> Result<()> {
        self.install_dialog_guard().await?;
        self.check_unexpected_dialog().await?;
        let answer = match response {
            DialogResponse::Accept => "accept",
            DialogResponse::Dismiss => "dismiss",
        };
        let _: bool = self
            .page
            .evaluate(&format!("(window.__sfDialogs.armed = '{answer}', true)"))
            .await?;
        Ok(())
    }

    async fn wait_for_dialog(&self, timeout_ms: u64) -> Result<DialogRecord> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let handled: Option<DialogRecord> = self
                .page
                .evaluate("(window.__sfDialogs && window.__sfDialogs.handled.shift()) || null")
                .await?;
            if let Some(dialog) = handled {
                debug!("dialog accepted: {} '{}'", dialog.kind, dialog.message);
                return Ok(dialog);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "no dialog raised within {}ms",
                    timeout_ms
                )));
            }
            self.page.wait(POLL_INTERVAL_MS).await;
        }
    }

    async fn clear_dialog_handler(&self) -> Result<()> {
        let _: bool = self
            .page
            .evaluate("(window.__sfDialogs && (window.__sfDialogs.armed = null), true)")
            .await?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        if let Err(e) = self.page.wait_for(selector, timeout_ms).await {
            warn!("wait_for '{}' failed: {}", selector, e);
            return Err(Error::Timeout(format!(
                "'{}' not present after {}ms",
                selector, timeout_ms
            )));
        }
        self.install_dialog_guard().await
    }

    async fn wait_ms(&self, ms: u64) {
        self.page.wait(ms).await;
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(self.page.screenshot().await?)
    }
}
