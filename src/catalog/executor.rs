use super::{CatalogSnapshot, ObservedPrices, Selection};
use crate::config::CatalogConfig;
use crate::driver::{DialogRecord, DialogResponse, ElementHandle, PageDriver};
use crate::{Error, Result};
use std::fmt;
use tracing::{debug, info, warn};

/// States of the click-through and commit flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStep {
    CategoryListed,
    DetailLoading,
    DetailReady,
    CommitArmed,
    DialogRaised,
    ItemAdded,
}

impl fmt::Display for SelectionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CategoryListed => "category_listed",
            Self::DetailLoading => "detail_loading",
            Self::DetailReady => "detail_ready",
            Self::CommitArmed => "commit_armed",
            Self::DialogRaised => "dialog_raised",
            Self::ItemAdded => "item_added",
        })
    }
}

/// What a completed commit flow went through.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    /// The dialog accepted after the commit click.
    pub dialog: DialogRecord,
    /// States entered, in order.
    pub trace: Vec<SelectionStep>,
}

/// Clicks a listing through to its detail page and adds it to the cart.
///
/// `ItemAdded` only means the commit click was issued and its dialog was
/// accepted. Whether the store persisted the line is for the cart to tell.
pub struct SelectionExecutor<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a CatalogConfig,
}

struct Flow {
    state: SelectionStep,
    trace: Vec<SelectionStep>,
    observed: ObservedPrices,
}

impl Flow {
    fn new(observed: ObservedPrices) -> Self {
        Self {
            state: SelectionStep::CategoryListed,
            trace: vec![SelectionStep::CategoryListed],
            observed,
        }
    }

    fn enter(&mut self, next: SelectionStep) {
        debug!("selection: {} -> {}", self.state, next);
        self.state = next;
        self.trace.push(next);
    }

    /// Attach the current state and observed prices to a failure.
    ///
    /// Bounded-wait timeouts become [`Error::StepTimeout`]; other errors are
    /// wrapped in [`Error::Selection`] when there are prices to report.
    fn fail(&self, err: Error) -> Error {
        match err {
            Error::Timeout(_) => Error::StepTimeout {
                step: self.state,
                observed: self.observed.clone(),
            },
            other if self.observed.is_empty() || other.observed().is_some() => other,
            other => Error::Selection {
                step: self.state,
                observed: self.observed.clone(),
                source: Box::new(other),
            },
        }
    }

    /// A handler was armed and may not have been consumed.
    fn armed(&self) -> bool {
        matches!(
            self.state,
            SelectionStep::CommitArmed | SelectionStep::DialogRaised
        )
    }
}

impl<'a, D: PageDriver> SelectionExecutor<'a, D> {
    pub fn new(driver: &'a D, config: &'a CatalogConfig) -> Self {
        Self { driver, config }
    }

    /// Commit the selected listing of `snapshot`.
    pub async fn execute(
        &self,
        snapshot: &CatalogSnapshot,
        selection: &Selection,
    ) -> Result<SelectionOutcome> {
        let listing = snapshot.get(selection.chosen_index).ok_or_else(|| {
            Error::ActionFailed(format!(
                "selected listing {} not in snapshot of {}",
                selection.chosen_index,
                snapshot.len()
            ))
        })?;
        info!(
            "Luxury item: listing {} at {}",
            selection.chosen_index, listing.price_text
        );
        self.commit(&listing.handle, snapshot.observed()).await
    }

    /// Run the commit flow for any listing link.
    pub async fn commit(
        &self,
        listing: &ElementHandle,
        observed: ObservedPrices,
    ) -> Result<SelectionOutcome> {
        let mut flow = Flow::new(observed);

        let dialog = match self.run(listing, &mut flow).await {
            Ok(dialog) => dialog,
            Err(e) => {
                if flow.armed() {
                    if let Err(clear) = self.driver.clear_dialog_handler().await {
                        warn!("failed to clear dialog handler: {}", clear);
                    }
                }
                return Err(flow.fail(e));
            }
        };
        info!("Item added to cart ({} '{}')", dialog.kind, dialog.message);

        if self.config.settle_ms > 0 {
            self.driver.wait_ms(self.config.settle_ms).await;
        }

        Ok(SelectionOutcome {
            dialog,
            trace: flow.trace,
        })
    }

    async fn run(&self, listing: &ElementHandle, flow: &mut Flow) -> Result<DialogRecord> {
        self.driver.click(listing).await?;
        flow.enter(SelectionStep::DetailLoading);

        self.driver
            .wait_for(&self.config.commit, self.config.commit_timeout_ms)
            .await?;
        flow.enter(SelectionStep::DetailReady);

        // The commit control raises a modal dialog; the handler has to be in
        // place before the click or the page blocks.
        self.driver.on_next_dialog(DialogResponse::Accept).await?;
        flow.enter(SelectionStep::CommitArmed);

        self.driver
            .click(&ElementHandle::root(&self.config.commit))
            .await?;
        flow.enter(SelectionStep::DialogRaised);

        let dialog = self
            .driver
            .wait_for_dialog(self.config.dialog_timeout_ms)
            .await?;
        flow.enter(SelectionStep::ItemAdded);
        Ok(dialog)
    }
}
