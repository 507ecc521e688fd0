// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The add-wine wizard.
//!
//! Steps: Identify -> Intent -> (Bought | Drank), with "back" edges and two
//! terminal outcomes (finish, cancel). A flow opened against a known wine
//! starts directly in Bought and has no step to go back to.
//!
//! Every submission runs under a loading guard, so the loading flag is
//! cleared on success, failure, early return and cancellation alike.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cellarium_core::{
    BatchReport, CatalogApi, CellarError, NewBottle, Region, StoreId, Wine, WineId, WineUpdate,
};
use chrono::NaiveDate;
use strum::{Display, IntoStaticStr};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::creation::{self, WineCreation};
use crate::debounce::{DEFAULT_MAX_RESULTS, DEFAULT_WINDOW, SearchDebouncer, SearchSnapshot};

/// Highest rating a memory can carry.
pub const MAX_RATING: u8 = 5;

/// Most bottles a single purchase can add.
pub const MAX_QUANTITY: u32 = 100;

/// Search settings for the Identify step.
#[derive(Debug, Clone, Copy)]
pub struct WizardOptions {
    pub debounce: Duration,
    pub max_results: usize,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_WINDOW,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Purchase details for the Bought step.
#[derive(Debug, Clone, PartialEq)]
pub struct BottleDraft {
    pub purchase_date: NaiveDate,
    /// Decimal price as typed; blank means unknown.
    pub price: Option<String>,
    pub store: Option<StoreId>,
    pub quantity: u32,
}

impl Default for BottleDraft {
    fn default() -> Self {
        Self {
            purchase_date: chrono::Local::now().date_naive(),
            price: None,
            store: None,
            quantity: 1,
        }
    }
}

impl BottleDraft {
    /// The per-bottle payload. Every bottle of a batch is identical.
    pub fn to_new_bottle(&self, wine: WineId) -> Result<NewBottle, CellarError> {
        if self.quantity == 0 {
            return Err(CellarError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(CellarError::Validation(format!(
                "quantity must be at most {MAX_QUANTITY}"
            )));
        }
        let price = self
            .price
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        if let Some(price) = &price
            && !price.parse::<f64>().is_ok_and(|p| p.is_finite() && p >= 0.0)
        {
            return Err(CellarError::Validation(format!(
                "price `{price}` is not a valid amount"
            )));
        }
        Ok(NewBottle {
            wine,
            store: self.store,
            purchase_date: Some(self.purchase_date),
            price,
        })
    }
}

/// Rating and tasting notes for the Drank step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDraft {
    pub rating: u8,
    pub notes: String,
}

/// How the Bought step was reached, which decides where "back" goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoughtEntry {
    FromIntent { is_new: bool },
    /// Opened pre-bound to a wine; there is no earlier step.
    Direct,
}

/// Current step with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardStep {
    Identify,
    Intent {
        wine: Wine,
        is_new: bool,
    },
    Bought {
        wine: Wine,
        draft: BottleDraft,
        entry: BoughtEntry,
    },
    Drank {
        wine: Wine,
        draft: MemoryDraft,
        is_new: bool,
    },
}

/// Payload-free step name, used in logs and transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StepKind {
    Identify,
    Intent,
    Bought,
    Drank,
    Closed,
}

impl WizardStep {
    pub fn kind(&self) -> StepKind {
        match self {
            WizardStep::Identify => StepKind::Identify,
            WizardStep::Intent { .. } => StepKind::Intent,
            WizardStep::Bought { .. } => StepKind::Bought,
            WizardStep::Drank { .. } => StepKind::Drank,
        }
    }

    pub fn wine(&self) -> Option<&Wine> {
        match self {
            WizardStep::Identify => None,
            WizardStep::Intent { wine, .. }
            | WizardStep::Bought { wine, .. }
            | WizardStep::Drank { wine, .. } => Some(wine),
        }
    }
}

/// How the wizard closed.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardOutcome {
    /// Something was saved; the caller should refresh its listings.
    Saved { wine: Wine },
    /// Finished on an existing wine without saving; the caller navigates
    /// to its detail page.
    OpenWine { wine: Wine },
    Cancelled,
}

impl WizardOutcome {
    /// Only a save changes the catalog.
    pub fn needs_refresh(&self) -> bool {
        matches!(self, WizardOutcome::Saved { .. })
    }
}

fn check_rating(rating: u8) -> Result<(), CellarError> {
    if rating > MAX_RATING {
        return Err(CellarError::Validation(format!(
            "rating must be between 0 and {MAX_RATING}"
        )));
    }
    Ok(())
}

/// Sets the loading flag for its lifetime.
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn start(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag.clone())
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Bottles that failed in the last batch, kept for [`WizardController::retry_failed`].
#[derive(Debug, Clone)]
struct PendingBatch {
    bottle: NewBottle,
    failed: u32,
}

/// Drives one run of the add-wine wizard.
pub struct WizardController {
    api: Arc<dyn CatalogApi>,
    step: WizardStep,
    outcome: Option<WizardOutcome>,
    query: String,
    search: SearchDebouncer<Wine>,
    creation: Option<WineCreation>,
    error: Option<String>,
    loading: Arc<AtomicBool>,
    pending_batch: Option<PendingBatch>,
    /// Drafts left behind by "back", restored when the same wine re-enters.
    bottle_stash: Option<(WineId, BottleDraft)>,
    memory_stash: Option<(WineId, MemoryDraft)>,
}

impl std::fmt::Debug for WizardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardController")
            .field("step", &self.step)
            .field("outcome", &self.outcome)
            .field("query", &self.query)
            .field("error", &self.error)
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

impl WizardController {
    /// Opens the wizard in Identify.
    pub fn open(api: Arc<dyn CatalogApi>, options: WizardOptions) -> Self {
        let search = SearchDebouncer::wines(api.clone(), options.debounce, options.max_results);
        debug!("wizard opened");
        Self {
            api,
            step: WizardStep::Identify,
            outcome: None,
            query: String::new(),
            search,
            creation: None,
            error: None,
            loading: Arc::new(AtomicBool::new(false)),
            pending_batch: None,
            bottle_stash: None,
            memory_stash: None,
        }
    }

    /// Opens the wizard pre-bound to `wine_id`, straight into Bought.
    ///
    /// No search is performed. If the wine cannot be loaded the wizard stays
    /// in Identify with the error recorded.
    pub async fn open_for_wine(
        api: Arc<dyn CatalogApi>,
        options: WizardOptions,
        wine_id: WineId,
    ) -> Self {
        let mut wizard = Self::open(api, options);
        let loaded = {
            let _loading = LoadingGuard::start(&wizard.loading);
            wizard.api.get_wine(wine_id).await
        };
        match loaded {
            Ok(detail) => {
                info!(wine = %wine_id, "wizard opened for existing wine");
                wizard.step = WizardStep::Bought {
                    wine: detail.wine,
                    draft: BottleDraft::default(),
                    entry: BoughtEntry::Direct,
                };
            }
            Err(e) => {
                warn!(wine = %wine_id, error = %e, "failed to load wine, falling back to search");
                wizard.error = Some(e.to_string());
            }
        }
        wizard
    }

    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    pub fn kind(&self) -> StepKind {
        if self.outcome.is_some() {
            StepKind::Closed
        } else {
            self.step.kind()
        }
    }

    pub fn outcome(&self) -> Option<&WizardOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.outcome.is_some()
    }

    /// The latest user-facing error, cleared by the next successful action.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Shared loading flag, for views that render outside the controller.
    pub fn loading_flag(&self) -> Arc<AtomicBool> {
        self.loading.clone()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn search_results(&self) -> SearchSnapshot<Wine> {
        self.search.snapshot()
    }

    pub fn subscribe_search(&self) -> watch::Receiver<SearchSnapshot<Wine>> {
        self.search.subscribe()
    }

    /// The open wine-creation form, if any.
    pub fn creation(&self) -> Option<&WineCreation> {
        self.creation.as_ref()
    }

    pub fn creation_mut(&mut self) -> Option<&mut WineCreation> {
        self.creation.as_mut()
    }

    /// Number of bottles that failed in the last batch and can be retried.
    pub fn failed_bottles(&self) -> u32 {
        self.pending_batch.as_ref().map_or(0, |b| b.failed)
    }

    // --- Identify ---

    pub fn set_query(&mut self, query: &str) -> Result<(), CellarError> {
        self.expect_step("set_query", &[StepKind::Identify])?;
        self.query = query.to_string();
        self.search.input(query);
        Ok(())
    }

    pub fn pick_wine(&mut self, wine: Wine) -> Result<(), CellarError> {
        self.expect_step("pick_wine", &[StepKind::Identify])?;
        self.creation = None;
        self.transition(WizardStep::Intent {
            wine,
            is_new: false,
        });
        Ok(())
    }

    /// Opens the create-wine form prefilled with the current query.
    pub fn begin_create_wine(&mut self) -> Result<&mut WineCreation, CellarError> {
        self.expect_step("begin_create_wine", &[StepKind::Identify])?;
        self.error = None;
        Ok(self
            .creation
            .insert(WineCreation::prefilled(&self.query)))
    }

    pub fn cancel_create_wine(&mut self) -> Result<(), CellarError> {
        self.expect_step("cancel_create_wine", &[StepKind::Identify])?;
        self.creation = None;
        Ok(())
    }

    /// Creates the drafted wine and moves to Intent with `is_new = true`.
    pub async fn submit_new_wine(&mut self) -> Result<Wine, CellarError> {
        self.expect_step("submit_new_wine", &[StepKind::Identify])?;
        let Some(form) = &self.creation else {
            return Err(self.invalid("submit_new_wine"));
        };
        let draft = form.validated();
        let draft = self.record(draft)?;

        let created = {
            let _loading = LoadingGuard::start(&self.loading);
            self.api.create_wine(&draft).await
        };
        let wine = self.record(created)?;
        info!(wine = %wine.id, "wine created from wizard");
        self.creation = None;
        self.transition(WizardStep::Intent {
            wine: wine.clone(),
            is_new: true,
        });
        Ok(wine)
    }

    /// Region search for the create-wine form, scoped to its country.
    pub async fn search_regions(&self, query: &str) -> Result<Vec<Region>, CellarError> {
        self.ensure_open("search_regions")?;
        let Some(form) = &self.creation else {
            return Err(self.invalid("search_regions"));
        };
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.api.search_regions(query, form.country()).await
    }

    /// Creates a region and selects it into the wine draft.
    ///
    /// `country` defaults to the draft's country.
    pub async fn create_region(
        &mut self,
        name: &str,
        country: Option<&str>,
    ) -> Result<Region, CellarError> {
        self.ensure_open("create_region")?;
        let Some(form) = &self.creation else {
            return Err(self.invalid("create_region"));
        };
        let country = country.or(form.country()).map(str::to_string);
        let new_region = self.record(creation::new_region(name, country.as_deref()))?;

        let created = {
            let _loading = LoadingGuard::start(&self.loading);
            self.api.create_region(&new_region).await
        };
        let region = self.record(created)?;
        if let Some(form) = self.creation.as_mut() {
            form.select_region(region.clone());
        }
        Ok(region)
    }

    // --- Intent ---

    pub fn choose_bought(&mut self) -> Result<(), CellarError> {
        self.ensure_open("choose_bought")?;
        let WizardStep::Intent { wine, is_new } = &self.step else {
            return Err(self.invalid("choose_bought"));
        };
        let draft = take_stash(&mut self.bottle_stash, wine.id).unwrap_or_default();
        let next = WizardStep::Bought {
            wine: wine.clone(),
            draft,
            entry: BoughtEntry::FromIntent { is_new: *is_new },
        };
        self.transition(next);
        Ok(())
    }

    pub fn choose_drank(&mut self) -> Result<(), CellarError> {
        self.ensure_open("choose_drank")?;
        let WizardStep::Intent { wine, is_new } = &self.step else {
            return Err(self.invalid("choose_drank"));
        };
        let draft = take_stash(&mut self.memory_stash, wine.id).unwrap_or_default();
        let next = WizardStep::Drank {
            wine: wine.clone(),
            draft,
            is_new: *is_new,
        };
        self.transition(next);
        Ok(())
    }

    /// Finishes right after creating a wine, without bottles or a memory.
    pub fn just_save(&mut self) -> Result<(), CellarError> {
        match &self.step {
            WizardStep::Intent { wine, is_new: true } if self.outcome.is_none() => {
                let wine = wine.clone();
                self.finish(WizardOutcome::Saved { wine });
                Ok(())
            }
            _ => Err(self.invalid("just_save")),
        }
    }

    /// Finishes on an existing wine and asks the caller to show it.
    pub fn open_detail(&mut self) -> Result<(), CellarError> {
        match &self.step {
            WizardStep::Intent {
                wine,
                is_new: false,
            } if self.outcome.is_none() => {
                let wine = wine.clone();
                self.finish(WizardOutcome::OpenWine { wine });
                Ok(())
            }
            _ => Err(self.invalid("open_detail")),
        }
    }

    // --- Navigation ---

    /// Goes back one step. From a pre-bound Bought step this does nothing.
    pub fn back(&mut self) -> Result<(), CellarError> {
        self.ensure_open("back")?;
        let next = match &self.step {
            WizardStep::Identify => return Err(self.invalid("back")),
            WizardStep::Intent { .. } => WizardStep::Identify,
            WizardStep::Bought {
                entry: BoughtEntry::Direct,
                ..
            } => {
                debug!("back is not available for a pre-bound wine");
                return Ok(());
            }
            WizardStep::Bought {
                wine,
                draft,
                entry: BoughtEntry::FromIntent { is_new },
            } => {
                self.bottle_stash = Some((wine.id, draft.clone()));
                WizardStep::Intent {
                    wine: wine.clone(),
                    is_new: *is_new,
                }
            }
            WizardStep::Drank {
                wine,
                draft,
                is_new,
            } => {
                self.memory_stash = Some((wine.id, draft.clone()));
                WizardStep::Intent {
                    wine: wine.clone(),
                    is_new: *is_new,
                }
            }
        };
        self.pending_batch = None;
        self.transition(next);
        Ok(())
    }

    /// Closes the wizard without saving anything further.
    pub fn cancel(&mut self) -> Result<(), CellarError> {
        self.ensure_open("cancel")?;
        self.finish(WizardOutcome::Cancelled);
        Ok(())
    }

    // --- Bought ---

    pub fn bottle_draft_mut(&mut self) -> Result<&mut BottleDraft, CellarError> {
        let step: &'static str = self.kind().into();
        match (&self.outcome, &mut self.step) {
            (None, WizardStep::Bought { draft, .. }) => Ok(draft),
            _ => Err(CellarError::InvalidTransition {
                action: "bottle_draft",
                step,
            }),
        }
    }

    /// Creates `quantity` bottles, one call each.
    ///
    /// A complete batch finishes the wizard. A partial one stays in Bought
    /// with a summary error, and [`retry_failed`](Self::retry_failed)
    /// re-submits only the failures.
    pub async fn submit_bought(&mut self) -> Result<BatchReport, CellarError> {
        let (wine_id, bottle, quantity) = match &self.step {
            WizardStep::Bought { wine, draft, .. } if self.outcome.is_none() => {
                (wine.id, draft.to_new_bottle(wine.id), draft.quantity)
            }
            _ => return Err(self.invalid("submit_bought")),
        };
        let bottle = self.record(bottle)?;
        debug!(wine = %wine_id, quantity, "submitting bottles");
        let report = {
            let _loading = LoadingGuard::start(&self.loading);
            self.api.add_bottles(&bottle, quantity).await
        };
        self.settle_batch(bottle, report)
    }

    /// Re-submits the bottles that failed in the last batch.
    pub async fn retry_failed(&mut self) -> Result<BatchReport, CellarError> {
        if self.kind() != StepKind::Bought {
            return Err(self.invalid("retry_failed"));
        }
        let Some(pending) = self.pending_batch.clone() else {
            return Err(self.invalid("retry_failed"));
        };
        info!(wine = %pending.bottle.wine, count = pending.failed, "retrying failed bottles");
        let report = {
            let _loading = LoadingGuard::start(&self.loading);
            self.api.add_bottles(&pending.bottle, pending.failed).await
        };
        self.settle_batch(pending.bottle, report)
    }

    fn settle_batch(
        &mut self,
        bottle: NewBottle,
        report: BatchReport,
    ) -> Result<BatchReport, CellarError> {
        match report.failure_summary() {
            None => {
                info!(wine = %bottle.wine, count = report.results.len(), "bottles added");
                self.pending_batch = None;
                self.error = None;
                if let Some(wine) = self.step.wine().cloned() {
                    self.finish(WizardOutcome::Saved { wine });
                }
            }
            Some(summary) => {
                warn!(wine = %bottle.wine, failed = report.failed_count(), "bottle batch incomplete");
                self.pending_batch = Some(PendingBatch {
                    bottle,
                    failed: u32::try_from(report.failed_count()).unwrap_or(u32::MAX),
                });
                self.error = Some(summary);
            }
        }
        Ok(report)
    }

    // --- Drank ---

    pub fn memory_draft_mut(&mut self) -> Result<&mut MemoryDraft, CellarError> {
        let step: &'static str = self.kind().into();
        match (&self.outcome, &mut self.step) {
            (None, WizardStep::Drank { draft, .. }) => Ok(draft),
            _ => Err(CellarError::InvalidTransition {
                action: "memory_draft",
                step,
            }),
        }
    }

    pub fn set_rating(&mut self, rating: u8) -> Result<(), CellarError> {
        check_rating(rating)?;
        self.memory_draft_mut()?.rating = rating;
        Ok(())
    }

    /// Saves rating and notes onto the wine; no bottle is created.
    pub async fn submit_drank(&mut self) -> Result<Wine, CellarError> {
        let (wine_id, update) = match &self.step {
            WizardStep::Drank { wine, draft, .. } if self.outcome.is_none() => (
                wine.id,
                check_rating(draft.rating)
                    .map(|()| WineUpdate::memory(draft.rating, draft.notes.trim())),
            ),
            _ => return Err(self.invalid("submit_drank")),
        };
        let update = self.record(update)?;
        let updated = {
            let _loading = LoadingGuard::start(&self.loading);
            self.api.update_wine(wine_id, &update).await
        };
        let wine = self.record(updated)?;
        info!(wine = %wine.id, "memory saved");
        self.finish(WizardOutcome::Saved { wine: wine.clone() });
        Ok(wine)
    }

    // --- Internals ---

    fn ensure_open(&self, action: &'static str) -> Result<(), CellarError> {
        if self.outcome.is_some() {
            Err(self.invalid(action))
        } else {
            Ok(())
        }
    }

    fn expect_step(&self, action: &'static str, allowed: &[StepKind]) -> Result<(), CellarError> {
        if allowed.contains(&self.kind()) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> CellarError {
        let step: &'static str = self.kind().into();
        debug!(action, step, "rejected wizard action");
        CellarError::InvalidTransition { action, step }
    }

    /// Keeps the error message for display and passes the result through.
    fn record<T>(&mut self, result: Result<T, CellarError>) -> Result<T, CellarError> {
        match result {
            Ok(value) => {
                self.error = None;
                Ok(value)
            }
            Err(e) => {
                warn!(step = %self.kind(), error = %e, "wizard action failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: WizardStep) {
        debug!(from = %self.step.kind(), to = %next.kind(), "wizard transition");
        self.error = None;
        self.step = next;
    }

    fn finish(&mut self, outcome: WizardOutcome) {
        info!(step = %self.step.kind(), ?outcome, "wizard closed");
        self.search.dispose();
        self.creation = None;
        self.pending_batch = None;
        self.outcome = Some(outcome);
    }
}

fn take_stash<D>(stash: &mut Option<(WineId, D)>, wine: WineId) -> Option<D> {
    match stash.take() {
        Some((id, draft)) if id == wine => Some(draft),
        _ => None,
    }
}
