// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing flows built on the catalog: debounced search and the
//! add-wine wizard.
//!
//! Nothing here knows about HTTP. Both flows take an
//! `Arc<dyn CatalogApi>`, so they run unchanged against the real client
//! or an in-memory catalog.

pub mod creation;
pub mod debounce;
pub mod wizard;

pub use creation::WineCreation;
pub use debounce::{SearchDebouncer, SearchSnapshot};
pub use wizard::{
    BottleDraft, BoughtEntry, MAX_QUANTITY, MAX_RATING, MemoryDraft, StepKind, WizardController,
    WizardOptions, WizardOutcome, WizardStep,
};
