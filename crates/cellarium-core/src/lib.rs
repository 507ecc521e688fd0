// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Cellarium wine tracker client.
//!
//! This crate provides the error taxonomy, the lenient response model, the
//! domain types mirrored from the backend, and the trait seams
//! ([`CatalogApi`], [`AuthObserver`]) that the HTTP client, the add-wine
//! wizard, and test doubles share.

pub mod error;
pub mod response;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CellarError;
pub use response::{HttpFailure, ResponseBody};
pub use traits::{AuthObserver, BatchReport, CatalogApi, NoopObserver, WatchObserver};
pub use types::{
    Bottle, BottleId, ImageUpload, NewBottle, NewRegion, Region, RegionId, RegionRef,
    RegionUpdate, Store, StoreId, Wine, WineDetail, WineDraft, WineId, WineUpdate,
};
