// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles shared by the Cellarium crates' tests.
//!
//! - [`MockCatalog`]: an in-memory [`CatalogApi`](cellarium_core::CatalogApi)
//!   with call recording, per-query latency, and failure injection.
//! - [`RecordingObserver`]: counts "auth required" signals.

pub mod fixtures;
pub mod mock_catalog;
pub mod observer;

pub use fixtures::{region, store, wine};
pub use mock_catalog::{CatalogCall, MockCatalog};
pub use observer::RecordingObserver;
