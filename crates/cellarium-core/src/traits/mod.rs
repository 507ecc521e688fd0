// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the wizard, the HTTP client, and the host application.

pub mod auth;
pub mod catalog;

pub use auth::{AuthObserver, NoopObserver, WatchObserver};
pub use catalog::{BatchReport, CatalogApi};
