// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog trait for the typed backend operations the wizard and CLI use.

use async_trait::async_trait;
use tracing::warn;

use crate::error::CellarError;
use crate::types::{
    Bottle, BottleId, NewBottle, NewRegion, Region, RegionId, RegionUpdate, Store, Wine,
    WineDetail, WineDraft, WineId, WineUpdate,
};

/// Typed access to the wine catalog.
///
/// Implemented by the HTTP API client and by in-memory test doubles, so the
/// add-wine wizard never depends on a transport.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_wines(&self) -> Result<Vec<Wine>, CellarError>;

    /// Full-text wine search. An empty query lists everything.
    async fn search_wines(&self, query: &str) -> Result<Vec<Wine>, CellarError>;

    /// Loads a wine together with its bottles.
    async fn get_wine(&self, id: WineId) -> Result<WineDetail, CellarError>;

    async fn create_wine(&self, draft: &WineDraft) -> Result<Wine, CellarError>;

    async fn update_wine(&self, id: WineId, update: &WineUpdate) -> Result<Wine, CellarError>;

    async fn create_bottle(&self, bottle: &NewBottle) -> Result<Bottle, CellarError>;

    /// Creates `count` identical bottles, one call per bottle.
    ///
    /// Calls are sequential and independent: a failure part-way leaves the
    /// bottles already created in place, and every outcome is reported.
    async fn add_bottles(&self, bottle: &NewBottle, count: u32) -> BatchReport {
        let mut results = Vec::new();
        for index in 0..count {
            let outcome = self.create_bottle(bottle).await;
            if let Err(ref e) = outcome {
                warn!(wine = %bottle.wine, index, error = %e, "bottle creation failed");
            }
            results.push(outcome);
        }
        BatchReport { results }
    }

    async fn consume_bottle(&self, id: BottleId) -> Result<(), CellarError>;

    async fn undo_consume_bottle(&self, id: BottleId) -> Result<(), CellarError>;

    async fn search_regions(
        &self,
        query: &str,
        country: Option<&str>,
    ) -> Result<Vec<Region>, CellarError>;

    async fn get_region(&self, id: RegionId) -> Result<Region, CellarError>;

    async fn create_region(&self, region: &NewRegion) -> Result<Region, CellarError>;

    async fn update_region(
        &self,
        id: RegionId,
        update: &RegionUpdate,
    ) -> Result<Region, CellarError>;

    async fn delete_region(&self, id: RegionId) -> Result<(), CellarError>;

    async fn list_stores(&self) -> Result<Vec<Store>, CellarError>;

    async fn create_store(&self, name: &str) -> Result<Store, CellarError>;
}

/// Per-item outcome of a multi-bottle creation.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<Result<Bottle, CellarError>>,
}

impl BatchReport {
    /// True when every item was created.
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    pub fn created(&self) -> Vec<&Bottle> {
        self.results.iter().filter_map(|r| r.as_ref().ok()).collect()
    }

    /// Failed items with their position in the batch.
    pub fn failures(&self) -> Vec<(usize, &CellarError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
            .collect()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }

    /// A one-line description of a partial or failed batch, `None` when complete.
    pub fn failure_summary(&self) -> Option<String> {
        let failures = self.failures();
        let (_, first) = failures.first()?;
        Some(format!(
            "added {} of {} bottles; {} failed: {first}",
            self.results.len() - failures.len(),
            self.results.len(),
            failures.len(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{HttpFailure, ResponseBody};

    fn bottle(id: i64) -> Bottle {
        Bottle {
            id: BottleId(id),
            wine: WineId(1),
            store: None,
            price: None,
            purchase_date: None,
            consumed_at: None,
        }
    }

    #[test]
    fn report_summarizes_partial_failure() {
        let report = BatchReport {
            results: vec![
                Ok(bottle(1)),
                Err(CellarError::Http(HttpFailure::new(
                    500,
                    ResponseBody::Empty,
                    "",
                ))),
                Ok(bottle(2)),
            ],
        };
        assert!(!report.is_complete());
        assert_eq!(report.created().len(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.failures()[0].0, 1);
        assert_eq!(
            report.failure_summary().as_deref(),
            Some("added 2 of 3 bottles; 1 failed: request failed: 500")
        );
    }

    #[test]
    fn complete_report_has_no_summary() {
        let report = BatchReport {
            results: vec![Ok(bottle(1))],
        };
        assert!(report.is_complete());
        assert!(report.failure_summary().is_none());
    }
}
