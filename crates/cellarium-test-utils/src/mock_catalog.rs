// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory catalog for deterministic wizard and search tests.
//!
//! `MockCatalog` implements `CatalogApi` over plain vectors. Every call is
//! recorded before it is answered, so tests can assert on exactly what was
//! sent, including calls whose results were later discarded.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cellarium_core::{
    Bottle, BottleId, CatalogApi, CellarError, HttpFailure, NewBottle, NewRegion, Region,
    RegionId, RegionUpdate, ResponseBody, Store, StoreId, Wine, WineDetail, WineDraft, WineId,
    WineUpdate,
};
use tokio::sync::Mutex;

/// One recorded catalog call.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogCall {
    ListWines,
    SearchWines(String),
    GetWine(WineId),
    CreateWine(WineDraft),
    UpdateWine(WineId, WineUpdate),
    CreateBottle(NewBottle),
    ConsumeBottle(BottleId),
    UndoConsumeBottle(BottleId),
    SearchRegions {
        query: String,
        country: Option<String>,
    },
    GetRegion(RegionId),
    CreateRegion(NewRegion),
    UpdateRegion(RegionId, RegionUpdate),
    DeleteRegion(RegionId),
    ListStores,
    CreateStore(String),
}

impl CatalogCall {
    fn operation(&self) -> &'static str {
        match self {
            CatalogCall::ListWines => "list_wines",
            CatalogCall::SearchWines(_) => "search_wines",
            CatalogCall::GetWine(_) => "get_wine",
            CatalogCall::CreateWine(_) => "create_wine",
            CatalogCall::UpdateWine(..) => "update_wine",
            CatalogCall::CreateBottle(_) => "create_bottle",
            CatalogCall::ConsumeBottle(_) => "consume_bottle",
            CatalogCall::UndoConsumeBottle(_) => "undo_consume_bottle",
            CatalogCall::SearchRegions { .. } => "search_regions",
            CatalogCall::GetRegion(_) => "get_region",
            CatalogCall::CreateRegion(_) => "create_region",
            CatalogCall::UpdateRegion(..) => "update_region",
            CatalogCall::DeleteRegion(_) => "delete_region",
            CatalogCall::ListStores => "list_stores",
            CatalogCall::CreateStore(_) => "create_store",
        }
    }
}

#[derive(Default)]
struct CatalogState {
    wines: Vec<Wine>,
    bottles: Vec<Bottle>,
    regions: Vec<Region>,
    stores: Vec<Store>,
    next_id: i64,
    calls: Vec<CatalogCall>,
    search_delays: HashMap<String, Duration>,
    /// Zero-based indexes of `create_bottle` calls that fail.
    failing_bottle_calls: HashSet<usize>,
    bottle_calls: usize,
    /// Operation name -> (status, message) for injected failures.
    failures: HashMap<&'static str, (u16, String)>,
}

impl CatalogState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Scripted in-memory catalog.
#[derive(Clone, Default)]
pub struct MockCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds wines. Generated ids start above the largest seeded id.
    pub fn with_wines(wines: Vec<Wine>) -> Self {
        let next_id = wines.iter().map(|w| w.id.0).max().unwrap_or(0) + 100;
        Self {
            state: Arc::new(Mutex::new(CatalogState {
                wines,
                next_id,
                ..CatalogState::default()
            })),
        }
    }

    pub async fn add_region(&self, region: Region) {
        self.state.lock().await.regions.push(region);
    }

    pub async fn add_store(&self, store: Store) {
        self.state.lock().await.stores.push(store);
    }

    /// Delays `search_wines(query)` by `delay` after the call is recorded.
    pub async fn set_search_delay(&self, query: &str, delay: Duration) {
        self.state
            .lock()
            .await
            .search_delays
            .insert(query.to_string(), delay);
    }

    /// Makes the `create_bottle` calls at these zero-based positions fail
    /// with a 500.
    pub async fn fail_bottle_creations_at(&self, indexes: &[usize]) {
        let mut state = self.state.lock().await;
        state.failing_bottle_calls = indexes.iter().copied().collect();
    }

    /// Makes every call to `operation` (e.g. `"update_wine"`) fail.
    pub async fn fail(&self, operation: &'static str, status: u16, message: &str) {
        self.state
            .lock()
            .await
            .failures
            .insert(operation, (status, message.to_string()));
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.failures.clear();
        state.failing_bottle_calls.clear();
    }

    pub async fn calls(&self) -> Vec<CatalogCall> {
        self.state.lock().await.calls.clone()
    }

    /// Queries passed to `search_wines`, in call order.
    pub async fn search_queries(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::SearchWines(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    /// Payloads passed to `create_bottle`, in call order.
    pub async fn bottle_requests(&self) -> Vec<NewBottle> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::CreateBottle(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub async fn wine(&self, id: WineId) -> Option<Wine> {
        self.state
            .lock()
            .await
            .wines
            .iter()
            .find(|w| w.id == id)
            .cloned()
    }

    /// Records `call` and returns the injected failure for it, if any.
    async fn record(&self, call: CatalogCall) -> Result<(), CellarError> {
        let mut state = self.state.lock().await;
        let operation = call.operation();
        state.calls.push(call);
        match state.failures.get(operation) {
            Some((status, message)) => Err(failure(*status, message)),
            None => Ok(()),
        }
    }
}

fn failure(status: u16, message: &str) -> CellarError {
    CellarError::Http(HttpFailure::new(
        status,
        ResponseBody::Text(message.to_string()),
        message,
    ))
}

fn not_found(what: &str) -> CellarError {
    failure(404, &format!("{what} not found"))
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn list_wines(&self) -> Result<Vec<Wine>, CellarError> {
        self.record(CatalogCall::ListWines).await?;
        Ok(self.state.lock().await.wines.clone())
    }

    async fn search_wines(&self, query: &str) -> Result<Vec<Wine>, CellarError> {
        let outcome = self.record(CatalogCall::SearchWines(query.to_string())).await;
        let delay = self.state.lock().await.search_delays.get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome?;

        let needle = query.to_lowercase();
        Ok(self
            .state
            .lock()
            .await
            .wines
            .iter()
            .filter(|w| w.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_wine(&self, id: WineId) -> Result<WineDetail, CellarError> {
        self.record(CatalogCall::GetWine(id)).await?;
        let state = self.state.lock().await;
        let wine = state
            .wines
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| not_found("wine"))?;
        let bottles = state.bottles.iter().filter(|b| b.wine == id).cloned().collect();
        Ok(WineDetail::new(wine, bottles))
    }

    async fn create_wine(&self, draft: &WineDraft) -> Result<Wine, CellarError> {
        self.record(CatalogCall::CreateWine(draft.clone())).await?;
        let mut state = self.state.lock().await;
        let id = WineId(state.next_id());
        let wine = Wine {
            id,
            name: draft.name.clone(),
            country: draft.country.clone(),
            region: draft
                .region
                .clone()
                .map(cellarium_core::RegionRef::Region),
            vintage: draft.vintage,
            grape_varieties: draft.grape_varieties.clone(),
            wine_type: draft.wine_type.clone(),
            image: draft.image.as_ref().map(|i| i.file_name.clone()),
            notes: draft.notes.clone(),
            rating: draft.rating,
            in_stock_count: Some(0),
            bottle_count: Some(0),
        };
        state.wines.push(wine.clone());
        Ok(wine)
    }

    async fn update_wine(&self, id: WineId, update: &WineUpdate) -> Result<Wine, CellarError> {
        self.record(CatalogCall::UpdateWine(id, update.clone())).await?;
        let mut state = self.state.lock().await;
        let wine = state
            .wines
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| not_found("wine"))?;
        if let Some(name) = &update.name {
            wine.name = name.clone();
        }
        if update.rating.is_some() {
            wine.rating = update.rating;
        }
        if update.notes.is_some() {
            wine.notes = update.notes.clone();
        }
        Ok(wine.clone())
    }

    async fn create_bottle(&self, bottle: &NewBottle) -> Result<Bottle, CellarError> {
        self.record(CatalogCall::CreateBottle(bottle.clone())).await?;
        let mut state = self.state.lock().await;
        let index = state.bottle_calls;
        state.bottle_calls += 1;
        if state.failing_bottle_calls.contains(&index) {
            return Err(failure(500, "bottle creation failed"));
        }
        let created = Bottle {
            id: BottleId(state.next_id()),
            wine: bottle.wine,
            store: bottle.store,
            price: bottle.price.clone(),
            purchase_date: bottle.purchase_date,
            consumed_at: None,
        };
        state.bottles.push(created.clone());
        Ok(created)
    }

    async fn consume_bottle(&self, id: BottleId) -> Result<(), CellarError> {
        self.record(CatalogCall::ConsumeBottle(id)).await?;
        let mut state = self.state.lock().await;
        let bottle = state
            .bottles
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| not_found("bottle"))?;
        bottle.consumed_at = Some(chrono::Utc::now());
        Ok(())
    }

    async fn undo_consume_bottle(&self, id: BottleId) -> Result<(), CellarError> {
        self.record(CatalogCall::UndoConsumeBottle(id)).await?;
        let mut state = self.state.lock().await;
        let bottle = state
            .bottles
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| not_found("bottle"))?;
        bottle.consumed_at = None;
        Ok(())
    }

    async fn search_regions(
        &self,
        query: &str,
        country: Option<&str>,
    ) -> Result<Vec<Region>, CellarError> {
        self.record(CatalogCall::SearchRegions {
            query: query.to_string(),
            country: country.map(str::to_string),
        })
        .await?;
        let needle = query.to_lowercase();
        Ok(self
            .state
            .lock()
            .await
            .regions
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .filter(|r| country.is_none_or(|c| r.country.as_deref() == Some(c)))
            .cloned()
            .collect())
    }

    async fn get_region(&self, id: RegionId) -> Result<Region, CellarError> {
        self.record(CatalogCall::GetRegion(id)).await?;
        self.state
            .lock()
            .await
            .regions
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found("region"))
    }

    async fn create_region(&self, region: &NewRegion) -> Result<Region, CellarError> {
        self.record(CatalogCall::CreateRegion(region.clone())).await?;
        let mut state = self.state.lock().await;
        let created = Region {
            id: RegionId(state.next_id()),
            name: region.name.clone(),
            country: Some(region.country.clone()),
        };
        state.regions.push(created.clone());
        Ok(created)
    }

    async fn update_region(
        &self,
        id: RegionId,
        update: &RegionUpdate,
    ) -> Result<Region, CellarError> {
        self.record(CatalogCall::UpdateRegion(id, update.clone())).await?;
        let mut state = self.state.lock().await;
        let region = state
            .regions
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("region"))?;
        if let Some(name) = &update.name {
            region.name = name.clone();
        }
        if let Some(country) = &update.country {
            region.country = Some(country.clone());
        }
        Ok(region.clone())
    }

    async fn delete_region(&self, id: RegionId) -> Result<(), CellarError> {
        self.record(CatalogCall::DeleteRegion(id)).await?;
        self.state.lock().await.regions.retain(|r| r.id != id);
        Ok(())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, CellarError> {
        self.record(CatalogCall::ListStores).await?;
        Ok(self.state.lock().await.stores.clone())
    }

    async fn create_store(&self, name: &str) -> Result<Store, CellarError> {
        self.record(CatalogCall::CreateStore(name.to_string())).await?;
        let mut state = self.state.lock().await;
        let store = Store {
            id: StoreId(state.next_id()),
            name: name.to_string(),
        };
        state.stores.push(store.clone());
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::wine;

    #[tokio::test]
    async fn search_is_case_insensitive_and_recorded() {
        let catalog = MockCatalog::with_wines(vec![wine(1, "Malbec"), wine(2, "Merlot")]);
        let found = catalog.search_wines("mal").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(catalog.search_queries().await, vec!["mal".to_string()]);
    }

    #[tokio::test]
    async fn injected_bottle_failures_hit_chosen_positions() {
        let catalog = MockCatalog::with_wines(vec![wine(1, "Malbec")]);
        catalog.fail_bottle_creations_at(&[1]).await;
        let bottle = NewBottle {
            wine: WineId(1),
            store: None,
            purchase_date: None,
            price: None,
        };
        let report = catalog.add_bottles(&bottle, 3).await;
        assert_eq!(report.created().len(), 2);
        assert_eq!(report.failures()[0].0, 1);
        assert_eq!(catalog.get_wine(WineId(1)).await.unwrap().bottles.len(), 2);
    }

    #[tokio::test]
    async fn operation_failures_are_http_errors() {
        let catalog = MockCatalog::new();
        catalog.fail("list_stores", 503, "maintenance").await;
        let err = catalog.list_stores().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "maintenance");
        assert_eq!(catalog.calls().await, vec![CatalogCall::ListStores]);
    }
}
