// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers over the REST endpoints.
//!
//! [`CellarApiClient`] implements [`CatalogApi`] on top of
//! [`CellarHttpClient`]; each endpoint family lives in its own module.

mod bottles;
mod regions;
mod stores;
mod wines;

use async_trait::async_trait;
use cellarium_core::{
    Bottle, BottleId, CatalogApi, CellarError, NewBottle, NewRegion, Region, RegionId,
    RegionUpdate, Store, Wine, WineDetail, WineDraft, WineId, WineUpdate,
};

use crate::http::CellarHttpClient;

/// The HTTP-backed catalog.
#[derive(Debug, Clone)]
pub struct CellarApiClient {
    http: CellarHttpClient,
}

impl CellarApiClient {
    pub fn new(http: CellarHttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &CellarHttpClient {
        &self.http
    }

    /// Bottles belonging to one wine.
    pub async fn list_bottles(&self, wine: WineId) -> Result<Vec<Bottle>, CellarError> {
        bottles::list_for_wine(&self.http, wine).await
    }
}

#[async_trait]
impl CatalogApi for CellarApiClient {
    async fn list_wines(&self) -> Result<Vec<Wine>, CellarError> {
        wines::list(&self.http, None).await
    }

    async fn search_wines(&self, query: &str) -> Result<Vec<Wine>, CellarError> {
        wines::list(&self.http, Some(query)).await
    }

    async fn get_wine(&self, id: WineId) -> Result<WineDetail, CellarError> {
        let wine = wines::get(&self.http, id).await?;
        let bottles = bottles::list_for_wine(&self.http, id).await?;
        Ok(WineDetail::new(wine, bottles))
    }

    async fn create_wine(&self, draft: &WineDraft) -> Result<Wine, CellarError> {
        wines::create(&self.http, draft).await
    }

    async fn update_wine(&self, id: WineId, update: &WineUpdate) -> Result<Wine, CellarError> {
        wines::update(&self.http, id, update).await
    }

    async fn create_bottle(&self, bottle: &NewBottle) -> Result<Bottle, CellarError> {
        bottles::create(&self.http, bottle).await
    }

    async fn consume_bottle(&self, id: BottleId) -> Result<(), CellarError> {
        bottles::action(&self.http, id, "consume").await
    }

    async fn undo_consume_bottle(&self, id: BottleId) -> Result<(), CellarError> {
        bottles::action(&self.http, id, "undo_consume").await
    }

    async fn search_regions(
        &self,
        query: &str,
        country: Option<&str>,
    ) -> Result<Vec<Region>, CellarError> {
        regions::search(&self.http, query, country).await
    }

    async fn get_region(&self, id: RegionId) -> Result<Region, CellarError> {
        regions::get(&self.http, id).await
    }

    async fn create_region(&self, region: &NewRegion) -> Result<Region, CellarError> {
        regions::create(&self.http, region).await
    }

    async fn update_region(
        &self,
        id: RegionId,
        update: &RegionUpdate,
    ) -> Result<Region, CellarError> {
        regions::update(&self.http, id, update).await
    }

    async fn delete_region(&self, id: RegionId) -> Result<(), CellarError> {
        regions::delete(&self.http, id).await
    }

    async fn list_stores(&self) -> Result<Vec<Store>, CellarError> {
        stores::list(&self.http).await
    }

    async fn create_store(&self, name: &str) -> Result<Store, CellarError> {
        stores::create(&self.http, name).await
    }
}
