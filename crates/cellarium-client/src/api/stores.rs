// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use cellarium_core::{CellarError, Store};
use serde::Serialize;

use crate::http::{CellarHttpClient, RequestOptions};

const STORES: &str = "/api/stores/";

#[derive(Serialize)]
struct NewStore<'a> {
    name: &'a str,
}

pub(super) async fn list(http: &CellarHttpClient) -> Result<Vec<Store>, CellarError> {
    http.request(STORES, &RequestOptions::get())
        .await?
        .decode_list("store list")
}

pub(super) async fn create(http: &CellarHttpClient, name: &str) -> Result<Store, CellarError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CellarError::Validation("store name is required".to_string()));
    }
    let options = RequestOptions::post().json(&NewStore { name })?;
    http.request(STORES, &options).await?.decode("created store")
}
