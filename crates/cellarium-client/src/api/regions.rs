// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use cellarium_core::{CellarError, NewRegion, Region, RegionId, RegionUpdate};

use crate::http::{CellarHttpClient, RequestOptions};

const REGIONS: &str = "/api/regions/";

pub(super) async fn search(
    http: &CellarHttpClient,
    query: &str,
    country: Option<&str>,
) -> Result<Vec<Region>, CellarError> {
    let options = RequestOptions::get()
        .query("search", Some(query.trim()))
        .query("country", country.map(str::trim));
    http.request(REGIONS, &options).await?.decode_list("region list")
}

pub(super) async fn get(http: &CellarHttpClient, id: RegionId) -> Result<Region, CellarError> {
    http.request(&format!("{REGIONS}{id}/"), &RequestOptions::get())
        .await?
        .decode("region")
}

pub(super) async fn create(http: &CellarHttpClient, region: &NewRegion) -> Result<Region, CellarError> {
    let options = RequestOptions::post().json(region)?;
    http.request(REGIONS, &options).await?.decode("created region")
}

pub(super) async fn update(
    http: &CellarHttpClient,
    id: RegionId,
    update: &RegionUpdate,
) -> Result<Region, CellarError> {
    let options = RequestOptions::patch().json(update)?;
    http.request(&format!("{REGIONS}{id}/"), &options)
        .await?
        .decode("updated region")
}

pub(super) async fn delete(http: &CellarHttpClient, id: RegionId) -> Result<(), CellarError> {
    http.request(&format!("{REGIONS}{id}/"), &RequestOptions::delete())
        .await?;
    Ok(())
}
