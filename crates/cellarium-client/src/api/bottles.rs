// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use cellarium_core::{Bottle, BottleId, CellarError, NewBottle, WineId};

use crate::http::{CellarHttpClient, RequestOptions};

const BOTTLES: &str = "/api/bottles/";

pub(super) async fn list_for_wine(
    http: &CellarHttpClient,
    wine: WineId,
) -> Result<Vec<Bottle>, CellarError> {
    let options = RequestOptions::get().query("wine", Some(wine.to_string()));
    http.request(BOTTLES, &options).await?.decode_list("bottle list")
}

pub(super) async fn create(http: &CellarHttpClient, bottle: &NewBottle) -> Result<Bottle, CellarError> {
    let options = RequestOptions::post().json(bottle)?;
    http.request(BOTTLES, &options).await?.decode("created bottle")
}

/// `consume` / `undo_consume`. The response body, if any, is not needed.
pub(super) async fn action(
    http: &CellarHttpClient,
    id: BottleId,
    action: &str,
) -> Result<(), CellarError> {
    http.request(&format!("{BOTTLES}{id}/{action}/"), &RequestOptions::post())
        .await?;
    Ok(())
}
