// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use cellarium_core::{CellarError, ImageUpload, Wine, WineDraft, WineId, WineUpdate};
use serde_json::{Map, Value};
use tracing::debug;

use crate::http::{CellarHttpClient, FilePart, MultipartBody, RequestOptions};

const WINES: &str = "/api/wines/";

pub(super) async fn list(
    http: &CellarHttpClient,
    search: Option<&str>,
) -> Result<Vec<Wine>, CellarError> {
    let options = RequestOptions::get().query("search", search.map(str::trim));
    http.request(WINES, &options).await?.decode_list("wine list")
}

pub(super) async fn get(http: &CellarHttpClient, id: WineId) -> Result<Wine, CellarError> {
    http.request(&format!("{WINES}{id}/"), &RequestOptions::get())
        .await?
        .decode("wine")
}

/// JSON when there is no image, multipart with an `image` file part otherwise.
pub(super) async fn create(http: &CellarHttpClient, draft: &WineDraft) -> Result<Wine, CellarError> {
    let options = match &draft.image {
        Some(image) => {
            debug!(file = %image.file_name, "creating wine with image");
            RequestOptions::post().multipart(multipart(draft.form_fields(), image))
        }
        None => RequestOptions::post().json(&draft_json(draft))?,
    };
    http.request(WINES, &options).await?.decode("created wine")
}

pub(super) async fn update(
    http: &CellarHttpClient,
    id: WineId,
    update: &WineUpdate,
) -> Result<Wine, CellarError> {
    let options = match &update.image {
        Some(image) => RequestOptions::patch().multipart(multipart(update.form_fields(), image)),
        None => RequestOptions::patch().json(update)?,
    };
    http.request(&format!("{WINES}{id}/"), &options)
        .await?
        .decode("updated wine")
}

fn multipart(fields: Vec<(&'static str, String)>, image: &ImageUpload) -> MultipartBody {
    MultipartBody {
        fields: fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        files: vec![FilePart {
            name: "image".to_string(),
            file_name: image.file_name.clone(),
            content_type: image.content_type.clone(),
            bytes: image.bytes.clone(),
        }],
    }
}

/// Typed JSON for a draft: numbers stay numbers, the region is its id.
fn draft_json(draft: &WineDraft) -> Value {
    let mut body = Map::new();
    body.insert("name".into(), Value::from(draft.name.trim()));
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            body.insert(key.into(), value);
        }
    };
    let text = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Value::from)
    };
    put("country", text(&draft.country));
    put("region", draft.region.as_ref().map(|r| Value::from(r.id.0)));
    put("vintage", draft.vintage.map(Value::from));
    put("wine_type", text(&draft.wine_type));
    put("grape_varieties", text(&draft.grape_varieties));
    put("notes", text(&draft.notes));
    put("rating", draft.rating.map(Value::from));
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellarium_core::{Region, RegionId};

    #[test]
    fn draft_json_skips_blank_fields() {
        let draft = WineDraft {
            name: " Barolo ".into(),
            country: Some("Italy".into()),
            region: Some(Region {
                id: RegionId(4),
                name: "Piedmont".into(),
                country: Some("Italy".into()),
            }),
            vintage: Some(2016),
            notes: Some("   ".into()),
            ..WineDraft::default()
        };
        let json = draft_json(&draft);
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Barolo",
                "country": "Italy",
                "region": 4,
                "vintage": 2016
            })
        );
    }
}
