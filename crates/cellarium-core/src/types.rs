// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the HTTP API layer and the add-wine wizard.
//!
//! Wines, bottles, regions and stores are owned by the backend; these types
//! only mirror the fields the client reads or writes. Unknown fields in
//! responses are ignored.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Backend identifier of a wine.
    WineId
);
entity_id!(
    /// Backend identifier of a single bottle.
    BottleId
);
entity_id!(
    /// Backend identifier of a region.
    RegionId
);
entity_id!(
    /// Backend identifier of a store.
    StoreId
);

/// A wine as returned by list, search, detail, create and update endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wine {
    pub id: WineId,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<RegionRef>,
    #[serde(default)]
    pub vintage: Option<i32>,
    #[serde(default)]
    pub grape_varieties: Option<String>,
    #[serde(default)]
    pub wine_type: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub in_stock_count: Option<u32>,
    #[serde(default)]
    pub bottle_count: Option<u32>,
}

impl Wine {
    /// Secondary description used in search listings: country, region and
    /// vintage joined with a bullet, skipping absent parts.
    pub fn summary_line(&self) -> String {
        let region = self.region.as_ref().and_then(RegionRef::display_name);
        let vintage = self.vintage.map(|v| v.to_string());
        [self.country.as_deref(), region, vintage.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" • ")
    }
}

/// The backend has sent a wine's region as a bare id, an embedded object, and
/// (in older data) a free-text name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionRef {
    Id(RegionId),
    Region(Region),
    Name(String),
}

impl RegionRef {
    /// Returns a printable name when one is known locally.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            RegionRef::Id(_) => None,
            RegionRef::Region(region) => Some(region.name.as_str()),
            RegionRef::Name(name) => Some(name.as_str()),
        }
    }

    /// Returns the region id when one is known locally.
    pub fn id(&self) -> Option<RegionId> {
        match self {
            RegionRef::Id(id) => Some(*id),
            RegionRef::Region(region) => Some(region.id),
            RegionRef::Name(_) => None,
        }
    }
}

/// One physical unit of inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottle {
    pub id: BottleId,
    pub wine: WineId,
    #[serde(default)]
    pub store: Option<StoreId>,
    #[serde(default, deserialize_with = "decimal_string")]
    pub price: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub consumed_at: Option<DateTime<Utc>>,
}

impl Bottle {
    /// A bottle is consumed once it has a consumption timestamp.
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}

/// A wine with its bottles, as assembled for the detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct WineDetail {
    pub wine: Wine,
    pub bottles: Vec<Bottle>,
    /// Number of bottles not yet consumed.
    pub total_quantity: usize,
}

impl WineDetail {
    pub fn new(wine: Wine, bottles: Vec<Bottle>) -> Self {
        let total_quantity = bottles.iter().filter(|b| !b.is_consumed()).count();
        Self {
            wine,
            bottles,
            total_quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
}

/// Payload for `POST /api/bottles/`. Absent fields are omitted from the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBottle {
    pub wine: WineId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

/// An image attached to a wine create/update, passed through unchanged.
#[derive(Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The fields of a wine being created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WineDraft {
    pub name: String,
    pub country: Option<String>,
    pub region: Option<Region>,
    pub vintage: Option<i32>,
    pub wine_type: Option<String>,
    pub grape_varieties: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
    pub image: Option<ImageUpload>,
}

impl WineDraft {
    /// Text fields in wire order, skipping absent and empty values. The
    /// region is sent as its id.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        push_field(&mut fields, "name", Some(self.name.clone()));
        push_field(&mut fields, "country", self.country.clone());
        push_field(&mut fields, "region", self.region.as_ref().map(|r| r.id.to_string()));
        push_field(&mut fields, "vintage", self.vintage.map(|v| v.to_string()));
        push_field(&mut fields, "wine_type", self.wine_type.clone());
        push_field(&mut fields, "grape_varieties", self.grape_varieties.clone());
        push_field(&mut fields, "notes", self.notes.clone());
        push_field(&mut fields, "rating", self.rating.map(|r| r.to_string()));
        fields
    }
}

/// Partial update for `PATCH /api/wines/{id}/`. Only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WineUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vintage: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grape_varieties: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

impl WineUpdate {
    /// The "drank" memory: rating plus notes, nothing else.
    pub fn memory(rating: u8, notes: impl Into<String>) -> Self {
        Self {
            rating: Some(rating),
            notes: Some(notes.into()),
            ..Self::default()
        }
    }

    /// Text fields for a multipart update.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        push_field(&mut fields, "name", self.name.clone());
        push_field(&mut fields, "country", self.country.clone());
        push_field(&mut fields, "region", self.region.map(|r| r.to_string()));
        push_field(&mut fields, "vintage", self.vintage.map(|v| v.to_string()));
        push_field(&mut fields, "wine_type", self.wine_type.clone());
        push_field(&mut fields, "grape_varieties", self.grape_varieties.clone());
        push_field(&mut fields, "notes", self.notes.clone());
        push_field(&mut fields, "rating", self.rating.map(|r| r.to_string()));
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRegion {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

fn push_field(fields: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        fields.push((key, value));
    }
}

/// Prices are decimals serialized as strings, but tolerate bare numbers.
fn decimal_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Decimal>::deserialize(deserializer)?.map(|d| match d {
        Decimal::Text(s) => s,
        Decimal::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wine_region_accepts_id_object_and_name() {
        let by_id: Wine = serde_json::from_value(json!({"id": 1, "name": "A", "region": 7})).unwrap();
        assert_eq!(by_id.region, Some(RegionRef::Id(RegionId(7))));

        let by_obj: Wine = serde_json::from_value(json!({
            "id": 2, "name": "B", "region": {"id": 3, "name": "Rioja", "country": "ES"}
        }))
        .unwrap();
        assert_eq!(by_obj.region.as_ref().and_then(RegionRef::display_name), Some("Rioja"));
        assert_eq!(by_obj.region.as_ref().and_then(RegionRef::id), Some(RegionId(3)));

        let by_name: Wine =
            serde_json::from_value(json!({"id": 3, "name": "C", "region": "Mosel"})).unwrap();
        assert_eq!(by_name.region, Some(RegionRef::Name("Mosel".into())));
    }

    #[test]
    fn summary_line_skips_missing_parts() {
        let wine: Wine = serde_json::from_value(json!({
            "id": 1, "name": "Margaux", "country": "FR",
            "region": {"id": 1, "name": "Bordeaux"}, "vintage": 2015,
            "unexpected_field": true
        }))
        .unwrap();
        assert_eq!(wine.summary_line(), "FR • Bordeaux • 2015");

        let bare: Wine = serde_json::from_value(json!({"id": 2, "name": "X"})).unwrap();
        assert_eq!(bare.summary_line(), "");
    }

    #[test]
    fn bottle_price_tolerates_numbers_and_counts_consumption() {
        let bottles: Vec<Bottle> = serde_json::from_value(json!([
            {"id": 1, "wine": 9, "price": "12.50", "purchase_date": "2026-01-02"},
            {"id": 2, "wine": 9, "price": 8, "consumed_at": "2026-02-01T18:00:00Z"},
            {"id": 3, "wine": 9, "price": null}
        ]))
        .unwrap();
        assert_eq!(bottles[0].price.as_deref(), Some("12.50"));
        assert_eq!(bottles[1].price.as_deref(), Some("8"));
        assert_eq!(bottles[2].price, None);

        let wine: Wine = serde_json::from_value(json!({"id": 9, "name": "W"})).unwrap();
        let detail = WineDetail::new(wine, bottles);
        assert_eq!(detail.total_quantity, 2);
    }

    #[test]
    fn new_bottle_omits_absent_fields() {
        let bottle = NewBottle {
            wine: WineId(4),
            store: None,
            purchase_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            price: None,
        };
        assert_eq!(
            serde_json::to_value(&bottle).unwrap(),
            json!({"wine": 4, "purchase_date": "2026-03-01"})
        );
    }

    #[test]
    fn draft_form_fields_skip_empty_values() {
        let draft = WineDraft {
            name: "Barolo".into(),
            country: Some(String::new()),
            region: Some(Region {
                id: RegionId(12),
                name: "Piemonte".into(),
                country: Some("IT".into()),
            }),
            vintage: Some(2018),
            ..WineDraft::default()
        };
        assert_eq!(
            draft.form_fields(),
            vec![
                ("name", "Barolo".to_string()),
                ("region", "12".to_string()),
                ("vintage", "2018".to_string()),
            ]
        );
    }

    #[test]
    fn memory_update_serializes_rating_and_notes_only() {
        let update = WineUpdate::memory(4, "silky");
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"rating": 4, "notes": "silky"})
        );
    }
}
