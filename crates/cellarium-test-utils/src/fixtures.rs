// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimal domain values for tests.

use cellarium_core::{Region, RegionId, Store, StoreId, Wine, WineId};

/// A wine with only an id and a name.
pub fn wine(id: i64, name: &str) -> Wine {
    Wine {
        id: WineId(id),
        name: name.to_string(),
        country: None,
        region: None,
        vintage: None,
        grape_varieties: None,
        wine_type: None,
        image: None,
        notes: None,
        rating: None,
        in_stock_count: None,
        bottle_count: None,
    }
}

pub fn region(id: i64, name: &str, country: &str) -> Region {
    Region {
        id: RegionId(id),
        name: name.to_string(),
        country: Some(country.to_string()),
    }
}

pub fn store(id: i64, name: &str) -> Store {
    Store {
        id: StoreId(id),
        name: name.to_string(),
    }
}
