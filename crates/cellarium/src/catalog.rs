// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-mostly catalog commands: listings, detail, consumption and stores.

use cellarium_core::{
    Bottle, BottleId, CatalogApi, CellarError, Region, Store, Wine, WineDetail, WineId,
};
use colored::Colorize;

pub async fn list_wines(api: &dyn CatalogApi, search: Option<&str>) -> Result<(), CellarError> {
    let wines = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(query) => api.search_wines(query).await?,
        None => api.list_wines().await?,
    };
    if wines.is_empty() {
        println!("no wines found");
    }
    for wine in &wines {
        println!("{}", wine_row(wine));
    }
    Ok(())
}

pub async fn show_wine(api: &dyn CatalogApi, id: WineId) -> Result<(), CellarError> {
    let detail = api.get_wine(id).await?;
    print!("{}", detail_text(&detail));
    Ok(())
}

pub async fn consume(api: &dyn CatalogApi, id: BottleId) -> Result<(), CellarError> {
    api.consume_bottle(id).await?;
    println!("{} bottle {id} consumed", "✓".green());
    Ok(())
}

pub async fn undo_consume(api: &dyn CatalogApi, id: BottleId) -> Result<(), CellarError> {
    api.undo_consume_bottle(id).await?;
    println!("{} bottle {id} back in stock", "✓".green());
    Ok(())
}

pub async fn list_stores(api: &dyn CatalogApi) -> Result<(), CellarError> {
    let stores = api.list_stores().await?;
    if stores.is_empty() {
        println!("no stores yet");
    }
    for store in &stores {
        println!("{}", store_row(store));
    }
    Ok(())
}

pub async fn add_store(api: &dyn CatalogApi, name: &str) -> Result<(), CellarError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CellarError::Validation("store name is required".to_string()));
    }
    let store = api.create_store(name).await?;
    println!("{} added {}", "✓".green(), store_row(&store));
    Ok(())
}

pub async fn list_regions(
    api: &dyn CatalogApi,
    search: Option<&str>,
    country: Option<&str>,
) -> Result<(), CellarError> {
    let query = search.map(str::trim).unwrap_or_default();
    let country = country.map(str::trim).filter(|c| !c.is_empty());
    let regions = api.search_regions(query, country).await?;
    if regions.is_empty() {
        println!("no regions found");
    }
    for region in &regions {
        println!("{}", region_row(region));
    }
    Ok(())
}

pub fn wine_row(wine: &Wine) -> String {
    let mut row = format!("{:>5}  {}", format!("#{}", wine.id).dimmed(), wine.name.bold());
    let summary = wine.summary_line();
    if !summary.is_empty() {
        row.push_str(&format!("  {}", summary.dimmed()));
    }
    if let Some(count) = wine.in_stock_count {
        row.push_str(&format!("  ({count} in stock)"));
    }
    row
}

pub fn region_row(region: &Region) -> String {
    match &region.country {
        Some(country) => format!("#{}  {} ({country})", region.id, region.name),
        None => format!("#{}  {}", region.id, region.name),
    }
}

fn store_row(store: &Store) -> String {
    format!("#{}  {}", store.id, store.name)
}

fn bottle_row(bottle: &Bottle) -> String {
    let mut parts = vec![format!("bottle #{}", bottle.id)];
    if let Some(date) = bottle.purchase_date {
        parts.push(format!("bought {date}"));
    }
    if let Some(price) = &bottle.price {
        parts.push(format!("price {price}"));
    }
    if let Some(store) = bottle.store {
        parts.push(format!("store #{store}"));
    }
    match bottle.consumed_at {
        Some(at) => parts.push(format!("consumed {}", at.date_naive())),
        None => parts.push("in stock".to_string()),
    }
    parts.join(", ")
}

pub fn detail_text(detail: &WineDetail) -> String {
    let wine = &detail.wine;
    let mut out = format!("{}\n", wine_row(wine));
    if let Some(kind) = &wine.wine_type {
        out.push_str(&format!("  type: {kind}\n"));
    }
    if let Some(grapes) = &wine.grape_varieties {
        out.push_str(&format!("  grapes: {grapes}\n"));
    }
    if let Some(rating) = wine.rating {
        out.push_str(&format!("  rating: {}\n", "★".repeat(usize::from(rating))));
    }
    if let Some(notes) = wine.notes.as_deref().filter(|n| !n.is_empty()) {
        out.push_str(&format!("  notes: {notes}\n"));
    }
    out.push_str(&format!(
        "  {} of {} bottles in stock\n",
        detail.total_quantity,
        detail.bottles.len()
    ));
    for bottle in &detail.bottles {
        out.push_str(&format!("    {}\n", bottle_row(bottle)));
    }
    out
}
