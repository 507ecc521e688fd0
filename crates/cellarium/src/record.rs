// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cellarium bought` and `cellarium drank`: one-shot runs of the wizard.

use std::sync::Arc;

use cellarium_core::{CatalogApi, CellarError, StoreId, Wine, WineId};
use cellarium_flow::{StepKind, WizardController, WizardOptions};
use chrono::NaiveDate;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct BoughtArgs {
    /// Wine id.
    #[arg(long)]
    pub wine: i64,
    /// Number of bottles, at most 100.
    #[arg(long, default_value_t = 1)]
    pub count: u32,
    /// Price per bottle.
    #[arg(long)]
    pub price: Option<String>,
    /// Store id.
    #[arg(long)]
    pub store: Option<i64>,
    /// Purchase date (YYYY-MM-DD), today if omitted.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct DrankArgs {
    /// Wine id.
    #[arg(long)]
    pub wine: i64,
    /// Rating from 0 to 5.
    #[arg(long)]
    pub rating: u8,
    #[arg(long)]
    pub notes: Option<String>,
}

/// Opens the wizard pre-bound to the wine and submits the batch.
pub async fn bought(
    api: Arc<dyn CatalogApi>,
    options: WizardOptions,
    args: BoughtArgs,
) -> Result<(), CellarError> {
    let mut wizard = WizardController::open_for_wine(api, options, WineId(args.wine)).await;
    if wizard.kind() != StepKind::Bought {
        let message = wizard.error().unwrap_or("wine could not be loaded");
        return Err(CellarError::Validation(message.to_string()));
    }

    let draft = wizard.bottle_draft_mut()?;
    draft.quantity = args.count;
    draft.price = args.price;
    draft.store = args.store.map(StoreId);
    if let Some(date) = args.date {
        draft.purchase_date = date;
    }

    let report = wizard.submit_bought().await?;
    if let Some(summary) = report.failure_summary() {
        for (index, error) in report.failures() {
            eprintln!("  bottle {}: {error}", index + 1);
        }
        return Err(CellarError::Validation(summary));
    }
    let wine = wizard.step().wine().map_or("wine", |w| w.name.as_str());
    println!(
        "{} added {} to {}",
        "✓".green(),
        bottles(report.results.len()),
        wine.bold()
    );
    Ok(())
}

/// Records a tasting memory through the Intent -> Drank path.
pub async fn drank(
    api: Arc<dyn CatalogApi>,
    options: WizardOptions,
    args: DrankArgs,
) -> Result<(), CellarError> {
    let detail = api.get_wine(WineId(args.wine)).await?;
    let mut wizard = WizardController::open(api, options);
    wizard.pick_wine(detail.wine)?;
    wizard.choose_drank()?;
    wizard.set_rating(args.rating)?;
    wizard.memory_draft_mut()?.notes = args.notes.unwrap_or_default();

    let wine: Wine = wizard.submit_drank().await?;
    println!("{} saved memory for {}", "✓".green(), wine.name.bold());
    Ok(())
}

fn bottles(n: usize) -> String {
    if n == 1 {
        "1 bottle".to_string()
    } else {
        format!("{n} bottles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellarium_core::WineUpdate;
    use cellarium_test_utils::{CatalogCall, MockCatalog, wine};

    fn api(catalog: &MockCatalog) -> Arc<dyn CatalogApi> {
        Arc::new(catalog.clone())
    }

    fn bought_args(count: u32) -> BoughtArgs {
        BoughtArgs {
            wine: 1,
            count,
            price: Some("9.5".into()),
            store: Some(3),
            date: NaiveDate::from_ymd_opt(2026, 2, 14),
        }
    }

    #[tokio::test]
    async fn bought_sends_one_call_per_bottle() {
        let catalog = MockCatalog::with_wines(vec![wine(1, "Garnacha")]);
        bought(api(&catalog), WizardOptions::default(), bought_args(2))
            .await
            .unwrap();

        let sent = catalog.bottle_requests().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].store, Some(StoreId(3)));
        assert_eq!(sent[0].purchase_date, NaiveDate::from_ymd_opt(2026, 2, 14));
        assert!(catalog.search_queries().await.is_empty());
    }

    #[tokio::test]
    async fn partial_batch_is_an_error() {
        let catalog = MockCatalog::with_wines(vec![wine(1, "Garnacha")]);
        catalog.fail_bottle_creations_at(&[0]).await;
        let err = bought(api(&catalog), WizardOptions::default(), bought_args(2))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("added 1 of 2 bottles; 1 failed"));
    }

    #[tokio::test]
    async fn unknown_wine_is_reported() {
        let catalog = MockCatalog::new();
        let err = bought(api(&catalog), WizardOptions::default(), bought_args(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "wine not found");
    }

    #[tokio::test]
    async fn drank_updates_rating_and_notes() {
        let catalog = MockCatalog::with_wines(vec![wine(5, "Syrah")]);
        let args = DrankArgs {
            wine: 5,
            rating: 5,
            notes: Some("pepper".into()),
        };
        drank(api(&catalog), WizardOptions::default(), args)
            .await
            .unwrap();
        assert!(
            catalog
                .calls()
                .await
                .contains(&CatalogCall::UpdateWine(WineId(5), WineUpdate::memory(5, "pepper")))
        );
    }

    #[tokio::test]
    async fn drank_rejects_out_of_range_rating() {
        let catalog = MockCatalog::with_wines(vec![wine(5, "Syrah")]);
        let args = DrankArgs {
            wine: 5,
            rating: 9,
            notes: None,
        };
        assert!(drank(api(&catalog), WizardOptions::default(), args).await.is_err());
        assert!(
            !catalog
                .calls()
                .await
                .iter()
                .any(|c| matches!(c, CatalogCall::UpdateWine(..)))
        );
    }
}
