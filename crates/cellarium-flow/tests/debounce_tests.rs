// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounced wine search against the in-memory catalog, on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use cellarium_core::CatalogApi;
use cellarium_flow::SearchDebouncer;
use cellarium_test_utils::{MockCatalog, wine};
use tokio::time::{advance, sleep};

fn debouncer(catalog: &MockCatalog) -> SearchDebouncer<cellarium_core::Wine> {
    let api: Arc<dyn CatalogApi> = Arc::new(catalog.clone());
    SearchDebouncer::wines(api, Duration::from_millis(250), 8)
}

fn names(debouncer: &SearchDebouncer<cellarium_core::Wine>) -> Vec<String> {
    debouncer
        .snapshot()
        .results
        .into_iter()
        .map(|w| w.name)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn slow_stale_response_never_overwrites_newer_query() {
    let catalog = MockCatalog::with_wines(vec![wine(1, "abc Barolo"), wine(2, "abd Barbera")]);
    catalog.set_search_delay("ab", Duration::from_millis(400)).await;
    let search = debouncer(&catalog);

    search.input("a");
    sleep(Duration::from_millis(50)).await;
    search.input("ab");
    // "ab" fires at 300ms and stays in flight until 700ms.
    sleep(Duration::from_millis(260)).await;
    assert!(search.snapshot().loading);
    search.input("abc");

    sleep(Duration::from_millis(300)).await;
    assert_eq!(names(&search), vec!["abc Barolo"]);
    assert!(!search.snapshot().loading);

    // Let the stale "ab" response land.
    sleep(Duration::from_millis(400)).await;
    let snapshot = search.snapshot();
    assert_eq!(snapshot.query, "abc");
    assert_eq!(names(&search), vec!["abc Barolo"]);
    assert_eq!(
        catalog.search_queries().await,
        vec!["ab".to_string(), "abc".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn query_is_trimmed_before_sending() {
    let catalog = MockCatalog::with_wines(vec![wine(1, "Malbec")]);
    let search = debouncer(&catalog);

    search.input("  malbec  ");
    sleep(Duration::from_millis(300)).await;

    assert_eq!(catalog.search_queries().await, vec!["malbec".to_string()]);
    assert_eq!(names(&search), vec!["Malbec"]);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_sent_before_the_window_elapses() {
    let catalog = MockCatalog::with_wines(vec![wine(1, "Malbec")]);
    let search = debouncer(&catalog);

    search.input("mal");
    advance(Duration::from_millis(200)).await;
    tokio::task::yield_now().await;
    assert!(catalog.search_queries().await.is_empty());

    sleep(Duration::from_millis(100)).await;
    assert_eq!(catalog.search_queries().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn clearing_during_flight_discards_the_response() {
    let catalog = MockCatalog::with_wines(vec![wine(1, "Malbec")]);
    catalog.set_search_delay("mal", Duration::from_millis(200)).await;
    let search = debouncer(&catalog);

    search.input("mal");
    sleep(Duration::from_millis(300)).await;
    search.input("");
    sleep(Duration::from_millis(300)).await;

    let snapshot = search.snapshot();
    assert!(snapshot.results.is_empty());
    assert!(!snapshot.loading);
    assert_eq!(catalog.search_queries().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_search_reports_error() {
    let catalog = MockCatalog::with_wines(vec![wine(1, "Malbec")]);
    catalog.fail("search_wines", 503, "search unavailable").await;
    let search = debouncer(&catalog);

    search.input("mal");
    sleep(Duration::from_millis(300)).await;

    let snapshot = search.snapshot();
    assert!(snapshot.results.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("search unavailable"));
    assert!(!snapshot.loading);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_debouncer_cancels_pending_search() {
    let catalog = MockCatalog::with_wines(vec![wine(1, "Malbec")]);
    let search = debouncer(&catalog);

    search.input("mal");
    drop(search);
    sleep(Duration::from_millis(500)).await;

    assert!(catalog.search_queries().await.is_empty());
}
