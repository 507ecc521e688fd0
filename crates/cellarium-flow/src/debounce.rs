// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounced search with stale-response suppression.
//!
//! Every call to [`SearchDebouncer::input`] starts a new generation. A
//! request is only sent once the query has been stable for the settle
//! window, and a response is only applied if its generation is still the
//! latest when it arrives. Requests already in flight are never aborted;
//! their results are simply dropped.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cellarium_core::{CatalogApi, CellarError, Wine};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default settle time after the last keystroke.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(250);
/// Default cap on displayed results.
pub const DEFAULT_MAX_RESULTS: usize = 8;

type SearchFn<T> =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<Vec<T>, CellarError>> + Send + Sync>;

/// What a search view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot<T> {
    /// The trimmed query of the latest input.
    pub query: String,
    pub results: Vec<T>,
    /// True while the request for the latest query is in flight.
    pub loading: bool,
    /// True from a non-blank input until its outcome is applied.
    pub pending: bool,
    /// Message of the latest failed search, if it failed.
    pub error: Option<String>,
    /// Generation of the latest input.
    pub generation: u64,
}

impl<T> Default for SearchSnapshot<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            loading: false,
            pending: false,
            error: None,
            generation: 0,
        }
    }
}

/// Coalesces rapid query changes into at most one request per window.
pub struct SearchDebouncer<T> {
    search: SearchFn<T>,
    window: Duration,
    max_results: usize,
    generation: Arc<AtomicU64>,
    shutdown: CancellationToken,
    /// Cancels the timer of the input that has not fired yet.
    timer: Mutex<CancellationToken>,
    state: Arc<watch::Sender<SearchSnapshot<T>>>,
}

impl<T> std::fmt::Debug for SearchDebouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchDebouncer")
            .field("window", &self.window)
            .field("max_results", &self.max_results)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("disposed", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl SearchDebouncer<Wine> {
    /// Debounced wine search over a catalog.
    pub fn wines(api: Arc<dyn CatalogApi>, window: Duration, max_results: usize) -> Self {
        Self::new(window, max_results, move |query: String| {
            let api = api.clone();
            async move { api.search_wines(&query).await }
        })
    }
}

impl<T> SearchDebouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(window: Duration, max_results: usize, search: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, CellarError>> + Send + 'static,
    {
        let search: SearchFn<T> = Arc::new(move |query: String| search(query).boxed());
        let shutdown = CancellationToken::new();
        let (tx, _rx) = watch::channel(SearchSnapshot::default());
        Self {
            search,
            window,
            max_results,
            generation: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(shutdown.child_token()),
            shutdown,
            state: Arc::new(tx),
        }
    }

    /// Records a new query. Must be called within a tokio runtime.
    ///
    /// A blank query clears the results at once and sends nothing.
    pub fn input(&self, query: &str) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let query = query.trim().to_string();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let timer = {
            let mut pending = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
            pending.cancel();
            *pending = self.shutdown.child_token();
            pending.clone()
        };

        if query.is_empty() {
            self.state.send_modify(|s| {
                s.query.clear();
                s.results.clear();
                s.loading = false;
                s.pending = false;
                s.error = None;
                s.generation = generation;
            });
            return;
        }

        self.state.send_modify(|s| {
            s.query = query.clone();
            s.loading = false;
            s.pending = true;
            s.generation = generation;
        });

        let search = self.search.clone();
        let latest = self.generation.clone();
        let state = self.state.clone();
        let shutdown = self.shutdown.clone();
        let window = self.window;
        let max_results = self.max_results;

        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => return,
                _ = tokio::time::sleep(window) => {}
            }
            let is_current = || {
                !shutdown.is_cancelled() && latest.load(Ordering::SeqCst) == generation
            };
            if !state.send_if_modified(|s| {
                if !is_current() {
                    return false;
                }
                s.loading = true;
                true
            }) {
                return;
            }

            debug!(generation, query = %query, "issuing search");
            let outcome = search(query).await;

            // Checked under the channel's lock: a newer input either makes
            // this result stale or publishes its own query after it.
            let applied = state.send_if_modified(|s| {
                if !is_current() {
                    return false;
                }
                match &outcome {
                    Ok(results) => {
                        s.results = results.iter().take(max_results).cloned().collect();
                        s.error = None;
                    }
                    Err(e) => {
                        s.results.clear();
                        s.error = Some(e.to_string());
                    }
                }
                s.loading = false;
                s.pending = false;
                true
            });

            match (&outcome, applied) {
                (Err(e), true) => warn!(generation, error = %e, "search failed"),
                (_, false) => debug!(generation, "discarding stale search result"),
                _ => {}
            }
        });
    }

    pub fn snapshot(&self) -> SearchSnapshot<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot<T>> {
        self.state.subscribe()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Cancels any pending timer; every later result is ignored.
    pub fn dispose(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("search debouncer disposed");
            self.shutdown.cancel();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl<T> Drop for SearchDebouncer<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(calls: Arc<AtomicUsize>) -> SearchDebouncer<String> {
        SearchDebouncer::new(DEFAULT_WINDOW, 3, move |q: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok((0..5).map(|i| format!("{q}-{i}")).collect()) }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_inputs_send_one_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let debouncer = counting(calls.clone());

        debouncer.input("m");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.input("ma");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.input("mal");
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = debouncer.snapshot();
        assert_eq!(snapshot.query, "mal");
        assert_eq!(snapshot.results, vec!["mal-0", "mal-1", "mal-2"]);
        assert!(!snapshot.loading);
        assert!(!snapshot.pending);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_query_clears_without_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let debouncer = counting(calls.clone());

        debouncer.input("rio");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(debouncer.snapshot().results.len(), 3);

        debouncer.input("   ");
        let snapshot = debouncer.snapshot();
        assert!(snapshot.results.is_empty());
        assert_eq!(snapshot.query, "");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_clears_results_and_records_message() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = fail.clone();
        let debouncer = SearchDebouncer::new(DEFAULT_WINDOW, 8, move |q: String| {
            let fail = flag.load(Ordering::SeqCst);
            async move {
                if fail {
                    Err(CellarError::Internal("backend down".into()))
                } else {
                    Ok(vec![q])
                }
            }
        });

        debouncer.input("ok");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(debouncer.snapshot().results, vec!["ok".to_string()]);

        fail.store(true, Ordering::SeqCst);
        debouncer.input("broken");
        tokio::time::sleep(Duration::from_millis(300)).await;
        let snapshot = debouncer.snapshot();
        assert!(snapshot.results.is_empty());
        assert_eq!(snapshot.error.as_deref(), Some("internal error: backend down"));
    }

    #[tokio::test(start_paused = true)]
    async fn disposed_debouncer_ignores_pending_and_new_input() {
        let calls = Arc::new(AtomicUsize::new(0));
        let debouncer = counting(calls.clone());

        debouncer.input("a");
        debouncer.dispose();
        debouncer.input("b");
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_disposed());
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_drops_result_already_in_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let debouncer = SearchDebouncer::new(DEFAULT_WINDOW, 8, move |q: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(400)).await;
                Ok(vec![q])
            }
        });

        debouncer.input("syrah");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(debouncer.snapshot().loading);

        debouncer.dispose();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(debouncer.snapshot().results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_loading_then_results() {
        let debouncer = SearchDebouncer::new(DEFAULT_WINDOW, 8, |q: String| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(vec![q])
        });
        let mut rx = debouncer.subscribe();

        debouncer.input("x");
        assert!(rx.borrow().pending);
        tokio::time::sleep(Duration::from_millis(260)).await;
        assert!(rx.borrow_and_update().loading);

        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.results, vec!["x".to_string()]);
    }
}
