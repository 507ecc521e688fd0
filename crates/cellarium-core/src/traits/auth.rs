// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer for the "authentication required" signal.

use tokio::sync::watch;

/// Receives the "auth required" signal raised when credentials are cleared.
///
/// Registered by the surrounding application at startup (typically a route
/// guard that sends the user to the login screen). Implementations must
/// tolerate repeated calls; avoiding redirect loops is the observer's job.
pub trait AuthObserver: Send + Sync {
    fn auth_required(&self);
}

impl<F> AuthObserver for F
where
    F: Fn() + Send + Sync,
{
    fn auth_required(&self) {
        self()
    }
}

/// Observer that ignores the signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AuthObserver for NoopObserver {
    fn auth_required(&self) {}
}

/// Publishes the signal on a watch channel as a running count, so any number
/// of subscribers can await it without missing an occurrence.
#[derive(Debug)]
pub struct WatchObserver {
    tx: watch::Sender<u64>,
}

impl WatchObserver {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// How many times the signal has been raised.
    pub fn count(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Default for WatchObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthObserver for WatchObserver {
    fn auth_required(&self) {
        self.tx.send_modify(|n| *n += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn closures_are_observers() {
        let hits = AtomicUsize::new(0);
        let observer = || {
            hits.fetch_add(1, Ordering::SeqCst);
        };
        observer.auth_required();
        observer.auth_required();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn watch_observer_wakes_subscribers() {
        let observer = WatchObserver::new();
        let mut rx = observer.subscribe();
        observer.auth_required();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        observer.auth_required();
        assert_eq!(observer.count(), 2);
    }
}
