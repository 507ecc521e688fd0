// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::atomic::{AtomicUsize, Ordering};

use cellarium_core::AuthObserver;

/// Counts how often "auth required" was raised.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    count: AtomicUsize,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl AuthObserver for RecordingObserver {
    fn auth_required(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
