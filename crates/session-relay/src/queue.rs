// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;

use crate::entry::Entry;

/// In-memory, insertion-ordered buffer of entries waiting to be flushed.
#[derive(Debug, Default)]
pub struct EntryQueue {
    entries: VecDeque<Entry>,
}

impl EntryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push_back(entry);
    }

    /// Takes every buffered entry, oldest first, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Entry> {
        self.entries.drain(..).collect()
    }

    /// Puts a batch that could not be persisted back in front of anything
    /// buffered since it was drained.
    pub fn requeue(&mut self, batch: Vec<Entry>) {
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
