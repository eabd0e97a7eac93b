// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Cancellable one-shot timer used to coalesce bursts of entries into a
//! single write.
//!
//! The timer itself never touches session state. When it fires it calls the
//! supplied callback with the generation it was scheduled under; the session
//! worker turns that into a command on its own channel and checks
//! [`FlushTimer::is_current`] before acting, so a timer that fired just as it
//! was cancelled or replaced is ignored.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct FlushTimer {
    token: Option<CancellationToken>,
    generation: u64,
}

impl FlushTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A timer is pending from the moment it is scheduled until it is
    /// cancelled, including the window between firing and being handled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Whether a fired generation still belongs to the pending timer.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.is_pending()
    }

    /// Replaces any pending timer with a new one firing after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, delay: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {}
                () = tokio::time::sleep(delay) => on_fire(generation),
            }
        });
        self.token = Some(token);
        generation
    }

    /// Safe to call any number of times, whether or not the timer fired.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

impl Drop for FlushTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_fires_once_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = FlushTimer::new();
        let generation = timer.schedule(Duration::from_millis(20), move |g| {
            let _ = tx.send(g);
        });

        assert!(timer.is_pending());
        let fired = rx.recv().await.expect("timer should fire");
        assert_eq!(fired, generation);
        assert!(timer.is_current(fired));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_prevents_firing() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
        let mut timer = FlushTimer::new();
        timer.schedule(Duration::from_millis(20), move |g| {
            let _ = tx.send(g);
        });

        timer.cancel();
        timer.cancel();
        assert!(!timer.is_pending());

        // The sender is dropped together with the cancelled task.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_reschedule_supersedes_previous_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = FlushTimer::new();
        let first_tx = tx.clone();
        let first = timer.schedule(Duration::from_millis(10), move |g| {
            let _ = first_tx.send(g);
        });
        let second = timer.schedule(Duration::from_millis(10), move |g| {
            let _ = tx.send(g);
        });

        assert_ne!(first, second);
        assert!(!timer.is_current(first));
        assert_eq!(rx.recv().await, Some(second));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_cancel_without_schedule() {
        let mut timer = FlushTimer::new();
        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.is_current(0));
    }
}
