//! Debounced search input
//!
//! Each keystroke takes a new generation and sleeps through the quiet
//! window; only the keystroke still holding the latest generation when it
//! wakes applies its query.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct SearchDebouncer {
    generation: Arc<AtomicU64>,
    window: Duration,
}

impl SearchDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            window,
        }
    }

    /// Schedule `apply` after the quiet window.
    ///
    /// The handle resolves to `true` when this call was the last one inside
    /// the window and `apply` ran.
    pub fn trigger<F, Fut>(&self, apply: F) -> JoinHandle<bool>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let window = self.window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            if latest.load(Ordering::SeqCst) != generation {
                return false;
            }
            apply().await;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_only_last_keystroke_applies() {
        let debouncer = SearchDebouncer::new(Duration::from_millis(30));
        let applied = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = ["a", "ai", "ais"]
            .into_iter()
            .map(|query| {
                let applied = Arc::clone(&applied);
                debouncer.trigger(move || async move {
                    applied.lock().unwrap().push(query.to_string());
                })
            })
            .collect();

        let mut ran = Vec::new();
        for handle in handles {
            ran.push(handle.await.unwrap());
        }

        assert_eq!(ran, vec![false, false, true]);
        assert_eq!(*applied.lock().unwrap(), vec!["ais".to_string()]);
    }

    #[tokio::test]
    async fn test_keystrokes_outside_window_each_apply() {
        let debouncer = SearchDebouncer::new(Duration::from_millis(5));

        assert!(debouncer.trigger(|| async {}).await.unwrap());
        assert!(debouncer.trigger(|| async {}).await.unwrap());
    }
}
