//! Message-queue consumer lifecycle control.
//!
//! Canary deployments route queue traffic by machine: only instances on the
//! remotely stored allow-list consume, everyone else keeps their consumers
//! stopped. This crate polls that allow-list and toggles the registered
//! consumers accordingly. It is a plain poller; which machines belong on
//! the list is someone else's decision.

pub mod controller;
pub mod metrics_defs;
pub mod source;

pub use controller::{Consumer, ListenerController};
pub use source::{AllowListSource, HttpAllowListSource, SourceError, StaticAllowList};

use tokio::time::Duration;

/// Polls `source` on `interval` and applies each fetched allow-list to the
/// controller. Fetch failures keep the current consumer state.
pub async fn run<S: AllowListSource>(
    mut controller: ListenerController,
    source: S,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match source.fetch().await {
            Ok(allow_list) => controller.apply(&allow_list).await,
            Err(err) => {
                tracing::warn!(error = %err, "allow-list fetch failed, keeping consumer state");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConsumer {
        starts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Consumer for CountingConsumer {
        fn name(&self) -> &str {
            "counting"
        }
        async fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        async fn stop(&self) {}
    }

    #[tokio::test]
    async fn test_poll_loop_applies_allow_list() {
        let consumer = Arc::new(CountingConsumer {
            starts: AtomicUsize::new(0),
        });
        let controller = ListenerController::new(
            vec![consumer.clone() as Arc<dyn Consumer>],
            Some("10.0.0.7".into()),
        );
        let source = StaticAllowList::new("all");

        let poller = tokio::spawn(run(controller, source, Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(100)).await;
        poller.abort();

        // started exactly once despite many polls
        assert_eq!(consumer.starts.load(Ordering::SeqCst), 1);
    }
}
