use async_trait::async_trait;
use std::sync::Arc;

use crate::metrics_defs::{CONSUMERS_DISABLED, CONSUMERS_ENABLED};
use shared::counter;

/// One controllable queue consumer, registered by the host application.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Begins consuming. Called at most once per enable transition.
    async fn start(&self);

    /// Stops consuming. Called at most once per disable transition.
    async fn stop(&self);
}

/// Toggles a set of consumers between listening and not listening based on
/// the polled allow-list.
pub struct ListenerController {
    consumers: Vec<Arc<dyn Consumer>>,
    // consumers stay stopped until the first allow-list poll says otherwise
    listening: bool,
    local_ip: String,
}

impl ListenerController {
    /// `local_ip` overrides address discovery; pass `None` outside tests.
    pub fn new(consumers: Vec<Arc<dyn Consumer>>, local_ip: Option<String>) -> Self {
        let local_ip = local_ip
            .or_else(shared::net::local_ip)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "could not discover a local IP, only wildcard allow-lists will match"
                );
                String::new()
            });

        ListenerController {
            consumers,
            listening: false,
            local_ip,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Applies one fetched allow-list document, starting or stopping the
    /// consumers when the desired state differs from the current one.
    pub async fn apply(&mut self, allow_list: &str) {
        if should_listen(allow_list, &self.local_ip) {
            self.enable().await;
        } else {
            self.disable().await;
        }
    }

    async fn enable(&mut self) {
        if self.listening {
            return;
        }
        counter!(CONSUMERS_ENABLED).increment(1);
        tracing::info!("enabling queue consumers");
        for consumer in &self.consumers {
            tracing::debug!(consumer = consumer.name(), "starting consumer");
            consumer.start().await;
        }
        self.listening = true;
    }

    async fn disable(&mut self) {
        if !self.listening {
            return;
        }
        counter!(CONSUMERS_DISABLED).increment(1);
        tracing::info!("disabling queue consumers");
        for consumer in &self.consumers {
            tracing::debug!(consumer = consumer.name(), "stopping consumer");
            consumer.stop().await;
        }
        self.listening = false;
    }
}

/// An unconfigured (empty) document enables everyone: some machine has to
/// drain the queue. Otherwise the list must name this machine or `all`.
fn should_listen(allow_list: &str, local_ip: &str) -> bool {
    if allow_list.trim().is_empty() {
        return true;
    }
    allow_list
        .split([';', ','])
        .map(str::trim)
        .any(|entry| entry.eq_ignore_ascii_case("all") || entry == local_ip)
}
