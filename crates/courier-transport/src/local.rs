//! In-process topic bus

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

use courier_core::Transport;

/// In-process publish/subscribe bus.
///
/// Every subscription gets its own bounded queue; `publish` awaits queue
/// space on each live subscription (block-caller back-pressure, matching the
/// node runtime's policy) and prunes subscriptions whose receivers are gone.
/// All state is per-instance; two buses never share topics.
pub struct LocalTransport {
    topics: RwLock<HashMap<String, Vec<mpsc::Sender<String>>>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live subscriptions on a channel.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.topics
            .read()
            .await
            .get(channel)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn publish(&self, channel: &str, payload: &str) -> anyhow::Result<()> {
        // Snapshot the senders so a slow subscriber does not hold the
        // registry lock.
        let senders: Vec<mpsc::Sender<String>> = {
            let topics = self.topics.read().await;
            match topics.get(channel) {
                Some(senders) => senders.clone(),
                None => {
                    debug!("No subscribers on '{}'", channel);
                    return Ok(());
                }
            }
        };

        let mut dead = false;
        for tx in &senders {
            if tx.send(payload.to_string()).await.is_err() {
                dead = true;
            }
        }

        if dead {
            let mut topics = self.topics.write().await;
            if let Some(senders) = topics.get_mut(channel) {
                senders.retain(|tx| !tx.is_closed());
                if senders.is_empty() {
                    topics.remove(channel);
                }
            }
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        capacity: usize,
    ) -> anyhow::Result<mpsc::Receiver<String>> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.topics
            .write()
            .await
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        debug!("New subscription on '{}' (capacity {})", channel, capacity);
        Ok(rx)
    }
}
