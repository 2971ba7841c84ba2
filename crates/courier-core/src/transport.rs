//! Injectable publish/subscribe boundary
//!
//! The delivery substrate is external to the routing core. Abstracting it
//! behind a trait keeps the node runtime testable without a live broker;
//! `courier-transport` provides an in-process implementation.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Publish/subscribe substrate a node runtime is wired over.
///
/// `publish` must be safe to call concurrently. Delivery semantics
/// (at-least-once vs exactly-once) are owned by the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a raw payload on a named channel.
    async fn publish(&self, channel: &str, payload: &str) -> anyhow::Result<()>;

    /// Subscribe to a named channel with a bounded delivery queue of
    /// `capacity` messages.
    async fn subscribe(
        &self,
        channel: &str,
        capacity: usize,
    ) -> anyhow::Result<mpsc::Receiver<String>>;
}
