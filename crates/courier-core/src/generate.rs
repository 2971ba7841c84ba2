//! Pluggable content generation
//!
//! The one capability a node specialization supplies: turn an accepted
//! request into addressees and generated content fields. The dispatch core
//! treats it as opaque.

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Result of a generation step: who to address and what to carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Identities the outgoing envelope is addressed to. Empty means
    /// "accepted, but nothing to publish".
    pub addressees: Vec<String>,
    /// Generated content fields; the keys become the outgoing
    /// `header.content` list.
    pub contents: Map<String, Value>,
}

/// Domain-specific transformation a node plugs into the dispatch core.
///
/// Implementations may perform side effects and block for as long as they
/// need (e.g. call a hosted NLU service); the runtime bounds each invocation
/// with its configured generation timeout. Errors are logged and drop the
/// message being handled, nothing more.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce addressees and content fields for an accepted envelope.
    async fn generate(
        &self,
        sender: &str,
        requested: &Map<String, Value>,
    ) -> anyhow::Result<Generation>;
}
