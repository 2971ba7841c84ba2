//! Node runtime
//!
//! Owns one inbound subscription and one outbound publish binding and wires
//! the dispatch path: decode → filter → generate → build → publish. Each
//! delivery is handled independently; the only state a node carries across
//! messages is its identity and its bindings, both fixed at construction.
//!
//! Generation may block for an unbounded time (a generator is free to call
//! out to a hosted service), so accepted requests are handed to a bounded
//! worker queue instead of being generated on the delivery path. When the
//! queue is full the dispatch loop awaits space (block-caller policy): slow
//! generation applies back-pressure, it never drops accepted messages.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::envelope::{self, Envelope};
use crate::error::{FilterError, NodeError};
use crate::filter::{Accepted, filter};
use crate::generate::ContentGenerator;
use crate::transport::Transport;

const DEFAULT_QUEUE_DEPTH: usize = 10;
const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Construction-time configuration for a node runtime.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Channel the node subscribes on.
    pub inbound_channel: String,
    /// Channel generated envelopes are published on.
    pub outbound_channel: String,
    /// Bounded depth of the inbound subscription queue.
    pub queue_depth: usize,
    /// Bounded depth of the generation worker queue.
    pub worker_queue_depth: usize,
    /// Upper bound on a single generator invocation. `None` disables the
    /// bound.
    pub generation_timeout: Option<Duration>,
}

impl NodeConfig {
    /// Configuration with default queue depths and generation timeout.
    pub fn new(inbound_channel: impl Into<String>, outbound_channel: impl Into<String>) -> Self {
        Self {
            inbound_channel: inbound_channel.into(),
            outbound_channel: outbound_channel.into(),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            worker_queue_depth: DEFAULT_QUEUE_DEPTH,
            generation_timeout: Some(DEFAULT_GENERATION_TIMEOUT),
        }
    }
}

/// An accepted request queued for generation.
struct Job {
    sender: String,
    requested: Map<String, Value>,
}

/// Dispatch core for one node.
///
/// The identity is the sole value checked against inbound `target` lists and
/// the `source` stamped on outgoing envelopes. It is set once here and never
/// mutated, so the filter and worker need no synchronization over it. An
/// empty identity is allowed and means the node never accepts anything.
pub struct NodeRuntime {
    identity: String,
    config: NodeConfig,
    transport: Arc<dyn Transport>,
    generator: Arc<dyn ContentGenerator>,
    shutdown: CancellationToken,
}

impl NodeRuntime {
    pub fn new(
        identity: impl Into<String>,
        config: NodeConfig,
        transport: Arc<dyn Transport>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            identity: identity.into(),
            config,
            transport,
            generator,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Token that stops the dispatch loop and its worker when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the dispatch loop until the subscription closes or the shutdown
    /// token fires.
    pub async fn run(&self) -> Result<(), NodeError> {
        let mut inbound = self
            .transport
            .subscribe(&self.config.inbound_channel, self.config.queue_depth)
            .await
            .map_err(NodeError::Transport)?;

        info!(
            "Node '{}' subscribed on '{}', publishing on '{}'",
            self.identity, self.config.inbound_channel, self.config.outbound_channel
        );

        let (job_tx, job_rx) = mpsc::channel::<Job>(self.config.worker_queue_depth.max(1));
        let worker = tokio::spawn(generation_worker(
            self.identity.clone(),
            self.config.outbound_channel.clone(),
            self.config.generation_timeout,
            self.transport.clone(),
            self.generator.clone(),
            job_rx,
            self.shutdown.clone(),
        ));

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Node '{}' shutting down", self.identity);
                    break;
                }
                raw = inbound.recv() => {
                    let Some(raw) = raw else {
                        info!("Inbound channel '{}' closed", self.config.inbound_channel);
                        break;
                    };
                    if let Some(job) = self.screen(&raw) {
                        // Awaits queue space when the worker is behind.
                        if job_tx.send(job).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        drop(job_tx);
        let _ = worker.await;
        Ok(())
    }

    /// Decode and filter one raw delivery.
    ///
    /// Returns a generation job only for accepted envelopes. Undecodable and
    /// rejected traffic is invisible apart from a debug log; a content-field
    /// lookup failure is a sender contract violation and logs at error level.
    /// Nothing here ever stops the node.
    fn screen(&self, raw: &str) -> Option<Job> {
        let mut value = match envelope::decode(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!("Dropping undecodable payload: {}", e);
                return None;
            }
        };

        match filter(&self.identity, &mut value) {
            Ok(Accepted { sender, requested }) => {
                info!("Received envelope: {}", value);
                Some(Job { sender, requested })
            }
            Err(FilterError::Rejected(reason)) => {
                debug!("Dropping envelope: {}", reason);
                None
            }
            Err(e @ FilterError::ContentFieldMissing { .. }) => {
                error!("Dropping envelope: {}", e);
                None
            }
        }
    }
}

/// Drains the job queue: generate, build, publish.
///
/// Generator failures and timeouts drop the message being handled and keep
/// the loop alive. Publishes are serialized here, so the transport is never
/// asked to publish concurrently on behalf of one node.
async fn generation_worker(
    identity: String,
    outbound_channel: String,
    generation_timeout: Option<Duration>,
    transport: Arc<dyn Transport>,
    generator: Arc<dyn ContentGenerator>,
    mut jobs: mpsc::Receiver<Job>,
    shutdown: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            _ = shutdown.cancelled() => break,
            job = jobs.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let generating = generator.generate(&job.sender, &job.requested);
        let generated = match generation_timeout {
            Some(limit) => match timeout(limit, generating).await {
                Ok(generated) => generated,
                Err(_) => {
                    error!("{}", NodeError::GenerationTimeout(limit));
                    continue;
                }
            },
            None => generating.await,
        };

        let generation = match generated {
            Ok(generation) => generation,
            Err(e) => {
                error!("Content generation failed: {:#}", e);
                continue;
            }
        };

        if generation.addressees.is_empty() {
            debug!("Generator produced no addressees, nothing to publish");
            continue;
        }

        let outgoing = Envelope::build(&identity, generation.addressees, generation.contents);
        let payload = match outgoing.encode() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode outgoing envelope: {}", e);
                continue;
            }
        };

        match transport.publish(&outbound_channel, &payload).await {
            Ok(()) => info!("Published envelope: {}", payload),
            Err(e) => error!("{}", NodeError::Transport(e)),
        }
    }
}
