//! courier-core — envelope routing for distributed agent nodes
//!
//! This crate provides:
//! - Wire envelope codec and the outgoing message builder
//! - Addressing filter that decides acceptance and extracts requested content
//! - The `ContentGenerator` trait node specializations implement
//! - `NodeRuntime`, the dispatch loop wiring decode → filter → generate →
//!   build → publish over an injectable `Transport`

pub mod envelope;
pub mod error;
pub mod filter;
pub mod generate;
pub mod node;
pub mod transport;

// Re-export main types for convenience
pub use envelope::{Envelope, Header, decode};
pub use error::{DecodeError, FilterError, NodeError, Rejection};
pub use filter::{Accepted, filter};
pub use generate::{ContentGenerator, Generation};
pub use node::{NodeConfig, NodeRuntime};
pub use transport::Transport;
