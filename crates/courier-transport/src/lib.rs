//! In-process publish/subscribe transport
//!
//! A topic bus implementing the `courier_core::Transport` boundary for
//! same-process wiring and tests. Production deployments substitute a real
//! broker behind the same trait.

pub mod local;

pub use local::LocalTransport;
