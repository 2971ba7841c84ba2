//! courier-nlu — hosted intent-detection client
//!
//! A thin request/response wrapper around a hosted NLU service, consumed by
//! node specializations (never by the routing core). Sessions are addressed
//! by `(project_id, session_id)`; credentials come from a key file read once
//! at client construction. The client implements no retry policy; that
//! decision belongs to the specialization.

pub mod client;

pub use client::{Intent, IntentClient, IntentClientConfig, IntentResponse, NluError};
