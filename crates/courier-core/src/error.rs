//! Error taxonomy for envelope decoding, filtering, and dispatch

use std::time::Duration;
use thiserror::Error;

/// Failure to decode a raw payload into an envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not well-formed JSON.
    #[error("malformed envelope payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Payload parsed, but the top level is not a JSON object.
    #[error("envelope payload is not a JSON object")]
    NotAnObject,
}

/// Addressing/shape rejection. Rejected envelopes are dropped without a
/// response; the reason is only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The filtered value is not a JSON object.
    #[error("envelope is not a JSON object")]
    NotAnObject,
    /// `header` is missing, not an object, or has no `target` key.
    #[error("header is missing, not an object, or has no target")]
    MissingHeader,
    /// `target` is empty or not a string/list.
    #[error("target is empty")]
    NoTarget,
    /// The node's identity is unset or not among the targets.
    #[error("node is not among the envelope targets")]
    NotAddressed,
    /// `header.content` is missing, empty, or not a string/list of strings.
    #[error("content names are missing or not a string or list of strings")]
    InvalidContentNames,
}

/// Outcome of filtering other than acceptance.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Shape or addressing rejection; the message is dropped silently.
    #[error("envelope rejected: {0}")]
    Rejected(#[from] Rejection),
    /// A name listed in `header.content` has no matching top-level field.
    /// This is a contract violation by the sender and is fatal to this
    /// message only, never to the node.
    #[error("content field '{name}' is listed in the header but missing from the envelope")]
    ContentFieldMissing { name: String },
}

/// Dispatch-loop failures surfaced by the node runtime.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The underlying transport refused a subscribe or publish.
    #[error("transport failure: {0}")]
    Transport(#[source] anyhow::Error),
    /// A generator invocation exceeded the configured bound.
    #[error("content generation timed out after {0:?}")]
    GenerationTimeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display() {
        assert_eq!(
            Rejection::NotAddressed.to_string(),
            "node is not among the envelope targets"
        );
    }

    #[test]
    fn test_content_field_missing_names_the_field() {
        let err = FilterError::ContentFieldMissing {
            name: "greeting".to_string(),
        };
        assert!(err.to_string().contains("'greeting'"));
    }

    #[test]
    fn test_decode_error_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = DecodeError::from(parse_err);
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}
