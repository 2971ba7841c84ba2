//! Wire envelope: decode/encode plus the outgoing message builder
//!
//! An envelope is a JSON object carrying a `header` and zero or more named
//! content fields as top-level siblings. Inbound payloads are decoded to a
//! loose [`serde_json::Value`] so the addressing filter can inspect and
//! normalize arbitrary shapes; outgoing envelopes use the typed [`Envelope`]
//! form, which always carries the canonical list representation of `target`
//! and `content`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Envelope metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Opaque correlation token. Optional; not interpreted by routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// RFC 3339 UTC creation time, set by the builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Identity of the node that produced the envelope.
    pub source: String,
    /// Identities the envelope is addressed to.
    pub target: Vec<String>,
    /// Names of the content fields carried as top-level siblings.
    pub content: Vec<String>,
}

/// A routed message: a header plus named content fields.
///
/// Content fields are opaque to the routing layer and serialize as top-level
/// siblings of `header`, with `header.content` listing their names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: Header,
    #[serde(flatten)]
    pub contents: Map<String, Value>,
}

impl Envelope {
    /// Assemble an outgoing envelope from generated contents.
    ///
    /// `header.content` is derived from the content field names, and
    /// `timestamp` is the current wall-clock time in RFC 3339 UTC
    /// (non-decreasing across successive calls unless the clock is
    /// adjusted).
    pub fn build(
        source: impl Into<String>,
        addressees: Vec<String>,
        contents: Map<String, Value>,
    ) -> Self {
        let content_names = contents.keys().cloned().collect();
        Self {
            header: Header {
                id: None,
                timestamp: Some(Utc::now().to_rfc3339()),
                source: source.into(),
                target: addressees,
                content: content_names,
            },
            contents,
        }
    }

    /// Serialize to the wire form.
    ///
    /// Values round-trip exactly; field order is not part of the contract.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Decode a raw payload into a JSON object.
///
/// Fails with [`DecodeError::Malformed`] when the payload is not well-formed
/// JSON and [`DecodeError::NotAnObject`] when the top level is anything other
/// than an object.
pub fn decode(raw: &str) -> Result<Value, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_rejects_malformed_payload() {
        assert!(matches!(decode("{oops"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_non_object_top_level() {
        assert!(matches!(decode("[1, 2, 3]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("\"hello\""), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("42"), Err(DecodeError::NotAnObject)));
    }

    #[test]
    fn test_decode_accepts_object() {
        let value = decode(r#"{"header":{"target":"A"}}"#).unwrap();
        assert!(value.is_object());
    }

    #[test]
    fn test_build_derives_content_names_from_contents() {
        let mut contents = Map::new();
        contents.insert("reply".to_string(), json!({"text": "hello"}));
        let envelope = Envelope::build("A", vec!["B".to_string()], contents);

        assert_eq!(envelope.header.source, "A");
        assert_eq!(envelope.header.target, vec!["B"]);
        assert_eq!(envelope.header.content, vec!["reply"]);
        assert_eq!(envelope.contents["reply"], json!({"text": "hello"}));
        assert!(envelope.header.timestamp.is_some());
        assert!(envelope.header.id.is_none());
    }

    #[test]
    fn test_build_is_stable_apart_from_timestamp() {
        let mut contents = Map::new();
        contents.insert("status".to_string(), json!({"ok": true}));

        let mut first = Envelope::build("A", vec!["B".to_string()], contents.clone());
        let mut second = Envelope::build("A", vec!["B".to_string()], contents);
        first.header.timestamp = None;
        second.header.timestamp = None;
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_flattens_contents_to_top_level() {
        let mut contents = Map::new();
        contents.insert("reply".to_string(), json!({"text": "hi"}));
        let envelope = Envelope::build("A", vec!["B".to_string()], contents);

        let wire: Value = serde_json::from_str(&envelope.encode().unwrap()).unwrap();
        assert_eq!(wire["reply"], json!({"text": "hi"}));
        assert_eq!(wire["header"]["content"], json!(["reply"]));
        assert!(wire.get("contents").is_none());
    }

    #[test]
    fn test_round_trip_preserves_values_exactly() {
        let mut contents = Map::new();
        contents.insert(
            "observation".to_string(),
            json!({
                "objects": [{"label": "cup", "confidence": 0.875}, {"label": "book"}],
                "frame": 1312,
                "note": "측정 완료",
                "empty": null
            }),
        );
        contents.insert("status".to_string(), json!("ok"));
        let envelope = Envelope::build("vision", vec!["planner".to_string()], contents);

        let decoded = decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, serde_json::to_value(&envelope).unwrap());

        let typed: Envelope = serde_json::from_value(decoded).unwrap();
        assert_eq!(typed, envelope);
    }
}
