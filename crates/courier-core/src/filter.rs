//! Addressing filter
//!
//! Decides whether a node accepts an inbound envelope and extracts the
//! content fields its header requests. Checks run in a fixed order and
//! short-circuit on the first failure; every failure is a value, never a
//! panic, so malformed traffic can only ever cost the one message.

use serde_json::{Map, Value};

use crate::error::{FilterError, Rejection};

/// Successful filter outcome: the sender identity and the content fields
/// named by the envelope header.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    /// `header.source`; empty when the sender omitted it.
    pub sender: String,
    /// Content name → value, in header order.
    pub requested: Map<String, Value>,
}

/// Apply the addressing checks for a node with the given identity.
///
/// A single-string `target` is normalized to the canonical one-element list
/// and written back into the header, so downstream consumers of the value
/// always see the list form. A node with an empty identity never accepts
/// anything.
pub fn filter(identity: &str, envelope: &mut Value) -> Result<Accepted, FilterError> {
    let Some(object) = envelope.as_object_mut() else {
        return Err(Rejection::NotAnObject.into());
    };

    let Some(Value::Object(header)) = object.get_mut("header") else {
        return Err(Rejection::MissingHeader.into());
    };
    if !header.contains_key("target") {
        return Err(Rejection::MissingHeader.into());
    }

    // Normalize a single-string target to the canonical list form, in place.
    let single_target = match header.get("target") {
        Some(Value::String(single)) if single.is_empty() => {
            return Err(Rejection::NoTarget.into());
        }
        Some(Value::String(single)) => Some(single.clone()),
        _ => None,
    };
    if let Some(single) = single_target {
        header.insert(
            "target".to_string(),
            Value::Array(vec![Value::String(single)]),
        );
    }

    let addressed = match header.get("target") {
        Some(Value::Array(targets)) if !targets.is_empty() => targets
            .iter()
            .filter_map(Value::as_str)
            .any(|target| target == identity),
        _ => return Err(Rejection::NoTarget.into()),
    };
    if identity.is_empty() || !addressed {
        return Err(Rejection::NotAddressed.into());
    }

    let sender = header
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let content_names = match header.get("content") {
        Some(Value::String(name)) if !name.is_empty() => vec![name.clone()],
        Some(Value::Array(names)) if !names.is_empty() => {
            let mut out = Vec::with_capacity(names.len());
            for name in names {
                match name.as_str() {
                    Some(name) => out.push(name.to_string()),
                    None => return Err(Rejection::InvalidContentNames.into()),
                }
            }
            out
        }
        _ => return Err(Rejection::InvalidContentNames.into()),
    };

    let mut requested = Map::new();
    for name in content_names {
        match object.get(&name) {
            Some(value) => {
                requested.insert(name, value.clone());
            }
            None => return Err(FilterError::ContentFieldMissing { name }),
        }
    }

    Ok(Accepted { sender, requested })
}
