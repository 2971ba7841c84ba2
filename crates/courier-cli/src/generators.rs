//! Demo node specializations
//!
//! Concrete `ContentGenerator`s the `courier` binary can run: a plain echo
//! for smoke-testing a deployment, and an NLU-backed generator in the shape
//! of a spoken-dialogue module.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value, json};

use courier_core::{ContentGenerator, Generation};
use courier_nlu::IntentClient;

/// Mirrors the requested contents back to the sender under a `reply` field.
pub struct EchoGenerator;

#[async_trait]
impl ContentGenerator for EchoGenerator {
    async fn generate(&self, sender: &str, requested: &Map<String, Value>) -> Result<Generation> {
        if sender.is_empty() {
            // Nobody to reply to.
            return Ok(Generation::default());
        }
        let mut contents = Map::new();
        contents.insert("reply".to_string(), Value::Object(requested.clone()));
        Ok(Generation {
            addressees: vec![sender.to_string()],
            contents,
        })
    }
}

/// Hands the text of one requested content field to the intent service and
/// produces a `dialog_generation` content field from the result.
pub struct IntentGenerator {
    client: IntentClient,
    text_field: String,
}

impl IntentGenerator {
    pub fn new(client: IntentClient, text_field: impl Into<String>) -> Self {
        Self {
            client,
            text_field: text_field.into(),
        }
    }
}

#[async_trait]
impl ContentGenerator for IntentGenerator {
    async fn generate(&self, sender: &str, requested: &Map<String, Value>) -> Result<Generation> {
        if sender.is_empty() {
            return Ok(Generation::default());
        }

        let text = requested
            .get(&self.text_field)
            .and_then(|content| content.get("text"))
            .and_then(Value::as_str)
            .with_context(|| {
                format!(
                    "content field '{}' carries no text to detect",
                    self.text_field
                )
            })?;

        let detected = self.client.detect_intent_text(text).await?;

        let mut contents = Map::new();
        contents.insert(
            "dialog_generation".to_string(),
            json!({
                "intent": detected.intent.display_name,
                "text": detected.fulfillment_text,
                "parameters": detected.parameters,
                "confidence": detected.intent_detection_confidence,
            }),
        );
        Ok(Generation {
            addressees: vec![sender.to_string()],
            contents,
        })
    }
}
