//! Intent-detection REST client

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_ENDPOINT: &str = "https://dialogflow.googleapis.com/v2";
const DEFAULT_LANGUAGE_CODE: &str = "ko";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures surfaced by the intent client.
#[derive(Debug, Error)]
pub enum NluError {
    /// Credential file unreadable/invalid, or the service refused the token.
    #[error("credential error: {0}")]
    Auth(String),
    /// Network-level failure reaching the service.
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("intent service returned {status}: {message}")]
    Service { status: u16, message: String },
    /// The service answered 2xx with a body the client cannot decode.
    #[error("undecodable intent response: {0}")]
    Decode(String),
}

/// Construction-time configuration for [`IntentClient`].
#[derive(Debug, Clone)]
pub struct IntentClientConfig {
    /// Project the agent lives under.
    pub project_id: String,
    /// Key file holding the bearer token; read once at construction.
    pub credentials_file: PathBuf,
    /// Session identifier. `None` generates a fresh random one.
    pub session_id: Option<String>,
    pub language_code: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl IntentClientConfig {
    pub fn new(project_id: impl Into<String>, credentials_file: impl Into<PathBuf>) -> Self {
        Self {
            project_id: project_id.into(),
            credentials_file: credentials_file.into(),
            session_id: None,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Credential key file: JSON carrying the bearer token.
#[derive(Deserialize)]
struct ServiceKey {
    token: String,
}

impl ServiceKey {
    fn load(path: &Path) -> Result<Self, NluError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NluError::Auth(format!("cannot read credential file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            NluError::Auth(format!("invalid credential file {}: {}", path.display(), e))
        })
    }
}

/// Client for a hosted intent-detection service.
///
/// All requests are addressed to one `(project_id, session_id)` session,
/// fixed at construction.
pub struct IntentClient {
    client: reqwest::Client,
    token: String,
    project_id: String,
    session_id: String,
    language_code: String,
    endpoint: String,
}

impl std::fmt::Debug for IntentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentClient")
            .field("token", &mask_secret(&self.token))
            .field("project_id", &self.project_id)
            .field("session_id", &self.session_id)
            .field("language_code", &self.language_code)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl IntentClient {
    pub fn new(config: IntentClientConfig) -> Result<Self, NluError> {
        let key = ServiceKey::load(&config.credentials_file)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(NluError::Transport)?;
        let session_id = config
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            client,
            token: key.token,
            project_id: config.project_id,
            session_id,
            language_code: config.language_code,
            endpoint: config.endpoint,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Service path of the session all requests are addressed to.
    pub fn session_path(&self) -> String {
        format!(
            "projects/{}/agent/sessions/{}",
            self.project_id, self.session_id
        )
    }

    /// Detect the intent of free-form user text.
    pub async fn detect_intent_text(&self, text: &str) -> Result<IntentResponse, NluError> {
        self.detect(QueryInput {
            text: Some(TextInput {
                text: text.to_string(),
                language_code: self.language_code.clone(),
            }),
            event: None,
        })
        .await
    }

    /// Trigger a named intent event.
    pub async fn detect_intent_event(&self, event: &str) -> Result<IntentResponse, NluError> {
        self.detect(QueryInput {
            text: None,
            event: Some(EventInput {
                name: event.to_string(),
                language_code: self.language_code.clone(),
            }),
        })
        .await
    }

    async fn detect(&self, query_input: QueryInput) -> Result<IntentResponse, NluError> {
        let url = format!("{}/{}:detectIntent", self.endpoint, self.session_path());
        debug!("detectIntent request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&DetectIntentRequest { query_input })
            .send()
            .await
            .map_err(NluError::Transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(NluError::Auth(format!("intent service returned {status}")));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NluError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: DetectIntentResponse = response
            .json()
            .await
            .map_err(|e| NluError::Decode(e.to_string()))?;
        Ok(body.query_result)
    }
}

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "(empty)".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > 7 {
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "***".to_string()
    }
}

// ── Wire types ──
// Only the slice of the service schema the envelope layer touches.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentRequest {
    query_input: QueryInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<EventInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextInput {
    text: String,
    language_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventInput {
    name: String,
    language_code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DetectIntentResponse {
    query_result: IntentResponse,
}

/// Result of one detect-intent call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentResponse {
    pub query_text: String,
    pub intent: Intent,
    pub intent_detection_confidence: f64,
    pub fulfillment_text: String,
    pub parameters: Map<String, Value>,
    pub language_code: String,
}

/// Matched intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Intent {
    pub name: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn key_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn client_with(config: impl FnOnce(&mut IntentClientConfig)) -> IntentClient {
        let key = key_file(r#"{"token": "tok-abcdef-12345"}"#);
        let mut cfg = IntentClientConfig::new("demo-project", key.path());
        config(&mut cfg);
        IntentClient::new(cfg).unwrap()
    }

    #[test]
    fn test_missing_credential_file_is_an_auth_error() {
        let cfg = IntentClientConfig::new("demo-project", "/nonexistent/key.json");
        let err = IntentClient::new(cfg).unwrap_err();
        assert!(matches!(err, NluError::Auth(_)));
    }

    #[test]
    fn test_invalid_credential_file_is_an_auth_error() {
        let key = key_file("not json at all");
        let cfg = IntentClientConfig::new("demo-project", key.path());
        let err = IntentClient::new(cfg).unwrap_err();
        assert!(matches!(err, NluError::Auth(_)));
    }

    #[test]
    fn test_session_path_addresses_project_and_session() {
        let client = client_with(|cfg| cfg.session_id = Some("abc123".to_string()));
        assert_eq!(
            client.session_path(),
            "projects/demo-project/agent/sessions/abc123"
        );
    }

    #[test]
    fn test_default_session_id_is_a_fresh_uuid() {
        let client = client_with(|_| {});
        assert!(Uuid::parse_str(client.session_id()).is_ok());
        // Fixed at construction: both accessors agree.
        assert!(client.session_path().ends_with(client.session_id()));
    }

    #[test]
    fn test_language_code_defaults() {
        let client = client_with(|_| {});
        assert_eq!(client.language_code(), "ko");

        let client = client_with(|cfg| cfg.language_code = "en".to_string());
        assert_eq!(client.language_code(), "en");
    }

    #[test]
    fn test_text_request_wire_shape() {
        let request = DetectIntentRequest {
            query_input: QueryInput {
                text: Some(TextInput {
                    text: "안녕하세요".to_string(),
                    language_code: "ko".to_string(),
                }),
                event: None,
            },
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            json!({"queryInput": {"text": {"text": "안녕하세요", "languageCode": "ko"}}})
        );
    }

    #[test]
    fn test_event_request_wire_shape() {
        let request = DetectIntentRequest {
            query_input: QueryInput {
                text: None,
                event: Some(EventInput {
                    name: "WELCOME".to_string(),
                    language_code: "ko".to_string(),
                }),
            },
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            json!({"queryInput": {"event": {"name": "WELCOME", "languageCode": "ko"}}})
        );
    }

    #[test]
    fn test_response_parses_with_missing_fields() {
        let body: DetectIntentResponse = serde_json::from_str(
            r#"{"queryResult": {"fulfillmentText": "hello", "intent": {"displayName": "greet"}}}"#,
        )
        .unwrap();
        assert_eq!(body.query_result.fulfillment_text, "hello");
        assert_eq!(body.query_result.intent.display_name, "greet");
        assert_eq!(body.query_result.intent_detection_confidence, 0.0);
        assert!(body.query_result.parameters.is_empty());
    }

    #[test]
    fn test_debug_masks_the_token() {
        let client = client_with(|_| {});
        let debugged = format!("{:?}", client);
        assert!(!debugged.contains("tok-abcdef-12345"));
        assert!(debugged.contains("tok...2345"));
    }
}
