//! JSON module configuration
//!
//! One config file describes every module of a deployment under a top-level
//! `modules` map; each node process picks its own entry by name:
//!
//! ```json
//! {
//!   "modules": {
//!     "dialogue": {
//!       "identity": "dialogue",
//!       "inbound": "dialogue/input",
//!       "outbound": "dialogue/output",
//!       "generator": "intent",
//!       "nlu": {"project_id": "demo", "credentials_file": "keys/demo.json"}
//!     }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use courier_core::NodeConfig;
use courier_nlu::IntentClientConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    pub modules: HashMap<String, ModuleConfig>,
}

impl CourierConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn module(&self, name: &str) -> Result<&ModuleConfig> {
        self.modules
            .get(name)
            .with_context(|| format!("module '{}' not found in config", name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Identity checked against inbound `target` lists and stamped on
    /// outgoing envelopes.
    pub identity: String,
    pub inbound: String,
    pub outbound: String,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    #[serde(default = "default_queue_depth")]
    pub worker_queue_depth: usize,
    /// `null` disables the generation bound.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: Option<u64>,
    #[serde(default)]
    pub generator: GeneratorKind,
    #[serde(default)]
    pub nlu: Option<NluConfig>,
}

fn default_queue_depth() -> usize {
    10
}

fn default_generation_timeout_secs() -> Option<u64> {
    Some(30)
}

impl ModuleConfig {
    pub fn node_config(&self) -> NodeConfig {
        let mut config = NodeConfig::new(&self.inbound, &self.outbound);
        config.queue_depth = self.queue_depth;
        config.worker_queue_depth = self.worker_queue_depth;
        config.generation_timeout = self.generation_timeout_secs.map(Duration::from_secs);
        config
    }
}

/// Which demo specialization the module runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Echo,
    Intent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluConfig {
    pub project_id: String,
    pub credentials_file: PathBuf,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    /// Content field whose `text` value is handed to the intent service.
    #[serde(default = "default_text_field")]
    pub text_field: String,
}

fn default_language_code() -> String {
    "ko".to_string()
}

fn default_text_field() -> String {
    "dialog".to_string()
}

impl NluConfig {
    pub fn client_config(&self) -> IntentClientConfig {
        let mut config = IntentClientConfig::new(&self.project_id, &self.credentials_file);
        config.session_id = self.session_id.clone();
        config.language_code = self.language_code.clone();
        config
    }
}
