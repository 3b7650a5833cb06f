//! YAML configuration
//!
//! Two small files, loaded explicitly and passed into the pipeline at
//! construction time; nothing here is process-global. `paths.yaml` locates
//! the corpus and the persisted index, `llm.yaml` names the models for each
//! role. Credentials never live in YAML; they come from the environment when
//! the backend factories run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Directory layout: where the corpus lives and where the index persists.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub docs_to_index_path: String,
    pub persisted_index_path: String,
}

/// Top level of `llm.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub rag: RagModels,
}

/// Model configuration per pipeline role.
#[derive(Debug, Clone, Deserialize)]
pub struct RagModels {
    pub embedding_llm: ModelConfig,
    pub answer_question_llm: ModelConfig,
}

/// One model plus its optional Azure deployment coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,
    #[serde(default)]
    pub azure_api_version: Option<String>,
    #[serde(default)]
    pub azure_deployment_name: Option<String>,
    #[serde(default)]
    pub azure_endpoint: Option<String>,
}

/// Whether backend factories should target Azure OpenAI deployments.
///
/// Driven by `USE_AZURE_OPENAI`; anything but a case-insensitive "true"
/// means the direct API.
#[must_use]
pub fn using_azure() -> bool {
    std::env::var("USE_AZURE_OPENAI")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Load and parse a YAML config file.
pub fn load_yaml<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    serde_yaml::from_str(&raw)
        .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
}

/// Make a possibly-relative path absolute against `base_dir`.
#[must_use]
pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(path_str);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
