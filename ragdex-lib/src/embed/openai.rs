use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::embed::{Embedder, Embedding};
use crate::llm::require_env;
use crate::{Error, Result};

const OPENAI_EMBED_URL: &str = "https://api.openai.com/v1/embeddings";

/// Hosted embedder over the OpenAI embeddings API, direct or Azure-deployed.
///
/// Dimension is learned lazily from the first response, since it depends on
/// the configured model.
pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    model: String,
    api_key: String,
    azure: Option<AzureDeployment>,
    dimension: usize,
}

struct AzureDeployment {
    endpoint: String,
    deployment: String,
    api_version: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Embedder against api.openai.com.
    pub fn direct(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            model: model.into(),
            api_key: api_key.into(),
            azure: None,
            dimension: 0,
        }
    }

    /// Embedder against an Azure OpenAI deployment.
    pub fn azure(
        model: impl Into<String>,
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            model: model.into(),
            api_key: api_key.into(),
            azure: Some(AzureDeployment {
                endpoint: endpoint.into(),
                deployment: deployment.into(),
                api_version: api_version.into(),
            }),
            dimension: 0,
        }
    }

    /// Factory selecting the provider variant from config and environment,
    /// mirroring [`crate::llm::OpenAiChat::from_config`].
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        if crate::config::using_azure() {
            let key = require_env("AZURE_OPENAI_API_KEY")?;
            Ok(Self::azure(
                &config.model_name,
                config.azure_endpoint.clone().unwrap_or_default(),
                config.azure_deployment_name.clone().unwrap_or_default(),
                config.azure_api_version.clone().unwrap_or_default(),
                key,
            ))
        } else {
            let key = require_env("OPENAI_API_KEY")?;
            Ok(Self::direct(&config.model_name, key))
        }
    }

    fn request(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let body = EmbedRequest { model: &self.model, input: texts.to_vec() };

        let request = match &self.azure {
            None => self.client.post(OPENAI_EMBED_URL).bearer_auth(&self.api_key),
            Some(a) => self
                .client
                .post(format!(
                    "{}/openai/deployments/{}/embeddings",
                    a.endpoint.trim_end_matches('/'),
                    a.deployment
                ))
                .query(&[("api-version", a.api_version.as_str())])
                .header("api-key", &self.api_key),
        };

        let response = request
            .json(&body)
            .send()
            .map_err(|e| Error::Backend(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::Backend(format!("embedding returned {status}: {detail}")));
        }

        let parsed: EmbedResponse = response
            .json()
            .map_err(|e| Error::Backend(format!("malformed embedding response: {e}")))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let embeddings = self.request(texts)?;
        if let Some(first) = embeddings.first() {
            self.dimension = first.len();
        }
        Ok(embeddings)
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        self.request(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Backend("embedding returned no vectors".to_string()))
    }
}
