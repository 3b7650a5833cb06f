use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::llm::{require_env, LanguageModel};
use crate::{Error, Result};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Which hosted variant of the OpenAI chat API to talk to.
#[derive(Debug, Clone)]
enum Provider {
    /// api.openai.com with a bearer token
    Direct,
    /// An Azure OpenAI deployment: endpoint + deployment name + api-version
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

/// Chat-completion backend over the OpenAI HTTP API (direct or Azure-hosted).
///
/// Calls are synchronous and unretried; an auth or availability failure is
/// returned to the caller as [`Error::Backend`] with the response status and
/// body.
pub struct OpenAiChat {
    client: reqwest::blocking::Client,
    provider: Provider,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiChat {
    /// Backend against api.openai.com.
    pub fn direct(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            provider: Provider::Direct,
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Backend against an Azure OpenAI deployment.
    pub fn azure(
        model: impl Into<String>,
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            provider: Provider::Azure {
                endpoint: endpoint.into(),
                deployment: deployment.into(),
                api_version: api_version.into(),
            },
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Factory selecting the provider variant from config and environment.
    ///
    /// `USE_AZURE_OPENAI=true` picks the Azure deployment named in `config`
    /// with `AZURE_OPENAI_API_KEY`; anything else picks the direct API with
    /// `OPENAI_API_KEY`. The pipeline itself never sees this choice.
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
}

impl LanguageModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let request = match &self.provider {
            Provider::Direct => self
                .client
                .post(OPENAI_CHAT_URL)
                .bearer_auth(&self.api_key),
            Provider::Azure { endpoint, deployment, api_version } => self
                .client
                .post(format!(
                    "{}/openai/deployments/{}/chat/completions",
                    endpoint.trim_end_matches('/'),
                    deployment
                ))
                .query(&[("api-version", api_version.as_str())])
                .header("api-key", &self.api_key),
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "chat completion call");

        let response = request
            .json(&body)
            .send()
            .map_err(|e| Error::Backend(format!("chat completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::Backend(format!(
                "chat completion returned {status}: {detail}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| Error::Backend(format!("malformed chat completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Backend("chat completion returned no choices".to_string()))
    }
}
