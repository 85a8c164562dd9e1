use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api;
use crate::providers::openai::OPENAI_HOST;

#[derive(Error, Debug, PartialEq)]
pub enum ProviderConfigError {
    #[error("model must not be empty")]
    EmptyModel,

    #[error("host must be an http(s) URL, got `{0}`")]
    InvalidHost(String),
}

/// Provider configuration, tagged by provider type.
///
/// Each variant carries only the fields that provider needs. Entries are
/// validated when settings are loaded, not when a request is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderConfig {
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
    },
    Anthropic {
        #[serde(default = "default_anthropic_host")]
        host: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default = "default_anthropic_model")]
        model: String,
    },
    Ollama {
        #[serde(default = "default_ollama_host")]
        host: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
}

impl ProviderConfig {
    /// An openai entry with the stock host and model.
    pub fn openai() -> Self {
        ProviderConfig::OpenAi {
            host: default_openai_host(),
            api_key: None,
            model: default_openai_model(),
            temperature: None,
        }
    }

    pub fn anthropic() -> Self {
        ProviderConfig::Anthropic {
            host: default_anthropic_host(),
            api_key: None,
            model: default_anthropic_model(),
        }
    }

    pub fn ollama() -> Self {
        ProviderConfig::Ollama {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }

    pub fn provider_type(&self) -> &'static str {
        match self {
            ProviderConfig::OpenAi { .. } => "openai",
            ProviderConfig::Anthropic { .. } => "anthropic",
            ProviderConfig::Ollama { .. } => "ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAi { model, .. }
            | ProviderConfig::Anthropic { model, .. }
            | ProviderConfig::Ollama { model, .. } => model,
        }
    }

    pub fn temperature(&self) -> Option<f32> {
        match self {
            ProviderConfig::OpenAi { temperature, .. } => *temperature,
            _ => None,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAi { api_key, .. }
            | ProviderConfig::Anthropic { api_key, .. } => api_key.as_deref(),
            ProviderConfig::Ollama { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), ProviderConfigError> {
        let (host, model) = match self {
            ProviderConfig::OpenAi { host, model, .. }
            | ProviderConfig::Anthropic { host, model, .. }
            | ProviderConfig::Ollama { host, model } => (host, model),
        };
        if model.trim().is_empty() {
            return Err(ProviderConfigError::EmptyModel);
        }
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(ProviderConfigError::InvalidHost(host.clone()));
        }
        Ok(())
    }
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_openai_model() -> String {
    api::DEFAULT_MODEL.to_string()
}

fn default_anthropic_host() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}
