use crate::error::{ConfigError, ProviderError};

#[async_trait::async_trait]
pub trait Prompt: Send + Sync {
    /// Which vendor/model this client talks to. Test doubles return `None`.
    fn api(&self) -> Option<API>;

    /// Sends a single user prompt and returns the model's text, trimmed.
    /// Makes no assumptions about conversation state.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "provider", content = "model")]
pub enum API {
    #[serde(rename = "gemini")]
    Gemini(GeminiModel),
    #[serde(rename = "anthropic")]
    Anthropic(AnthropicModel),
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum GeminiModel {
    #[serde(rename = "gemini-1.5-flash")]
    Gemini15Flash,
    #[serde(rename = "gemini-1.5-pro")]
    Gemini15Pro,
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,
    #[serde(rename = "gemini-2.0-flash-lite")]
    Gemini20FlashLite,
}

/// Claude models addressed by their Bedrock model ids.
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AnthropicModel {
    #[serde(rename = "anthropic.claude-3-5-sonnet-20240620-v1:0")]
    Claude35SonnetOld,
    #[serde(rename = "anthropic.claude-3-5-sonnet-20241022-v2:0")]
    Claude35SonnetNew,
    #[serde(rename = "anthropic.claude-3-5-haiku-20241022-v1:0")]
    Claude35Haiku,
    #[serde(rename = "anthropic.claude-3-haiku-20240307-v1:0")]
    Claude3Haiku,
}

impl GeminiModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeminiModel::Gemini15Flash => "gemini-1.5-flash",
            GeminiModel::Gemini15Pro => "gemini-1.5-pro",
            GeminiModel::Gemini20Flash => "gemini-2.0-flash",
            GeminiModel::Gemini20FlashLite => "gemini-2.0-flash-lite",
        }
    }

    fn from_model_name(model: &str) -> Option<Self> {
        match model {
            "gemini-1.5-flash" => Some(GeminiModel::Gemini15Flash),
            "gemini-1.5-pro" => Some(GeminiModel::Gemini15Pro),
            "gemini-2.0-flash" => Some(GeminiModel::Gemini20Flash),
            "gemini-2.0-flash-lite" => Some(GeminiModel::Gemini20FlashLite),
            _ => None,
        }
    }
}

impl AnthropicModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnthropicModel::Claude35SonnetOld => "anthropic.claude-3-5-sonnet-20240620-v1:0",
            AnthropicModel::Claude35SonnetNew => "anthropic.claude-3-5-sonnet-20241022-v2:0",
            AnthropicModel::Claude35Haiku => "anthropic.claude-3-5-haiku-20241022-v1:0",
            AnthropicModel::Claude3Haiku => "anthropic.claude-3-haiku-20240307-v1:0",
        }
    }

    fn from_model_name(model: &str) -> Option<Self> {
        match model {
            "anthropic.claude-3-5-sonnet-20240620-v1:0" => Some(AnthropicModel::Claude35SonnetOld),
            "anthropic.claude-3-5-sonnet-20241022-v2:0" => Some(AnthropicModel::Claude35SonnetNew),
            "anthropic.claude-3-5-haiku-20241022-v1:0" => Some(AnthropicModel::Claude35Haiku),
            "anthropic.claude-3-haiku-20240307-v1:0" => Some(AnthropicModel::Claude3Haiku),
            _ => None,
        }
    }
}

impl Default for API {
    fn default() -> Self {
        API::Gemini(GeminiModel::Gemini15Flash)
    }
}

impl API {
    /// The model a provider uses when none is requested explicitly.
    pub fn default_for(provider: &str) -> Result<Self, ConfigError> {
        match provider {
            "gemini" => Ok(API::Gemini(GeminiModel::Gemini15Flash)),
            "anthropic" => Ok(API::Anthropic(AnthropicModel::Claude35SonnetOld)),
            _ => Err(ConfigError::UnknownProvider(provider.to_string())),
        }
    }

    pub fn from_strings(provider: &str, model: &str) -> Result<Self, ConfigError> {
        let unknown_model = || ConfigError::UnknownModel {
            provider: provider.to_string(),
            model: model.to_string(),
        };

        match provider {
            "gemini" => GeminiModel::from_model_name(model)
                .map(API::Gemini)
                .ok_or_else(unknown_model),
            "anthropic" => AnthropicModel::from_model_name(model)
                .map(API::Anthropic)
                .ok_or_else(unknown_model),
            _ => Err(ConfigError::UnknownProvider(provider.to_string())),
        }
    }

    pub fn to_strings(&self) -> (String, String) {
        match self {
            API::Gemini(model) => ("gemini".to_string(), model.as_str().to_string()),
            API::Anthropic(model) => ("anthropic".to_string(), model.as_str().to_string()),
        }
    }
}
