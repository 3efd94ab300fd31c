use crate::api::{GeminiModel, Prompt, API};
use crate::config::{ClientOptions, Endpoint, Scheme};
use crate::error::{ConfigError, ProviderError};
use crate::network_common::{http_client, origin, send_json};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

pub struct GeminiClient {
    pub http_client: reqwest::Client,
    pub model: GeminiModel,
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
    api_key: String,
}

impl GeminiClient {
    /// Reads `GEMINI_API_KEY` from the environment.
    pub fn new(model: GeminiModel) -> Result<Self, ConfigError> {
        Self::with_options(model, ClientOptions::default())
    }

    pub fn with_options(model: GeminiModel, options: ClientOptions) -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;

        Self::with_api_key(model, api_key, options)
    }

    pub fn with_api_key(
        model: GeminiModel,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ConfigError> {
        let mut client = Self {
            http_client: http_client(&options)?,
            model,
            host: "generativelanguage.googleapis.com".to_string(),
            port: 443,
            scheme: Scheme::Https,
            api_key: api_key.into(),
        };

        if let Endpoint::BaseUrl(endpoint) = options.endpoint {
            client.host = endpoint.host;
            client.port = endpoint.port;
            client.scheme = endpoint.scheme;
        }

        Ok(client)
    }

    pub fn path(&self) -> String {
        format!("/v1beta/models/{}:generateContent", self.model.as_str())
    }

    pub fn build_request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{
                    "text": prompt
                }]
            }]
        });

        let url = format!(
            "{}{}",
            origin(self.scheme, &self.host, self.port),
            self.path()
        );

        self.http_client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
    }

    /// Joins the text parts of the first candidate.
    pub fn read_json_response(
        &self,
        response_json: &serde_json::Value,
    ) -> Result<String, ProviderError> {
        let parts = response_json
            .get("candidates")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.get("parts"))
            .and_then(|v| v.as_array())
            .ok_or(ProviderError::MissingField("candidates[0].content.parts"))?;

        let texts: Vec<&str> = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();

        if texts.is_empty() {
            return Err(ProviderError::MissingField(
                "candidates[0].content.parts[*].text",
            ));
        }

        Ok(texts.concat())
    }
}

#[async_trait::async_trait]
impl Prompt for GeminiClient {
    fn api(&self) -> Option<API> {
        Some(API::Gemini(self.model.clone()))
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let response_json = send_json(self.build_request(prompt)).await?;
        let content = self.read_json_response(&response_json)?;

        Ok(content.trim().to_string())
    }
}
