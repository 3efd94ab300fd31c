use chrono::{DateTime, Utc};

use crate::api::{AnthropicModel, Prompt, API};
use crate::config::{ClientOptions, Endpoint, Scheme};
use crate::error::{ConfigError, ProviderError};
use crate::network_common::{host_header, http_client, origin, send_json};
use crate::sigv4::{self, CanonicalRequest, Credentials, SigningParams};

pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";
pub const REGION_VAR: &str = "AWS_REGION_NAME";

const DEFAULT_REGION: &str = "us-east-1";
const BEDROCK_VERSION: &str = "bedrock-2023-05-31";

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Claude served through Amazon Bedrock's `InvokeModel` API.
pub struct AnthropicClient {
    pub http_client: reqwest::Client,
    pub model: AnthropicModel,
    pub host: String,
    pub port: u16,
    pub max_tokens: usize,
    pub scheme: Scheme,
    pub region: String,
    credentials: Credentials,
}

impl AnthropicClient {
    /// Reads AWS credentials and region from the environment.
    pub fn new(model: AnthropicModel) -> Result<Self, ConfigError> {
        Self::with_options(model, ClientOptions::default())
    }

    pub fn with_options(
        model: AnthropicModel,
        options: ClientOptions,
    ) -> Result<Self, ConfigError> {
        let credentials = Credentials {
            access_key_id: non_empty_var(ACCESS_KEY_VAR)
                .ok_or(ConfigError::MissingCredential(ACCESS_KEY_VAR))?,
            secret_access_key: non_empty_var(SECRET_KEY_VAR)
                .ok_or(ConfigError::MissingCredential(SECRET_KEY_VAR))?,
            session_token: non_empty_var(SESSION_TOKEN_VAR),
        };

        let region = non_empty_var(REGION_VAR)
            .or_else(|| non_empty_var("AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self::with_credentials(model, credentials, region, options)
    }

    pub fn with_credentials(
        model: AnthropicModel,
        credentials: Credentials,
        region: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ConfigError> {
        let region = region.into();
        let mut client = Self {
            http_client: http_client(&options)?,
            model,
            host: format!("bedrock-runtime.{}.amazonaws.com", region),
            port: 443,
            max_tokens: 1024,
            scheme: Scheme::Https,
            region,
            credentials,
        };

        if let Endpoint::BaseUrl(endpoint) = options.endpoint {
            client.host = endpoint.host;
            client.port = endpoint.port;
            client.scheme = endpoint.scheme;
        }

        Ok(client)
    }

    /// Request path with the model id percent-encoded (`:` becomes `%3A`).
    pub fn path(&self) -> String {
        format!(
            "/model/{}/invoke",
            sigv4::uri_encode(self.model.as_str(), true)
        )
    }

    pub fn build_request(&self, prompt: &str) -> Result<reqwest::RequestBuilder, ProviderError> {
        self.build_request_at(prompt, Utc::now())
    }

    pub fn build_request_at(
        &self,
        prompt: &str,
        time: DateTime<Utc>,
    ) -> Result<reqwest::RequestBuilder, ProviderError> {
        let body = serde_json::to_vec(&serde_json::json!({
            "anthropic_version": BEDROCK_VERSION,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        }))?;

        let params = SigningParams {
            credentials: &self.credentials,
            region: &self.region,
            service: "bedrock",
            time,
        };
        let amz_date = params.amz_date();

        let mut headers = vec![
            ("content-type".to_string(), "application/json".to_string()),
            (
                "host".to_string(),
                host_header(self.scheme, &self.host, self.port),
            ),
            ("x-amz-date".to_string(), amz_date),
        ];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let path = self.path();
        // Non-S3 services sign the path encoded a second time.
        let canonical_uri = sigv4::uri_encode(&path, false);
        let canonical = CanonicalRequest {
            method: "POST",
            uri: &canonical_uri,
            query: "",
            headers,
            payload: &body,
        };
        let authorization = sigv4::authorization(&canonical, &params);

        let url = format!("{}{}", origin(self.scheme, &self.host, self.port), path);
        let mut request = self
            .http_client
            .post(url)
            .header("accept", "application/json")
            .header("authorization", authorization);

        // `host` is filled in by the transport from the URL.
        for (name, value) in canonical.headers.iter().filter(|(n, _)| n != "host") {
            request = request.header(name.as_str(), value.as_str());
        }

        Ok(request.body(body))
    }

    pub fn read_json_response(
        &self,
        response_json: &serde_json::Value,
    ) -> Result<String, ProviderError> {
        response_json
            .get("content")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("text"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or(ProviderError::MissingField("content[0].text"))
    }
}

#[async_trait::async_trait]
impl Prompt for AnthropicClient {
    fn api(&self) -> Option<API> {
        Some(API::Anthropic(self.model.clone()))
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let response_json = send_json(self.build_request(prompt)?).await?;
        let content = self.read_json_response(&response_json)?;

        Ok(content.trim().to_string())
    }
}
