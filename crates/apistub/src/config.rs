use std::path::PathBuf;
use std::time::Duration;

use crate::api::API;
use crate::error::ConfigError;
use crate::mock::MockLLMServer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EndpointUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub enum Endpoint {
    Default,
    BaseUrl(EndpointUrl),
}

/// Transport knobs shared by every provider backend.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub endpoint: Endpoint,
    pub disable_proxy: bool,
    /// Upper bound on a single vendor call. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Default,
            disable_proxy: false,
            timeout: None,
        }
    }
}

impl ClientOptions {
    pub fn from_base_url(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        let url = url::Url::parse(base_url.as_ref())?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };

        let host = url.host_str().ok_or(ConfigError::MissingHost)?.to_string();

        let port = url
            .port_or_known_default()
            .ok_or(ConfigError::MissingPort)?;

        Ok(Self {
            endpoint: Endpoint::BaseUrl(EndpointUrl {
                scheme,
                host: host.clone(),
                port,
            }),
            disable_proxy: matches!(host.as_str(), "localhost" | "127.0.0.1"),
            timeout: None,
        })
    }

    pub fn for_mock_server(server: &MockLLMServer) -> Result<Self, ConfigError> {
        let mut options = Self::from_base_url(server.base_url())?;
        options.disable_proxy = true;
        Ok(options)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// How an incoming URL is compared against catalog `api_url`s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Compare scheme, host and path only; parameters are classified afterwards.
    #[default]
    BaseUrl,
    /// Require the raw input URL, query string included, to equal `api_url`.
    ExactUrl,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::BaseUrl => "base-url",
            MatchStrategy::ExactUrl => "exact-url",
        }
    }
}

/// Everything the service needs at startup.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub bind: String,
    pub catalog_path: PathBuf,
    pub api: API,
    pub match_strategy: MatchStrategy,
    pub strict_llm_output: bool,
    pub client_options: ClientOptions,
}
