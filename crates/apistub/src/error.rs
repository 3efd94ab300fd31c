use std::path::PathBuf;

use thiserror::Error;

/// Problems detected while wiring up a provider client.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingCredential(&'static str),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("Unknown {provider} model: {model}")]
    UnknownModel { provider: String, model: String },
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base url missing host")]
    MissingHost,
    #[error("base url missing port")]
    MissingPort,
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Failures talking to a vendor backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("JSON parse error in provider response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field in response: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
