mod network_common;

pub mod anthropic;
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fallback;
pub mod gemini;
pub mod matcher;
pub mod mock;
pub mod server;
pub mod sigv4;

use crate::api::{Prompt, API};
use crate::config::ClientOptions;
use crate::error::ConfigError;

/// Create a client for `api` with default transport options.
///
/// # Errors
/// Returns an error when the provider's credentials are missing from the
/// environment.
pub fn new_client(api: API) -> Result<Box<dyn Prompt>, ConfigError> {
    new_client_with_options(api, ClientOptions::default())
}

/// Create a client for `api` with custom transport options.
///
/// # Errors
/// Returns an error when the provider's credentials are missing from the
/// environment or the HTTP client cannot be built.
pub fn new_client_with_options(
    api: API,
    options: ClientOptions,
) -> Result<Box<dyn Prompt>, ConfigError> {
    Ok(match api {
        API::Gemini(model) => Box::new(gemini::GeminiClient::with_options(model, options)?),
        API::Anthropic(model) => {
            Box::new(anthropic::AnthropicClient::with_options(model, options)?)
        }
    })
}

/// Resolve provider/model names, falling back to the provider's default model.
///
/// # Errors
/// Returns an error when the provider or model is unknown.
pub fn resolve_api(provider: &str, model: Option<&str>) -> Result<API, ConfigError> {
    match model {
        Some(model) => API::from_strings(provider, model),
        None => API::default_for(provider),
    }
}
