use crate::config::{ClientOptions, Scheme};
use crate::error::{ConfigError, ProviderError};

pub fn origin(scheme: Scheme, host: &str, port: u16) -> String {
    match (scheme, port) {
        (Scheme::Https, 443) => format!("https://{}", host),
        (Scheme::Http, 80) => format!("http://{}", host),
        _ => format!("{}://{}:{}", scheme.as_str(), host, port),
    }
}

pub fn host_header(scheme: Scheme, host: &str, port: u16) -> String {
    match (scheme, port) {
        (Scheme::Https, 443) | (Scheme::Http, 80) => host.to_string(),
        _ => format!("{}:{}", host, port),
    }
}

pub fn http_client(options: &ClientOptions) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder();
    if options.disable_proxy {
        builder = builder.no_proxy();
    }
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(ConfigError::HttpClient)
}

/// Sends a request and decodes the body as JSON, surfacing non-2xx statuses
/// with their body.
pub async fn send_json(
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            code: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_omits_default_ports() {
        assert_eq!(origin(Scheme::Https, "a.example", 443), "https://a.example");
        assert_eq!(origin(Scheme::Http, "a.example", 80), "http://a.example");
        assert_eq!(
            origin(Scheme::Http, "127.0.0.1", 4010),
            "http://127.0.0.1:4010"
        );
    }

    #[test]
    fn host_header_keeps_non_default_port() {
        assert_eq!(host_header(Scheme::Https, "a.example", 443), "a.example");
        assert_eq!(
            host_header(Scheme::Https, "a.example", 8443),
            "a.example:8443"
        );
    }
}
