//! Synthesizes error payloads with an LLM when the catalog cannot answer.
//!
//! The model is asked for a bare JSON object. Its reply is fence-stripped and
//! parsed; anything that does not survive parsing (or, in strict mode, does
//! not carry the three error keys) is replaced by a fixed degraded object so
//! callers always receive JSON.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::Prompt;
use crate::error::ProviderError;

pub const LLM_GENERATION_FAILED: &str = "llm_generation_failed";
pub const LLM_PROVIDER_UNAVAILABLE: &str = "llm_provider_unavailable";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    ParamMismatch,
    UrlNotFound,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::ParamMismatch => "param_mismatch",
            FallbackReason::UrlNotFound => "url_not_found",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedError {
    pub error_code: String,
    pub error_message: String,
    pub error_details: serde_json::Map<String, serde_json::Value>,
}

impl GeneratedError {
    /// Returned when the model's reply cannot be used.
    pub fn generation_failed(exception: impl Into<String>, raw_response: &str) -> Self {
        let mut error_details = serde_json::Map::new();
        error_details.insert("exception".to_string(), exception.into().into());
        error_details.insert("raw_response".to_string(), raw_response.into());

        Self {
            error_code: LLM_GENERATION_FAILED.to_string(),
            error_message: "Could not generate LLM-based error response.".to_string(),
            error_details,
        }
    }

    /// Returned when the vendor call itself fails.
    pub fn provider_unavailable(err: &ProviderError) -> Self {
        let mut error_details = serde_json::Map::new();
        error_details.insert("exception".to_string(), err.to_string().into());

        Self {
            error_code: LLM_PROVIDER_UNAVAILABLE.to_string(),
            error_message: "The LLM provider could not be reached.".to_string(),
            error_details,
        }
    }

    pub fn into_value(self) -> serde_json::Value {
        serde_json::json!({
            "error_code": self.error_code,
            "error_message": self.error_message,
            "error_details": self.error_details,
        })
    }
}

pub fn build_prompt(
    reason: FallbackReason,
    input_url: &str,
    input_params: &BTreeMap<String, String>,
    catalog_text: &str,
) -> String {
    let params_json = serde_json::to_string(input_params).unwrap_or_else(|_| "{}".to_string());

    match reason {
        FallbackReason::ParamMismatch => format!(
            r#"Only return a valid JSON error object. No explanation, no extra formatting.

The user hit a known API endpoint but passed unmatched parameters:
URL: {input_url}
Params: {params_json}

API spec:
{catalog_text}

Respond with:
{{
"error_code": "invalid_parameters",
"error_message": "The input parameters do not match any known valid patterns.",
"error_details": {{
    "received": {params_json},
    "hint": "Expected keys matching known entries."
}}
}}
"#
        ),
        FallbackReason::UrlNotFound => format!(
            r#"Only return a valid JSON error object. No explanation, no extra formatting.

The user called an unknown API URL:
{input_url}

Known API list:
{catalog_text}

Respond with:
{{
"error_code": "endpoint_not_found",
"error_message": "The requested API endpoint does not exist.",
"error_details": {{
    "suggestion": "Check if the endpoint is misspelled or refer to documentation."
}}
}}
"#
        ),
    }
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^```(?:json)?|```$").expect("fence pattern compiles"))
}

/// Removes a leading ```` ``` ```` (optionally tagged `json`) and a trailing
/// ```` ``` ````. Text without fences comes back trimmed but otherwise intact.
pub fn strip_code_fences(raw: &str) -> String {
    fence_pattern()
        .replace_all(raw.trim(), "")
        .trim()
        .to_string()
}

/// Turns raw model text into the object returned to the caller.
pub fn parse_generated(raw_response: &str, strict: bool) -> serde_json::Value {
    let cleaned = strip_code_fences(raw_response);

    let value: serde_json::Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(err) => {
            error!(error = %err, "JSON decode failed");
            return GeneratedError::generation_failed(err.to_string(), raw_response).into_value();
        }
    };

    if strict {
        if let Err(err) = GeneratedError::deserialize(&value) {
            error!(error = %err, "LLM output is not an error object");
            return GeneratedError::generation_failed(err.to_string(), raw_response).into_value();
        }
    }

    value
}

pub struct FallbackGenerator {
    client: Arc<dyn Prompt>,
    strict: bool,
}

impl FallbackGenerator {
    /// Strict validation of the model's output is on by default.
    pub fn new(client: Arc<dyn Prompt>) -> Self {
        Self {
            client,
            strict: true,
        }
    }

    /// When disabled, any JSON the model returns is passed through as-is.
    pub fn with_strict_output(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Never fails: provider and parsing problems become error objects.
    pub async fn generate_error(
        &self,
        input_url: &str,
        input_params: &BTreeMap<String, String>,
        catalog_text: &str,
        reason: FallbackReason,
    ) -> serde_json::Value {
        let prompt = build_prompt(reason, input_url, input_params, catalog_text);

        let raw_response = match self.client.generate(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                error!(
                    reason = reason.as_str(),
                    api = ?self.client.api(),
                    error = %err,
                    "LLM provider call failed"
                );
                return GeneratedError::provider_unavailable(&err).into_value();
            }
        };

        info!(raw_response = %raw_response, "Raw LLM response");
        parse_generated(&raw_response, self.strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_removes_tagged_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn strip_leaves_plain_json_alone() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn strip_is_idempotent() {
        let once = strip_code_fences("```json\n{\"a\":1}\n```");
        assert_eq!(strip_code_fences(&once), once);
    }

    #[test]
    fn lenient_parse_returns_any_json() {
        assert_eq!(
            parse_generated("```json\n{\"a\":1}\n```", false),
            serde_json::json!({ "a": 1 })
        );
        assert_eq!(
            parse_generated("{\"a\":1}", false),
            serde_json::json!({ "a": 1 })
        );
    }

    #[test]
    fn malformed_output_degrades() {
        let value = parse_generated("not json", false);
        assert_eq!(value["error_code"], LLM_GENERATION_FAILED);
        assert_eq!(
            value["error_message"],
            "Could not generate LLM-based error response."
        );
        assert_eq!(value["error_details"]["raw_response"], "not json");
        assert!(value["error_details"]["exception"]
            .as_str()
            .is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn strict_parse_rejects_objects_without_error_keys() {
        let value = parse_generated("{\"a\":1}", true);
        assert_eq!(value["error_code"], LLM_GENERATION_FAILED);
        assert_eq!(value["error_details"]["raw_response"], "{\"a\":1}");
    }

    #[test]
    fn strict_parse_keeps_extra_keys_of_valid_objects() {
        let raw = r#"{"error_code":"invalid_parameters","error_message":"bad","error_details":{"hint":"x"},"trace":"t"}"#;
        let value = parse_generated(raw, true);
        assert_eq!(value["error_code"], "invalid_parameters");
        assert_eq!(value["trace"], "t");
    }

    #[test]
    fn prompts_carry_reason_specific_codes() {
        let params = BTreeMap::from([("bogus".to_string(), "5".to_string())]);

        let mismatch = build_prompt(
            FallbackReason::ParamMismatch,
            "https://api.example.com/users?bogus=5",
            &params,
            "[catalog]",
        );
        assert!(mismatch.contains("URL: https://api.example.com/users?bogus=5"));
        assert!(mismatch.contains(r#"Params: {"bogus":"5"}"#));
        assert!(mismatch.contains("[catalog]"));
        assert!(mismatch.contains(r#""error_code": "invalid_parameters""#));

        let not_found = build_prompt(
            FallbackReason::UrlNotFound,
            "https://api.example.com/orders",
            &BTreeMap::new(),
            "[catalog]",
        );
        assert!(not_found.contains("https://api.example.com/orders"));
        assert!(not_found.contains("Known API list:\n[catalog]"));
        assert!(not_found.contains(r#""error_code": "endpoint_not_found""#));
        assert!(!not_found.contains("Params:"));
    }

    #[test]
    fn provider_unavailable_captures_error_text() {
        let err = ProviderError::Status {
            code: 503,
            body: "overloaded".to_string(),
        };
        let value = GeneratedError::provider_unavailable(&err).into_value();
        assert_eq!(value["error_code"], LLM_PROVIDER_UNAVAILABLE);
        assert_eq!(
            value["error_details"]["exception"],
            "HTTP status 503: overloaded"
        );
    }
}
