use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::{CatalogEntry, CatalogResponse, ParsedRequest};
use crate::config::MatchStrategy;

#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    Success(CatalogResponse),
    KnownError(CatalogResponse),
    ParamMismatch,
    UrlNotFound,
}

impl MatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOutcome::Success(_) => "success",
            MatchOutcome::KnownError(_) => "known_error",
            MatchOutcome::ParamMismatch => "param_mismatch",
            MatchOutcome::UrlNotFound => "url_not_found",
        }
    }
}

fn url_matches(
    input_url: &str,
    request: &ParsedRequest,
    entry: &CatalogEntry,
    strategy: MatchStrategy,
) -> bool {
    match strategy {
        MatchStrategy::ExactUrl => input_url == entry.api_url,
        MatchStrategy::BaseUrl => {
            let api_base_url = ParsedRequest::parse(&entry.api_url).base_url;
            debug!(api_url = %entry.api_url, %api_base_url, "comparing catalog entry");
            request.base_url == api_base_url
        }
    }
}

fn params_equal(
    params: &BTreeMap<String, String>,
    entry: &serde_json::Map<String, serde_json::Value>,
) -> bool {
    params.len() == entry.len()
        && params
            .iter()
            .all(|(key, value)| entry.get(key).and_then(|v| v.as_str()) == Some(value.as_str()))
}

/// Classifies `request` against the catalog. The first entry whose URL
/// matches decides the outcome; later entries are never consulted.
pub fn match_request(
    input_url: &str,
    request: &ParsedRequest,
    catalog: &[CatalogEntry],
    strategy: MatchStrategy,
) -> MatchOutcome {
    let Some(entry) = catalog
        .iter()
        .find(|entry| url_matches(input_url, request, entry, strategy))
    else {
        return MatchOutcome::UrlNotFound;
    };

    debug!(api_url = %entry.api_url, "matching catalog entry found");

    let success_entry = &entry.success_response.entry;
    if request
        .params
        .keys()
        .all(|key| success_entry.contains_key(key))
    {
        MatchOutcome::Success(entry.success_response.clone())
    } else if params_equal(&request.params, &entry.error_response.entry) {
        MatchOutcome::KnownError(entry.error_response.clone())
    } else {
        MatchOutcome::ParamMismatch
    }
}

/// Parses `input_url` and classifies it in one step.
pub fn match_url(input_url: &str, catalog: &[CatalogEntry], strategy: MatchStrategy) -> MatchOutcome {
    match_request(input_url, &ParsedRequest::parse(input_url), catalog, strategy)
}
