use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One canned response attached to a catalog entry. `entry` describes the
/// parameter shape; any sibling fields are kept and returned verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub entry: serde_json::Map<String, serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub api_url: String,
    pub success_response: CatalogResponse,
    pub error_response: CatalogResponse,
    /// Descriptive fields such as `method` or `description`. They take no
    /// part in matching but are shown to the model with the rest of the entry.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub type Catalog = Vec<CatalogEntry>;

pub fn parse_catalog(raw: &str) -> Result<Catalog, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Reads the catalog from disk. Entry order is preserved.
pub async fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    parse_catalog(&raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// An input URL split into its base and decoded query parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedRequest {
    pub base_url: String,
    pub params: BTreeMap<String, String>,
}

impl ParsedRequest {
    /// Never fails. The base URL is the raw text before the first `?` or `#`,
    /// with no case or slash normalization. Repeated parameters keep their
    /// first value and blank values are kept as `""`.
    pub fn parse(input_url: &str) -> Self {
        let (without_fragment, _) = input_url.split_once('#').unwrap_or((input_url, ""));
        let (base_url, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let mut params = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        Self {
            base_url: base_url.to_string(),
            params,
        }
    }
}
