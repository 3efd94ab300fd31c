#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const USERS_CATALOG: &str = r#"[
  {
    "api_url": "https://api.example.com/users",
    "success_response": { "entry": { "id": "string" } },
    "error_response": { "entry": {} }
  },
  {
    "api_url": "https://api.example.com/orders/recent",
    "success_response": { "entry": { "limit": "int" }, "status": "ok" },
    "error_response": { "entry": { "limit": "-1", "debug": "true" }, "status": "error", "message": "limit must be positive" }
  }
]"#;

pub fn request_body_json(request: &reqwest::Request) -> serde_json::Value {
    let bytes = request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("request body should be JSON bytes");

    serde_json::from_slice(bytes).expect("request body should deserialize")
}

pub fn header<'a>(request: &'a reqwest::Request, name: &str) -> &'a str {
    request
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("{name} header present"))
        .to_str()
        .expect("header is ascii")
}

pub fn write_catalog(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("output.json");
    std::fs::write(&path, contents).expect("catalog written");
    path
}

pub fn generated_error(code: &str) -> String {
    serde_json::json!({
        "error_code": code,
        "error_message": "generated",
        "error_details": { "source": "scripted" }
    })
    .to_string()
}
