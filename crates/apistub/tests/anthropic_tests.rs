mod common;

use apistub::anthropic::AnthropicClient;
use apistub::api::{AnthropicModel, Prompt};
use apistub::config::ClientOptions;
use apistub::error::ConfigError;
use apistub::mock::{MockLLMServer, MockResponse, MockRoute};
use apistub::sigv4::Credentials;
use chrono::{TimeZone, Utc};
use common::{header, request_body_json};
use temp_env::with_vars;

const INVOKE_PATH: &str = "/model/anthropic.claude-3-5-sonnet-20240620-v1%3A0/invoke";

fn credentials(session_token: Option<&str>) -> Credentials {
    Credentials {
        access_key_id: "AKIDTEST".to_string(),
        secret_access_key: "secret".to_string(),
        session_token: session_token.map(str::to_string),
    }
}

fn client(options: ClientOptions, session_token: Option<&str>) -> AnthropicClient {
    AnthropicClient::with_credentials(
        AnthropicModel::Claude35SonnetOld,
        credentials(session_token),
        "us-west-2",
        options,
    )
    .expect("bedrock client builds")
}

#[test]
fn anthropic_build_request_signs_bedrock_invoke() {
    let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let client = client(ClientOptions::default(), Some("session-token"));

    let request = client
        .build_request_at("Return JSON only.", time)
        .expect("request signs")
        .build()
        .expect("request should be buildable");

    assert_eq!(
        request.url().as_str(),
        format!("https://bedrock-runtime.us-west-2.amazonaws.com{INVOKE_PATH}")
    );
    assert_eq!(header(&request, "content-type"), "application/json");
    assert_eq!(header(&request, "x-amz-date"), "20240102T030405Z");
    assert_eq!(header(&request, "x-amz-security-token"), "session-token");

    let authorization = header(&request, "authorization");
    let prefix = "AWS4-HMAC-SHA256 Credential=AKIDTEST/20240102/us-west-2/bedrock/aws4_request, \
                  SignedHeaders=content-type;host;x-amz-date;x-amz-security-token, Signature=";
    assert!(authorization.starts_with(prefix), "{authorization}");
    let signature = &authorization[prefix.len()..];
    assert_eq!(signature.len(), 64);
    assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

    let body = request_body_json(&request);
    assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
    assert_eq!(body["max_tokens"], 1024);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Return JSON only.");
}

#[test]
fn anthropic_signature_is_deterministic_and_prompt_sensitive() {
    let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let client = client(ClientOptions::default(), None);

    let sign = |prompt: &str| {
        let request = client
            .build_request_at(prompt, time)
            .expect("request signs")
            .build()
            .expect("request builds");
        header(&request, "authorization").to_string()
    };

    assert_eq!(sign("a"), sign("a"));
    assert_ne!(sign("a"), sign("b"));
    assert!(sign("a").contains("SignedHeaders=content-type;host;x-amz-date,"));
}

#[test]
fn anthropic_read_json_response_extracts_text() {
    let response_json = serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": "Response payload"
            }
        ]
    });

    let content = client(ClientOptions::default(), None)
        .read_json_response(&response_json)
        .expect("anthropic response should contain text");

    assert_eq!(content, "Response payload");
}

#[test]
fn anthropic_new_requires_aws_keys() {
    with_vars(
        [
            ("AWS_ACCESS_KEY_ID", None::<&str>),
            ("AWS_SECRET_ACCESS_KEY", Some("secret")),
        ],
        || {
            assert!(matches!(
                AnthropicClient::new(AnthropicModel::Claude35SonnetOld),
                Err(ConfigError::MissingCredential("AWS_ACCESS_KEY_ID"))
            ));
        },
    );

    with_vars(
        [
            ("AWS_ACCESS_KEY_ID", Some("AKIDTEST")),
            ("AWS_SECRET_ACCESS_KEY", None),
        ],
        || {
            assert!(matches!(
                AnthropicClient::new(AnthropicModel::Claude35SonnetOld),
                Err(ConfigError::MissingCredential("AWS_SECRET_ACCESS_KEY"))
            ));
        },
    );
}

#[test]
fn anthropic_new_resolves_region() {
    with_vars(
        [
            ("AWS_ACCESS_KEY_ID", Some("AKIDTEST")),
            ("AWS_SECRET_ACCESS_KEY", Some("secret")),
            ("AWS_SESSION_TOKEN", None),
            ("AWS_REGION_NAME", Some("eu-central-1")),
            ("AWS_REGION", Some("ap-south-1")),
        ],
        || {
            let client =
                AnthropicClient::new(AnthropicModel::Claude3Haiku).expect("client builds");
            assert_eq!(client.region, "eu-central-1");
            assert_eq!(client.host, "bedrock-runtime.eu-central-1.amazonaws.com");
        },
    );

    with_vars(
        [
            ("AWS_ACCESS_KEY_ID", Some("AKIDTEST")),
            ("AWS_SECRET_ACCESS_KEY", Some("secret")),
            ("AWS_REGION_NAME", None),
            ("AWS_REGION", None),
        ],
        || {
            let client =
                AnthropicClient::new(AnthropicModel::Claude3Haiku).expect("client builds");
            assert_eq!(client.region, "us-east-1");
        },
    );
}

#[tokio::test]
async fn anthropic_generate_round_trips_through_mock_server() {
    let server = MockLLMServer::start(vec![MockRoute::single(
        INVOKE_PATH,
        MockResponse::bedrock_text("  {\"error_code\":\"endpoint_not_found\"}\n"),
    )])
    .await
    .expect("mock server starts");

    let options = ClientOptions::for_mock_server(&server).expect("client options for mock server");
    let client = client(options, None);

    let text = client.generate("Ping?").await.expect("generate succeeds");
    assert_eq!(text, "{\"error_code\":\"endpoint_not_found\"}");

    let recorded = server.requests_for(INVOKE_PATH).await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, "POST");
    assert!(recorded[0]
        .header("authorization")
        .is_some_and(|auth| auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDTEST/")));
    assert!(recorded[0].header("x-amz-date").is_some());
    assert!(recorded[0].header("x-amz-security-token").is_none());

    let payload = recorded[0].body_as_json().expect("request body parses as json");
    assert_eq!(payload["messages"][0]["content"], "Ping?");

    server.shutdown().await;
}
