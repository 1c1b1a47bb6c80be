//! Integration tests for `SummarizerClient` using wiremock HTTP mocks.

use gitpulse_core::RetryPolicy;
use gitpulse_summarizer::{SummarizerClient, SummarizeError, SENTINEL_SUMMARY};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> SummarizerClient {
    // Zero base delay keeps retry tests fast.
    SummarizerClient::new(
        base_url,
        "test-key",
        "test-model",
        "English",
        30,
        RetryPolicy::new(2, 0),
    )
    .expect("client construction should not fail")
}

fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn summarize_returns_trimmed_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("  A concise summary.  ")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let summary = test_client(&server.uri())
        .summarize("acme/widget", "# Widget\n\nDoes things.")
        .await
        .expect("summarization should succeed");

    assert_eq!(summary, "A concise summary.");
}

#[tokio::test]
async fn whitespace_readme_short_circuits_without_remote_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let summary = test_client(&server.uri())
        .summarize("acme/widget", "   \n\t  ")
        .await
        .expect("sentinel path should succeed");

    assert_eq!(summary, SENTINEL_SUMMARY);
}

#[tokio::test]
async fn transient_server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Recovered.")))
        .expect(1)
        .mount(&server)
        .await;

    let summary = test_client(&server.uri())
        .summarize("acme/widget", "# Widget")
        .await
        .expect("should succeed after one retry");

    assert_eq!(summary, "Recovered.");
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .summarize("acme/widget", "# Widget")
        .await
        .expect_err("401 must fail");

    assert!(matches!(
        err,
        SummarizeError::UnexpectedStatus { status: 401 }
    ));
}

#[tokio::test]
async fn empty_choices_yield_empty_completion_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .summarize("acme/widget", "# Widget")
        .await
        .expect_err("empty choices must fail");

    assert!(matches!(err, SummarizeError::EmptyCompletion));
}

#[tokio::test]
async fn malformed_body_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .summarize("acme/widget", "# Widget")
        .await
        .expect_err("malformed body must fail");

    assert!(matches!(err, SummarizeError::Deserialize { .. }));
}
