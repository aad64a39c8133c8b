//! Integration tests for `ScrapeClient::submit` against a wiremock backend.
//!
//! Each test stands up its own `MockServer`; no real network traffic is made.

use revscrape_client::{FailureKind, JobError, ScrapeClient, GENERIC_FAILURE_MESSAGE};
use revscrape_core::{EndpointStyle, Filters, JobRequest, Platform, Target};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn test_client(base_url: &str) -> ScrapeClient {
    ScrapeClient::with_base_url(base_url, 10, 5).expect("client construction should not fail")
}

fn trustpilot_request() -> JobRequest {
    JobRequest::new(
        Platform::Trustpilot,
        Target::CompanyUrl("https://www.trustpilot.com/review/example.com".to_string()),
    )
    .with_filters(Filters::parse(Some("shipping, refund"), Some("1,2")).unwrap())
}

fn starbucks_request() -> JobRequest {
    JobRequest::new(
        Platform::Google,
        Target::Business {
            name: "Starbucks Berlin".to_string(),
            address: None,
        },
    )
}

fn body_text(request: &Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}

async fn received(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
}

#[tokio::test]
async fn missing_identifier_fails_without_network_call() {
    let server = MockServer::start().await;
    let client = test_client(&server.uri());

    let blank_requests = [
        JobRequest::new(Platform::Trustpilot, Target::CompanyUrl(String::new())),
        JobRequest::new(
            Platform::Google,
            Target::Business {
                name: "  ".to_string(),
                address: Some("Berlin".to_string()),
            },
        ),
        JobRequest::new(Platform::Google, Target::PlaceId(String::new())),
        JobRequest::new(Platform::Google, Target::MapsUrl(String::new())),
    ];

    for request in &blank_requests {
        let err = client.submit(request).await.unwrap_err();
        assert!(matches!(err, JobError::Validation(_)), "got: {err:?}");
        assert_eq!(err.kind(), FailureKind::Validation);
    }

    assert!(received(&server).await.is_empty());
}

#[tokio::test]
async fn json_error_is_surfaced_whatever_the_status() {
    for status in [200u16, 400, 404, 500] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trustpilot"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(serde_json::json!({ "error": "X" })),
            )
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .submit(&trustpilot_request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "X", "status {status}");
    }
}

#[tokio::test]
async fn spreadsheet_with_disposition_uses_suggested_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trustpilot"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"PK\x03\x04sheet".to_vec(), XLSX)
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"example_reviews.xlsx\"",
                ),
        )
        .mount(&server)
        .await;

    let artifact = test_client(&server.uri())
        .submit(&trustpilot_request())
        .await
        .expect("should produce an artifact");

    assert_eq!(artifact.filename, "example_reviews.xlsx");
    assert_eq!(artifact.bytes, b"PK\x03\x04sheet");
}

#[tokio::test]
async fn spreadsheet_without_disposition_uses_platform_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/google"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PK".to_vec(), XLSX))
        .mount(&server)
        .await;

    let artifact = test_client(&server.uri())
        .submit(&starbucks_request())
        .await
        .expect("should produce an artifact");

    assert_eq!(artifact.filename, "google_reviews.xlsx");
}

#[tokio::test]
async fn bare_404_resolves_to_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/google"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .submit(&starbucks_request())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::NotFound);
    assert!(err.to_string().starts_with("No matching reviews found"));
}

#[tokio::test]
async fn bare_server_error_is_generic_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_raw(b"unavailable".to_vec(), "text/plain"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .submit(&starbucks_request())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Transport);
    assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn only_populated_fields_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/google"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PK".to_vec(), XLSX))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri())
        .submit(&starbucks_request())
        .await
        .expect("should produce an artifact");

    let requests = received(&server).await;
    let body = body_text(&requests[0]);
    assert!(body.contains("name=\"business_name\""), "body: {body}");
    assert!(body.contains("Starbucks Berlin"));
    for absent in ["address", "keywords", "include_ratings", "platform"] {
        assert!(
            !body.contains(&format!("name=\"{absent}\"")),
            "{absent} should not be sent: {body}"
        );
    }
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn filters_are_sent_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trustpilot"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PK".to_vec(), XLSX))
        .mount(&server)
        .await;

    test_client(&server.uri())
        .submit(&trustpilot_request())
        .await
        .expect("should produce an artifact");

    let body = body_text(&received(&server).await[0]);
    assert!(body.contains("name=\"company_url\""));
    assert!(body.contains("name=\"keywords\""));
    assert!(body.contains("shipping,refund"));
    assert!(body.contains("name=\"include_ratings\""));
}

#[tokio::test]
async fn unified_style_posts_to_process_with_platform_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PK".to_vec(), XLSX))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_endpoint_style(EndpointStyle::Unified);
    client
        .submit(&trustpilot_request())
        .await
        .expect("should produce an artifact");

    let body = body_text(&received(&server).await[0]);
    assert!(body.contains("name=\"platform\""));
    assert!(body.contains("trustpilot"));
}

#[tokio::test]
async fn resubmitting_yields_the_same_classification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trustpilot"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "No reviews found" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let first = client.submit(&trustpilot_request()).await.unwrap_err();
    let second = client.submit(&trustpilot_request()).await.unwrap_err();
    assert_eq!(first.kind(), second.kind());
    assert_eq!(first.to_string(), second.to_string());
}

#[tokio::test]
async fn slow_backend_times_out_as_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"PK".to_vec(), XLSX)
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client =
        ScrapeClient::with_base_url(&server.uri(), 1, 1).expect("client construction should not fail");
    let err = client.submit(&starbucks_request()).await.unwrap_err();

    assert!(matches!(err, JobError::Transport(_)), "got: {err:?}");
    assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn unreachable_backend_is_transport_failure() {
    // Reserve a free port, then release it so nothing is listening there.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let err = test_client(&uri)
        .submit(&starbucks_request())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Transport);
    assert_ne!(err.to_string(), revscrape_client::NO_RESULTS_MESSAGE);
}
