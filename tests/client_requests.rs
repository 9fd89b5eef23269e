//! Raw client requests: auth header, JSON bodies and error envelopes.

use gooddata::{GoodDataClient, GoodDataError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_put_sends_bearer_token_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/gdc/projects/PROJECT_ID/schedules/SCHEDULE_ID"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({"schedule": {"state": "DISABLED"}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoodDataClient::new("test-token", &server.uri()).unwrap();
    let response = client
        .put(
            "/gdc/projects/PROJECT_ID/schedules/SCHEDULE_ID",
            &serde_json::json!({"schedule": {"state": "DISABLED"}}),
        )
        .await
        .expect("PUT should succeed");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_error_envelope_parameters_are_substituted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gdc/md/PROJECT_ID/obj/1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "message": "Object %s is not accessible in %s",
                "parameters": ["1", "PROJECT_ID"],
                "requestId": "REQ_ID"
            }
        })))
        .mount(&server)
        .await;

    let client = GoodDataClient::new("test-token", &server.uri()).unwrap();
    let err = client.get("/gdc/md/PROJECT_ID/obj/1").await.unwrap_err();

    match err {
        GoodDataError::ApiError {
            message,
            status_code,
            request_id,
        } => {
            assert_eq!(message, "Object 1 is not accessible in PROJECT_ID");
            assert_eq!(status_code, Some(400));
            assert_eq!(request_id.as_deref(), Some("REQ_ID"));
        }
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gdc/projects"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let client = GoodDataClient::new("test-token", &server.uri()).unwrap();
    let err = client.get("/gdc/projects").await.unwrap_err();

    assert!(matches!(
        err,
        GoodDataError::RateLimited {
            retry_after_secs: Some(30)
        }
    ));
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/gdc/projects/PROJECT_ID"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let client = GoodDataClient::new("test-token", &server.uri()).unwrap();
    let err = client.delete("/gdc/projects/PROJECT_ID").await.unwrap_err();

    assert!(err.is_server_error());
    assert!(err.to_string().contains("Service Unavailable"), "unexpected error: {err}");
}
