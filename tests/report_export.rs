//! Report export flow: execute, request export, poll the result.

use std::time::Duration;

use gooddata::{
    export_report, GoodDataClient, GoodDataError, PollSettings, ReportExportFormat, ReportRequest,
    EXECUTOR_URI, EXPORTING_URI,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPORT_URI: &str = "/gdc/md/PROJECT_ID/obj/42";
const RESULT_URI: &str = "/gdc/exporter/result/PROJECT_ID/RESULT_ID";

fn test_client(server: &MockServer) -> GoodDataClient {
    GoodDataClient::new("test-token", &server.uri())
        .unwrap()
        .with_poll_settings(PollSettings::fixed(Duration::from_millis(5)))
}

fn execution_result() -> serde_json::Value {
    serde_json::json!({
        "execResult": {
            "reportView": {"reportName": "Sales"},
            "dataResult": "/gdc/internal/projects/PROJECT_ID/experimental/executions/1"
        }
    })
}

async fn mount_execution_and_export(server: &MockServer, request_key: &str) {
    Mock::given(method("POST"))
        .and(path(EXECUTOR_URI))
        .and(body_partial_json(serde_json::json!({
            "report_req": {request_key: REPORT_URI}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(execution_result()))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(EXPORTING_URI))
        .and(body_partial_json(serde_json::json!({
            "result_req": {"format": "csv", "result": execution_result()}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"uri": RESULT_URI})))
        .expect(1)
        .mount(server)
        .await;
}

async fn result_polls(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == RESULT_URI)
        .count()
}

#[tokio::test]
async fn test_export_report_as_csv() {
    let server = MockServer::start().await;
    mount_execution_and_export(&server, "report").await;

    Mock::given(method("GET"))
        .and(path(RESULT_URI))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESULT_URI))
        .respond_with(ResponseTemplate::new(200).set_body_string("region,amount\nEMEA,10\n"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let export = export_report(&client, &ReportRequest::report(REPORT_URI), ReportExportFormat::Csv)
        .await
        .expect("Failed to start export")
        .into_result()
        .await
        .expect("Failed to export report");

    assert_eq!(export.format, ReportExportFormat::Csv);
    assert_eq!(export.as_bytes(), b"region,amount\nEMEA,10\n");
    assert_eq!(result_polls(&server).await, 3);
}

#[tokio::test]
async fn test_export_report_definition() {
    let server = MockServer::start().await;
    mount_execution_and_export(&server, "reportDefinition").await;

    Mock::given(method("GET"))
        .and(path(RESULT_URI))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let pending = export_report(
        &client,
        &ReportRequest::definition(REPORT_URI),
        ReportExportFormat::Csv,
    )
    .await
    .unwrap();

    assert_eq!(pending.get().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_export_empty_report() {
    let server = MockServer::start().await;
    mount_execution_and_export(&server, "report").await;

    Mock::given(method("GET"))
        .and(path(RESULT_URI))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESULT_URI))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let pending = export_report(&client, &ReportRequest::report(REPORT_URI), ReportExportFormat::Csv)
        .await
        .unwrap();

    let err = pending.get().await.unwrap_err();
    assert_eq!(err.to_string(), "Report contains no data");
    assert_eq!(result_polls(&server).await, 2);

    let again = pending.get().await.unwrap_err();
    assert_eq!(again.to_string(), "Report contains no data");
    assert_eq!(result_polls(&server).await, 2);
}

#[tokio::test]
async fn test_export_fails_when_execution_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EXECUTOR_URI))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(EXPORTING_URI))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = export_report(&client, &ReportRequest::report(REPORT_URI), ReportExportFormat::Pdf)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unable to execute report");
    assert!(err.root_cause().is_server_error());
}

#[tokio::test]
async fn test_export_poll_error_is_wrapped() {
    let server = MockServer::start().await;
    mount_execution_and_export(&server, "report").await;

    Mock::given(method("GET"))
        .and(path(RESULT_URI))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = export_report(&client, &ReportRequest::report(REPORT_URI), ReportExportFormat::Csv)
        .await
        .unwrap()
        .into_result()
        .await
        .unwrap_err();

    assert!(matches!(err, GoodDataError::Operation { operation: "export report", .. }));
    assert_eq!(err.to_string(), "Unable to export report");
    assert_eq!(err.root_cause().status_code(), Some(404));
}
