//! Project creation, lookup and removal against a mocked platform.

use std::time::Duration;

use gooddata::{
    create_project, remove_project, Get, GoodDataClient, GoodDataError, PollSettings, Project,
    ProjectCreate, ProjectState,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT_URI: &str = "/gdc/projects/PROJECT_ID";

fn project_json(state: &str) -> serde_json::Value {
    serde_json::json!({
        "project": {
            "content": {"state": state, "driver": "Pg", "environment": "PRODUCTION"},
            "meta": {"title": "TITLE", "summary": "", "created": "2014-04-11 11:43:45"},
            "links": {"self": PROJECT_URI}
        }
    })
}

fn test_client(server: &MockServer) -> GoodDataClient {
    GoodDataClient::new("test-token", &server.uri())
        .unwrap()
        .with_poll_settings(PollSettings::fixed(Duration::from_millis(5)))
}

async fn mount_create_accepted(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/gdc/projects"))
        .and(body_partial_json(serde_json::json!({
            "project": {
                "content": {"authorizationToken": "AUTH_TOKEN"},
                "meta": {"title": "TITLE"}
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({"uri": PROJECT_URI})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_create_project() {
    let server = MockServer::start().await;
    mount_create_accepted(&server).await;

    Mock::given(method("GET"))
        .and(path(PROJECT_URI))
        .respond_with(ResponseTemplate::new(202).set_body_json(project_json("LOADING")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROJECT_URI))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json("PREPARING")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROJECT_URI))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json("ENABLED")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let pending = create_project(&client, &ProjectCreate::new("TITLE", "AUTH_TOKEN"))
        .await
        .expect("Failed to start project creation");
    assert_eq!(pending.uri(), PROJECT_URI);

    let project = pending.get().await.expect("Failed to create project");
    assert_eq!(project.title(), "TITLE");
    assert_eq!(project.state(), ProjectState::Enabled);
    assert_eq!(project.id(), Some("PROJECT_ID"));
}

#[tokio::test]
async fn test_create_fails_when_post_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gdc/projects"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = create_project(&client, &ProjectCreate::new("TITLE", "AUTH_TOKEN"))
        .await
        .unwrap_err();

    assert!(matches!(err, GoodDataError::Operation { operation: "create project", .. }));
    assert!(err.root_cause().is_client_error());
}

#[tokio::test]
async fn test_create_does_not_poll_foreign_location() {
    let server = MockServer::start().await;
    let foreign = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json("ENABLED")))
        .expect(0)
        .mount(&foreign)
        .await;
    Mock::given(method("POST"))
        .and(path("/gdc/projects"))
        .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
            "uri": format!("{}/gdc/projects/PROJECT_ID", foreign.uri())
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = create_project(&client, &ProjectCreate::new("TITLE", "AUTH_TOKEN"))
        .await
        .unwrap()
        .into_result()
        .await
        .unwrap_err();

    assert!(matches!(err, GoodDataError::Operation { operation: "create project", .. }));
    assert!(matches!(err.root_cause(), GoodDataError::InvalidArgument(_)));
    assert!(foreign.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_create_fails_when_poll_fails() {
    let server = MockServer::start().await;
    mount_create_accepted(&server).await;
    Mock::given(method("GET"))
        .and(path(PROJECT_URI))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = create_project(&client, &ProjectCreate::new("TITLE", "AUTH_TOKEN"))
        .await
        .unwrap()
        .into_result()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Project could not be created");
    assert_eq!(err.root_cause().status_code(), Some(400));
}

#[tokio::test]
async fn test_create_fails_when_project_is_deleted() {
    let server = MockServer::start().await;
    mount_create_accepted(&server).await;
    Mock::given(method("GET"))
        .and(path(PROJECT_URI))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json("DELETED")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let pending = create_project(&client, &ProjectCreate::new("TITLE", "AUTH_TOKEN"))
        .await
        .unwrap();

    let err = pending.get().await.unwrap_err();
    assert!(err.to_string().contains("DELETED"), "unexpected error: {err}");
    assert!(pending.get().await.is_err());
}

#[tokio::test]
async fn test_create_rejects_empty_title_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = create_project(&client, &ProjectCreate::new("  ", "AUTH_TOKEN"))
        .await
        .unwrap_err();
    assert!(matches!(err, GoodDataError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_get_project() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROJECT_URI))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json("ENABLED")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let project = Project::get(&client, "PROJECT_ID".to_string()).await.unwrap();
    assert_eq!(project.title(), "TITLE");
    assert!(project.is_enabled());
}

#[tokio::test]
async fn test_get_project_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gdc/projects/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"message": "Project not found"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = Project::get(&client, "missing".to_string()).await.unwrap_err();
    assert!(
        matches!(err, GoodDataError::NotFound { entity_type: "project", ref id } if id == "missing"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_get_project_server_error_is_not_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROJECT_URI))
        .respond_with(ResponseTemplate::new(500).insert_header("X-GDC-Request", "req-42"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = Project::get(&client, "PROJECT_ID".to_string()).await.unwrap_err();
    assert!(err.is_server_error());
    assert!(matches!(
        err,
        GoodDataError::ApiError { ref request_id, .. } if request_id.as_deref() == Some("req-42")
    ));
}

#[tokio::test]
async fn test_remove_project() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(PROJECT_URI))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let project = Project::from_json(project_json("ENABLED").to_string().as_bytes()).unwrap();
    remove_project(&client, &project).await.unwrap();
}
