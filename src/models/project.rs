//! Project model, project creation and removal.

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::client::GoodDataClient;
use crate::error::{GoodDataError, Result};
use crate::models::common::{last_segment, UriResponse};
use crate::poll::{DeferredResult, PollHandler, PollResponse, PollStatus};
use crate::traits::Get;

/// Endpoint for listing and creating projects.
pub const PROJECTS_URI: &str = "/gdc/projects";

const CREATE_PROJECT: &str = "create project";

/// A GoodData project (workspace).
///
/// Projects are the containers for data models, reports and dashboards.
/// The API wraps them as `{"project": {"content": ..., "meta": ..., "links": ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Technical settings and lifecycle state.
    pub content: ProjectContent,

    /// Title and authorship.
    pub meta: ProjectMeta,

    /// Related resource links.
    #[serde(default)]
    pub links: ProjectLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContent {
    /// Lifecycle state.
    #[serde(default)]
    pub state: ProjectState,

    /// Database driver (e.g., "Pg", "vertica").
    #[serde(default)]
    pub driver: Option<String>,

    /// Environment (e.g., "PRODUCTION", "TESTING").
    #[serde(default)]
    pub environment: Option<String>,

    /// Authorization token the project was created with.
    #[serde(default)]
    pub authorization_token: Option<String>,

    /// Cluster the project lives on.
    #[serde(default)]
    pub cluster: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub title: String,

    #[serde(default)]
    pub summary: Option<String>,

    /// Profile URI of the author.
    #[serde(default)]
    pub author: Option<String>,

    /// Creation time as reported by the platform ("YYYY-MM-DD HH:MM:SS").
    #[serde(default)]
    pub created: Option<String>,

    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectLinks {
    /// The project's own URI.
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,

    #[serde(default)]
    pub users: Option<String>,

    #[serde(default)]
    pub metadata: Option<String>,
}

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectState {
    Enabled,
    Disabled,
    Deleted,
    Archived,
    Preparing,
    Prepared,
    Loading,
    DataLoading,
    Migrated,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProjectState {
    /// Whether the project is still being set up.
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Preparing | Self::Loading)
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Deleted => "DELETED",
            Self::Archived => "ARCHIVED",
            Self::Preparing => "PREPARING",
            Self::Prepared => "PREPARED",
            Self::Loading => "LOADING",
            Self::DataLoading => "DATA_LOADING",
            Self::Migrated => "MIGRATED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Deserialize)]
struct ProjectEnvelope {
    project: Project,
}

impl Project {
    /// Decode the `{"project": ...}` envelope.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let envelope: ProjectEnvelope = serde_json::from_slice(body)?;
        Ok(envelope.project)
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }

    pub fn state(&self) -> ProjectState {
        self.content.state
    }

    pub fn is_enabled(&self) -> bool {
        self.content.state == ProjectState::Enabled
    }

    /// The project URI (`/gdc/projects/{id}`), if the API returned it.
    pub fn uri(&self) -> Option<&str> {
        self.links.self_link.as_deref()
    }

    /// The project ID, taken from the project URI.
    pub fn id(&self) -> Option<&str> {
        self.uri().and_then(last_segment)
    }
}

/// Parameters for creating a project.
#[derive(Debug, Clone)]
pub struct ProjectCreate {
    pub title: String,
    pub authorization_token: String,
    pub summary: Option<String>,
    /// Database driver, defaults to "Pg".
    pub driver: String,
    /// Environment, defaults to "PRODUCTION".
    pub environment: String,
}

impl ProjectCreate {
    pub fn new(title: impl Into<String>, authorization_token: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authorization_token: authorization_token.into(),
            summary: None,
            driver: "Pg".to_string(),
            environment: "PRODUCTION".to_string(),
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(GoodDataError::InvalidArgument(
                "project title must not be empty".to_string(),
            ));
        }
        if self.authorization_token.trim().is_empty() {
            return Err(GoodDataError::InvalidArgument(
                "authorization token must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn to_request(&self) -> serde_json::Value {
        serde_json::json!({
            "project": {
                "content": {
                    "authorizationToken": self.authorization_token,
                    "driver": self.driver,
                    "environment": self.environment,
                },
                "meta": {
                    "title": self.title,
                    "summary": self.summary.as_deref().unwrap_or_default(),
                },
            }
        })
    }
}

/// Polls a project URI until the project leaves its setup states.
#[derive(Debug, Clone)]
pub struct CreateProjectHandler {
    uri: String,
}

impl CreateProjectHandler {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[async_trait]
impl PollHandler for CreateProjectHandler {
    type Output = Project;

    fn uri(&self) -> &str {
        &self.uri
    }

    fn classify(&self, response: &PollResponse) -> PollStatus {
        match response.status {
            StatusCode::ACCEPTED => PollStatus::Continue,
            StatusCode::OK => match Project::from_json(&response.body) {
                Ok(project) if project.state().is_in_progress() => PollStatus::Continue,
                // undecodable bodies are reported by on_finish
                _ => PollStatus::Done,
            },
            _ => PollStatus::Failed,
        }
    }

    async fn on_finish(&self, _client: &GoodDataClient, response: PollResponse) -> Result<Project> {
        let project = Project::from_json(&response.body).map_err(|e| {
            GoodDataError::operation_caused_by(CREATE_PROJECT, "Project could not be created", e)
        })?;

        if !project.is_enabled() {
            return Err(GoodDataError::operation(
                CREATE_PROJECT,
                format!(
                    "Project could not be created: {} is {}",
                    self.uri,
                    project.state()
                ),
            ));
        }

        Ok(project)
    }

    fn on_poll_failure(&self, response: &PollResponse) -> GoodDataError {
        GoodDataError::operation(
            CREATE_PROJECT,
            format!(
                "Project could not be created: unexpected HTTP response code {}",
                response.status
            ),
        )
    }

    fn handle_poll_error(&self, error: GoodDataError) -> GoodDataError {
        GoodDataError::operation_caused_by(CREATE_PROJECT, "Project could not be created", error)
    }
}

/// Create a project and return a handle that resolves once it is enabled.
///
/// # Errors
///
/// Fails immediately if the parameters are invalid or the platform rejects
/// the request. Failures while the project is being prepared surface from
/// the returned [`DeferredResult`].
#[tracing::instrument(skip(client, project), fields(title = %project.title))]
pub async fn create_project(
    client: &GoodDataClient,
    project: &ProjectCreate,
) -> Result<DeferredResult<CreateProjectHandler>> {
    project.validate()?;

    let response = client
        .post(PROJECTS_URI, &project.to_request())
        .await
        .map_err(|e| {
            GoodDataError::operation_caused_by(CREATE_PROJECT, "Project could not be created", e)
        })?;
    let created: UriResponse = response.json().await.map_err(|e| {
        GoodDataError::operation_caused_by(
            CREATE_PROJECT,
            "Project could not be created",
            GoodDataError::from(e),
        )
    })?;

    tracing::debug!(uri = %created.uri, "project creation accepted");
    Ok(DeferredResult::new(client, CreateProjectHandler::new(created.uri)))
}

/// Delete a project.
///
/// # Errors
///
/// Returns an error if the project has no URI or the request fails.
#[tracing::instrument(skip(client, project), fields(uri = ?project.uri()))]
pub async fn remove_project(client: &GoodDataClient, project: &Project) -> Result<()> {
    let uri = project.uri().ok_or_else(|| {
        GoodDataError::InvalidArgument("project has no self link".to_string())
    })?;

    client
        .delete(uri)
        .await
        .map_err(|e| e.not_found_as("project", uri))?;
    Ok(())
}

#[async_trait]
impl Get for Project {
    type Id = String; // Project ID

    #[tracing::instrument(skip(client))]
    async fn get(client: &GoodDataClient, id: String) -> Result<Self> {
        let path = format!("{PROJECTS_URI}/{}", urlencoding::encode(&id));

        let response = client
            .get(&path)
            .await
            .map_err(|e| e.not_found_as("project", &id))?;
        let body = response.bytes().await?;
        Project::from_json(&body)
    }
}
