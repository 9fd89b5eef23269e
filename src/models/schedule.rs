//! Data load schedules and their executions.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::client::GoodDataClient;
use crate::error::{GoodDataError, Result};
use crate::poll::{DeferredResult, PollHandler, PollResponse, PollStatus};
use crate::traits::Get;

const EXECUTE_SCHEDULE: &str = "execute schedule";

/// A schedule running a data load process.
///
/// Wrapped by the API as `{"schedule": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Schedule type (e.g., "MSETL").
    #[serde(rename = "type", default)]
    pub schedule_type: Option<String>,

    /// "ENABLED" or "DISABLED".
    #[serde(default)]
    pub state: Option<String>,

    /// Cron expression, absent for trigger-based schedules.
    #[serde(default)]
    pub cron: Option<String>,

    #[serde(default)]
    pub timezone: Option<String>,

    /// Process parameters such as `PROCESS_ID` and `EXECUTABLE`.
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,

    pub links: ScheduleLinks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,

    /// Where executions are started and listed.
    #[serde(default)]
    pub executions: Option<String>,
}

#[derive(Deserialize)]
struct ScheduleEnvelope {
    schedule: Schedule,
}

impl Schedule {
    pub fn uri(&self) -> Option<&str> {
        self.links.self_link.as_deref()
    }

    pub fn executions_uri(&self) -> Option<&str> {
        self.links.executions.as_deref()
    }

    /// The process this schedule runs.
    pub fn process_id(&self) -> Option<&str> {
        self.params.get("PROCESS_ID").and_then(|v| v.as_str())
    }
}

/// One run of a schedule.
///
/// Wrapped by the API as `{"execution": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExecution {
    #[serde(default)]
    pub status: ExecutionStatus,

    /// What started the run (e.g., "MANUAL", "SCHEDULED").
    #[serde(default)]
    pub trigger: Option<String>,

    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub links: ExecutionLinks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,

    #[serde(default)]
    pub execution_log: Option<String>,
}

/// Status of a schedule execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Scheduled,
    Running,
    Ok,
    Error,
    #[serde(alias = "CANCELLED")]
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Scheduled | Self::Running)
    }

    pub fn is_success(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scheduled => "SCHEDULED",
            Self::Running => "RUNNING",
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[derive(Deserialize)]
struct ExecutionEnvelope {
    execution: ScheduleExecution,
}

impl ScheduleExecution {
    /// Decode the `{"execution": ...}` envelope.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let envelope: ExecutionEnvelope = serde_json::from_slice(body)?;
        Ok(envelope.execution)
    }

    pub fn uri(&self) -> Option<&str> {
        self.links.self_link.as_deref()
    }

    /// Wall time between start and end, when both are known.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.end_time? - self.start_time?)
    }
}

/// Polls an execution until it reaches a final status.
#[derive(Debug, Clone)]
pub struct ExecuteScheduleHandler {
    uri: String,
}

impl ExecuteScheduleHandler {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[async_trait]
impl PollHandler for ExecuteScheduleHandler {
    type Output = ScheduleExecution;

    fn uri(&self) -> &str {
        &self.uri
    }

    fn classify(&self, response: &PollResponse) -> PollStatus {
        match response.status {
            StatusCode::OK => match ScheduleExecution::from_json(&response.body) {
                Ok(execution) if !execution.status.is_finished() => PollStatus::Continue,
                _ => PollStatus::Done,
            },
            StatusCode::ACCEPTED => PollStatus::Continue,
            _ => PollStatus::Failed,
        }
    }

    async fn on_finish(
        &self,
        _client: &GoodDataClient,
        response: PollResponse,
    ) -> Result<ScheduleExecution> {
        let execution = ScheduleExecution::from_json(&response.body).map_err(|e| {
            GoodDataError::operation_caused_by(
                EXECUTE_SCHEDULE,
                "Cannot read schedule execution",
                e,
            )
        })?;

        if !execution.status.is_success() {
            return Err(GoodDataError::operation(
                EXECUTE_SCHEDULE,
                format!(
                    "Schedule execution failed: {} finished with status {}",
                    self.uri, execution.status
                ),
            ));
        }

        Ok(execution)
    }

    fn on_poll_failure(&self, response: &PollResponse) -> GoodDataError {
        GoodDataError::operation(
            EXECUTE_SCHEDULE,
            format!(
                "Schedule execution failed: unexpected HTTP response code {}",
                response.status
            ),
        )
    }

    fn handle_poll_error(&self, error: GoodDataError) -> GoodDataError {
        GoodDataError::operation_caused_by(EXECUTE_SCHEDULE, "Cannot execute schedule", error)
    }
}

/// Start a schedule execution and return a handle resolving when it ends.
///
/// # Errors
///
/// Fails immediately if the schedule has no executions link or the
/// platform refuses to start it. An execution ending in any status other
/// than `OK` surfaces from the returned [`DeferredResult`].
#[tracing::instrument(skip(client, schedule), fields(schedule_uri = ?schedule.uri()))]
pub async fn execute_schedule(
    client: &GoodDataClient,
    schedule: &Schedule,
) -> Result<DeferredResult<ExecuteScheduleHandler>> {
    let executions_uri = schedule.executions_uri().ok_or_else(|| {
        GoodDataError::InvalidArgument("schedule has no executions link".to_string())
    })?;

    let started = start_execution(client, executions_uri).await.map_err(|e| {
        GoodDataError::operation_caused_by(EXECUTE_SCHEDULE, "Cannot execute schedule", e)
    })?;

    let uri = started.uri().ok_or_else(|| {
        GoodDataError::operation(
            EXECUTE_SCHEDULE,
            "Cannot execute schedule: execution has no self link",
        )
    })?;

    tracing::debug!(execution = uri, "schedule execution started");
    Ok(DeferredResult::new(client, ExecuteScheduleHandler::new(uri)))
}

async fn start_execution(client: &GoodDataClient, executions_uri: &str) -> Result<ScheduleExecution> {
    let response = client
        .post(executions_uri, &serde_json::json!({ "execution": {} }))
        .await?;
    let body = response.bytes().await?;
    ScheduleExecution::from_json(&body)
}

#[async_trait]
impl Get for Schedule {
    type Id = String; // Schedule URI

    #[tracing::instrument(skip(client))]
    async fn get(client: &GoodDataClient, uri: String) -> Result<Self> {
        let response = client
            .get(&uri)
            .await
            .map_err(|e| e.not_found_as("schedule", &uri))?;
        let body = response.bytes().await?;
        let envelope: ScheduleEnvelope = serde_json::from_slice(&body)?;
        Ok(envelope.schedule)
    }
}
