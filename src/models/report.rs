//! Report export.
//!
//! Exporting is a three step conversation: execute the report, ask the
//! exporter to render the execution result, then poll the exporter's
//! result URI until the file is ready.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use crate::client::GoodDataClient;
use crate::error::{GoodDataError, Result};
use crate::models::common::UriResponse;
use crate::poll::{DeferredResult, PollHandler, PollResponse, PollStatus};

/// Endpoint executing a report or report definition.
pub const EXECUTOR_URI: &str = "/gdc/xtab2/executor3";

/// Endpoint rendering an execution result into a file.
pub const EXPORTING_URI: &str = "/gdc/exporter/executor";

const EXPORT_REPORT: &str = "export report";

/// File formats the exporter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportExportFormat {
    Pdf,
    Xls,
    Xlsx,
    Png,
    Csv,
    Html,
}

impl ReportExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Png => "png",
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ReportExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportExportFormat {
    type Err = GoodDataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "xls" => Ok(Self::Xls),
            "xlsx" => Ok(Self::Xlsx),
            "png" => Ok(Self::Png),
            "csv" => Ok(Self::Csv),
            "html" => Ok(Self::Html),
            other => Err(GoodDataError::InvalidArgument(format!(
                "unknown export format '{other}', expected one of pdf, xls, xlsx, png, csv, html"
            ))),
        }
    }
}

/// What to execute: a saved report or a report definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRequest {
    /// URI of a report object (`/gdc/md/{project}/obj/{id}`).
    Report(String),
    /// URI of a report definition object.
    Definition(String),
}

impl ReportRequest {
    pub fn report(uri: impl Into<String>) -> Self {
        Self::Report(uri.into())
    }

    pub fn definition(uri: impl Into<String>) -> Self {
        Self::Definition(uri.into())
    }

    pub fn uri(&self) -> &str {
        match self {
            Self::Report(uri) | Self::Definition(uri) => uri,
        }
    }

    fn to_request(&self) -> serde_json::Value {
        let inner = match self {
            Self::Report(uri) => serde_json::json!({ "report": uri }),
            Self::Definition(uri) => serde_json::json!({ "reportDefinition": uri }),
        };
        serde_json::json!({ "report_req": inner })
    }
}

/// An exported report file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportExport {
    pub format: ReportExportFormat,
    pub data: Vec<u8>,
}

impl ReportExport {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Polls the exporter until the rendered file is available.
///
/// 200 carries the file, 202 means still rendering, and 204 means the
/// report has no data to export.
#[derive(Debug, Clone)]
pub struct ExportReportHandler {
    uri: String,
    format: ReportExportFormat,
}

impl ExportReportHandler {
    pub fn new(uri: impl Into<String>, format: ReportExportFormat) -> Self {
        Self {
            uri: uri.into(),
            format,
        }
    }
}

#[async_trait]
impl PollHandler for ExportReportHandler {
    type Output = ReportExport;

    fn uri(&self) -> &str {
        &self.uri
    }

    fn classify(&self, response: &PollResponse) -> PollStatus {
        match response.status {
            StatusCode::OK => PollStatus::Done,
            StatusCode::ACCEPTED => PollStatus::Continue,
            _ => PollStatus::Failed,
        }
    }

    async fn on_finish(
        &self,
        _client: &GoodDataClient,
        response: PollResponse,
    ) -> Result<ReportExport> {
        Ok(ReportExport {
            format: self.format,
            data: response.body,
        })
    }

    fn on_poll_failure(&self, response: &PollResponse) -> GoodDataError {
        if response.status == StatusCode::NO_CONTENT {
            GoodDataError::operation(EXPORT_REPORT, "Report contains no data")
        } else {
            GoodDataError::operation(
                EXPORT_REPORT,
                format!(
                    "Unable to export report, unknown HTTP response code: {}",
                    response.status
                ),
            )
        }
    }

    fn handle_poll_error(&self, error: GoodDataError) -> GoodDataError {
        GoodDataError::operation_caused_by(EXPORT_REPORT, "Unable to export report", error)
    }
}

/// Execute a report and export the result in the given format.
///
/// # Errors
///
/// Fails immediately if the execution or export request is rejected.
/// Rendering failures, including an empty report, surface from the
/// returned [`DeferredResult`].
///
/// # Example
///
/// ```no_run
/// use gooddata::{export_report, GoodDataClient, ReportExportFormat, ReportRequest};
///
/// # async fn example() -> gooddata::Result<()> {
/// let client = GoodDataClient::from_env()?;
/// let export = export_report(
///     &client,
///     &ReportRequest::report("/gdc/md/PROJECT_ID/obj/42"),
///     ReportExportFormat::Csv,
/// )
/// .await?
/// .into_result()
/// .await?;
/// std::fs::write("report.csv", export.as_bytes()).ok();
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(skip(client), fields(uri = %request.uri()))]
pub async fn export_report(
    client: &GoodDataClient,
    request: &ReportRequest,
    format: ReportExportFormat,
) -> Result<DeferredResult<ExportReportHandler>> {
    let execution = execute_report(client, request).await?;

    let export_request = serde_json::json!({
        "result_req": {
            "result": execution,
            "format": format.as_str(),
        }
    });

    let response = client
        .post(EXPORTING_URI, &export_request)
        .await
        .map_err(|e| GoodDataError::operation_caused_by(EXPORT_REPORT, "Unable to export report", e))?;
    let exported: UriResponse = response.json().await.map_err(|e| {
        GoodDataError::operation_caused_by(
            EXPORT_REPORT,
            "Unable to export report",
            GoodDataError::from(e),
        )
    })?;

    tracing::debug!(result_uri = %exported.uri, "report export accepted");
    Ok(DeferredResult::new(
        client,
        ExportReportHandler::new(exported.uri, format),
    ))
}

async fn execute_report(
    client: &GoodDataClient,
    request: &ReportRequest,
) -> Result<serde_json::Value> {
    let response = client
        .post(EXECUTOR_URI, &request.to_request())
        .await
        .map_err(|e| GoodDataError::operation_caused_by(EXPORT_REPORT, "Unable to execute report", e))?;

    response.json().await.map_err(|e| {
        GoodDataError::operation_caused_by(
            EXPORT_REPORT,
            "Unable to read execution result",
            GoodDataError::from(e),
        )
    })
}
