//! GoodData API client library.
//!
//! A Rust library for the GoodData REST API, built around the platform's
//! "submit, then poll a location" pattern for long-running operations.
//!
//! # Quick Start
//!
//! ```no_run
//! use gooddata::{create_project, export_report, GoodDataClient, ProjectCreate};
//! use gooddata::{ReportExportFormat, ReportRequest};
//!
//! #[tokio::main]
//! async fn main() -> gooddata::Result<()> {
//!     // Create client from environment variables
//!     let client = GoodDataClient::from_env()?;
//!
//!     // Create a project and wait until it is enabled
//!     let pending = create_project(&client, &ProjectCreate::new("Sales", "AUTH_TOKEN")).await?;
//!     let project = pending.get().await?;
//!     println!("Project: {}", project.title());
//!
//!     // Export a report as CSV
//!     let export = export_report(
//!         &client,
//!         &ReportRequest::report("/gdc/md/PROJECT_ID/obj/42"),
//!         ReportExportFormat::Csv,
//!     )
//!     .await?
//!     .into_result()
//!     .await?;
//!     println!("Exported {} bytes", export.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`GoodDataClient`] - authenticated HTTP transport, cheap to clone
//! - [`DeferredResult`] - handle over an operation observed by polling;
//!   resolves once and caches the value or the error
//! - [`PollHandler`] - per-operation strategy: which URI to poll, how to
//!   classify responses, how to build the final value or error
//! - [`PollSettings`] - backoff between attempts and the total wait ceiling
//!
//! Service functions such as [`create_project`], [`export_report`] and
//! [`execute_schedule`] start an operation and hand back a
//! [`DeferredResult`] with the matching handler.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `GOODDATA_TOKEN` (required) - Your GoodData API token
//! - `GOODDATA_HOST` (optional) - Base URL (defaults to `https://secure.gooddata.com`)
//! - `GOODDATA_POLL_TIMEOUT_SECS` (optional) - Ceiling on time spent polling

pub mod cli;
mod client;
mod error;
mod models;
mod output;
mod poll;
mod traits;

// Re-export core types
pub use client::GoodDataClient;
pub use error::{GoodDataError, Result};
pub use output::{ExportSummary, PrettyPrint};
pub use reqwest::StatusCode;
pub use tokio_util::sync::CancellationToken;

// Re-export polling
pub use poll::{
    default_classify, DeferredResult, PollHandler, PollResponse, PollSettings, PollStatus,
    SimplePollHandler,
};

// Re-export traits
pub use traits::Get;

// Re-export models
pub use models::{
    // Common types
    UriResponse,
    // Project types
    CreateProjectHandler,
    Project,
    ProjectContent,
    ProjectCreate,
    ProjectLinks,
    ProjectMeta,
    ProjectState,
    PROJECTS_URI,
    // Report types
    ExportReportHandler,
    ReportExport,
    ReportExportFormat,
    ReportRequest,
    EXECUTOR_URI,
    EXPORTING_URI,
    // Schedule types
    ExecuteScheduleHandler,
    ExecutionLinks,
    ExecutionStatus,
    Schedule,
    ScheduleExecution,
    ScheduleLinks,
};

// Re-export convenience functions
pub use models::{create_project, execute_schedule, export_report, remove_project};
