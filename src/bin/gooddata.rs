//! GoodData API CLI binary.
//!
//! A command-line interface for starting GoodData operations and waiting
//! for them to finish.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use gooddata::cli::{Cli, Command, ProjectCommand, ReportCommand, ScheduleCommand};
use gooddata::{
    create_project, execute_schedule, export_report, remove_project, CancellationToken,
    ExportSummary, GoodDataClient, Get, PrettyPrint, Project, ProjectCreate, ReportRequest, Schedule,
    ScheduleExecution,
};
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let client = match GoodDataClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set GOODDATA_TOKEN environment variable");
            return ExitCode::FAILURE;
        }
    };

    let client = match cli.poll_timeout {
        Some(secs) => {
            let settings = client
                .poll_settings()
                .clone()
                .with_timeout(Some(Duration::from_secs(secs)));
            client.with_poll_settings(settings)
        }
        None => client,
    };

    // Ctrl-C stops any poll in progress
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    match run(&client, cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            let cause = e.root_cause();
            if !std::ptr::eq(cause, &e) {
                eprintln!("Caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &GoodDataClient, cli: Cli, cancel: CancellationToken) -> gooddata::Result<()> {
    match cli.command {
        Command::Project(command) => handle_project(client, command, cli.json, cancel).await,
        Command::Report(command) => handle_report(client, command, cli.json, cancel).await,
        Command::Schedule(command) => handle_schedule(client, command, cli.json, cancel).await,
    }
}

async fn handle_project(
    client: &GoodDataClient,
    command: ProjectCommand,
    json: bool,
    cancel: CancellationToken,
) -> gooddata::Result<()> {
    match command {
        ProjectCommand::Get { id } => {
            let project = Project::get(client, id).await?;
            output_single(&project, json)?;
        }
        ProjectCommand::Create {
            title,
            token,
            summary,
            driver,
            environment,
        } => {
            let mut params = ProjectCreate::new(title, token)
                .with_driver(driver)
                .with_environment(environment);
            if let Some(summary) = summary {
                params = params.with_summary(summary);
            }
            let project = create_project(client, &params)
                .await?
                .with_cancellation(cancel)
                .into_result()
                .await?;
            output_single(&project, json)?;
        }
        ProjectCommand::Remove { id } => {
            let project = Project::get(client, id).await?;
            remove_project(client, &project).await?;
            if let Some(uri) = project.uri() {
                eprintln!("Removed {uri}");
            }
        }
    }
    Ok(())
}

async fn handle_report(
    client: &GoodDataClient,
    command: ReportCommand,
    json: bool,
    cancel: CancellationToken,
) -> gooddata::Result<()> {
    match command {
        ReportCommand::Export {
            uri,
            format,
            definition,
            output,
        } => {
            let request = if definition {
                ReportRequest::definition(uri)
            } else {
                ReportRequest::report(uri)
            };
            let export = export_report(client, &request, format)
                .await?
                .with_cancellation(cancel)
                .into_result()
                .await?;
            tokio::fs::write(&output, export.as_bytes()).await.map_err(|e| {
                gooddata::GoodDataError::InvalidArgument(format!(
                    "cannot write {}: {e}",
                    output.display()
                ))
            })?;
            output_single(&ExportSummary::new(&export, &output), json)?;
        }
    }
    Ok(())
}

async fn handle_schedule(
    client: &GoodDataClient,
    command: ScheduleCommand,
    json: bool,
    cancel: CancellationToken,
) -> gooddata::Result<()> {
    match command {
        ScheduleCommand::Execute { uri } => {
            let schedule = Schedule::get(client, uri).await?;
            let execution = execute_schedule(client, &schedule)
                .await?
                .with_cancellation(cancel)
                .into_result()
                .await?;
            if json {
                output_single(&execution, true)?;
            } else {
                println!("{}", Table::new([ExecutionRow::from(&execution)]));
            }
        }
    }
    Ok(())
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> gooddata::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct ExecutionRow {
    execution: String,
    status: String,
    trigger: String,
    duration: String,
}

impl From<&ScheduleExecution> for ExecutionRow {
    fn from(e: &ScheduleExecution) -> Self {
        Self {
            execution: e.uri().unwrap_or("-").to_string(),
            status: e.status.to_string(),
            trigger: e.trigger.clone().unwrap_or_default(),
            duration: e
                .duration()
                .map(|d| format!("{}s", d.num_seconds()))
                .unwrap_or_default(),
        }
    }
}
