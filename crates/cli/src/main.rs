//! `sheetllm` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Wire observability** — load `.env`, then configure
//!    `tracing-subscriber` (text by default, JSON with `LOG_FORMAT=json`,
//!    filtered by `RUST_LOG`). Every event of a run sits under one `job` span
//!    carrying a fresh [`JobRunId`].
//! 2. **Resolve the invocation** — parameters come from the trigger event file
//!    (`GITHUB_EVENT_PATH`) or four positional arguments.
//! 3. **Construct infrastructure** — pick the LLM provider from the configured
//!    keys, load the service account, and inject both into the
//!    [`Orchestrator`].
//! 4. **Map the outcome to an exit code** — `0` on success or an intentional
//!    no-op, `1` for anything else.

mod config;
mod invocation;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use batch::{BatchScheduler, Orchestrator};
use clap::{CommandFactory, Parser};
use llm::ReqwestTransport;
use pipeline::{JobError, JobRequest, JobRunId, ResponseCache};
use secrecy::ExposeSecret;
use sheets::SheetsClient;
use tracing::{debug, error, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use crate::config::{unexpected_key_prefix, Config};
use crate::invocation::{read_event_file, resolve, Cli, Invocation, Payload};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn collect_payload(cli: &Cli) -> Payload {
    let mut payload = Payload::default();
    if let Some(path) = std::env::var_os("GITHUB_EVENT_PATH") {
        match read_event_file(Path::new(&path)) {
            Ok(event) => {
                info!("parameters received from trigger event");
                payload = event;
            }
            Err(err) => error!(error = %err, "could not read trigger event"),
        }
    }
    if let Some(args) = cli.payload() {
        info!("parameters received from command-line arguments");
        payload = args;
    }
    payload
}

async fn run(cli: Cli) -> Result<()> {
    let event_name = std::env::var("GITHUB_EVENT_NAME").ok();
    let params = match resolve(collect_payload(&cli), event_name.as_deref()) {
        Invocation::Run(params) => params,
        Invocation::Noop { missing } => {
            info!(
                missing = %missing.join(", "),
                "manual trigger without parameters, nothing to do"
            );
            return Ok(());
        }
        Invocation::Missing(missing) => {
            let _ = Cli::command().print_help();
            bail!("missing parameters: {}", missing.join(", "));
        }
    };

    let config = Config::from_env().map_err(|e| JobError::Configuration {
        message: e.to_string(),
    })?;

    let cache = Arc::new(ResponseCache::new());
    let transport = Arc::new(ReqwestTransport::new().context("failed to build HTTP client")?);
    let client = llm::build_client(&config.providers, transport, cache).map_err(|e| {
        JobError::Configuration {
            message: e.to_string(),
        }
    })?;
    if let Some(prefix) = unexpected_key_prefix(&config.providers) {
        warn!(
            key_prefix = %prefix,
            "OpenRouter key does not start with the expected prefix (sk-or-v1- or sk-)"
        );
    }

    let job = JobRequest::validate(
        &params.spreadsheet_id,
        &params.sheet_name,
        &params.prompt,
        params.column_index,
    )?;

    let sheets = SheetsClient::from_credentials(
        config
            .google_credentials
            .as_ref()
            .map(|c| c.expose_secret())
            .unwrap_or_default(),
    )
    .context("failed to initialise Google Sheets client")?;
    debug!(client_email = sheets.client_email(), "using service account");

    let scheduler = BatchScheduler::new(
        Arc::new(client),
        config.concurrency,
        config.request_interval,
    );
    let orchestrator =
        Orchestrator::new(Arc::new(sheets), scheduler).with_batch_size(config.batch_size);

    let summary = orchestrator.run(&job).await?;
    info!(
        rows = summary.rows,
        batches = summary.batches,
        failed_items = summary.failed_items,
        "done"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();
    let run_id = JobRunId::new_random();
    match run(cli).instrument(info_span!("job", %run_id)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%run_id, error = %format!("{err:#}"), "fatal error");
            ExitCode::FAILURE
        }
    }
}
