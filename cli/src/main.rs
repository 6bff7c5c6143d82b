//! `fakerest-suite`: run the Books/Authors scenario catalogue against a
//! FakeREST deployment and exit non-zero when the final attempt failed.

mod telemetry;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use fakerest_core::scenario::Outcome;
use fakerest_core::{scenarios, ApiClient, Fixtures, RunMode, Runner, Settings};

#[derive(Debug, Parser)]
#[command(name = "fakerest-suite", version, about = "End-to-end checks for the FakeREST Books and Authors API")]
struct Args {
    /// Service root, without the `/api/{version}` prefix. Overrides the profile.
    #[arg(long)]
    base_url: Option<String>,

    /// Settings profile, read from `config/{profile}.toml`.
    #[arg(long, env = "FAKEREST_PROFILE", default_value = "live")]
    profile: String,

    /// Only run scenarios whose `suite > name` contains this text.
    #[arg(long)]
    filter: Option<String>,

    /// Use the interactive retry budget.
    #[arg(long)]
    open: bool,

    /// Override the configured number of whole-run retries.
    #[arg(long)]
    retries: Option<u32>,

    /// Print the selected scenarios and exit.
    #[arg(long)]
    list: bool,

    /// Write the run report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut settings = Settings::load_profile(&args.profile)?;
    if let Some(base_url) = &args.base_url {
        settings.api.base_url = base_url.clone();
    }
    telemetry::init(&settings.telemetry);

    let registry = scenarios::all();
    if args.list {
        for scenario in registry.matching(args.filter.as_deref()) {
            println!("{}", scenario.full_name());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let fixtures = Fixtures::load(settings.fixtures_dir.as_deref()).context("failed to load fixtures")?;
    let client = ApiClient::from_settings(&settings);
    let mode = if args.open { RunMode::Open } else { RunMode::Run };
    tracing::info!(base_url = client.base_url(), profile = %args.profile, ?mode, "starting run");

    let mut runner = Runner::from_settings(&client, &fixtures, &settings, mode);
    if let Some(retries) = args.retries {
        runner = runner.retries(retries);
    }
    let report = runner.run(&registry, args.filter.as_deref());

    if let Some(attempt) = report.final_attempt() {
        for failure in attempt.failures() {
            let detail = match &failure.outcome {
                Outcome::Failed(detail) | Outcome::Errored(detail) => detail.as_str(),
                Outcome::Passed => "",
            };
            println!("FAIL {} > {}: {detail}", failure.suite, failure.name);
        }
    }
    let summary = report.summary();
    println!(
        "{} scenarios: {} passed, {} failed, {} errored ({} attempt(s), run {})",
        summary.total, summary.passed, summary.failed, summary.errored, summary.attempts, report.run_id
    );

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize run report")?;
        fs::write(path, json).with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    Ok(if report.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
