use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mediscan_client::config::AppConfig;
use mediscan_client::models::assessment::{DerivedAssessment, StepOutcome};
use mediscan_client::models::image::CandidateFile;
use mediscan_client::services::client::VerificationClient;
use mediscan_client::services::progress::PROGRESS_STAGES;
use mediscan_client::workflow::{SubmitOutcome, WorkflowController, WorkflowState, NO_IMAGES_MESSAGE};

#[derive(Parser)]
#[command(name = "mediscan", version, about = "Verify a medicine package against the MediScan service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit photos of a medicine package for verification
    Verify {
        /// Photos of the package, barcode and label
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the assessment as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Check that the verification service is reachable
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the rendered result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let client = match VerificationClient::new(&config.api_base, config.request_timeout()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize verification client");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Health => health(&client).await,
        Command::Verify { files, json } => {
            let controller = Arc::new(WorkflowController::new(client, config.progress()));
            verify(controller, files, json).await
        }
    }
}

async fn health(client: &VerificationClient) -> ExitCode {
    match client.health().await {
        Ok(health) => {
            println!(
                "{} ({}) status={} version={}",
                client.api_base(),
                if health.status == "healthy" { "up" } else { "degraded" },
                health.status,
                health.version.as_deref().unwrap_or("unknown"),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(api_base = %client.api_base(), error = %e, "Health check failed");
            ExitCode::FAILURE
        }
    }
}

async fn verify(controller: Arc<WorkflowController>, files: Vec<PathBuf>, json: bool) -> ExitCode {
    let mut candidates = Vec::with_capacity(files.len());
    for path in &files {
        match CandidateFile::from_path(path) {
            Ok(file) => candidates.push(file),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file"),
        }
    }

    let report = controller.add_files(candidates);
    tracing::info!(accepted = report.accepted, rejected = report.rejected, "Images collected");

    let submission = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit().await })
    };

    // Render the cosmetic progress while the submission is in flight.
    let renderer = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_millis(250));
            let mut last_stage = None;
            loop {
                ticker.tick().await;
                if let WorkflowState::Submitting { progress, .. } = controller.state() {
                    if last_stage != Some(progress.current_stage) {
                        last_stage = Some(progress.current_stage);
                        eprintln!(
                            "[{:>3}%] {}/{} {}",
                            progress.percent,
                            progress.current_stage + 1,
                            PROGRESS_STAGES.len(),
                            progress.stage().label
                        );
                    }
                }
            }
        })
    };

    let outcome = submission.await;
    renderer.abort();
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Submission task failed");
            return ExitCode::FAILURE;
        }
    };

    match (outcome, controller.state()) {
        (SubmitOutcome::NeedsImages, _) => {
            eprintln!("{NO_IMAGES_MESSAGE}");
            ExitCode::FAILURE
        }
        (_, WorkflowState::Succeeded { assessment }) => {
            if json {
                match serde_json::to_string_pretty(&assessment) {
                    Ok(body) => println!("{body}"),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize assessment");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_assessment(&assessment);
            }
            ExitCode::SUCCESS
        }
        (_, WorkflowState::Failed { message }) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
        (outcome, state) => {
            tracing::warn!(?outcome, phase = %state.phase(), "Submission did not settle");
            ExitCode::FAILURE
        }
    }
}

fn print_assessment(assessment: &DerivedAssessment) {
    println!("{}", assessment.status.label);
    println!("  {}", assessment.status.message);
    println!(
        "  Risk level: {}   Safety score: {}/100",
        assessment.risk_level, assessment.safety_score
    );

    let product = &assessment.product;
    for (label, value) in [
        ("Product", &product.product_name),
        ("Manufacturer", &product.manufacturer),
        ("Batch", &product.batch_number),
        ("GTIN", &product.gtin),
        ("Country", &product.country),
        ("Expiry", &product.expiry_date),
    ] {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }

    println!();
    println!("Verification scores");
    for check in &assessment.check_scores {
        println!("  {:<26} {:>5.1}%  ({})", check.label, check.score, check.band);
    }

    println!();
    println!("How we verified your medicine");
    for step in &assessment.narrative {
        let mark = match step.outcome {
            StepOutcome::Completed => "ok",
            StepOutcome::Attention => "!!",
        };
        println!("  [{mark}] {}", step.title);
        println!("       {}", step.message);
        for detail in &step.details {
            println!("       - {detail}");
        }
    }

    if !assessment.risk_factors.is_empty() {
        println!();
        println!("Risk factors");
        for factor in &assessment.risk_factors {
            println!("  [{}] {}", factor.severity, factor.message);
        }
    }

    if !assessment.recommendations.is_empty() {
        println!();
        println!("Recommendations");
        for (i, rec) in assessment.recommendations.iter().enumerate() {
            println!("  {}. {rec}", i + 1);
        }
    }
}
