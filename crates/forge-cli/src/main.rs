//! Agent Forge CLI
//!
//! The `forge` command turns a short description of an automated worker
//! into a validated agent configuration document.
//!
//! ## Commands
//!
//! - `generate`: Run the pipeline for a request
//! - `resume`: Answer clarification questions and continue a suspended run
//! - `cancel`: Abandon a suspended run
//! - `validate`: Run the validation gates over an artifact file

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use forge_core::{
    validate_document, Continuation, ForgeConfig, GenerationOutcome, Pipeline, RunStatus,
    METRICS,
};

/// Exit code for a rejected run or a failed validation.
const EXIT_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "forge")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Generate validated agent configurations from plain-language requests",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "FORGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an agent configuration from a request
    Generate {
        /// What the agent should do
        text: String,

        /// Extra context about the project
        #[arg(long)]
        context: Option<String>,

        /// Prefer a fast model and skip optional research
        #[arg(long)]
        speed_critical: bool,

        /// Where to write the continuation if clarification is needed
        #[arg(long)]
        continuation_out: Option<PathBuf>,

        /// Where to write the approved artifact document
        #[arg(long)]
        artifact_out: Option<PathBuf>,
    },

    /// Resume a suspended run with answers to its questions
    Resume {
        /// Continuation file written by `generate` or a previous `resume`
        #[arg(long)]
        continuation: PathBuf,

        /// One option index per question, comma-separated (e.g. 0,1)
        #[arg(long, value_delimiter = ',', required = true)]
        answers: Vec<usize>,

        /// Where to write the next continuation if more clarification is needed
        #[arg(long)]
        continuation_out: Option<PathBuf>,

        /// Where to write the approved artifact document
        #[arg(long)]
        artifact_out: Option<PathBuf>,
    },

    /// Abandon a suspended run
    Cancel {
        /// Continuation file to abandon
        #[arg(long)]
        continuation: PathBuf,
    },

    /// Validate an artifact document
    Validate {
        /// Artifact file (`+++` front matter followed by `## Heading` sections)
        file: PathBuf,
    },
}

/// Output paths shared by `generate` and `resume`.
struct OutputPaths<'a> {
    continuation: Option<&'a Path>,
    artifact: Option<&'a Path>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    forge_core::init_tracing(cli.json, level);

    let config =
        ForgeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let status = match cli.command {
        Commands::Generate {
            text,
            context,
            speed_critical,
            continuation_out,
            artifact_out,
        } => {
            let pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;
            let outputs = OutputPaths {
                continuation: continuation_out.as_deref(),
                artifact: artifact_out.as_deref(),
            };
            cmd_generate(&pipeline, &text, context.as_deref(), speed_critical, &outputs).await?
        }
        Commands::Resume {
            continuation,
            answers,
            continuation_out,
            artifact_out,
        } => {
            let pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;
            let outputs = OutputPaths {
                continuation: continuation_out.as_deref(),
                artifact: artifact_out.as_deref(),
            };
            cmd_resume(&pipeline, &continuation, &answers, &outputs).await?
        }
        Commands::Cancel { continuation } => {
            let pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;
            cmd_cancel(&pipeline, &continuation)?
        }
        Commands::Validate { file } => cmd_validate(&config, &file)?,
    };

    METRICS.flush();
    Ok(exit_code(status))
}

fn exit_code(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Rejected => ExitCode::from(EXIT_REJECTED),
        RunStatus::Approved | RunStatus::NeedsClarification => ExitCode::SUCCESS,
    }
}

async fn cmd_generate(
    pipeline: &Pipeline,
    text: &str,
    context: Option<&str>,
    speed_critical: bool,
    outputs: &OutputPaths<'_>,
) -> Result<RunStatus> {
    let outcome = pipeline.generate(text, context, speed_critical).await;
    report_outcome(&outcome, outputs)
}

async fn cmd_resume(
    pipeline: &Pipeline,
    continuation_path: &Path,
    answers: &[usize],
    outputs: &OutputPaths<'_>,
) -> Result<RunStatus> {
    let continuation = read_continuation(continuation_path)?;
    let outcome = pipeline.resume(continuation, answers).await;
    report_outcome(&outcome, outputs)
}

fn cmd_cancel(pipeline: &Pipeline, continuation_path: &Path) -> Result<RunStatus> {
    let continuation = read_continuation(continuation_path)?;
    let outcome = pipeline.cancel(&continuation);
    print_json(&outcome)?;
    Ok(outcome.status)
}

fn cmd_validate(config: &ForgeConfig, file: &Path) -> Result<RunStatus> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read artifact: {:?}", file))?;
    let report = validate_document(&text, None, &config.thresholds);
    print_json(&report)?;
    if report.passed() {
        info!(file = %file.display(), "artifact passed every gate");
        Ok(RunStatus::Approved)
    } else {
        Ok(RunStatus::Rejected)
    }
}

fn read_continuation(path: &Path) -> Result<Continuation> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read continuation: {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid continuation file: {:?}", path))
}

/// Print the outcome and write whichever output files apply.
fn report_outcome(outcome: &GenerationOutcome, outputs: &OutputPaths<'_>) -> Result<RunStatus> {
    if let (Some(path), Some(continuation)) = (outputs.continuation, &outcome.continuation) {
        let json = serde_json::to_string_pretty(continuation)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write continuation to {:?}", path))?;
        info!(path = %path.display(), "continuation written");
    }

    if let (Some(path), Some(artifact)) = (outputs.artifact, &outcome.artifact) {
        if outcome.is_approved() {
            let document = artifact.render().context("Failed to render artifact")?;
            std::fs::write(path, document)
                .with_context(|| format!("Failed to write artifact to {:?}", path))?;
            info!(path = %path.display(), "artifact written");
        } else {
            info!(status = %outcome.status, "artifact not approved, nothing written");
        }
    }

    print_json(outcome)?;
    Ok(outcome.status)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs<'a>(continuation: Option<&'a Path>, artifact: Option<&'a Path>) -> OutputPaths<'a> {
        OutputPaths {
            continuation,
            artifact,
        }
    }

    #[tokio::test]
    async fn test_generate_writes_approved_artifact() {
        let temp_dir = tempfile::tempdir().unwrap();
        let artifact_path = temp_dir.path().join("agent.md");
        let pipeline = Pipeline::new(ForgeConfig::default());

        let status = cmd_generate(
            &pipeline,
            "Create an agent that formats Python code using Black",
            None,
            false,
            &outputs(None, Some(&artifact_path)),
        )
        .await
        .unwrap();

        assert_eq!(status, RunStatus::Approved);
        let written = std::fs::read_to_string(&artifact_path).unwrap();
        assert!(written.starts_with("+++\n"));
        assert!(written.contains("## Role"));

        // The written document passes standalone validation.
        let status = cmd_validate(&ForgeConfig::default(), &artifact_path).unwrap();
        assert_eq!(status, RunStatus::Approved);
    }

    #[tokio::test]
    async fn test_clarification_round_trips_through_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let continuation_path = temp_dir.path().join("continuation.json");
        let pipeline = Pipeline::new(ForgeConfig::default());

        let status = cmd_generate(
            &pipeline,
            "Create an agent for my project",
            None,
            false,
            &outputs(Some(&continuation_path), None),
        )
        .await
        .unwrap();
        assert_eq!(status, RunStatus::NeedsClarification);
        assert!(continuation_path.exists());

        // Backend domain (index 1), create capability (index 0).
        let status = cmd_resume(&pipeline, &continuation_path, &[1, 0], &outputs(None, None))
            .await
            .unwrap();
        assert_eq!(status, RunStatus::Approved);
        assert_eq!(exit_code(status), ExitCode::SUCCESS);
    }

    #[test]
    fn test_cancel_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("continuation.json");
        let continuation = serde_json::json!({
            "run_id": "4b7f3a52-0c1e-4d43-9a43-5f1c2b8f0d11",
            "request": { "raw_text": "Create an agent for my project", "context": null },
            "speed_critical": false,
            "signals": {},
            "rounds": 1,
            "questions": []
        });
        std::fs::write(&path, continuation.to_string()).unwrap();

        let pipeline = Pipeline::new(ForgeConfig::default());
        let status = cmd_cancel(&pipeline, &path).unwrap();
        assert_eq!(status, RunStatus::Rejected);
        assert_eq!(exit_code(status), ExitCode::from(EXIT_REJECTED));
    }

    #[test]
    fn test_validate_rejects_missing_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("agent.md");
        std::fs::write(
            &path,
            "+++\nexecution_tier = \"T1\"\npermission_set = [\"read\", \"search\"]\n+++\n\n## Role\n\nbody\n",
        )
        .unwrap();

        let status = cmd_validate(&ForgeConfig::default(), &path).unwrap();
        assert_eq!(status, RunStatus::Rejected);
    }

    #[test]
    fn test_missing_continuation_file_has_context() {
        let err = read_continuation(Path::new("/nonexistent/continuation.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read continuation"));
    }

    #[test]
    fn test_cli_parses_answers_list() {
        let cli = Cli::try_parse_from([
            "forge",
            "resume",
            "--continuation",
            "c.json",
            "--answers",
            "0,2",
        ])
        .unwrap();
        match cli.command {
            Commands::Resume { answers, .. } => assert_eq!(answers, vec![0, 2]),
            _ => panic!("expected resume"),
        }
    }
}
