mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::sync::Arc;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cmd::commit::{self, CommitCommandArgs};
use crate::config::{AppConfig, ConfigOverrides};
use crate::context::AppContext;
use crate::domain::diff::OversizedDiffPolicy;
use crate::error::{AppError, AppResult};
use crate::infra::clipboard::SystemClipboard;
use crate::infra::git::GitCli;
use crate::infra::llm::OpenAiClient;
use crate::infra::terminal::TerminalPrompt;
use crate::services::{ClipboardService, LanguageModelService};
use crate::workflow::commit::CommitWorkflowOutcome;

const LOG_ENV_VAR: &str = "COMMITGEN_LOG";

#[derive(Parser)]
#[command(
    name = "commitgen",
    author,
    version,
    about = "Generate a commit message for the staged changes and commit it"
)]
struct Cli {
    /// Text placed before the generated message, e.g. "Fix:" or a ticket key.
    /// Several words are joined with spaces; pass "" for no prefix.
    #[arg(required = true, num_args = 1.., value_name = "PREFIX")]
    prefix: Vec<String>,

    /// Model used to generate the message.
    #[arg(long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Largest diff, in characters, sent for generation.
    #[arg(long, value_name = "CHARS")]
    max_diff_chars: Option<usize>,

    /// What to do with a diff over the size limit: truncate or reject.
    #[arg(long, value_name = "POLICY", value_parser = parse_policy)]
    oversized_diff: Option<OversizedDiffPolicy>,

    /// Path to leave out of the diff; repeat to list several. Replaces the defaults.
    #[arg(long = "exclude", value_name = "PATH")]
    exclude: Vec<String>,

    /// Do not copy the message to the clipboard.
    #[arg(long)]
    no_clipboard: bool,

    /// Commit without asking for confirmation.
    #[arg(short, long)]
    yes: bool,

    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_policy(value: &str) -> Result<OversizedDiffPolicy, String> {
    OversizedDiffPolicy::from_str(value)
        .ok_or_else(|| format!("expected 'truncate' or 'reject', got '{value}'"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();
    init_tracing(cli.verbose);
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded environment file");
    }

    let code = tokio::select! {
        result = run(cli) => match result {
            Ok(code) => code,
            Err(error) => {
                eprintln!("Error: {error}");
                error.exit_code()
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted.");
            AppError::Interrupted.exit_code()
        }
    };

    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,commitgen=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> AppResult<i32> {
    let cwd = std::env::current_dir()?;
    let config = AppConfig::load(&cwd)?.apply_overrides(ConfigOverrides {
        model: cli.model,
        api_base: cli.api_base,
        max_diff_chars: cli.max_diff_chars,
        oversized_diff: cli.oversized_diff,
        excluded_paths: cli.exclude,
    })?;
    debug!(?config, "resolved configuration");

    let language_model: Arc<dyn LanguageModelService> =
        Arc::new(OpenAiClient::from_config(&config)?);
    let git = Arc::new(GitCli::new(config.workspace_root.clone()));
    let clipboard: Option<Arc<dyn ClipboardService>> = if cli.no_clipboard {
        None
    } else {
        Some(Arc::new(SystemClipboard::detect()))
    };
    let prompt = Arc::new(TerminalPrompt::new(cli.yes));

    let context = AppContext::new(config, git, language_model, clipboard, prompt);

    let prefix = cli.prefix.join(" ");
    let outcome = commit::run(&context, CommitCommandArgs { prefix }).await?;

    match &outcome {
        CommitWorkflowOutcome::Committed {
            message,
            git_output,
        } => {
            debug!(%message, "commit created");
            if !git_output.is_empty() {
                println!("{git_output}");
            }
            println!("✓ Commit successfully made.");
        }
        CommitWorkflowOutcome::NothingStaged => {
            println!("No staged changes to commit. Stage files with `git add` first.");
        }
        CommitWorkflowOutcome::Declined { message } => {
            debug!(%message, "commit declined by user");
            println!("Commit cancelled.");
        }
    }

    Ok(outcome.exit_code())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn joins_prefix_words() {
        let cli = Cli::try_parse_from(["commitgen", "JIRA-12", "Fix:", "--no-clipboard"]).unwrap();
        assert_eq!(cli.prefix.join(" "), "JIRA-12 Fix:");
        assert!(cli.no_clipboard);
    }

    #[test]
    fn prefix_is_required() {
        assert!(Cli::try_parse_from(["commitgen"]).is_err());
    }

    #[test]
    fn empty_prefix_is_accepted() {
        let cli = Cli::try_parse_from(["commitgen", ""]).unwrap();
        assert_eq!(cli.prefix.join(" "), "");
    }

    #[test]
    fn parses_oversized_policy() {
        let cli = Cli::try_parse_from(["commitgen", "Fix:", "--oversized-diff", "reject"]).unwrap();
        assert_eq!(cli.oversized_diff, Some(OversizedDiffPolicy::Reject));
        assert!(Cli::try_parse_from(["commitgen", "Fix:", "--oversized-diff", "drop"]).is_err());
    }
}
