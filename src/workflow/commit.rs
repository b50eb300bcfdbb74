use tracing::{info, warn};

use crate::context::AppContext;
use crate::domain::diff::PreparedDiff;
use crate::domain::message::CommitMessage;
use crate::error::AppResult;

/// Exit code reported when there was nothing staged to describe.
pub const NOTHING_STAGED_EXIT_CODE: i32 = 3;

#[derive(Debug)]
pub enum CommitWorkflowOutcome {
    Committed {
        message: CommitMessage,
        git_output: String,
    },
    NothingStaged,
    Declined {
        message: CommitMessage,
    },
}

impl CommitWorkflowOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            CommitWorkflowOutcome::Committed { .. } | CommitWorkflowOutcome::Declined { .. } => 0,
            CommitWorkflowOutcome::NothingStaged => NOTHING_STAGED_EXIT_CODE,
        }
    }
}

/// Collect the staged diff, generate a message for it, and commit once confirmed.
pub async fn generate_and_commit(
    ctx: &AppContext,
    prefix: &str,
) -> AppResult<CommitWorkflowOutcome> {
    let diff = ctx
        .version_control
        .staged_diff(&ctx.config.excluded_paths)
        .await?;
    if diff.is_empty() {
        info!("no staged changes; skipping generation");
        return Ok(CommitWorkflowOutcome::NothingStaged);
    }

    let prepared = PreparedDiff::from_staged(
        &diff,
        ctx.config.max_diff_chars,
        ctx.config.oversized_diff,
    )?;
    if prepared.truncated {
        warn!(
            original_chars = prepared.original_chars,
            limit = ctx.config.max_diff_chars,
            "staged diff truncated before generation"
        );
    }

    let summary = ctx.language_model.summarize_diff(&prepared).await?;
    let message = CommitMessage::compose(prefix, &summary);

    if let Some(clipboard) = &ctx.clipboard {
        match clipboard.copy(message.as_str()).await {
            Ok(()) => println!("Commit message copied to clipboard."),
            Err(err) => warn!(error = %err, "could not copy commit message to clipboard"),
        }
    }

    if !ctx.prompt.confirm(&message).await? {
        info!("commit declined");
        return Ok(CommitWorkflowOutcome::Declined { message });
    }

    let git_output = ctx.version_control.commit(&message).await?;
    Ok(CommitWorkflowOutcome::Committed {
        message,
        git_output,
    })
}
