use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::commit::{CommitWorkflowOutcome, generate_and_commit};

#[derive(Debug, Clone)]
pub struct CommitCommandArgs {
    pub prefix: String,
}

pub async fn run(ctx: &AppContext, args: CommitCommandArgs) -> AppResult<CommitWorkflowOutcome> {
    generate_and_commit(ctx, &args.prefix).await
}
