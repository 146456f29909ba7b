use anyhow::Context;
use sesg_db::repos::review::ReviewImport;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ReviewCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sesg review`.
pub async fn handle(action: &ReviewCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        ReviewCommands::Import { path } => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let import: ReviewImport = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a valid review file", path.display()))?;
            let summary = ctx.service.import_review(&import).await?;
            output(&summary, flags.format)
        }
        ReviewCommands::Show { name } => output(&ctx.service.review_summary(name).await?, flags.format),
    }
}
