use sesg_core::enums::{MetricColumn, TopicFamily};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ResultsCommands;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `sesg results`.
pub async fn handle(action: &ResultsCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        ResultsCommands::List {
            review,
            family,
            order_by,
            top,
        } => {
            let family = parse_enum::<TopicFamily>(family, "family")?;
            let order_by = parse_enum::<MetricColumn>(order_by, "order-by")?;
            let top = usize::try_from(top.unwrap_or(ctx.config.general.default_limit))?;
            let rows = ctx
                .service
                .results_for_review(review, family, order_by, Some(top))
                .await?;
            output(&rows, flags.format)
        }
        ResultsCommands::Qgs { review } => output(&ctx.service.qgs_for_review(review).await?, flags.format),
    }
}
