use sesg_scopus::{CredentialPool, ScopusClient};
use sesg_sweep::coordinator::SearchSettings;
use sesg_sweep::revalidation::Revalidator;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::StringsCommands;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `sesg strings`.
pub async fn handle(action: &StringsCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        StringsCommands::FixInvalid { experiment } => {
            ctx.config.validate_for_search()?;
            let experiment_id = match experiment {
                Some(name) => Some(ctx.service.get_experiment_by_name(name).await?.id),
                None => None,
            };
            let pool = CredentialPool::new(ctx.config.scopus.usable_keys())?;
            let client = ScopusClient::new(&ctx.config.scopus)?;
            let settings = SearchSettings::from_config(&ctx.config.scopus);

            let spinner = Progress::spinner("re-checking suspicious performances");
            let result = Revalidator::new(client, &pool, &ctx.service, settings)
                .fix_invalid(experiment_id.as_deref())
                .await;
            spinner.finish_clear();

            output(&result?, flags.format)
        }
    }
}
