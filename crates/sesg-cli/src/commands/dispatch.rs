use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Db { action } => commands::db::handle(&action, ctx, flags).await,
        Commands::Review { action } => commands::review::handle(&action, ctx, flags).await,
        Commands::Experiment { action } => commands::experiment::handle(&action, ctx, flags).await,
        Commands::Strings { action } => commands::strings::handle(&action, ctx, flags).await,
        Commands::Results { action } => commands::results::handle(&action, ctx, flags).await,
        Commands::Config { .. } => unreachable!("config is pre-dispatched in main"),
    }
}
