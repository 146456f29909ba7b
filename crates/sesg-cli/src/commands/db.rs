use anyhow::bail;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::DbCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DbResponse {
    path: String,
    tables: Vec<&'static str>,
}

/// Handle `sesg db`. Opening the context already applied the schema.
pub async fn handle(action: &DbCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let path = ctx.config.database.path.clone();
    match action {
        DbCommands::Init => output(
            &DbResponse {
                path,
                tables: sesg_db::TABLES.to_vec(),
            },
            flags.format,
        ),
        DbCommands::Drop { yes } => {
            if !yes {
                bail!("refusing to drop every table of '{path}' without --yes");
            }
            ctx.service.db().drop_all().await?;
            output(
                &DbResponse {
                    path,
                    tables: sesg_db::TABLES.to_vec(),
                },
                flags.format,
            )
        }
    }
}
