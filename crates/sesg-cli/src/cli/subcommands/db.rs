use clap::Subcommand;

#[derive(Clone, Debug, Subcommand)]
pub enum DbCommands {
    /// Create the schema (no-op when it exists).
    Init,
    /// Drop every table.
    Drop {
        /// Confirm the drop.
        #[arg(long)]
        yes: bool,
    },
}
