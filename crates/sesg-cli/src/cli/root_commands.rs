use clap::Subcommand;

use crate::cli::subcommands::{
    ConfigCommands, DbCommands, ExperimentCommands, ResultsCommands, ReviewCommands,
    StringsCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Configuration file management.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },
    /// Reviews and their gold standard.
    Review {
        #[command(subcommand)]
        action: ReviewCommands,
    },
    /// Experiment generation and search runs.
    Experiment {
        #[command(subcommand)]
        action: ExperimentCommands,
    },
    /// Search string maintenance.
    Strings {
        #[command(subcommand)]
        action: StringsCommands,
    },
    /// Read-only reports.
    Results {
        #[command(subcommand)]
        action: ResultsCommands,
    },
}
