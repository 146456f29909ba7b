use clap::Subcommand;

#[derive(Clone, Debug, Subcommand)]
pub enum StringsCommands {
    /// Re-query strings with zero results or zero precision and flag the
    /// performances of those the remote now rejects.
    FixInvalid {
        /// Only strings of this experiment.
        #[arg(long)]
        experiment: Option<String>,
    },
}
