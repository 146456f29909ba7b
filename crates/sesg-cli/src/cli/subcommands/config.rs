use clap::Subcommand;

#[derive(Clone, Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration as TOML.
    Init {
        /// Write to the user-global file instead of the project file.
        #[arg(long)]
        global: bool,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration, API keys masked.
    Show,
}
