use std::path::PathBuf;

use clap::Subcommand;

#[derive(Clone, Debug, Subcommand)]
pub enum ReviewCommands {
    /// Import a review, its studies, and their references from JSON.
    Import { path: PathBuf },
    /// Show gold-standard size and citation-edge count.
    Show { name: String },
}
