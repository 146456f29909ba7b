use clap::{Args, Subcommand};

#[derive(Clone, Debug, Subcommand)]
pub enum ExperimentCommands {
    /// Create the experiment if needed and formulate its search strings.
    Start(StartArgs),
    /// Run the pending search strings of an experiment against Scopus.
    Search(SearchArgs),
}

#[derive(Clone, Debug, Args)]
pub struct StartArgs {
    /// Review name.
    pub review: String,
    /// Experiment name.
    pub experiment: String,
    /// Topic family to sweep (lda, bertopic). Repeatable; defaults to both.
    #[arg(long)]
    pub topic_strategy: Vec<String>,
    /// Similar-word strategy (bert, llm). Repeatable; defaults to both.
    #[arg(long)]
    pub similar_word_strategy: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct SearchArgs {
    /// Experiment name.
    pub experiment: String,
    /// Also re-dispatch strings previously skipped by the remote.
    #[arg(long)]
    pub retry_skipped: bool,
}
