use clap::Subcommand;

#[derive(Clone, Debug, Subcommand)]
pub enum ResultsCommands {
    /// Parameter sets of a review joined with their performance.
    List {
        #[arg(long)]
        review: String,
        /// lda or bertopic
        #[arg(long)]
        family: String,
        /// precision, recall, f1, bsb_recall, sb_recall
        #[arg(long, default_value = "f1")]
        order_by: String,
        /// Keep the best N rows (defaults to general.default_limit).
        #[arg(long)]
        top: Option<u32>,
    },
    /// QGS studies of every experiment of a review.
    Qgs {
        #[arg(long)]
        review: String,
    },
}
