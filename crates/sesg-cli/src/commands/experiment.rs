use anyhow::Context;
use sesg_core::enums::{SimilarWordStrategy, TopicFamily};
use sesg_scopus::ScopusClient;
use sesg_sweep::coordinator::{SearchRequest, Termination, search_experiment};
use sesg_sweep::events::EventSink;
use sesg_sweep::generation::{GenerationRequest, Generator};
use sesg_sweep::providers::ExternalProviders;
use tokio::sync::mpsc::unbounded_channel;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{ExperimentCommands, SearchArgs, StartArgs};
use crate::commands::shared::parse::parse_enum_list;
use crate::context::AppContext;
use crate::exit::RunAborted;
use crate::output::output;
use crate::progress::{Progress, SearchProgress};

/// Handle `sesg experiment`.
pub async fn handle(action: &ExperimentCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        ExperimentCommands::Start(args) => start(args, ctx, flags).await,
        ExperimentCommands::Search(args) => search(args, ctx, flags).await,
    }
}

async fn start(args: &StartArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let families = parse_enum_list(&args.topic_strategy, "topic strategy", &TopicFamily::ALL)?;
    let strategies = parse_enum_list(
        &args.similar_word_strategy,
        "similar-word strategy",
        &SimilarWordStrategy::ALL,
    )?;
    ctx.config.validate()?;
    let providers = ExternalProviders::new(ctx.config.providers.clone())?;

    let spinner = Progress::spinner(&format!("formulating search strings for {}", args.experiment));
    let result = Generator::new(&ctx.service, &ctx.config, &providers)
        .run(&GenerationRequest {
            review_name: &args.review,
            experiment_name: &args.experiment,
            families: &families,
            strategies: &strategies,
        })
        .await;
    match &result {
        Ok(summary) => spinner.finish_ok(&format!(
            "{} strings created, {} reused",
            summary.strings_created, summary.strings_reused
        )),
        Err(_) => spinner.finish_err("generation failed"),
    }

    output(&result?, flags.format)
}

async fn search(args: &SearchArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.config.validate_for_search()?;
    let n_clients = usize::try_from(ctx.config.scopus.n_clients)?;
    let clients = (0..n_clients)
        .map(|_| ScopusClient::new(&ctx.config.scopus))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to build Scopus clients")?;

    let (sender, receiver) = unbounded_channel();
    let progress = tokio::spawn(SearchProgress::new(n_clients).drive(receiver));

    let request = SearchRequest {
        experiment_name: &args.experiment,
        retry_skipped: args.retry_skipped,
    };
    let result = search_experiment(&ctx.service, &ctx.config, clients, request, EventSink::new(sender)).await;
    // The coordinator, and with it the sender, is gone; the bars wind down.
    let tally = progress.await.context("progress task failed")?;
    tracing::debug!(?tally, "search events consumed");

    let report = result?;
    output(&report.to_summary(&args.experiment, n_clients), flags.format)?;
    match report.termination {
        Termination::Completed => Ok(()),
        Termination::Fatal(reason) => Err(RunAborted(reason).into()),
    }
}
