mod cli;
mod shutdown;
mod telemetry;

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use embed_service::EmbeddingService;
use embed_service::config::default_config::config_from_env;
use ingest_store::{
    IndicatifProgress, Ingestor, NoopProgress, Progress, QdrantIndex, RemoteEmbedder, read_records,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::Cli;

/// Exit status of a run stopped by Ctrl+C.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env.local first so it wins over .env; neither overrides the real environment.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let bar = std::io::stderr()
        .is_terminal()
        .then(|| IndicatifProgress::bar(0));
    telemetry::init(cli.verbose, bar.as_ref().map(IndicatifProgress::handle));

    let mut emb_cfg = config_from_env().context("embedding service configuration")?;
    emb_cfg.timeout_secs = Some(cli.embed_timeout_secs);
    let ingest_cfg = cli.ingest_config(emb_cfg.dim)?;
    let qdrant_cfg = cli.qdrant_config()?;

    info!(
        input = %cli.input.display(),
        provider = %emb_cfg.provider,
        model = %emb_cfg.model,
        collection = %qdrant_cfg.collection,
        batch_size = ingest_cfg.batch_size,
        concurrency = ingest_cfg.concurrency,
        "starting ingestion"
    );

    let input = cli.input.clone();
    let records = tokio::task::spawn_blocking(move || read_records(&input))
        .await?
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let svc = Arc::new(EmbeddingService::new(emb_cfg)?);
    let provider = Arc::new(RemoteEmbedder::new(svc));
    let index = Arc::new(QdrantIndex::new(&qdrant_cfg)?);
    let ingestor = Ingestor::new(ingest_cfg, provider, index);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if shutdown::forward_interrupts(shutdown::ctrl_c, on_signal).await {
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
    });

    let progress: Box<dyn Progress> = match bar {
        Some(bar) => Box::new(bar),
        None => Box::new(NoopProgress),
    };

    let summary = ingestor
        .run(&records, &cancel, progress.as_ref())
        .await
        .context("ingestion aborted")?;

    println!("{summary}");
    if summary.interrupted {
        println!("{}", "Interrupted: rerun to continue.".yellow().bold());
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    if summary.batches_failed > 0 || summary.dropped_embedding > 0 {
        println!(
            "{}",
            format!(
                "Completed with {} failed batches and {} failed embeddings.",
                summary.batches_failed, summary.dropped_embedding
            )
            .yellow()
        );
    } else {
        println!("{}", "All records ingested.".green().bold());
    }
    Ok(ExitCode::SUCCESS)
}
