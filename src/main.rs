//! # sitearchive CLI
//!
//! Command-line front end for the archive pipeline.
//!
//! - `archive`: resolve the sitemap, then fetch, clean and persist every
//!   in-scope page as HTML and PDF
//! - `urls`: resolve the sitemap and print each page URL with its bucket,
//!   without fetching pages or writing files
//!
//! The configuration file path comes from `--config` or the `CONFIG_FILE`
//! environment variable.

mod telemetry;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sitearchive::archive::{
    ArchivePipeline, ArchiveProgress, HttpFetcher, WkhtmltopdfRenderer,
};
use sitearchive::config::{ArchiveConfig, CONFIG_FILE_ENV};
use tokio::sync::mpsc;
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Archive a website's sitemap as cataloged HTML and PDF snapshots", long_about = None)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch, sanitize and persist every in-scope page
    Archive(ArchiveArgs),

    /// List resolved page URLs and their buckets without fetching pages
    Urls(UrlsArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Configuration file (JSON)
    #[arg(short, long, env = CONFIG_FILE_ENV)]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct ArchiveArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Override the number of page fetches in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write HTML only, skip PDF rendering
    #[arg(long)]
    no_pdf: bool,
}

#[derive(Args, Debug)]
struct UrlsArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _telemetry = telemetry::init_tracing_subscriber(cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Archive(args)) => {
            archive_command(args).await?;
        }
        Some(Commands::Urls(args)) => {
            urls_command(args).await?;
        }
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["sitearchive", "--help"]);
        }
    }

    Ok(())
}

#[instrument]
async fn archive_command(args: ArchiveArgs) -> anyhow::Result<()> {
    let mut config = ArchiveConfig::load(&args.config.config).await?;
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.no_pdf {
        config.render_pdf = false;
    }
    config.validate()?;

    println!("Archiving {} into {}", config.sitemap_url, config.save_dir_root.display());

    let fetcher = HttpFetcher::new(&config)?;
    let renderer = WkhtmltopdfRenderer::new(&config.renderer);

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::channel(100);

    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(event) = progress_receiver.recv().await {
                match event {
                    ArchiveProgress::LeafResolved { sitemap, pages } => {
                        progress_bar.inc_length(pages as u64);
                        progress_bar.set_message(format!("Resolved {}", sitemap));
                    }
                    ArchiveProgress::PageArchived { url } => {
                        progress_bar.inc(1);
                        progress_bar.set_message(url);
                    }
                    ArchiveProgress::PageSkipped { .. } => progress_bar.inc(1),
                    ArchiveProgress::PageFailed { url } => {
                        progress_bar.inc(1);
                        progress_bar.set_message(format!("Failed {}", url));
                    }
                }
            }
            progress_bar.finish_and_clear();
        }
    });

    let start_time = std::time::Instant::now();
    let pipeline =
        ArchivePipeline::new(&config, fetcher, renderer)?.with_progress(progress_sender);
    let result = pipeline.run().await;

    // Dropping the pipeline closes the progress channel
    drop(pipeline);
    let _ = progress_handle.await;

    let summary = result?;
    println!(
        "Archived {} of {} pages from {} sitemaps in {:.2?}",
        summary.archived,
        summary.pages_found,
        summary.leaf_sitemaps,
        start_time.elapsed()
    );
    println!(
        "Skipped {} out-of-scope pages, {} fetch failures, {} PDF failures",
        summary.skipped, summary.fetch_failures, summary.render_failures
    );

    Ok(())
}

#[instrument]
async fn urls_command(args: UrlsArgs) -> anyhow::Result<()> {
    let config = ArchiveConfig::load(&args.config.config).await?;
    let fetcher = HttpFetcher::new(&config)?;
    let renderer = WkhtmltopdfRenderer::new(&config.renderer);

    let planned = ArchivePipeline::new(&config, fetcher, renderer)?.plan().await?;

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&planned)?);
        }
        _ => {
            let in_scope = planned.iter().filter(|page| page.bucket.is_some()).count();
            for page in &planned {
                match &page.bucket {
                    Some(bucket) if bucket.is_empty() => println!("{}\t/\t{}", page.url, page.filename),
                    Some(bucket) => println!("{}\t{}\t{}", page.url, bucket, page.filename),
                    None => println!("{}\tskip", page.url),
                }
            }
            println!("{} URLs, {} in scope", planned.len(), in_scope);
        }
    }

    Ok(())
}
