//! PDF tools command-line client
//!
//! Merges, splits and converts files through a PDF tools server, applying
//! the same client-side limits as the web front end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use pdftools_cli::config::{self, Settings, DEFAULT_SERVER, SERVER_ENV};
use pdftools_cli::{HttpBackend, Runner};
use pdftools_core::{Event, FlowKind, SplitMode};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pdftools")]
#[command(version, about = "Merge, split and convert files with a PDF tools server")]
struct Args {
    /// Base URL of the processing server
    #[arg(long, env = SERVER_ENV, default_value = DEFAULT_SERVER)]
    server: String,

    /// Directory the results are written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// TOML file overriding limits, delays and timeouts
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge PDFs in the order given
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Split one PDF
    Split {
        file: PathBuf,

        /// all, pages or ranges. Inferred from --pages/--ranges when omitted.
        #[arg(long)]
        mode: Option<SplitMode>,

        /// Page numbers to extract, e.g. "1, 3, 5"
        #[arg(long, conflicts_with = "ranges")]
        pages: Option<String>,

        /// Page ranges to extract, e.g. "1-3, 7-9"
        #[arg(long)]
        ranges: Option<String>,
    },
    /// Combine images into one PDF
    ImagesToPdf {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Recompress one image
    Compress {
        image: PathBuf,

        /// JPEG quality, 1 to 100
        #[arg(short, long, default_value = "60")]
        quality: u8,
    },
}

impl Command {
    fn flow(&self) -> FlowKind {
        match self {
            Command::Merge { .. } => FlowKind::Merge,
            Command::Split { .. } => FlowKind::Split,
            Command::ImagesToPdf { .. } => FlowKind::ImagesToPdf,
            Command::Compress { .. } => FlowKind::CompressImage,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = config::load(args.config.as_deref())?;
    let settings = Settings::new(args.server, args.output).with_client(client);
    let flow = args.command.flow();

    info!("Using server {} for {}", settings.server, flow);

    let backend = Arc::new(HttpBackend::new(settings.server.clone()));
    let mut runner = Runner::new(flow, settings.client, backend, settings.output_dir);

    match args.command {
        Command::Merge { files } => runner.choose(&files).await?,
        Command::ImagesToPdf { images } => runner.choose(&images).await?,
        Command::Split {
            file,
            mode,
            pages,
            ranges,
        } => {
            runner.choose(std::slice::from_ref(&file)).await?;
            // Wait for the page count so it can be reported
            runner.settle().await?;
            if let Some(split) = runner.view().split {
                info!("{} has {} pages", file.display(), split.page_count_label);
            }

            let mode = mode.unwrap_or(match (&pages, &ranges) {
                (Some(_), _) => SplitMode::Pages,
                (None, Some(_)) => SplitMode::Ranges,
                (None, None) => SplitMode::All,
            });
            runner.dispatch(Event::SetSplitMode(mode)).await?;
            if let Some(pages) = pages {
                runner.dispatch(Event::SetPages(pages)).await?;
            }
            if let Some(ranges) = ranges {
                runner.dispatch(Event::SetRanges(ranges)).await?;
            }
        }
        Command::Compress { image, quality } => {
            runner.choose(std::slice::from_ref(&image)).await?;
            runner.dispatch(Event::SetQuality(quality)).await?;
        }
    }

    if let Some(alert) = runner.report().alerts.first() {
        bail!("{}", alert);
    }
    if runner.status().is_error() {
        bail!("{}", runner.status().message);
    }

    runner.dispatch(Event::Execute).await?;
    runner.settle().await?;

    let status = runner.status();
    if status.is_error() {
        bail!("{}", status.message);
    }

    for path in &runner.report().downloads {
        println!("{}", path.display());
    }
    if status.is_success() {
        info!("{}", status.message);
    }

    Ok(())
}
