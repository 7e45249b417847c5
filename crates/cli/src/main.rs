use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{input, session};
use ml_core::config;
use ml_core::models::SearchResults;
use ml_core::MlService;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries JSON only.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    let service = MlService::from_config(&cfg)?;

    let outcome = run(&service, cli.command).await;
    service.shutdown().await;
    outcome
}

#[derive(Parser)]
#[command(name = "ml-service")]
#[command(about = "Semantic search, tagging and PII detection with a single resident model", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidates by semantic similarity to a query
    Search {
        /// Query text
        #[arg(short, long)]
        query: String,
        /// JSON array of {id, name, description?}; `-` reads stdin
        #[arg(long)]
        candidates: PathBuf,
        /// Minimum similarity (defaults to config)
        #[arg(long)]
        threshold: Option<f32>,
        /// Maximum number of results (defaults to config)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Embed text and print the vector with its dimensionality
    Embed {
        text: String,
    },
    /// Suggest category tags for a file
    Tags {
        filename: String,
        /// Optional content preview
        #[arg(long)]
        preview: Option<String>,
    },
    /// Detect PII in text
    Detect {
        text: Option<String>,
        /// Read text from file (`-` for stdin)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Detect and mask PII
    Redact {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Replacement character (defaults to config)
        #[arg(long = "char")]
        redaction_char: Option<char>,
    },
    /// Assess data sensitivity and recommend handling
    Assess {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Download any model artifacts missing from the cache
    FetchModels,
    /// Show loaded capability, counters and artifact presence
    Status,
    /// Serve newline-delimited JSON requests on stdin/stdout
    ServeStdio,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(service: &MlService, command: Commands) -> Result<()> {
    match command {
        Commands::Search {
            query,
            candidates,
            threshold,
            top_k,
        } => {
            let items = input::read_candidates(&candidates)?;
            let results = service.search(&query, &items, threshold, top_k).await?;
            print_json(&SearchResults::from(results))
        }
        Commands::Embed { text } => print_json(&service.embed(&text).await?),
        Commands::Tags { filename, preview } => print_json(
            &service
                .generate_file_tags(&filename, preview.as_deref())
                .await?,
        ),
        Commands::Detect { text, file } => {
            let text = input::read_text(text, file.as_deref())?;
            print_json(&service.detect(&text).await?)
        }
        Commands::Redact {
            text,
            file,
            redaction_char,
        } => {
            let text = input::read_text(text, file.as_deref())?;
            print_json(&service.redact(&text, redaction_char).await?)
        }
        Commands::Assess { text, file } => {
            let text = input::read_text(text, file.as_deref())?;
            print_json(&service.assess_sensitivity(&text).await?)
        }
        Commands::FetchModels => {
            info!("Fetching missing model artifacts...");
            print_json(&service.fetch_models().await?)
        }
        Commands::Status => print_json(&service.status().await),
        Commands::ServeStdio => {
            info!("Serving JSON lines on stdin/stdout");
            session::serve(
                service,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await
        }
    }
}
