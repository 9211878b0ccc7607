use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use cotizador::{GeneratedContent, GenerationContext, GenerationTask, Orchestrator, server};

#[derive(Parser)]
#[command(name = "cotizador")]
#[command(author, version, about = "AI generation pipeline for legal quotation services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8787")]
        port: u16,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run one generation task and print the result
    Generate {
        /// Task name (payment_text, requirements_list, quote_short,
        /// quote_detailed, quote_requirements_suggestions,
        /// needs_suggestions, time_suggestions, market_estimate)
        #[arg(short, long)]
        task: String,

        /// JSON file with the generation context
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// Output file for the result (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            port,
            verbose,
        } => {
            setup_logging(verbose);
            let orchestrator = Orchestrator::from_env()?;
            server::serve(&bind, port, Arc::new(orchestrator)).await
        }
        Commands::Generate {
            task,
            context,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            generate(&task, context, output).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn generate(task: &str, context: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let task = GenerationTask::from_str(task).map_err(|err| anyhow!(err))?;
    let ctx = match context {
        Some(path) => parse_context_file(&path)?,
        None => GenerationContext::default(),
    };

    let orchestrator = Orchestrator::from_env()?;
    let report = orchestrator.run(task, &ctx).await?;

    if report.substituted_defaults {
        info!("Result uses substituted default content");
    } else if report.used_fallback_parse {
        info!("Result came through the fallback parser");
    }

    let rendered = serde_json::to_string_pretty(&content_to_json(report.content))?;
    match output {
        Some(path) => {
            fs::write(&path, rendered).with_context(|| format!("Failed to write {path:?}"))?;
            info!("Result written to {:?}", path);
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

/// Read a generation context from a JSON file
fn parse_context_file(path: &Path) -> Result<GenerationContext> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid context JSON in {path:?}"))
}

fn content_to_json(content: GeneratedContent) -> serde_json::Value {
    match content {
        GeneratedContent::Text(text) => json!({ "contenido": text }),
        GeneratedContent::List(items) => json!({ "items": items }),
        GeneratedContent::Estimate(result) => json!({
            "refinedQuery": result.refined_query,
            "estimate": result.estimate,
        }),
    }
}
