//! LLM Council - one question, many models, one verdict
//!
//! Fans a prompt out to a council of models under a concurrency cap,
//! then asks a judge model to weigh the answers.

mod app;
mod config;
mod error;
mod llm;
mod server;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ask the council once and print the result instead of serving HTTP
    #[arg(short, long)]
    prompt: Option<String>,

    /// Serve the council over HTTP, optionally on ADDR (the default when no prompt is given)
    #[arg(short, long, value_name = "ADDR", num_args = 0..=1, conflicts_with = "prompt")]
    serve: Option<Option<String>>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let app = App::new(args.config, args.serve.flatten())?;

    let result = match args.prompt {
        Some(prompt) => app.ask(&prompt).await,
        None => app.serve().await,
    };

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
        return Err(err);
    }

    Ok(())
}
