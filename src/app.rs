//! Application wiring: config in, council out

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::llm::{Council, CouncilResponse};
use crate::server;

/// Application state
pub struct App {
    /// Configuration
    pub config: Config,

    /// Council shared with request handlers
    pub council: Arc<Council>,
}

impl App {
    pub fn new(config_path: Option<String>, bind: Option<String>) -> Result<Self> {
        let mut config = Config::load(config_path.as_deref())?;
        if let Some(bind) = bind {
            config.server.bind = bind;
        }
        let council = Arc::new(Council::from_config(&config)?);
        info!(
            members = council.members().len(),
            judge = %council.judge_model(),
            concurrency = config.council.max_concurrent_requests,
            "council ready"
        );

        Ok(Self { config, council })
    }

    /// Put one prompt before the council and print the outcome
    pub async fn ask(&self, prompt: &str) -> Result<()> {
        let response = self.council.convene(prompt).await;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if atty::is(atty::Stream::Stdout) {
            write_report(&mut out, &response)?;
        } else {
            serde_json::to_writer_pretty(&mut out, &response)?;
            writeln!(out)?;
        }
        Ok(())
    }

    pub async fn serve(&self) -> Result<()> {
        server::serve(Arc::clone(&self.council), &self.config.server).await
    }
}

/// Human-readable rendering for terminals
fn write_report(out: &mut impl Write, response: &CouncilResponse) -> Result<()> {
    for result in &response.individual_responses {
        let marker = if result.is_failure() { "✗" } else { "✓" };
        writeln!(out, "{marker} {}", result.model)?;
        writeln!(out, "{}\n", result.answer().trim_end())?;
    }

    writeln!(
        out,
        "=== Council verdict ({} of {} members answered) ===",
        response.individual_responses.len() - response.failed_count(),
        response.individual_responses.len()
    )?;
    writeln!(out, "{}", response.council_verdict.trim_end())?;
    Ok(())
}
