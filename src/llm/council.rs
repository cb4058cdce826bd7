//! LLM Council - fan-out to every member, then a judge delivers the verdict

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{CouncilError, Result};
use crate::llm::dispatch::Dispatcher;
use crate::llm::provider::{ChatTransport, ModelClient, OpenRouterTransport};
use crate::llm::result::{CouncilResponse, ModelId, ModelResult, Outcome};

/// Verdict returned when no member produced a usable answer
pub const STARVATION_VERDICT: &str = "The Council failed to retrieve valid answers to judge.";

const JUDGE_INSTRUCTIONS: &str = "You are the Head Councilor. Analyze the answers above. \
1. Pick the best answer. 2. Explain why. 3. Synthesize the final perfect answer for the user.";

/// Where a council session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Dispatching,
    Dispatched,
    Judging,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Received => "received",
            Phase::Dispatching => "dispatching",
            Phase::Dispatched => "dispatched",
            Phase::Judging => "judging",
            Phase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Council of models that answer a prompt and a judge that weighs them
pub struct Council {
    client: ModelClient,
    dispatcher: Dispatcher,
    members: Vec<ModelId>,
    judge: ModelId,
    judge_cooldown: Duration,
}

impl Council {
    /// Build a council talking to the configured provider
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| CouncilError::MissingApiKey(config.provider.api_key.clone()))?;
        let transport = OpenRouterTransport::new(config.provider.clone(), api_key)?;
        Self::new(config, Arc::new(transport))
    }

    pub fn new(config: &Config, transport: Arc<dyn ChatTransport>) -> Result<Self> {
        config.validate()?;

        let limit = NonZeroUsize::new(config.council.max_concurrent_requests)
            .ok_or(CouncilError::InvalidConcurrency)?;
        let client = ModelClient::new(transport, config.council.rate_limit_backoff());

        Ok(Self {
            dispatcher: Dispatcher::new(client.clone(), limit),
            client,
            members: config
                .council
                .members
                .iter()
                .map(|m| ModelId::new(m.as_str()))
                .collect(),
            judge: ModelId::new(config.council.judge.as_str()),
            judge_cooldown: config.council.judge_cooldown(),
        })
    }

    pub fn members(&self) -> &[ModelId] {
        &self.members
    }

    pub fn judge_model(&self) -> &ModelId {
        &self.judge
    }

    /// Ask every member, then have the judge weigh the answers
    pub async fn convene(&self, prompt: &str) -> CouncilResponse {
        self.enter(Phase::Received);

        self.enter(Phase::Dispatching);
        let results = self.dispatcher.dispatch_all(prompt, &self.members).await;
        self.enter(Phase::Dispatched);

        let verdict = self.judge(prompt, &results).await;
        self.enter(Phase::Completed);

        CouncilResponse {
            individual_responses: results,
            council_verdict: verdict,
        }
    }

    /// Synthesize a verdict from the members' results.
    ///
    /// Only successful answers count towards quorum, but the judge sees
    /// every result, failures included.
    pub async fn judge(&self, prompt: &str, results: &[ModelResult]) -> String {
        let valid = results.iter().filter(|r| !r.is_failure()).count();
        if valid == 0 {
            warn!(members = results.len(), "no valid answers, skipping judge");
            return STARVATION_VERDICT.to_string();
        }

        tokio::time::sleep(self.judge_cooldown).await;

        self.enter(Phase::Judging);
        info!(judge = %self.judge, valid, total = results.len(), "asking judge");

        let context = build_context(prompt, results);
        let decision = self.client.fetch(&self.judge, &context).await;

        match decision.outcome {
            Outcome::Success(verdict) => verdict,
            Outcome::Failure(failure) => {
                warn!(judge = %self.judge, error = %failure, "judge call failed");
                failure.to_string()
            }
        }
    }

    fn enter(&self, phase: Phase) {
        info!(phase = %phase, "council session");
    }
}

/// Prompt shown to the judge: the question, every answer, then instructions
pub fn build_context(prompt: &str, results: &[ModelResult]) -> String {
    let mut context = format!("User Question: {prompt}\n\n");
    for result in results {
        context.push_str(&format!(
            "Model {} said:\n{}\n\n",
            result.model,
            result.answer()
        ));
    }
    context.push_str(JUDGE_INSTRUCTIONS);
    context
}
