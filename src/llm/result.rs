//! Per-model results and the council response

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Provider+model identifier, e.g. `deepseek/deepseek-r1:free`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Why a single provider call produced no answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// Non-success HTTP status, including a 429 that survived the retry
    #[error("HTTP Error {0}. Key/Quota issue.")]
    Status(u16),

    /// Network error, timeout or a body we could not read
    #[error("Error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(CallFailure),
}

/// One council member's answer to one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResult {
    pub model: ModelId,
    pub outcome: Outcome,
}

impl ModelResult {
    pub fn success(model: ModelId, text: impl Into<String>) -> Self {
        Self {
            model,
            outcome: Outcome::Success(text.into()),
        }
    }

    pub fn failure(model: ModelId, failure: CallFailure) -> Self {
        Self {
            model,
            outcome: Outcome::Failure(failure),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }

    /// Answer text, or the failure description when the call failed
    pub fn answer(&self) -> String {
        match &self.outcome {
            Outcome::Success(text) => text.clone(),
            Outcome::Failure(failure) => failure.to_string(),
        }
    }
}

impl Serialize for ModelResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModelResult", 2)?;
        state.serialize_field("model", &self.model)?;
        state.serialize_field("answer", &self.answer())?;
        state.end()
    }
}

/// Everything one council session produces
#[derive(Debug, Clone, Serialize)]
pub struct CouncilResponse {
    pub individual_responses: Vec<ModelResult>,
    pub council_verdict: String,
}

impl CouncilResponse {
    pub fn failed_count(&self) -> usize {
        self.individual_responses
            .iter()
            .filter(|r| r.is_failure())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failure_text() {
        assert_eq!(
            CallFailure::Status(500).to_string(),
            "HTTP Error 500. Key/Quota issue."
        );
        assert_eq!(
            CallFailure::Transport("operation timed out".to_string()).to_string(),
            "Error: operation timed out"
        );
    }

    #[test]
    fn test_failed_flag_is_structural() {
        // An answer that merely mentions an error is still a success
        let ok = ModelResult::success("m1".into(), "Error handling in Rust uses Result");
        assert!(!ok.is_failure());

        let failed = ModelResult::failure("m2".into(), CallFailure::Status(401));
        assert!(failed.is_failure());
        assert_eq!(failed.answer(), "HTTP Error 401. Key/Quota issue.");
    }

    #[test]
    fn test_response_wire_shape() {
        let response = CouncilResponse {
            individual_responses: vec![
                ModelResult::success("m1".into(), "A"),
                ModelResult::failure("m2".into(), CallFailure::Status(500)),
            ],
            council_verdict: "A wins".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "individual_responses": [
                    {"model": "m1", "answer": "A"},
                    {"model": "m2", "answer": "HTTP Error 500. Key/Quota issue."}
                ],
                "council_verdict": "A wins"
            })
        );
        assert_eq!(response.failed_count(), 1);
    }
}
