//! Scripted transport for exercising the council without a network

use anyhow::{anyhow, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::llm::provider::{ChatTransport, HttpReply};

/// JSON body of a successful chat completion
pub fn completion_body(text: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    })
    .to_string()
}

enum Scripted {
    Reply(u16, String),
    Error(String),
}

/// Replays queued replies per model and records every call.
///
/// Models with nothing queued answer `"<model> answer"`.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Scripted>>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, model: &str, scripted: Scripted) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(scripted);
        self
    }

    pub fn answer(self, model: &str, text: &str) -> Self {
        self.push(model, Scripted::Reply(200, completion_body(text)))
    }

    pub fn status(self, model: &str, status: u16) -> Self {
        self.push(model, Scripted::Reply(status, String::new()))
    }

    pub fn error(self, model: &str, message: &str) -> Self {
        self.push(model, Scripted::Error(message.to_string()))
    }

    pub fn delay(mut self, model: &str, delay: Duration) -> Self {
        self.delays.insert(model.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == model).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(&self, model: &str, prompt: &str) -> Result<HttpReply> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(model) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Scripted::Reply(status, body)) => Ok(HttpReply { status, body }),
            Some(Scripted::Error(message)) => Err(anyhow!(message)),
            None => Ok(HttpReply {
                status: 200,
                body: completion_body(&format!("{model} answer")),
            }),
        }
    }
}
