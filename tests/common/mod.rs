//! Shared test doubles: a scripted transport and delay implementations.
#![allow(dead_code)]

use async_trait::async_trait;
use ordis::{ChatMessage, Delay, ExtractError, Result, Transport};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted transport outcome.
#[allow(dead_code)]
pub enum Step {
    NetworkFail,
    RateLimited(Option<Duration>),
    Auth(String),
    Content(String),
}

/// Transport that replays a fixed outcome sequence and counts calls.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicU32,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted transport ran out of steps");
        match step {
            Step::NetworkFail => Err(ExtractError::Network("connection refused".into())),
            Step::RateLimited(retry_after) => Err(ExtractError::RateLimited {
                message: "Rate limit exceeded".into(),
                retry_after,
            }),
            Step::Auth(message) => Err(ExtractError::Auth(message)),
            Step::Content(content) => Ok(content),
        }
    }
}

/// A well-formed model response for a single `name` field.
pub fn success_content(name: &str) -> String {
    json!({
        "data": { "name": name },
        "confidence": 95,
        "confidenceByField": { "name": 95 }
    })
    .to_string()
}

/// Delay that returns immediately, keeping retry tests fast.
pub struct InstantDelay;

#[async_trait]
impl Delay for InstantDelay {
    async fn sleep(&self, _duration: Duration) {}
}

/// Delay that records what it was asked to wait without waiting.
pub struct RecordingDelay {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            delays: Mutex::new(Vec::new()),
        })
    }

    #[allow(dead_code)]
    pub fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
