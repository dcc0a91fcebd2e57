//! Scripted text generator for stage tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::llm::{LlmError, TextGenerator};

/// Replays canned replies in order, repeating the last one once exhausted.
/// `failing()` errors on every call.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    fail: bool,
    calls: AtomicUsize,
    last: Mutex<Option<(String, String, String)>>,
}

impl ScriptedGenerator {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            fail: false,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying(&[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(system, prompt, model)` of the most recent call
    pub fn last_request(&self) -> Option<(String, String, String)> {
        self.last.lock().expect("generator lock").clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, system: &str, prompt: &str, model: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().expect("generator lock") = Some((system.to_string(), prompt.to_string(), model.to_string()));

        if self.fail {
            return Err(LlmError::EmptyResponse);
        }

        let mut replies = self.replies.lock().expect("generator lock");
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        reply.ok_or(LlmError::EmptyResponse)
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}
