//! Service Doubles
//!
//! In-memory implementations of the reasoning and retrieval ports. None of
//! them touch the network; each records what it was asked so tests can assert
//! on prompts and call counts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use core_kernel::{DomainPort, PortError};
use domain_claims::{ReasoningPort, RetrievalPort};

/// Reasoning service returning scripted replies
///
/// Queued replies are consumed in order; once the queue is empty the fallback
/// reply is returned for every further call.
#[derive(Debug, Default)]
pub struct ScriptedReasoning {
    queue: Mutex<VecDeque<String>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedReasoning {
    /// Returns `reply` for every call
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            fallback: reply.into(),
            ..Self::default()
        }
    }

    /// Returns `replies` in order, then an empty string
    pub fn sequence<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Sets the reply used once the queue is drained
    pub fn then_always(mut self, reply: impl Into<String>) -> Self {
        self.fallback = reply.into();
        self
    }

    /// Prompts received so far, in call order
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

impl DomainPort for ScriptedReasoning {}

#[async_trait]
impl ReasoningPort for ScriptedReasoning {
    async fn complete(&self, prompt: &str) -> Result<String, PortError> {
        self.prompts.lock().await.push(prompt.to_string());
        let next = self.queue.lock().await.pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Reasoning service that is always down
#[derive(Debug, Default)]
pub struct FailingReasoning {
    calls: AtomicUsize,
}

impl FailingReasoning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DomainPort for FailingReasoning {}

#[async_trait]
impl ReasoningPort for FailingReasoning {
    async fn complete(&self, _prompt: &str) -> Result<String, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PortError::unavailable("reasoning"))
    }
}

/// Reasoning service that fails transiently a fixed number of times first
#[derive(Debug)]
pub struct FlakyReasoning {
    failures_left: AtomicUsize,
    calls: AtomicUsize,
    reply: String,
}

impl FlakyReasoning {
    pub fn new(failures: usize, reply: impl Into<String>) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
            reply: reply.into(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DomainPort for FlakyReasoning {}

#[async_trait]
impl ReasoningPort for FlakyReasoning {
    async fn complete(&self, _prompt: &str) -> Result<String, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PortError::connection("connection reset"));
        }
        Ok(self.reply.clone())
    }
}

/// Reasoning service that takes `delay` before replying
#[derive(Debug)]
pub struct SlowReasoning {
    delay: Duration,
    reply: String,
}

impl SlowReasoning {
    pub fn new(delay: Duration, reply: impl Into<String>) -> Self {
        Self {
            delay,
            reply: reply.into(),
        }
    }
}

impl DomainPort for SlowReasoning {}

#[async_trait]
impl ReasoningPort for SlowReasoning {
    async fn complete(&self, _prompt: &str) -> Result<String, PortError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}

/// Retrieval service returning the same passages for every query
#[derive(Debug, Default)]
pub struct StaticRetrieval {
    passages: Vec<String>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetrieval {
    pub fn new(passages: Vec<String>) -> Self {
        Self {
            passages,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far with their requested `k`
    pub async fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().await.clone()
    }
}

impl DomainPort for StaticRetrieval {}

#[async_trait]
impl RetrievalPort for StaticRetrieval {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, PortError> {
        self.queries.lock().await.push((query.to_string(), k));
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}

/// Retrieval service that is always down
#[derive(Debug, Default)]
pub struct FailingRetrieval;

impl DomainPort for FailingRetrieval {}

#[async_trait]
impl RetrievalPort for FailingRetrieval {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<String>, PortError> {
        Err(PortError::unavailable("retrieval"))
    }
}
