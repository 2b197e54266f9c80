//! Checks with scripted behaviour for driving the orchestrator.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use checkip_common::check::{Check, Info};
use checkip_common::error::CheckError;

#[derive(Debug)]
pub struct Seen {
    pub by: &'static str,
    pub target: IpAddr,
}

impl Info for Seen {
    fn summary(&self) -> String {
        format!("{} saw {}", self.by, self.target)
    }

    fn as_structured(&self) -> Result<serde_json::Value, serde_json::Error> {
        Ok(serde_json::json!({ "by": self.by, "target": self.target }))
    }
}

/// Info whose structured form cannot be produced.
#[derive(Debug)]
pub struct Unstructured;

impl Info for Unstructured {
    fn summary(&self) -> String {
        "plain text only".to_string()
    }

    fn as_structured(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str::<serde_json::Value>("{ not json")
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Outcome {
    Answer,
    Nothing,
    Fail,
    Panic,
    Unstructured,
}

pub struct FakeCheck {
    pub id: &'static str,
    pub delay: Duration,
    pub outcome: Outcome,
}

impl FakeCheck {
    pub fn new(id: &'static str, outcome: Outcome) -> Self {
        Self {
            id,
            delay: Duration::ZERO,
            outcome,
        }
    }

    /// Same check, finishing after a random delay of up to `max_millis`.
    pub fn jittered(id: &'static str, outcome: Outcome, max_millis: u64) -> Self {
        Self {
            id,
            delay: Duration::from_millis(rand::random_range(0..=max_millis)),
            outcome,
        }
    }

    pub fn delayed(id: &'static str, delay: Duration) -> Self {
        Self {
            id,
            delay,
            outcome: Outcome::Answer,
        }
    }

    pub fn shared(self) -> Arc<dyn Check> {
        Arc::new(self)
    }
}

#[async_trait]
impl Check for FakeCheck {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.id
    }

    async fn inspect(&self, target: IpAddr) -> Result<Option<Box<dyn Info>>, CheckError> {
        tokio::time::sleep(self.delay).await;
        match self.outcome {
            Outcome::Answer => Ok(Some(Box::new(Seen { by: self.id, target }))),
            Outcome::Nothing => Ok(None),
            Outcome::Fail => Err(CheckError::Lookup(format!("{} failed on purpose", self.id))),
            Outcome::Panic => panic!("{} panicked on purpose", self.id),
            Outcome::Unstructured => Ok(Some(Box::new(Unstructured))),
        }
    }
}
