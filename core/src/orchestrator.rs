//! **Scatter/gather** execution of a check selection.
//!
//! Every selected check runs in its own task against the same target. Each
//! task reports back exactly once over a bounded channel, whatever the check
//! did (returned, failed or panicked), so the caller sees one [`CheckResult`]
//! per dispatched check, in completion order.

use std::any::Any;
use std::net::IpAddr;
use std::sync::Arc;

use checkip_common::check::registry::Registry;
use checkip_common::check::{Check, CheckResult, execute};
use checkip_common::error::{CheckError, SetupError};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info_span, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Dispatching,
    Collecting,
    Done,
}

impl RunState {
    fn follows(self, prev: RunState) -> bool {
        matches!(
            (prev, self),
            (RunState::Idle, RunState::Dispatching)
                | (RunState::Dispatching, RunState::Collecting)
                | (RunState::Collecting, RunState::Done)
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn received(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Whether every dispatched check reported back.
    pub fn is_complete(&self) -> bool {
        self.received() == self.dispatched
    }
}

pub struct Orchestrator {
    checks: Vec<Arc<dyn Check>>,
    state: RunState,
}

impl Orchestrator {
    pub fn new(checks: Vec<Arc<dyn Check>>) -> Result<Self, SetupError> {
        if checks.is_empty() {
            return Err(SetupError::NoChecks);
        }
        Ok(Self {
            checks,
            state: RunState::Idle,
        })
    }

    /// Selects `ids` from `registry`; an empty selection means every check.
    pub fn from_registry<S: AsRef<str>>(registry: &Registry, ids: &[S]) -> Result<Self, SetupError> {
        Self::new(registry.select(ids)?)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(next.follows(self.state), "{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs every check against `target`, handing each result to `on_result`
    /// as soon as it arrives.
    pub async fn run<F>(mut self, target: IpAddr, mut on_result: F) -> RunSummary
    where
        F: FnMut(CheckResult),
    {
        self.advance(RunState::Dispatching);

        let dispatched = self.checks.len();
        let (tx, mut rx) = mpsc::channel::<CheckResult>(dispatched);

        for check in self.checks.drain(..) {
            let tx = tx.clone();
            let span = info_span!("check", id = %check.id());
            tokio::spawn(
                async move {
                    debug!("dispatched");
                    let result = supervise(check, target).await;
                    if tx.send(result).await.is_err() {
                        debug!("collector gone, result dropped");
                    }
                }
                .instrument(span),
            );
        }
        // Only the tasks hold senders now, so the channel closes once they are all gone.
        drop(tx);

        self.advance(RunState::Collecting);

        let mut summary = RunSummary {
            dispatched,
            ..Default::default()
        };

        while summary.received() < dispatched {
            let Some(result) = rx.recv().await else {
                warn!(
                    "{} of {dispatched} checks never reported back",
                    dispatched - summary.received()
                );
                break;
            };

            if result.is_err() {
                summary.failed += 1;
            } else {
                summary.succeeded += 1;
            }
            on_result(result);
        }

        self.advance(RunState::Done);
        debug!(?summary, "run finished");
        summary
    }

    /// Runs every check and returns the results in completion order.
    pub async fn collect(self, target: IpAddr) -> (Vec<CheckResult>, RunSummary) {
        let mut results = Vec::with_capacity(self.len());
        let summary = self.run(target, |r| results.push(r)).await;
        (results, summary)
    }
}

/// Runs `check` in a task of its own so that a panic turns into an error
/// result instead of a missing one.
async fn supervise(check: Arc<dyn Check>, target: IpAddr) -> CheckResult {
    let name = check.name();
    let kind = check.kind();

    let task = tokio::spawn(
        async move { execute(check.as_ref(), target).await }.in_current_span(),
    );

    match task.await {
        Ok(result) => result,
        Err(e) => {
            let reason = if e.is_panic() {
                format!("panicked: {}", panic_message(e.into_panic()))
            } else {
                "cancelled".to_string()
            };
            warn!("{name} {reason}");
            CheckResult::new(name, kind).with_error(CheckError::Aborted(reason))
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
