//! Lifecycle controller
//!
//! Drives one resource from its initiating call to a terminal state.
//!
//! ```text
//! Initiating ──ok, no poll policy──────────────▶ Succeeded
//!     │ ok + handle
//!     ▼
//! Polling{attempt} ──SUCCESS_TERMINAL──────────▶ Succeeded
//!     │   ▲         ──FAILURE_TERMINAL / error──▶ Failed
//!     └───┘ pending: wait next_delay(attempt)
//!           ceiling or deadline reached ───────▶ Failed
//! ```
//!
//! The polling loop is iterative: [`LifecycleController::step`] performs one
//! transition and tells the caller how long to wait before the next one.

use crate::error::{ProvisionError, Result};
use crate::gateway::{BackendGateway, Handle, Outputs};
use crate::profile::{BackendProfile, StateClass};
use std::time::Duration;
use tokio::time::Instant;

/// Current state of the lifecycle
#[derive(Debug)]
pub enum Phase {
    Initiating,
    Polling {
        handle: Handle,
        attempt: u32,
        last_state: Option<String>,
    },
    Succeeded(Provisioned),
    Failed(ProvisionError),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded(_) | Phase::Failed(_))
    }
}

/// What the caller should do after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Step again right away
    Advance,
    /// Sleep this long, then step again
    Wait(Duration),
    /// Terminal state reached
    Finished,
}

/// A resource that reached its success state
#[derive(Debug, Clone, Default)]
pub struct Provisioned {
    /// Backend identifier, absent for lookups that own no resource
    pub handle: Option<Handle>,

    /// Initiation outputs merged with those of the final observation
    pub outputs: Outputs,

    /// Number of `describe` calls made
    pub describe_calls: u32,
}

/// Drives a single resource through [`Phase`]
pub struct LifecycleController<'a> {
    gateway: &'a dyn BackendGateway,
    profile: BackendProfile,
    properties: Outputs,
    phase: Phase,
    outputs: Outputs,
    describe_calls: u32,
    polling_since: Option<Instant>,
}

impl<'a> LifecycleController<'a> {
    pub fn new(gateway: &'a dyn BackendGateway, profile: BackendProfile, properties: Outputs) -> Self {
        Self {
            gateway,
            profile,
            properties,
            phase: Phase::Initiating,
            outputs: Outputs::new(),
            describe_calls: 0,
            polling_since: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn describe_calls(&self) -> u32 {
        self.describe_calls
    }

    /// Perform one transition
    pub async fn step(&mut self) -> Step {
        let (next, wait) = match &self.phase {
            Phase::Initiating => (self.initiate().await, None),
            Phase::Polling {
                handle, attempt, ..
            } => {
                let (handle, attempt) = (handle.clone(), *attempt);
                self.poll(handle, attempt).await
            }
            Phase::Succeeded(_) | Phase::Failed(_) => return Step::Finished,
        };
        self.phase = next;

        if self.phase.is_terminal() {
            Step::Finished
        } else if let Some(delay) = wait {
            Step::Wait(delay)
        } else {
            Step::Advance
        }
    }

    /// Run to a terminal state, sleeping between polls
    pub async fn run(mut self) -> Result<Provisioned> {
        loop {
            match self.step().await {
                Step::Advance => {}
                Step::Wait(delay) => tokio::time::sleep(delay).await,
                Step::Finished => break,
            }
        }
        self.finish()
    }

    /// Consume the controller and return its terminal outcome
    pub fn finish(self) -> Result<Provisioned> {
        match self.phase {
            Phase::Succeeded(provisioned) => Ok(provisioned),
            Phase::Failed(error) => Err(error),
            Phase::Initiating | Phase::Polling { .. } => Err(ProvisionError::InvalidConfig(
                "lifecycle finished before reaching a terminal state".to_string(),
            )),
        }
    }

    async fn initiate(&mut self) -> Phase {
        let backend = self.gateway.name().to_string();
        tracing::info!(backend = %backend, "Initiating resource");

        let initiated = match self.gateway.initiate(&self.properties).await {
            Ok(initiated) => initiated,
            Err(e) => {
                tracing::warn!(backend = %backend, error = %e, "Initiation failed");
                return Phase::Failed(ProvisionError::Initiation(e.to_string()));
            }
        };
        self.outputs = initiated.outputs;

        if self.profile.poll.is_none() {
            tracing::info!(backend = %backend, "Backend is synchronous, resource ready");
            return Phase::Succeeded(Provisioned {
                handle: initiated.handle,
                outputs: std::mem::take(&mut self.outputs),
                describe_calls: 0,
            });
        }

        match initiated.handle {
            Some(handle) => {
                tracing::info!(backend = %backend, handle = %handle, "Polling for readiness");
                self.polling_since = Some(Instant::now());
                Phase::Polling {
                    handle,
                    attempt: 0,
                    last_state: None,
                }
            }
            None => Phase::Failed(ProvisionError::MissingHandle),
        }
    }

    async fn poll(&mut self, handle: Handle, attempt: u32) -> (Phase, Option<Duration>) {
        let Some(policy) = self.profile.poll else {
            return (
                Phase::Failed(ProvisionError::InvalidConfig(format!(
                    "profile {} has no poll policy",
                    self.profile.kind
                ))),
                None,
            );
        };

        if policy.should_abort(attempt) {
            return (self.timed_out(), None);
        }

        let observation = match self.gateway.describe(&handle).await {
            Ok(observation) => observation,
            Err(e) => {
                tracing::warn!(handle = %handle, attempt, error = %e, "Status query failed");
                return (Phase::Failed(ProvisionError::StatusQuery(e.to_string())), None);
            }
        };
        self.describe_calls += 1;

        tracing::debug!(
            handle = %handle,
            attempt,
            state = %observation.state,
            "Observed backend state"
        );

        match self.profile.classify(&observation.state) {
            StateClass::SuccessTerminal => {
                tracing::info!(handle = %handle, state = %observation.state, "Resource ready");
                let mut outputs = std::mem::take(&mut self.outputs);
                outputs.extend(observation.outputs);
                (
                    Phase::Succeeded(Provisioned {
                        handle: Some(handle),
                        outputs,
                        describe_calls: self.describe_calls,
                    }),
                    None,
                )
            }
            StateClass::FailureTerminal => {
                let detail = observation
                    .detail
                    .unwrap_or_else(|| "no detail reported".to_string());
                tracing::warn!(handle = %handle, state = %observation.state, detail = %detail, "Resource failed");
                (
                    Phase::Failed(ProvisionError::TerminalFailure {
                        state: observation.state,
                        detail,
                    }),
                    None,
                )
            }
            StateClass::Pending => {
                let delay = policy.next_delay(attempt);
                let elapsed = self
                    .polling_since
                    .map(|since| since.elapsed())
                    .unwrap_or_default();
                if policy.overruns_deadline(elapsed, delay) {
                    tracing::warn!(handle = %handle, ?elapsed, "Polling deadline reached");
                    return (Phase::Failed(ProvisionError::DeadlineExceeded { elapsed }), None);
                }

                (
                    Phase::Polling {
                        handle,
                        attempt: attempt + 1,
                        last_state: Some(observation.state),
                    },
                    Some(delay),
                )
            }
        }
    }

    fn timed_out(&self) -> Phase {
        let last_state = match &self.phase {
            Phase::Polling {
                last_state: Some(state),
                ..
            } => state.clone(),
            _ => "unknown".to_string(),
        };
        tracing::warn!(
            attempts = self.describe_calls,
            last_state = %last_state,
            "Attempt ceiling reached"
        );
        Phase::Failed(ProvisionError::PollTimeout {
            attempts: self.describe_calls,
            last_state,
        })
    }
}
