//! hookflow core
//!
//! Asynchronous provisioning lifecycle for deployment custom resources.
//! A deployment orchestrator sends an event, the backend is driven from its
//! initiating call to a terminal state, and exactly one completion response
//! goes back to the orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │             deployment event (JSON)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 hookflow-core                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │ ResourceHandler  (classify: create/delete)│   │
//! │  └───────┬──────────────────────────┬───────┘   │
//! │  ┌───────▼──────────┐  ┌────────────▼───────┐   │
//! │  │LifecycleController│  │ CompletionReporter │   │
//! │  │  + PollPolicy     │  │  (single PUT)      │   │
//! │  └───────┬──────────┘  └────────────────────┘   │
//! │  ┌───────▼──────────────────────────────────┐   │
//! │  │       trait BackendGateway { ... }        │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬──────────────┬────────┘
//!         │                 │              │
//! ┌───────▼──────┐ ┌────────▼─────┐ ┌──────▼───────┐
//! │ broker lookup│ │plugin registry│ │ connector    │
//! └──────────────┘ └──────────────┘ └──────────────┘
//! ```

pub mod error;
pub mod gateway;
pub mod handler;
pub mod lifecycle;
pub mod profile;
pub mod report;
pub mod request;
pub mod schedule;

// Re-exports
pub use error::{ProvisionError, Result};
pub use gateway::{BackendGateway, Handle, Initiated, Observation, Outputs};
pub use handler::ResourceHandler;
pub use lifecycle::{LifecycleController, Phase, Provisioned, Step};
pub use profile::{BackendProfile, ProfileRegistry, ResourceKind, StateClass};
pub use report::{
    CallbackTransport, CompletionReporter, HttpCallback, ProvisioningResult, ReportContext,
    ResponseEnvelope, ResultStatus,
};
pub use request::{Disposition, ProvisioningRequest, RequestType, classify};
pub use schedule::{PollPolicy, next_delay, should_abort, worst_case_wait};
