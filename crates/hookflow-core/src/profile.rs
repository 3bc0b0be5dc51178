//! Backend profiles
//!
//! Per-backend constants (poll policy and terminal state strings) keyed by
//! resource kind. The lifecycle controller is generic over these; nothing
//! backend-specific is hard-coded in it.

use crate::error::{ProvisionError, Result};
use crate::schedule::{DEFAULT_CEILING, PollPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

/// Kind of resource a handler provisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Bootstrap broker address lookup (synchronous, no polling)
    BrokerLookup,
    /// Custom plugin registration
    PluginRegistry,
    /// Managed connector deployment
    ConnectorRegistry,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::BrokerLookup,
        ResourceKind::PluginRegistry,
        ResourceKind::ConnectorRegistry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::BrokerLookup => "broker-lookup",
            ResourceKind::PluginRegistry => "plugin-registry",
            ResourceKind::ConnectorRegistry => "connector-registry",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProvisionError::InvalidConfig(format!("unknown resource kind: {}", s)))
    }
}

/// Classification of a backend state string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    Pending,
    SuccessTerminal,
    FailureTerminal,
}

/// Lifecycle constants for one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendProfile {
    pub kind: ResourceKind,

    /// `None` when `initiate` is already terminal
    pub poll: Option<PollPolicy>,

    /// States that end polling successfully
    pub success_states: Vec<String>,

    /// States that end polling with a failure
    pub failure_states: Vec<String>,
}

impl BackendProfile {
    /// Profile for a backend whose initiating call is already terminal
    pub fn synchronous(kind: ResourceKind) -> Self {
        Self {
            kind,
            poll: None,
            success_states: Vec::new(),
            failure_states: Vec::new(),
        }
    }

    pub fn polling(kind: ResourceKind, poll: PollPolicy) -> Self {
        Self {
            kind,
            poll: Some(poll),
            success_states: Vec::new(),
            failure_states: Vec::new(),
        }
    }

    pub fn with_success(mut self, state: impl Into<String>) -> Self {
        self.success_states.push(state.into());
        self
    }

    pub fn with_failure(mut self, state: impl Into<String>) -> Self {
        self.failure_states.push(state.into());
        self
    }

    /// Default profile for a kind
    pub fn default_for(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::BrokerLookup => Self::synchronous(kind),
            // No failure state is ever observed for plugins; the ceiling is the only bound.
            ResourceKind::PluginRegistry => Self::polling(
                kind,
                PollPolicy::new(Duration::from_secs(1), DEFAULT_CEILING),
            )
            .with_success("ACTIVE"),
            ResourceKind::ConnectorRegistry => Self::polling(
                kind,
                PollPolicy::new(Duration::from_secs(10), DEFAULT_CEILING),
            )
            .with_success("RUNNING")
            .with_failure("FAILED"),
        }
    }

    /// Classify an observed backend state
    ///
    /// Success wins when a state is listed on both sides.
    pub fn classify(&self, state: &str) -> StateClass {
        if self.success_states.iter().any(|s| s == state) {
            StateClass::SuccessTerminal
        } else if self.failure_states.iter().any(|s| s == state) {
            StateClass::FailureTerminal
        } else {
            StateClass::Pending
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll.is_some() && self.success_states.is_empty() {
            return Err(ProvisionError::InvalidConfig(format!(
                "profile {} polls but defines no success state",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Profiles indexed by resource kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRegistry {
    profiles: BTreeMap<ResourceKind, BackendProfile>,
}

impl ProfileRegistry {
    /// Registry holding the built-in profile of every kind
    pub fn defaults() -> Self {
        let profiles = ResourceKind::ALL
            .into_iter()
            .map(|kind| (kind, BackendProfile::default_for(kind)))
            .collect();
        Self { profiles }
    }

    pub fn get(&self, kind: ResourceKind) -> BackendProfile {
        self.profiles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| BackendProfile::default_for(kind))
    }

    /// Replace the profile of `profile.kind`
    pub fn set(&mut self, profile: BackendProfile) -> Result<()> {
        profile.validate()?;
        self.profiles.insert(profile.kind, profile);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendProfile> {
        self.profiles.values()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("dynamodb-sink".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_default_profiles() {
        let registry = ProfileRegistry::defaults();

        let broker = registry.get(ResourceKind::BrokerLookup);
        assert!(broker.poll.is_none());

        let plugin = registry.get(ResourceKind::PluginRegistry);
        let poll = plugin.poll.unwrap();
        assert_eq!(poll.base_unit, Duration::from_secs(1));
        assert_eq!(poll.ceiling, 20);
        assert!(plugin.failure_states.is_empty());

        let connector = registry.get(ResourceKind::ConnectorRegistry);
        assert_eq!(connector.poll.unwrap().base_unit, Duration::from_secs(10));
    }

    #[test]
    fn test_classify() {
        let connector = BackendProfile::default_for(ResourceKind::ConnectorRegistry);
        assert_eq!(connector.classify("RUNNING"), StateClass::SuccessTerminal);
        assert_eq!(connector.classify("FAILED"), StateClass::FailureTerminal);
        assert_eq!(connector.classify("CREATING"), StateClass::Pending);
        assert_eq!(connector.classify("running"), StateClass::Pending);

        let plugin = BackendProfile::default_for(ResourceKind::PluginRegistry);
        assert_eq!(plugin.classify("ACTIVE"), StateClass::SuccessTerminal);
        assert_eq!(plugin.classify("CREATE_FAILED"), StateClass::Pending);
    }

    #[test]
    fn test_polling_profile_requires_success_state() {
        let mut registry = ProfileRegistry::defaults();
        let bad = BackendProfile::polling(ResourceKind::PluginRegistry, PollPolicy::default());
        assert!(registry.set(bad).is_err());

        let ok = BackendProfile::polling(ResourceKind::PluginRegistry, PollPolicy::default())
            .with_success("ACTIVE")
            .with_failure("CREATE_FAILED");
        registry.set(ok).unwrap();
        assert_eq!(
            registry.get(ResourceKind::PluginRegistry).classify("CREATE_FAILED"),
            StateClass::FailureTerminal
        );
    }
}
