//! Profile file parsing
//!
//! ```kdl
//! profile "connector-registry" {
//!     base-unit-ms 10000
//!     ceiling 20
//!     deadline-secs 840
//!     success "RUNNING"
//!     failure "FAILED"
//! }
//! ```
//!
//! Each `profile` node overrides the built-in profile of its kind; fields that
//! are not given keep their default.

use crate::error::{ConfigError, Result};
use hookflow_core::{BackendProfile, PollPolicy, ProfileRegistry, ResourceKind};
use kdl::{KdlDocument, KdlNode};
use std::time::Duration;

/// Parse a profile file on top of the built-in defaults
pub fn parse_profiles(content: &str) -> Result<ProfileRegistry> {
    let mut registry = ProfileRegistry::defaults();
    apply_profiles(&mut registry, content)?;
    Ok(registry)
}

/// Apply the `profile` nodes of `content` to `registry`
pub fn apply_profiles(registry: &mut ProfileRegistry, content: &str) -> Result<()> {
    let doc: KdlDocument = content.parse()?;

    for node in doc.nodes() {
        match node.name().value() {
            "profile" => {
                let kind = profile_kind(node)?;
                let profile = parse_profile(node, registry.get(kind))?;
                registry.set(profile).map_err(|e| ConfigError::InvalidProfile {
                    profile: kind.to_string(),
                    message: e.to_string(),
                })?;
                tracing::debug!("Loaded profile override: {}", kind);
            }
            other => return Err(ConfigError::UnknownNode(other.to_string())),
        }
    }

    Ok(())
}

fn profile_kind(node: &KdlNode) -> Result<ResourceKind> {
    let name = node
        .entries()
        .first()
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| ConfigError::InvalidProfile {
            profile: "<unnamed>".to_string(),
            message: "profile requires a kind name".to_string(),
        })?;

    name.parse().map_err(|_| ConfigError::InvalidProfile {
        profile: name.to_string(),
        message: format!(
            "unknown kind (expected one of: {})",
            ResourceKind::ALL.map(|k| k.as_str()).join(", ")
        ),
    })
}

fn parse_profile(node: &KdlNode, mut profile: BackendProfile) -> Result<BackendProfile> {
    let kind = profile.kind;
    let invalid = |message: String| ConfigError::InvalidProfile {
        profile: kind.to_string(),
        message,
    };

    let Some(children) = node.children() else {
        return Ok(profile);
    };

    for child in children.nodes() {
        let key = child.name().value();
        match key {
            "no-poll" | "no_poll" => {
                profile.poll = None;
            }
            "base-unit-ms" | "base_unit_ms" => {
                let ms = first_u64(child).ok_or_else(|| invalid(format!("{} requires a non-negative integer", key)))?;
                poll_mut(&mut profile).base_unit = Duration::from_millis(ms);
            }
            "ceiling" => {
                let ceiling = first_u64(child)
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| invalid("ceiling requires a non-negative integer".to_string()))?;
                poll_mut(&mut profile).ceiling = ceiling;
            }
            "deadline-secs" | "deadline_secs" => {
                let secs = first_u64(child).ok_or_else(|| invalid(format!("{} requires a non-negative integer", key)))?;
                poll_mut(&mut profile).deadline = Some(Duration::from_secs(secs));
            }
            "success" => {
                profile.success_states = strings(child);
            }
            "failure" => {
                profile.failure_states = strings(child);
            }
            other => {
                return Err(invalid(format!("unknown setting '{}'", other)));
            }
        }
    }

    Ok(profile)
}

/// Poll policy of a profile, created with defaults when the profile had none
fn poll_mut(profile: &mut BackendProfile) -> &mut PollPolicy {
    profile.poll.get_or_insert_with(PollPolicy::default)
}

fn first_u64(node: &KdlNode) -> Option<u64> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_integer())
        .and_then(|v| u64::try_from(v).ok())
}

fn strings(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}
