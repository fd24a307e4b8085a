//! Validation and disable policy.
//!
//! Runs after loops are broken. Host business rules are applied, every
//! entity's validity is settled, invalid hosts are quarantined, and the
//! global gate decides whether the configuration as a whole is correct.

use crate::diagnostics::Diagnostics;
use crate::entity::{ConfigItem, EntitySet};
use crate::error::ConfigError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ILLEGAL_NAME_CHARS: &str = "`~!$%^&*\"|'<>?,()=;";

/// What happens to the later of two entities sharing an identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// The later definition is discarded.
    #[default]
    Drop,
    /// The later definition is kept under `<name>_<n>`.
    Rename,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    pub duplicates: DuplicatePolicy,
    /// Invalid hosts get the disable transform.
    pub quarantine_invalid_hosts: bool,
    /// Hosts found on a parent loop are invalidated as well as cut loose.
    pub invalidate_loop_members: bool,
    /// Any parent loop makes the configuration incorrect.
    pub loop_is_fatal: bool,
    /// This many unresolved critical references make the configuration
    /// incorrect.
    pub max_unresolved_references: Option<usize>,
    /// Characters rewritten to `_` in identities.
    pub illegal_name_chars: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            duplicates: DuplicatePolicy::Drop,
            quarantine_invalid_hosts: true,
            invalidate_loop_members: false,
            loop_is_fatal: false,
            max_unresolved_references: None,
            illegal_name_chars: DEFAULT_ILLEGAL_NAME_CHARS.to_string(),
        }
    }
}

impl Policy {
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy file: {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("failed to parse policy file: {}", path.display()))
    }
}

/// Apply the policy to a linked, loop-free set. Returns the global verdict.
pub fn apply(
    set: &mut EntitySet,
    loop_members: &[String],
    unresolved: usize,
    policy: &Policy,
    diags: &mut Diagnostics,
) -> bool {
    for host in &mut set.hosts {
        host.check_rules(diags);
    }

    if policy.invalidate_loop_members {
        for name in loop_members {
            if let Some(host) = set.host_mut(name) {
                diags.report(ConfigError::BusinessRule {
                    entity: name.clone(),
                    rule: "I am part of a parent loop".to_string(),
                });
                host.mark_invalid();
            }
        }
    }

    settle(set);
    for host in &mut set.hosts {
        host.arm();
    }

    if policy.quarantine_invalid_hosts {
        quarantine_invalid_hosts(set, diags);
    }

    let mut correct = true;
    if policy.loop_is_fatal && !loop_members.is_empty() {
        diags.report(ConfigError::FatalLoops {
            count: loop_members.len(),
        });
        correct = false;
    }
    if let Some(limit) = policy.max_unresolved_references {
        if unresolved >= limit {
            diags.report(ConfigError::TooManyUnresolved {
                count: unresolved,
                limit,
            });
            correct = false;
        }
    }

    tracing::debug!(correct, "policy applied");
    correct
}

fn settle(set: &mut EntitySet) {
    set.hosts.iter_mut().for_each(|e| e.item_mut().settle());
    set.commands.iter_mut().for_each(|e| e.item_mut().settle());
    set.timeperiods.iter_mut().for_each(|e| e.item_mut().settle());
    set.hostgroups.iter_mut().for_each(|e| e.item_mut().settle());
    set.pollers.iter_mut().for_each(|e| e.item_mut().settle());
}

/// Quarantine every invalid host and cut it out of its children's parents.
fn quarantine_invalid_hosts(set: &mut EntitySet, diags: &mut Diagnostics) {
    let quarantined: Vec<bool> = set
        .hosts
        .iter_mut()
        .map(|host| {
            if !host.is_correct() {
                host.quarantine();
            }
            host.is_quarantined()
        })
        .collect();
    if !quarantined.iter().any(|&q| q) {
        return;
    }

    let names: Vec<String> = set.hosts.iter().map(|h| h.name().to_string()).collect();
    for host in &mut set.hosts {
        let child = host.name().to_string();
        host.parents.retain(|parent| {
            if quarantined[parent.index()] {
                diags.warn(format!(
                    "{}: parent '{}' is disabled and has been removed",
                    child,
                    names[parent.index()]
                ));
                false
            } else {
                true
            }
        });
    }
    set.reindex();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_policy_document_takes_defaults() {
        let policy = Policy::from_json_str("{}").unwrap();
        assert_eq!(policy, Policy::default());
        assert!(policy.quarantine_invalid_hosts);
        assert!(!policy.loop_is_fatal);
    }

    #[test]
    fn unknown_policy_field_is_rejected() {
        assert!(Policy::from_json_str(r#"{"loops_are_bad": true}"#).is_err());
    }

    #[test]
    fn rename_duplicates_parses() {
        let policy =
            Policy::from_json_str(r#"{"duplicates": "rename", "max_unresolved_references": 2}"#)
                .unwrap();
        assert_eq!(policy.duplicates, DuplicatePolicy::Rename);
        assert_eq!(policy.max_unresolved_references, Some(2));
    }

    #[test]
    fn unresolved_limit_flips_the_gate() {
        let mut set = EntitySet::default();
        let policy = Policy {
            max_unresolved_references: Some(1),
            ..Policy::default()
        };
        let mut diags = Diagnostics::new();
        assert!(!apply(&mut set, &[], 1, &policy, &mut diags));
        assert_eq!(
            diags.iter().map(|d| d.message.clone()).collect::<Vec<_>>(),
            vec!["1 unresolved critical references reach the limit of 1"]
        );

        let mut diags = Diagnostics::new();
        assert!(apply(&mut set, &[], 0, &policy, &mut diags));
    }
}
