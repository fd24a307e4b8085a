//! Interfaces consumed from the runtime collaborators: the external command
//! processor and the retention loader.
//!
//! The only guarantee made here is about quarantine. A quarantined host
//! ignores every effectful command and is never seeded from retention.

use crate::entity::{EntitySet, HostState, StateType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCommand {
    EnableHostCheck,
    DisableHostCheck,
    EnablePassiveHostChecks,
    DisablePassiveHostChecks,
    ProcessHostCheckResult { status: HostState, output: String },
    /// `at` is a unix timestamp.
    ScheduleForcedHostCheck { at: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// The target exists but refuses the command.
    Ignored,
    UnknownEntity,
}

/// Persisted state of one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionData {
    pub state: HostState,
    pub state_type: StateType,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub active_checks_enabled: Option<bool>,
    #[serde(default)]
    pub passive_checks_enabled: Option<bool>,
}

pub trait RetentionStore {
    fn load_retention(&self, name: &str) -> Option<RetentionData>;
}

impl RetentionStore for BTreeMap<String, RetentionData> {
    fn load_retention(&self, name: &str) -> Option<RetentionData> {
        self.get(name).cloned()
    }
}

impl EntitySet {
    pub fn apply_runtime_command(&mut self, name: &str, command: &RuntimeCommand) -> CommandOutcome {
        let Some(host) = self.host_mut(name) else {
            return CommandOutcome::UnknownEntity;
        };
        if host.is_quarantined() {
            tracing::debug!(host = name, ?command, "command ignored by quarantined host");
            return CommandOutcome::Ignored;
        }

        let rt = host.runtime_mut();
        match command {
            RuntimeCommand::EnableHostCheck => rt.active_checks_enabled = true,
            RuntimeCommand::DisableHostCheck => rt.active_checks_enabled = false,
            RuntimeCommand::EnablePassiveHostChecks => {
                rt.passive_checks_enabled = true;
                rt.accept_passive_checks = true;
            }
            RuntimeCommand::DisablePassiveHostChecks => {
                rt.passive_checks_enabled = false;
                rt.accept_passive_checks = false;
            }
            RuntimeCommand::ProcessHostCheckResult { status, output } => {
                if !rt.accept_passive_checks {
                    return CommandOutcome::Ignored;
                }
                rt.state = *status;
                rt.state_type = StateType::Hard;
                rt.last_output = output.clone();
            }
            RuntimeCommand::ScheduleForcedHostCheck { at } => {
                if !rt.execute_checks {
                    return CommandOutcome::Ignored;
                }
                rt.next_forced_check = Some(*at);
            }
        }
        CommandOutcome::Applied
    }

    /// Seed host state from retention. Quarantined hosts and hosts that do
    /// not retain status are never looked up. Returns the restored names.
    pub fn restore_retention(&mut self, store: &impl RetentionStore) -> Vec<String> {
        let mut restored = Vec::new();
        for host in &mut self.hosts {
            if host.is_quarantined() || !host.runtime().retain_status_information {
                continue;
            }
            let Some(data) = store.load_retention(host.name()) else {
                continue;
            };
            let rt = host.runtime_mut();
            rt.state = data.state;
            rt.state_type = data.state_type;
            rt.last_output = data.output;
            if rt.retain_nonstatus_information {
                if let Some(active) = data.active_checks_enabled {
                    rt.active_checks_enabled = active;
                }
                if let Some(passive) = data.passive_checks_enabled {
                    rt.passive_checks_enabled = passive;
                    rt.accept_passive_checks = passive;
                }
            }
            restored.push(host.name().to_string());
        }
        restored
    }
}
