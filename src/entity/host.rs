//! Hosts: the entities that get checked, and the nodes of the parent graph.

use crate::Result;
use crate::diagnostics::Diagnostics;
use crate::entity::{CommandId, ConfigItem, EntityKind, HostGroupId, HostId, Item, TimePeriodId};
use crate::error::ConfigError;
use crate::link::{CommandUse, LinkContext};
use crate::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HostState {
    Pending,
    Up,
    Down,
    Unreachable,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HostState::Pending => "PENDING",
            HostState::Up => "UP",
            HostState::Down => "DOWN",
            HostState::Unreachable => "UNREACHABLE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StateType {
    Soft,
    Hard,
}

/// Scheduling-facing state of a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostRuntime {
    pub state: HostState,
    pub state_type: StateType,
    pub active_checks_enabled: bool,
    pub passive_checks_enabled: bool,
    pub accept_passive_checks: bool,
    pub execute_checks: bool,
    pub retain_status_information: bool,
    pub retain_nonstatus_information: bool,
    pub last_output: String,
    pub next_forced_check: Option<u64>,
}

impl HostRuntime {
    fn from_item(item: &Item) -> Self {
        let passive = item.bool_attr("passive_checks_enabled");
        Self {
            state: HostState::Pending,
            state_type: StateType::Hard,
            active_checks_enabled: item.bool_attr("active_checks_enabled"),
            passive_checks_enabled: passive,
            accept_passive_checks: passive,
            execute_checks: true,
            retain_status_information: item.bool_attr("retain_status_information"),
            retain_nonstatus_information: item.bool_attr("retain_nonstatus_information"),
            last_output: String::new(),
            next_forced_check: None,
        }
    }

    /// The inert configuration of a quarantined host.
    fn quarantined() -> Self {
        Self {
            state: HostState::Down,
            state_type: StateType::Hard,
            active_checks_enabled: false,
            passive_checks_enabled: false,
            accept_passive_checks: false,
            execute_checks: false,
            retain_status_information: false,
            retain_nonstatus_information: false,
            last_output: String::new(),
            next_forced_check: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Host {
    item: Item,
    pub(crate) check_command: Option<CommandId>,
    pub(crate) event_handler: Option<CommandId>,
    pub(crate) check_period: Option<TimePeriodId>,
    pub(crate) parents: Vec<HostId>,
    pub(crate) hostgroups: Vec<HostGroupId>,
    pub(crate) poller_tag: String,
    runtime: HostRuntime,
    quarantined: bool,
}

impl Host {
    pub fn name(&self) -> &str {
        self.item.name()
    }

    pub fn check_command(&self) -> Option<CommandId> {
        self.check_command
    }

    pub fn event_handler(&self) -> Option<CommandId> {
        self.event_handler
    }

    pub fn check_period(&self) -> Option<TimePeriodId> {
        self.check_period
    }

    /// Resolved parents, in declaration order.
    pub fn parents(&self) -> &[HostId] {
        &self.parents
    }

    pub fn hostgroups(&self) -> &[HostGroupId] {
        &self.hostgroups
    }

    pub fn poller_tag(&self) -> &str {
        &self.poller_tag
    }

    pub fn runtime(&self) -> &HostRuntime {
        &self.runtime
    }

    pub(crate) fn runtime_mut(&mut self) -> &mut HostRuntime {
        &mut self.runtime
    }

    /// Set by the disable policy only; nothing clears it.
    pub fn is_quarantined(&self) -> bool {
        self.quarantined
    }

    pub(crate) fn quarantine(&mut self) {
        self.quarantined = true;
        self.runtime = HostRuntime::quarantined();
    }

    /// Derive the runtime flags from the normalized attributes.
    pub(crate) fn arm(&mut self) {
        self.runtime = HostRuntime::from_item(&self.item);
    }

    /// Host-specific business rules. Returns false when one fails.
    pub(crate) fn check_rules(&mut self, diags: &mut Diagnostics) -> bool {
        let mut ok = true;
        let name = self.name().to_string();
        let mut fail = |rule: &str, diags: &mut Diagnostics| {
            diags.report(ConfigError::BusinessRule {
                entity: name.clone(),
                rule: rule.to_string(),
            });
            ok = false;
        };

        if self.check_period.is_none() {
            fail("My check_period is not correct", diags);
        }
        if self.item.bool_attr("notifications_enabled")
            && self
                .item
                .attr("notification_interval")
                .is_none_or(|v| v.is_null())
        {
            fail(
                "I've got no notification_interval but I've got notifications enabled",
                diags,
            );
        }
        if self
            .item
            .int_attr("max_check_attempts")
            .is_some_and(|attempts| attempts < 1)
        {
            fail("max_check_attempts must be at least 1", diags);
        }

        if !ok {
            self.item.mark_invalid();
        }
        ok
    }
}

impl ConfigItem for Host {
    const KIND: EntityKind = EntityKind::Host;

    fn from_item(item: Item) -> Self {
        let runtime = HostRuntime::from_item(&item);
        Self {
            item,
            check_command: None,
            event_handler: None,
            check_period: None,
            parents: Vec::new(),
            hostgroups: Vec::new(),
            poller_tag: String::new(),
            runtime,
            quarantined: false,
        }
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    fn after_normalize(&mut self, diags: &mut Diagnostics) -> Result<()> {
        normalize::raise_interval_floor(&mut self.item, "check_interval", diags);
        Ok(())
    }

    fn link(&mut self, ctx: &mut LinkContext, diags: &mut Diagnostics) -> Result<()> {
        self.check_command =
            ctx.link_command(&mut self.item, "check_command", CommandUse::Check, diags)?;
        self.event_handler = ctx.link_command(
            &mut self.item,
            "event_handler",
            CommandUse::EventHandler,
            diags,
        )?;
        self.check_period = ctx.link_timeperiod(&mut self.item, "check_period", diags)?;
        self.parents = ctx.link_parents(&self.item, diags);
        self.hostgroups = ctx.link_hostgroups(&self.item, diags);
        self.poller_tag = ctx.poller_tag(&self.item)?;
        Ok(())
    }
}
