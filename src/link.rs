//! Reference linker: turns names into typed handles.
//!
//! Recovery per reference kind:
//! - command: reset to the property's default, or ignore when the default is
//!   empty, or invalidate when there is none
//! - timeperiod: the owner is invalid, no substitution
//! - parent, hostgroup, group member: dropped with a warning
//! - poller tag: one configuration-wide finding, every user invalid

use crate::Result;
use crate::diagnostics::Diagnostics;
use crate::entity::poller::UNTAGGED;
use crate::entity::{
    CommandId, ConfigItem, EntityKind, EntitySet, HostGroupId, HostId, Item, TimePeriodId,
};
use crate::error::{CommandFallback, ConfigError};
use crate::schema::{Value, spec_for};
use std::collections::{BTreeSet, HashMap};

/// What a command reference is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandUse {
    Check,
    /// Internal commands cannot run as event handlers.
    EventHandler,
}

#[derive(Debug, Clone, Copy)]
struct Target<Id> {
    id: Id,
    valid: bool,
}

#[derive(Debug, Clone, Copy)]
struct CommandTarget {
    id: CommandId,
    valid: bool,
    internal: bool,
}

/// Name lookups for one linking stage, built from the entity set.
#[derive(Debug, Default)]
pub struct LinkContext {
    hosts: HashMap<String, HostId>,
    commands: HashMap<String, CommandTarget>,
    timeperiods: HashMap<String, Target<TimePeriodId>>,
    hostgroups: HashMap<String, HostGroupId>,
    unresolved: usize,
}

/// The command name in a command call: everything before the first `!`.
fn command_name(call: &str) -> &str {
    call.split('!').next().unwrap_or(call).trim()
}

impl LinkContext {
    pub fn new(set: &EntitySet) -> Self {
        let mut ctx = Self::default();
        for (idx, host) in set.hosts().iter().enumerate() {
            ctx.hosts.entry(host.name().to_string()).or_insert(HostId(idx));
        }
        for (idx, cmd) in set.commands().iter().enumerate() {
            ctx.commands.entry(cmd.name().to_string()).or_insert(CommandTarget {
                id: CommandId(idx),
                valid: cmd.is_correct(),
                internal: cmd.is_internal(),
            });
        }
        for (idx, tp) in set.timeperiods().iter().enumerate() {
            ctx.timeperiods.entry(tp.name().to_string()).or_insert(Target {
                id: TimePeriodId(idx),
                valid: tp.is_correct(),
            });
        }
        for (idx, group) in set.hostgroups().iter().enumerate() {
            ctx.hostgroups
                .entry(group.name().to_string())
                .or_insert(HostGroupId(idx));
        }
        ctx
    }

    /// Unresolved critical references seen so far.
    pub fn unresolved(&self) -> usize {
        self.unresolved
    }

    fn usable_command(&self, name: &str, usage: CommandUse) -> Option<CommandId> {
        let target = self.commands.get(name)?;
        let internal_handler = usage == CommandUse::EventHandler && target.internal;
        (target.valid && !internal_handler).then_some(target.id)
    }

    pub fn link_command(
        &mut self,
        item: &mut Item,
        property: &'static str,
        usage: CommandUse,
        diags: &mut Diagnostics,
    ) -> Result<Option<CommandId>> {
        let spec = spec_for(item.kind(), property)?;
        let raw = item.str_attr(property).map(str::to_string);

        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            // Absent: the default applies silently, unless it is unusable.
            return Ok(match spec.default_value() {
                Some(Value::Str(default)) => {
                    let id = self.usable_command(&default, usage);
                    item.set_attr(property, Value::Str(default));
                    if id.is_none() {
                        diags.report(ConfigError::InvalidCommand {
                            entity: item.name().to_string(),
                            property,
                            raw: None,
                            fallback: CommandFallback::None,
                        });
                        item.mark_invalid();
                        self.unresolved += 1;
                    }
                    id
                }
                _ => {
                    item.set_attr(property, Value::Null);
                    None
                }
            });
        };

        if let Some(id) = self.usable_command(command_name(&raw), usage) {
            return Ok(Some(id));
        }

        let (fallback, resolved) = match spec.default_value() {
            Some(Value::Str(default)) => {
                let id = self.usable_command(&default, usage);
                item.set_attr(property, Value::Str(default.clone()));
                (CommandFallback::Reset(default), id)
            }
            Some(_) => {
                item.set_attr(property, Value::Null);
                (CommandFallback::Ignored, None)
            }
            None => (CommandFallback::None, None),
        };
        diags.report(ConfigError::InvalidCommand {
            entity: item.name().to_string(),
            property,
            raw: Some(raw),
            fallback: fallback.clone(),
        });
        if fallback == CommandFallback::None
            || (matches!(fallback, CommandFallback::Reset(_)) && resolved.is_none())
        {
            item.mark_invalid();
            self.unresolved += 1;
        }
        Ok(resolved)
    }

    pub fn link_timeperiod(
        &mut self,
        item: &mut Item,
        property: &'static str,
        diags: &mut Diagnostics,
    ) -> Result<Option<TimePeriodId>> {
        spec_for(item.kind(), property)?;
        let Some(raw) = item.str_attr(property).filter(|r| !r.is_empty()) else {
            return Ok(None);
        };
        let raw = raw.to_string();

        match self.timeperiods.get(&raw).copied() {
            Some(target) if target.valid => Ok(Some(target.id)),
            Some(target) => {
                diags.report(ConfigError::InvalidTarget {
                    entity: item.name().to_string(),
                });
                item.mark_invalid();
                self.unresolved += 1;
                Ok(Some(target.id))
            }
            None => {
                diags.report(ConfigError::UnknownReference {
                    kind: item.kind(),
                    entity: item.name().to_string(),
                    property,
                    raw,
                });
                item.mark_invalid();
                self.unresolved += 1;
                Ok(None)
            }
        }
    }

    /// Resolve a timeperiod's exclusions. Unknown entries invalidate it.
    pub fn link_excludes(&mut self, item: &mut Item, diags: &mut Diagnostics) -> Vec<TimePeriodId> {
        let mut excludes = Vec::new();
        for raw in item.list_attr("exclude").to_vec() {
            match self.timeperiods.get(&raw) {
                Some(target) => {
                    if !excludes.contains(&target.id) {
                        excludes.push(target.id);
                    }
                }
                None => {
                    diags.report(ConfigError::UnknownReference {
                        kind: item.kind(),
                        entity: item.name().to_string(),
                        property: "exclude",
                        raw,
                    });
                    item.mark_invalid();
                    self.unresolved += 1;
                }
            }
        }
        excludes
    }

    /// Resolve parent names in order. Unknown parents are pruned, never fatal.
    pub fn link_parents(&mut self, item: &Item, diags: &mut Diagnostics) -> Vec<HostId> {
        let mut parents = Vec::new();
        for raw in item.list_attr("parents") {
            match self.hosts.get(raw) {
                Some(&id) => {
                    if !parents.contains(&id) {
                        parents.push(id);
                    }
                }
                None => diags.report(ConfigError::UnknownParent {
                    host: item.name().to_string(),
                    parent: raw.clone(),
                }),
            }
        }
        parents
    }

    pub fn link_hostgroups(&mut self, item: &Item, diags: &mut Diagnostics) -> Vec<HostGroupId> {
        let mut groups = Vec::new();
        for raw in item.list_attr("hostgroups") {
            match self.hostgroups.get(raw) {
                Some(&id) => {
                    if !groups.contains(&id) {
                        groups.push(id);
                    }
                }
                None => diags.report(ConfigError::UnknownHostGroup {
                    host: item.name().to_string(),
                    group: raw.clone(),
                }),
            }
        }
        groups
    }

    pub fn link_members(&mut self, item: &Item, diags: &mut Diagnostics) -> Vec<HostId> {
        let mut members = Vec::new();
        for raw in item.list_attr("members") {
            match self.hosts.get(raw) {
                Some(&id) => {
                    if !members.contains(&id) {
                        members.push(id);
                    }
                }
                None => diags.report(ConfigError::UnknownMember {
                    group: item.name().to_string(),
                    member: raw.clone(),
                }),
            }
        }
        members
    }

    /// The host's poller tag, defaulting to the untagged pool.
    pub fn poller_tag(&self, item: &Item) -> Result<String> {
        let spec = spec_for(EntityKind::Host, "poller_tag")?;
        Ok(item
            .str_attr("poller_tag")
            .filter(|t| !t.is_empty())
            .or(spec.default)
            .unwrap_or(UNTAGGED)
            .to_string())
    }
}

/// Link the whole set. Timeperiods go first so that hosts see the validity
/// their exclusions left them with. Returns the unresolved critical count.
pub fn link_all(set: &mut EntitySet, diags: &mut Diagnostics) -> Result<usize> {
    let mut ctx = LinkContext::new(set);
    for tp in &mut set.timeperiods {
        tp.link(&mut ctx, diags)?;
    }
    let mut unresolved = ctx.unresolved();

    let mut ctx = LinkContext::new(set);
    for host in &mut set.hosts {
        host.link(&mut ctx, diags)?;
    }
    for group in &mut set.hostgroups {
        group.link(&mut ctx, diags)?;
    }
    unresolved += ctx.unresolved();

    merge_memberships(set);
    check_poller_tags(set, diags);
    set.reindex();

    tracing::debug!(unresolved, "references linked");
    Ok(unresolved)
}

/// Group membership can be declared on either side; both sides end up with
/// the union.
fn merge_memberships(set: &mut EntitySet) {
    for (idx, host) in set.hosts.iter().enumerate() {
        for gid in &host.hostgroups {
            if let Some(group) = set.hostgroups.get_mut(gid.index()) {
                if !group.members.contains(&HostId(idx)) {
                    group.members.push(HostId(idx));
                }
            }
        }
    }
    for (gidx, group) in set.hostgroups.iter().enumerate() {
        for member in &group.members {
            if let Some(host) = set.hosts.get_mut(member.index()) {
                if !host.hostgroups.contains(&HostGroupId(gidx)) {
                    host.hostgroups.push(HostGroupId(gidx));
                }
            }
        }
    }
}

/// Every host tag needs a poller serving it. Reported once per tag.
fn check_poller_tags(set: &mut EntitySet, diags: &mut Diagnostics) {
    let served: BTreeSet<&str> = set
        .pollers
        .iter()
        .flat_map(|p| p.tags().iter().map(String::as_str))
        .collect();

    let mut orphans: Vec<String> = Vec::new();
    for host in &set.hosts {
        let tag = host.poller_tag();
        if !served.contains(tag) && !orphans.iter().any(|o| o == tag) {
            orphans.push(tag.to_string());
        }
    }

    for tag in orphans {
        diags.report(ConfigError::OrphanTag {
            entities: "Hosts",
            tag_kind: "poller_tag",
            tag: tag.clone(),
            consumer: "poller",
        });
        for host in set.hosts.iter_mut().filter(|h| h.poller_tag() == tag) {
            host.mark_invalid();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Command, Host, HostGroup, Poller, TimePeriod};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn item(kind: EntityKind, attrs: &[(&str, &str)]) -> Item {
        let raw: BTreeMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Item::new(kind, "test.cfg", raw)
    }

    fn normalized<T: ConfigItem>(kind: EntityKind, attrs: &[(&str, &str)]) -> T {
        let mut entity = T::from_item(item(kind, attrs));
        entity.normalize(&mut Diagnostics::new()).unwrap();
        entity
    }

    fn set_with(hosts: Vec<Host>, commands: Vec<Command>) -> EntitySet {
        let mut commands = commands;
        commands.push(Command::builtin("_internal_host_up", "_internal_host_up"));
        let tp: TimePeriod = normalized(
            EntityKind::TimePeriod,
            &[("timeperiod_name", "24x7"), ("monday", "00:00-24:00")],
        );
        EntitySet::new(hosts, commands, vec![tp], Vec::<HostGroup>::new(), vec![Poller::implicit()])
    }

    fn messages(diags: &Diagnostics) -> Vec<String> {
        diags.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn unknown_check_command_resets_to_default() {
        let host: Host = normalized(
            EntityKind::Host,
            &[
                ("host_name", "D"),
                ("check_period", "24x7"),
                ("max_check_attempts", "3"),
                ("check_command", "check_nothing!1"),
            ],
        );
        let mut set = set_with(vec![host], Vec::new());
        let mut diags = Diagnostics::new();
        let unresolved = link_all(&mut set, &mut diags).unwrap();

        assert_eq!(
            messages(&diags),
            vec!["D: my check_command 'check_nothing!1' is invalid. Reset to '_internal_host_up'"]
        );
        assert_eq!(unresolved, 0);
        let d = &set.hosts()[0];
        assert!(d.is_correct());
        assert_eq!(set.command(d.check_command().unwrap()).unwrap().name(), "_internal_host_up");
    }

    #[test]
    fn internal_command_is_refused_as_event_handler() {
        let host: Host = normalized(
            EntityKind::Host,
            &[
                ("host_name", "test_host_0"),
                ("check_period", "24x7"),
                ("max_check_attempts", "3"),
                ("event_handler", "_internal_host_up"),
            ],
        );
        let mut set = set_with(vec![host], Vec::new());
        let mut diags = Diagnostics::new();
        link_all(&mut set, &mut diags).unwrap();

        assert_eq!(
            messages(&diags),
            vec!["test_host_0: my event_handler '_internal_host_up' is invalid. This attribute will be ignored"]
        );
        let host = &set.hosts()[0];
        assert!(host.event_handler().is_none());
        assert_eq!(host.item().attr("event_handler"), Some(&Value::Null));
    }

    #[test]
    fn unknown_timeperiod_is_fatal_to_the_host() {
        let host: Host = normalized(
            EntityKind::Host,
            &[
                ("host_name", "test_host_0"),
                ("check_period", "an_invalid_timeperiod"),
                ("max_check_attempts", "3"),
            ],
        );
        let mut set = set_with(vec![host], Vec::new());
        let mut diags = Diagnostics::new();
        let unresolved = link_all(&mut set, &mut diags).unwrap();

        assert_eq!(
            messages(&diags),
            vec!["The check_period of the host 'test_host_0' named 'an_invalid_timeperiod' is unknown!"]
        );
        assert_eq!(unresolved, 1);
        assert!(!set.hosts()[0].is_correct());
    }

    #[test]
    fn unknown_parent_is_pruned() {
        let host: Host = normalized(
            EntityKind::Host,
            &[
                ("host_name", "test_host_0"),
                ("check_period", "24x7"),
                ("max_check_attempts", "3"),
                ("parents", "unknow_parent"),
            ],
        );
        let mut set = set_with(vec![host], Vec::new());
        let mut diags = Diagnostics::new();
        link_all(&mut set, &mut diags).unwrap();

        assert_eq!(
            messages(&diags),
            vec!["[items] the parent 'unknow_parent' on host 'test_host_0' is unknown!"]
        );
        assert!(set.hosts()[0].parents().is_empty());
        assert!(set.hosts()[0].is_correct());
    }

    #[test]
    fn orphan_poller_tag_is_reported_once() {
        let attrs = |name: &'static str| {
            [
                ("host_name", name),
                ("check_period", "24x7"),
                ("max_check_attempts", "3"),
                ("poller_tag", "invalidtag"),
            ]
        };
        let a: Host = normalized(EntityKind::Host, &attrs("a"));
        let b: Host = normalized(EntityKind::Host, &attrs("b"));
        let mut set = set_with(vec![a, b], Vec::new());
        let mut diags = Diagnostics::new();
        link_all(&mut set, &mut diags).unwrap();

        assert_eq!(
            messages(&diags),
            vec!["Hosts exist with poller_tag invalidtag but no poller got this tag"]
        );
        assert!(set.hosts().iter().all(|h| !h.is_correct()));
    }

    #[test]
    fn command_name_stops_at_the_argument_separator() {
        assert_eq!(command_name("check_ping!100.0,20%"), "check_ping");
        assert_eq!(command_name(" check_ssh "), "check_ssh");
    }

    #[test]
    fn unusable_default_check_command_invalidates_the_host() {
        let host: Host = normalized(
            EntityKind::Host,
            &[
                ("host_name", "test_host_0"),
                ("check_period", "24x7"),
                ("max_check_attempts", "3"),
            ],
        );
        let broken: Command = normalized(EntityKind::Command, &[("command_name", "_internal_host_up")]);
        assert!(!broken.is_correct());
        let mut set = set_with(vec![host], vec![broken]);
        let mut diags = Diagnostics::new();
        let unresolved = link_all(&mut set, &mut diags).unwrap();

        assert_eq!(messages(&diags), vec!["test_host_0: my check_command 'None' is invalid"]);
        assert_eq!(unresolved, 1);
        let host = &set.hosts()[0];
        assert!(!host.is_correct());
        assert!(host.check_command().is_none());
    }
}
