//! The reconciled entity set a pass hands over to scheduling.

use crate::entity::{
    Command, CommandId, ConfigItem, Host, HostGroup, HostGroupId, HostId, Poller, TimePeriod,
    TimePeriodId,
};
use crate::topology::ChildIndex;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    pub(crate) hosts: Vec<Host>,
    pub(crate) commands: Vec<Command>,
    pub(crate) timeperiods: Vec<TimePeriod>,
    pub(crate) hostgroups: Vec<HostGroup>,
    pub(crate) pollers: Vec<Poller>,
    children: ChildIndex,
}

/// Per-host line of the JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSummary {
    pub name: String,
    pub valid: bool,
    pub quarantined: bool,
    pub parents: Vec<String>,
    pub children: Vec<String>,
}

impl EntitySet {
    pub fn new(
        hosts: Vec<Host>,
        commands: Vec<Command>,
        timeperiods: Vec<TimePeriod>,
        hostgroups: Vec<HostGroup>,
        pollers: Vec<Poller>,
    ) -> Self {
        let mut set = Self {
            hosts,
            commands,
            timeperiods,
            hostgroups,
            pollers,
            children: ChildIndex::default(),
        };
        set.reindex();
        set
    }

    /// Rebuild the derived child index after parents changed.
    pub(crate) fn reindex(&mut self) {
        self.children = ChildIndex::build(&self.hosts);
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host_id(&self, name: &str) -> Option<HostId> {
        self.hosts.iter().position(|h| h.name() == name).map(HostId)
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name() == name)
    }

    pub fn host_by_id(&self, id: HostId) -> Option<&Host> {
        self.hosts.get(id.index())
    }

    pub(crate) fn host_mut(&mut self, name: &str) -> Option<&mut Host> {
        self.hosts.iter_mut().find(|h| h.name() == name)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn command(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(id.index())
    }

    pub fn timeperiods(&self) -> &[TimePeriod] {
        &self.timeperiods
    }

    pub fn timeperiod(&self, id: TimePeriodId) -> Option<&TimePeriod> {
        self.timeperiods.get(id.index())
    }

    pub fn hostgroups(&self) -> &[HostGroup] {
        &self.hostgroups
    }

    pub fn hostgroup(&self, id: HostGroupId) -> Option<&HostGroup> {
        self.hostgroups.get(id.index())
    }

    pub fn pollers(&self) -> &[Poller] {
        &self.pollers
    }

    pub fn children_of(&self, id: HostId) -> &[HostId] {
        self.children.children_of(id)
    }

    pub fn parents_of(&self, id: HostId) -> &[HostId] {
        self.host_by_id(id).map(Host::parents).unwrap_or(&[])
    }

    fn host_names(&self, ids: &[HostId]) -> Vec<String> {
        ids.iter()
            .filter_map(|&id| self.host_by_id(id))
            .map(|h| h.name().to_string())
            .collect()
    }

    pub fn host_summaries(&self) -> Vec<HostSummary> {
        self.hosts
            .iter()
            .enumerate()
            .map(|(idx, host)| HostSummary {
                name: host.name().to_string(),
                valid: host.is_correct(),
                quarantined: host.is_quarantined(),
                parents: self.host_names(host.parents()),
                children: self.host_names(self.children_of(HostId(idx))),
            })
            .collect()
    }
}
