//! One validation pass, start to finish.
//!
//! records -> identities reconciled -> normalized -> built-ins added ->
//! linked -> loops broken -> policy applied -> report.

use crate::Result;
use crate::diagnostics::{Diagnostics, ValidationReport};
use crate::entity::command::BUILTIN_COMMANDS;
use crate::entity::{Command, ConfigItem, EntitySet, Host, HostGroup, Item, Poller, TimePeriod};
use crate::policy::{self, Policy};
use crate::record::RecordSet;
use crate::{link, reconcile, topology};

/// Result of a pass: the entity set handed to scheduling and its report.
#[derive(Debug)]
pub struct Validated {
    pub entities: EntitySet,
    pub report: ValidationReport,
}

impl Validated {
    pub fn conf_is_correct(&self) -> bool {
        self.report.conf_is_correct()
    }
}

fn build<T: ConfigItem>(
    records: &RecordSet,
    policy: &Policy,
    diags: &mut Diagnostics,
) -> Result<Vec<T>> {
    let items: Vec<T> = records
        .of_kind(T::KIND)
        .map(|r| T::from_item(Item::new(T::KIND, r.source.clone(), r.attributes.clone())))
        .collect();
    let mut items = reconcile::reconcile(items, policy, diags);
    for entity in &mut items {
        entity.normalize(diags)?;
    }
    Ok(items)
}

pub fn validate(records: &RecordSet, policy: &Policy) -> Result<Validated> {
    let mut diags = Diagnostics::new();

    let mut commands: Vec<Command> = build(records, policy, &mut diags)?;
    for (name, line) in BUILTIN_COMMANDS {
        if !commands.iter().any(|c| c.name() == *name) {
            commands.push(Command::builtin(name, line));
        }
    }
    let timeperiods: Vec<TimePeriod> = build(records, policy, &mut diags)?;
    let mut pollers: Vec<Poller> = build(records, policy, &mut diags)?;
    if pollers.is_empty() {
        pollers.push(Poller::implicit());
    }
    let hostgroups: Vec<HostGroup> = build(records, policy, &mut diags)?;
    let hosts: Vec<Host> = build(records, policy, &mut diags)?;
    tracing::debug!(
        hosts = hosts.len(),
        commands = commands.len(),
        timeperiods = timeperiods.len(),
        "entities normalized"
    );

    let mut entities = EntitySet::new(hosts, commands, timeperiods, hostgroups, pollers);
    let unresolved = link::link_all(&mut entities, &mut diags)?;

    let loop_members = topology::find_and_break_cycles(&mut entities.hosts, &mut diags);
    entities.reindex();

    let correct = policy::apply(&mut entities, &loop_members, unresolved, policy, &mut diags);
    tracing::info!(
        diagnostics = diags.len(),
        correct,
        "validation pass finished"
    );

    Ok(Validated {
        entities,
        report: diags.into_report(correct),
    })
}
