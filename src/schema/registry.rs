//! Static property tables, one per entity kind.
//!
//! Tables are compiled in and never mutated. [`spec_for`] answers from an index
//! built on first use.

use crate::entity::EntityKind;
use crate::error::RegistryError;
use crate::schema::{Coercion, PropertySpec};
use std::collections::HashMap;
use std::sync::OnceLock;

pub const HOST_NOTIFICATION_FLAGS: &[&str] = &["d", "u", "r", "f", "s", "n"];

pub const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

static HOST: &[PropertySpec] = &[
    PropertySpec::new("host_name", Coercion::Str).required(),
    PropertySpec::new("alias", Coercion::Str),
    PropertySpec::new("address", Coercion::Str),
    PropertySpec::new("check_command", Coercion::Str)
        .required()
        .with_default("_internal_host_up")
        .linked(),
    PropertySpec::new("check_period", Coercion::Str)
        .required()
        .linked(),
    PropertySpec::new("event_handler", Coercion::Str)
        .with_default("")
        .linked(),
    PropertySpec::new("max_check_attempts", Coercion::Int).required(),
    PropertySpec::new("check_interval", Coercion::Int).with_default("0"),
    PropertySpec::new("retry_interval", Coercion::Int).with_default("0"),
    PropertySpec::new("active_checks_enabled", Coercion::Bool).with_default("1"),
    PropertySpec::new("passive_checks_enabled", Coercion::Bool).with_default("1"),
    PropertySpec::new("event_handler_enabled", Coercion::Bool).with_default("0"),
    PropertySpec::new("notifications_enabled", Coercion::Bool).with_default("1"),
    PropertySpec::new("notification_interval", Coercion::Int).with_default("60"),
    PropertySpec::new(
        "notification_options",
        Coercion::Flags(HOST_NOTIFICATION_FLAGS),
    )
    .with_default("d,u,r,f"),
    PropertySpec::new("business_impact", Coercion::Int).with_default("2"),
    PropertySpec::new("retain_status_information", Coercion::Bool).with_default("1"),
    PropertySpec::new("retain_nonstatus_information", Coercion::Bool).with_default("1"),
    PropertySpec::new("parents", Coercion::List)
        .with_default("")
        .linked(),
    PropertySpec::new("hostgroups", Coercion::List)
        .with_default("")
        .linked(),
    PropertySpec::new("poller_tag", Coercion::Str)
        .with_default("None")
        .linked(),
];

static COMMAND: &[PropertySpec] = &[
    PropertySpec::new("command_name", Coercion::Str).required(),
    PropertySpec::new("command_line", Coercion::Str),
];

static TIMEPERIOD: &[PropertySpec] = &[
    PropertySpec::new("timeperiod_name", Coercion::Str).required(),
    PropertySpec::new("alias", Coercion::Str),
    PropertySpec::new("monday", Coercion::Str),
    PropertySpec::new("tuesday", Coercion::Str),
    PropertySpec::new("wednesday", Coercion::Str),
    PropertySpec::new("thursday", Coercion::Str),
    PropertySpec::new("friday", Coercion::Str),
    PropertySpec::new("saturday", Coercion::Str),
    PropertySpec::new("sunday", Coercion::Str),
    PropertySpec::new("exclude", Coercion::List)
        .with_default("")
        .linked(),
];

static HOSTGROUP: &[PropertySpec] = &[
    PropertySpec::new("hostgroup_name", Coercion::Str).required(),
    PropertySpec::new("alias", Coercion::Str),
    PropertySpec::new("members", Coercion::List)
        .with_default("")
        .linked(),
];

static POLLER: &[PropertySpec] = &[
    PropertySpec::new("poller_name", Coercion::Str).required(),
    PropertySpec::new("poller_tags", Coercion::List).with_default("None"),
];

/// All properties declared for `kind`, in declaration order.
pub fn properties(kind: EntityKind) -> &'static [PropertySpec] {
    match kind {
        EntityKind::Host => HOST,
        EntityKind::Command => COMMAND,
        EntityKind::TimePeriod => TIMEPERIOD,
        EntityKind::HostGroup => HOSTGROUP,
        EntityKind::Poller => POLLER,
    }
}

/// Look up one property. `Err` means the caller named a property the schema
/// does not declare, which is a bug in the caller.
pub fn spec_for(
    kind: EntityKind,
    property: &str,
) -> Result<&'static PropertySpec, RegistryError> {
    index()
        .get(&(kind, property))
        .copied()
        .ok_or_else(|| RegistryError::UnknownProperty {
            kind,
            property: property.to_string(),
        })
}

fn index() -> &'static HashMap<(EntityKind, &'static str), &'static PropertySpec> {
    static INDEX: OnceLock<HashMap<(EntityKind, &'static str), &'static PropertySpec>> =
        OnceLock::new();
    INDEX.get_or_init(|| {
        EntityKind::ALL
            .iter()
            .flat_map(|&kind| properties(kind).iter().map(move |spec| ((kind, spec.name), spec)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Resolution;

    #[test]
    fn every_kind_declares_its_identity_property() {
        for &kind in EntityKind::ALL {
            let spec = spec_for(kind, kind.identity_property()).unwrap();
            assert!(spec.required, "{kind} identity must be required");
        }
    }

    #[test]
    fn check_command_is_resolved_by_the_linker() {
        let spec = spec_for(EntityKind::Host, "check_command").unwrap();
        assert_eq!(spec.resolution, Resolution::Linked);
        assert_eq!(spec.default, Some("_internal_host_up"));
    }

    #[test]
    fn unknown_property_is_a_registry_error() {
        let err = spec_for(EntityKind::Command, "check_interval").unwrap_err();
        assert_eq!(
            err.to_string(),
            "no property 'check_interval' is declared for command"
        );
    }

    #[test]
    fn property_names_are_unique_per_kind() {
        for &kind in EntityKind::ALL {
            let mut names: Vec<&str> = properties(kind).iter().map(|s| s.name).collect();
            let declared = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), declared, "{kind} declares a property twice");
        }
    }
}
