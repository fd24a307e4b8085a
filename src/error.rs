//! Error taxonomy for configuration findings.
//!
//! Every data problem found during a pass is a [`ConfigError`]. None of them
//! abort the pass: the engine renders them into the diagnostics stream (the
//! `Display` text is the stable, substring-matchable message) and recovers
//! locally. The only error that escapes a pass is [`RegistryError`], which
//! means the code asked the schema for a property it never declared.

use crate::diagnostics::Severity;
use crate::entity::EntityKind;
use serde::Serialize;
use std::fmt;

/// Coarse class of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Required property missing.
    Schema,
    /// Attribute failed type coercion.
    Type,
    /// Reference to an unknown or unusable entity.
    Reference,
    /// Two entities share an identity key.
    IdentityConflict,
    /// Parent/child loop.
    Topology,
    /// Grouping tag with no consumer able to serve it.
    Capacity,
}

/// What happened to a command reference that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFallback {
    /// Replaced by the kind's default command.
    Reset(String),
    /// Cleared; the attribute is optional.
    Ignored,
    /// No fallback: the owning entity is invalid.
    None,
}

impl fmt::Display for CommandFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandFallback::Reset(name) => write!(f, ". Reset to '{}'", name),
            CommandFallback::Ignored => f.write_str(". This attribute will be ignored"),
            CommandFallback::None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("[{kind}::{entity}] {property} property not set")]
    MissingProperty {
        kind: EntityKind,
        entity: String,
        property: &'static str,
    },

    #[error("[{kind}::{entity}] {property} property is missing")]
    MissingKindProperty {
        kind: EntityKind,
        entity: String,
        property: &'static str,
    },

    #[error("incorrect type for property '{property}' of '{entity}'{}", reset_suffix(.reset))]
    IncorrectType {
        entity: String,
        property: &'static str,
        reset: Option<String>,
    },

    #[error("{entity}: my {property} '{}' is invalid{fallback}", .raw.as_deref().unwrap_or("None"))]
    InvalidCommand {
        entity: String,
        property: &'static str,
        raw: Option<String>,
        fallback: CommandFallback,
    },

    #[error("The {property} of the {kind} '{entity}' named '{raw}' is unknown!")]
    UnknownReference {
        kind: EntityKind,
        entity: String,
        property: &'static str,
        raw: String,
    },

    #[error("{entity}: I have a pointer to an invalid object. I will be disabled")]
    InvalidTarget { entity: String },

    #[error("[items] the parent '{parent}' on host '{host}' is unknown!")]
    UnknownParent { host: String, parent: String },

    #[error("[items] the hostgroup '{group}' on host '{host}' is unknown!")]
    UnknownHostGroup { host: String, group: String },

    #[error("[itemgroup::{group}] as hostgroup, got unknown member {member}")]
    UnknownMember { group: String, member: String },

    #[error("{kind}.{identity} is duplicated from {origin}")]
    Duplicate {
        kind: EntityKind,
        identity: String,
        origin: String,
    },

    #[error("{original}: My {property} got characters that are not allowed.")]
    IllegalCharacters {
        original: String,
        property: &'static str,
    },

    #[error("[timeperiod::{entity}] invalid time range '{value}' for {day}")]
    InvalidTimeRange {
        entity: String,
        day: &'static str,
        value: String,
    },

    #[error("The host '{host}' is part of a circular parent/child chain!")]
    CircularChain { host: String },

    #[error("{entities} exist with {tag_kind} {tag} but no {consumer} got this tag")]
    OrphanTag {
        entities: &'static str,
        tag_kind: &'static str,
        tag: String,
        consumer: &'static str,
    },

    #[error("{entity}: {rule}")]
    BusinessRule { entity: String, rule: String },

    #[error("{count} host(s) are part of parent loops and loops are fatal")]
    FatalLoops { count: usize },

    #[error("{count} unresolved critical references reach the limit of {limit}")]
    TooManyUnresolved { count: usize, limit: usize },
}

fn reset_suffix(reset: &Option<String>) -> String {
    match reset {
        Some(value) => format!(". Reset to '{}'", value),
        None => String::new(),
    }
}

impl ConfigError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ConfigError::MissingProperty { .. }
            | ConfigError::MissingKindProperty { .. }
            | ConfigError::InvalidTimeRange { .. }
            | ConfigError::BusinessRule { .. } => ErrorClass::Schema,
            ConfigError::IncorrectType { .. } => ErrorClass::Type,
            ConfigError::InvalidCommand { .. }
            | ConfigError::UnknownReference { .. }
            | ConfigError::InvalidTarget { .. }
            | ConfigError::UnknownParent { .. }
            | ConfigError::UnknownHostGroup { .. }
            | ConfigError::UnknownMember { .. } => ErrorClass::Reference,
            ConfigError::Duplicate { .. } | ConfigError::IllegalCharacters { .. } => {
                ErrorClass::IdentityConflict
            }
            ConfigError::CircularChain { .. } | ConfigError::FatalLoops { .. } => {
                ErrorClass::Topology
            }
            ConfigError::TooManyUnresolved { .. } => ErrorClass::Reference,
            ConfigError::OrphanTag { .. } => ErrorClass::Capacity,
        }
    }

    /// Severity of the finding in the diagnostics stream. Findings that the
    /// engine absorbs without touching validity are warnings.
    pub fn severity(&self) -> Severity {
        match self {
            ConfigError::InvalidCommand { fallback, .. } if *fallback != CommandFallback::None => {
                Severity::Warning
            }
            ConfigError::UnknownParent { .. }
            | ConfigError::UnknownHostGroup { .. }
            | ConfigError::UnknownMember { .. }
            | ConfigError::Duplicate { .. }
            | ConfigError::IllegalCharacters { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Lookup of a property the schema never declared. Always a programming error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no property '{property}' is declared for {kind}")]
    UnknownProperty {
        kind: EntityKind,
        property: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incorrect_type_mentions_reset_value() {
        let err = ConfigError::IncorrectType {
            entity: "test_host_0".into(),
            property: "check_interval",
            reset: Some("0".into()),
        };
        assert_eq!(
            err.to_string(),
            "incorrect type for property 'check_interval' of 'test_host_0'. Reset to '0'"
        );
        assert_eq!(err.class(), ErrorClass::Type);
    }

    #[test]
    fn invalid_command_without_raw_value_prints_none() {
        let err = ConfigError::InvalidCommand {
            entity: "test_host_0".into(),
            property: "check_command",
            raw: None,
            fallback: CommandFallback::Reset("_internal_host_up".into()),
        };
        assert_eq!(
            err.to_string(),
            "test_host_0: my check_command 'None' is invalid. Reset to '_internal_host_up'"
        );
        assert_eq!(err.severity(), Severity::Warning);
    }

    #[test]
    fn orphan_tag_is_a_capacity_finding() {
        let err = ConfigError::OrphanTag {
            entities: "Hosts",
            tag_kind: "poller_tag",
            tag: "invalidtag".into(),
            consumer: "poller",
        };
        assert_eq!(
            err.to_string(),
            "Hosts exist with poller_tag invalidtag but no poller got this tag"
        );
        assert_eq!(err.class(), ErrorClass::Capacity);
        assert_eq!(err.severity(), Severity::Error);
    }
}
