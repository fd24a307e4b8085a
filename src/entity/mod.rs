//! Monitored entities.
//!
//! Every kind wraps an [`Item`] (identity, source, raw and coerced attributes,
//! validity) and implements [`ConfigItem`], the capability set the pass drives:
//! normalize, link, identity key, mark invalid. References between entities are
//! typed indices into the owning [`EntitySet`], never pointers.

pub mod command;
pub mod host;
pub mod hostgroup;
pub mod poller;
pub mod set;
pub mod timeperiod;

pub use command::Command;
pub use host::{Host, HostRuntime, HostState, StateType};
pub use hostgroup::HostGroup;
pub use poller::Poller;
pub use set::EntitySet;
pub use timeperiod::TimePeriod;

use crate::Result;
use crate::diagnostics::Diagnostics;
use crate::link::LinkContext;
use crate::normalize;
use crate::schema::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Host,
    Command,
    TimePeriod,
    HostGroup,
    Poller,
}

impl EntityKind {
    pub const ALL: &'static [EntityKind] = &[
        EntityKind::Host,
        EntityKind::Command,
        EntityKind::TimePeriod,
        EntityKind::HostGroup,
        EntityKind::Poller,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Host => "host",
            EntityKind::Command => "command",
            EntityKind::TimePeriod => "timeperiod",
            EntityKind::HostGroup => "hostgroup",
            EntityKind::Poller => "poller",
        }
    }

    /// The property holding the identity key.
    pub fn identity_property(&self) -> &'static str {
        match self {
            EntityKind::Host => "host_name",
            EntityKind::Command => "command_name",
            EntityKind::TimePeriod => "timeperiod_name",
            EntityKind::HostGroup => "hostgroup_name",
            EntityKind::Poller => "poller_name",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(HostId);
handle!(CommandId);
handle!(TimePeriodId);
handle!(HostGroupId);

/// `Unvalidated -> {Valid, Invalid}`. Invalid is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    Unvalidated,
    Valid,
    Invalid,
}

/// State shared by every kind.
#[derive(Debug, Clone)]
pub struct Item {
    kind: EntityKind,
    name: String,
    declared: bool,
    source: String,
    raw: BTreeMap<String, String>,
    attrs: BTreeMap<&'static str, Value>,
    validity: Validity,
}

impl Item {
    pub fn new(kind: EntityKind, source: impl Into<String>, raw: BTreeMap<String, String>) -> Self {
        let declared_name = raw
            .get(kind.identity_property())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            kind,
            declared: declared_name.is_some(),
            name: declared_name.unwrap_or_default(),
            source: source.into(),
            raw,
            attrs: BTreeMap::new(),
            validity: Validity::Unvalidated,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Identity key. Empty until the namer runs if none was declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the input declared an identity for this entity.
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn raw(&self, property: &str) -> Option<&str> {
        self.raw.get(property).map(String::as_str)
    }

    pub fn raw_attributes(&self) -> &BTreeMap<String, String> {
        &self.raw
    }

    pub fn attr(&self, property: &str) -> Option<&Value> {
        self.attrs.get(property)
    }

    pub fn attributes(&self) -> &BTreeMap<&'static str, Value> {
        &self.attrs
    }

    pub fn str_attr(&self, property: &str) -> Option<&str> {
        self.attr(property).and_then(Value::as_str)
    }

    pub fn int_attr(&self, property: &str) -> Option<i64> {
        self.attr(property).and_then(Value::as_int)
    }

    /// Absent and null read as `false`.
    pub fn bool_attr(&self, property: &str) -> bool {
        self.attr(property).is_some_and(Value::as_bool)
    }

    pub fn list_attr(&self, property: &str) -> &[String] {
        self.attr(property).map(Value::as_list).unwrap_or(&[])
    }

    pub fn set_attr(&mut self, property: &'static str, value: Value) {
        self.attrs.insert(property, value);
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Not invalid. Entities still being validated count as correct.
    pub fn is_correct(&self) -> bool {
        self.validity != Validity::Invalid
    }

    pub fn mark_invalid(&mut self) {
        self.validity = Validity::Invalid;
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    /// Close the state machine at the end of a pass.
    pub(crate) fn settle(&mut self) {
        if self.validity == Validity::Unvalidated {
            self.validity = Validity::Valid;
        }
    }
}

/// Capabilities shared by every entity kind.
pub trait ConfigItem {
    const KIND: EntityKind;

    fn from_item(item: Item) -> Self;

    fn item(&self) -> &Item;

    fn item_mut(&mut self) -> &mut Item;

    fn identity_key(&self) -> &str {
        self.item().name()
    }

    fn mark_invalid(&mut self) {
        self.item_mut().mark_invalid();
    }

    fn is_correct(&self) -> bool {
        self.item().is_correct()
    }

    /// Apply the schema to the raw attributes, then the kind's own
    /// intrinsic checks.
    fn normalize(&mut self, diags: &mut Diagnostics) -> Result<()> {
        normalize::normalize_item(self.item_mut(), diags);
        self.after_normalize(diags)
    }

    fn after_normalize(&mut self, _diags: &mut Diagnostics) -> Result<()> {
        Ok(())
    }

    /// Resolve references to other entities. Kinds without references keep
    /// the default.
    fn link(&mut self, _ctx: &mut LinkContext, _diags: &mut Diagnostics) -> Result<()> {
        Ok(())
    }
}
