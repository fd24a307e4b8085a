//! Commands referenced by hosts (check commands, event handlers).

use crate::Result;
use crate::diagnostics::Diagnostics;
use crate::entity::{ConfigItem, EntityKind, Item};
use crate::error::ConfigError;
use crate::schema::Value;
use std::collections::BTreeMap;

/// Commands every configuration has, declared or not.
pub const BUILTIN_COMMANDS: &[(&str, &str)] = &[
    ("_internal_host_up", "_internal_host_up"),
    ("_echo", "_echo"),
];

const BUILTIN_SOURCE: &str = "<builtin>";

#[derive(Debug, Clone)]
pub struct Command {
    item: Item,
}

impl Command {
    pub fn builtin(name: &str, command_line: &str) -> Self {
        let mut raw = BTreeMap::new();
        raw.insert("command_name".to_string(), name.to_string());
        raw.insert("command_line".to_string(), command_line.to_string());
        let mut item = Item::new(EntityKind::Command, BUILTIN_SOURCE, raw);
        item.set_attr("command_line", Value::Str(command_line.to_string()));
        Self { item }
    }

    pub fn name(&self) -> &str {
        self.item.name()
    }

    pub fn command_line(&self) -> Option<&str> {
        self.item.str_attr("command_line")
    }

    /// Internal commands are answered by the scheduler itself.
    pub fn is_internal(&self) -> bool {
        self.name().starts_with("_internal")
    }
}

impl ConfigItem for Command {
    const KIND: EntityKind = EntityKind::Command;

    fn from_item(item: Item) -> Self {
        Self { item }
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    fn after_normalize(&mut self, diags: &mut Diagnostics) -> Result<()> {
        if self.command_line().is_none_or(str::is_empty) {
            diags.report(ConfigError::MissingKindProperty {
                kind: EntityKind::Command,
                entity: self.name().to_string(),
                property: "command_line",
            });
            self.item.mark_invalid();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_without_line_is_invalid() {
        let mut raw = BTreeMap::new();
        raw.insert("command_name".to_string(), "commande".to_string());
        let mut cmd = Command::from_item(Item::new(EntityKind::Command, "commands.cfg", raw));
        let mut diags = Diagnostics::new();
        cmd.normalize(&mut diags).unwrap();

        assert!(!cmd.is_correct());
        assert!(diags
            .iter()
            .any(|d| d.message == "[command::commande] command_line property is missing"));
    }

    #[test]
    fn builtins_are_valid_and_internal_is_detected() {
        let up = Command::builtin("_internal_host_up", "_internal_host_up");
        assert!(up.is_correct());
        assert!(up.is_internal());
        assert!(!Command::builtin("_echo", "_echo").is_internal());
    }
}
