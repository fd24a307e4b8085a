//! Pollers: the execution pool. Only their tags matter to validation.

use crate::entity::{ConfigItem, EntityKind, Item};
use crate::schema::Value;
use std::collections::BTreeMap;

/// Tag carried by hosts and pollers that did not ask for one.
pub const UNTAGGED: &str = "None";

#[derive(Debug, Clone)]
pub struct Poller {
    item: Item,
}

impl Poller {
    /// Stand-in poller for configurations that declare none.
    pub fn implicit() -> Self {
        let mut raw = BTreeMap::new();
        raw.insert("poller_name".to_string(), "default".to_string());
        let mut item = Item::new(EntityKind::Poller, "<implicit>", raw);
        item.set_attr("poller_tags", Value::List(vec![UNTAGGED.to_string()]));
        Self { item }
    }

    pub fn name(&self) -> &str {
        self.item.name()
    }

    pub fn tags(&self) -> &[String] {
        self.item.list_attr("poller_tags")
    }
}

impl ConfigItem for Poller {
    const KIND: EntityKind = EntityKind::Poller;

    fn from_item(item: Item) -> Self {
        Self { item }
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
