//! Host groups.

use crate::Result;
use crate::diagnostics::Diagnostics;
use crate::entity::{ConfigItem, EntityKind, HostId, Item};
use crate::link::LinkContext;

#[derive(Debug, Clone)]
pub struct HostGroup {
    item: Item,
    pub(crate) members: Vec<HostId>,
}

impl HostGroup {
    pub fn name(&self) -> &str {
        self.item.name()
    }

    /// Members declared on the group plus hosts that list the group.
    pub fn members(&self) -> &[HostId] {
        &self.members
    }
}

impl ConfigItem for HostGroup {
    const KIND: EntityKind = EntityKind::HostGroup;

    fn from_item(item: Item) -> Self {
        Self {
            item,
            members: Vec::new(),
        }
    }

    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    fn link(&mut self, ctx: &mut LinkContext, diags: &mut Diagnostics) -> Result<()> {
        self.members = ctx.link_members(&self.item, diags);
        Ok(())
    }
}
