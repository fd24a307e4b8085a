//! Raw entity records as produced by the configuration parser.

use crate::entity::EntityKind;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub kind: EntityKind,
    /// Origin label, quoted verbatim in duplicate findings.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(kind: EntityKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: RawRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &RawRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read records file: {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("failed to parse records file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_record_documents() {
        let set = RecordSet::from_json_str(
            r#"{"records": [
                {"kind": "host", "source": "etc/hosts.cfg", "attributes": {"host_name": "a"}},
                {"kind": "poller"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(set.records.len(), 2);
        assert_eq!(
            set.records[0],
            RawRecord::new(EntityKind::Host, "etc/hosts.cfg").attr("host_name", "a")
        );
        assert_eq!(set.of_kind(EntityKind::Poller).count(), 1);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(RecordSet::from_json_str(r#"{"records": [{"kind": "contact"}]}"#).is_err());
    }
}
