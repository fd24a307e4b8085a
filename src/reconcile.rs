//! Duplicate resolver and namer.
//!
//! Identities are settled before anything else looks at an entity: illegal
//! characters are rewritten, unnamed entities get a placeholder, and entities
//! sharing an identity are resolved first-come-first-served.

use crate::diagnostics::{Diagnostics, Severity};
use crate::entity::ConfigItem;
use crate::error::ConfigError;
use crate::policy::{DuplicatePolicy, Policy};
use std::collections::HashSet;

/// Stands for `;` in identities coming out of the configuration parser.
pub const SEPARATOR_PLACEHOLDER: &str = "__ANTI-VIRG__";

/// Turn every separator placeholder back into `;`.
pub fn decode_separator(name: &str) -> String {
    name.replace(SEPARATOR_PLACEHOLDER, ";")
}

/// Replace every character of `illegal` in `name` with `_`. `None` when no
/// character had to be replaced.
pub fn sanitize(name: &str, illegal: &str) -> Option<String> {
    if !name.chars().any(|c| illegal.contains(c)) {
        return None;
    }
    Some(
        name.chars()
            .map(|c| if illegal.contains(c) { '_' } else { c })
            .collect(),
    )
}

pub fn reconcile<T: ConfigItem>(items: Vec<T>, policy: &Policy, diags: &mut Diagnostics) -> Vec<T> {
    let mut items = items;
    let property = T::KIND.identity_property();

    for entity in items.iter_mut().filter(|e| e.item().is_declared()) {
        let original = entity.identity_key().to_string();
        let decoded = decode_separator(&original);
        if let Some(safe) = sanitize(&decoded, &policy.illegal_name_chars) {
            diags.report(ConfigError::IllegalCharacters {
                original: original.clone(),
                property,
            });
            diags.warn(format!(
                "Set {} of '{}' to '{}'",
                property, original, safe
            ));
            entity.item_mut().rename(safe);
        } else if decoded != original {
            entity.item_mut().rename(decoded);
        }
    }

    // Every declared identity is reserved before any name is generated.
    let declared: HashSet<String> = items
        .iter()
        .filter(|e| e.item().is_declared())
        .map(|e| e.identity_key().to_string())
        .collect();

    // Placeholders are reserved too, so that a renamed twin never takes one.
    let mut generated: HashSet<String> = HashSet::new();
    let mut counter = 0usize;
    for entity in items.iter_mut().filter(|e| !e.item().is_declared()) {
        let name = loop {
            counter += 1;
            let candidate = format!("{}_with_no_name_{}", T::KIND, counter);
            if !declared.contains(&candidate) {
                break candidate;
            }
        };
        diags.report_as(
            Severity::Warning,
            ConfigError::MissingProperty {
                kind: T::KIND,
                entity: name.clone(),
                property,
            },
        );
        generated.insert(name.clone());
        entity.item_mut().rename(name);
    }

    let mut taken: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());
    for mut entity in items {
        let identity = entity.identity_key().to_string();
        if taken.insert(identity.clone()) {
            kept.push(entity);
            continue;
        }

        let origin = entity.item().source().to_string();
        diags.report(ConfigError::Duplicate {
            kind: T::KIND,
            identity: identity.clone(),
            origin: origin.clone(),
        });
        match policy.duplicates {
            DuplicatePolicy::Drop => {}
            DuplicatePolicy::Rename => {
                let fresh = (1..)
                    .map(|n| format!("{}_{}", identity, n))
                    .find(|c| !declared.contains(c) && !generated.contains(c) && !taken.contains(c))
                    .unwrap_or_default();
                diags.warn(format!(
                    "{}.{} from {} renamed to '{}'",
                    T::KIND, identity, origin, fresh
                ));
                entity.item_mut().rename(fresh.clone());
                taken.insert(fresh);
                kept.push(entity);
            }
        }
    }

    tracing::debug!(kind = %T::KIND, count = kept.len(), "identities reconciled");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, Host, Item};
    use crate::policy::DEFAULT_ILLEGAL_NAME_CHARS;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn host(name: Option<&str>, source: &str) -> Host {
        let mut raw = BTreeMap::new();
        if let Some(name) = name {
            raw.insert("host_name".to_string(), name.to_string());
        }
        Host::from_item(Item::new(EntityKind::Host, source, raw))
    }

    fn names(hosts: &[Host]) -> Vec<&str> {
        hosts.iter().map(|h| h.name()).collect()
    }

    #[test]
    fn first_definition_wins() {
        let hosts = vec![host(Some("E"), "a.cfg"), host(Some("E"), "b.cfg")];
        let mut diags = Diagnostics::new();
        let kept = reconcile(hosts, &Policy::default(), &mut diags);

        assert_eq!(names(&kept), vec!["E"]);
        assert_eq!(kept[0].item().source(), "a.cfg");
        let messages: Vec<String> = diags.iter().map(|d| d.message.clone()).collect();
        assert_eq!(messages, vec!["host.E is duplicated from b.cfg"]);
    }

    #[test]
    fn rename_skips_declared_names() {
        let hosts = vec![
            host(Some("test_host_0"), "hosts.cfg"),
            host(Some("test_host_0"), "hosts.cfg"),
            host(Some("test_host_0_1"), "hosts.cfg"),
        ];
        let policy = Policy {
            duplicates: DuplicatePolicy::Rename,
            ..Policy::default()
        };
        let mut diags = Diagnostics::new();
        let kept = reconcile(hosts, &policy, &mut diags);

        assert_eq!(names(&kept), vec!["test_host_0", "test_host_0_2", "test_host_0_1"]);
        assert!(diags
            .iter()
            .any(|d| d.message == "host.test_host_0 from hosts.cfg renamed to 'test_host_0_2'"));
    }

    #[test]
    fn placeholders_avoid_declared_identities() {
        let hosts = vec![
            host(None, "hosts.cfg"),
            host(Some("host_with_no_name_2"), "hosts.cfg"),
            host(None, "hosts.cfg"),
        ];
        let mut diags = Diagnostics::new();
        let kept = reconcile(hosts, &Policy::default(), &mut diags);

        assert_eq!(
            names(&kept),
            vec!["host_with_no_name_1", "host_with_no_name_2", "host_with_no_name_3"]
        );
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.severity == Severity::Warning));
        assert!(kept.iter().all(|h| h.is_correct()));
    }

    #[test]
    fn illegal_characters_are_rewritten() {
        assert_eq!(
            sanitize("<name>.~of~.the&\"host\"!", DEFAULT_ILLEGAL_NAME_CHARS).as_deref(),
            Some("_name_._of_.the__host__")
        );
        assert_eq!(
            sanitize(&decode_separator("host__ANTI-VIRG__0"), DEFAULT_ILLEGAL_NAME_CHARS)
                .as_deref(),
            Some("host_0")
        );
        assert_eq!(sanitize("おはよう", DEFAULT_ILLEGAL_NAME_CHARS), None);
        assert_eq!(sanitize("hôte", DEFAULT_ILLEGAL_NAME_CHARS), None);
    }

    #[test]
    fn sanitized_name_collides_like_any_other() {
        let hosts = vec![
            host(Some("<hte   )"), "hosts.cfg"),
            host(Some("_hte   _"), "hosts.cfg"),
        ];
        let mut diags = Diagnostics::new();
        let kept = reconcile(hosts, &Policy::default(), &mut diags);

        assert_eq!(names(&kept), vec!["_hte   _"]);
        let messages: Vec<String> = diags.iter().map(|d| d.message.clone()).collect();
        assert_eq!(
            messages,
            vec![
                "<hte   ): My host_name got characters that are not allowed.",
                "Set host_name of '<hte   )' to '_hte   _'",
                "host._hte   _ is duplicated from hosts.cfg",
            ]
        );
    }

    #[test]
    fn renamed_twin_leaves_placeholders_to_unnamed_entities() {
        let hosts = vec![
            host(Some("host_with_no_name"), "a.cfg"),
            host(Some("host_with_no_name"), "b.cfg"),
            host(None, "c.cfg"),
        ];
        let policy = Policy {
            duplicates: DuplicatePolicy::Rename,
            ..Policy::default()
        };
        let mut diags = Diagnostics::new();
        let kept = reconcile(hosts, &policy, &mut diags);

        assert_eq!(
            names(&kept),
            vec!["host_with_no_name", "host_with_no_name_2", "host_with_no_name_1"]
        );
        assert_eq!(kept[2].item().source(), "c.cfg");
        let duplicated: Vec<String> = diags
            .iter()
            .filter(|d| d.message.contains("is duplicated from"))
            .map(|d| d.message.clone())
            .collect();
        assert_eq!(duplicated, vec!["host.host_with_no_name is duplicated from b.cfg"]);
    }

    #[test]
    fn decoded_separator_is_kept_when_allowed() {
        let hosts = vec![host(Some("host__ANTI-VIRG__0"), "hosts.cfg")];
        let policy = Policy {
            illegal_name_chars: "<>".to_string(),
            ..Policy::default()
        };
        let mut diags = Diagnostics::new();
        let kept = reconcile(hosts, &policy, &mut diags);

        assert_eq!(names(&kept), vec!["host;0"]);
        assert!(diags.is_empty());
    }
}
