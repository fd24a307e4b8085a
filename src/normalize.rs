//! Type coercion and attribute normalization.
//!
//! For every property declared for the entity's kind:
//! - absent, required, no default: `"<property> property not set"`, invalid,
//!   attribute left absent
//! - absent with a default: the coerced default (falsy defaults become null)
//! - present but the wrong type: `"incorrect type for property ..."`, reset to
//!   the default when there is one, invalid
//!
//! Linked properties only get their supplied value coerced here; the linker
//! owns their defaults.

use crate::diagnostics::Diagnostics;
use crate::entity::Item;
use crate::error::ConfigError;
use crate::schema::{Coercion, Resolution, Value, properties};

/// Smallest interval a periodic check may run at.
pub const MIN_CHECK_INTERVAL: i64 = 5;

pub fn normalize_item(item: &mut Item, diags: &mut Diagnostics) {
    let kind = item.kind();
    let identity = kind.identity_property();

    for spec in properties(kind) {
        // The namer owns the identity property.
        if spec.name == identity {
            continue;
        }

        let raw = item.raw(spec.name).map(str::to_string);
        let Some(raw) = raw else {
            if spec.required && !spec.has_default() {
                diags.report(ConfigError::MissingProperty {
                    kind,
                    entity: item.name().to_string(),
                    property: spec.name,
                });
                item.mark_invalid();
            } else if spec.resolution == Resolution::Immediate {
                if let Some(value) = spec.default_value() {
                    item.set_attr(spec.name, value);
                }
            }
            continue;
        };

        match spec.coercion.coerce(&raw) {
            Some(value) => {
                let value = match spec.coercion {
                    Coercion::Flags(_) => normalize_flags(item, spec.name, &raw, value, diags),
                    _ => value,
                };
                item.set_attr(spec.name, value);
            }
            None => {
                diags.report(ConfigError::IncorrectType {
                    entity: item.name().to_string(),
                    property: spec.name,
                    reset: spec.default.map(str::to_string),
                });
                item.mark_invalid();
                if let Some(value) = spec.default_value() {
                    item.set_attr(spec.name, value);
                }
            }
        }
    }

    for key in item.raw_attributes().keys() {
        // Custom variables start with an underscore and are passed through.
        if key.starts_with('_') || properties(kind).iter().any(|s| s.name == key.as_str()) {
            continue;
        }
        diags.warn(format!(
            "[{}::{}] unknown property '{}' ignored",
            kind,
            item.name(),
            key
        ));
    }
}

/// Unknown flags are dropped with a warning. When nothing usable is left the
/// property takes its default.
fn normalize_flags(
    item: &Item,
    property: &'static str,
    raw: &str,
    value: Value,
    diags: &mut Diagnostics,
) -> Value {
    let Some(spec) = properties(item.kind()).iter().find(|s| s.name == property) else {
        return value;
    };
    for flag in spec.coercion.rejected_flags(raw) {
        diags.warn(format!(
            "{}: unknown flag '{}' in {} ignored",
            item.name(),
            flag,
            property
        ));
    }
    if value.is_falsy() {
        spec.default_value().unwrap_or(value)
    } else {
        value
    }
}

/// Raise a zero (or unset) periodic interval to [`MIN_CHECK_INTERVAL`].
///
/// A zero interval means "never schedule" for other kinds and must not leak
/// into host scheduling.
pub fn raise_interval_floor(item: &mut Item, property: &'static str, diags: &mut Diagnostics) {
    let interval = item.int_attr(property).unwrap_or(0);
    if interval == 0 {
        item.set_attr(property, Value::Int(MIN_CHECK_INTERVAL));
        diags.info(format!(
            "{}: my {} has been increased to {}",
            item.name(),
            property,
            MIN_CHECK_INTERVAL
        ));
    }
}
