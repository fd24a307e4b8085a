//! Property declarations and type coercion.

use crate::schema::Value;

/// How a raw string becomes a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Bool,
    Int,
    Str,
    /// Comma-separated list; items trimmed, empty items dropped.
    List,
    /// Comma-separated flags restricted to the given set.
    Flags(&'static [&'static str]),
}

/// When the property's value is turned into its final form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The normalizer coerces the value and applies the default.
    Immediate,
    /// The value names other entities. The normalizer only coerces a supplied
    /// value; the linker resolves it and applies the default.
    Linked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
    pub coercion: Coercion,
    pub resolution: Resolution,
}

impl PropertySpec {
    pub const fn new(name: &'static str, coercion: Coercion) -> Self {
        Self {
            name,
            required: false,
            default: None,
            coercion,
            resolution: Resolution::Immediate,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn with_default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn linked(mut self) -> Self {
        self.resolution = Resolution::Linked;
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// The default as stored on an entity.
    ///
    /// A default that coerces to a falsy value is stored as [`Value::Null`],
    /// never as the empty literal: downstream rules tell "unset" apart from
    /// "set to empty" and an absent property must read as unset.
    pub fn default_value(&self) -> Option<Value> {
        let raw = self.default?;
        let value = self.coercion.coerce(raw).unwrap_or(Value::Null);
        if value.is_falsy() {
            Some(Value::Null)
        } else {
            Some(value)
        }
    }
}

impl Coercion {
    /// Coerce a raw attribute. `None` means the value has the wrong type.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        match self {
            Coercion::Bool => parse_bool(trimmed).map(Value::Bool),
            Coercion::Int => trimmed.parse::<i64>().ok().map(Value::Int),
            Coercion::Str => Some(Value::Str(trimmed.to_string())),
            Coercion::List => Some(Value::List(split_list(trimmed))),
            Coercion::Flags(allowed) => Some(Value::List(
                split_list(trimmed)
                    .into_iter()
                    .filter(|flag| allowed.contains(&flag.as_str()))
                    .collect(),
            )),
        }
    }

    /// Flags in `raw` that a [`Coercion::Flags`] coercion drops.
    pub fn rejected_flags(&self, raw: &str) -> Vec<String> {
        match self {
            Coercion::Flags(allowed) => split_list(raw)
                .into_iter()
                .filter(|flag| !allowed.contains(&flag.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FLAGS: &[&str] = &["d", "u", "r"];

    #[test]
    fn int_coercion_rejects_words() {
        assert_eq!(Coercion::Int.coerce(" 12 "), Some(Value::Int(12)));
        assert_eq!(Coercion::Int.coerce("twelve"), None);
    }

    #[test]
    fn bool_coercion_accepts_common_spellings() {
        assert_eq!(Coercion::Bool.coerce("On"), Some(Value::Bool(true)));
        assert_eq!(Coercion::Bool.coerce("0"), Some(Value::Bool(false)));
        assert_eq!(Coercion::Bool.coerce("maybe"), None);
    }

    #[test]
    fn list_coercion_drops_empty_items() {
        assert_eq!(
            Coercion::List.coerce("a, b,,c "),
            Some(Value::List(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn flags_keep_only_known_flags() {
        let coercion = Coercion::Flags(FLAGS);
        assert_eq!(
            coercion.coerce("d,x,r"),
            Some(Value::List(vec!["d".into(), "r".into()]))
        );
        assert_eq!(coercion.rejected_flags("d,x,r"), vec!["x".to_string()]);
    }

    #[test]
    fn falsy_default_is_stored_as_null() {
        let interval = PropertySpec::new("check_interval", Coercion::Int).with_default("0");
        assert_eq!(interval.default_value(), Some(Value::Null));

        let handler = PropertySpec::new("event_handler", Coercion::Str).with_default("");
        assert_eq!(handler.default_value(), Some(Value::Null));

        let tag = PropertySpec::new("poller_tag", Coercion::Str).with_default("None");
        assert_eq!(tag.default_value(), Some(Value::Str("None".into())));

        let attempts = PropertySpec::new("max_check_attempts", Coercion::Int).required();
        assert_eq!(attempts.default_value(), None);
    }
}
