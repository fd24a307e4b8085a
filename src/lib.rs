//! Host configuration validation and topology-consistency engine.
//!
//! A pass takes raw entity records, settles identities, coerces attributes
//! against a static schema, resolves references, breaks parent loops and
//! applies the disable policy. Malformed input degrades single entities; it
//! never aborts the pass.

pub mod diagnostics;
pub mod engine;
pub mod entity;
pub mod error;
pub mod link;
pub mod normalize;
pub mod policy;
pub mod reconcile;
pub mod record;
pub mod runtime;
pub mod schema;
pub mod topology;

pub type Result<T> = anyhow::Result<T>;

pub use diagnostics::{Diagnostic, Diagnostics, Severity, ValidationReport};
pub use engine::{Validated, validate};
pub use entity::{EntityKind, EntitySet};
pub use error::{ConfigError, ErrorClass, RegistryError};
pub use policy::{DuplicatePolicy, Policy};
pub use record::{RawRecord, RecordSet};
pub use runtime::{CommandOutcome, RetentionData, RetentionStore, RuntimeCommand};
