//! Property schema: the declarative per-kind rules the normalizer applies.
//!
//! - [`PropertySpec`]: one property (required, default, coercion, resolution)
//! - [`Value`]: a coerced attribute value
//! - [`registry`]: the static tables, one per entity kind

pub mod property;
pub mod registry;
pub mod value;

pub use property::{Coercion, PropertySpec, Resolution};
pub use registry::{properties, spec_for};
pub use value::Value;
