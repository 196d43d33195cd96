//! Component registry: which components content may invoke and which
//! elements render through an override.

pub mod defaults;
mod types;

pub use types::{ComponentDefinition, ElementOverride, OverrideStrategy, RegistryConfig};
