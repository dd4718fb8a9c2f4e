//! Shared vocabulary for the dui toolchain: the manifest model, the
//! allowlists and limits both the validator and the policy gate enforce,
//! theme token tables and the widget template catalog.

pub mod catalog;
pub mod manifest;
pub mod text;
pub mod theme;

pub use catalog::*;
pub use manifest::*;
pub use text::*;
pub use theme::*;

/// Re-exported so downstream crates can name document types through one path.
pub use dui_parser::{Density, ThemeProfile, UnknownVariant, Value, ValueMap, DSL_VERSION};
