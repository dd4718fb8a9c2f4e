//! Forward and inverse compilation between dui-lang documents and manifests.
//!
//! ```text
//! Document ──compile──▶ Manifest ──(patch)──▶ Manifest ──project──▶ Document
//! ```

mod compiler;
mod projection;

pub use compiler::{compile, compile_checked, default_layout_constraints, CompileError};
pub use projection::{
    project, region_id, widget_node_type, DEFAULT_PROJECTION_AUTHOR, ROOT_NODE_ID,
};
