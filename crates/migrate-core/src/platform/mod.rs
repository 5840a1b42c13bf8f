//! Platform abstraction layer for cross-platform compatibility.
//!
//! All `#[cfg]` blocks for OS-specific behavior live here rather than being
//! scattered through the pipeline.
//!
//! - `paths` - Launcher instance store locations

pub mod paths;

pub use paths::{detect_store_dir, store_dir_candidates};
