//! Output generation for fetched articles.
//!
//! # Submodules
//!
//! - [`console`]: Human-readable listing printed by `fetch`
//! - [`json`]: Writes article lists to dated JSON files

pub mod console;
pub mod json;
