//! # Pipeline module
//!
//! The ordered transform stages applied to one document:
//!
//! - `strip` - removes test-only and distribution-metadata references
//! - `inline` - embeds stylesheets, scripts, and images
//! - `minify` - drops non-preserved comments and collapses whitespace
//! - `stamp` - injects the build-metadata comment
//!
//! The orchestrator in `core` runs them strictly in that order; each
//! stage returns an explicit outcome value instead of mutating shared
//! state.

pub mod inline;
pub mod minify;
pub mod stamp;
pub mod strip;
