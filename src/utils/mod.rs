//! # Utility module
//!
//! Small helpers shared by the pipeline and the verifier:
//!
//! - data URL creation and parsing
//! - reference scheme detection

pub mod url;

// Re-export commonly used items for convenience
pub use url::{create_data_url, is_external_reference, parse_data_url, Url};
