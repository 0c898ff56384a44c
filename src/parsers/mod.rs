//! # Parser module
//!
//! Document parsers used by the pipeline and the verifier:
//!
//! - `html` - DOM construction, traversal, metadata, and serialization
//! - `css` - stylesheet token walking and image-reference rewriting

pub mod css;
pub mod html;
