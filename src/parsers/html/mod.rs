//! HTML parsing and processing
//!
//! Organized into focused submodules:
//!
//! - `dom`: DOM construction and low-level node operations
//! - `metadata`: document metadata (charset, title) and the build stamp
//! - `serializer`: DOM-to-text serialization

pub mod dom;
pub mod metadata;
pub mod serializer;

// Re-export the main public API
pub use dom::{
    append_child, create_element_with_text, find_nodes, get_child_node_by_name, get_node_attr,
    get_node_name, html_to_dom, remove_nodes, set_node_attr,
};
pub use metadata::{create_build_stamp, get_charset, get_title};
pub use serializer::serialize_document;
