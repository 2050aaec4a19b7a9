//! Feature analyzers: URL lexical structure and fetched page content.

pub mod html_content;
pub mod url_structure;

pub use html_content::{ContentFeatures, PageDocument};
pub use url_structure::{ParsedUrl, UrlStructure};
