//! Litstream arXiv - preprint repository adapter
//!
//! Queries the arXiv Atom API, restricted to a whitelist of subject
//! categories, and normalizes each entry into a canonical article.

pub mod client;
pub mod config;
pub mod feed;
pub mod transform;

// Re-exports
pub use client::ArxivSource;
pub use config::{Config, DEFAULT_CATEGORIES};
pub use transform::{category_keyword, native_id};
