//! Litstream PubMed - biomedical citation adapter
//!
//! Harvests PubMed through NCBI E-utilities and normalizes the results
//! into canonical articles.
//!
//! # Flow
//!
//! - `esearch` returns the PMIDs for a query (JSON)
//! - `efetch` returns full records in chunks of 200 PMIDs (XML)
//! - each `<PubmedArticle>` is parsed independently and transformed
//!
//! # Example
//!
//! ```ignore
//! use litstream_core::Source;
//! use litstream_pubmed::{Config, PubmedSource};
//!
//! let source = PubmedSource::new(Config::default());
//! let articles = source.fetch("CRISPR gene editing", 20);
//! println!("Collected {} articles", articles.len());
//! ```

pub mod client;
pub mod config;
pub mod parser;
pub mod transform;

// Re-exports
pub use client::{FETCH_CHUNK, PubmedSource};
pub use config::Config;
