//! Litstream Core - Common infrastructure for literature harvesting pipelines
//!
//! This crate provides the canonical record model, validation rules,
//! and the blocking HTTP/XML plumbing that every source adapter shares.

pub mod article;
pub mod http;
pub mod logging;
pub mod pacing;
pub mod progress;
pub mod retry;
pub mod shutdown;
pub mod source;
pub mod validate;
pub mod xml;

// Re-exports for convenience
pub use article::{
    CanonicalArticle, ProcessingStatus, SourceKind, article_id, clean_text,
    dedup_preserving_order,
};
pub use http::{HttpTransport, SHARED_RUNTIME, StreamError, Transport, http_client};
pub use logging::{IndicatifLogger, init_logging};
pub use pacing::Pacer;
pub use progress::{ProgressContext, SharedProgress, SourceLine, fmt_num};
pub use retry::{Exhausted, retry_fixed};
pub use shutdown::{install_signal_handlers, is_shutdown_requested};
pub use source::Source;
pub use validate::{Invalid, Publishable, REQUIRED_FIELDS, validate_article, validate_value};
