//! Source adapter interface

use crate::article::{CanonicalArticle, SourceKind};

/// One upstream bibliographic source.
///
/// `fetch` never fails: transport errors and unparseable items are logged
/// and dropped, so a broken upstream yields an empty list and the next
/// scheduled cycle simply tries again.
pub trait Source {
    /// Which source this adapter produces records for.
    fn kind(&self) -> SourceKind;

    /// Query the upstream and return normalized records (at most `max_results`).
    fn fetch(&self, query: &str, max_results: usize) -> Vec<CanonicalArticle>;

    /// Convert one raw upstream payload into records, skipping bad items.
    fn parse(&self, payload: &str) -> Vec<CanonicalArticle>;
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn kind(&self) -> SourceKind {
        (**self).kind()
    }

    fn fetch(&self, query: &str, max_results: usize) -> Vec<CanonicalArticle> {
        (**self).fetch(query, max_results)
    }

    fn parse(&self, payload: &str) -> Vec<CanonicalArticle> {
        (**self).parse(payload)
    }
}
