//! Canonical article record shared by every source adapter
//!
//! Field names and enum spellings are the wire contract of the
//! `articles.raw` stream; downstream consumers depend on them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream sources accepted by the delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pubmed,
    Arxiv,
    S2orc,
    Manual,
}

impl SourceKind {
    /// Whitelist of source names, in wire spelling.
    pub const ALL: [SourceKind; 4] = [Self::Pubmed, Self::Arxiv, Self::S2orc, Self::Manual];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pubmed => "pubmed",
            Self::Arxiv => "arxiv",
            Self::S2orc => "s2orc",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown source: {s}"))
    }
}

/// Lifecycle marker. Only `Raw` is produced here; later stages advance it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Raw,
    Processed,
    Indexed,
}

/// Unified article representation emitted by all adapters.
///
/// Built once at parse time and never mutated afterwards: the pipeline
/// validates it and hands it to the delivery channel by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalArticle {
    pub id: String,
    pub source: SourceKind,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub mesh_terms: Vec<String>,
    /// `YYYY-MM-DD`, or empty when unknown
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub citations_count: u32,
    /// Reserved for citation-graph work; always empty.
    #[serde(default)]
    pub references: Vec<String>,
    pub pmid: Option<String>,
    pub arxiv_id: Option<String>,
    #[serde(default)]
    pub arxiv_categories: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    pub collected_at: DateTime<Utc>,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
}

fn default_language() -> String {
    "en".to_string()
}

impl CanonicalArticle {
    /// Empty record for `source` with the id derived from `native_id`.
    ///
    /// Adapters fill in the remaining fields before emitting it.
    pub fn new(source: SourceKind, native_id: &str, collected_at: DateTime<Utc>) -> Self {
        Self {
            id: article_id(source, native_id),
            source,
            title: String::new(),
            abstract_text: String::new(),
            authors: Vec::new(),
            keywords: Vec::new(),
            mesh_terms: Vec::new(),
            publication_date: String::new(),
            journal: String::new(),
            doi: String::new(),
            citations_count: 0,
            references: Vec::new(),
            pmid: None,
            arxiv_id: None,
            arxiv_categories: Vec::new(),
            language: default_language(),
            collected_at,
            processing_status: ProcessingStatus::Raw,
        }
    }
}

/// Deterministic record id: `{source}_{native}` with `/` and `.` folded to `_`.
///
/// Depends on nothing but its inputs, so re-collecting the same upstream
/// record always yields the same id (and the same partition key).
pub fn article_id(source: SourceKind, native_id: &str) -> String {
    let native = native_id.trim().replace(['/', '.'], "_");
    format!("{source}_{native}")
}

/// Collapse whitespace runs to a single space and drop control characters.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove repeated entries, keeping the first occurrence.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn fixed_time() -> DateTime<Utc> {
        "2025-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn article_id_pubmed() {
        assert_eq!(article_id(SourceKind::Pubmed, "123"), "pubmed_123");
    }

    #[test]
    fn article_id_folds_separators() {
        assert_eq!(
            article_id(SourceKind::Arxiv, "2402.12345_v2"),
            "arxiv_2402_12345_v2"
        );
        assert_eq!(
            article_id(SourceKind::Arxiv, "q-bio/0401001_v1"),
            "arxiv_q-bio_0401001_v1"
        );
    }

    #[test]
    fn article_id_trims() {
        assert_eq!(article_id(SourceKind::Pubmed, "  42 \n"), "pubmed_42");
    }

    #[quickcheck]
    fn article_id_is_pure(native: String) -> bool {
        article_id(SourceKind::Pubmed, &native) == article_id(SourceKind::Pubmed, &native)
    }

    #[quickcheck]
    fn article_id_has_no_separators(native: String) -> bool {
        let id = article_id(SourceKind::Arxiv, &native);
        id.starts_with("arxiv_") && !id.contains('/') && !id.contains('.')
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Deep\n\n  learning\tfor  RNA "), "Deep learning for RNA");
    }

    #[test]
    fn clean_text_drops_control_chars() {
        assert_eq!(clean_text("a\u{0007}b \u{001f}c"), "ab c");
        assert_eq!(clean_text("\u{0000}"), "");
    }

    #[test]
    fn clean_text_empty() {
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn dedup_keeps_first() {
        let items = vec!["b".into(), "a".into(), "b".into(), "c".into(), "a".into()];
        assert_eq!(dedup_preserving_order(items), vec!["b", "a", "c"]);
    }

    #[test]
    fn source_kind_round_trip_names() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.as_str().parse::<SourceKind>(), Ok(kind));
        }
        assert!("medline".parse::<SourceKind>().is_err());
    }

    #[test]
    fn new_article_defaults() {
        let a = CanonicalArticle::new(SourceKind::Pubmed, "123", fixed_time());
        assert_eq!(a.id, "pubmed_123");
        assert_eq!(a.language, "en");
        assert_eq!(a.citations_count, 0);
        assert!(a.references.is_empty());
        assert_eq!(a.processing_status, ProcessingStatus::Raw);
    }

    #[test]
    fn serializes_wire_field_names() {
        let mut a = CanonicalArticle::new(SourceKind::Pubmed, "123", fixed_time());
        a.title = "X".into();
        a.pmid = Some("123".into());
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["source"], "pubmed");
        assert_eq!(v["processing_status"], "raw");
        assert_eq!(v["abstract"], "");
        assert_eq!(v["pmid"], "123");
        assert!(v["arxiv_id"].is_null());
        assert_eq!(v["citations_count"], 0);
        assert_eq!(v["collected_at"], "2025-01-01T00:00:00Z");
    }

    #[test]
    fn deserializes_minimal_record() {
        let json = r#"{"id":"manual_1","source":"manual","title":"T",
            "pmid":null,"arxiv_id":null,"collected_at":"2025-01-01T00:00:00Z"}"#;
        let a: CanonicalArticle = serde_json::from_str(json).unwrap();
        assert_eq!(a.source, SourceKind::Manual);
        assert_eq!(a.language, "en");
        assert!(a.authors.is_empty());
    }
}
