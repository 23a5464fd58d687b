//! Transform Atom entries into canonical articles

use chrono::{DateTime, Utc};

use litstream_core::{CanonicalArticle, SourceKind, clean_text, dedup_preserving_order};

use crate::feed::FeedEntry;

/// Journal value for every preprint
pub const JOURNAL: &str = "arXiv preprint";

/// Path segment preceding the native id in entry URLs
const ABS_MARKER: &str = "/abs/";

/// Human-readable keyword for a subject category, if it has one.
pub fn category_keyword(category: &str) -> Option<&'static str> {
    let keyword = match category {
        "cs.LG" => "machine learning",
        "cs.AI" => "artificial intelligence",
        "cs.CL" => "natural language processing",
        "cs.CV" => "computer vision",
        "q-bio.GN" => "genomics",
        "q-bio.BM" => "biomolecules",
        "q-bio.NC" => "neurons and cognition",
        "stat.ML" => "statistical machine learning",
        _ => return None,
    };
    Some(keyword)
}

/// Native id from an entry URL: the part after `/abs/`, with a trailing
/// version `vN` rewritten to `_vN`.
///
/// `http://arxiv.org/abs/2402.12345v2` -> `2402.12345_v2`
pub fn native_id(entry_id: &str) -> String {
    let raw = match entry_id.rfind(ABS_MARKER) {
        Some(pos) => &entry_id[pos + ABS_MARKER.len()..],
        None => entry_id,
    };
    normalize_version(raw.trim())
}

fn normalize_version(id: &str) -> String {
    if let Some(pos) = id.rfind('v') {
        let (base, version) = (&id[..pos], &id[pos + 1..]);
        let versioned = !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit());
        let base_ends_in_digit = base.bytes().last().is_some_and(|b| b.is_ascii_digit());
        if versioned && base_ends_in_digit {
            return format!("{base}_v{version}");
        }
    }
    id.to_string()
}

/// Convert one entry. Returns `None` for entries with no id or title.
pub fn to_article(entry: FeedEntry, collected_at: DateTime<Utc>) -> Option<CanonicalArticle> {
    let arxiv_id = native_id(&entry.id);
    let title = clean_text(&entry.title);
    if arxiv_id.is_empty() || title.is_empty() {
        log::debug!("Dropping arXiv entry without id or title ({:?})", entry.id);
        return None;
    }

    let keywords = dedup_preserving_order(
        entry
            .categories
            .iter()
            .filter_map(|c| category_keyword(c))
            .map(String::from)
            .collect(),
    );
    let authors = entry
        .authors
        .iter()
        .map(|a| clean_text(a))
        .filter(|a| !a.is_empty())
        .collect();

    let mut article = CanonicalArticle::new(SourceKind::Arxiv, &arxiv_id, collected_at);
    article.title = title;
    article.abstract_text = clean_text(&entry.summary);
    article.authors = authors;
    article.keywords = keywords;
    article.publication_date = entry.published.chars().take(10).collect();
    article.journal = JOURNAL.to_string();
    article.doi = entry.doi.or(entry.doi_link).unwrap_or_default();
    article.arxiv_id = Some(arxiv_id);
    article.arxiv_categories = entry.categories;
    Some(article)
}
