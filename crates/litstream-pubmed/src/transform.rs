//! Transform parsed PubMed records into canonical articles

use chrono::{DateTime, Utc};

use litstream_core::{CanonicalArticle, SourceKind, clean_text, dedup_preserving_order};

use crate::parser::{Author, PartialDate, PubmedRecord};

/// Convert one parsed record.
///
/// Returns `None` when the record has no PMID or no title; such records
/// are dropped without counting as parse failures.
pub fn to_article(record: PubmedRecord, collected_at: DateTime<Utc>) -> Option<CanonicalArticle> {
    let pmid = record.pmid.trim().to_string();
    let title = record.title.as_deref().map(clean_text).unwrap_or_default();
    if pmid.is_empty() || title.is_empty() {
        log::debug!("Dropping PubMed record without pmid or title (pmid={pmid:?})");
        return None;
    }

    let journal = record
        .journal_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(record.journal_iso.as_deref())
        .map(clean_text)
        .unwrap_or_default();

    let mut article = CanonicalArticle::new(SourceKind::Pubmed, &pmid, collected_at);
    article.title = title;
    article.abstract_text = join_abstract(&record.abstract_parts);
    article.authors = record.authors.iter().filter_map(display_name).collect();
    article.keywords = dedup_preserving_order(record.keywords);
    article.mesh_terms = record.mesh_terms;
    article.publication_date = publication_date(&record.pub_date, &record.article_date);
    article.journal = journal;
    article.doi = record.doi.unwrap_or_default();
    article.pmid = Some(pmid);
    Some(article)
}

/// Structured abstracts come as several labelled sections.
fn join_abstract(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| clean_text(p.as_str()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"Last Fore"` for people, the group name for collective authors.
fn display_name(author: &Author) -> Option<String> {
    if let Some(last) = &author.last_name {
        let fore = author.fore_name.as_deref().unwrap_or_default();
        return Some(clean_text(&format!("{last} {fore}")));
    }
    author.collective_name.as_deref().map(clean_text)
}

/// `YYYY-MM-DD` from the journal issue date, else the electronic date.
pub fn publication_date(pub_date: &PartialDate, article_date: &PartialDate) -> String {
    format_date(pub_date)
        .or_else(|| format_date(article_date))
        .unwrap_or_default()
}

fn format_date(date: &PartialDate) -> Option<String> {
    let year = date.year.as_deref()?;
    let month = date.month.as_deref().map_or(1, month_number);
    let day = date
        .day
        .as_deref()
        .and_then(|d| d.parse::<u32>().ok())
        .unwrap_or(1);
    Some(format!("{year}-{month:02}-{day:02}"))
}

/// Numeric months pass through; names map case-insensitively (`Jan`, `june`).
/// Anything unrecognized falls back to January.
fn month_number(s: &str) -> u32 {
    if let Ok(n) = s.parse::<u32>() {
        return if (1..=12).contains(&n) { n } else { 1 };
    }
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix: String = s.chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map_or(1, |i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use litstream_core::ProcessingStatus;

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    fn date(y: Option<&str>, m: Option<&str>, d: Option<&str>) -> PartialDate {
        PartialDate {
            year: y.map(String::from),
            month: m.map(String::from),
            day: d.map(String::from),
        }
    }

    fn record() -> PubmedRecord {
        PubmedRecord {
            pmid: "123".into(),
            title: Some("  A   study\n of things ".into()),
            abstract_parts: vec!["Part one.".into(), "".into(), "Part  two.".into()],
            authors: vec![
                Author {
                    last_name: Some("Smith".into()),
                    fore_name: Some("John".into()),
                    collective_name: None,
                },
                Author {
                    last_name: Some("Mononym".into()),
                    fore_name: None,
                    collective_name: None,
                },
                Author {
                    last_name: None,
                    fore_name: None,
                    collective_name: Some("Genome Consortium".into()),
                },
                Author::default(),
            ],
            journal_title: None,
            journal_iso: Some("J Test".into()),
            pub_date: date(Some("2024"), Some("Mar"), None),
            article_date: PartialDate::default(),
            keywords: vec!["rna".into(), "dna".into(), "rna".into()],
            mesh_terms: vec!["Humans".into()],
            doi: Some("10.1/x".into()),
        }
    }

    #[test]
    fn full_record() {
        let a = to_article(record(), now()).unwrap();
        assert_eq!(a.id, "pubmed_123");
        assert_eq!(a.source, SourceKind::Pubmed);
        assert_eq!(a.title, "A study of things");
        assert_eq!(a.abstract_text, "Part one. Part two.");
        assert_eq!(a.authors, vec!["Smith John", "Mononym", "Genome Consortium"]);
        assert_eq!(a.keywords, vec!["rna", "dna"]);
        assert_eq!(a.mesh_terms, vec!["Humans"]);
        assert_eq!(a.publication_date, "2024-03-01");
        assert_eq!(a.journal, "J Test");
        assert_eq!(a.doi, "10.1/x");
        assert_eq!(a.pmid.as_deref(), Some("123"));
        assert_eq!(a.arxiv_id, None);
        assert!(a.arxiv_categories.is_empty());
        assert_eq!(a.collected_at, now());
        assert_eq!(a.processing_status, ProcessingStatus::Raw);
    }

    #[test]
    fn journal_title_preferred_over_abbreviation() {
        let mut r = record();
        r.journal_title = Some("Journal of Testing".into());
        assert_eq!(to_article(r, now()).unwrap().journal, "Journal of Testing");
    }

    #[test]
    fn missing_title_dropped() {
        let mut r = record();
        r.title = Some(" \n ".into());
        assert!(to_article(r, now()).is_none());

        let mut r = record();
        r.title = None;
        assert!(to_article(r, now()).is_none());
    }

    #[test]
    fn missing_pmid_dropped() {
        let mut r = record();
        r.pmid.clear();
        assert!(to_article(r, now()).is_none());
    }

    #[test]
    fn date_month_names_and_numbers() {
        let none = PartialDate::default();
        assert_eq!(
            publication_date(&date(Some("2023"), Some("dec"), Some("5")), &none),
            "2023-12-05"
        );
        assert_eq!(
            publication_date(&date(Some("2023"), Some("7"), Some("15")), &none),
            "2023-07-15"
        );
        assert_eq!(publication_date(&date(Some("2023"), None, None), &none), "2023-01-01");
    }

    #[test]
    fn date_falls_back_to_article_date() {
        let pub_date = date(None, Some("Jan"), None);
        let article_date = date(Some("2022"), Some("11"), Some("30"));
        assert_eq!(publication_date(&pub_date, &article_date), "2022-11-30");
    }

    #[test]
    fn date_unknown() {
        assert_eq!(
            publication_date(&PartialDate::default(), &PartialDate::default()),
            ""
        );
    }

    #[test]
    fn month_number_edge_cases() {
        assert_eq!(month_number("Sept"), 9);
        assert_eq!(month_number("13"), 1);
        assert_eq!(month_number("Spring"), 1);
    }
}
