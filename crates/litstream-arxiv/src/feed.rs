//! arXiv Atom feed parser using quick-xml

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use litstream_core::xml::{attr, read_text, reader, skip_element, split_elements};

/// One `<entry>` of the Atom feed, fields as published
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedEntry {
    /// `http://arxiv.org/abs/<id>v<n>`
    pub id: String,
    pub title: String,
    pub summary: String,
    /// RFC 3339 timestamp, e.g. `2024-02-20T18:00:01Z`
    pub published: String,
    pub authors: Vec<String>,
    /// `term` attribute of every `<category>`, in feed order
    pub categories: Vec<String>,
    /// `<arxiv:doi>` element
    pub doi: Option<String>,
    /// `href` of a `<link title="doi">`
    pub doi_link: Option<String>,
}

impl FeedEntry {
    /// The API reports query errors as a pseudo-entry under `/api/errors`.
    pub fn is_error(&self) -> bool {
        self.id.contains("/api/errors")
    }
}

/// Result of parsing one feed
#[derive(Debug, Default)]
pub struct ParseResult {
    pub entries: Vec<FeedEntry>,
    /// Entries that failed to parse (already logged)
    pub failed: usize,
}

/// Parse every `<entry>` in an Atom feed.
pub fn parse_feed(xml: &str) -> ParseResult {
    let mut result = ParseResult::default();

    for (i, span) in split_elements(xml, "entry").into_iter().enumerate() {
        match parse_entry(span) {
            Ok(entry) => result.entries.push(entry),
            Err(e) => {
                log::error!("Failed to parse arXiv entry #{i}: {e:#}");
                result.failed += 1;
            }
        }
    }

    result
}

/// Parse a single `<entry>...</entry>` span.
pub fn parse_entry(span: &str) -> Result<FeedEntry> {
    let mut reader = reader(span);
    let mut entry = FeedEntry::default();
    let mut buf = Vec::new();

    // Consume the <entry> start tag itself
    loop {
        match reader.read_event_into(&mut buf).context("XML parse error")? {
            Event::Start(e) if e.local_name().as_ref() == b"entry" => break,
            Event::Eof => anyhow::bail!("no <entry> element"),
            _ => {}
        }
        buf.clear();
    }
    buf.clear();

    loop {
        match reader.read_event_into(&mut buf).context("XML parse error")? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"id" => entry.id = read_text(&mut reader)?.trim().to_string(),
                b"title" => entry.title = read_text(&mut reader)?,
                b"summary" => entry.summary = read_text(&mut reader)?,
                b"published" => entry.published = read_text(&mut reader)?.trim().to_string(),
                b"author" => {
                    if let Some(name) = parse_author(&mut reader)? {
                        entry.authors.push(name);
                    }
                }
                b"doi" => {
                    let doi = read_text(&mut reader)?.trim().to_string();
                    if !doi.is_empty() {
                        entry.doi = Some(doi);
                    }
                }
                b"category" | b"link" => {
                    push_attrs(&e, &mut entry);
                    skip_element(&mut reader, e.name().as_ref())?;
                }
                // updated, comment, journal_ref, primary_category ...
                _ => skip_element(&mut reader, e.name().as_ref())?,
            },
            Event::Empty(e) => push_attrs(&e, &mut entry),
            Event::End(e) if e.local_name().as_ref() == b"entry" => break,
            Event::Eof => anyhow::bail!("truncated entry"),
            _ => {}
        }
        buf.clear();
    }

    Ok(entry)
}

/// Collect what `<category>` and `<link>` carry in their attributes.
fn push_attrs(e: &BytesStart<'_>, entry: &mut FeedEntry) {
    match e.local_name().as_ref() {
        b"category" => {
            if let Some(term) = attr(e, b"term").filter(|t| !t.is_empty()) {
                entry.categories.push(term);
            }
        }
        b"link" => {
            if entry.doi_link.is_none() && attr(e, b"title").as_deref() == Some("doi") {
                entry.doi_link = attr(e, b"href");
            }
        }
        _ => {}
    }
}

fn parse_author(reader: &mut Reader<&[u8]>) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut name = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"name" => {
                let text = read_text(reader)?;
                if !text.trim().is_empty() {
                    name = Some(text.trim().to_string());
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"author" => break,
            Event::Eof => anyhow::bail!("truncated author"),
            _ => {}
        }
        buf.clear();
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=all:genomics</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <entry>
    <id>http://arxiv.org/abs/2402.12345v2</id>
    <updated>2024-02-21T10:00:00Z</updated>
    <published>2024-02-20T18:00:01Z</published>
    <title>Genomic Language Models:
  A Survey</title>
    <summary>  We survey models
for DNA.</summary>
    <author><name>Ada Lovelace</name></author>
    <author>
      <name>Alan Turing</name>
      <arxiv:affiliation>Cambridge</arxiv:affiliation>
    </author>
    <arxiv:doi>10.1000/xyz123</arxiv:doi>
    <link title="doi" href="http://dx.doi.org/10.1000/xyz123" rel="related"/>
    <link href="http://arxiv.org/abs/2402.12345v2" rel="alternate" type="text/html"/>
    <arxiv:primary_category term="q-bio.GN" scheme="http://arxiv.org/schemas/atom"/>
    <category term="q-bio.GN" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <published>2024-01-01T00:00:00Z</published>
    <title>Second</title>
    <summary>Short.</summary>
    <author><name>Grace Hopper</name></author>
    <category term="stat.ML"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries() {
        let result = parse_feed(FEED);
        assert_eq!(result.failed, 0);
        assert_eq!(result.entries.len(), 2);

        let e = &result.entries[0];
        assert_eq!(e.id, "http://arxiv.org/abs/2402.12345v2");
        assert!(e.title.starts_with("Genomic Language Models:"));
        assert_eq!(e.published, "2024-02-20T18:00:01Z");
        assert_eq!(e.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(e.categories, vec!["q-bio.GN", "cs.LG"]);
        assert_eq!(e.doi.as_deref(), Some("10.1000/xyz123"));
        assert_eq!(e.doi_link.as_deref(), Some("http://dx.doi.org/10.1000/xyz123"));
    }

    #[test]
    fn feed_title_not_mistaken_for_entry() {
        let result = parse_feed(FEED);
        assert!(result.entries.iter().all(|e| !e.title.contains("ArXiv Query")));
    }

    #[test]
    fn malformed_entry_isolated() {
        let feed = r#"<feed>
  <entry><id>http://arxiv.org/abs/1</id><title>One</title></entry>
  <entry><id>http://arxiv.org/abs/2</id><title>Two</summary></entry>
  <entry><id>http://arxiv.org/abs/3</id><title>Three</title></entry>
</feed>"#;
        let result = parse_feed(feed);
        let titles: Vec<_> = result.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Three"]);
        assert_eq!(result.failed, 1);
    }

    #[test]
    fn error_entry_detected() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
  </entry>
</feed>"#;
        let result = parse_feed(feed);
        assert_eq!(result.entries.len(), 1);
        assert!(result.entries[0].is_error());
    }

    #[test]
    fn empty_feed() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Empty</title></feed>"#;
        let result = parse_feed(feed);
        assert!(result.entries.is_empty());
        assert_eq!(result.failed, 0);
    }
}
