//! PubMed efetch XML parser using quick-xml
//!
//! The efetch payload is split into `<PubmedArticle>` spans first and each
//! span is pulled through its own reader, so a malformed record only costs
//! that record.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

use litstream_core::xml::{attr, read_text, reader, skip_element, split_elements};

/// Fields of one `<PubmedArticle>` needed for the canonical record
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PubmedRecord {
    pub pmid: String,
    pub title: Option<String>,
    pub abstract_parts: Vec<String>,
    pub authors: Vec<Author>,
    pub journal_title: Option<String>,
    pub journal_iso: Option<String>,
    pub pub_date: PartialDate,
    pub article_date: PartialDate,
    pub keywords: Vec<String>,
    pub mesh_terms: Vec<String>,
    pub doi: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Author {
    pub last_name: Option<String>,
    pub fore_name: Option<String>,
    pub collective_name: Option<String>,
}

/// Year/Month/Day exactly as they appear in the XML (month may be a name)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PartialDate {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
}

/// Result of parsing an efetch payload
#[derive(Debug, Default)]
pub struct ParseResult {
    pub records: Vec<PubmedRecord>,
    /// Spans that failed to parse (already logged)
    pub failed: usize,
}

/// Parse every `<PubmedArticle>` in `xml`, which may be several
/// concatenated efetch documents.
pub fn parse_pubmed_xml(xml: &str) -> ParseResult {
    let mut result = ParseResult::default();

    for (i, span) in split_elements(xml, "PubmedArticle").into_iter().enumerate() {
        match parse_article(span) {
            Ok(record) => result.records.push(record),
            Err(e) => {
                log::error!("Failed to parse PubmedArticle #{i}: {e:#}");
                result.failed += 1;
            }
        }
    }

    result
}

/// Parse a single `<PubmedArticle>...</PubmedArticle>` span.
pub fn parse_article(span: &str) -> Result<PubmedRecord> {
    let mut reader = reader(span);
    let mut record = PubmedRecord::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).context("XML parse error")? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => parse_medline_citation(&mut reader, &mut record)?,
                b"PubmedData" => parse_pubmed_data(&mut reader, &mut record)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => anyhow::bail!("truncated PubmedArticle"),
            _ => {}
        }
        buf.clear();
    }

    Ok(record)
}

fn parse_medline_citation(reader: &mut Reader<&[u8]>, record: &mut PubmedRecord) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"PMID" => record.pmid = read_text(reader)?.trim().to_string(),
                b"Article" => parse_article_element(reader, record)?,
                b"MeshHeadingList" => record.mesh_terms = parse_mesh_list(reader)?,
                b"KeywordList" => record.keywords.extend(parse_keyword_list(reader)?),
                // Carries PMIDs of other articles
                b"CommentsCorrectionsList" => skip_element(reader, b"CommentsCorrectionsList")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => anyhow::bail!("truncated MedlineCitation"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_element(reader: &mut Reader<&[u8]>, record: &mut PubmedRecord) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Journal" => parse_journal(reader, record)?,
                b"ArticleTitle" => record.title = Some(read_text(reader)?),
                b"Abstract" => record.abstract_parts = parse_abstract(reader)?,
                b"AuthorList" => record.authors = parse_author_list(reader)?,
                b"ArticleDate" => record.article_date = read_date(reader, b"ArticleDate")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => anyhow::bail!("truncated Article"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_journal(reader: &mut Reader<&[u8]>, record: &mut PubmedRecord) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Title" => record.journal_title = Some(read_text(reader)?),
                b"ISOAbbreviation" => record.journal_iso = Some(read_text(reader)?),
                b"PubDate" => record.pub_date = read_date(reader, b"PubDate")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Journal" => break,
            Event::Eof => anyhow::bail!("truncated Journal"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Read `<Year>`/`<Month>`/`<Day>` children until `end_tag` closes.
fn read_date(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<PartialDate> {
    let mut date = PartialDate::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => date.year = non_empty(read_text(reader)?),
                b"Month" => date.month = non_empty(read_text(reader)?),
                b"Day" => date.day = non_empty(read_text(reader)?),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == end_tag => break,
            Event::Eof => anyhow::bail!("truncated date element"),
            _ => {}
        }
        buf.clear();
    }

    Ok(date)
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_abstract(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut buf = Vec::new();
    let mut parts = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"AbstractText" => {
                parts.push(read_text(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"Abstract" => break,
            Event::Eof => anyhow::bail!("truncated Abstract"),
            _ => {}
        }
        buf.clear();
    }

    Ok(parts)
}

fn parse_author_list(reader: &mut Reader<&[u8]>) -> Result<Vec<Author>> {
    let mut authors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Author" => {
                authors.push(parse_author(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"AuthorList" => break,
            Event::Eof => anyhow::bail!("truncated AuthorList"),
            _ => {}
        }
        buf.clear();
    }

    Ok(authors)
}

fn parse_author(reader: &mut Reader<&[u8]>) -> Result<Author> {
    let mut author = Author::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"LastName" => author.last_name = non_empty(read_text(reader)?),
                b"ForeName" => author.fore_name = non_empty(read_text(reader)?),
                b"CollectiveName" => author.collective_name = non_empty(read_text(reader)?),
                b"AffiliationInfo" => skip_element(reader, b"AffiliationInfo")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Author" => break,
            Event::Eof => anyhow::bail!("truncated Author"),
            _ => {}
        }
        buf.clear();
    }

    Ok(author)
}

fn parse_mesh_list(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut terms = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"DescriptorName" => {
                if let Some(term) = non_empty(read_text(reader)?) {
                    terms.push(term);
                }
            }
            // Qualifiers are not carried into the canonical record
            Event::Start(e) if e.name().as_ref() == b"QualifierName" => {
                skip_element(reader, b"QualifierName")?;
            }
            Event::End(e) if e.name().as_ref() == b"MeshHeadingList" => break,
            Event::Eof => anyhow::bail!("truncated MeshHeadingList"),
            _ => {}
        }
        buf.clear();
    }

    Ok(terms)
}

fn parse_keyword_list(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut keywords = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Keyword" => {
                if let Some(kw) = non_empty(read_text(reader)?) {
                    keywords.push(kw);
                }
            }
            Event::End(e) if e.name().as_ref() == b"KeywordList" => break,
            Event::Eof => anyhow::bail!("truncated KeywordList"),
            _ => {}
        }
        buf.clear();
    }

    Ok(keywords)
}

fn parse_pubmed_data(reader: &mut Reader<&[u8]>, record: &mut PubmedRecord) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ArticleIdList" => parse_article_id_list(reader, record)?,
                b"ReferenceList" => skip_element(reader, b"ReferenceList")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedData" => break,
            Event::Eof => anyhow::bail!("truncated PubmedData"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_id_list(reader: &mut Reader<&[u8]>, record: &mut PubmedRecord) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"ArticleId" => {
                let id_type = attr(&e, b"IdType");
                let value = read_text(reader)?;
                if id_type.as_deref() == Some("doi") && record.doi.is_none() {
                    record.doi = non_empty(value);
                }
            }
            Event::End(e) if e.name().as_ref() == b"ArticleIdList" => break,
            Event::Eof => anyhow::bail!("truncated ArticleIdList"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}
