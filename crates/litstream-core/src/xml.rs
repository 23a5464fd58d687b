//! quick-xml helpers shared by the XML-speaking adapters

use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Sections whose content is not markup.
const OPAQUE: [(&str, &str); 2] = [("<!--", "-->"), ("<![CDATA[", "]]>")];

/// Split `doc` into the raw text of every top-level `<tag>` element.
///
/// Each span is parsed on its own, so one malformed record cannot poison
/// its siblings. A trailing element with no closing tag is still returned;
/// its parse fails and gets reported per record. Tags inside comments and
/// CDATA sections are ignored.
pub fn split_elements<'a>(doc: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut spans = Vec::new();
    let mut rest = doc;

    while let Some(start) = find_tag(rest, &open, true) {
        let element = &rest[start..];
        let head_end = element.find('>').map_or(element.len(), |i| i + 1);
        if element[..head_end].ends_with("/>") {
            spans.push(&element[..head_end]);
            rest = &element[head_end..];
            continue;
        }
        match find_tag(element, &close, false) {
            Some(end) => {
                let end = end + close.len();
                spans.push(&element[..end]);
                rest = &element[end..];
            }
            None => {
                spans.push(element);
                break;
            }
        }
    }

    spans
}

/// Find `pattern` at a markup position, skipping comments and CDATA.
///
/// With `name_boundary`, the match must be followed by whitespace, `>` or
/// `/` so `<Item` does not match `<ItemList`.
fn find_tag(haystack: &str, pattern: &str, name_boundary: bool) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = haystack[from..].find('<') {
        let at = from + pos;
        let here = &haystack[at..];

        if let Some((open, close)) = OPAQUE.iter().find(|(open, _)| here.starts_with(open)) {
            let body = &here[open.len()..];
            match body.find(close) {
                Some(i) => from = at + open.len() + i + close.len(),
                None => return None,
            }
            continue;
        }

        if here.starts_with(pattern) {
            if !name_boundary {
                return Some(at);
            }
            match here[pattern.len()..].chars().next() {
                Some(c) if c == '>' || c == '/' || c.is_whitespace() => return Some(at),
                None => return None,
                _ => {}
            }
        }
        from = at + 1;
    }
    None
}

/// Reader over a single element span.
///
/// Text is not trimmed: spaces around inline markup are significant, and
/// callers collapse whitespace with [`crate::clean_text`] afterwards.
pub fn reader(span: &str) -> Reader<&[u8]> {
    Reader::from_str(span)
}

/// Attribute value by key, lossily decoded.
pub fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Read text content until next end tag, flattening nested markup.
pub fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(_) => break,
            Event::Start(_) => {
                // Inline markup like <i>, <sup>
                text.push_str(&read_text(reader)?);
            }
            Event::Eof => anyhow::bail!("unexpected end of document inside text"),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Skip the rest of an element whose start tag was just read.
pub fn skip_element(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => anyhow::bail!("unexpected end of document inside element"),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}
