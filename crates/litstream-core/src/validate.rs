//! Pre-publication gatekeeping
//!
//! Validation is a routing decision, not an error path: a rejected record
//! is counted as skipped and never touches the network.

use serde::Serialize;
use serde_json::Value;

use crate::article::{CanonicalArticle, SourceKind};

/// Fields that must be present and non-empty, in check order.
pub const REQUIRED_FIELDS: [&str; 4] = ["id", "source", "title", "collected_at"];

/// Fields that must additionally be JSON strings.
const STRING_FIELDS: [&str; 3] = ["id", "source", "title"];

/// Why a record was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalid {
    /// Required field absent, null, or empty
    MissingField(&'static str),
    /// Field is present but not a string
    NotAString(&'static str),
    /// `source` is not one of [`SourceKind::ALL`]
    UnknownSource(String),
    /// Title is present but only whitespace
    BlankTitle,
}

impl std::fmt::Display for Invalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing or empty field '{field}'"),
            Self::NotAString(field) => write!(f, "field '{field}' is not a string"),
            Self::UnknownSource(s) => write!(f, "invalid source '{s}'"),
            Self::BlankTitle => write!(f, "blank title"),
        }
    }
}

impl std::error::Error for Invalid {}

/// A record the delivery channel can publish.
///
/// The key routes every copy of the same article to the same partition.
pub trait Publishable: Serialize {
    fn key(&self) -> &str;

    fn validate(&self) -> Result<(), Invalid>;
}

impl Publishable for CanonicalArticle {
    fn key(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), Invalid> {
        validate_article(self)
    }
}

/// Untyped records (manual ingestion) are checked field by field.
impl Publishable for Value {
    fn key(&self) -> &str {
        self.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), Invalid> {
        validate_value(self)
    }
}

/// Validate a typed record.
///
/// `source` and `collected_at` are guaranteed by the type, so only the
/// string fields can fail.
pub fn validate_article(article: &CanonicalArticle) -> Result<(), Invalid> {
    if article.id.is_empty() {
        return Err(Invalid::MissingField("id"));
    }
    if article.title.is_empty() {
        return Err(Invalid::MissingField("title"));
    }
    if article.title.trim().is_empty() {
        return Err(Invalid::BlankTitle);
    }
    Ok(())
}

/// Validate an untyped JSON record against the same rules.
pub fn validate_value(record: &Value) -> Result<(), Invalid> {
    for field in REQUIRED_FIELDS {
        if is_empty(record.get(field)) {
            return Err(Invalid::MissingField(field));
        }
    }

    for field in STRING_FIELDS {
        if !record[field].is_string() {
            return Err(Invalid::NotAString(field));
        }
    }

    let source = record["source"].as_str().unwrap_or_default();
    if source.parse::<SourceKind>().is_err() {
        return Err(Invalid::UnknownSource(source.to_string()));
    }

    let title_blank = record["title"]
        .as_str()
        .is_some_and(|t| t.trim().is_empty());
    if title_blank {
        return Err(Invalid::BlankTitle);
    }
    Ok(())
}

/// Falsy in the loose sense: absent, null, empty string/array/object, false, or zero.
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
    }
}
