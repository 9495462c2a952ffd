//! Defines the [`RawRecord`] type (loosely-shaped front matter as supplied by
//! a content loader) and the [`ContentItem`] type (a validated, normalized
//! post). See [`crate::index::build_index`] for the conversion between the two.

use crate::tag::Tag;
use chrono::{DateTime, NaiveDateTime, ParseResult, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use tracing::debug;

/// The front matter of a single post, before validation. Every field is
/// optional here; [`crate::index::build_index`] decides which records are
/// usable.
///
/// Keys may be spelled in lower case (`title`, `date`, `tags`) or capitalized
/// (`Title`, `Date`, `Tags`). `tags` may be a YAML list or a single
/// comma-separated string.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RawRecord {
    #[serde(default, alias = "Slug")]
    pub slug: Option<String>,

    #[serde(default, alias = "Title")]
    pub title: Option<String>,

    #[serde(default, alias = "Description")]
    pub description: Option<String>,

    #[serde(
        default,
        alias = "date",
        alias = "Date",
        alias = "publishedAt",
        alias = "published"
    )]
    pub published_at: Option<String>,

    #[serde(
        default,
        alias = "modifiedAt",
        alias = "Modified",
        alias = "modified",
        alias = "updated"
    )]
    pub modified_at: Option<String>,

    #[serde(default, alias = "Tags", deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,

    #[serde(default, alias = "Draft")]
    pub draft: bool,

    /// Where the record came from (e.g., the source file's relative path).
    /// Used only to identify the record in warnings.
    #[serde(skip)]
    pub source: Option<String>,
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::String(tags) => tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
        Value::Sequence(tags) => tags.into_iter().filter_map(scalar_tag).collect(),
        other => scalar_tag(other).into_iter().collect(),
    })
}

/// Reads a single tag. YAML resolves bare scalars like `2020` or `true` to
/// numbers and booleans; those are tags too. Nested structures are not and
/// are dropped.
fn scalar_tag(value: Value) -> Option<String> {
    match value {
        Value::String(tag) => Some(tag),
        Value::Number(tag) => Some(tag.to_string()),
        Value::Bool(tag) => Some(tag.to_string()),
        other => {
            debug!(tag = ?other, "ignoring non-scalar tag");
            None
        }
    }
}

/// A published post. Constructed once per build by
/// [`crate::index::build_index`] and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContentItem {
    /// Unique, URL-safe identifier.
    pub slug: String,
    pub title: String,
    pub description: String,

    /// The sole sort key for listings (most recent first).
    pub published_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,

    /// Declaration order, no two tags sharing a slug.
    pub tags: Vec<Tag>,
}

/// Parses a front matter date. Accepts RFC 3339 date-times
/// (`2020-01-01T10:00:00+02:00`), naive date-times which are taken to be UTC
/// (`2020-01-01T10:00:00`, `2020-01-01 10:00:00`), and plain dates which are
/// taken to be midnight UTC (`2020-01-01`).
pub fn parse_date(input: &str) -> ParseResult<DateTime<Utc>> {
    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

    let input = input.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(input) {
        return Ok(date_time.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDateTime::parse_from_str(&format!("{}T00:00:00", input), NAIVE_FORMATS[0])
        .map(|naive| Utc.from_utc_datetime(&naive))
}
