//! The content index builder. Turns [`RawRecord`]s into the sorted
//! [`ContentItem`] collection that every listing is built from.
//!
//! Problems with individual records never abort the build: the offending
//! record (or field) is dropped and a [`Warning`] is surfaced, both in the
//! returned [`Index`] and through `tracing`.

use crate::post::{parse_date, ContentItem, RawRecord};
use crate::tag::{slugify, Tag};
use chrono::{DateTime, Utc};
use std::collections::hash_map::{Entry, HashMap};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// The result of [`build_index`].
#[derive(Debug, Default)]
pub struct Index {
    /// Published items, most recent first; ties ordered by slug.
    pub items: Vec<ContentItem>,

    /// Everything that was dropped or degraded along the way, in the order it
    /// was found.
    pub warnings: Vec<Warning>,
}

/// The identifying fields of a raw record, as far as it has any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordId {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub source: Option<String>,
}

impl RecordId {
    fn of(record: &RawRecord) -> RecordId {
        RecordId {
            slug: record.slug.clone(),
            title: record.title.clone(),
            source: record.source.clone(),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields: Vec<String> = vec![
            ("slug", &self.slug),
            ("title", &self.title),
            ("source", &self.source),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{} `{}`", name, v)))
        .collect();

        match fields.is_empty() {
            true => write!(f, "<unidentified record>"),
            false => write!(f, "{}", fields.join(", ")),
        }
    }
}

/// A recoverable problem found while building the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// The record lacks `slug` (and a `title` to derive it from) or
    /// `published_at`. The record was excluded.
    MissingRequiredField {
        field: &'static str,
        record: RecordId,
    },

    /// A date field couldn't be parsed. An unparseable `published_at`
    /// excludes the record; an unparseable `modified_at` is dropped.
    InvalidDate {
        field: &'static str,
        value: String,
        record: RecordId,
    },

    /// Two records normalized to the same slug. `kept` is the one with the
    /// later `published_at`.
    DuplicateSlug {
        slug: String,
        kept: RecordId,
        dropped: RecordId,
    },

    /// A tag normalized to the empty string and was dropped.
    EmptyTag { tag: String, record: RecordId },
}

impl Warning {
    /// A short, stable name for the warning's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::MissingRequiredField { .. } => "missing_required_field",
            Warning::InvalidDate { .. } => "invalid_date",
            Warning::DuplicateSlug { .. } => "duplicate_slug",
            Warning::EmptyTag { .. } => "empty_tag",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::MissingRequiredField { field, record } => {
                write!(f, "{}: missing required field `{}`; record excluded", record, field)
            }
            Warning::InvalidDate {
                field,
                value,
                record,
            } => write!(f, "{}: invalid date `{}` in field `{}`", record, value, field),
            Warning::DuplicateSlug {
                slug,
                kept,
                dropped,
            } => write!(
                f,
                "duplicate slug `{}`: kept ({}), dropped ({})",
                slug, kept, dropped
            ),
            Warning::EmptyTag { tag, record } => {
                write!(f, "{}: tag `{}` has an empty slug; tag dropped", record, tag)
            }
        }
    }
}

/// Builds the content index:
///
/// 1. drafts are dropped;
/// 2. each remaining record is validated into a [`ContentItem`] (see
///    [`Warning`] for what can go wrong);
/// 3. records sharing a slug are reduced to the one published last (ties go
///    to the smaller source identifier, then title, then the remaining
///    fields);
/// 4. the survivors are sorted by `published_at` descending, then `slug`
///    ascending.
pub fn build_index<I>(records: I) -> Index
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut warnings = Vec::new();
    let mut by_slug: HashMap<String, (ContentItem, RecordId)> = HashMap::new();

    for record in records {
        if record.draft {
            debug!(record = %RecordId::of(&record), "skipping draft");
            continue;
        }

        let (item, id) = match normalize(record, &mut warnings) {
            Some(normalized) => normalized,
            None => continue,
        };

        match by_slug.entry(item.slug.clone()) {
            Entry::Vacant(entry) => {
                entry.insert((item, id));
            }
            Entry::Occupied(mut entry) => {
                let (existing, existing_id) = entry.get();
                let supersedes = item.published_at > existing.published_at
                    || (item.published_at == existing.published_at
                        && tie_break(&item, &id) < tie_break(existing, existing_id));
                let slug = entry.key().clone();
                if supersedes {
                    let (_, dropped) = entry.insert((item, id.clone()));
                    report(
                        &mut warnings,
                        Warning::DuplicateSlug {
                            slug,
                            kept: id,
                            dropped,
                        },
                    );
                } else {
                    let kept = existing_id.clone();
                    report(
                        &mut warnings,
                        Warning::DuplicateSlug {
                            slug,
                            kept,
                            dropped: id,
                        },
                    );
                }
            }
        }
    }

    let mut items: Vec<ContentItem> = by_slug.into_iter().map(|(_, (item, _))| item).collect();
    items.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.slug.cmp(&b.slug))
    });

    Index { items, warnings }
}

/// Orders records which share a slug and a `published_at`. Covers every field
/// that reaches the index so the surviving record never depends on input
/// order.
fn tie_break<'a>(
    item: &'a ContentItem,
    id: &'a RecordId,
) -> (
    &'a Option<String>,
    &'a Option<String>,
    &'a Option<String>,
    &'a str,
    Option<DateTime<Utc>>,
    Vec<&'a str>,
) {
    (
        &id.source,
        &id.title,
        &id.slug,
        &item.description,
        item.modified_at,
        item.tags.iter().map(|tag| tag.name.as_str()).collect(),
    )
}

fn report(warnings: &mut Vec<Warning>, warning: Warning) {
    warn!(kind = warning.kind(), "{}", warning);
    warnings.push(warning);
}

/// Validates a single non-draft record. Returns `None` (after reporting why)
/// when the record can't become a [`ContentItem`].
fn normalize(record: RawRecord, warnings: &mut Vec<Warning>) -> Option<(ContentItem, RecordId)> {
    let id = RecordId::of(&record);

    let slug = non_empty(record.slug.as_deref())
        .or_else(|| non_empty(record.title.as_deref()))
        .map(slugify)
        .filter(|slug| !slug.is_empty());

    let published_at = match non_empty(record.published_at.as_deref()) {
        None => None,
        Some(raw) => match parse_date(raw) {
            Ok(date) => Some(date),
            Err(_) => {
                report(
                    warnings,
                    Warning::InvalidDate {
                        field: "published_at",
                        value: raw.to_owned(),
                        record: id.clone(),
                    },
                );
                return None;
            }
        },
    };

    if slug.is_none() {
        report(
            warnings,
            Warning::MissingRequiredField {
                field: "slug",
                record: id.clone(),
            },
        );
    }
    if published_at.is_none() {
        report(
            warnings,
            Warning::MissingRequiredField {
                field: "published_at",
                record: id.clone(),
            },
        );
    }
    let (slug, published_at) = match (slug, published_at) {
        (Some(slug), Some(published_at)) => (slug, published_at),
        _ => return None,
    };

    let modified_at = match non_empty(record.modified_at.as_deref()) {
        None => None,
        Some(raw) => match parse_date(raw) {
            Ok(date) => Some(date),
            Err(_) => {
                report(
                    warnings,
                    Warning::InvalidDate {
                        field: "modified_at",
                        value: raw.to_owned(),
                        record: id.clone(),
                    },
                );
                None
            }
        },
    };

    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(record.tags.len());
    for name in record.tags {
        let tag = Tag::new(name.trim());
        if tag.slug.is_empty() {
            report(
                warnings,
                Warning::EmptyTag {
                    tag: name,
                    record: id.clone(),
                },
            );
        } else if seen.insert(tag.slug.clone()) {
            tags.push(tag);
        }
    }

    let item = ContentItem {
        title: record.title.unwrap_or_else(|| slug.clone()),
        description: record.description.unwrap_or_default(),
        slug,
        published_at,
        modified_at,
        tags,
    };
    Some((item, id))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(slug: &str, date: &str) -> RawRecord {
        RawRecord {
            slug: Some(slug.to_owned()),
            title: Some(slug.to_uppercase()),
            published_at: Some(date.to_owned()),
            ..RawRecord::default()
        }
    }

    fn slugs(index: &Index) -> Vec<&str> {
        index.items.iter().map(|i| i.slug.as_str()).collect()
    }

    #[test]
    fn test_sorted_most_recent_first() {
        let index = build_index(vec![
            record("a", "2020-01-01"),
            record("c", "2020-03-01"),
            record("b", "2020-02-01"),
        ]);
        assert_eq!(vec!["c", "b", "a"], slugs(&index));
        assert!(index.warnings.is_empty());
    }

    #[test]
    fn test_ties_broken_by_slug() {
        let index = build_index(vec![
            record("zebra", "2020-01-01"),
            record("apple", "2020-01-01"),
            record("mango", "2020-01-01T00:00:00Z"),
        ]);
        assert_eq!(vec!["apple", "mango", "zebra"], slugs(&index));
    }

    #[test]
    fn test_drafts_excluded_without_warning() {
        let mut draft = record("draft", "2020-05-01");
        draft.draft = true;
        let index = build_index(vec![record("a", "2020-01-01"), draft]);
        assert_eq!(vec!["a"], slugs(&index));
        assert!(index.warnings.is_empty());
    }

    #[test]
    fn test_missing_published_at_excluded_with_warning() {
        let mut undated = record("b", "");
        undated.published_at = None;
        let index = build_index(vec![
            record("a", "2020-01-01"),
            undated,
            record("c", "2020-03-01"),
        ]);

        assert_eq!(vec!["c", "a"], slugs(&index));
        assert_eq!(1, index.warnings.len());
        match &index.warnings[0] {
            Warning::MissingRequiredField { field, record } => {
                assert_eq!("published_at", *field);
                assert_eq!(Some("b"), record.slug.as_deref());
            }
            other => panic!("unexpected warning: {:?}", other),
        }
        assert!(index.warnings[0].to_string().contains("slug `b`"));
    }

    #[test]
    fn test_missing_slug_derived_from_title() {
        let index = build_index(vec![RawRecord {
            title: Some(String::from("9 ways to write better Code")),
            published_at: Some(String::from("2020-01-01")),
            ..RawRecord::default()
        }]);
        assert_eq!(vec!["9-ways-to-write-better-code"], slugs(&index));
        assert_eq!("9 ways to write better Code", index.items[0].title);
    }

    #[test]
    fn test_missing_slug_and_title_excluded() {
        let index = build_index(vec![RawRecord {
            published_at: Some(String::from("2020-01-01")),
            source: Some(String::from("untitled.md")),
            ..RawRecord::default()
        }]);
        assert!(index.items.is_empty());
        assert_eq!(
            vec![Warning::MissingRequiredField {
                field: "slug",
                record: RecordId {
                    slug: None,
                    title: None,
                    source: Some(String::from("untitled.md")),
                },
            }],
            index.warnings,
        );
    }

    #[test]
    fn test_invalid_published_at_excluded() {
        let index = build_index(vec![record("a", "yesterday")]);
        assert!(index.items.is_empty());
        assert_eq!("invalid_date", index.warnings[0].kind());
    }

    #[test]
    fn test_invalid_modified_at_dropped() {
        let mut r = record("a", "2020-01-01");
        r.modified_at = Some(String::from("soon"));
        let index = build_index(vec![r]);
        assert_eq!(vec!["a"], slugs(&index));
        assert_eq!(None, index.items[0].modified_at);
        assert_eq!("invalid_date", index.warnings[0].kind());
    }

    #[test]
    fn test_slugs_normalized() {
        let index = build_index(vec![record("Hello World", "2020-01-01")]);
        assert_eq!(vec!["hello-world"], slugs(&index));
    }

    #[test]
    fn test_duplicate_slug_keeps_later_record() {
        let mut older = record("post", "2020-01-01");
        older.source = Some(String::from("older.md"));
        let mut newer = record("Post", "2020-06-01");
        newer.source = Some(String::from("newer.md"));

        for records in vec![
            vec![older.clone(), newer.clone()],
            vec![newer.clone(), older.clone()],
        ] {
            let index = build_index(records);
            assert_eq!(1, index.items.len());
            assert_eq!("POST", index.items[0].title);
            assert_eq!(
                parse_date("2020-06-01").unwrap(),
                index.items[0].published_at
            );
            match &index.warnings[..] {
                [Warning::DuplicateSlug {
                    slug,
                    kept,
                    dropped,
                }] => {
                    assert_eq!("post", slug.as_str());
                    assert_eq!(Some("newer.md"), kept.source.as_deref());
                    assert_eq!(Some("older.md"), dropped.source.as_deref());
                }
                other => panic!("unexpected warnings: {:?}", other),
            }
        }
    }

    #[test]
    fn test_duplicate_slug_tie_is_deterministic() {
        let mut first = record("post", "2020-01-01");
        first.source = Some(String::from("a.md"));
        first.title = Some(String::from("From a"));
        let mut second = record("post", "2020-01-01");
        second.source = Some(String::from("b.md"));
        second.title = Some(String::from("From b"));

        let forward = build_index(vec![first.clone(), second.clone()]);
        let backward = build_index(vec![second, first]);
        assert_eq!("From a", forward.items[0].title);
        assert_eq!("From a", backward.items[0].title);
    }

    #[test]
    fn test_duplicate_slug_tie_without_source_is_deterministic() {
        let mut first = record("post", "2020-01-01");
        first.description = Some(String::from("first"));
        let mut second = record("post", "2020-01-01");
        second.description = Some(String::from("second"));

        let forward = build_index(vec![first.clone(), second.clone()]);
        let backward = build_index(vec![second, first]);
        assert_eq!("first", forward.items[0].description);
        assert_eq!("first", backward.items[0].description);
        assert_eq!(1, forward.warnings.len());
        assert_eq!(forward.warnings, backward.warnings);
    }

    #[test]
    fn test_tags_deduplicated_by_slug() {
        let mut r = record("a", "2020-01-01");
        r.tags = vec![
            String::from("JavaScript"),
            String::from("rust"),
            String::from("javascript"),
            String::from(" -- "),
        ];
        let index = build_index(vec![r]);

        let tags: Vec<(&str, &str)> = index.items[0]
            .tags
            .iter()
            .map(|t| (t.name.as_str(), t.slug.as_str()))
            .collect();
        assert_eq!(vec![("JavaScript", "javascript"), ("rust", "rust")], tags);
        assert_eq!(1, index.warnings.len());
        assert_eq!("empty_tag", index.warnings[0].kind());
    }

    #[test]
    fn test_empty_input() {
        let index = build_index(Vec::<RawRecord>::new());
        assert!(index.items.is_empty());
        assert!(index.warnings.is_empty());
    }
}
