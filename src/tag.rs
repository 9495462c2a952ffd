//! Defines the [`Tag`] type, the [`slugify`] normalization which turns tag
//! names into routing keys, and [`index_by_tag`] which groups
//! [`ContentItem`]s by tag.

use crate::post::ContentItem;
use serde::{Serialize, Serializer};
use std::collections::btree_map::{self, BTreeMap};
use std::hash::{Hash, Hasher};

/// Selects how [`slugify_with`] treats letter case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlugCase {
    /// Lower-case everything. This is the only mode that may produce routing
    /// keys.
    Lower,

    /// Keep the input's letter case. For display purposes only.
    Preserve,
}

/// Normalizes `input` into a URL-safe routing key: lower-cased, every run of
/// non-alphanumeric characters collapsed into a single hyphen, and no leading
/// or trailing hyphens. Non-ASCII characters are transliterated. The result is
/// stable under repeated application.
pub fn slugify(input: &str) -> String {
    slug::slugify(input)
}

/// Like [`slugify`], but lets the caller keep letter case with
/// [`SlugCase::Preserve`]. Both modes transliterate the same way, so a
/// preserved slug lower-cases to exactly the [`SlugCase::Lower`] slug.
/// Case-preserved slugs must never be used as routing keys since `JavaScript`
/// and `javascript` would no longer collide.
pub fn slugify_with(input: &str, case: SlugCase) -> String {
    match case {
        SlugCase::Lower => slugify(input),
        SlugCase::Preserve => {
            let ascii = deunicode::deunicode(input);
            let mut out = String::with_capacity(ascii.len());
            let mut pending_hyphen = false;
            for c in ascii.chars() {
                if c.is_ascii_alphanumeric() {
                    if pending_hyphen && !out.is_empty() {
                        out.push('-');
                    }
                    pending_hyphen = false;
                    out.push(c);
                } else {
                    pending_hyphen = true;
                }
            }
            out
        }
    }
}

/// Represents a [`ContentItem`] tag. The `name` is the spelling as declared in
/// the front matter while the `slug` is the routing key. Tags compare and hash
/// by `slug` alone so e.g., `macOS` and `MacOS` are the same tag.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag as it was spelled by the author.
    pub name: String,

    /// The normalized routing key (see [`slugify`]).
    pub slug: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Tag {
        let name = name.into();
        let slug = slugify(&name);
        Tag { name, slug }
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `slug`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Tag {}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Tag", 2)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("slug", &self.slug)?;
        s.end()
    }
}

/// All of the [`ContentItem`]s which declare a tag normalizing to the same
/// slug.
#[derive(Debug)]
pub struct TagGroup<'a> {
    /// The spelling of the tag which appeared first in sort order.
    pub display_name: String,

    /// The tagged items, in the order they were indexed.
    pub items: Vec<&'a ContentItem>,
}

/// A mapping from tag slug to [`TagGroup`], iterated in slug order.
#[derive(Debug, Default)]
pub struct TagIndex<'a> {
    groups: BTreeMap<String, TagGroup<'a>>,
}

impl<'a> TagIndex<'a> {
    pub fn get(&self, slug: &str) -> Option<&TagGroup<'a>> {
        self.groups.get(slug)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TagGroup<'a>> {
        self.groups.iter()
    }
}

/// Groups `items` by tag slug. `items` should already be in listing order (see
/// [`crate::index::build_index`]); that order is kept within each group.
///
/// A group's `display_name` is whichever spelling contributed to the slug
/// first, so with `JavaScript` on a newer post and `javascript` on an older
/// one the group displays as `JavaScript`.
pub fn index_by_tag(items: &[ContentItem]) -> TagIndex<'_> {
    let mut groups: BTreeMap<String, TagGroup> = BTreeMap::new();
    for item in items {
        for tag in &item.tags {
            if tag.slug.is_empty() {
                continue;
            }
            let group = groups.entry(tag.slug.clone()).or_insert_with(|| TagGroup {
                display_name: tag.name.clone(),
                items: Vec::new(),
            });

            // an item declaring two spellings of one tag is listed once
            let already_listed = group
                .items
                .last()
                .map_or(false, |last| std::ptr::eq(*last, item));
            if !already_listed {
                group.items.push(item);
            }
        }
    }
    TagIndex { groups }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::parse_date;

    fn item(slug: &str, date: &str, tags: &[&str]) -> ContentItem {
        ContentItem {
            slug: slug.to_owned(),
            title: slug.to_owned(),
            description: String::new(),
            published_at: parse_date(date).unwrap(),
            modified_at: None,
            tags: tags.iter().map(|t| Tag::new(*t)).collect(),
        }
    }

    #[test]
    fn test_slugify_title() {
        assert_eq!("9-ways-to-write-better-code", slugify("9 ways to write better Code"));
    }

    #[test]
    fn test_slugify_collapses_punctuation_and_trims() {
        assert_eq!("javascript", slugify("   JavaScript -- "));
        assert_eq!("don-t-panic", slugify("\"Don't\" -- panic!"));
        assert_eq!("", slugify(" -- "));
    }

    #[test]
    fn test_slugify_idempotent() {
        for input in &[
            "9 ways to write better Code",
            "   JavaScript -- ",
            "C++ & Rust",
            "already-a-slug",
            "--a--b--",
            "Ünïcödé tag",
            "",
        ] {
            let once = slugify(input);
            assert_eq!(once, slugify(&once), "input: {:?}", input);
        }
    }

    #[test]
    fn test_slugify_preserve_case() {
        assert_eq!("JavaScript", slugify_with("   JavaScript -- ", SlugCase::Preserve));
        assert_eq!("Write-Better-Code", slugify_with("Write Better -- Code!", SlugCase::Preserve));
        assert_eq!("javascript", slugify_with("JavaScript", SlugCase::Lower));
    }

    #[test]
    fn test_slugify_preserve_case_transliterates() {
        assert_eq!("Unicode-Tag", slugify_with("Ünïcödé Tag", SlugCase::Preserve));
        for input in &["Ünïcödé Tag", "   JavaScript -- ", "C++ & Rust", "Crème Brûlée!"] {
            assert_eq!(
                slugify(input),
                slugify_with(input, SlugCase::Preserve).to_lowercase(),
                "input: {:?}",
                input
            );
        }
    }

    #[test]
    fn test_tags_equal_by_slug() {
        assert_eq!(Tag::new("JavaScript"), Tag::new("javascript"));
        assert_ne!(Tag::new("JavaScript"), Tag::new("Java"));
    }

    #[test]
    fn test_index_by_tag_merges_spellings() {
        let items = vec![
            item("c", "2020-03-01", &["JavaScript"]),
            item("b", "2020-02-01", &["rust"]),
            item("a", "2020-01-01", &["javascript", "Rust"]),
        ];
        let index = index_by_tag(&items);
        assert_eq!(2, index.len());

        let js = index.get("javascript").unwrap();
        assert_eq!("JavaScript", js.display_name);
        let slugs: Vec<&str> = js.items.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(vec!["c", "a"], slugs);
        assert!(js.items[0].published_at > js.items[1].published_at);

        let rust = index.get("rust").unwrap();
        assert_eq!("rust", rust.display_name);
        assert_eq!(2, rust.items.len());
    }

    #[test]
    fn test_index_by_tag_lists_item_once_per_group() {
        let items = vec![item("a", "2020-01-01", &["Rust", "rust", "RUST"])];
        let index = index_by_tag(&items);
        assert_eq!(1, index.get("rust").unwrap().items.len());
    }

    #[test]
    fn test_index_by_tag_skips_empty_slugs() {
        let items = vec![item("a", "2020-01-01", &["--", "ok"])];
        let index = index_by_tag(&items);
        let keys: Vec<&String> = index.iter().map(|(k, _)| k).collect();
        assert_eq!(vec!["ok"], keys);
    }
}
