//! Derives plain-text excerpts from markdown post bodies. Used to fill in a
//! post's description when its front matter doesn't provide one.

use pulldown_cmark::{Event, Parser, Tag};

/// Marks the end of a post's summary. Everything after it is ignored when
/// building an excerpt.
pub const FOLD_TAG: &str = "<!-- more -->";

const ELLIPSIS: char = '…';

/// Renders `markdown` (up to the [`FOLD_TAG`], if any) to plain text with
/// whitespace collapsed, then truncates it to at most `max_chars` characters
/// (ellipsis included), preferring to cut at a word boundary.
pub fn excerpt(markdown: &str, max_chars: usize) -> String {
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Html(html) if html.contains(FOLD_TAG) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(_))
            | Event::End(Tag::Item)
            | Event::End(Tag::CodeBlock(_)) => text.push(' '),
            _ => {}
        }
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&text, max_chars)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    if max_chars == 0 {
        return String::new();
    }

    // leave room for the ellipsis
    let cut: String = text.chars().take(max_chars - 1).collect();
    let next_is_space = text
        .chars()
        .nth(max_chars - 1)
        .map_or(true, char::is_whitespace);
    let mut kept = match (next_is_space, cut.rfind(' ')) {
        (true, _) | (false, None) => cut.as_str(),
        (false, Some(i)) => &cut[..i],
    }
    .trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == ':')
    .to_owned();
    kept.push(ELLIPSIS);
    kept
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_excerpt_plain_text() {
        assert_eq!(
            "Hello world. This is emphasized and code.",
            excerpt("# Hello\n\nworld. This is *emphasized*\nand `code`.", 140),
        );
    }

    #[test]
    fn test_excerpt_stops_at_fold() {
        assert_eq!(
            "Summary only.",
            excerpt("Summary only.\n\n<!-- more -->\n\nThe rest of the post.", 140),
        );
    }

    #[test]
    fn test_excerpt_truncates_at_word_boundary() {
        assert_eq!("The quick brown…", excerpt("The quick brown fox jumps", 18));
    }

    #[test]
    fn test_excerpt_truncates_exact_word_end() {
        assert_eq!("The quick…", excerpt("The quick brown fox", 10));
    }

    #[test]
    fn test_excerpt_single_long_word() {
        assert_eq!("abcd…", excerpt("abcdefghij", 5));
    }

    #[test]
    fn test_excerpt_short_text_untouched() {
        assert_eq!("Short.", excerpt("Short.", 6));
    }

    #[test]
    fn test_excerpt_empty() {
        assert_eq!("", excerpt("", 140));
        assert_eq!("", excerpt("<!-- more -->\n\nbody", 140));
    }
}
