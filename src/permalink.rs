//! Path templates and the helpers which turn site-relative route paths into
//! absolute URLs.

use serde::Deserialize;
use std::fmt;
use url::{ParseError, Url};

/// A site-relative path containing a `{name}` placeholder, e.g.
/// `/tag/{tag}` or `page/{page}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PathTemplate(String);

impl PathTemplate {
    pub fn new(template: impl Into<String>) -> PathTemplate {
        PathTemplate(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fails unless the template contains the `{placeholder}` placeholder.
    /// Templates without one would map every value onto the same path.
    pub fn require(&self, placeholder: &'static str) -> Result<(), MissingPlaceholder> {
        if self.0.contains(&format!("{{{}}}", placeholder)) {
            Ok(())
        } else {
            Err(MissingPlaceholder {
                template: self.0.clone(),
                placeholder,
            })
        }
    }

    /// Substitutes `value` for every `{placeholder}` in the template.
    pub fn expand(&self, placeholder: &str, value: &str) -> String {
        self.0.replace(&format!("{{{}}}", placeholder), value)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returned by [`PathTemplate::require`].
#[derive(Debug, PartialEq, Eq)]
pub struct MissingPlaceholder {
    pub template: String,
    pub placeholder: &'static str,
}

impl fmt::Display for MissingPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "path template `{}` must contain `{{{}}}`",
            self.template, self.placeholder
        )
    }
}

impl std::error::Error for MissingPlaceholder {}

/// Appends `suffix` to the `root` path with exactly one slash between them:
/// `join("/", "page/2")` is `/page/2` and `join("/tag/rust/", "/page/2")` is
/// `/tag/rust/page/2`. An empty suffix leaves `root` untouched.
pub fn join(root: &str, suffix: &str) -> String {
    let suffix = suffix.trim_start_matches('/');
    if suffix.is_empty() {
        return root.to_owned();
    }
    format!("{}/{}", root.trim_end_matches('/'), suffix)
}

/// Makes sure the URL's path ends with a slash. [`Url::join`] treats the last
/// path segment of a base without a trailing slash as a file name and drops
/// it, so `https://example.org/blog` joined with `page/2` would otherwise lose
/// `blog`.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Resolves a site-relative route path against the site URL. The path is
/// always treated as relative to `site_url`, so a site hosted under
/// `https://example.org/blog/` keeps its prefix.
pub fn absolute(site_url: &Url, path: &str) -> Result<Url, ParseError> {
    site_url.join(path.trim_start_matches('/'))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_join_root() {
        assert_eq!("/page/2", join("/", "page/2"));
    }

    #[test]
    fn test_join_nested_root() {
        assert_eq!("/tag/rust/page/2", join("/tag/rust", "page/2"));
    }

    #[test]
    fn test_join_redundant_slashes() {
        assert_eq!("/tag/rust/page/2", join("/tag/rust/", "/page/2"));
    }

    #[test]
    fn test_join_empty_suffix() {
        assert_eq!("/blog/", join("/blog/", ""));
    }

    #[test]
    fn test_expand() {
        let template = PathTemplate::new("/tag/{tag}");
        assert_eq!("/tag/rust", template.expand("tag", "rust"));
        assert_eq!("/tag/{tag}", template.expand("page", "2"));
    }

    #[test]
    fn test_require() {
        assert!(PathTemplate::new("page/{page}").require("page").is_ok());
        assert_eq!(
            Err(MissingPlaceholder {
                template: String::from("/tag/"),
                placeholder: "tag",
            }),
            PathTemplate::new("/tag/").require("tag"),
        );
    }

    #[test]
    fn test_absolute_root() -> Result<(), ParseError> {
        fixture("https://example.org/", "https://example.org/", "/")
    }

    #[test]
    fn test_absolute_page() -> Result<(), ParseError> {
        fixture("https://example.org/page/2", "https://example.org/", "/page/2")
    }

    #[test]
    fn test_absolute_keeps_site_prefix() -> Result<(), ParseError> {
        fixture(
            "https://example.org/blog/tag/rust",
            "https://example.org/blog/",
            "/tag/rust",
        )
    }

    #[test]
    fn test_absolute_adds_trailing_slash() -> Result<(), ParseError> {
        fixture(
            "https://example.org/blog/page/2",
            "https://example.org/blog",
            "/page/2",
        )
    }

    fn fixture(wanted: &str, site_url: &str, path: &str) -> Result<(), ParseError> {
        let site_url = with_trailing_slash(Url::parse(site_url)?);
        assert_eq!(wanted, absolute(&site_url, path)?.as_str());
        Ok(())
    }
}
