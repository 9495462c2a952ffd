//! Loads the project configuration from `quire.yaml`. The configuration is an
//! explicit value handed to the planner; nothing reads it from global state.

use crate::permalink::{self, MissingPlaceholder, PathTemplate};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file [`Config::from_directory`] looks for.
pub const PROJECT_FILE: &str = "quire.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(5)
    }
}

#[derive(Deserialize)]
struct ExcerptLength(usize);
impl Default for ExcerptLength {
    fn default() -> Self {
        ExcerptLength(140)
    }
}

/// Route path conventions. Every path is site-relative.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// The root of the main listing; page 1 of the listing lives here.
    pub listing: String,

    /// The suffix appended to a listing root for pages 2 and up. Must contain
    /// `{page}`.
    pub page: PathTemplate,

    /// The root of each tag's listing. Must contain `{tag}`.
    pub tag: PathTemplate,

    /// The page listing every tag.
    pub tags: String,

    /// The page for a single post. Must contain `{slug}`.
    pub post: PathTemplate,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            listing: String::from("/"),
            page: PathTemplate::new("page/{page}"),
            tag: PathTemplate::new("/tag/{tag}"),
            tags: String::from("/tags"),
            post: PathTemplate::new("/{slug}"),
        }
    }
}

impl Paths {
    fn validate(&self) -> Result<()> {
        self.page.require("page")?;
        self.tag.require("tag")?;
        self.post.require("slug")?;
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    pub site_url: Url,

    #[serde(default)]
    pub page_size: PageSize,

    #[serde(default)]
    pub excerpt_length: ExcerptLength,

    #[serde(default)]
    pub paths: Paths,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// The absolute URL of the site's root, always ending in a slash.
    pub site_url: Url,

    /// The number of posts per listing page.
    pub page_size: usize,

    /// The maximum length of descriptions derived from post bodies.
    pub excerpt_length: usize,

    pub paths: Paths,

    /// The directory holding the post sources (`{project}/posts`).
    pub posts_source_directory: PathBuf,
}

impl Config {
    /// A configuration with every setting at its default.
    pub fn new(site_url: Url, posts_source_directory: PathBuf) -> Config {
        Config {
            site_url: permalink::with_trailing_slash(site_url),
            page_size: PageSize::default().0,
            excerpt_length: ExcerptLength::default().0,
            paths: Paths::default(),
            posts_source_directory,
        }
    }

    /// Looks for [`PROJECT_FILE`] in `dir`, then in each of its ancestors,
    /// and loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let dir = dir.canonicalize().map_err(|err| Error::Io {
            path: dir.to_owned(),
            err,
        })?;
        let mut current = Some(dir.as_path());
        while let Some(candidate) = current {
            let path = candidate.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path);
            }
            current = candidate.parent();
        }
        Err(Error::ProjectFileNotFound(dir))
    }

    /// Loads the configuration from the project file at `path`. Post sources
    /// are expected in the `posts` directory next to it.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Yaml {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParentDirectory(path.to_owned()))?;
        Config::from_project(project, project_root)
    }

    /// Loads the configuration from YAML text, as if it were the project file
    /// of `project_root`.
    pub fn from_yaml_str(input: &str, project_root: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_str(input).map_err(|err| Error::Yaml {
            path: project_root.join(PROJECT_FILE),
            err,
        })?;
        Config::from_project(project, project_root)
    }

    fn from_project(project: Project, project_root: &Path) -> Result<Config> {
        if project.page_size.0 == 0 {
            return Err(Error::InvalidPageSize);
        }
        project.paths.validate()?;
        Ok(Config {
            site_url: permalink::with_trailing_slash(project.site_url),
            page_size: project.page_size.0,
            excerpt_length: project.excerpt_length.0,
            paths: project.paths,
            posts_source_directory: project_root.join("posts"),
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or its
    /// ancestors.
    ProjectFileNotFound(PathBuf),

    /// Returned when the project file has no parent directory.
    NoParentDirectory(PathBuf),

    /// Returned when the project file isn't valid YAML or has the wrong
    /// shape.
    Yaml { path: PathBuf, err: serde_yaml::Error },

    /// Returned when `page_size` is 0.
    InvalidPageSize,

    /// Returned when a path template lacks its placeholder.
    Template(MissingPlaceholder),

    /// Returned for I/O problems reading the project file.
    Io { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound(dir) => write!(
                f,
                "Could not find `{}` in `{}` or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::NoParentDirectory(path) => write!(
                f,
                "Can't get parent directory for project file `{}`",
                path.display()
            ),
            Error::Yaml { path, err } => {
                write!(f, "Loading configuration `{}`: {}", path.display(), err)
            }
            Error::InvalidPageSize => write!(f, "`page_size` must be at least 1"),
            Error::Template(err) => write!(f, "{}", err),
            Error::Io { path, err } => write!(f, "Reading `{}`: {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectFileNotFound(_) => None,
            Error::NoParentDirectory(_) => None,
            Error::Yaml { path: _, err } => Some(err),
            Error::InvalidPageSize => None,
            Error::Template(err) => Some(err),
            Error::Io { path: _, err } => Some(err),
        }
    }
}

impl From<MissingPlaceholder> for Error {
    fn from(err: MissingPlaceholder) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() -> Result<()> {
        let config = Config::from_yaml_str("site_url: https://example.org\n", Path::new("/blog"))?;
        assert_eq!("https://example.org/", config.site_url.as_str());
        assert_eq!(5, config.page_size);
        assert_eq!(140, config.excerpt_length);
        assert_eq!(Paths::default(), config.paths);
        assert_eq!(PathBuf::from("/blog/posts"), config.posts_source_directory);
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<()> {
        let config = Config::from_yaml_str(
            "site_url: https://example.org/blog\npage_size: 10\npaths:\n  listing: /articles\n  tag: /topics/{tag}\n",
            Path::new("/blog"),
        )?;
        assert_eq!("https://example.org/blog/", config.site_url.as_str());
        assert_eq!(10, config.page_size);
        assert_eq!("/articles", config.paths.listing);
        assert_eq!("/topics/{tag}", config.paths.tag.as_str());
        assert_eq!("page/{page}", config.paths.page.as_str());
        Ok(())
    }

    #[test]
    fn test_zero_page_size_rejected() {
        match Config::from_yaml_str("site_url: https://example.org\npage_size: 0\n", Path::new("/")) {
            Err(Error::InvalidPageSize) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_negative_page_size_rejected() {
        match Config::from_yaml_str("site_url: https://example.org\npage_size: -5\n", Path::new("/")) {
            Err(Error::Yaml { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        match Config::from_yaml_str(
            "site_url: https://example.org\npaths:\n  page: pages\n",
            Path::new("/"),
        ) {
            Err(Error::Template(err)) => assert_eq!("page", err.placeholder),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_directory_searches_parents() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        std::fs::write(root.path().join(PROJECT_FILE), "site_url: https://example.org\npage_size: 3\n")?;
        let nested = root.path().join("posts").join("drafts");
        std::fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!(3, config.page_size);
        assert_eq!(
            root.path().canonicalize()?.join("posts"),
            config.posts_source_directory
        );
        Ok(())
    }

    #[test]
    fn test_from_directory_missing_directory() {
        match Config::from_directory(Path::new("./testdata/does-not-exist")) {
            Err(Error::Io { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
