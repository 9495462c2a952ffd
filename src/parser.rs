//! Defines the [`Parser`] and [`Error`] types. The parser loads
//! [`RawRecord`]s from post source files on disk; it validates nothing beyond
//! the front matter being well-formed YAML, leaving that to
//! [`crate::index::build_index`].

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use tracing::debug;
use walkdir::WalkDir;

use crate::{markdown, post::RawRecord};

const MARKDOWN_EXTENSION: &str = "md";
const BUNDLE_INDEX: &str = "index.md";

/// Parses [`RawRecord`] objects from source files.
pub struct Parser {
    /// `excerpt_length` is the maximum length in characters of descriptions
    /// derived from post bodies (see [`markdown::excerpt`]).
    excerpt_length: usize,
}

impl Parser {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(excerpt_length: usize) -> Parser {
        Parser { excerpt_length }
    }

    /// Searches a provided `source_directory` for post files and returns one
    /// [`RawRecord`] per post, ordered by path. A post is either a markdown
    /// file (`{source_directory}/foo.md`) or a bundle directory containing an
    /// `index.md` (`{source_directory}/foo/index.md`). Each post file must be
    /// structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter (see [`RawRecord`] for the fields)
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// tags: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_records(&self, source_directory: &Path) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        let walker = WalkDir::new(source_directory)
            .min_depth(1)
            // posts are `{dir}/foo.md` or `{dir}/foo/index.md`; nothing deeper
            .max_depth(2)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_file()
                || entry.path().extension().map_or(true, |ext| ext != MARKDOWN_EXTENSION)
            {
                continue;
            }
            // strip_prefix() should never fail since `source_directory` is an
            // ancestor of every entry
            let relative_path = entry
                .path()
                .strip_prefix(source_directory)
                .map_err(|_| InvalidFileNameError(entry.path().to_owned()))?;
            if entry.depth() > 1 && entry.file_name() != BUNDLE_INDEX {
                debug!(path = %relative_path.display(), "skipping non-index markdown inside a bundle");
                continue;
            }
            records.push(self.parse_record(source_directory, relative_path)?);
        }
        Ok(records)
    }

    /// Parses a single record from the file at `relative_path` (relative to
    /// `posts_source_directory`), annotating any error with the path.
    fn parse_record(&self, posts_source_directory: &Path, relative_path: &Path) -> Result<RawRecord> {
        match self._parse_record(posts_source_directory, relative_path) {
            Ok(record) => Ok(record),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", relative_path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_record(&self, posts_source_directory: &Path, relative_path: &Path) -> Result<RawRecord> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(posts_source_directory.join(relative_path))?.read_to_string(&mut contents)?;

        let mut record = self.parse_str(&contents)?;
        if record.slug.is_none() {
            record.slug = Some(default_slug(relative_path)?);
        }
        record.source = Some(relative_path.display().to_string());
        Ok(record)
    }

    /// Parses a record from the contents of a post file. The record's
    /// `description` falls back to an excerpt of the body.
    pub fn parse_str(&self, input: &str) -> Result<RawRecord> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            // the closing fence must start a line so that e.g. `title: a---b`
            // doesn't end the frontmatter
            match input[FENCE.len()..].find("\n---") {
                None => Err(Error::FrontmatterMissingEndFence),
                Some(offset) => Ok((
                    FENCE.len(),                            // yaml_start
                    FENCE.len() + offset + 1,               // yaml_stop
                    FENCE.len() + offset + 1 + FENCE.len(), // body_start
                )),
            }
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let yaml = &input[yaml_start..yaml_stop];
        let mut record: RawRecord = match yaml.trim().is_empty() {
            true => RawRecord::default(),
            false => serde_yaml::from_str(yaml)?,
        };

        if record.description.is_none() {
            let excerpt = markdown::excerpt(&input[body_start..], self.excerpt_length);
            if !excerpt.is_empty() {
                record.description = Some(excerpt);
            }
        }
        Ok(record)
    }
}

/// The slug for a post whose frontmatter doesn't name one: the file stem for
/// plain posts (`foo.md` -> `foo`), the directory name for bundles
/// (`foo/index.md` -> `foo`).
fn default_slug(relative_path: &Path) -> Result<String> {
    let stem = match relative_path.file_name() {
        Some(name) if name == BUNDLE_INDEX => relative_path
            .parent()
            .and_then(Path::file_name)
            .or_else(|| relative_path.file_stem()),
        _ => relative_path.file_stem(),
    };
    stem.and_then(|s| s.to_str())
        .map(str::to_owned)
        .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()).into())
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    /// Implements the [`std::error::Error`] trait for [`InvalidFileNameError`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Represents the result of a [`RawRecord`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`RawRecord`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "{}", err),
            Error::WalkDir(err) => write!(f, "{}", err),
            Error::InvalidFileName(err) => write!(f, "{}", err),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
