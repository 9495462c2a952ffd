//! Exports the [`build_plan`] function which stitches together the high-level
//! steps of planning a site: loading records ([`crate::parser`]), building the
//! content index ([`crate::index`]), and planning routes ([`crate::route`]).

use crate::config::Config;
use crate::index::{build_index, Index};
use crate::parser::{Error as ParseError, Parser};
use crate::route::{Error as RouteError, Plan, Planner};
use std::fmt;
use std::io::Write;
use tracing::info;

/// The outcome of a build: the content index (including any warnings it
/// surfaced) and the validated route plan.
#[derive(Debug)]
pub struct Build {
    pub index: Index,
    pub plan: Plan,
}

/// Builds the route plan from a [`Config`] object. This calls into
/// [`Parser::parse_records`], [`build_index`] and [`Planner::plan`] which do
/// the heavy-lifting, and fails if the resulting plan is inconsistent (see
/// [`Plan::validate`]).
pub fn build_plan(config: &Config) -> Result<Build> {
    let parser = Parser::new(config.excerpt_length);
    let records = parser.parse_records(&config.posts_source_directory)?;
    let record_count = records.len();

    let index = build_index(records);

    let planner = Planner {
        site_url: &config.site_url,
        paths: &config.paths,
        page_size: config.page_size,
    };
    let plan = planner.plan(&index.items)?;
    plan.validate()?;

    info!(
        records = record_count,
        items = index.items.len(),
        warnings = index.warnings.len(),
        routes = plan.routes.len(),
        "planned site"
    );
    Ok(Build { index, plan })
}

/// Writes the plan to `w` as YAML.
pub fn write_plan<W: Write>(plan: &Plan, w: W) -> Result<()> {
    serde_yaml::to_writer(w, plan)?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a plan. Errors can be during parsing, route
/// planning, or serialization.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors planning routes, including plan validation.
    Route(RouteError),

    /// Returned for errors writing the plan.
    Serialize(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "{}", err),
            Error::Route(err) => write!(f, "{}", err),
            Error::Serialize(err) => write!(f, "Writing plan: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Route(err) => Some(err),
            Error::Serialize(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<RouteError> for Error {
    /// Converts [`RouteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: RouteError) -> Error {
        Error::Route(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts [`serde_yaml::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: serde_yaml::Error) -> Error {
        Error::Serialize(err)
    }
}
