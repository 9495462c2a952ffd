//! Turns an indexed collection of [`ContentItem`]s into a flat route plan:
//! one [`Route`] per page the renderer has to produce, each carrying the
//! context that page needs.

use crate::config::Paths;
use crate::page::{InvalidArgument, Neighbors, Paginator};
use crate::permalink;
use crate::post::ContentItem;
use crate::tag::{index_by_tag, TagIndex};
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use url::{ParseError as UrlParseError, Url};

/// Responsible for planning the post, listing and tag routes of a site.
pub struct Planner<'a> {
    /// The absolute URL of the site root. Route paths are resolved against it
    /// for canonical and `rel=prev`/`rel=next` URLs.
    pub site_url: &'a Url,

    /// The route path conventions.
    pub paths: &'a Paths,

    /// The number of posts per listing page, for the main listing and every
    /// tag listing alike.
    pub page_size: usize,
}

impl Planner<'_> {
    /// Plans all routes for `items`, which must be in listing order (see
    /// [`crate::index::build_index`]). Routes come out as: post pages, the main
    /// listing's pages, the tag overview, then each tag's pages in tag-slug
    /// order.
    pub fn plan(&self, items: &[ContentItem]) -> Result<Plan> {
        let tags = index_by_tag(items);
        let mut routes = self.post_routes(items)?;

        let listing = Paginator::new(
            self.paths.listing.clone(),
            self.paths.page.clone(),
            self.page_size,
        )?;
        routes.extend(self.listing_routes(&listing, items, Context::Listing)?);

        routes.push(self.tag_overview_route(&tags)?);

        for (slug, group) in tags.iter() {
            let paginator =
                Paginator::new(self.tag_path(slug), self.paths.page.clone(), self.page_size)?;
            routes.extend(self.listing_routes(&paginator, &group.items, |page| Context::Tag {
                tag: slug.clone(),
                display_name: group.display_name.clone(),
                page,
            })?);
        }

        Ok(Plan { routes })
    }

    fn post_path(&self, item: &ContentItem) -> String {
        self.paths.post.expand("slug", &item.slug)
    }

    fn tag_path(&self, slug: &str) -> String {
        self.paths.tag.expand("tag", slug)
    }

    /// Creates a route for each post. `prev` is the newer neighbor and `next`
    /// the older one, following listing order.
    fn post_routes(&self, items: &[ContentItem]) -> Result<Vec<Route>> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| -> Result<Route> {
                let path = self.post_path(item);
                let newer = match i {
                    0 => None,
                    _ => items.get(i - 1),
                };
                let older = items.get(i + 1);
                let neighbors = Neighbors {
                    prev: newer.map(|newer| self.post_path(newer)),
                    next: older.map(|older| self.post_path(older)),
                };
                let seo = SeoLinks::new(self.site_url, &path, &neighbors)?;
                Ok(Route {
                    path,
                    context: Context::Post {
                        slug: item.slug.clone(),
                        title: item.title.clone(),
                        prev: newer.map(PostLink::new),
                        next: older.map(PostLink::new),
                        tags: item
                            .tags
                            .iter()
                            .map(|tag| TagLink {
                                name: tag.name.clone(),
                                slug: tag.slug.clone(),
                                path: self.tag_path(&tag.slug),
                            })
                            .collect(),
                        neighbors,
                        seo,
                    },
                })
            })
            .collect()
    }

    /// Creates one route per page of a listing. The page's [`Neighbors`] come
    /// from the [`Paginator`] and the [`SeoLinks`] are derived from those same
    /// neighbors.
    fn listing_routes<T, F>(&self, paginator: &Paginator, items: &[T], wrap: F) -> Result<Vec<Route>>
    where
        T: Borrow<ContentItem>,
        F: Fn(PageContext) -> Context,
    {
        paginator
            .paginate(items)?
            .into_iter()
            .map(|page| -> Result<Route> {
                let path = paginator.route_for_page(page.number)?;
                let neighbors = paginator.neighbors(page.number, page.total_pages)?;
                let seo = SeoLinks::new(self.site_url, &path, &neighbors)?;
                Ok(Route {
                    path,
                    context: wrap(PageContext {
                        page: page.number,
                        total_pages: page.total_pages,
                        items: page
                            .items
                            .iter()
                            .map(|i| {
                                let item: &ContentItem = i.borrow();
                                item.slug.clone()
                            })
                            .collect(),
                        neighbors,
                        seo,
                    }),
                })
            })
            .collect()
    }

    fn tag_overview_route(&self, tags: &TagIndex) -> Result<Route> {
        let path = self.paths.tags.clone();
        let seo = SeoLinks::new(self.site_url, &path, &Neighbors::default())?;
        Ok(Route {
            context: Context::Tags {
                tags: tags
                    .iter()
                    .map(|(slug, group)| TagSummary {
                        slug: slug.clone(),
                        display_name: group.display_name.clone(),
                        count: group.items.len(),
                        path: self.tag_path(slug),
                    })
                    .collect(),
                seo,
            },
            path,
        })
    }
}

/// The output unit: a site-relative path and the data needed to render it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Route {
    pub path: String,
    pub context: Context,
}

/// What a [`Route`] renders.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Context {
    /// A single post.
    Post {
        slug: String,
        title: String,
        /// The next newer post, if any. Its path is `neighbors.prev`.
        prev: Option<PostLink>,
        /// The next older post, if any. Its path is `neighbors.next`.
        next: Option<PostLink>,
        tags: Vec<TagLink>,
        neighbors: Neighbors,
        seo: SeoLinks,
    },

    /// A page of the main listing.
    Listing(PageContext),

    /// The overview of every tag.
    Tags { tags: Vec<TagSummary>, seo: SeoLinks },

    /// A page of one tag's listing.
    Tag {
        tag: String,
        display_name: String,
        page: PageContext,
    },
}

impl Context {
    /// Every site-relative path this context links to.
    fn links(&self) -> Vec<&str> {
        fn neighbor_links(neighbors: &Neighbors) -> impl Iterator<Item = &str> {
            neighbors
                .prev
                .iter()
                .chain(neighbors.next.iter())
                .map(String::as_str)
        }

        match self {
            Context::Post {
                tags, neighbors, ..
            } => neighbor_links(neighbors)
                .chain(tags.iter().map(|t| t.path.as_str()))
                .collect(),
            Context::Listing(page) | Context::Tag { page, .. } => {
                neighbor_links(&page.neighbors).collect()
            }
            Context::Tags { tags, .. } => tags.iter().map(|t| t.path.as_str()).collect(),
        }
    }
}

/// One page of a paginated listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageContext {
    /// 1-based page number.
    pub page: usize,
    pub total_pages: usize,

    /// Slugs of the posts on this page, in listing order.
    pub items: Vec<String>,
    pub neighbors: Neighbors,
    pub seo: SeoLinks,
}

/// What a post page shows of its neighboring posts. The link targets live in
/// the post's [`Neighbors`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PostLink {
    pub slug: String,
    pub title: String,
}

impl PostLink {
    fn new(item: &ContentItem) -> PostLink {
        PostLink {
            slug: item.slug.clone(),
            title: item.title.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagLink {
    pub name: String,
    pub slug: String,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagSummary {
    pub slug: String,
    pub display_name: String,
    pub count: usize,

    /// The tag listing's first page.
    pub path: String,
}

/// Absolute URLs for a page's `<link rel=canonical>`, `rel=prev` and
/// `rel=next` metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeoLinks {
    pub canonical: Url,
    pub prev: Option<Url>,
    pub next: Option<Url>,
}

impl SeoLinks {
    /// Resolves `path` and `neighbors` against `site_url`.
    pub fn new(site_url: &Url, path: &str, neighbors: &Neighbors) -> std::result::Result<SeoLinks, UrlParseError> {
        let resolve = |path: &Option<String>| {
            path.as_deref()
                .map(|p| permalink::absolute(site_url, p))
                .transpose()
        };
        Ok(SeoLinks {
            canonical: permalink::absolute(site_url, path)?,
            prev: resolve(&neighbors.prev)?,
            next: resolve(&neighbors.next)?,
        })
    }
}

/// The complete, ordered list of routes for a site.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Plan {
    pub routes: Vec<Route>,
}

impl Plan {
    pub fn get(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.path == path)
    }

    /// Fails if two routes share a path or if any route links to a path
    /// which isn't in the plan.
    pub fn validate(&self) -> Result<()> {
        let mut paths = HashSet::with_capacity(self.routes.len());
        for route in &self.routes {
            if !paths.insert(route.path.as_str()) {
                return Err(Error::DuplicatePath(route.path.clone()));
            }
        }
        for route in &self.routes {
            for link in route.context.links() {
                if !paths.contains(link) {
                    return Err(Error::DanglingLink {
                        from: route.path.clone(),
                        to: link.to_owned(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The result of a fallible route-planning operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error planning routes.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when pagination is asked for an impossible page.
    InvalidArgument(InvalidArgument),

    /// Returned when a route path can't be resolved against the site URL.
    UrlParse(UrlParseError),

    /// Returned when two routes map to the same path.
    DuplicatePath(String),

    /// Returned when a route links to a path no route provides.
    DanglingLink { from: String, to: String },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(err) => write!(f, "{}", err),
            Error::UrlParse(err) => write!(f, "{}", err),
            Error::DuplicatePath(path) => {
                write!(f, "more than one route maps to `{}`", path)
            }
            Error::DanglingLink { from, to } => {
                write!(f, "route `{}` links to `{}`, which no route provides", from, to)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidArgument(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::DuplicatePath(_) => None,
            Error::DanglingLink { .. } => None,
        }
    }
}

impl From<InvalidArgument> for Error {
    /// Converts an [`InvalidArgument`] into an [`Error`]. This allows us to
    /// use the `?` operator for pagination calls.
    fn from(err: InvalidArgument) -> Error {
        Error::InvalidArgument(err)
    }
}

impl From<UrlParseError> for Error {
    /// Converts a [`UrlParseError`] into an [`Error`]. This allows us to use
    /// the `?` operator when resolving URLs.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}
