//! Pagination: partitions a sorted collection into fixed-size [`Page`]s and
//! computes page routes and their previous/next neighbors.
//!
//! Page 1 lives at the listing root (e.g., `/` or `/tag/rust`) while every
//! later page lives under the root plus a page suffix (e.g., `/page/2` or
//! `/tag/rust/page/2`). There is no `/page/1`.

use crate::permalink::{self, PathTemplate};
use serde::Serialize;
use std::fmt;

/// A window over a sorted sequence. Pages partition their sequence
/// contiguously and exhaustively; page 1 holds the first (most recent) items.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    /// 1-based page number.
    pub number: usize,
    pub total_pages: usize,

    /// At most `page_size` items; exactly `page_size` except possibly on the
    /// last page.
    pub items: &'a [T],
}

/// The number of pages needed to hold `len` items, `page_size` per page. Never
/// less than 1: an empty collection still gets an (empty) first page.
pub fn total_pages(len: usize, page_size: usize) -> Result<usize> {
    if page_size == 0 {
        return Err(InvalidArgument::PageSize(page_size));
    }
    Ok(std::cmp::max(1, (len + page_size - 1) / page_size))
}

/// Splits `items` into pages of `page_size`. Item order is preserved, so page
/// `n` holds `items[(n-1)*page_size..n*page_size]` (clipped to the end).
pub fn paginate<T>(items: &[T], page_size: usize) -> Result<Vec<Page<'_, T>>> {
    let total = total_pages(items.len(), page_size)?;
    if items.is_empty() {
        return Ok(vec![Page {
            number: 1,
            total_pages: total,
            items,
        }]);
    }
    Ok(items
        .chunks(page_size)
        .enumerate()
        .map(|(i, chunk)| Page {
            number: i + 1,
            total_pages: total,
            items: chunk,
        })
        .collect())
}

/// The routes adjacent to a page. These are the targets for `rel=prev` and
/// `rel=next`; the route plan and the link metadata both read them from here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Neighbors {
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Computes routes for the pages of one listing, e.g. the main listing rooted
/// at `/` or a tag listing rooted at `/tag/rust`.
#[derive(Clone, Debug)]
pub struct Paginator {
    root: String,
    suffix: PathTemplate,
    page_size: usize,
}

impl Paginator {
    /// Constructs a paginator for the listing at `root`. `suffix` is appended
    /// to `root` for pages 2 and up and must contain a `{page}` placeholder.
    pub fn new(root: impl Into<String>, suffix: PathTemplate, page_size: usize) -> Result<Paginator> {
        if page_size == 0 {
            return Err(InvalidArgument::PageSize(page_size));
        }
        Ok(Paginator {
            root: root.into(),
            suffix,
            page_size,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn paginate<'a, T>(&self, items: &'a [T]) -> Result<Vec<Page<'a, T>>> {
        paginate(items, self.page_size)
    }

    /// Returns the path of page `page`: the root for page 1, the root plus
    /// the expanded suffix otherwise.
    pub fn route_for_page(&self, page: usize) -> Result<String> {
        match page {
            0 => Err(InvalidArgument::PageNumber {
                page,
                total_pages: None,
            }),
            1 => Ok(self.root.clone()),
            n => Ok(permalink::join(
                &self.root,
                &self.suffix.expand("page", &n.to_string()),
            )),
        }
    }

    /// Returns the routes of the pages before and after `page`. `prev` is
    /// `None` on the first page and `next` is `None` on the last.
    pub fn neighbors(&self, page: usize, total_pages: usize) -> Result<Neighbors> {
        if page == 0 || page > total_pages {
            return Err(InvalidArgument::PageNumber {
                page,
                total_pages: Some(total_pages),
            });
        }
        Ok(Neighbors {
            prev: match page {
                1 => None,
                _ => Some(self.route_for_page(page - 1)?),
            },
            next: match page < total_pages {
                false => None,
                true => Some(self.route_for_page(page + 1)?),
            },
        })
    }
}

/// The result of a fallible pagination operation.
pub type Result<T> = std::result::Result<T, InvalidArgument>;

/// Returned when pagination is asked for something that cannot exist. This
/// always indicates a bug in the caller's page plan, so it is never clamped
/// or swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    /// Returned when the page size is not positive.
    PageSize(usize),

    /// Returned when a page number falls outside `[1, total_pages]` (or is 0
    /// when the total isn't known).
    PageNumber {
        page: usize,
        total_pages: Option<usize>,
    },
}

impl fmt::Display for InvalidArgument {
    /// Displays an [`InvalidArgument`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidArgument::PageSize(size) => {
                write!(f, "invalid argument: page size must be positive, got {}", size)
            }
            InvalidArgument::PageNumber {
                page,
                total_pages: Some(total),
            } => write!(
                f,
                "invalid argument: page {} is outside [1, {}]",
                page, total
            ),
            InvalidArgument::PageNumber {
                page,
                total_pages: None,
            } => write!(f, "invalid argument: page {} is not a page number", page),
        }
    }
}

impl std::error::Error for InvalidArgument {}
