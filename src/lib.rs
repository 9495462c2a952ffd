//! The library code for the `quire` page planner. Given the posts of a blog,
//! it works out every page a static site generator has to render and hands
//! back a flat list of routes. The architecture can be generally broken down
//! into three steps:
//!
//! 1. Loading raw front matter records from source files on disk
//!    ([`crate::parser`])
//! 2. Validating, deduplicating and sorting them into the content index
//!    ([`crate::index`])
//! 3. Planning the routes for that index ([`crate::route`])
//!
//! Of the three, the third step is the more involved. It plans a page for
//! every post, then groups the posts into "listings": one for all posts and
//! one per tag ([`crate::tag`]). Each listing is paginated
//! ([`crate::page`])--split into pages of a configurable number of posts--and
//! every page knows its previous and next pages so the renderer can emit
//! `rel=prev`/`rel=next` links that agree with the pages that actually exist.
//!
//! Rendering the routes is left to whoever consumes the plan.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod index;
pub mod markdown;
pub mod page;
pub mod parser;
pub mod permalink;
pub mod post;
pub mod route;
pub mod tag;
