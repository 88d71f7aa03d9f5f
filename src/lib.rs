//! # Content Bind
//!
//! Declarative content binding for static HTML sites. Pages stay hand-authored;
//! elements opt in to content by carrying a marker attribute, and a per-page
//! JSON document supplies the values:
//!
//! ```html
//! <h1 data-content="hero.title">Placeholder</h1>
//! <p data-content="cards[0].body">Placeholder</p>
//! <picture data-image="hero.image">
//!   <source type="image/avif" srcset="…">
//!   <source type="image/webp" srcset="…">
//!   <img src="…" alt="Hero">
//! </picture>
//! ```
//!
//! # Architecture: Route, Fetch, Plan, Apply
//!
//! ```text
//! 1. Route   location   →  document id       (total table, default "home")
//! 2. Fetch   id         →  serde_json::Value (fresh, never cached)
//! 3. Plan    html + doc →  Plan { writes, skips }
//! 4. Apply   html + writes → html'
//! ```
//!
//! Planning is a pure function of the scanned page and the document, so every
//! resolution rule is tested without HTML in the loop. Applying replays the
//! writes with [lol_html](https://docs.rs/lol_html), touching only the elements
//! the plan names.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`path`] | Dotted / indexed path resolution over JSON |
//! | [`images`] | Image base name → AVIF/WebP `srcset` and fallback URLs |
//! | [`naming`] | Asset file naming shared with tools that produce the images |
//! | [`scan`] | Finds binding targets in a page, numbering them in document order |
//! | [`inject`] | Plans writes from a document and applies them to a page |
//! | [`load`] | Page routing, content sources (filesystem, HTTP), the loader |
//! | [`site`] | Binds a whole site in parallel and copies everything else |
//! | [`check`] | Development report of bindings that would not take effect |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`types`] | Marker names, element references, write and skip types |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fail Silent, Keep the Authored Page
//!
//! A missing document, a bad status, malformed JSON, or an unresolved path
//! never produces an error at the page level. The affected element keeps its
//! authored content and the reason is logged with `tracing`. A site therefore
//! renders the same with or without its content directory.
//!
//! ## Absent, Null, and Empty Are Different
//!
//! A path that does not exist, a path holding `null`, and a value that trims
//! to nothing all leave the element alone, but they are reported as separate
//! [`types::SkipReason`]s. `check` relies on this to tell authors which
//! mistake they made.
//!
//! ## Routing Is Data
//!
//! Page → document mapping is a table with a designated default, extendable
//! from `config.toml`. Every location resolves to some document.

pub mod check;
pub mod config;
pub mod images;
pub mod inject;
pub mod load;
pub mod naming;
pub mod output;
pub mod path;
pub mod scan;
pub mod site;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
