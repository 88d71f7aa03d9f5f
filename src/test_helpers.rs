//! Shared test utilities for the content-bind test suite.
//!
//! Provides the fixture site and selector-based extractors for asserting on
//! rewritten HTML without comparing whole strings.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_site();
//! let html = std::fs::read_to_string(tmp.path().join("index.html")).unwrap();
//!
//! assert_eq!(select_text(&html, "h1"), vec!["Placeholder title"]);
//! assert_eq!(select_attr(&html, "img", "src").as_deref(), Some("static.jpg"));
//! ```

use scraper::{Html, Selector};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Selector extractors. Panic on an invalid selector.
// =========================================================================

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector '{css}': {e:?}"))
}

/// Trimmed text of every element matching `css`, in document order.
pub fn select_text(html: &str, css: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&selector(css))
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect()
}

/// Inner HTML of every element matching `css`, in document order.
pub fn select_inner_html(html: &str, css: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&selector(css)).map(|el| el.inner_html()).collect()
}

/// Attribute value on the first element matching `css`.
pub fn select_attr(html: &str, css: &str, attr: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&selector(css))
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}
