//! CLI output formatting for every command.
//!
//! # Page-First Display
//!
//! Every page is shown by its positional index, its file, and the document it
//! routes to. Per-binding details hang off the page as indented lines, so the
//! output reads as an inventory of the site.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! 001 index.html → home (6 written, 1 skipped)
//! 002 kitchen.html → kitchen (left as authored)
//!     content/kitchen.json: No such file or directory
//! Bound 1 of 2 pages, copied 9 files
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 index.html → home (7 bindings)
//!     cards[1].title at element 5: unresolved
//! 002 kitchen.html → kitchen (6 bindings)
//!     hero.tagline at element 2: empty after trim
//!     hero.image at picture 1: 8 of 8 image files missing
//!         assets/optimized/images/kitchen-1-1600.avif
//! Found 2 problems in 2 pages
//! ```
//!
//! ## Routes
//!
//! ```text
//! /                   → home
//! closet.html         → closet
//! *                   → home
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure and do no I/O.

use crate::check::{CheckReport, Problem};
use crate::images::{Codec, ImageReference, WIDTHS};
use crate::load::Routes;
use crate::site::BuildSummary;
use crate::types::{ElementRef, ImageSlot, SkipReason};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Page header: index, file, routed document.
///
/// ```text
/// 001 index.html → home
/// ```
fn page_header(index: usize, page: &Path, document: &str) -> String {
    format!(
        "{} {} \u{2192} {}",
        format_index(index),
        page.display(),
        document
    )
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Human label for an element reference, 1-based.
pub fn describe_target(target: ElementRef) -> String {
    match target {
        ElementRef::Marked(n) => format!("element {}", n + 1),
        ElementRef::Picture(n) => format!("picture {}", n + 1),
        ElementRef::PictureSlot { container, slot } => {
            format!("{} of picture {}", slot_label(slot), container + 1)
        }
        ElementRef::ProjectHeading(n) => format!("project item {}", n + 1),
    }
}

fn slot_label(slot: ImageSlot) -> &'static str {
    match slot {
        ImageSlot::Source(Codec::Avif) => "avif source",
        ImageSlot::Source(Codec::Webp) => "webp source",
        ImageSlot::Img => "img",
    }
}

fn describe_reason(reason: &SkipReason) -> String {
    match reason {
        SkipReason::Missing => "unresolved".to_string(),
        SkipReason::Null => "null".to_string(),
        SkipReason::Empty => "empty after trim".to_string(),
        SkipReason::Mismatch { found } => format!("unusable {found}"),
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(summary: &BuildSummary) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, page) in summary.pages.iter().enumerate() {
        let header = page_header(i + 1, &page.path, &page.document);
        match &page.abandoned {
            None => lines.push(format!(
                "{} ({} written, {} skipped)",
                header, page.writes, page.skips
            )),
            Some(reason) => {
                lines.push(format!("{} (left as authored)", header));
                lines.push(format!("{}{}", indent(1), truncate(reason, 100)));
            }
        }
    }
    lines.push(format!(
        "Bound {} of {}, copied {}",
        summary.bound_count(),
        plural(summary.pages.len(), "page"),
        plural(summary.copied, "file")
    ));
    lines
}

pub fn print_build_output(summary: &BuildSummary) {
    for line in format_build_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, page) in report.pages.iter().enumerate() {
        lines.push(format!(
            "{} ({})",
            page_header(i + 1, &page.page, &page.document),
            plural(page.bindings, "binding")
        ));
        for finding in &page.findings {
            let subject = match finding.target {
                Some(target) => format!("{} at {}", finding.path, describe_target(target)),
                None => finding.path.clone(),
            };
            match &finding.problem {
                Problem::Unavailable(e) => {
                    lines.push(format!(
                        "{}{}: document unavailable: {}",
                        indent(1),
                        subject,
                        truncate(e, 100)
                    ));
                }
                Problem::Skipped(reason) => {
                    lines.push(format!("{}{}: {}", indent(1), subject, describe_reason(reason)));
                }
                Problem::MissingAssets(urls) => {
                    lines.push(format!(
                        "{}{}: {} of {} image files missing",
                        indent(1),
                        subject,
                        urls.len(),
                        WIDTHS.len() * Codec::ALL.len()
                    ));
                    for url in urls {
                        lines.push(format!("{}{}", indent(2), url));
                    }
                }
            }
        }
    }
    if report.is_clean() {
        lines.push(format!(
            "All {} bind cleanly",
            plural(report.pages.len(), "page")
        ));
    } else {
        lines.push(format!(
            "Found {} in {}",
            plural(report.finding_count(), "problem"),
            plural(report.pages.len(), "page")
        ));
    }
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Routes
// ============================================================================

pub fn format_routes_output(routes: &Routes) -> Vec<String> {
    let mut rows: Vec<(String, &str)> = routes
        .entries()
        .map(|(page, id)| {
            let page = if page.is_empty() { "/" } else { page };
            (page.to_string(), id)
        })
        .collect();
    rows.push(("*".to_string(), routes.default_id()));

    let width = rows.iter().map(|(p, _)| p.len()).max().unwrap_or(0);
    rows.into_iter()
        .map(|(page, id)| format!("{:<width$} \u{2192} {}", page, id))
        .collect()
}

pub fn print_routes_output(routes: &Routes) {
    for line in format_routes_output(routes) {
        println!("{}", line);
    }
}

// ============================================================================
// Expand
// ============================================================================

pub fn format_expand_output(reference: &ImageReference) -> Vec<String> {
    let mut lines = vec![reference.base.clone()];
    for codec in Codec::ALL {
        lines.push(format!("{}{}", indent(1), codec.mime_type()));
        for variant in reference.variants(codec) {
            lines.push(format!("{}{:>5}w {}", indent(2), variant.width, variant.url));
        }
    }
    lines.push(format!("{}fallback {}", indent(1), reference.fallback));
    lines
}

pub fn print_expand_output(reference: &ImageReference) {
    for line in format_expand_output(reference) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{Finding, PageReport};
    use crate::images::{ImageNaming, expand};
    use crate::site::BuiltPage;
    use std::path::PathBuf;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn truncate_short_and_long() {
        assert_eq!(truncate("Short text", 40), "Short text");
        let text = "a".repeat(50);
        assert_eq!(truncate(&text, 40), format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééé", 2), "éé...");
    }

    #[test]
    fn targets_are_one_based() {
        assert_eq!(describe_target(ElementRef::Marked(0)), "element 1");
        assert_eq!(describe_target(ElementRef::Picture(2)), "picture 3");
        assert_eq!(describe_target(ElementRef::ProjectHeading(1)), "project item 2");
        assert_eq!(
            describe_target(ElementRef::PictureSlot {
                container: 0,
                slot: ImageSlot::Img
            }),
            "img of picture 1"
        );
        assert_eq!(
            describe_target(ElementRef::PictureSlot {
                container: 1,
                slot: ImageSlot::Source(Codec::Webp)
            }),
            "webp source of picture 2"
        );
    }

    fn page(path: &str, document: &str, abandoned: Option<&str>) -> BuiltPage {
        BuiltPage {
            path: PathBuf::from(path),
            document: document.to_string(),
            writes: 6,
            skips: 1,
            abandoned: abandoned.map(str::to_string),
        }
    }

    #[test]
    fn build_output_lists_pages_then_totals() {
        let summary = BuildSummary {
            pages: vec![
                page("index.html", "home", None),
                page("kitchen.html", "kitchen", Some("not found")),
            ],
            copied: 9,
        };
        assert_eq!(
            format_build_output(&summary),
            vec![
                "001 index.html \u{2192} home (6 written, 1 skipped)",
                "002 kitchen.html \u{2192} kitchen (left as authored)",
                "    not found",
                "Bound 1 of 2 pages, copied 9 files",
            ]
        );
    }

    #[test]
    fn check_output_details_each_problem() {
        let report = CheckReport {
            pages: vec![PageReport {
                page: PathBuf::from("kitchen.html"),
                document: "kitchen".into(),
                bindings: 6,
                findings: vec![
                    Finding {
                        path: "hero.tagline".into(),
                        target: Some(ElementRef::Marked(1)),
                        problem: Problem::Skipped(SkipReason::Empty),
                    },
                    Finding {
                        path: "hero.image".into(),
                        target: Some(ElementRef::Picture(0)),
                        problem: Problem::MissingAssets(vec!["a-400.avif".into()]),
                    },
                ],
            }],
        };
        assert_eq!(
            format_check_output(&report),
            vec![
                "001 kitchen.html \u{2192} kitchen (6 bindings)",
                "    hero.tagline at element 2: empty after trim",
                "    hero.image at picture 1: 1 of 8 image files missing",
                "        a-400.avif",
                "Found 2 problems in 1 page",
            ]
        );
    }

    #[test]
    fn clean_check_output() {
        let report = CheckReport {
            pages: vec![PageReport {
                page: PathBuf::from("index.html"),
                document: "home".into(),
                bindings: 1,
                findings: vec![],
            }],
        };
        let lines = format_check_output(&report);
        assert_eq!(lines.last().unwrap(), "All 1 page bind cleanly");
        assert_eq!(lines[0], "001 index.html \u{2192} home (1 binding)");
    }

    #[test]
    fn unavailable_document_line() {
        let report = CheckReport {
            pages: vec![PageReport {
                page: PathBuf::from("index.html"),
                document: "home".into(),
                bindings: 3,
                findings: vec![Finding {
                    path: "home".into(),
                    target: None,
                    problem: Problem::Unavailable("404".into()),
                }],
            }],
        };
        assert_eq!(
            format_check_output(&report)[1],
            "    home: document unavailable: 404"
        );
    }

    #[test]
    fn routes_output_aligns_and_ends_with_default() {
        let lines = format_routes_output(&Routes::builtin());
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "/                   \u{2192} home");
        assert_eq!(lines[4], "kitchen.html        \u{2192} kitchen");
        assert_eq!(lines[6], "*                   \u{2192} home");
    }

    #[test]
    fn expand_output_lists_both_codecs() {
        let lines = format_expand_output(&expand(Some("kitchen-1")).unwrap());
        assert_eq!(lines[0], "kitchen-1");
        assert_eq!(lines[1], "    image/avif");
        assert_eq!(lines[2], "         1600w assets/optimized/images/kitchen-1-1600.avif");
        assert_eq!(lines[6], "    image/webp");
        assert_eq!(lines.len(), 12);
        assert_eq!(
            lines[11],
            "    fallback assets/optimized/images/kitchen-1-800.webp"
        );
    }

    #[test]
    fn expand_output_uses_configured_directory() {
        let reference = ImageNaming::new("img").expand(Some("a")).unwrap();
        assert_eq!(format_expand_output(&reference)[5], "          400w img/a-400.avif");
    }
}
