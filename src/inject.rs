//! Content injection: plan the writes, then apply them.
//!
//! ```text
//! html ──scan──► ScannedPage ─┐
//!                             ├─plan──► Plan { writes, skips } ──apply──► html'
//! document ───────────────────┘
//! ```
//!
//! [`plan`] is a pure function of the scanned page and the document, so every
//! resolution rule can be tested without touching HTML. [`apply`] replays the
//! writes onto the page. [`inject`] chains the three and never fails: any
//! problem leaves the page exactly as it was.
//!
//! ## Value gates
//!
//! A text binding writes only when the path resolves, the value is not
//! `null`, and the value is non-empty once trimmed. Each gate that stops a
//! write is reported as its own [`SkipReason`]. Existing markup is never
//! blanked.
//!
//! ## Special cases
//!
//! - `footer.contact` is written as markup: the `address`, `phone` and
//!   `email` fields joined with `<br>`. Field values are escaped.
//! - A top-level `projects` array fills the first `h4` of each
//!   `.project-item`, pairing by position. Headings that carry their own
//!   `data-content` are left to that binding.

use crate::images::ImageNaming;
use crate::path::resolve;
use crate::scan::{ScanError, ScannedPage, scan, walk};
use crate::types::{
    COMPOSITE_CONTACT_PATH, CONTACT_FIELDS, ElementRef, Field, ImageSlot, PROJECTS_KEY, Skip,
    SkipReason, Write, json_kind,
};
use lol_html::html_content::ContentType;
use maud::html;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Planned writes and the bindings that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub writes: Vec<Write>,
    pub skips: Vec<Skip>,
}

/// Result of one injection pass.
#[derive(Debug, Clone)]
pub struct Injection {
    pub html: String,
    pub plan: Plan,
}

impl Injection {
    fn unchanged(html: &str) -> Self {
        Self {
            html: html.to_string(),
            plan: Plan::default(),
        }
    }
}

/// Scan `html`, plan against `document`, apply. Never fails.
pub fn inject(html: &str, document: Option<&Value>, naming: &ImageNaming) -> Injection {
    let document = match document {
        Some(Value::Null) | None => {
            warn!("no content document; page left as authored");
            return Injection::unchanged(html);
        }
        Some(doc) => doc,
    };

    let page = match scan(html) {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "could not scan page for bindings");
            return Injection::unchanged(html);
        }
    };
    debug!(
        targets = page.targets.len(),
        project_items = page.project_items,
        "scanned page"
    );

    let plan = plan(document, &page, naming);
    for skip in &plan.skips {
        debug!(path = %skip.path, reason = ?skip.reason, "binding skipped");
    }

    match apply(html, &plan.writes) {
        Ok(out) => Injection { html: out, plan },
        Err(e) => {
            warn!(error = %e, "could not apply content writes");
            Injection::unchanged(html)
        }
    }
}

/// Decide every write for a scanned page. Pure.
pub fn plan(document: &Value, page: &ScannedPage, naming: &ImageNaming) -> Plan {
    let mut plan = Plan::default();

    for (ordinal, path) in page.text_targets() {
        let target = ElementRef::Marked(ordinal);
        let outcome = if path == COMPOSITE_CONTACT_PATH {
            contact_markup(resolve(document, path)).map(|m| (Field::Markup, m))
        } else {
            text_value(resolve(document, path)).map(|t| (Field::Text, t))
        };
        plan.record(target, path, outcome);
    }

    for (container, path, slots) in page.image_targets() {
        match image_base(resolve(document, path)) {
            Ok(base) => {
                // `image_base` only returns non-empty names, which always expand.
                if let Some(reference) = naming.expand(Some(base)) {
                    for &slot in slots {
                        let (field, value) = match slot {
                            ImageSlot::Source(codec) => (Field::SrcSet, reference.srcset(codec)),
                            ImageSlot::Img => (Field::Src, reference.fallback.clone()),
                        };
                        plan.writes.push(Write {
                            target: ElementRef::PictureSlot { container, slot },
                            field,
                            value,
                        });
                    }
                }
            }
            Err(reason) => plan.skip(ElementRef::Picture(container), path, reason),
        }
    }

    if let Some(projects) = document.get(PROJECTS_KEY).and_then(Value::as_array) {
        for item in page.project_headings() {
            let path = format!("{}[{}].title", PROJECTS_KEY, item);
            let outcome = match projects.get(item) {
                None => Err(SkipReason::Missing),
                Some(Value::Null) => Err(SkipReason::Null),
                Some(Value::Object(project)) => text_value(project.get("title")),
                Some(other) => Err(SkipReason::Mismatch {
                    found: json_kind(other),
                }),
            };
            plan.record(
                ElementRef::ProjectHeading(item),
                &path,
                outcome.map(|t| (Field::Text, t)),
            );
        }
    }

    plan
}

impl Plan {
    fn record(&mut self, target: ElementRef, path: &str, outcome: Result<(Field, String), SkipReason>) {
        match outcome {
            Ok((field, value)) => self.writes.push(Write {
                target,
                field,
                value,
            }),
            Err(reason) => self.skip(target, path, reason),
        }
    }

    fn skip(&mut self, target: ElementRef, path: &str, reason: SkipReason) {
        self.skips.push(Skip {
            target,
            path: path.to_string(),
            reason,
        });
    }
}

/// Text for a plain binding: scalars only, trimmed, never empty.
fn text_value(value: Option<&Value>) -> Result<String, SkipReason> {
    let text = match value {
        None => return Err(SkipReason::Missing),
        Some(Value::Null) => return Err(SkipReason::Null),
        Some(v) => scalar_text(v).ok_or(SkipReason::Mismatch { found: json_kind(v) })?,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(SkipReason::Empty)
    } else {
        Ok(trimmed.to_string())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `address<br>phone<br>email`, leaving out fields that are absent or blank.
fn contact_markup(value: Option<&Value>) -> Result<String, SkipReason> {
    let contact = match value {
        None => return Err(SkipReason::Missing),
        Some(Value::Null) => return Err(SkipReason::Null),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(SkipReason::Mismatch {
                found: json_kind(other),
            });
        }
    };
    let lines: Vec<String> = CONTACT_FIELDS
        .iter()
        .filter_map(|field| contact.get(*field).and_then(scalar_text))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(SkipReason::Empty);
    }
    let markup = html! {
        @for (i, line) in lines.iter().enumerate() {
            @if i > 0 { br; }
            (line)
        }
    };
    Ok(markup.into_string())
}

/// Image bindings need a non-empty string base name.
fn image_base(value: Option<&Value>) -> Result<&str, SkipReason> {
    match value {
        None => Err(SkipReason::Missing),
        Some(Value::Null) => Err(SkipReason::Null),
        Some(Value::String(s)) if s.is_empty() => Err(SkipReason::Empty),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(SkipReason::Mismatch {
            found: json_kind(other),
        }),
    }
}

/// Perform planned writes on `html`. Elements without a write pass through
/// untouched, as do slots a write names but the page lacks.
pub fn apply(html: &str, writes: &[Write]) -> Result<String, ScanError> {
    if writes.is_empty() {
        return Ok(html.to_string());
    }
    let by_target: HashMap<ElementRef, &Write> = writes.iter().map(|w| (w.target, w)).collect();

    walk(html, |visit, el| {
        let write = match visit.element_ref().and_then(|r| by_target.get(&r)) {
            Some(write) => write,
            None => return Ok(()),
        };
        match write.field {
            Field::Text => el.set_inner_content(&write.value, ContentType::Text),
            Field::Markup => el.set_inner_content(&write.value, ContentType::Html),
            Field::SrcSet => el.set_attribute("srcset", &write.value)?,
            Field::Src => el.set_attribute("src", &write.value)?,
        }
        Ok(())
    })
}
