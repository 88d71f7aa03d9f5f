//! Binding discovery.
//!
//! Finds every element the injector may write to:
//!
//! | Selector | Target |
//! |----------|--------|
//! | `[data-content]` | text/markup binding, path from the attribute |
//! | `picture[data-image]` | image binding, path from the attribute |
//! | `source[type="image/avif"]`, `source[type="image/webp"]`, `img` inside it | image slots (first of each) |
//! | first `h4` inside each `.project-item` | project heading, when it has no `data-content` |
//!
//! Scanning and applying both go through [`walk`], which numbers elements in
//! document order per kind. The numbers are the [`ElementRef`]s carried by
//! planned writes, so the two passes always agree on which element is which.

use crate::images::Codec;
use crate::types::{ElementRef, IMAGE_MARKER, ImageSlot, TEXT_MARKER};
use lol_html::errors::RewritingError;
use lol_html::html_content::Element;
use lol_html::{HandlerResult, RewriteStrSettings, element, rewrite_str};
use std::cell::RefCell;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTML rewrite failed: {0}")]
    Rewrite(#[from] RewritingError),
}

/// An element that carries (or is inferred to carry) a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingTarget {
    Text {
        ordinal: usize,
        path: String,
    },
    Image {
        ordinal: usize,
        path: String,
        /// Slots present inside the container, in document order.
        slots: Vec<ImageSlot>,
    },
    /// Unmarked heading of the n-th project item.
    ProjectHeading { item: usize },
}

impl BindingTarget {
    pub fn path(&self) -> Option<&str> {
        match self {
            BindingTarget::Text { path, .. } | BindingTarget::Image { path, .. } => Some(path),
            BindingTarget::ProjectHeading { .. } => None,
        }
    }
}

/// Everything found on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedPage {
    pub targets: Vec<BindingTarget>,
    /// Number of `.project-item` elements, marked or not.
    pub project_items: usize,
}

impl ScannedPage {
    pub fn text_targets(&self) -> impl Iterator<Item = (usize, &str)> {
        self.targets.iter().filter_map(|t| match t {
            BindingTarget::Text { ordinal, path } => Some((*ordinal, path.as_str())),
            _ => None,
        })
    }

    pub fn image_targets(&self) -> impl Iterator<Item = (usize, &str, &[ImageSlot])> {
        self.targets.iter().filter_map(|t| match t {
            BindingTarget::Image {
                ordinal,
                path,
                slots,
            } => Some((*ordinal, path.as_str(), slots.as_slice())),
            _ => None,
        })
    }

    pub fn project_headings(&self) -> impl Iterator<Item = usize> + '_ {
        self.targets.iter().filter_map(|t| match t {
            BindingTarget::ProjectHeading { item } => Some(*item),
            _ => None,
        })
    }
}

/// Collect binding targets from a page.
pub fn scan(html: &str) -> Result<ScannedPage, ScanError> {
    let mut page = ScannedPage::default();
    let mut current_picture: Option<usize> = None;

    walk(html, |visit, _el| {
        match visit {
            Visit::Marked { ordinal, path } => page.targets.push(BindingTarget::Text {
                ordinal,
                path: path.to_string(),
            }),
            Visit::Picture { ordinal, path } => {
                current_picture = Some(page.targets.len());
                page.targets.push(BindingTarget::Image {
                    ordinal,
                    path: path.to_string(),
                    slots: Vec::new(),
                });
            }
            Visit::Slot { container, slot } => {
                if let Some(BindingTarget::Image { ordinal, slots, .. }) =
                    current_picture.and_then(|i| page.targets.get_mut(i))
                {
                    if *ordinal == container {
                        slots.push(slot);
                    }
                }
            }
            Visit::ProjectItem => page.project_items += 1,
            Visit::ProjectHeading { item, marked } => {
                if !marked {
                    page.targets.push(BindingTarget::ProjectHeading { item });
                }
            }
        }
        Ok(())
    })?;

    Ok(page)
}

/// An element reached during a [`walk`].
#[derive(Debug)]
pub(crate) enum Visit<'a> {
    Marked { ordinal: usize, path: &'a str },
    Picture { ordinal: usize, path: &'a str },
    Slot { container: usize, slot: ImageSlot },
    ProjectItem,
    /// First `h4` of a project item; `marked` if it carries its own binding.
    ProjectHeading { item: usize, marked: bool },
}

impl Visit<'_> {
    /// The reference a write to this element would carry.
    pub(crate) fn element_ref(&self) -> Option<ElementRef> {
        match *self {
            Visit::Marked { ordinal, .. } => Some(ElementRef::Marked(ordinal)),
            Visit::Picture { ordinal, .. } => Some(ElementRef::Picture(ordinal)),
            Visit::Slot { container, slot } => Some(ElementRef::PictureSlot { container, slot }),
            Visit::ProjectHeading { item, .. } => Some(ElementRef::ProjectHeading(item)),
            Visit::ProjectItem => None,
        }
    }
}

#[derive(Default)]
struct Counters {
    marked: usize,
    pictures: usize,
    slots_seen: Vec<ImageSlot>,
    items: usize,
    heading_seen: bool,
}

impl Counters {
    fn bump(counter: &mut usize) -> usize {
        let n = *counter;
        *counter += 1;
        n
    }

    /// Claim `slot` in the current picture; only the first of each kind counts.
    fn claim_slot(&mut self, slot: ImageSlot) -> Option<usize> {
        let container = self.pictures.checked_sub(1)?;
        if self.slots_seen.contains(&slot) {
            return None;
        }
        self.slots_seen.push(slot);
        Some(container)
    }

    fn claim_heading(&mut self) -> Option<usize> {
        let item = self.items.checked_sub(1)?;
        if self.heading_seen {
            return None;
        }
        self.heading_seen = true;
        Some(item)
    }
}

/// Stream `html` through the binding selectors, calling `visit` for each
/// element reached, and return the (possibly rewritten) document.
pub(crate) fn walk<F>(html: &str, visit: F) -> Result<String, ScanError>
where
    F: FnMut(Visit<'_>, &mut Element<'_, '_>) -> HandlerResult,
{
    let counters = RefCell::new(Counters::default());
    let visit = RefCell::new(visit);

    let settings = RewriteStrSettings {
        element_content_handlers: vec![
            element!("[data-content]", |el| {
                let ordinal = Counters::bump(&mut counters.borrow_mut().marked);
                let path = el.get_attribute(TEXT_MARKER).unwrap_or_default();
                call(&visit, Visit::Marked { ordinal, path: &path }, el)
            }),
            element!("picture[data-image]", |el| {
                let ordinal = {
                    let mut c = counters.borrow_mut();
                    c.slots_seen.clear();
                    Counters::bump(&mut c.pictures)
                };
                let path = el.get_attribute(IMAGE_MARKER).unwrap_or_default();
                call(&visit, Visit::Picture { ordinal, path: &path }, el)
            }),
            element!(r#"picture[data-image] source[type="image/avif"]"#, |el| {
                visit_slot(&counters, &visit, ImageSlot::Source(Codec::Avif), el)
            }),
            element!(r#"picture[data-image] source[type="image/webp"]"#, |el| {
                visit_slot(&counters, &visit, ImageSlot::Source(Codec::Webp), el)
            }),
            element!("picture[data-image] img", |el| {
                visit_slot(&counters, &visit, ImageSlot::Img, el)
            }),
            element!(".project-item", |el| {
                {
                    let mut c = counters.borrow_mut();
                    c.heading_seen = false;
                    c.items += 1;
                }
                call(&visit, Visit::ProjectItem, el)
            }),
            element!(".project-item h4", |el| {
                let item = counters.borrow_mut().claim_heading();
                match item {
                    Some(item) => {
                        let marked = el.has_attribute(TEXT_MARKER);
                        call(&visit, Visit::ProjectHeading { item, marked }, el)
                    }
                    None => Ok(()),
                }
            }),
        ],
        ..RewriteStrSettings::default()
    };

    Ok(rewrite_str(html, settings)?)
}

fn call<F>(visit: &RefCell<F>, v: Visit<'_>, el: &mut Element<'_, '_>) -> HandlerResult
where
    F: FnMut(Visit<'_>, &mut Element<'_, '_>) -> HandlerResult,
{
    let mut f = visit.borrow_mut();
    (&mut *f)(v, el)
}

fn visit_slot<F>(
    counters: &RefCell<Counters>,
    visit: &RefCell<F>,
    slot: ImageSlot,
    el: &mut Element<'_, '_>,
) -> HandlerResult
where
    F: FnMut(Visit<'_>, &mut Element<'_, '_>) -> HandlerResult,
{
    let container = counters.borrow_mut().claim_slot(slot);
    match container {
        Some(container) => call(visit, Visit::Slot { container, slot }, el),
        None => Ok(()),
    }
}
