//! Types shared between scanning, planning, applying and checking.
//!
//! The scanner and the applier each walk the page once. Both number elements
//! the same way, so an [`ElementRef`] found during the scan points at the same
//! element during the apply.

use crate::images::Codec;

/// Attribute carrying a text/markup binding path.
pub const TEXT_MARKER: &str = "data-content";

/// Attribute carrying an image binding path (on `<picture>`).
pub const IMAGE_MARKER: &str = "data-image";

/// The one path whose value is written as markup instead of text.
pub const COMPOSITE_CONTACT_PATH: &str = "footer.contact";

/// Sub-fields of the composite contact block, in output order.
pub const CONTACT_FIELDS: [&str; 3] = ["address", "phone", "email"];

/// Top-level document array paired positionally with project items.
pub const PROJECTS_KEY: &str = "projects";

/// Element inside an image container that may receive a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    /// `<source type="image/avif">` or `<source type="image/webp">`
    Source(Codec),
    /// The plain `<img>`
    Img,
}

/// Position of an element within the page, per marker kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    /// The n-th element carrying [`TEXT_MARKER`], in document order.
    Marked(usize),
    /// The n-th `<picture>` carrying [`IMAGE_MARKER`].
    Picture(usize),
    /// A slot inside the n-th bound `<picture>`.
    PictureSlot { container: usize, slot: ImageSlot },
    /// The first heading inside the n-th project item.
    ProjectHeading(usize),
}

/// What part of the element a write replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Element content, escaped as text.
    Text,
    /// Element content, inserted as markup.
    Markup,
    /// The `srcset` attribute.
    SrcSet,
    /// The `src` attribute.
    Src,
}

/// One planned mutation of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub target: ElementRef,
    pub field: Field,
    pub value: String,
}

/// Why a binding produced no write.
///
/// The first three are deliberately kept apart: a path that does not exist,
/// a path that exists but holds `null`, and a value that trims to nothing
/// are different authoring mistakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The path does not resolve.
    Missing,
    /// The path resolves to `null`.
    Null,
    /// The value is empty once trimmed.
    Empty,
    /// The value has a shape this binding cannot use.
    Mismatch { found: &'static str },
}

/// A binding that was left alone, with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub target: ElementRef,
    pub path: String,
    pub reason: SkipReason,
}

/// JSON type name used in mismatch reports.
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
