//! The asset naming convention shared with the image pipeline.
//!
//! Optimized images live in one flat directory and are named after a logical
//! *base name* plus the encoded width and codec:
//!
//! ```text
//! assets/optimized/images/
//! ├── kitchen-1-400.avif
//! ├── kitchen-1-400.webp
//! ├── ...
//! ├── kitchen-1-1600.avif
//! └── kitchen-1-1600.webp
//! ```
//!
//! Content documents refer to images only by base name (`"kitchen-1"`). The
//! binder derives URLs from it, and whatever produces the files must derive
//! file names the same way, so both sides go through this module.
//!
//! ## Base names from source files
//!
//! Source photos are normalized into base names by:
//! - dropping the extension and lowercasing
//! - turning whitespace runs into a single `-`
//! - replacing anything outside `[a-z0-9.-]` with `-`
//! - collapsing repeated dashes
//!
//! `"Island Redesign (Final).JPG"` → `"island-redesign-final-"`.

use crate::images::Codec;
use std::path::Path;

/// Derive the base name for a source image file name.
pub fn normalize_base_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = match path.extension() {
        Some(_) => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        None => file_name.to_string(),
    };

    let mut out = String::with_capacity(stem.len());
    let mut in_space = false;
    for c in stem.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-' {
            out.push(c);
        } else {
            out.push('-');
        }
    }
    collapse_dashes(&out)
}

fn collapse_dashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out
}

/// File name of one encoded variant: `{base}-{width}.{ext}`.
pub fn variant_file_name(base: &str, width: u32, codec: Codec) -> String {
    format!("{}-{}.{}", base, width, codec.extension())
}
