//! Responsive image references derived from a base name.
//!
//! A bound `<picture>` gets two `srcset` lists and one fallback `src`:
//!
//! ```html
//! <picture data-image="hero.image">
//!   <source type="image/avif" srcset="…-1600.avif 1600w, …-1200.avif 1200w, …-800.avif 800w, …-400.avif 400w">
//!   <source type="image/webp" srcset="…-1600.webp 1600w, …">
//!   <img src="…-800.webp">
//! </picture>
//! ```
//!
//! Everything here is string formatting over [`naming`](crate::naming); the
//! asset host is never consulted.

use crate::naming::variant_file_name;

/// Default directory (relative to the site root) holding optimized images.
pub const DEFAULT_BASE_DIR: &str = "assets/optimized/images";

/// Encoded widths, widest first. This is also the `srcset` order.
pub const WIDTHS: [u32; 4] = [1600, 1200, 800, 400];

/// Width whose fallback-codec variant becomes the plain `<img>` source.
pub const FALLBACK_WIDTH: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Primary codec, listed first in `<picture>`.
    Avif,
    /// Fallback codec, also used for the plain `<img>`.
    Webp,
}

impl Codec {
    pub const ALL: [Codec; 2] = [Codec::Avif, Codec::Webp];

    pub fn extension(self) -> &'static str {
        match self {
            Codec::Avif => "avif",
            Codec::Webp => "webp",
        }
    }

    /// Value of the `type` attribute on the matching `<source>`.
    pub fn mime_type(self) -> &'static str {
        match self {
            Codec::Avif => "image/avif",
            Codec::Webp => "image/webp",
        }
    }
}

/// One encoded variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub width: u32,
    pub url: String,
}

/// All URLs derived from one base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub base: String,
    pub avif: Vec<Variant>,
    pub webp: Vec<Variant>,
    pub fallback: String,
}

impl ImageReference {
    pub fn variants(&self, codec: Codec) -> &[Variant] {
        match codec {
            Codec::Avif => &self.avif,
            Codec::Webp => &self.webp,
        }
    }

    /// `srcset` value for a codec: `"url 1600w, url 1200w, url 800w, url 400w"`.
    pub fn srcset(&self, codec: Codec) -> String {
        self.variants(codec)
            .iter()
            .map(|v| format!("{} {}w", v.url, v.width))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Every variant URL, AVIF first. The fallback is one of these.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.avif.iter().chain(self.webp.iter()).map(|v| v.url.as_str())
    }
}

/// Expands base names into [`ImageReference`]s under a fixed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNaming {
    base_dir: String,
}

impl ImageNaming {
    pub fn new(base_dir: impl Into<String>) -> Self {
        let base_dir: String = base_dir.into();
        Self {
            base_dir: base_dir.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Expand a base name. `None` and `""` expand to nothing.
    pub fn expand(&self, base: Option<&str>) -> Option<ImageReference> {
        let base = base.filter(|b| !b.is_empty())?;
        let url = |width, codec| self.url(base, width, codec);
        let variants = |codec| -> Vec<Variant> {
            WIDTHS
                .iter()
                .map(|&width| Variant {
                    width,
                    url: url(width, codec),
                })
                .collect()
        };
        Some(ImageReference {
            base: base.to_string(),
            avif: variants(Codec::Avif),
            webp: variants(Codec::Webp),
            fallback: url(FALLBACK_WIDTH, Codec::Webp),
        })
    }

    fn url(&self, base: &str, width: u32, codec: Codec) -> String {
        let file = variant_file_name(base, width, codec);
        if self.base_dir.is_empty() {
            file
        } else {
            format!("{}/{}", self.base_dir, file)
        }
    }
}

impl Default for ImageNaming {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR)
    }
}

/// Expand with the default asset directory.
pub fn expand(base: Option<&str>) -> Option<ImageReference> {
    ImageNaming::default().expand(base)
}
