//! Whole-site binding.
//!
//! Walks the site root, binds every `*.html` page through a [`Loader`] and
//! writes the result to the output directory. Every other file is copied
//! as-is so the output is a complete, deployable site:
//!
//! ```text
//! site/                         dist/
//! ├── index.html        bind →  ├── index.html
//! ├── kitchen.html      bind →  ├── kitchen.html
//! ├── css/site.css      copy →  ├── css/site.css
//! ├── assets/…          copy →  ├── assets/…
//! ├── content/          skip
//! ├── .git/             skip
//! └── dist/             skip
//! ```
//!
//! Pages are independent, so they are bound in parallel on the global rayon
//! pool.

use crate::load::{ContentSource, LoadOutcome, Loader};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Site root not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Output directory would overwrite site sources: {0}")]
    OutputOverlapsSource(PathBuf),
}

/// Files found under a site root, as paths relative to it, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteFiles {
    pub pages: Vec<PathBuf>,
    pub others: Vec<PathBuf>,
}

/// Collect pages and other files under `root`.
///
/// Hidden entries and anything under `excluded` are left out. Excluded
/// directories that do not exist are ignored.
pub fn discover(root: &Path, excluded: &[PathBuf]) -> Result<SiteFiles, SiteError> {
    if !root.is_dir() {
        return Err(SiteError::MissingRoot(root.to_path_buf()));
    }
    let root = fs::canonicalize(root)?;
    let excluded: Vec<PathBuf> = excluded
        .iter()
        .filter_map(|p| fs::canonicalize(p).ok())
        .collect();

    let mut files = SiteFiles::default();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(is_hidden(e) || excluded.iter().any(|x| x == e.path())));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(&root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        if is_page(&rel) {
            files.pages.push(rel);
        } else {
            files.others.push(rel);
        }
    }
    Ok(files)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html"))
}

/// Request location a page would be served at: `/` plus its relative path.
pub fn location_for(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("/{}", parts.join("/"))
}

/// Inverse of [`location_for`]: the file a location is served from.
///
/// Directory locations (`/`, `/rooms/`) map to their `index.html`.
pub fn file_for(location: &str) -> PathBuf {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_start_matches('/');
    if path.is_empty() || path.ends_with('/') {
        PathBuf::from(format!("{path}index.html"))
    } else {
        PathBuf::from(path)
    }
}

/// One bound page.
#[derive(Debug, Clone)]
pub struct BuiltPage {
    pub path: PathBuf,
    pub document: String,
    pub writes: usize,
    pub skips: usize,
    /// Why the page was left as authored, if it was.
    pub abandoned: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub pages: Vec<BuiltPage>,
    pub copied: usize,
}

impl BuildSummary {
    pub fn bound_count(&self) -> usize {
        self.pages.iter().filter(|p| p.abandoned.is_none()).count()
    }
}

/// Bind every page of `site_root` into `output_dir`.
///
/// `content_dir` (relative to the site root) holds the documents; it is
/// neither bound nor copied. An output directory that is the site root or
/// one of its source files is rejected before anything is written.
pub fn build<S: ContentSource>(
    loader: &Loader<S>,
    site_root: &Path,
    content_dir: &str,
    output_dir: &Path,
) -> Result<BuildSummary, SiteError> {
    let files = discover(
        site_root,
        &[site_root.join(content_dir), output_dir.to_path_buf()],
    )?;
    ensure_separate_output(site_root, output_dir)?;
    fs::create_dir_all(output_dir)?;

    let mut pages = files
        .pages
        .par_iter()
        .map(|rel| bind_page(loader, site_root, output_dir, rel))
        .collect::<Result<Vec<_>, SiteError>>()?;
    pages.sort_by(|a, b| a.path.cmp(&b.path));

    for rel in &files.others {
        let dest = output_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(site_root.join(rel), &dest)?;
        debug!(file = %rel.display(), "copied");
    }

    Ok(BuildSummary {
        pages,
        copied: files.others.len(),
    })
}

/// A missing output directory cannot collide with anything that exists.
fn ensure_separate_output(site_root: &Path, output_dir: &Path) -> Result<(), SiteError> {
    let Ok(output) = fs::canonicalize(output_dir) else {
        return Ok(());
    };
    let root = fs::canonicalize(site_root)?;
    if output == root || (output.starts_with(&root) && output.is_file()) {
        return Err(SiteError::OutputOverlapsSource(output_dir.to_path_buf()));
    }
    Ok(())
}

fn bind_page<S: ContentSource>(
    loader: &Loader<S>,
    site_root: &Path,
    output_dir: &Path,
    rel: &Path,
) -> Result<BuiltPage, SiteError> {
    let html = fs::read_to_string(site_root.join(rel))?;
    let load = loader.load(&location_for(rel), &html);

    let dest = output_dir.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&dest, &load.html)?;

    let (writes, skips, abandoned) = match &load.outcome {
        LoadOutcome::Bound(plan) => (plan.writes.len(), plan.skips.len(), None),
        LoadOutcome::Abandoned(e) => (0, 0, Some(e.to_string())),
    };
    Ok(BuiltPage {
        path: rel.to_path_buf(),
        document: load.document,
        writes,
        skips,
        abandoned,
    })
}
