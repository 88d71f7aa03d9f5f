//! Development-mode binding report.
//!
//! Loads each page the way the loader would, plans the injection without
//! applying it, and reports every binding that would not take effect plus
//! image bindings whose encoded variants are missing from disk. Nothing is
//! written.

use crate::images::ImageNaming;
use crate::inject::plan;
use crate::load::{ContentSource, Loader};
use crate::path::resolve;
use crate::scan::{ScanError, scan};
use crate::site::{SiteError, discover, location_for};
use crate::types::{ElementRef, SkipReason};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error("Could not scan {page}: {source}")]
    Scan {
        page: PathBuf,
        #[source]
        source: ScanError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// The document could not be loaded at all.
    Unavailable(String),
    /// A binding was skipped.
    Skipped(SkipReason),
    /// Image variants that do not exist under the site root.
    MissingAssets(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Binding path, or the document id for [`Problem::Unavailable`].
    pub path: String,
    pub target: Option<ElementRef>,
    pub problem: Problem,
}

#[derive(Debug, Clone)]
pub struct PageReport {
    pub page: PathBuf,
    pub document: String,
    /// Bindings discovered on the page.
    pub bindings: usize,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub pages: Vec<PageReport>,
}

impl CheckReport {
    pub fn finding_count(&self) -> usize {
        self.pages.iter().map(|p| p.findings.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.finding_count() == 0
    }
}

/// Check every page under `site_root`.
pub fn check_site<S: ContentSource>(
    loader: &Loader<S>,
    site_root: &Path,
    content_dir: &str,
    output_dir: &Path,
) -> Result<CheckReport, CheckError> {
    let files = discover(
        site_root,
        &[site_root.join(content_dir), output_dir.to_path_buf()],
    )?;
    let mut report = CheckReport::default();
    for rel in &files.pages {
        let html = fs::read_to_string(site_root.join(rel))?;
        report.pages.push(check_page(loader, site_root, rel, &html)?);
    }
    Ok(report)
}

/// Check one page. `rel` is the page path relative to `site_root`.
pub fn check_page<S: ContentSource>(
    loader: &Loader<S>,
    site_root: &Path,
    rel: &Path,
    html: &str,
) -> Result<PageReport, CheckError> {
    let document = loader.routes().resolve(&location_for(rel)).to_string();
    let scanned = scan(html).map_err(|source| CheckError::Scan {
        page: rel.to_path_buf(),
        source,
    })?;
    let mut report = PageReport {
        page: rel.to_path_buf(),
        document: document.clone(),
        bindings: scanned.targets.len(),
        findings: Vec::new(),
    };

    // A null document binds nothing, same as a failed fetch.
    let value = match loader.source().fetch(&document) {
        Ok(Value::Null) => Err("document is null".to_string()),
        Ok(value) => Ok(value),
        Err(e) => Err(e.to_string()),
    };
    let value = match value {
        Ok(value) => value,
        Err(reason) => {
            report.findings.push(Finding {
                path: document,
                target: None,
                problem: Problem::Unavailable(reason),
            });
            return Ok(report);
        }
    };

    let planned = plan(&value, &scanned, loader.naming());
    report
        .findings
        .extend(planned.skips.into_iter().map(|skip| Finding {
            path: skip.path,
            target: Some(skip.target),
            problem: Problem::Skipped(skip.reason),
        }));

    for (container, path, _) in scanned.image_targets() {
        let Some(Value::String(base)) = resolve(&value, path) else {
            continue;
        };
        let missing = missing_assets(site_root, loader.naming(), base);
        if !missing.is_empty() {
            report.findings.push(Finding {
                path: path.to_string(),
                target: Some(ElementRef::Picture(container)),
                problem: Problem::MissingAssets(missing),
            });
        }
    }

    Ok(report)
}

/// Variant URLs for `base` with no file under `site_root`.
///
/// Absolute URLs with a scheme cannot be checked locally and are never
/// reported.
pub fn missing_assets(site_root: &Path, naming: &ImageNaming, base: &str) -> Vec<String> {
    let Some(reference) = naming.expand(Some(base)) else {
        return Vec::new();
    };
    reference
        .urls()
        .filter(|url| !url.contains("://"))
        .filter(|url| !site_root.join(url.trim_start_matches('/')).is_file())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::load::{AnySource, initialize};
    use crate::test_helpers::setup_site;

    fn fixture_loader(site: &Path) -> Loader<AnySource> {
        let mut config = SiteConfig::default();
        config.loader.grace_period_ms = 0;
        initialize(&config, site).unwrap()
    }

    fn find<'a>(report: &'a CheckReport, page: &str) -> &'a PageReport {
        report
            .pages
            .iter()
            .find(|p| p.page == Path::new(page))
            .unwrap_or_else(|| panic!("page '{page}' not in report"))
    }

    #[test]
    fn reports_each_skip_reason() {
        let site = setup_site();
        let loader = fixture_loader(site.path());
        let report = check_site(&loader, site.path(), "content", &site.path().join("dist")).unwrap();

        let kitchen = find(&report, "kitchen.html");
        assert_eq!(kitchen.document, "kitchen");
        let problems: Vec<(&str, &Problem)> = kitchen
            .findings
            .iter()
            .map(|f| (f.path.as_str(), &f.problem))
            .collect();
        assert!(problems.contains(&("hero.tagline", &Problem::Skipped(SkipReason::Empty))));
        assert!(problems.contains(&("footer.contact", &Problem::Skipped(SkipReason::Null))));
        assert!(problems.contains(&("projects[1].title", &Problem::Skipped(SkipReason::Missing))));
    }

    #[test]
    fn reports_missing_image_variants() {
        let site = setup_site();
        let loader = fixture_loader(site.path());
        let html = fs::read_to_string(site.path().join("kitchen.html")).unwrap();
        let report = check_page(&loader, site.path(), Path::new("kitchen.html"), &html).unwrap();

        let missing = report
            .findings
            .iter()
            .find_map(|f| match &f.problem {
                Problem::MissingAssets(urls) => Some(urls),
                _ => None,
            })
            .unwrap();
        assert_eq!(missing.len(), 8);
        assert!(missing.contains(&"assets/optimized/images/kitchen-1-800.webp".to_string()));
    }

    #[test]
    fn present_image_variants_are_not_reported() {
        let site = setup_site();
        let loader = fixture_loader(site.path());
        let html = fs::read_to_string(site.path().join("index.html")).unwrap();
        let report = check_page(&loader, site.path(), Path::new("index.html"), &html).unwrap();

        assert_eq!(report.document, "home");
        assert!(
            !report
                .findings
                .iter()
                .any(|f| matches!(f.problem, Problem::MissingAssets(_)))
        );
        // cards[1] is not in home.json.
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].path, "cards[1].title");
    }

    #[test]
    fn unavailable_document_is_one_finding() {
        let site = setup_site();
        fs::remove_file(site.path().join("content/home.json")).unwrap();
        let loader = fixture_loader(site.path());
        let html = fs::read_to_string(site.path().join("index.html")).unwrap();
        let report = check_page(&loader, site.path(), Path::new("index.html"), &html).unwrap();

        assert_eq!(report.findings.len(), 1);
        assert!(matches!(report.findings[0].problem, Problem::Unavailable(_)));
        assert_eq!(report.findings[0].path, "home");
    }

    #[test]
    fn null_document_is_one_finding() {
        let site = setup_site();
        fs::write(site.path().join("content/home.json"), "null").unwrap();
        let loader = fixture_loader(site.path());
        let html = fs::read_to_string(site.path().join("index.html")).unwrap();
        let report = check_page(&loader, site.path(), Path::new("index.html"), &html).unwrap();

        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].problem,
            Problem::Unavailable("document is null".to_string())
        );
        assert_eq!(report.findings[0].target, None);
    }

    #[test]
    fn check_never_writes() {
        let site = setup_site();
        let loader = fixture_loader(site.path());
        let before = fs::read_to_string(site.path().join("index.html")).unwrap();
        let report = check_site(&loader, site.path(), "content", &site.path().join("dist")).unwrap();
        let after = fs::read_to_string(site.path().join("index.html")).unwrap();

        assert_eq!(before, after);
        assert!(!site.path().join("dist").exists());
        assert!(!report.is_clean());
        assert_eq!(report.finding_count(), 5);
    }

    #[test]
    fn remote_asset_urls_are_not_checked() {
        let tmp = tempfile::TempDir::new().unwrap();
        let naming = ImageNaming::new("https://cdn.example.com/img");
        assert!(missing_assets(tmp.path(), &naming, "a").is_empty());
    }

    #[test]
    fn rooted_asset_urls_resolve_under_site() {
        let site = setup_site();
        let naming = ImageNaming::new("/assets/optimized/images");
        assert!(missing_assets(site.path(), &naming, "home-hero").is_empty());
    }
}
