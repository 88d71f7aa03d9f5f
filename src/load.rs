//! Page loading: pick the document for a page, fetch it, inject it.
//!
//! ```text
//! location ──Routes──► document id ──ContentSource──► Value ──inject──► html'
//! ```
//!
//! Loading never fails from the caller's point of view. A document that cannot
//! be fetched or parsed leaves the page as authored; the reason is logged and
//! kept in [`LoadOutcome::Abandoned`] for tooling that wants it.
//!
//! Documents are always read fresh. The HTTP source adds a `?t=<unix millis>`
//! query parameter and a `Cache-Control: no-cache` header to every request.

use crate::config::{RoutesConfig, SiteConfig};
use crate::images::ImageNaming;
use crate::inject::{Plan, inject};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Routing
// ============================================================================

/// Built-in page → document table.
pub const BUILTIN_ROUTES: [(&str, &str); 6] = [
    ("", "home"),
    ("index.html", "home"),
    ("kitchen.html", "kitchen"),
    ("master-bedroom.html", "master-bedroom"),
    ("closet.html", "closet"),
    ("kids-bedroom.html", "kids"),
];

/// Document id used when nothing else is configured.
pub const DEFAULT_DOCUMENT: &str = "home";

/// Total mapping from page file name to document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pages: BTreeMap<String, String>,
    default: String,
}

impl Routes {
    /// Built-in table with `home` as default.
    pub fn builtin() -> Self {
        Self {
            pages: BUILTIN_ROUTES
                .iter()
                .map(|(page, id)| (page.to_string(), id.to_string()))
                .collect(),
            default: DEFAULT_DOCUMENT.to_string(),
        }
    }

    /// Built-in table with configured entries laid over it.
    pub fn from_config(config: &RoutesConfig) -> Self {
        let mut routes = Self::builtin();
        routes.default = config.default.clone();
        for (page, id) in &config.pages {
            routes.pages.insert(page_file(page).to_string(), id.clone());
        }
        routes
    }

    /// Document id for a request location. Always answers.
    pub fn resolve(&self, location: &str) -> &str {
        self.pages
            .get(page_file(location))
            .unwrap_or(&self.default)
    }

    pub fn default_id(&self) -> &str {
        &self.default
    }

    /// Explicit entries in file-name order. The bare `""` root entry is included.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages.iter().map(|(p, id)| (p.as_str(), id.as_str()))
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Final path segment of a location, without query or fragment.
///
/// `"/"` and `""` both give `""`.
pub fn page_file(location: &str) -> &str {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default()
}

// ============================================================================
// Sources
// ============================================================================

/// Somewhere page documents come from.
pub trait ContentSource: Send + Sync {
    /// Fetch and parse the document for `id`. Must not serve a cached copy.
    fn fetch(&self, id: &str) -> Result<Value, LoadError>;

    /// Human-readable location of the document for `id`.
    fn locate(&self, id: &str) -> String;
}

/// Reads `{site}/{content_dir}/{id}.json`.
#[derive(Debug, Clone)]
pub struct FsSource {
    dir: PathBuf,
}

impl FsSource {
    pub fn new(site_root: &Path, content_dir: &str) -> Self {
        Self {
            dir: site_root.join(content_dir),
        }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl ContentSource for FsSource {
    fn fetch(&self, id: &str) -> Result<Value, LoadError> {
        let path = self.path_for(id);
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LoadError::Json {
            origin: path.display().to_string(),
            source,
        })
    }

    fn locate(&self, id: &str) -> String {
        self.path_for(id).display().to_string()
    }
}

/// Fetches `GET {base_url}/{content_dir}/{id}.json?t=<millis>`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
    prefix: String,
}

impl HttpSource {
    pub fn new(base_url: &str, content_dir: &str) -> Result<Self, LoadError> {
        let prefix = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            content_dir.trim_matches('/')
        );
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|source| LoadError::Http {
                url: prefix.clone(),
                source,
            })?;
        Ok(Self { client, prefix })
    }

    fn url_for(&self, id: &str) -> String {
        format!("{}/{}.json", self.prefix, id)
    }
}

impl ContentSource for HttpSource {
    fn fetch(&self, id: &str) -> Result<Value, LoadError> {
        let url = self.url_for(id);
        let response = self
            .client
            .get(&url)
            .query(&[("t", unix_millis().to_string())])
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .map_err(|source| LoadError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status { url, status });
        }
        let body = response.text().map_err(|source| LoadError::Http {
            url: url.clone(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| LoadError::Json {
            origin: url,
            source,
        })
    }

    fn locate(&self, id: &str) -> String {
        self.url_for(id)
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// The source picked by configuration.
#[derive(Debug, Clone)]
pub enum AnySource {
    Fs(FsSource),
    Http(HttpSource),
}

impl ContentSource for AnySource {
    fn fetch(&self, id: &str) -> Result<Value, LoadError> {
        match self {
            AnySource::Fs(s) => s.fetch(id),
            AnySource::Http(s) => s.fetch(id),
        }
    }

    fn locate(&self, id: &str) -> String {
        match self {
            AnySource::Fs(s) => s.locate(id),
            AnySource::Http(s) => s.locate(id),
        }
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Default pause before the injection pass.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum LoadOutcome {
    /// The document was fetched and the plan applied.
    Bound(Plan),
    /// The document could not be used; the page is unchanged.
    Abandoned(LoadError),
}

/// One loaded page.
#[derive(Debug)]
pub struct PageLoad {
    /// Document id the location routed to.
    pub document: String,
    pub html: String,
    pub outcome: LoadOutcome,
}

pub struct Loader<S> {
    source: S,
    routes: Routes,
    naming: ImageNaming,
    grace_period: Duration,
}

impl<S: ContentSource> Loader<S> {
    pub fn new(source: S, routes: Routes, naming: ImageNaming) -> Self {
        Self {
            source,
            routes,
            naming,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn naming(&self) -> &ImageNaming {
        &self.naming
    }

    /// Bind `html`, served at `location`, to its document.
    pub fn load(&self, location: &str, html: &str) -> PageLoad {
        let document = self.routes.resolve(location).to_string();
        debug!(location, document = %document, "routing page");

        let value = match self.source.fetch(&document) {
            Ok(value) => value,
            Err(e) => {
                warn!(document = %document, error = %e, "content unavailable; page left as authored");
                return PageLoad {
                    document,
                    html: html.to_string(),
                    outcome: LoadOutcome::Abandoned(e),
                };
            }
        };

        if !self.grace_period.is_zero() {
            std::thread::sleep(self.grace_period);
        }

        let injection = inject(html, Some(&value), &self.naming);
        info!(
            document = %document,
            writes = injection.plan.writes.len(),
            skips = injection.plan.skips.len(),
            "content loaded"
        );
        PageLoad {
            document,
            html: injection.html,
            outcome: LoadOutcome::Bound(injection.plan),
        }
    }
}

/// Build the loader for a site. Call once per process.
///
/// With `loader.base_url` set documents come over HTTP; otherwise they are
/// read from `{site_root}/{loader.content_dir}`.
pub fn initialize(config: &SiteConfig, site_root: &Path) -> Result<Loader<AnySource>, LoadError> {
    let source = match &config.loader.base_url {
        Some(base) => AnySource::Http(HttpSource::new(base, &config.loader.content_dir)?),
        None => AnySource::Fs(FsSource::new(site_root, &config.loader.content_dir)),
    };
    info!(
        source = %source.locate("{page}"),
        grace_ms = config.loader.grace_period_ms,
        "content loader ready"
    );
    Ok(Loader::new(
        source,
        Routes::from_config(&config.routes),
        ImageNaming::new(config.images.base_dir.as_str()),
    )
    .with_grace_period(Duration::from_millis(config.loader.grace_period_ms)))
}
