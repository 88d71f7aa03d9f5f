use clap::{Parser, Subcommand};
use content_bind::{check, config, images, load, naming, output, site};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "content-bind")]
#[command(about = "Bind JSON content documents into static HTML pages")]
#[command(long_about = "\
Bind JSON content documents into static HTML pages

Pages keep their authored markup. Elements marked with data attributes are
filled from the page's content document; anything that cannot be resolved
is left exactly as written.

Site structure:

  site/
  ├── config.toml                  # Optional; see 'content-bind gen-config'
  ├── index.html                   # → content/home.json
  ├── kitchen.html                 # → content/kitchen.json
  ├── content/
  │   ├── home.json
  │   └── kitchen.json
  └── assets/optimized/images/     # {base}-{1600,1200,800,400}.{avif,webp}

Markers:
  data-content=\"hero.title\"        text from the document (cards[0].body works too)
  data-content=\"footer.contact\"    address, phone and email joined with <br>
  <picture data-image=\"hero.image\"> srcsets and fallback from an image base name
  .project-item h4                 filled from projects[n].title by position")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Fetch documents over HTTP from this base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log per-binding diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bind one page and print it (or write it with --out)
    Render {
        /// Location the page is served at, e.g. /kitchen.html
        location: String,
        /// Write the bound page here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Bind every page of the site into the output directory
    Build,
    /// Report bindings that would not take effect, without writing anything
    Check,
    /// Print the image URLs derived from a base name
    Expand {
        /// Image base name, e.g. kitchen-1
        base: String,
        /// Treat the argument as a source file name ("Kitchen 1.JPG") and
        /// derive its base name first
        #[arg(long)]
        file: bool,
    },
    /// Print the effective page → document routing table
    Routes,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match cli.command {
        Command::Render { location, out } => {
            let config = site_config(&cli.site, cli.base_url.as_deref())?;
            let loader = load::initialize(&config, &cli.site)?;
            let page = cli.site.join(site::file_for(&location));
            let html = std::fs::read_to_string(&page)?;
            let loaded = loader.load(&location, &html);
            match out {
                Some(path) => std::fs::write(path, loaded.html)?,
                None => print!("{}", loaded.html),
            }
        }
        Command::Build => {
            let config = site_config(&cli.site, cli.base_url.as_deref())?;
            init_thread_pool(&config.processing);
            let loader = load::initialize(&config, &cli.site)?;
            println!(
                "==> Binding {} → {}",
                cli.site.display(),
                cli.output.display()
            );
            let summary = site::build(
                &loader,
                &cli.site,
                &config.loader.content_dir,
                &cli.output,
            )?;
            output::print_build_output(&summary);
        }
        Command::Check => {
            let config = site_config(&cli.site, cli.base_url.as_deref())?;
            let loader = load::initialize(&config, &cli.site)?;
            println!("==> Checking {}", cli.site.display());
            let report = check::check_site(
                &loader,
                &cli.site,
                &config.loader.content_dir,
                &cli.output,
            )?;
            output::print_check_output(&report);
        }
        Command::Expand { base, file } => {
            let config = site_config(&cli.site, None)?;
            let base = if file {
                naming::normalize_base_name(&base)
            } else {
                base
            };
            let naming = images::ImageNaming::new(config.images.base_dir.as_str());
            match naming.expand(Some(&base)) {
                Some(reference) => output::print_expand_output(&reference),
                None => return Err("image base name must not be empty".into()),
            }
        }
        Command::Routes => {
            let config = site_config(&cli.site, None)?;
            output::print_routes_output(&load::Routes::from_config(&config.routes));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `config.toml` from the site root and apply CLI overrides.
fn site_config(
    site: &Path,
    base_url: Option<&str>,
) -> Result<config::SiteConfig, config::ConfigError> {
    let mut config = config::load_config(site)?;
    if let Some(url) = base_url {
        config.loader.base_url = Some(url.to_string());
        config.validate()?;
    }
    Ok(config)
}

/// Log to stderr so `render` output on stdout stays a clean page.
///
/// `RUST_LOG` wins over `--verbose`.
fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("content_bind=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
