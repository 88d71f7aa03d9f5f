//! End-to-end CLI tests against a copy of `fixtures/site/`.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_content-bind"))
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

fn fixture_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    // Keep runs fast.
    std::fs::write(tmp.path().join("config.toml"), "[loader]\ngrace_period_ms = 0\n").unwrap();
    tmp
}

fn run(site: &Path, args: &[&str]) -> Output {
    let output = bin()
        .arg("--site")
        .arg(site)
        .args(args)
        .output()
        .expect("failed to run content-bind");
    assert!(
        output.status.success(),
        "content-bind {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn render_prints_bound_page() {
    let site = fixture_site();
    let out = stdout(&run(site.path(), &["render", "/kitchen.html"]));
    assert!(out.contains(">Kitchen Remodels</h1>"));
    assert!(out.contains("<h4>Island Redesign</h4>"));
    assert!(out.contains("<h4>Project B</h4>"));
}

#[test]
fn render_root_uses_index_and_home() {
    let site = fixture_site();
    let target = site.path().join("rendered.html");
    run(
        site.path(),
        &["render", "/", "--out", target.to_str().unwrap()],
    );
    let html = std::fs::read_to_string(target).unwrap();
    assert!(html.contains("12 Main St<br>555-0100<br>a@b.com"));
}

#[test]
fn build_writes_output_directory() {
    let site = fixture_site();
    let dist = site.path().join("dist");
    let out = stdout(&run(
        site.path(),
        &["--output", dist.to_str().unwrap(), "build"],
    ));
    assert!(out.contains("Bound 2 of 2 pages"));
    assert!(dist.join("index.html").exists());
    assert!(dist.join("config.toml").exists());
    assert!(!dist.join("content").exists());
}

#[test]
fn check_reports_problems_without_writing() {
    let site = fixture_site();
    let dist = site.path().join("dist");
    let out = stdout(&run(
        site.path(),
        &["--output", dist.to_str().unwrap(), "check"],
    ));
    assert!(out.contains("hero.tagline at element 2: empty after trim"));
    assert!(out.contains("footer.contact at element 3: null"));
    assert!(out.contains("kitchen-1-1600.avif"));
    assert!(out.contains("Found 5 problems in 2 pages"));
    assert!(!dist.exists());
}

#[test]
fn expand_prints_variants() {
    let site = fixture_site();
    let out = stdout(&run(site.path(), &["expand", "kitchen-1"]));
    assert!(out.contains("1600w assets/optimized/images/kitchen-1-1600.avif"));
    assert!(out.contains("fallback assets/optimized/images/kitchen-1-800.webp"));
}

#[test]
fn expand_from_source_file_name() {
    let site = fixture_site();
    let out = stdout(&run(site.path(), &["expand", "--file", "Kitchen 1.JPG"]));
    assert_eq!(out.lines().next(), Some("kitchen-1"));
}

#[test]
fn routes_include_configured_pages() {
    let site = fixture_site();
    std::fs::write(
        site.path().join("config.toml"),
        "[routes.pages]\n\"bathroom.html\" = \"bathroom\"\n",
    )
    .unwrap();
    let out = stdout(&run(site.path(), &["routes"]));
    assert!(out.lines().any(|l| l.starts_with("bathroom.html") && l.ends_with("bathroom")));
    assert!(out.lines().last().unwrap().starts_with('*'));
}

#[test]
fn gen_config_is_valid_toml() {
    let site = fixture_site();
    let out = stdout(&run(site.path(), &["gen-config"]));
    let parsed: toml::Value = toml::from_str(&out).unwrap();
    assert!(parsed.get("loader").is_some());
}

#[test]
fn invalid_config_fails() {
    let site = fixture_site();
    std::fs::write(site.path().join("config.toml"), "[loader]\nbogus = 1\n").unwrap();
    let output = bin()
        .arg("--site")
        .arg(site.path())
        .arg("routes")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn build_into_site_root_fails_without_writing() {
    let site = fixture_site();
    let css = site.path().join("css/site.css");
    let before = std::fs::read(&css).unwrap();
    let output = bin()
        .arg("--site")
        .arg(site.path())
        .arg("--output")
        .arg(site.path())
        .arg("build")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(std::fs::read(&css).unwrap(), before);
}
