//! Build automation tasks for nightsky
//!
//! Usage:
//!   cargo xtask build-web       # Build WASM for web deployment
//!   cargo xtask export-blog     # Write the blog as static JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nightsky::content::{ContentRepository, BLOG_DIR, DEFAULT_RELATED_LIMIT};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for nightsky")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build WASM for web deployment
    BuildWeb {
        /// Mark as dev build (adds DEV banner to index.html)
        #[arg(long)]
        dev: bool,
    },
    /// Export posts as JSON: blogs.json, blogs/<slug>.json, blogs/<slug>/related.json
    ExportBlog {
        /// Output directory (defaults to dist/web/api)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildWeb { dev } => build_web(dev),
        Commands::ExportBlog { out } => {
            let out = out.unwrap_or_else(|| project_root().join("dist/web/api"));
            export_blog(&project_root().join(BLOG_DIR), &out)
        }
    }
}

/// Get the project root directory
fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Run a command and check for success
fn run_cmd(cmd: &mut Command) -> Result<()> {
    let status = cmd.status().context("Failed to execute command")?;
    if !status.success() {
        anyhow::bail!("Command failed with status: {}", status);
    }
    Ok(())
}

/// Download a file from URL to destination
fn download_file(url: &str, dest: &Path) -> Result<()> {
    println!("Downloading {}...", url);
    run_cmd(
        Command::new("curl")
            .args(["-L", "-o"])
            .arg(dest)
            .arg(url),
    )
}

/// Copy directory recursively
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Build WASM for web deployment
fn build_web(dev: bool) -> Result<()> {
    let root = project_root();
    let dist = root.join("dist/web");

    println!("Building WASM...");
    run_cmd(
        Command::new("cargo")
            .current_dir(&root)
            .args(["build", "--release", "--target", "wasm32-unknown-unknown", "--bin", "nightsky"]),
    )?;

    // Clean and create dist folder
    if dist.exists() {
        std::fs::remove_dir_all(&dist)?;
    }
    std::fs::create_dir_all(&dist)?;

    println!("Copying files to dist/web...");
    std::fs::copy(
        root.join("target/wasm32-unknown-unknown/release/nightsky.wasm"),
        dist.join("nightsky.wasm"),
    )?;

    copy_web_files(&root.join("web"), &dist)?;

    // Download macroquad JS bundle
    let mq_js = dist.join("mq_js_bundle.js");
    if !mq_js.exists() {
        download_file(
            "https://raw.githubusercontent.com/not-fl3/macroquad/v0.4.14/js/mq_js_bundle.js",
            &mq_js,
        )?;
    }

    copy_dir_recursive(&root.join("assets"), &dist.join("assets"))?;
    export_blog(&root.join(BLOG_DIR), &dist.join("api"))?;

    if dev {
        println!("Applying DEV build modifications...");
        let index_path = dist.join("index.html");
        if index_path.exists() {
            let index = std::fs::read_to_string(&index_path)?;
            let index = index.replace("<title>", "<title>[DEV] ");
            std::fs::write(&index_path, index)?;
        }
    }

    println!("Web build complete: dist/web/");
    Ok(())
}

/// Copy the loader page (required) and favicon (optional) from web/
fn copy_web_files(web: &Path, dist: &Path) -> Result<()> {
    let index = web.join("index.html");
    if !index.exists() {
        anyhow::bail!("Missing {} (the page that loads nightsky.wasm)", index.display());
    }
    std::fs::copy(&index, dist.join("index.html"))?;

    let favicon = web.join("favicon.png");
    if favicon.exists() {
        std::fs::copy(&favicon, dist.join("favicon.png"))?;
    }
    Ok(())
}

/// Write the post list, each post, and each post's related list as JSON
fn export_blog(blog_dir: &Path, out: &Path) -> Result<()> {
    let repo = ContentRepository::open_dir(blog_dir);
    let posts = repo.list_posts();

    let post_dir = out.join("blogs");
    std::fs::create_dir_all(&post_dir)
        .with_context(|| format!("Failed to create {}", post_dir.display()))?;

    write_json(&out.join("blogs.json"), &posts)?;

    for meta in &posts {
        let post = repo
            .get_post(&meta.slug)
            .with_context(|| format!("Failed to load post {}", meta.slug))?;
        write_json(&post_dir.join(format!("{}.json", meta.slug)), &post)?;

        let related = repo.list_related(&meta.slug, &meta.tags, DEFAULT_RELATED_LIMIT);
        let related_dir = post_dir.join(&meta.slug);
        std::fs::create_dir_all(&related_dir)?;
        write_json(&related_dir.join("related.json"), &related)?;
    }

    println!("Exported {} posts to {}", posts.len(), out.display());
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_index_fails_build() {
        let web = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let err = copy_web_files(web.path(), dist.path()).unwrap_err();
        assert!(err.to_string().contains("index.html"));
    }

    #[test]
    fn test_index_copied_without_favicon() {
        let web = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        std::fs::write(web.path().join("index.html"), "<title>x</title>").unwrap();
        copy_web_files(web.path(), dist.path()).unwrap();
        assert!(dist.path().join("index.html").exists());
        assert!(!dist.path().join("favicon.png").exists());
    }

    #[test]
    fn test_shipped_index_loads_wasm() {
        let index = include_str!("../../web/index.html");
        assert!(index.contains("mq_js_bundle.js"));
        assert!(index.contains("load(\"nightsky.wasm\")"));
        assert!(index.contains("glcanvas"));
        assert!(index.contains("<title>"));
    }
}
