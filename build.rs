//! Build script to generate the blog manifest for WASM builds
//!
//! Scans assets/blogs/ and lists every markdown post, since WASM can't
//! enumerate directories at runtime.

use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=assets/blogs");

    let blogs_dir = Path::new("assets/blogs");
    let manifest_path = blogs_dir.join("manifest.txt");

    let mut posts: Vec<String> = match fs::read_dir(blogs_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".md") && name != "README.md")
            .collect(),
        Err(_) => return,
    };
    posts.sort();

    let mut manifest = String::new();
    for post in posts {
        manifest.push_str(&post);
        manifest.push('\n');
    }

    // Skip the write when nothing changed so the rerun check stays quiet
    if fs::read_to_string(&manifest_path).ok().as_deref() == Some(manifest.as_str()) {
        return;
    }
    if let Err(e) = fs::write(&manifest_path, manifest) {
        println!("cargo:warning=failed to write {}: {}", manifest_path.display(), e);
    }
}
