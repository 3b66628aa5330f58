//! Blog content repository
//!
//! Posts are markdown files with `+++` TOML front matter (see
//! `front_matter.rs`). The repository holds the raw sources and parses on
//! demand: listing only reads front matter, `get_post` also renders HTML.
//! A broken post is skipped (and logged) in listings; asking for it
//! directly returns the error.

pub mod front_matter;
pub mod markdown;

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where posts live, relative to the asset root
pub const BLOG_DIR: &str = "assets/blogs";
/// Generated by build.rs; WASM can't list directories
pub const MANIFEST_PATH: &str = "assets/blogs/manifest.txt";
/// Not a post
const README: &str = "README.md";

pub const DEFAULT_RELATED_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("post not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{slug}: missing +++ front matter")]
    MissingFrontMatter { slug: String },
    #[error("{slug}: invalid front matter: {source}")]
    FrontMatter {
        slug: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Listing entry for a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub read_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub author: String,
}

impl PostMetadata {
    /// Calendar date, if the date string is `YYYY-MM-DD` or RFC 3339
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(flatten)]
    pub metadata: PostMetadata,
    /// Markdown body without front matter
    pub content: String,
    pub html_content: String,
}

/// A post file before parsing
#[derive(Debug, Clone, PartialEq)]
pub struct RawPost {
    pub slug: String,
    pub source: String,
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|d| d.date_naive()))
}

/// Newest first; undated posts last; slug breaks ties
fn newest_first(a: &PostMetadata, b: &PostMetadata) -> Ordering {
    match (a.parsed_date(), b.parsed_date()) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.slug.cmp(&b.slug))
}

/// Slugs are bare file stems
fn valid_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.contains('/') && !slug.contains('\\') && !slug.contains("..")
}

#[derive(Debug, Clone, Default)]
pub struct ContentRepository {
    sources: Vec<RawPost>,
}

impl ContentRepository {
    pub fn from_sources(sources: Vec<RawPost>) -> Self {
        let sources = sources.into_iter().filter(|raw| valid_slug(&raw.slug)).collect();
        Self { sources }
    }

    /// Read every `*.md` in `dir`. A missing directory is an empty repository.
    pub fn open_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Blog directory {} unavailable: {}", dir.display(), e);
                return Self::default();
            }
        };

        let mut sources = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            if file_name == README || path.extension().map_or(true, |ext| ext != "md") {
                continue;
            }
            let Some(slug) = file_name.strip_suffix(".md").map(str::to_string) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(source) => sources.push(RawPost { slug, source }),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        sources.sort_by(|a, b| a.slug.cmp(&b.slug));
        log::debug!("Read {} posts from {}", sources.len(), dir.display());
        Self::from_sources(sources)
    }

    /// Load through the build-time manifest (works on WASM)
    pub async fn load_from_manifest() -> Self {
        use macroquad::file::load_string;

        let manifest = match load_string(MANIFEST_PATH).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to load blog manifest: {}", e);
                return Self::default();
            }
        };

        let mut sources = Vec::new();
        for line in manifest.lines() {
            let line = line.trim();
            if line.is_empty() || !line.ends_with(".md") || line == README {
                continue;
            }
            let slug = line.strip_suffix(".md").unwrap_or(line).to_string();
            let path = format!("{}/{}", BLOG_DIR, line);
            match load_string(&path).await {
                Ok(source) => sources.push(RawPost { slug, source }),
                Err(e) => log::warn!("Skipping {}: {}", path, e),
            }
        }
        Self::from_sources(sources)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn raw(&self, slug: &str) -> Result<&RawPost, ContentError> {
        if !valid_slug(slug) {
            return Err(ContentError::NotFound(slug.to_string()));
        }
        self.sources
            .iter()
            .find(|raw| raw.slug == slug)
            .ok_or_else(|| ContentError::NotFound(slug.to_string()))
    }

    fn parse(raw: &RawPost) -> Result<(PostMetadata, String), ContentError> {
        let (front, body) = front_matter::split(&raw.slug, &raw.source)?;
        let fm = front_matter::parse(&raw.slug, &front)?;
        let metadata = PostMetadata {
            slug: raw.slug.clone(),
            date: fm.date_string(),
            read_time: fm
                .read_time
                .clone()
                .unwrap_or_else(|| front_matter::estimate_read_time(&body)),
            title: fm.title,
            excerpt: fm.excerpt,
            tags: fm.tags,
            image: fm.image,
            author: fm.author,
        };
        Ok((metadata, body))
    }

    /// Every readable post, newest first
    pub fn list_posts(&self) -> Vec<PostMetadata> {
        let mut posts: Vec<PostMetadata> = self
            .sources
            .iter()
            .filter_map(|raw| match Self::parse(raw) {
                Ok((metadata, _)) => Some(metadata),
                Err(e) => {
                    log::warn!("Skipping post: {}", e);
                    None
                }
            })
            .collect();
        posts.sort_by(newest_first);
        posts
    }

    pub fn get_post(&self, slug: &str) -> Result<Post, ContentError> {
        let raw = self.raw(slug)?;
        let (metadata, content) = Self::parse(raw)?;
        let html_content = markdown::render(&content);
        Ok(Post {
            metadata,
            content,
            html_content,
        })
    }

    /// Other posts ranked by shared tags, then by date
    pub fn list_related(&self, slug: &str, tags: &[String], limit: usize) -> Vec<PostMetadata> {
        let mut scored: Vec<(usize, PostMetadata)> = self
            .list_posts()
            .into_iter()
            .filter(|post| post.slug != slug)
            .map(|post| {
                let score = post.tags.iter().filter(|t| tags.contains(t)).count();
                (score, post)
            })
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| newest_first(a, b)));
        scored.into_iter().take(limit).map(|(_, post)| post).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn post(slug: &str, date: &str, tags: &[&str]) -> RawPost {
        let tags = tags.iter().map(|t| format!("\"{}\"", t)).collect::<Vec<_>>().join(", ");
        RawPost {
            slug: slug.to_string(),
            source: format!(
                "+++\ntitle = \"Post {slug}\"\ndate = \"{date}\"\nexcerpt = \"About {slug}\"\ntags = [{tags}]\nreadTime = \"2 min read\"\nauthor = \"Sam\"\n+++\nBody of {slug}.\n"
            ),
        }
    }

    fn repo() -> ContentRepository {
        ContentRepository::from_sources(vec![
            post("old", "2022-01-10", &["rust", "gamedev"]),
            post("new", "2024-06-01", &["web"]),
            post("mid", "2023-03-15T09:30:00Z", &["rust", "web"]),
            RawPost {
                slug: "broken".to_string(),
                source: "no front matter here".to_string(),
            },
        ])
    }

    #[test]
    fn test_list_sorted_newest_first_skipping_broken() {
        let posts = repo().list_posts();
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_list_then_get_roundtrip() {
        let repo = repo();
        for meta in repo.list_posts() {
            let post = repo.get_post(&meta.slug).unwrap();
            assert_eq!(post.metadata, meta);
            assert!(post.html_content.contains("<p>Body of"));
        }
    }

    #[test]
    fn test_get_post_errors() {
        let repo = repo();
        assert!(matches!(repo.get_post("missing"), Err(ContentError::NotFound(_))));
        assert!(matches!(repo.get_post("../etc/passwd"), Err(ContentError::NotFound(_))));
        assert!(matches!(
            repo.get_post("broken"),
            Err(ContentError::MissingFrontMatter { .. })
        ));
    }

    #[test]
    fn test_related_ranking() {
        let repo = repo();
        let tags = vec!["rust".to_string(), "web".to_string()];
        let related = repo.list_related("mid", &tags, 3);
        let slugs: Vec<&str> = related.iter().map(|p| p.slug.as_str()).collect();
        // Both share one tag; the newer wins the tie
        assert_eq!(slugs, vec!["new", "old"]);

        let related = repo.list_related("new", &["gamedev".to_string()], 1);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].slug, "old");

        // Zero-overlap posts still fill the list, by date
        let related = repo.list_related("old", &[], DEFAULT_RELATED_LIMIT);
        let slugs: Vec<&str> = related.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "mid"]);
    }

    #[test]
    fn test_json_shape() {
        let post = repo().get_post("new").unwrap();
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["slug"], "new");
        assert_eq!(json["readTime"], "2 min read");
        assert!(json["htmlContent"].as_str().unwrap().contains("Body of new"));
        assert!(json.get("image").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_open_dir() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let mut file = fs::File::create(dir.path().join(name)).unwrap();
            file.write_all(body.as_bytes()).unwrap();
        };
        write("first.md", &post("first", "2024-01-01", &["a"]).source);
        write("README.md", "# Not a post");
        write("notes.txt", "ignored");
        write("bad.md", "+++\ntitle = 3\n+++\n");

        let repo = ContentRepository::open_dir(dir.path());
        assert_eq!(repo.len(), 2);
        let posts = repo.list_posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Post first");
        assert!(matches!(repo.get_post("bad"), Err(ContentError::FrontMatter { .. })));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ContentRepository::open_dir(dir.path().join("nope"));
        assert!(repo.is_empty());
        assert!(repo.list_posts().is_empty());
    }

    #[test]
    fn test_read_time_estimated_when_absent() {
        let repo = ContentRepository::from_sources(vec![RawPost {
            slug: "short".to_string(),
            source: "+++\ntitle = \"Short\"\ndate = 2024-02-02\n+++\nJust a few words.\n".to_string(),
        }]);
        let meta = &repo.list_posts()[0];
        assert_eq!(meta.read_time, "1 min read");
        assert_eq!(meta.date, "2024-02-02");
        assert_eq!(meta.parsed_date(), NaiveDate::from_ymd_opt(2024, 2, 2));
    }
}
