//! `+++` delimited TOML front matter
//!
//! ```text
//! +++
//! title = "Hello"
//! date = 2024-03-01
//! tags = ["rust", "web"]
//! readTime = "4 min read"
//! +++
//! Markdown body...
//! ```

use serde::Deserialize;

use super::ContentError;

const DELIMITER: &str = "+++";

/// Words per minute for the read-time estimate
const READING_SPEED: usize = 200;

/// Front matter as written in a post file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    pub title: String,
    /// TOML date, datetime, or a plain string
    pub date: toml::Value,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "read_time")]
    pub read_time: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub author: String,
}

impl FrontMatter {
    /// The date as written (`2024-03-01`, RFC 3339, or any string)
    pub fn date_string(&self) -> String {
        match &self.date {
            toml::Value::String(s) => s.clone(),
            toml::Value::Datetime(dt) => dt.to_string(),
            other => other.to_string(),
        }
    }
}

/// Split a post into (front matter, body)
pub fn split(slug: &str, source: &str) -> Result<(String, String), ContentError> {
    let source = source.trim_start_matches('\u{feff}');
    let missing = || ContentError::MissingFrontMatter {
        slug: slug.to_string(),
    };

    let mut lines = source.lines();
    let first = lines.find(|l| !l.trim().is_empty()).ok_or_else(missing)?;
    if first.trim() != DELIMITER {
        return Err(missing());
    }

    let mut front = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == DELIMITER {
            closed = true;
            break;
        }
        front.push_str(line);
        front.push('\n');
    }
    if !closed {
        return Err(missing());
    }

    let body: Vec<&str> = lines.collect();
    Ok((front, body.join("\n")))
}

/// Parse the TOML between the delimiters
pub fn parse(slug: &str, front: &str) -> Result<FrontMatter, ContentError> {
    toml::from_str(front).map_err(|source| ContentError::FrontMatter {
        slug: slug.to_string(),
        source,
    })
}

/// "N min read" from the body's word count
pub fn estimate_read_time(body: &str) -> String {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(READING_SPEED).max(1);
    format!("{} min read", minutes)
}
