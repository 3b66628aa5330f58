//! nightsky: a portfolio site with an interactive night sky and a blog
//!
//! - `sky`: twinkling star field plus a 3D asteroid layer you can grab and throw
//! - `content`: markdown posts with TOML front matter
//! - `pages`: Home and Blog pages composed over the sky

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod content;
pub mod pages;
pub mod sky;
