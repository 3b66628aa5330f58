//! Blog page: post list and reader
//!
//! The reader draws the markdown source as styled lines; the rendered HTML
//! is what `xtask export-blog` ships to the web build.

use macroquad::prelude::*;

use super::{wrap_text, ACCENT_COLOR, MUTED_COLOR, NAV_HEIGHT, PANEL_COLOR, TEXT_COLOR};
use crate::content::{ContentRepository, Post, PostMetadata, DEFAULT_RELATED_LIMIT};

const COLUMN_WIDTH: f32 = 760.0;
const LIST_TOP: f32 = NAV_HEIGHT + 72.0;
const ITEM_HEIGHT: f32 = 110.0;
const ITEM_GAP: f32 = 16.0;
const RELATED_HEIGHT: f32 = 56.0;

const BODY_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 26.0;
const CODE_COLOR: Color = Color::new(0.65, 0.85, 0.7, 1.0);

/// An opened post and its related posts
#[derive(Debug, Clone)]
pub struct OpenPost {
    pub post: Post,
    pub related: Vec<PostMetadata>,
}

#[derive(Debug, Clone)]
pub enum BlogView {
    List,
    Reader(Box<OpenPost>),
    /// Slug that failed to load
    Missing(String),
}

/// What a click on the blog page asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlogAction {
    Open(String),
    Back,
}

/// One styled line of the reader
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderLine {
    pub text: String,
    pub size: f32,
    pub color: Color,
}

pub struct BlogState {
    repo: ContentRepository,
    posts: Vec<PostMetadata>,
    view: BlogView,
    scroll_y: f32,
}

impl BlogState {
    pub fn new(repo: ContentRepository) -> Self {
        let posts = repo.list_posts();
        log::info!("Blog: {} posts", posts.len());
        Self {
            repo,
            posts,
            view: BlogView::List,
            scroll_y: 0.0,
        }
    }

    pub fn posts(&self) -> &[PostMetadata] {
        &self.posts
    }

    pub fn view(&self) -> &BlogView {
        &self.view
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn open(&mut self, slug: &str) {
        self.view = match self.repo.get_post(slug) {
            Ok(post) => {
                let related = self
                    .repo
                    .list_related(slug, &post.metadata.tags, DEFAULT_RELATED_LIMIT);
                BlogView::Reader(Box::new(OpenPost { post, related }))
            }
            Err(e) => {
                log::warn!("Failed to open post: {}", e);
                BlogView::Missing(slug.to_string())
            }
        };
        self.scroll_y = 0.0;
    }

    pub fn close(&mut self) {
        self.view = BlogView::List;
        self.scroll_y = 0.0;
    }

    /// Positive delta scrolls content up
    pub fn scroll(&mut self, delta: f32) {
        self.scroll_y = (self.scroll_y - delta).max(0.0);
    }

    pub fn click(&self, mouse: Vec2, screen: Vec2) -> Option<BlogAction> {
        match &self.view {
            BlogView::List => list_rects(screen, self.posts.len(), self.scroll_y)
                .iter()
                .position(|r| r.contains(mouse))
                .map(|i| BlogAction::Open(self.posts[i].slug.clone())),
            BlogView::Missing(_) => back_rect(screen).contains(mouse).then_some(BlogAction::Back),
            BlogView::Reader(open) => {
                if back_rect(screen).contains(mouse) {
                    return Some(BlogAction::Back);
                }
                let (_, related) = reader_layout(open, screen, self.scroll_y);
                related
                    .iter()
                    .position(|r| r.contains(mouse))
                    .map(|i| BlogAction::Open(open.related[i].slug.clone()))
            }
        }
    }
}

/// Left edge and width of the text column
fn column(screen: Vec2) -> (f32, f32) {
    let width = (screen.x - 48.0).min(COLUMN_WIDTH);
    ((screen.x - width) / 2.0, width)
}

fn list_rects(screen: Vec2, count: usize, scroll: f32) -> Vec<Rect> {
    let (x, width) = column(screen);
    (0..count)
        .map(|i| {
            let y = LIST_TOP + i as f32 * (ITEM_HEIGHT + ITEM_GAP) - scroll;
            Rect::new(x, y, width, ITEM_HEIGHT)
        })
        .collect()
}

fn back_rect(screen: Vec2) -> Rect {
    let (x, _) = column(screen);
    Rect::new(x, NAV_HEIGHT + 12.0, 90.0, 32.0)
}

/// Markdown source to styled, wrapped lines
pub fn reader_lines(content: &str, width: f32) -> Vec<ReaderLine> {
    let mut lines = Vec::new();
    let mut in_code = false;

    for source in content.lines() {
        let trimmed = source.trim_start();
        if trimmed.starts_with("```") {
            in_code = !in_code;
            continue;
        }

        if in_code {
            lines.push(ReaderLine {
                text: source.to_string(),
                size: BODY_SIZE - 2.0,
                color: CODE_COLOR,
            });
            continue;
        }

        let (text, size, color) = if let Some(heading) = trimmed.strip_prefix('#') {
            (heading.trim_start_matches('#').trim().to_string(), HEADING_SIZE, TEXT_COLOR)
        } else if let Some(item) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
            (format!("\u{2022} {}", item), BODY_SIZE, TEXT_COLOR)
        } else {
            (trimmed.to_string(), BODY_SIZE, TEXT_COLOR)
        };

        for text in wrap_text(&text, size, width) {
            lines.push(ReaderLine { text, size, color });
        }
    }

    lines
}

/// Body lines with their baselines, plus hit boxes for related posts
fn reader_layout(open: &OpenPost, screen: Vec2, scroll: f32) -> (Vec<(f32, ReaderLine)>, Vec<Rect>) {
    let (x, width) = column(screen);
    let mut y = NAV_HEIGHT + 150.0 - scroll;

    let mut placed = Vec::new();
    for line in reader_lines(&open.post.content, width) {
        y += line.size * 1.5;
        placed.push((y, line));
    }

    y += 64.0;
    let related = (0..open.related.len())
        .map(|i| Rect::new(x, y + i as f32 * (RELATED_HEIGHT + 8.0), width, RELATED_HEIGHT))
        .collect();

    (placed, related)
}

pub fn draw_blog(state: &BlogState, screen: Vec2) {
    match &state.view {
        BlogView::List => draw_list(state, screen),
        BlogView::Reader(open) => draw_reader(open, screen, state.scroll_y),
        BlogView::Missing(slug) => {
            draw_back(screen);
            let (x, _) = column(screen);
            draw_text("Post not found", x, NAV_HEIGHT + 110.0, 32.0, TEXT_COLOR);
            draw_text(slug, x, NAV_HEIGHT + 140.0, 18.0, MUTED_COLOR);
        }
    }
}

fn draw_list(state: &BlogState, screen: Vec2) {
    let (x, width) = column(screen);
    draw_text("Blog", x, LIST_TOP - 24.0 - state.scroll_y, 36.0, TEXT_COLOR);

    if state.posts.is_empty() {
        draw_text("No posts yet.", x, LIST_TOP + 24.0, 20.0, MUTED_COLOR);
        return;
    }

    let mouse: Vec2 = mouse_position().into();
    for (post, rect) in state.posts.iter().zip(list_rects(screen, state.posts.len(), state.scroll_y)) {
        if rect.bottom() < NAV_HEIGHT || rect.y > screen.y {
            continue;
        }
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, PANEL_COLOR);
        if rect.contains(mouse) {
            draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, ACCENT_COLOR);
        }
        draw_text(&post.title, rect.x + 16.0, rect.y + 32.0, 24.0, TEXT_COLOR);
        let meta = format!("{}  \u{00b7}  {}", post.date, post.read_time);
        draw_text(&meta, rect.x + 16.0, rect.y + 56.0, 16.0, MUTED_COLOR);
        if let Some(excerpt) = wrap_text(&post.excerpt, 16.0, width - 32.0).first() {
            draw_text(excerpt, rect.x + 16.0, rect.y + 84.0, 16.0, TEXT_COLOR);
        }
    }
}

fn draw_back(screen: Vec2) {
    let rect = back_rect(screen);
    draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 1.0, ACCENT_COLOR);
    draw_text("< Back", rect.x + 14.0, rect.y + 22.0, 18.0, ACCENT_COLOR);
}

fn draw_reader(open: &OpenPost, screen: Vec2, scroll: f32) {
    let (x, _) = column(screen);
    let meta = &open.post.metadata;

    let title_y = NAV_HEIGHT + 100.0 - scroll;
    draw_text(&meta.title, x, title_y, 34.0, TEXT_COLOR);
    let mut byline = format!("{}  \u{00b7}  {}", meta.date, meta.read_time);
    if !meta.author.is_empty() {
        byline = format!("{}  \u{00b7}  {}", meta.author, byline);
    }
    draw_text(&byline, x, title_y + 28.0, 16.0, MUTED_COLOR);
    if !meta.tags.is_empty() {
        let tags = meta.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join("  ");
        draw_text(&tags, x, title_y + 48.0, 16.0, ACCENT_COLOR);
    }

    let (lines, related) = reader_layout(open, screen, scroll);
    for (y, line) in &lines {
        if *y < NAV_HEIGHT || *y > screen.y + line.size {
            continue;
        }
        draw_text(&line.text, x, *y, line.size, line.color);
    }

    if let Some(first) = related.first() {
        draw_text("Related posts", x, first.y - 16.0, 22.0, TEXT_COLOR);
    }
    for (post, rect) in open.related.iter().zip(&related) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, PANEL_COLOR);
        draw_text(&post.title, rect.x + 12.0, rect.y + 24.0, 20.0, TEXT_COLOR);
        draw_text(&post.date, rect.x + 12.0, rect.y + 44.0, 14.0, MUTED_COLOR);
    }

    // Back button stays pinned above the scrolled content
    draw_rectangle(0.0, NAV_HEIGHT, screen.x, 56.0, super::BG_COLOR);
    draw_back(screen);
}
