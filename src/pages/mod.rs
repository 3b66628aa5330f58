//! Page composition
//!
//! Three pages share one window: Home (the night sky with hero copy), About
//! (skills drawn over the same sky) and the blog. The sky lives while a sky
//! page is showing; moving between Home and About keeps it, opening the blog
//! tears it down and coming back mounts a fresh one.

pub mod about;
pub mod blog;
pub mod home;

use macroquad::prelude::*;

use crate::config::SkyConfig;
use crate::content::ContentRepository;
use crate::sky::loader::Fetcher;
use crate::sky::{SkyEvent, SkyLayer, Viewport};
use about::AboutState;
use blog::{BlogAction, BlogState};

/// Colors shared by the pages
pub const TEXT_COLOR: Color = Color::new(0.92, 0.92, 0.95, 1.0);
pub const MUTED_COLOR: Color = Color::new(0.6, 0.6, 0.68, 1.0);
pub const ACCENT_COLOR: Color = Color::new(0.42, 0.56, 1.0, 1.0);
pub const PANEL_COLOR: Color = Color::new(0.06, 0.06, 0.09, 0.92);
pub const BG_COLOR: Color = Color::new(0.04, 0.04, 0.06, 1.0);

pub const NAV_HEIGHT: f32 = 48.0;
const NAV_ITEM_WIDTH: f32 = 96.0;

/// Pixels scrolled per mouse wheel notch
const WHEEL_STEP: f32 = 40.0;

/// The pages (one nav entry each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    About,
    Blog,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::About, Page::Blog];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::About => "About",
            Page::Blog => "Blog",
        }
    }

    /// Pages drawn over the night sky
    pub fn shows_sky(&self) -> bool {
        matches!(self, Page::Home | Page::About)
    }
}

/// Nav entry hit boxes, right-aligned in the top bar
pub fn nav_rects(screen_width: f32) -> Vec<(Page, Rect)> {
    let count = Page::ALL.len() as f32;
    let start = screen_width - count * NAV_ITEM_WIDTH - 16.0;
    Page::ALL
        .iter()
        .enumerate()
        .map(|(i, page)| {
            (
                *page,
                Rect::new(start + i as f32 * NAV_ITEM_WIDTH, 0.0, NAV_ITEM_WIDTH, NAV_HEIGHT),
            )
        })
        .collect()
}

/// Input gathered for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub now_ms: f64,
    pub screen: Vec2,
    pub pixel_ratio: f32,
    pub mouse: Vec2,
    pub pressed: bool,
    pub released: bool,
    /// Wheel notches, positive scrolls content up
    pub wheel: f32,
}

/// Whole-app state
pub struct App {
    page: Page,
    sky_config: SkyConfig,
    sky: Option<SkyLayer>,
    fetcher: Option<Fetcher>,
    blog: BlogState,
    about: AboutState,
    /// Page scroll on the sky pages (feeds the starfield)
    sky_scroll: f32,
    last_screen: Vec2,
    last_pixel_ratio: f32,
    last_mouse: Vec2,
    seed: u64,
    mounts: u64,
}

impl App {
    pub fn new(sky_config: SkyConfig, repo: ContentRepository, fetcher: Option<Fetcher>, seed: u64) -> Self {
        Self {
            page: Page::Blog,
            sky_config,
            sky: None,
            fetcher,
            blog: BlogState::new(repo),
            about: AboutState::default(),
            sky_scroll: 0.0,
            last_screen: Vec2::ZERO,
            last_pixel_ratio: 1.0,
            last_mouse: Vec2::ZERO,
            seed,
            mounts: 0,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn sky(&self) -> Option<&SkyLayer> {
        self.sky.as_ref()
    }

    pub fn blog(&self) -> &BlogState {
        &self.blog
    }

    pub fn about(&self) -> &AboutState {
        &self.about
    }

    /// Switch pages, mounting or tearing down the sky as needed
    pub fn navigate(&mut self, page: Page, viewport: Viewport, now_ms: f64) {
        if page == self.page && (!page.shows_sky() || self.sky.is_some()) {
            return;
        }
        log::info!("Navigating to {}", page.label());
        self.sky_scroll = 0.0;

        if page.shows_sky() && self.sky.is_some() {
            self.sky_event(SkyEvent::Scroll { y: 0.0 });
        } else if let Some(mut sky) = self.sky.take() {
            sky.teardown();
        }

        if page.shows_sky() && self.sky.is_none() {
            self.mounts += 1;
            let mut sky = SkyLayer::mount(
                self.sky_config.clone(),
                viewport,
                now_ms,
                self.seed.wrapping_add(self.mounts),
            );
            if let Some(fetcher) = self.fetcher.clone() {
                sky.start_loading(fetcher);
            }
            self.sky = Some(sky);
        }
        self.page = page;
        self.last_screen = viewport.size();
        self.last_pixel_ratio = viewport.pixel_ratio;
    }

    /// Route one frame of input, then step the sky
    pub fn frame(&mut self, input: FrameInput) {
        let viewport = Viewport::new(input.screen.x, input.screen.y, input.pixel_ratio);
        let t_ms = input.now_ms;

        if input.screen != self.last_screen || input.pixel_ratio != self.last_pixel_ratio {
            self.last_screen = input.screen;
            self.last_pixel_ratio = input.pixel_ratio;
            self.sky_event(SkyEvent::Resize {
                width: input.screen.x,
                height: input.screen.y,
                pixel_ratio: input.pixel_ratio,
                t_ms,
            });
        }

        if input.mouse != self.last_mouse {
            self.last_mouse = input.mouse;
            self.sky_event(SkyEvent::PointerMove {
                x: input.mouse.x,
                y: input.mouse.y,
                t_ms,
            });
        }

        if input.wheel != 0.0 {
            match self.page {
                Page::Home | Page::About => {
                    self.sky_scroll = (self.sky_scroll - input.wheel * WHEEL_STEP).max(0.0);
                    let y = self.sky_scroll;
                    self.sky_event(SkyEvent::Scroll { y });
                }
                Page::Blog => self.blog.scroll(input.wheel * WHEEL_STEP),
            }
        }

        if input.pressed {
            self.press(input.mouse, viewport, t_ms);
        }
        if input.released {
            self.sky_event(SkyEvent::PointerUp {
                x: input.mouse.x,
                y: input.mouse.y,
                t_ms,
            });
        }

        if let Some(sky) = self.sky.as_mut() {
            sky.advance(t_ms);
        }
    }

    fn press(&mut self, mouse: Vec2, viewport: Viewport, t_ms: f64) {
        // Props under the pointer win over the page
        if self.sky.as_ref().is_some_and(|s| s.captures_pointer()) {
            self.sky_event(SkyEvent::PointerDown { x: mouse.x, y: mouse.y, t_ms });
            return;
        }

        if let Some((page, _)) = nav_rects(viewport.width)
            .into_iter()
            .find(|(_, rect)| rect.contains(mouse))
        {
            self.navigate(page, viewport, t_ms);
            return;
        }

        match self.page {
            Page::Home => {
                if home::blog_button_rect(viewport.size()).contains(mouse) {
                    self.navigate(Page::Blog, viewport, t_ms);
                }
            }
            Page::About => {
                self.about.click(mouse, viewport.size(), self.sky_scroll);
            }
            Page::Blog => match self.blog.click(mouse, viewport.size()) {
                Some(BlogAction::Open(slug)) => self.blog.open(&slug),
                Some(BlogAction::Back) => self.blog.close(),
                None => {}
            },
        }
    }

    fn sky_event(&mut self, event: SkyEvent) {
        if let Some(sky) = self.sky.as_mut() {
            sky.handle_event(event);
        }
    }

    /// Paint the current page
    pub fn draw(&mut self) {
        let screen = vec2(screen_width(), screen_height());
        match self.page {
            Page::Home | Page::About => {
                clear_background(BLACK);
                if let Some(sky) = self.sky.as_mut() {
                    sky.draw();
                }
                if self.page == Page::Home {
                    home::draw_home(screen, self.sky_scroll);
                } else {
                    about::draw_about(&self.about, screen, self.sky_scroll);
                }
            }
            Page::Blog => {
                clear_background(BG_COLOR);
                blog::draw_blog(&self.blog, screen);
            }
        }
        draw_nav(self.page, screen.x, self.last_mouse);
    }
}

fn draw_nav(current: Page, screen_width: f32, mouse: Vec2) {
    draw_rectangle(0.0, 0.0, screen_width, NAV_HEIGHT, Color::new(0.0, 0.0, 0.0, 0.35));
    draw_text("nightsky", 20.0, 31.0, 24.0, TEXT_COLOR);

    for (page, rect) in nav_rects(screen_width) {
        let color = if page == current {
            ACCENT_COLOR
        } else if rect.contains(mouse) {
            TEXT_COLOR
        } else {
            MUTED_COLOR
        };
        let dims = measure_text(page.label(), None, 20, 1.0);
        draw_text(
            page.label(),
            rect.x + (rect.w - dims.width) / 2.0,
            rect.y + 30.0,
            20.0,
            color,
        );
    }
}

/// Wrap text to fit within a given pixel width
/// Returns a vector of lines that fit within max_width
pub fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    // Approximate glyph width
    let char_width = font_size * 0.5;

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if candidate.chars().count() as f32 * char_width <= max_width || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }

    lines
}
