//! Home page overlay: hero copy drawn on top of the sky

use macroquad::prelude::*;

use super::{wrap_text, ACCENT_COLOR, MUTED_COLOR, TEXT_COLOR};

const HERO_TITLE: &str = "Hi, I build things for the web.";
const HERO_SUBTITLE: &str = "Systems, graphics and the occasional side project. \
Grab an asteroid and throw it, or read the blog.";

const TITLE_SIZE: f32 = 44.0;
const SUBTITLE_SIZE: f32 = 20.0;
const MAX_TEXT_WIDTH: f32 = 640.0;

const BUTTON_SIZE: Vec2 = Vec2::new(180.0, 44.0);

/// Wrapped hero text and button placement, before scrolling
struct HeroLayout {
    top: f32,
    title_size: f32,
    title: Vec<String>,
    subtitle: Vec<String>,
    button: Rect,
}

fn hero_layout(screen: Vec2) -> HeroLayout {
    let width = (screen.x - 48.0).min(MAX_TEXT_WIDTH);
    let title_size = if screen.x < 600.0 { TITLE_SIZE * 0.7 } else { TITLE_SIZE };
    let top = (screen.y * 0.3).max(80.0);

    let title = wrap_text(HERO_TITLE, title_size, width);
    let subtitle = wrap_text(HERO_SUBTITLE, SUBTITLE_SIZE, width);

    let text_height = title.len() as f32 * title_size * 1.2 + 24.0 + subtitle.len() as f32 * SUBTITLE_SIZE * 1.5;
    let button = Rect::new(
        (screen.x - BUTTON_SIZE.x) / 2.0,
        top + text_height + 24.0,
        BUTTON_SIZE.x,
        BUTTON_SIZE.y,
    );

    HeroLayout {
        top,
        title_size,
        title,
        subtitle,
        button,
    }
}

/// "Read the blog" call to action, below the subtitle
pub fn blog_button_rect(screen: Vec2) -> Rect {
    hero_layout(screen).button
}

pub fn draw_home(screen: Vec2, scroll: f32) {
    let layout = hero_layout(screen);
    let mut y = layout.top - scroll;

    for line in &layout.title {
        let dims = measure_text(line, None, layout.title_size as u16, 1.0);
        draw_text(line, (screen.x - dims.width) / 2.0, y + layout.title_size, layout.title_size, TEXT_COLOR);
        y += layout.title_size * 1.2;
    }
    y += 24.0;

    for line in &layout.subtitle {
        let dims = measure_text(line, None, SUBTITLE_SIZE as u16, 1.0);
        draw_text(line, (screen.x - dims.width) / 2.0, y + SUBTITLE_SIZE, SUBTITLE_SIZE, MUTED_COLOR);
        y += SUBTITLE_SIZE * 1.5;
    }

    let button = layout.button;
    let top = button.y - scroll;
    draw_rectangle_lines(button.x, top, button.w, button.h, 2.0, ACCENT_COLOR);
    let label = "Read the blog";
    let dims = measure_text(label, None, 20, 1.0);
    draw_text(
        label,
        button.x + (button.w - dims.width) / 2.0,
        top + button.h / 2.0 + 7.0,
        20.0,
        ACCENT_COLOR,
    );
}
