//! About page overlay: intro copy and the skill categories, drawn over the sky
//!
//! Category chips sit in a row under the intro. Clicking a chip opens its
//! badge list; clicking it again closes it, clicking another switches.

use macroquad::prelude::*;

use super::{wrap_text, ACCENT_COLOR, MUTED_COLOR, PANEL_COLOR, TEXT_COLOR};

const NAME: &str = "About me";
const TAGLINE: &str = "Interstellar Developer";
const INTRO: &str = "Navigating the digital cosmos with code as my spacecraft. \
Most of my work is web technology, with a growing share of AI tooling and cloud infrastructure.";

/// Skill categories, in display order
pub const SKILLS: &[(&str, &[&str])] = &[
    (
        "Frontend",
        &["HTML5", "CSS3", "JavaScript", "TypeScript", "React.js", "Next.js", "TailwindCSS"],
    ),
    ("Backend", &["Python", "Node.js", "Express.js", "Flask"]),
    ("Database", &["PostgreSQL", "MySQL", "MongoDB", "VectorDB"]),
    ("AI & ML", &["NLP", "LLM API Integration", "RAG model", "AWS Bedrock"]),
    ("DevOps & Tools", &["AWS", "Git", "GitHub"]),
];

const TITLE_SIZE: f32 = 40.0;
const TAGLINE_SIZE: f32 = 22.0;
const BODY_SIZE: f32 = 18.0;
const CHIP_SIZE: f32 = 16.0;
const MAX_TEXT_WIDTH: f32 = 640.0;
const CHIP_HEIGHT: f32 = 30.0;
const CHIP_PAD: f32 = 14.0;
const GAP: f32 = 8.0;

/// Which category is open
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AboutState {
    active: Option<usize>,
}

impl AboutState {
    pub fn active(&self) -> Option<&'static str> {
        self.active.map(|i| SKILLS[i].0)
    }

    /// Open, switch, or close a category
    pub fn toggle(&mut self, index: usize) {
        if index >= SKILLS.len() {
            return;
        }
        self.active = if self.active == Some(index) { None } else { Some(index) };
    }

    /// Handle a click; returns true when it landed on a chip
    pub fn click(&mut self, point: Vec2, screen: Vec2, scroll: f32) -> bool {
        let layout = about_layout(screen, self.active);
        let point = vec2(point.x, point.y + scroll);
        match layout.chips.iter().position(|rect| rect.contains(point)) {
            Some(index) => {
                self.toggle(index);
                true
            }
            None => false,
        }
    }
}

/// Chips and badges flow left to right, wrapping at `width`
fn flow(labels: &[&str], font_size: f32, left: f32, top: f32, width: f32) -> Vec<Rect> {
    let char_width = font_size * 0.5;
    let mut rects = Vec::with_capacity(labels.len());
    let mut x = left;
    let mut y = top;
    for label in labels {
        let w = label.chars().count() as f32 * char_width + CHIP_PAD * 2.0;
        if x > left && x + w > left + width {
            x = left;
            y += CHIP_HEIGHT + GAP;
        }
        rects.push(Rect::new(x, y, w, CHIP_HEIGHT));
        x += w + GAP;
    }
    rects
}

struct AboutLayout {
    left: f32,
    top: f32,
    intro: Vec<String>,
    chips: Vec<Rect>,
    badges: Vec<Rect>,
}

fn about_layout(screen: Vec2, active: Option<usize>) -> AboutLayout {
    let width = (screen.x - 48.0).min(MAX_TEXT_WIDTH);
    let left = (screen.x - width) / 2.0;
    let top = (screen.y * 0.2).max(80.0);

    let intro = wrap_text(INTRO, BODY_SIZE, width);
    let chips_top = top
        + TITLE_SIZE * 1.2
        + TAGLINE_SIZE * 1.5
        + 16.0
        + intro.len() as f32 * BODY_SIZE * 1.5
        + 24.0;

    let names: Vec<&str> = SKILLS.iter().map(|(name, _)| *name).collect();
    let chips = flow(&names, CHIP_SIZE, left, chips_top, width);

    let badges = match active {
        Some(index) => {
            let chips_bottom = chips.iter().map(|r| r.bottom()).fold(chips_top, f32::max);
            flow(SKILLS[index].1, CHIP_SIZE, left, chips_bottom + 16.0, width)
        }
        None => Vec::new(),
    };

    AboutLayout {
        left,
        top,
        intro,
        chips,
        badges,
    }
}

fn draw_chip(label: &str, rect: Rect, scroll: f32, fill: Color, text: Color) {
    let y = rect.y - scroll;
    draw_rectangle(rect.x, y, rect.w, rect.h, fill);
    draw_text(label, rect.x + CHIP_PAD, y + rect.h / 2.0 + 5.0, CHIP_SIZE, text);
}

pub fn draw_about(state: &AboutState, screen: Vec2, scroll: f32) {
    let layout = about_layout(screen, state.active);
    let mut y = layout.top - scroll;

    draw_text(NAME, layout.left, y + TITLE_SIZE, TITLE_SIZE, TEXT_COLOR);
    y += TITLE_SIZE * 1.2;
    draw_text(TAGLINE, layout.left, y + TAGLINE_SIZE, TAGLINE_SIZE, ACCENT_COLOR);
    y += TAGLINE_SIZE * 1.5 + 16.0;

    for line in &layout.intro {
        draw_text(line, layout.left, y + BODY_SIZE, BODY_SIZE, MUTED_COLOR);
        y += BODY_SIZE * 1.5;
    }

    for (i, ((name, _), rect)) in SKILLS.iter().zip(&layout.chips).enumerate() {
        if state.active == Some(i) {
            draw_chip(name, *rect, scroll, ACCENT_COLOR, WHITE);
        } else {
            draw_chip(name, *rect, scroll, PANEL_COLOR, MUTED_COLOR);
        }
    }

    if let Some(index) = state.active {
        for (tech, rect) in SKILLS[index].1.iter().zip(&layout.badges) {
            draw_chip(tech, *rect, scroll, Color::new(0.12, 0.14, 0.22, 0.9), TEXT_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_opens_switches_and_closes() {
        let mut state = AboutState::default();
        state.toggle(0);
        assert_eq!(state.active(), Some("Frontend"));
        state.toggle(2);
        assert_eq!(state.active(), Some("Database"));
        state.toggle(2);
        assert_eq!(state.active(), None);
        // Out of range is ignored
        state.toggle(SKILLS.len());
        assert_eq!(state.active(), None);
    }

    #[test]
    fn test_click_on_chip() {
        let screen = vec2(1280.0, 800.0);
        let mut state = AboutState::default();
        let chip = about_layout(screen, None).chips[1];
        assert!(state.click(chip.center(), screen, 0.0));
        assert_eq!(state.active(), Some("Backend"));

        // Scrolled content moves up under the pointer
        let mut state = AboutState::default();
        assert!(state.click(chip.center() - vec2(0.0, 50.0), screen, 50.0));
        assert_eq!(state.active(), Some("Backend"));

        assert!(!state.click(vec2(5.0, 5.0), screen, 0.0));
    }

    #[test]
    fn test_badges_follow_open_category() {
        let screen = vec2(1280.0, 800.0);
        assert!(about_layout(screen, None).badges.is_empty());
        let layout = about_layout(screen, Some(0));
        assert_eq!(layout.badges.len(), SKILLS[0].1.len());
        let chips_bottom = layout.chips.iter().map(|r| r.bottom()).fold(0.0, f32::max);
        assert!(layout.badges.iter().all(|r| r.y > chips_bottom));
    }

    #[test]
    fn test_chips_wrap_on_narrow_screen() {
        let layout = about_layout(vec2(360.0, 800.0), None);
        assert_eq!(layout.chips.len(), SKILLS.len());
        assert!(layout.chips.iter().all(|r| r.right() <= 360.0 - layout.left + 1e-3));
        let rows = layout
            .chips
            .windows(2)
            .filter(|pair| pair[1].y > pair[0].y)
            .count();
        assert!(rows >= 1);
    }
}
