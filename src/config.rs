//! Sky layer configuration
//!
//! Every tunable of the animated background lives here with its default.
//! The whole tree is (de)serializable as RON so a deployment can override
//! a handful of values in `assets/config/sky.ron` and inherit the rest.

use macroquad::color::Color;
use macroquad::math::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where the app looks for configuration overrides
pub const CONFIG_PATH: &str = "assets/config/sky.ron";

/// Closed interval `[min, max]` sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span(pub f32, pub f32);

impl Span {
    pub fn min(&self) -> f32 {
        self.0.min(self.1)
    }

    pub fn max(&self) -> f32 {
        self.0.max(self.1)
    }

    /// Draw a value from the interval (both ends inclusive)
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = (self.min(), self.max());
        if hi <= lo {
            return lo;
        }
        rng.gen_range(lo..=hi)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min() && value <= self.max()
    }
}

/// Top-level configuration for the night sky
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    /// Viewports narrower than this use the mobile profile
    pub mobile_breakpoint: f32,
    /// Force the 2D-only degrade (no render surface, no models)
    pub enable_3d: bool,
    pub starfield: StarfieldConfig,
    pub camera: CameraConfig,
    /// Kinds of floating props; each contributes its own slots to the pool
    pub props: Vec<PropSpec>,
    pub throw: ThrowConfig,
    pub burst: BurstConfig,
    pub scene: SceneTuning,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768.0,
            enable_3d: true,
            starfield: StarfieldConfig::default(),
            camera: CameraConfig::default(),
            props: vec![PropSpec::asteroid()],
            throw: ThrowConfig::default(),
            burst: BurstConfig::default(),
            scene: SceneTuning::default(),
        }
    }
}

impl SkyConfig {
    /// Parse a RON document, missing fields take their defaults
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn to_ron(&self) -> String {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .unwrap_or_default()
    }

    /// Load overrides from [`CONFIG_PATH`], falling back to defaults
    pub async fn load() -> Self {
        match macroquad::file::load_string(CONFIG_PATH).await {
            Ok(text) => match Self::from_ron(&text) {
                Ok(config) => {
                    log::info!("Loaded sky config from {}", CONFIG_PATH);
                    config
                }
                Err(e) => {
                    log::warn!("Invalid sky config {}: {}, using defaults", CONFIG_PATH, e);
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!("No sky config at {}, using defaults", CONFIG_PATH);
                Self::default()
            }
        }
    }

    pub fn is_mobile(&self, viewport_width: f32) -> bool {
        viewport_width < self.mobile_breakpoint
    }

    /// Total pool size for a viewport width
    pub fn pool_target(&self, viewport_width: f32) -> usize {
        let mobile = self.is_mobile(viewport_width);
        self.props.iter().map(|p| p.count(mobile)).sum()
    }
}

/// 2D starfield tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    /// Viewport area (px²) per star in the deterministic count term
    pub area_per_star: f32,
    pub base_count: usize,
    /// The randomized count term is `random_floor + [0, random_span)`
    pub random_floor: f32,
    pub random_span: f32,
    /// Stars are spread over this many viewport heights for seamless wrap
    pub vertical_bands: f32,
    pub radius: Span,
    pub max_opacity: Span,
    pub twinkle_speed: Span,
    pub min_opacity: f32,
    /// Auto-scroll speed in px/s
    pub scroll_speed_mobile: f32,
    pub scroll_speed_desktop: f32,
    pub pointer_factor_mobile: f32,
    pub pointer_factor_desktop: f32,
    /// Per-frame decay of the smoothed pointer velocity
    pub pointer_decay: f32,
    pub parallax: f32,
    /// Page scroll contributes this fraction to vertical position
    pub page_scroll_factor: f32,
    /// Stars further than this outside the viewport are not drawn
    pub cull_margin: f32,
    /// Blue, orange, white; invalid entries fall back per slot
    pub palette: [String; 3],
    pub glow_alpha: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            area_per_star: 1000.0,
            base_count: 200,
            random_floor: 600.0,
            random_span: 400.0,
            vertical_bands: 3.0,
            radius: Span(0.8, 1.6),
            max_opacity: Span(0.5, 1.0),
            twinkle_speed: Span(0.001, 0.006),
            min_opacity: 0.1,
            scroll_speed_mobile: 7.0,
            scroll_speed_desktop: 15.0,
            pointer_factor_mobile: 0.8,
            pointer_factor_desktop: 1.5,
            pointer_decay: 0.95,
            parallax: 0.15,
            page_scroll_factor: 0.5,
            cull_margin: 50.0,
            palette: [
                "#4169e1".to_string(),
                "#ffa500".to_string(),
                "#ffffff".to_string(),
            ],
            glow_alpha: 0.3,
        }
    }
}

impl StarfieldConfig {
    const FALLBACK_PALETTE: [u32; 3] = [0x4169e1, 0xffa500, 0xffffff];

    /// Resolve the configured palette, substituting fallbacks for bad entries
    pub fn resolved_palette(&self) -> [Color; 3] {
        let mut colors = [Color::from_hex(0); 3];
        for (i, slot) in colors.iter_mut().enumerate() {
            *slot = match parse_hex_color(&self.palette[i]) {
                Some(c) => c,
                None => {
                    if !self.palette[i].trim().is_empty() {
                        log::warn!("Invalid star color {:?}, using fallback", self.palette[i]);
                    }
                    Color::from_hex(Self::FALLBACK_PALETTE[i])
                }
            };
        }
        colors
    }
}

/// Parse `#rrggbb` / `rrggbb` into an opaque color
pub fn parse_hex_color(text: &str) -> Option<Color> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(Color::from_hex)
}

/// Perspective camera placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 5.0, 30.0],
            target: [0.0, 0.0, -20.0],
        }
    }
}

impl CameraConfig {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn target(&self) -> Vec3 {
        Vec3::from_array(self.target)
    }
}

/// One kind of floating prop (asteroid, astronaut, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropSpec {
    pub name: String,
    /// OBJ model; a procedural placeholder is used if it fails to load
    pub model_path: String,
    pub count_desktop: usize,
    pub count_mobile: usize,
    pub scale: Span,
    /// Leftward drift speed (units/s)
    pub speed: Span,
    pub vertical_speed: Span,
    /// Per-axis ambient spin (rad/s)
    pub rotation_speed: Span,
    /// Base surface color (hex)
    pub color: String,
}

impl Default for PropSpec {
    fn default() -> Self {
        Self::asteroid()
    }
}

impl PropSpec {
    pub fn asteroid() -> Self {
        Self {
            name: "asteroid".to_string(),
            model_path: "assets/models/asteroid.obj".to_string(),
            count_desktop: 8,
            count_mobile: 4,
            scale: Span(1.2, 2.2),
            speed: Span(4.0, 8.0),
            vertical_speed: Span(-0.6, 0.6),
            rotation_speed: Span(-0.15, 0.15),
            color: "#2d3033".to_string(),
        }
    }

    /// Slow drifting decorative astronaut, not part of the default set
    pub fn astronaut() -> Self {
        Self {
            name: "astronaut".to_string(),
            model_path: "assets/models/astronaut.obj".to_string(),
            count_desktop: 1,
            count_mobile: 1,
            scale: Span(1.0, 1.0),
            speed: Span(1.5, 2.5),
            vertical_speed: Span(-0.2, 0.2),
            rotation_speed: Span(-0.1, 0.1),
            color: "#d8d8dc".to_string(),
        }
    }

    pub fn count(&self, mobile: bool) -> usize {
        if mobile {
            self.count_mobile
        } else {
            self.count_desktop
        }
    }

    pub fn base_color(&self) -> Color {
        parse_hex_color(&self.color).unwrap_or_else(|| Color::from_hex(0x2d3033))
    }
}

/// Pick-and-throw tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowConfig {
    /// Gestures shorter than this (px) count as taps
    pub min_distance_px: f32,
    /// Gestures slower than this (ms) count as slow drags
    pub max_duration_ms: f32,
    pub speed_factor: f32,
    /// Throw speed never drops below this fraction of ambient speed
    pub speed_floor_ratio: f32,
    /// Gesture speed to X/Y velocity
    pub velocity_scale: f32,
    pub depth_jitter: Span,
    pub spin_jitter: Span,
    pub spin_bias: f32,
    /// Thrown spin is integrated this many times faster than ambient spin
    pub spin_multiplier: f32,
    /// Escape box in multiples of the visible frustum slice
    pub escape_margin: f32,
    /// Recycle once z passes camera.z + this
    pub near_escape: f32,
    pub far_escape: f32,
    pub timeout_secs: f64,
    /// Picking is disabled for this long after a release
    pub cooldown_ms: f64,
}

impl Default for ThrowConfig {
    fn default() -> Self {
        Self {
            min_distance_px: 10.0,
            max_duration_ms: 1000.0,
            speed_factor: 10.0,
            speed_floor_ratio: 0.7,
            velocity_scale: 0.5,
            depth_jitter: Span(-2.5, 2.5),
            spin_jitter: Span(-1.0, 1.0),
            spin_bias: 0.5,
            spin_multiplier: 2.0,
            escape_margin: 3.0,
            near_escape: 20.0,
            far_escape: -150.0,
            timeout_secs: 30.0,
            cooldown_ms: 500.0,
        }
    }
}

/// Particle burst spawned when a prop is released
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    pub count: usize,
    pub radius: f32,
    /// Per-axis initial velocity
    pub velocity: Span,
    pub lifetime_ms: f64,
    pub color: String,
    pub opacity: f32,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            count: 20,
            radius: 0.2,
            velocity: Span(-1.0, 1.0),
            lifetime_ms: 1000.0,
            color: "#aaaaaa".to_string(),
            opacity: 0.8,
        }
    }
}

/// Scene-wide placement and timing tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneTuning {
    pub spawn_depth: Span,
    /// Initial placement: right edge plus this much
    pub spawn_x_jitter: Span,
    /// Recycled placement: right edge plus this much
    pub recycle_x_jitter: Span,
    /// Ambient props recycle once x < -visible_width * this
    pub exit_margin: f32,
    pub max_frame_delta: f32,
    pub max_pixel_ratio: f32,
    pub resize_debounce_ms: f64,
    pub fade_in_secs: f32,
    /// Key light contribution kept for faces another prop occludes
    pub shadow_strength: f32,
}

impl Default for SceneTuning {
    fn default() -> Self {
        Self {
            spawn_depth: Span(-60.0, -10.0),
            spawn_x_jitter: Span(0.0, 50.0),
            recycle_x_jitter: Span(0.0, 100.0),
            exit_margin: 1.0,
            max_frame_delta: 0.1,
            max_pixel_ratio: 2.0,
            resize_debounce_ms: 250.0,
            fade_in_secs: 1.0,
            shadow_strength: 0.35,
        }
    }
}
