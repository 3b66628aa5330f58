//! nightsky desktop and web entry point

use macroquad::prelude::*;
use nightsky::config::SkyConfig;
use nightsky::content::ContentRepository;
use nightsky::pages::{App, FrameInput, Page};
use nightsky::sky::loader::macroquad_fetcher;
use nightsky::sky::Viewport;
use nightsky::VERSION;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("nightsky v{}", VERSION),
        window_width: 1280,
        window_height: 800,
        window_resizable: true,
        high_dpi: true,
        // WASM: browser handles sizing
        #[cfg(not(target_arch = "wasm32"))]
        fullscreen: false,
        ..Default::default()
    }
}

fn viewport() -> Viewport {
    Viewport::new(screen_width(), screen_height(), screen_dpi_scale())
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    {
        crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut config = SkyConfig::load().await;

    #[cfg(not(target_arch = "wasm32"))]
    let no_3d = std::env::args().any(|arg| arg == "--no-3d");
    #[cfg(target_arch = "wasm32")]
    let no_3d = false;
    if no_3d {
        log::info!("3D layer disabled from the command line");
        config.enable_3d = false;
    }

    // WASM can't list directories, so posts come from the build manifest
    #[cfg(not(target_arch = "wasm32"))]
    let repo = ContentRepository::open_dir(nightsky::content::BLOG_DIR);
    #[cfg(target_arch = "wasm32")]
    let repo = ContentRepository::load_from_manifest().await;

    let seed = (macroquad::miniquad::date::now() * 1000.0) as u64;
    let mut app = App::new(config, repo, Some(macroquad_fetcher()), seed);
    app.navigate(Page::Home, viewport(), get_time() * 1000.0);

    loop {
        let (_, wheel_y) = mouse_wheel();
        let wheel = if wheel_y == 0.0 { 0.0 } else { wheel_y.signum() };

        // Touch acts as a single pointer
        let touch = touches().into_iter().next();
        let (mouse, pressed, released) = match touch {
            Some(t) => (
                t.position,
                t.phase == TouchPhase::Started,
                matches!(t.phase, TouchPhase::Ended | TouchPhase::Cancelled),
            ),
            None => (
                Vec2::from(mouse_position()),
                is_mouse_button_pressed(MouseButton::Left),
                is_mouse_button_released(MouseButton::Left),
            ),
        };

        let view = viewport();
        app.frame(FrameInput {
            now_ms: get_time() * 1000.0,
            screen: view.size(),
            pixel_ratio: view.pixel_ratio,
            mouse,
            pressed,
            released,
            wheel,
        });
        app.draw();

        next_frame().await;
    }
}
