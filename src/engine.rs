use crate::{
    config::AppConfig,
    demo::DemoState,
    rendering::{
        config::RenderConfig,
        context::GraphicsContext,
        error::GraphicsError,
        headless::{CreationCounts, HeadlessContext},
    },
};

/// Fixed step used when there is no display to pace the frames.
pub const HEADLESS_STEP: f32 = 1.0 / 60.0;

pub fn setup(gfx: &mut dyn GraphicsContext, config: &AppConfig) -> Result<DemoState, GraphicsError> {
    gfx.set_projection(config.render.projection.matrix());
    DemoState::new(gfx, &config.demo)
}

pub fn update(state: &mut DemoState, dt: f32) {
    state.update(dt);
}

/// Clears, draws every drawable, then presents.
pub fn render(
    state: &DemoState,
    gfx: &mut dyn GraphicsContext,
    config: &RenderConfig,
) -> Result<(), GraphicsError> {
    gfx.clear_render_target(config.clear_color);
    gfx.clear_depth_stencil();

    for drawable in &state.drawables {
        drawable.draw(gfx)?;
    }

    gfx.present(config.sync_interval)
}

pub fn run_headless(config: &AppConfig, frames: u32) -> anyhow::Result<CreationCounts> {
    let mut gfx = HeadlessContext::new();
    let mut state = setup(&mut gfx, config)?;

    for _ in 0..frames {
        update(&mut state, HEADLESS_STEP);
        render(&state, &mut gfx, &config.render)?;
        gfx.take_commands();
    }

    let counts = gfx.counts();
    log::info!(
        "Rendered {} headless frames of {} drawables",
        gfx.frames_presented(),
        state.drawables.len()
    );
    log::info!("Resources created: {:?}", counts);

    state.teardown();
    Ok(counts)
}
