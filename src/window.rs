use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::{
    config::AppConfig,
    demo::DemoState,
    engine,
    rendering::{error::ErrorCode, renderer::Renderer},
    timer::FrameTimer,
};

struct App {
    config: AppConfig,
    renderer: Option<Renderer>,
    demo_state: Option<DemoState>,
    timer: FrameTimer,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            renderer: None,
            demo_state: None,
            timer: FrameTimer::new(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let render_config = &self.config.render;
        let window_attributes = Window::default_attributes()
            .with_title(render_config.title.as_str())
            .with_inner_size(PhysicalSize::new(render_config.width, render_config.height))
            .with_resizable(false);
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        let mut renderer = pollster::block_on(Renderer::new(Arc::new(window), render_config))?;
        let demo_state = engine::setup(&mut renderer, &self.config).context("Failed to build the scene")?;

        renderer.window.request_redraw();
        self.renderer = Some(renderer);
        self.demo_state = Some(demo_state);
        self.timer = FrameTimer::new();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        if let Err(error) = self.init(event_loop) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let (Some(renderer), Some(demo_state)) = (self.renderer.as_mut(), self.demo_state.as_mut())
        else {
            return;
        };

        let failure: Option<anyhow::Error> = match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                demo_state.teardown();
                event_loop.exit();
                None
            }
            WindowEvent::Resized(new_size) => {
                renderer.resize(new_size);
                None
            }
            WindowEvent::RedrawRequested => {
                engine::update(demo_state, self.timer.mark());

                let result = engine::render(demo_state, renderer, &self.config.render);
                renderer.window.request_redraw();

                match result {
                    Ok(()) => None,
                    Err(error) if error.is_device_removed() => Some(anyhow::Error::new(error)),
                    Err(error) => match error.code() {
                        Some(ErrorCode::SurfaceLost | ErrorCode::SurfaceOutdated) => {
                            renderer.resize(renderer.size);
                            None
                        }
                        Some(ErrorCode::SurfaceTimeout) => {
                            log::warn!("Timeout");
                            None
                        }
                        _ => Some(anyhow::Error::new(error).context("Failed to render frame")),
                    },
                }
            }
            _ => None,
        };

        if let Some(error) = failure {
            self.fail(event_loop, error);
        }
    }
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
