use anyhow::Result;

mod camera;
mod config;
mod demo;
mod engine;
mod rendering;
mod shapes;
mod timer;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let config = config::AppConfig::from_env();

    match config.headless_frames {
        Some(frames) => {
            engine::run_headless(&config, frames)?;
        }
        None => pollster::block_on(window::run(config))?,
    }

    Ok(())
}
