use std::{fmt::Display, str::FromStr};

use crate::rendering::config::RenderConfig;

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub box_count: usize,
    /// Seed for the scene's random motion. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            box_count: 80,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub render: RenderConfig,
    pub demo: DemoConfig,
    /// Run this many frames without a window instead of opening one.
    pub headless_frames: Option<u32>,
}

impl AppConfig {
    /// Defaults with `BOXFIELD_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        override_with(&lookup, "BOXFIELD_WIDTH", &mut config.render.width);
        override_with(&lookup, "BOXFIELD_HEIGHT", &mut config.render.height);
        override_with(&lookup, "BOXFIELD_SYNC_INTERVAL", &mut config.render.sync_interval);
        override_with(&lookup, "BOXFIELD_BOXES", &mut config.demo.box_count);

        if let Some(seed) = parse(&lookup, "BOXFIELD_SEED") {
            config.demo.seed = Some(seed);
        }
        if let Some(frames) = parse(&lookup, "BOXFIELD_HEADLESS_FRAMES") {
            config.headless_frames = Some(frames);
        }

        config
    }
}

fn override_with<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T)
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(value) = parse(lookup, key) {
        *target = value;
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
