pub mod bindable;
pub mod bindable_cache;
pub mod config;
pub mod context;
pub mod drawable;
pub mod error;
pub mod headless;
pub mod pipeline_state;
pub mod render_common;
pub mod renderer;
pub mod shader_source;
pub mod texture;
