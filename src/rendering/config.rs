use crate::camera::Projection;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub clear_color: [f32; 4],
    /// `0` presents immediately, `1` waits for vertical blank.
    pub sync_interval: u32,
    pub projection: Projection,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Boxfield".to_string(),
            clear_color: [0.07, 0.0, 0.12, 1.0],
            sync_interval: 1,
            projection: Projection::default(),
        }
    }
}
