pub mod cube;
pub mod orbit;

pub use cube::Cube;
pub use orbit::MotionDistributions;

/// Shader blobs are loaded relative to the working directory.
pub const SHADER_FOLDER: &str = "assets/shaders";
