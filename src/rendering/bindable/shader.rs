use std::{path::Path, sync::Arc};

use crate::rendering::{
    bindable::{Bindable, BindableKind},
    context::{GraphicsContext, ShaderId, ShaderStage},
    drawable::Drawable,
    error::GraphicsError,
};

fn read_bytecode(path: &Path) -> Result<Arc<[u8]>, GraphicsError> {
    std::fs::read(path)
        .map(Arc::from)
        .map_err(|source| GraphicsError::ShaderLoad {
            path: path.to_path_buf(),
            source,
        })
}

pub struct VertexShader {
    shader: ShaderId,
    bytecode: Arc<[u8]>,
}

impl VertexShader {
    pub fn new(gfx: &mut dyn GraphicsContext, path: impl AsRef<Path>) -> Result<Self, GraphicsError> {
        let path = path.as_ref();
        let bytecode = read_bytecode(path)?;
        Self::from_bytecode(gfx, &path.to_string_lossy(), bytecode)
    }

    pub fn from_bytecode(
        gfx: &mut dyn GraphicsContext,
        label: &str,
        bytecode: Arc<[u8]>,
    ) -> Result<Self, GraphicsError> {
        let shader = gfx.create_shader(ShaderStage::Vertex, label, &bytecode)?;
        Ok(Self { shader, bytecode })
    }

    /// Needed to build an input layout that matches this shader's inputs.
    pub fn bytecode(&self) -> Arc<[u8]> {
        self.bytecode.clone()
    }
}

impl Bindable for VertexShader {
    fn bind(&self, gfx: &mut dyn GraphicsContext, _owner: &dyn Drawable) {
        gfx.set_shader(ShaderStage::Vertex, self.shader);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::VertexShader
    }
}

pub struct PixelShader {
    shader: ShaderId,
}

impl PixelShader {
    pub fn new(gfx: &mut dyn GraphicsContext, path: impl AsRef<Path>) -> Result<Self, GraphicsError> {
        let path = path.as_ref();
        let bytecode = read_bytecode(path)?;
        Self::from_bytecode(gfx, &path.to_string_lossy(), &bytecode)
    }

    pub fn from_bytecode(
        gfx: &mut dyn GraphicsContext,
        label: &str,
        bytecode: &[u8],
    ) -> Result<Self, GraphicsError> {
        let shader = gfx.create_shader(ShaderStage::Pixel, label, bytecode)?;
        Ok(Self { shader })
    }
}

impl Bindable for PixelShader {
    fn bind(&self, gfx: &mut dyn GraphicsContext, _owner: &dyn Drawable) {
        gfx.set_shader(ShaderStage::Pixel, self.shader);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::PixelShader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::headless::HeadlessContext;

    #[test]
    fn missing_file_reports_path() {
        let mut gfx = HeadlessContext::new();
        let result = VertexShader::new(&mut gfx, "does/not/exist.wgsl");

        match result {
            Err(GraphicsError::ShaderLoad { path, .. }) => {
                assert_eq!(path, Path::new("does/not/exist.wgsl"))
            }
            _ => panic!("expected a shader load error"),
        }
        assert_eq!(gfx.counts().vertex_shaders, 0);
    }

    #[test]
    fn vertex_shader_keeps_bytecode() {
        let mut gfx = HeadlessContext::new();
        let shader = VertexShader::from_bytecode(&mut gfx, "vs", Arc::from(&b"vs bytes"[..])).unwrap();

        assert_eq!(&*shader.bytecode(), b"vs bytes");
    }
}
