use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::rendering::{
    bindable::{Bindable, BindableKind, VertexConstantBuffer},
    context::GraphicsContext,
    drawable::Drawable,
    error::GraphicsError,
};

/// This should match the `Transform` uniform in the vertex shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TransformData {
    pub model_view_projection: Mat4,
}

impl TransformData {
    /// glam matrices are column-major like WGSL's `mat4x4`, so `projection * model`
    /// uploads as-is with no transpose.
    pub fn new(model: Mat4, projection: Mat4) -> Self {
        Self {
            model_view_projection: projection * model,
        }
    }
}

/// Per-instance vertex constant buffer that re-uploads the owner's
/// model-view-projection matrix every time it is bound.
pub struct TransformCbuf {
    vcbuf: VertexConstantBuffer<TransformData>,
}

impl TransformCbuf {
    pub fn new(gfx: &mut dyn GraphicsContext) -> Result<Self, GraphicsError> {
        Ok(Self {
            vcbuf: VertexConstantBuffer::uninitialized(gfx, "Transform constant buffer")?,
        })
    }
}

impl Bindable for TransformCbuf {
    fn bind(&self, gfx: &mut dyn GraphicsContext, owner: &dyn Drawable) {
        let data = TransformData::new(owner.transform(), gfx.projection());
        self.vcbuf.update(gfx, &data);
        self.vcbuf.bind(gfx, owner);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::TransformConstantBuffer
    }
}
