use crate::rendering::{
    bindable::{Bindable, BindableKind},
    context::{BufferDesc, BufferId, BufferKind, GraphicsContext, IndexFormat},
    drawable::Drawable,
    error::GraphicsError,
};

/// 16-bit index buffer. Its element count parameterizes the draw call.
pub struct IndexBuffer {
    buffer: BufferId,
    count: u32,
}

impl IndexBuffer {
    pub fn new(
        gfx: &mut dyn GraphicsContext,
        label: &str,
        indices: &[u16],
    ) -> Result<Self, GraphicsError> {
        let contents: &[u8] = bytemuck::cast_slice(indices);
        let buffer = gfx.create_buffer(
            &BufferDesc {
                label,
                kind: BufferKind::Index,
                size: contents.len() as u64,
            },
            Some(contents),
        )?;

        Ok(Self {
            buffer,
            count: indices.len() as u32,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Bindable for IndexBuffer {
    fn bind(&self, gfx: &mut dyn GraphicsContext, _owner: &dyn Drawable) {
        gfx.set_index_buffer(self.buffer, IndexFormat::Uint16);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::IndexBuffer
    }
}
