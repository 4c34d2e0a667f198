use bytemuck::Pod;

use crate::rendering::{
    bindable::{Bindable, BindableKind},
    context::{BufferDesc, BufferId, BufferKind, GraphicsContext},
    drawable::Drawable,
    error::GraphicsError,
};

pub struct VertexBuffer {
    buffer: BufferId,
    stride: u32,
}

impl VertexBuffer {
    pub fn new<V: Pod>(
        gfx: &mut dyn GraphicsContext,
        label: &str,
        vertices: &[V],
    ) -> Result<Self, GraphicsError> {
        let contents: &[u8] = bytemuck::cast_slice(vertices);
        let buffer = gfx.create_buffer(
            &BufferDesc {
                label,
                kind: BufferKind::Vertex,
                size: contents.len() as u64,
            },
            Some(contents),
        )?;

        Ok(Self {
            buffer,
            stride: std::mem::size_of::<V>() as u32,
        })
    }
}

impl Bindable for VertexBuffer {
    fn bind(&self, gfx: &mut dyn GraphicsContext, _owner: &dyn Drawable) {
        gfx.set_vertex_buffer(0, self.buffer, self.stride);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::VertexBuffer
    }
}
