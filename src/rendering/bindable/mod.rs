mod constant_buffer;
mod index_buffer;
mod input_layout;
mod shader;
mod topology;
pub(crate) mod transform_cbuf;
mod vertex_buffer;

pub use constant_buffer::{PixelConstantBuffer, VertexConstantBuffer};
pub use index_buffer::IndexBuffer;
pub use input_layout::InputLayout;
pub use shader::{PixelShader, VertexShader};
pub use topology::Topology;
pub use transform_cbuf::TransformCbuf;
pub use vertex_buffer::VertexBuffer;

use crate::rendering::{context::GraphicsContext, drawable::Drawable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindableKind {
    VertexBuffer,
    IndexBuffer,
    VertexShader,
    PixelShader,
    InputLayout,
    Topology,
    VertexConstantBuffer,
    PixelConstantBuffer,
    TransformConstantBuffer,
}

/// A piece of pipeline state that can be attached to the graphics context.
///
/// Resources are created and validated when the bindable is constructed, so
/// binding cannot fail. `owner` is the drawable currently being drawn; most
/// bindables ignore it.
pub trait Bindable: Send + Sync {
    fn bind(&self, gfx: &mut dyn GraphicsContext, owner: &dyn Drawable);

    fn kind(&self) -> BindableKind;
}
