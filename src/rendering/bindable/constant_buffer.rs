use std::marker::PhantomData;

use bytemuck::Pod;

use crate::rendering::{
    bindable::{Bindable, BindableKind},
    context::{BufferDesc, BufferId, BufferKind, GraphicsContext, ShaderStage},
    drawable::Drawable,
    error::GraphicsError,
};

/// A CPU-writable GPU buffer holding exactly one `C`.
///
/// Not a bindable on its own: wrap it in `VertexConstantBuffer` or
/// `PixelConstantBuffer` to pick the pipeline stage it is attached to.
pub struct ConstantBuffer<C> {
    buffer: BufferId,
    _payload: PhantomData<fn(C)>,
}

impl<C: Pod> ConstantBuffer<C> {
    pub fn new(gfx: &mut dyn GraphicsContext, label: &str, consts: &C) -> Result<Self, GraphicsError> {
        Self::create(gfx, label, Some(bytemuck::bytes_of(consts)))
    }

    /// Creates the buffer without initial contents; `update` before the first draw.
    pub fn uninitialized(gfx: &mut dyn GraphicsContext, label: &str) -> Result<Self, GraphicsError> {
        Self::create(gfx, label, None)
    }

    fn create(
        gfx: &mut dyn GraphicsContext,
        label: &str,
        contents: Option<&[u8]>,
    ) -> Result<Self, GraphicsError> {
        let buffer = gfx.create_buffer(
            &BufferDesc {
                label,
                kind: BufferKind::Constant,
                size: std::mem::size_of::<C>() as u64,
            },
            contents,
        )?;

        Ok(Self {
            buffer,
            _payload: PhantomData,
        })
    }

    pub fn update(&self, gfx: &mut dyn GraphicsContext, consts: &C) {
        gfx.write_buffer(self.buffer, bytemuck::bytes_of(consts));
    }
}

pub struct VertexConstantBuffer<C>(ConstantBuffer<C>);

impl<C: Pod> VertexConstantBuffer<C> {
    pub fn uninitialized(gfx: &mut dyn GraphicsContext, label: &str) -> Result<Self, GraphicsError> {
        ConstantBuffer::uninitialized(gfx, label).map(Self)
    }

    pub fn update(&self, gfx: &mut dyn GraphicsContext, consts: &C) {
        self.0.update(gfx, consts);
    }
}

impl<C: Pod> Bindable for VertexConstantBuffer<C> {
    fn bind(&self, gfx: &mut dyn GraphicsContext, _owner: &dyn Drawable) {
        gfx.set_constant_buffer(ShaderStage::Vertex, self.0.buffer);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::VertexConstantBuffer
    }
}

pub struct PixelConstantBuffer<C>(ConstantBuffer<C>);

impl<C: Pod> PixelConstantBuffer<C> {
    pub fn new(gfx: &mut dyn GraphicsContext, label: &str, consts: &C) -> Result<Self, GraphicsError> {
        ConstantBuffer::new(gfx, label, consts).map(Self)
    }
}

impl<C: Pod> Bindable for PixelConstantBuffer<C> {
    fn bind(&self, gfx: &mut dyn GraphicsContext, _owner: &dyn Drawable) {
        gfx.set_constant_buffer(ShaderStage::Pixel, self.0.buffer);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::PixelConstantBuffer
    }
}
