use glam::Mat4;

use crate::rendering::error::GraphicsError;

/// Number of vertex buffer slots a context has to support.
pub const MAX_VERTEX_SLOTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputLayoutId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Immutable vertex data.
    Vertex,
    /// Immutable index data.
    Index,
    /// Small uniform block, rewritten from the CPU with `write_buffer`.
    Constant,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub kind: BufferKind,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    #[default]
    TriangleList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32,
}

impl ElementFormat {
    /// Bytes one element occupies in a vertex.
    pub fn size(self) -> u32 {
        match self {
            ElementFormat::Float32 | ElementFormat::Uint32 => 4,
            ElementFormat::Float32x2 => 8,
            ElementFormat::Float32x3 => 12,
            ElementFormat::Float32x4 => 16,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputClass {
    #[default]
    PerVertex,
    PerInstance,
}

/// One field of a vertex struct as seen by the input assembler.
///
/// Elements are matched to vertex shader inputs by their position in the layout:
/// the n-th element feeds `@location(n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputElement {
    pub semantic: &'static str,
    pub semantic_index: u32,
    pub format: ElementFormat,
    pub input_slot: u32,
    pub offset: u32,
    pub class: InputClass,
}

impl InputElement {
    pub const fn per_vertex(semantic: &'static str, format: ElementFormat, offset: u32) -> Self {
        Self {
            semantic,
            semantic_index: 0,
            format,
            input_slot: 0,
            offset,
            class: InputClass::PerVertex,
        }
    }
}

/// The device plus immediate context that bindables talk to.
///
/// Creation calls allocate and may fail. State setters only record what the next
/// `draw_indexed` uses and never allocate.
pub trait GraphicsContext {
    fn create_buffer(
        &mut self,
        desc: &BufferDesc<'_>,
        contents: Option<&[u8]>,
    ) -> Result<BufferId, GraphicsError>;

    /// Replaces the whole content of a constant buffer.
    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]);

    fn create_shader(
        &mut self,
        stage: ShaderStage,
        label: &str,
        bytecode: &[u8],
    ) -> Result<ShaderId, GraphicsError>;

    /// Builds an input layout, checking it against the vertex shader's input signature.
    fn create_input_layout(
        &mut self,
        elements: &[InputElement],
        vertex_bytecode: &[u8],
    ) -> Result<InputLayoutId, GraphicsError>;

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, stride: u32);
    fn set_index_buffer(&mut self, buffer: BufferId, format: IndexFormat);
    fn set_shader(&mut self, stage: ShaderStage, shader: ShaderId);
    /// Binds `buffer` to constant slot 0 of `stage`.
    fn set_constant_buffer(&mut self, stage: ShaderStage, buffer: BufferId);
    fn set_input_layout(&mut self, layout: InputLayoutId);
    fn set_topology(&mut self, topology: PrimitiveTopology);

    fn draw_indexed(&mut self, count: u32) -> Result<(), GraphicsError>;

    fn clear_render_target(&mut self, color: [f32; 4]);
    fn clear_depth_stencil(&mut self);
    fn present(&mut self, sync_interval: u32) -> Result<(), GraphicsError>;

    fn projection(&self) -> Mat4;
    fn set_projection(&mut self, projection: Mat4);
}
