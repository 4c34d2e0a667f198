//! A `GraphicsContext` that never touches a GPU.
//!
//! Keeps buffer contents in memory, counts how many resources of each kind were
//! created and records every state change, draw, clear and present in order. Input
//! layouts are checked against the vertex shader the same way the wgpu renderer
//! checks them. Used for headless runs and as the stub context in tests.

use glam::Mat4;

use crate::rendering::{
    context::{
        BufferDesc, BufferId, BufferKind, GraphicsContext, IndexFormat, InputElement,
        InputLayoutId, PrimitiveTopology, ShaderId, ShaderStage, MAX_VERTEX_SLOTS,
    },
    error::{ErrorCode, GraphicsError},
    pipeline_state::BoundState,
    shader_source::ShaderSource,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CreationCounts {
    pub vertex_buffers: usize,
    pub index_buffers: usize,
    pub constant_buffers: usize,
    pub vertex_shaders: usize,
    pub pixel_shaders: usize,
    pub input_layouts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetVertexBuffer { slot: u32, buffer: BufferId, stride: u32 },
    SetIndexBuffer { buffer: BufferId, format: IndexFormat },
    SetShader { stage: ShaderStage, shader: ShaderId },
    SetConstantBuffer { stage: ShaderStage, buffer: BufferId },
    SetInputLayout(InputLayoutId),
    SetTopology(PrimitiveTopology),
    WriteBuffer(BufferId),
    DrawIndexed { count: u32 },
    ClearRenderTarget([f32; 4]),
    ClearDepthStencil,
    Present { sync_interval: u32 },
}

struct HeadlessBuffer {
    kind: BufferKind,
    data: Vec<u8>,
}

pub struct HeadlessContext {
    buffers: Vec<HeadlessBuffer>,
    shaders: Vec<ShaderStage>,
    layouts: Vec<Vec<InputElement>>,
    counts: CreationCounts,
    state: BoundState,
    commands: Vec<Command>,
    projection: Mat4,
    frames: u64,
    pending_failure: Option<ErrorCode>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
            shaders: Vec::new(),
            layouts: Vec::new(),
            counts: CreationCounts::default(),
            state: BoundState::default(),
            commands: Vec::new(),
            projection: Mat4::IDENTITY,
            frames: 0,
            pending_failure: None,
        }
    }

    pub fn counts(&self) -> CreationCounts {
        self.counts
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    fn check_failure(&mut self, what: &str) -> Result<(), GraphicsError> {
        match self.pending_failure.take() {
            Some(code) => Err(GraphicsError::resource(code, format!("{what} creation failed"))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
impl HeadlessContext {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> &[u8] {
        &self.buffers[buffer.0 as usize].data
    }

    /// Makes the next creation call fail with `code`.
    pub fn fail_next_creation(&mut self, code: ErrorCode) {
        self.pending_failure = Some(code);
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for HeadlessContext {
    fn create_buffer(
        &mut self,
        desc: &BufferDesc<'_>,
        contents: Option<&[u8]>,
    ) -> Result<BufferId, GraphicsError> {
        self.check_failure(desc.label)?;

        let mut data = vec![0; desc.size as usize];
        if let Some(contents) = contents {
            if contents.len() as u64 != desc.size {
                return Err(GraphicsError::resource(
                    ErrorCode::Validation,
                    format!(
                        "{}: {} bytes of initial data for a {} byte buffer",
                        desc.label,
                        contents.len(),
                        desc.size
                    ),
                ));
            }
            data.copy_from_slice(contents);
        }

        match desc.kind {
            BufferKind::Vertex => self.counts.vertex_buffers += 1,
            BufferKind::Index => self.counts.index_buffers += 1,
            BufferKind::Constant => self.counts.constant_buffers += 1,
        }

        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(HeadlessBuffer {
            kind: desc.kind,
            data,
        });
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]) {
        let target = &mut self.buffers[buffer.0 as usize];
        debug_assert_eq!(target.kind, BufferKind::Constant, "Only constant buffers are writable");
        debug_assert_eq!(target.data.len(), data.len(), "Partial constant buffer write");
        target.data.clear();
        target.data.extend_from_slice(data);
        self.commands.push(Command::WriteBuffer(buffer));
    }

    fn create_shader(
        &mut self,
        stage: ShaderStage,
        label: &str,
        bytecode: &[u8],
    ) -> Result<ShaderId, GraphicsError> {
        self.check_failure(label)?;
        if bytecode.is_empty() {
            return Err(GraphicsError::resource(
                ErrorCode::Validation,
                format!("{label}: empty shader bytecode"),
            ));
        }

        match stage {
            ShaderStage::Vertex => self.counts.vertex_shaders += 1,
            ShaderStage::Pixel => self.counts.pixel_shaders += 1,
        }
        let id = ShaderId(self.shaders.len() as u32);
        self.shaders.push(stage);
        Ok(id)
    }

    fn create_input_layout(
        &mut self,
        elements: &[InputElement],
        vertex_bytecode: &[u8],
    ) -> Result<InputLayoutId, GraphicsError> {
        self.check_failure("Input layout")?;
        if let Some(element) = elements
            .iter()
            .find(|element| element.input_slot as usize >= MAX_VERTEX_SLOTS)
        {
            return Err(GraphicsError::resource(
                ErrorCode::Validation,
                format!("Input element {} uses slot {}", element.semantic, element.input_slot),
            ));
        }

        ShaderSource::parse("Input layout", vertex_bytecode)?.validate_input_layout(elements)?;

        self.counts.input_layouts += 1;
        let id = InputLayoutId(self.layouts.len() as u32);
        self.layouts.push(elements.to_vec());
        Ok(id)
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, stride: u32) {
        self.state.set_vertex_buffer(slot, buffer, stride);
        self.commands.push(Command::SetVertexBuffer {
            slot,
            buffer,
            stride,
        });
    }

    fn set_index_buffer(&mut self, buffer: BufferId, format: IndexFormat) {
        self.state.index_buffer = Some((buffer, format));
        self.commands.push(Command::SetIndexBuffer { buffer, format });
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: ShaderId) {
        debug_assert_eq!(self.shaders[shader.0 as usize], stage, "Shader bound to the wrong stage");
        self.state.set_shader(stage, shader);
        self.commands.push(Command::SetShader { stage, shader });
    }

    fn set_constant_buffer(&mut self, stage: ShaderStage, buffer: BufferId) {
        self.state.set_constant_buffer(stage, buffer);
        self.commands.push(Command::SetConstantBuffer { stage, buffer });
    }

    fn set_input_layout(&mut self, layout: InputLayoutId) {
        self.state.input_layout = Some(layout);
        self.commands.push(Command::SetInputLayout(layout));
    }

    fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.state.topology = Some(topology);
        self.commands.push(Command::SetTopology(topology));
    }

    fn draw_indexed(&mut self, count: u32) -> Result<(), GraphicsError> {
        let layout = self
            .state
            .input_layout
            .map(|id| self.layouts[id.0 as usize].as_slice())
            .unwrap_or_default();
        self.state.resolve_draw(layout, count)?;
        self.commands.push(Command::DrawIndexed { count });
        Ok(())
    }

    fn clear_render_target(&mut self, color: [f32; 4]) {
        self.commands.push(Command::ClearRenderTarget(color));
    }

    fn clear_depth_stencil(&mut self) {
        self.commands.push(Command::ClearDepthStencil);
    }

    fn present(&mut self, sync_interval: u32) -> Result<(), GraphicsError> {
        self.frames += 1;
        self.commands.push(Command::Present { sync_interval });
        Ok(())
    }

    fn projection(&self) -> Mat4 {
        self.projection
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }
}
