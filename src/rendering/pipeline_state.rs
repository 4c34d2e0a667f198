use crate::rendering::{
    context::{
        BufferId, IndexFormat, InputElement, InputLayoutId, PrimitiveTopology, ShaderId,
        ShaderStage, MAX_VERTEX_SLOTS,
    },
    error::{ErrorCode, GraphicsError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBinding {
    pub buffer: BufferId,
    pub stride: u32,
}

/// Everything that decides which render pipeline a draw needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub vertex_shader: ShaderId,
    pub pixel_shader: ShaderId,
    pub input_layout: InputLayoutId,
    pub topology: PrimitiveTopology,
    pub index_format: IndexFormat,
    /// Strides of the slots the input layout reads, zero for unused slots.
    pub strides: [u32; MAX_VERTEX_SLOTS],
    pub vertex_constants: bool,
    pub pixel_constants: bool,
}

/// A fully resolved draw, ready to be replayed into a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub key: PipelineKey,
    pub vertex_buffers: [Option<BufferId>; MAX_VERTEX_SLOTS],
    pub index_buffer: BufferId,
    pub vertex_constants: Option<BufferId>,
    pub pixel_constants: Option<BufferId>,
    pub count: u32,
}

/// Pipeline state set through the immediate-context style setters.
#[derive(Debug, Default, Clone)]
pub struct BoundState {
    pub vertex_buffers: [Option<VertexBinding>; MAX_VERTEX_SLOTS],
    pub index_buffer: Option<(BufferId, IndexFormat)>,
    pub vertex_shader: Option<ShaderId>,
    pub pixel_shader: Option<ShaderId>,
    pub vertex_constants: Option<BufferId>,
    pub pixel_constants: Option<BufferId>,
    pub input_layout: Option<InputLayoutId>,
    pub topology: Option<PrimitiveTopology>,
}

impl BoundState {
    pub fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, stride: u32) {
        debug_assert!(
            (slot as usize) < MAX_VERTEX_SLOTS,
            "Vertex buffer slot {slot} out of range"
        );
        if let Some(binding) = self.vertex_buffers.get_mut(slot as usize) {
            *binding = Some(VertexBinding { buffer, stride });
        }
    }

    pub fn set_shader(&mut self, stage: ShaderStage, shader: ShaderId) {
        match stage {
            ShaderStage::Vertex => self.vertex_shader = Some(shader),
            ShaderStage::Pixel => self.pixel_shader = Some(shader),
        }
    }

    pub fn set_constant_buffer(&mut self, stage: ShaderStage, buffer: BufferId) {
        match stage {
            ShaderStage::Vertex => self.vertex_constants = Some(buffer),
            ShaderStage::Pixel => self.pixel_constants = Some(buffer),
        }
    }

    /// Resolves the current state into a draw call.
    ///
    /// `layout` must be the elements of the bound input layout.
    pub fn resolve_draw(&self, layout: &[InputElement], count: u32) -> Result<DrawCall, GraphicsError> {
        let vertex_shader = self.vertex_shader.ok_or_else(|| missing("vertex shader"))?;
        let pixel_shader = self.pixel_shader.ok_or_else(|| missing("pixel shader"))?;
        let input_layout = self.input_layout.ok_or_else(|| missing("input layout"))?;
        let topology = self.topology.ok_or_else(|| missing("primitive topology"))?;
        let (index_buffer, index_format) = self.index_buffer.ok_or_else(|| missing("index buffer"))?;

        let mut strides = [0; MAX_VERTEX_SLOTS];
        let mut vertex_buffers = [None; MAX_VERTEX_SLOTS];
        for element in layout {
            let slot = element.input_slot as usize;
            let binding = self
                .vertex_buffers
                .get(slot)
                .copied()
                .flatten()
                .ok_or_else(|| {
                    GraphicsError::resource(
                        ErrorCode::InvalidCall,
                        format!(
                            "Input element {}{} reads vertex slot {} but no vertex buffer is bound there",
                            element.semantic, element.semantic_index, slot
                        ),
                    )
                })?;
            let end = element.offset + element.format.size();
            if end > binding.stride {
                return Err(GraphicsError::resource(
                    ErrorCode::InvalidCall,
                    format!(
                        "Input element {}{} ends at byte {} but vertex slot {} has a stride of {}",
                        element.semantic, element.semantic_index, end, slot, binding.stride
                    ),
                ));
            }
            strides[slot] = binding.stride;
            vertex_buffers[slot] = Some(binding.buffer);
        }

        Ok(DrawCall {
            key: PipelineKey {
                vertex_shader,
                pixel_shader,
                input_layout,
                topology,
                index_format,
                strides,
                vertex_constants: self.vertex_constants.is_some(),
                pixel_constants: self.pixel_constants.is_some(),
            },
            vertex_buffers,
            index_buffer,
            vertex_constants: self.vertex_constants,
            pixel_constants: self.pixel_constants,
            count,
        })
    }
}

fn missing(what: &str) -> GraphicsError {
    GraphicsError::resource(
        ErrorCode::InvalidCall,
        format!("draw_indexed called without a bound {what}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::context::ElementFormat;

    const LAYOUT: [InputElement; 1] = [InputElement::per_vertex("Position", ElementFormat::Float32x3, 0)];

    fn complete_state() -> BoundState {
        let mut state = BoundState::default();
        state.set_vertex_buffer(0, BufferId(0), 12);
        state.index_buffer = Some((BufferId(1), IndexFormat::Uint16));
        state.set_shader(ShaderStage::Vertex, ShaderId(0));
        state.set_shader(ShaderStage::Pixel, ShaderId(1));
        state.input_layout = Some(InputLayoutId(0));
        state.topology = Some(PrimitiveTopology::TriangleList);
        state
    }

    #[test]
    fn resolves_complete_state() {
        let mut state = complete_state();
        state.set_constant_buffer(ShaderStage::Vertex, BufferId(2));

        let draw = state.resolve_draw(&LAYOUT, 36).unwrap();
        assert_eq!(draw.count, 36);
        assert_eq!(draw.key.strides, [12, 0, 0, 0]);
        assert!(draw.key.vertex_constants);
        assert!(!draw.key.pixel_constants);
        assert_eq!(draw.vertex_constants, Some(BufferId(2)));
    }

    #[test]
    fn missing_shader_is_an_invalid_call() {
        let mut state = complete_state();
        state.pixel_shader = None;

        let error = state.resolve_draw(&LAYOUT, 36).unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::InvalidCall));
    }

    #[test]
    fn layout_slot_without_buffer_is_rejected() {
        let mut state = complete_state();
        state.vertex_buffers[0] = None;

        assert!(state.resolve_draw(&LAYOUT, 36).is_err());
    }

    #[test]
    fn element_past_the_stride_is_rejected() {
        let mut state = complete_state();
        state.set_vertex_buffer(0, BufferId(0), 8);

        let error = state.resolve_draw(&LAYOUT, 36).unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::InvalidCall));
        assert!(error.to_string().contains("ends at byte 12"));
    }

    #[test]
    fn unused_slots_do_not_change_the_key() {
        let state = complete_state();
        let mut with_extra = complete_state();
        with_extra.set_vertex_buffer(1, BufferId(7), 64);

        assert_eq!(
            state.resolve_draw(&LAYOUT, 3).unwrap().key,
            with_extra.resolve_draw(&LAYOUT, 3).unwrap().key
        );
    }
}
