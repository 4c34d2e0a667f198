use crate::rendering::{
    bindable::{Bindable, BindableKind},
    context::{GraphicsContext, InputElement, InputLayoutId},
    drawable::Drawable,
    error::GraphicsError,
};

pub struct InputLayout {
    layout: InputLayoutId,
}

impl InputLayout {
    /// `vertex_bytecode` comes from the `VertexShader` this layout will be used with.
    pub fn new(
        gfx: &mut dyn GraphicsContext,
        elements: &[InputElement],
        vertex_bytecode: &[u8],
    ) -> Result<Self, GraphicsError> {
        let layout = gfx.create_input_layout(elements, vertex_bytecode)?;
        Ok(Self { layout })
    }
}

impl Bindable for InputLayout {
    fn bind(&self, gfx: &mut dyn GraphicsContext, _owner: &dyn Drawable) {
        gfx.set_input_layout(self.layout);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::InputLayout
    }
}
