use crate::rendering::{
    bindable::{Bindable, BindableKind},
    context::{GraphicsContext, PrimitiveTopology},
    drawable::Drawable,
};

pub struct Topology {
    topology: PrimitiveTopology,
}

impl Topology {
    pub fn new(topology: PrimitiveTopology) -> Self {
        Self { topology }
    }
}

impl Bindable for Topology {
    fn bind(&self, gfx: &mut dyn GraphicsContext, _owner: &dyn Drawable) {
        gfx.set_topology(self.topology);
    }

    fn kind(&self) -> BindableKind {
        BindableKind::Topology
    }
}
