use std::sync::Arc;

use glam::Mat4;

use crate::rendering::{
    bindable::{Bindable, BindableKind},
    bindable_cache::StaticBinds,
    context::GraphicsContext,
    error::GraphicsError,
};

/// One renderable instance.
///
/// Implementors own a `DrawableBinds` holding their type's shared pool and
/// their private bindables, and describe their own motion.
pub trait Drawable {
    /// Local-to-world transform. Must not depend on anything but the current state.
    fn transform(&self) -> Mat4;

    /// Advances the instance by `dt` seconds.
    fn update(&mut self, dt: f32);

    fn binds(&self) -> &DrawableBinds;
}

impl<'a> dyn Drawable + 'a {
    /// Binds the shared pool, then the instance bindables, then issues one indexed draw.
    pub fn draw(&self, gfx: &mut dyn GraphicsContext) -> Result<(), GraphicsError> {
        let binds = self.binds();

        for bind in binds.statics.binds() {
            bind.bind(gfx, self);
        }
        for bind in &binds.instance {
            bind.bind(gfx, self);
        }

        gfx.draw_indexed(binds.index_count())
    }
}

/// The bindables a drawable is drawn with.
pub struct DrawableBinds {
    statics: Arc<StaticBinds>,
    instance: Vec<Box<dyn Bindable>>,
}

impl DrawableBinds {
    pub fn new(statics: Arc<StaticBinds>) -> Self {
        Self {
            statics,
            instance: Vec::new(),
        }
    }

    /// Adds a bindable owned by this instance alone.
    pub fn add_bind(&mut self, bind: impl Bindable + 'static) {
        debug_assert!(
            bind.kind() != BindableKind::IndexBuffer,
            "A drawable takes its index buffer from its static binds"
        );
        self.instance.push(Box::new(bind));
    }

    pub fn index_count(&self) -> u32 {
        self.statics.index_count()
    }
}

#[cfg(test)]
impl DrawableBinds {
    pub fn statics(&self) -> &Arc<StaticBinds> {
        &self.statics
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::rendering::{
        bindable::{
            transform_cbuf::TransformData, IndexBuffer, InputLayout, PixelShader, Topology,
            TransformCbuf, VertexBuffer, VertexShader,
        },
        bindable_cache::BindableCache,
        context::{ElementFormat, InputElement, PrimitiveTopology, ShaderStage},
        headless::{Command, HeadlessContext},
    };

    const MARKER_VS: &str = r#"
        @vertex
        fn main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(position, 1.0);
        }
    "#;

    struct Marker {
        binds: DrawableBinds,
        position: Vec3,
    }

    impl Marker {
        fn new(
            gfx: &mut HeadlessContext,
            cache: &mut BindableCache,
            position: Vec3,
        ) -> Result<Self, GraphicsError> {
            let statics = cache.get_or_try_init::<Marker, _>(|builder| {
                builder.add_static_bind(VertexBuffer::new(gfx, "marker vertices", &[Vec3::ZERO; 3])?);
                let vs = VertexShader::from_bytecode(gfx, "vs", Arc::from(MARKER_VS.as_bytes()))?;
                let bytecode = vs.bytecode();
                builder.add_static_bind(vs);
                builder.add_static_bind(PixelShader::from_bytecode(gfx, "ps", b"ps")?);
                builder.add_index_buffer(IndexBuffer::new(gfx, "marker indices", &[0, 1, 2])?);
                builder.add_static_bind(InputLayout::new(
                    gfx,
                    &[InputElement::per_vertex("Position", ElementFormat::Float32x3, 0)],
                    &bytecode,
                )?);
                builder.add_static_bind(Topology::new(PrimitiveTopology::TriangleList));
                Ok(())
            })?;

            let mut binds = DrawableBinds::new(statics);
            binds.add_bind(TransformCbuf::new(gfx)?);
            Ok(Self { binds, position })
        }
    }

    impl Drawable for Marker {
        fn transform(&self) -> Mat4 {
            Mat4::from_translation(self.position)
        }

        fn update(&mut self, dt: f32) {
            self.position.x += dt;
        }

        fn binds(&self) -> &DrawableBinds {
            &self.binds
        }
    }

    fn uploaded_transform(gfx: &HeadlessContext) -> Mat4 {
        let vertex_cbuf = gfx
            .commands()
            .iter()
            .rev()
            .find_map(|command| match command {
                Command::SetConstantBuffer {
                    stage: ShaderStage::Vertex,
                    buffer,
                } => Some(*buffer),
                _ => None,
            })
            .expect("no vertex constant buffer bound");
        let data: TransformData = bytemuck::pod_read_unaligned(gfx.buffer_contents(vertex_cbuf));
        data.model_view_projection
    }

    #[test]
    fn draw_binds_statics_then_instance_then_draws() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();
        let marker = Marker::new(&mut gfx, &mut cache, Vec3::ONE).unwrap();

        (&marker as &dyn Drawable).draw(&mut gfx).unwrap();

        let commands = gfx.commands();
        assert!(matches!(commands[0], Command::SetVertexBuffer { slot: 0, stride: 12, .. }));
        assert!(matches!(commands[1], Command::SetShader { stage: ShaderStage::Vertex, .. }));
        assert!(matches!(commands[2], Command::SetShader { stage: ShaderStage::Pixel, .. }));
        assert!(matches!(commands[3], Command::SetIndexBuffer { .. }));
        assert!(matches!(commands[4], Command::SetInputLayout(_)));
        assert!(matches!(commands[5], Command::SetTopology(PrimitiveTopology::TriangleList)));
        assert!(matches!(commands[6], Command::WriteBuffer(_)));
        assert!(matches!(commands[7], Command::SetConstantBuffer { stage: ShaderStage::Vertex, .. }));
        assert_eq!(commands[8], Command::DrawIndexed { count: 3 });
        assert_eq!(commands.len(), 9);
    }

    #[test]
    fn instances_share_static_binds_and_own_transform_buffers() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();
        let first = Marker::new(&mut gfx, &mut cache, Vec3::ZERO).unwrap();
        let second = Marker::new(&mut gfx, &mut cache, Vec3::X).unwrap();

        assert!(Arc::ptr_eq(first.binds().statics(), second.binds().statics()));
        assert_eq!(first.binds().index_count(), second.binds().index_count());

        let counts = gfx.counts();
        assert_eq!(counts.vertex_buffers, 1);
        assert_eq!(counts.index_buffers, 1);
        assert_eq!(counts.vertex_shaders, 1);
        assert_eq!(counts.pixel_shaders, 1);
        assert_eq!(counts.input_layouts, 1);
        assert_eq!(counts.constant_buffers, 2);
    }

    #[test]
    fn transform_upload_follows_owner_and_projection() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();
        let mut marker = Marker::new(&mut gfx, &mut cache, Vec3::new(1.0, 2.0, 3.0)).unwrap();

        let projection = Mat4::perspective_lh(1.0, 4.0 / 3.0, 0.5, 40.0);
        gfx.set_projection(projection);
        (&marker as &dyn Drawable).draw(&mut gfx).unwrap();
        assert_eq!(uploaded_transform(&gfx), projection * marker.transform());

        let other_projection = Mat4::orthographic_lh(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);
        gfx.set_projection(other_projection);
        (&marker as &dyn Drawable).draw(&mut gfx).unwrap();
        assert_eq!(uploaded_transform(&gfx), other_projection * marker.transform());
        assert_ne!(projection * marker.transform(), other_projection * marker.transform());

        marker.update(1.0);
        (&marker as &dyn Drawable).draw(&mut gfx).unwrap();
        assert_eq!(
            uploaded_transform(&gfx),
            other_projection * Mat4::from_translation(Vec3::new(2.0, 2.0, 3.0))
        );
    }

    #[test]
    fn each_instance_owns_one_transform_buffer() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();
        let marker = Marker::new(&mut gfx, &mut cache, Vec3::ZERO).unwrap();

        let kinds: Vec<_> = marker
            .binds
            .instance
            .iter()
            .map(|bind| bind.kind())
            .collect();
        assert_eq!(kinds, vec![BindableKind::TransformConstantBuffer]);
        assert_eq!(marker.binds().statics().count_of(BindableKind::TransformConstantBuffer), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "static binds")]
    fn instance_index_buffer_is_rejected() {
        let mut gfx = HeadlessContext::new();
        let mut cache = BindableCache::new();
        let mut marker = Marker::new(&mut gfx, &mut cache, Vec3::ZERO).unwrap();

        marker
            .binds
            .add_bind(IndexBuffer::new(&mut gfx, "extra", &[0, 1, 2]).unwrap());
    }
}
