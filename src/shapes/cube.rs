use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rand::Rng;

use crate::{
    rendering::{
        bindable::{
            IndexBuffer, InputLayout, PixelConstantBuffer, PixelShader, Topology, TransformCbuf,
            VertexBuffer, VertexShader,
        },
        bindable_cache::BindableCache,
        context::{ElementFormat, GraphicsContext, InputElement, PrimitiveTopology},
        drawable::{Drawable, DrawableBinds},
        error::GraphicsError,
    },
    shapes::{
        orbit::{MotionDistributions, OrbitMotion},
        SHADER_FOLDER,
    },
};

const VERTEX_SHADER: &str = "cube_vs.wgsl";
const PIXEL_SHADER: &str = "cube_ps.wgsl";

#[rustfmt::skip]
const CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new( 1.0, -1.0, -1.0),
    Vec3::new(-1.0,  1.0, -1.0),
    Vec3::new( 1.0,  1.0, -1.0),
    Vec3::new(-1.0, -1.0,  1.0),
    Vec3::new( 1.0, -1.0,  1.0),
    Vec3::new(-1.0,  1.0,  1.0),
    Vec3::new( 1.0,  1.0,  1.0),
];

// Two clockwise triangles per face, faces in the same order as FACE_COLORS.
#[rustfmt::skip]
const INDICES: [u16; 36] = [
    0, 2, 1,  2, 3, 1,
    1, 3, 5,  3, 7, 5,
    2, 6, 3,  3, 6, 7,
    4, 5, 7,  4, 7, 6,
    0, 4, 2,  2, 4, 6,
    0, 1, 4,  1, 5, 4,
];

const LAYOUT: [InputElement; 1] = [InputElement::per_vertex("Position", ElementFormat::Float32x3, 0)];

/// This should match the `FaceColors` uniform in `cube_ps.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FaceColors {
    pub colors: [[f32; 4]; 6],
}

pub const FACE_COLORS: FaceColors = FaceColors {
    colors: [
        [1.0, 0.0, 1.0, 1.0],
        [1.0, 0.0, 0.0, 1.0],
        [0.0, 1.0, 0.0, 1.0],
        [0.0, 0.0, 1.0, 1.0],
        [1.0, 1.0, 0.0, 1.0],
        [0.0, 1.0, 1.0, 1.0],
    ],
};

/// A solid-coloured cube tumbling around an orbit.
///
/// All cubes share one vertex buffer, index buffer, shader pair, colour buffer,
/// input layout and topology. Each cube owns only its transform buffer.
pub struct Cube {
    binds: DrawableBinds,
    motion: OrbitMotion,
}

impl Cube {
    pub fn new<R: Rng + ?Sized>(
        gfx: &mut dyn GraphicsContext,
        cache: &mut BindableCache,
        rng: &mut R,
        dists: &MotionDistributions,
    ) -> Result<Self, GraphicsError> {
        let motion = OrbitMotion::sample(rng, dists);

        let statics = cache.get_or_try_init::<Cube, _>(|builder| {
            let shaders = Path::new(SHADER_FOLDER);

            builder.add_static_bind(VertexBuffer::new(gfx, "Cube vertices", &CORNERS)?);

            let vertex_shader = VertexShader::new(gfx, shaders.join(VERTEX_SHADER))?;
            let vertex_bytecode = vertex_shader.bytecode();
            builder.add_static_bind(vertex_shader);
            builder.add_static_bind(PixelShader::new(gfx, shaders.join(PIXEL_SHADER))?);

            builder.add_index_buffer(IndexBuffer::new(gfx, "Cube indices", &INDICES)?);

            builder.add_static_bind(PixelConstantBuffer::new(gfx, "Cube face colors", &FACE_COLORS)?);
            builder.add_static_bind(InputLayout::new(gfx, &LAYOUT, &vertex_bytecode)?);
            builder.add_static_bind(Topology::new(PrimitiveTopology::TriangleList));
            Ok(())
        })?;

        let mut binds = DrawableBinds::new(statics);
        binds.add_bind(TransformCbuf::new(gfx)?);

        Ok(Self { binds, motion })
    }

}

impl Drawable for Cube {
    fn transform(&self) -> Mat4 {
        self.motion.transform()
    }

    fn update(&mut self, dt: f32) {
        self.motion.advance(dt);
    }

    fn binds(&self) -> &DrawableBinds {
        &self.binds
    }
}
