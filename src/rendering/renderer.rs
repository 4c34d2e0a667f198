use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::Context;
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::rendering::{
    config::RenderConfig,
    context::{
        BufferDesc, BufferId, BufferKind, ElementFormat, GraphicsContext, IndexFormat, InputClass,
        InputElement, InputLayoutId, PrimitiveTopology, ShaderId, ShaderStage, MAX_VERTEX_SLOTS,
    },
    error::{ErrorCode, GraphicsError},
    pipeline_state::{BoundState, DrawCall, PipelineKey},
    render_common::{present_mode, RenderCommon},
    shader_source::ShaderSource,
    texture::DepthTexture,
};

struct GpuBuffer {
    buffer: wgpu::Buffer,
    // Only constant buffers get one.
    bind_group: Option<wgpu::BindGroup>,
}

struct GpuShader {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
    entry_point: String,
}

/// Everything recorded since the last present.
#[derive(Default)]
struct Frame {
    clear_color: Option<wgpu::Color>,
    clear_depth: bool,
    draws: Vec<DrawCall>,
}

/// `GraphicsContext` on top of wgpu.
///
/// State setters and draws are recorded, then replayed in a single forward pass
/// when the frame is presented. Constant buffer writes go through the queue, so
/// every draw of a frame sees the last value written to a buffer in that frame.
pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: RenderCommon,
    depth_texture: DepthTexture,

    buffers: Vec<GpuBuffer>,
    shaders: Vec<GpuShader>,
    layouts: Vec<Vec<InputElement>>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    state: BoundState,
    frame: Frame,
    projection: Mat4,
    sync_interval: u32,
    device_lost: Arc<Mutex<Option<String>>>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, config: &RenderConfig) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let info = adapter.get_info();
        log::info!("Using {} ({:?})", info.name, info.backend);

        // The face colour shader picks its colour by primitive index.
        let mut required_features = wgpu::Features::empty();
        if adapter.features().contains(wgpu::Features::SHADER_PRIMITIVE_INDEX) {
            required_features |= wgpu::Features::SHADER_PRIMITIVE_INDEX;
        } else {
            log::warn!("Adapter does not support primitive_index in shaders");
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features,
                required_limits: wgpu::Limits::default(),
                label: Some("Boxfield device"),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let device_lost = Arc::new(Mutex::new(None));
        let lost = device_lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::error!("Device lost ({:?}): {}", reason, message);
            if let Ok(mut slot) = lost.lock() {
                *slot = Some(format!("{reason:?}: {message}"));
            }
        });
        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            log::error!("Uncaptured graphics error: {}", error);
        }));

        let common = RenderCommon::new(&device, &adapter, &surface, size, config.sync_interval)?;
        let depth_texture = DepthTexture::new(&device, &common.output_surface_config, "Depth Texture");

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            buffers: Vec::new(),
            shaders: Vec::new(),
            layouts: Vec::new(),
            pipelines: HashMap::new(),
            state: BoundState::default(),
            frame: Frame::default(),
            projection: Mat4::IDENTITY,
            sync_interval: config.sync_interval,
            device_lost,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            let config = &mut self.common.output_surface_config;
            config.width = new_size.width;
            config.height = new_size.height;
            self.surface.configure(&self.device, config);
            self.depth_texture.resize(&self.device, config);
        }
    }

    /// Runs `run` with error scopes open and returns whatever they caught with its result.
    fn capture<T>(&self, run: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = run();

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        (value, validation.or(out_of_memory))
    }

    fn scoped<T>(&self, what: &str, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, GraphicsError> {
        match self.capture(|| create(&self.device)) {
            (_, Some(error)) => Err(scope_error(format!("{what} creation failed"), error)),
            (value, None) => Ok(value),
        }
    }

    fn create_pipeline(&self, key: &PipelineKey) -> Result<wgpu::RenderPipeline, GraphicsError> {
        let vs = &self.shaders[key.vertex_shader.0 as usize];
        let ps = &self.shaders[key.pixel_shader.0 as usize];
        let elements = &self.layouts[key.input_layout.0 as usize];

        // Attribute n is shader location n, grouped by the slot it reads from.
        let slot_count = elements
            .iter()
            .map(|element| element.input_slot as usize + 1)
            .max()
            .unwrap_or(0);
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = (0..slot_count)
            .map(|slot| {
                elements
                    .iter()
                    .enumerate()
                    .filter(|(_, element)| element.input_slot as usize == slot)
                    .map(|(location, element)| wgpu::VertexAttribute {
                        format: vertex_format(element.format),
                        offset: element.offset as u64,
                        shader_location: location as u32,
                    })
                    .collect()
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = attributes
            .iter()
            .enumerate()
            .map(|(slot, attributes)| {
                let per_instance = elements
                    .iter()
                    .any(|e| e.input_slot as usize == slot && e.class == InputClass::PerInstance);
                wgpu::VertexBufferLayout {
                    array_stride: key.strides[slot] as u64,
                    step_mode: if per_instance {
                        wgpu::VertexStepMode::Instance
                    } else {
                        wgpu::VertexStepMode::Vertex
                    },
                    attributes,
                }
            })
            .collect();

        let mut bind_group_layouts = Vec::new();
        if key.vertex_constants {
            bind_group_layouts.push(&self.common.constants_layout);
        } else if key.pixel_constants {
            bind_group_layouts.push(&self.common.empty_layout);
        }
        if key.pixel_constants {
            bind_group_layouts.push(&self.common.constants_layout);
        }

        let pipeline = self.scoped("Render pipeline", |device| {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Drawable pipeline layout"),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Drawable pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &vs.module,
                    entry_point: Some(vs.entry_point.as_str()),
                    buffers: &buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &ps.module,
                    entry_point: Some(ps.entry_point.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.common.output_surface_config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: primitive_topology(key.topology),
                    front_face: wgpu::FrontFace::Cw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthTexture::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        log::debug!("Created render pipeline for {:?}", key);
        Ok(pipeline)
    }

    fn replay(&self, render_pass: &mut wgpu::RenderPass<'_>, draw: &DrawCall) {
        let Some(pipeline) = self.pipelines.get(&draw.key) else {
            return;
        };
        render_pass.set_pipeline(pipeline);

        if let Some(group) = draw.vertex_constants.and_then(|id| self.constants_group(id)) {
            render_pass.set_bind_group(0, group, &[]);
        } else if draw.pixel_constants.is_some() {
            render_pass.set_bind_group(0, &self.common.empty_group, &[]);
        }
        if let Some(group) = draw.pixel_constants.and_then(|id| self.constants_group(id)) {
            render_pass.set_bind_group(1, group, &[]);
        }

        for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
            if let Some(buffer) = buffer {
                render_pass.set_vertex_buffer(slot as u32, self.buffers[buffer.0 as usize].buffer.slice(..));
            }
        }
        render_pass.set_index_buffer(
            self.buffers[draw.index_buffer.0 as usize].buffer.slice(..),
            index_format(draw.key.index_format),
        );
        render_pass.draw_indexed(0..draw.count, 0, 0..1);
    }

    fn submit_frame(&self, frame: &Frame, view: &wgpu::TextureView) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: frame.clear_color.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth_texture.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: if frame.clear_depth {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for draw in &frame.draws {
                self.replay(&mut render_pass, draw);
            }
        }

        self.queue.submit([encoder.finish()]);
    }

    fn constants_group(&self, buffer: BufferId) -> Option<&wgpu::BindGroup> {
        self.buffers[buffer.0 as usize].bind_group.as_ref()
    }
}

impl GraphicsContext for Renderer {
    fn create_buffer(
        &mut self,
        desc: &BufferDesc<'_>,
        contents: Option<&[u8]>,
    ) -> Result<BufferId, GraphicsError> {
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
        }

        let usage = match desc.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Constant => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };

        let buffer = self.scoped(desc.label, |device| match contents {
            Some(contents) => device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents,
                usage,
            }),
            None => device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size: desc.size,
                usage,
                mapped_at_creation: false,
            }),
        })?;

        let bind_group = (desc.kind == BufferKind::Constant)
            .then(|| self.common.constants_bind_group(&self.device, &buffer));

        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(GpuBuffer { buffer, bind_group });
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]) {
        self.queue
            .write_buffer(&self.buffers[buffer.0 as usize].buffer, 0, data);
    }

    fn create_shader(
        &mut self,
        stage: ShaderStage,
        label: &str,
        bytecode: &[u8],
    ) -> Result<ShaderId, GraphicsError> {
        let source = ShaderSource::parse(label, bytecode)?;
        let entry_point = source
            .entry_point(stage)
            .ok_or_else(|| {
                GraphicsError::resource(
                    ErrorCode::Validation,
                    format!("{label}: no {stage:?} entry point"),
                )
            })?
            .to_string();

        let module = self.scoped(label, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.text.into()),
            })
        })?;

        let id = ShaderId(self.shaders.len() as u32);
        self.shaders.push(GpuShader {
            stage,
            module,
            entry_point,
        });
        Ok(id)
    }

    fn create_input_layout(
        &mut self,
        elements: &[InputElement],
        vertex_bytecode: &[u8],
    ) -> Result<InputLayoutId, GraphicsError> {
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

        let id = InputLayoutId(self.layouts.len() as u32);
        self.layouts.push(elements.to_vec());
        Ok(id)
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, stride: u32) {
        self.state.set_vertex_buffer(slot, buffer, stride);
    }

    fn set_index_buffer(&mut self, buffer: BufferId, format: IndexFormat) {
        self.state.index_buffer = Some((buffer, format));
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: ShaderId) {
        debug_assert_eq!(self.shaders[shader.0 as usize].stage, stage, "Shader bound to the wrong stage");
        self.state.set_shader(stage, shader);
    }

    fn set_constant_buffer(&mut self, stage: ShaderStage, buffer: BufferId) {
        self.state.set_constant_buffer(stage, buffer);
    }

    fn set_input_layout(&mut self, layout: InputLayoutId) {
        self.state.input_layout = Some(layout);
    }

    fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.state.topology = Some(topology);
    }

    fn draw_indexed(&mut self, count: u32) -> Result<(), GraphicsError> {
        let layout = self
            .state
            .input_layout
            .map(|id| self.layouts[id.0 as usize].as_slice())
            .unwrap_or_default();
        let draw = self.state.resolve_draw(layout, count)?;

        if !self.pipelines.contains_key(&draw.key) {
            let pipeline = self.create_pipeline(&draw.key)?;
            self.pipelines.insert(draw.key, pipeline);
        }

        self.frame.draws.push(draw);
        Ok(())
    }

    fn clear_render_target(&mut self, color: [f32; 4]) {
        self.frame.clear_color = Some(wgpu::Color {
            r: color[0] as f64,
            g: color[1] as f64,
            b: color[2] as f64,
            a: color[3] as f64,
        });
    }

    fn clear_depth_stencil(&mut self) {
        self.frame.clear_depth = true;
    }

    fn present(&mut self, sync_interval: u32) -> Result<(), GraphicsError> {
        let frame = std::mem::take(&mut self.frame);

        if let Some(reason) = self.device_lost.lock().ok().and_then(|lost| lost.clone()) {
            return Err(GraphicsError::DeviceRemoved { reason });
        }

        if sync_interval != self.sync_interval {
            self.sync_interval = sync_interval;
            self.common.output_surface_config.present_mode = present_mode(sync_interval);
            self.surface
                .configure(&self.device, &self.common.output_surface_config);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Encoding and validation errors surface here instead of in the uncaptured handler.
        let ((), error) = self.capture(|| self.submit_frame(&frame, &view));
        if let Some(error) = error {
            return Err(scope_error("Frame submission failed".to_string(), error));
        }

        output.present();
        Ok(())
    }

    fn projection(&self) -> Mat4 {
        self.projection
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }
}

/// Wraps an error caught by an error scope, keeping wgpu's message as extra info.
fn scope_error(description: String, error: wgpu::Error) -> GraphicsError {
    let detail = error.to_string();
    match GraphicsError::from(error) {
        GraphicsError::Resource { code, .. } => {
            GraphicsError::resource(code, description).with_info([detail])
        }
        other => other,
    }
}

fn vertex_format(format: ElementFormat) -> wgpu::VertexFormat {
    match format {
        ElementFormat::Float32 => wgpu::VertexFormat::Float32,
        ElementFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        ElementFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        ElementFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        ElementFormat::Uint32 => wgpu::VertexFormat::Uint32,
    }
}

fn index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
    }
}

fn primitive_topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
    }
}
