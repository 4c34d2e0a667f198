use anyhow::Context;
use wgpu::SurfaceConfiguration;
use winit::dpi::PhysicalSize;

/// Surface configuration and the bind group layouts every pipeline is built from.
pub struct RenderCommon {
    pub output_surface_config: SurfaceConfiguration,
    /// One uniform buffer at binding 0, visible to both stages.
    pub constants_layout: wgpu::BindGroupLayout,
    /// Stands in for the vertex constants group when only the pixel stage has constants.
    pub empty_layout: wgpu::BindGroupLayout,
    pub empty_group: wgpu::BindGroup,
}

impl RenderCommon {
    pub fn new(
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        surface: &wgpu::Surface,
        size: PhysicalSize<u32>,
        sync_interval: u32,
    ) -> anyhow::Result<Self> {
        let (surface_format, alpha_mode) = surface_settings(&surface.get_capabilities(adapter))?;

        let output_surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(sync_interval),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(device, &output_surface_config);

        let constants_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Constant buffer bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let empty_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Empty bind group layout"),
            entries: &[],
        });

        let empty_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Empty bind group"),
            layout: &empty_layout,
            entries: &[],
        });

        Ok(Self {
            output_surface_config,
            constants_layout,
            empty_layout,
            empty_group,
        })
    }

    pub fn constants_bind_group(&self, device: &wgpu::Device, buffer: &wgpu::Buffer) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Constant buffer bind group"),
            layout: &self.constants_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

/// Picks the back buffer format and alpha mode.
///
/// Clear and face colours are authored for a UNORM back buffer, so a non-sRGB format wins.
fn surface_settings(
    caps: &wgpu::SurfaceCapabilities,
) -> anyhow::Result<(wgpu::TextureFormat, wgpu::CompositeAlphaMode)> {
    let format = match caps.formats.iter().find(|f| !f.is_srgb()) {
        Some(format) => *format,
        None => *caps
            .formats
            .first()
            .context("Surface supports no texture formats")?,
    };
    let alpha_mode = *caps
        .alpha_modes
        .first()
        .context("Surface supports no alpha modes")?;
    Ok((format, alpha_mode))
}

/// `0` presents immediately, anything else waits for vertical blank.
pub fn present_mode(sync_interval: u32) -> wgpu::PresentMode {
    if sync_interval == 0 {
        wgpu::PresentMode::AutoNoVsync
    } else {
        wgpu::PresentMode::AutoVsync
    }
}
