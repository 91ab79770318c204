//! WGPU-based rendering backend
//!
//! Executes a [`FramePlan`] in two render passes: depth from the light into
//! a fixed-size shadow map, then the shaded pass into the window surface.
//! Per-draw matrices and material terms live in one uniform buffer with a
//! slot per command, addressed by dynamic offset.

use std::{num::NonZeroU64, path::Path, sync::Arc};

use cgmath::{Matrix4, SquareMatrix};
use log::{debug, info, warn};

use super::gpu_mesh::{DrawGpuMesh, GpuMesh};
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::{MeshId, RenderBackend, TextureId};
use crate::error::{Error, Result};
use crate::gfx::camera::OPENGL_TO_WGPU_MATRIX;
use crate::gfx::geometry::{Mesh, Winding};
use crate::gfx::resources::texture_resource::MAX_TEXTURE_DIMENSION;
use crate::gfx::resources::{MaterialLibrary, TextureResource};
use crate::gfx::scene::{DrawCommand, FramePlan};

const SHADOW_PIPELINE: &str = "Shadow";
const SHADED_CCW_PIPELINE: &str = "Shaded CCW";
const SHADED_CW_PIPELINE: &str = "Shaded CW";

/// Frame-wide shading inputs. MUST match `Globals` in shaded.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalsUniform {
    pub eye: [f32; 4],
    pub light_position: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    pub light_specular: [f32; 4],
    pub global_ambient: [f32; 4],
}

impl GlobalsUniform {
    pub fn new(plan: &FramePlan) -> Self {
        let [ex, ey, ez]: [f32; 3] = plan.eye.into();
        let [lx, ly, lz] = plan.light.position_array();
        Self {
            eye: [ex, ey, ez, 1.0],
            light_position: [lx, ly, lz, 1.0],
            light_ambient: plan.light.ambient,
            light_diffuse: plan.light.diffuse,
            light_specular: plan.light.specular,
            global_ambient: plan.light.global_ambient,
        }
    }
}

/// Everything one draw binds. MUST match `Draw` in both shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    /// Model to wgpu clip space
    pub clip: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub shadow: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// shininess, lit, textured, shadowed
    pub params: [f32; 4],
}

impl DrawUniform {
    pub fn new(command: &DrawCommand, materials: &MaterialLibrary) -> Self {
        let matrices = &command.matrices;
        let material = materials.resolve(command.material);
        let flag = |on: bool| if on { 1.0 } else { 0.0 };

        Self {
            clip: (OPENGL_TO_WGPU_MATRIX * matrices.clip()).into(),
            model: matrices.model.into(),
            normal: matrices.normal.unwrap_or_else(Matrix4::identity).into(),
            shadow: matrices.shadow.unwrap_or_else(Matrix4::identity).into(),
            ambient: material.ambient,
            diffuse: material.diffuse,
            specular: material.specular,
            params: [
                material.shininess,
                flag(command.lit),
                flag(command.texture.is_some()),
                flag(matrices.shadow.is_some()),
            ],
        }
    }
}

struct GpuTexture {
    // kept alive for the bind group
    _resource: TextureResource,
    bind_group: wgpu::BindGroup,
}

/// wgpu implementation of [`RenderBackend`].
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    shadow_map: TextureResource,
    pub pipeline_manager: PipelineManager,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_stride: u64,
    draw_capacity: usize,

    texture_layout: wgpu::BindGroupLayout,
    white_texture: GpuTexture,
    textures: Vec<GpuTexture>,
    meshes: Vec<GpuMesh>,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`.
    ///
    /// `shadow_map_size` is clamped to the device's texture limit.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        shadow_map_size: u32,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| Error::Backend(format!("failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::Backend(format!("no suitable adapter: {}", e)))?;
        info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: MAX_TEXTURE_DIMENSION,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| Error::Backend(format!("failed to create device: {}", e)))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| Error::Backend("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let max_size = device.limits().max_texture_dimension_2d;
        if shadow_map_size > max_size {
            warn!(
                "Shadow map size {} exceeds device limit, using {}",
                shadow_map_size, max_size
            );
        }
        let shadow_map = TextureResource::create_shadow_map(&device, shadow_map_size.min(max_size));

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<GlobalsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
                },
            ],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let draw_stride = (std::mem::size_of::<DrawUniform>() as u64).div_ceil(alignment) * alignment;
        let draw_capacity = 16;
        let (draw_buffer, draw_bind_group) =
            Self::create_draw_slots(&device, &draw_layout, draw_stride, draw_capacity);

        let white_texture = Self::create_gpu_texture(
            &device,
            &texture_layout,
            TextureResource::create_white(&device, &queue),
        );

        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());

        pipeline_manager.load_shader("shadow", include_str!("shadow.wgsl"))?;
        pipeline_manager.load_shader("shaded", include_str!("shaded.wgsl"))?;

        // no culling in the depth pass, both faces cast shadows
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_depth_bias(wgpu::DepthBiasState {
                    constant: 4,
                    slope_scale: 2.0,
                    clamp: 0.0,
                })
                .with_bind_group_layouts(vec![draw_layout.clone()]),
        );

        for (name, front_face) in [
            (SHADED_CCW_PIPELINE, wgpu::FrontFace::Ccw),
            (SHADED_CW_PIPELINE, wgpu::FrontFace::Cw),
        ] {
            pipeline_manager.register_pipeline(
                name,
                PipelineConfig::default()
                    .with_label(name)
                    .with_shader("shaded")
                    .with_front_face(front_face)
                    .with_depth_format(TextureResource::DEPTH_FORMAT)
                    .with_color_targets(vec![Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })])
                    .with_bind_group_layouts(vec![
                        globals_layout.clone(),
                        draw_layout.clone(),
                        texture_layout.clone(),
                    ]),
            );
        }

        pipeline_manager.create_all_pipelines()?;

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            depth_texture,
            shadow_map,
            pipeline_manager,
            globals_buffer,
            globals_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_stride,
            draw_capacity,
            texture_layout,
            white_texture,
            textures: Vec::new(),
            meshes: Vec::new(),
        })
    }

    fn create_draw_slots(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn create_gpu_texture(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        resource: TextureResource,
    ) -> GpuTexture {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&resource.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&resource.sampler),
                },
            ],
        });

        GpuTexture {
            _resource: resource,
            bind_group,
        }
    }

    /// Grows the per-draw uniform buffer to hold at least `count` slots.
    fn ensure_draw_capacity(&mut self, count: usize) {
        if count <= self.draw_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        debug!("Growing draw uniform buffer to {} slots", capacity);
        let (buffer, bind_group) =
            Self::create_draw_slots(&self.device, &self.draw_layout, self.draw_stride, capacity);
        self.draw_buffer = buffer;
        self.draw_bind_group = bind_group;
        self.draw_capacity = capacity;
    }

    fn mesh(&self, id: MeshId) -> Result<&GpuMesh> {
        self.meshes
            .get(id.0)
            .ok_or_else(|| Error::Backend(format!("unknown mesh {}", id.0)))
    }

    fn texture_bind_group(&self, id: Option<TextureId>) -> Result<&wgpu::BindGroup> {
        match id {
            Some(id) => self
                .textures
                .get(id.0)
                .map(|texture| &texture.bind_group)
                .ok_or_else(|| Error::Backend(format!("unknown texture {}", id.0))),
            None => Ok(&self.white_texture.bind_group),
        }
    }

    fn pipeline(&self, name: &str) -> Result<&wgpu::RenderPipeline> {
        self.pipeline_manager
            .pipeline(name)
            .ok_or_else(|| Error::Backend(format!("pipeline '{}' was not created", name)))
    }

    /// Resizes the surface and recreates the depth buffer. Zero-sized
    /// requests (minimized windows) are ignored; the shadow map keeps its
    /// fixed resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Returns current surface dimensions
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

impl RenderBackend for RenderEngine {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshId> {
        mesh.validate()?;
        let id = MeshId(self.meshes.len());
        let label = format!("Mesh {}", id.0);
        self.meshes.push(GpuMesh::upload(&self.device, mesh, &label));
        debug!(
            "Uploaded mesh {} ({} vertices, {} draw elements)",
            id.0,
            mesh.vertex_count(),
            mesh.draw_count()
        );
        Ok(id)
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureId> {
        let resource = TextureResource::load(&self.device, &self.queue, path)?;
        self.textures.push(Self::create_gpu_texture(
            &self.device,
            &self.texture_layout,
            resource,
        ));
        Ok(TextureId(self.textures.len() - 1))
    }

    fn submit(&mut self, plan: &FramePlan, materials: &MaterialLibrary) -> Result<()> {
        for command in plan.commands() {
            self.mesh(command.mesh)?;
            self.texture_bind_group(command.texture)?;
        }

        self.ensure_draw_capacity(plan.len());
        let stride = self.draw_stride as usize;
        let mut slots = vec![0u8; plan.len() * stride];
        for (slot, command) in plan.commands().enumerate() {
            let uniform = DrawUniform::new(command, materials);
            let bytes = bytemuck::bytes_of(&uniform);
            slots[slot * stride..slot * stride + bytes.len()].copy_from_slice(bytes);
        }
        if !slots.is_empty() {
            self.queue.write_buffer(&self.draw_buffer, 0, &slots);
        }
        self.queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&GlobalsUniform::new(plan)),
        );

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => {
                return Err(Error::Backend(format!(
                    "failed to acquire surface texture: {}",
                    e
                )))
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let offset = |slot: usize| (slot as u64 * self.draw_stride) as u32;

        // PASS 1: depth from the light
        if !plan.shadow_pass.is_empty() {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_pipeline(self.pipeline(SHADOW_PIPELINE)?);
            for (slot, command) in plan.shadow_pass.iter().enumerate() {
                shadow_pass.set_bind_group(0, &self.draw_bind_group, &[offset(slot)]);
                shadow_pass.draw_gpu_mesh(self.mesh(command.mesh)?);
            }
        }

        // PASS 2: camera view
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);

            let mut bound: Option<Winding> = None;
            let first_slot = plan.shadow_pass.len();
            for (i, command) in plan.shaded_pass.iter().enumerate() {
                if bound != Some(command.winding) {
                    let name = match command.winding {
                        Winding::CounterClockwise => SHADED_CCW_PIPELINE,
                        Winding::Clockwise => SHADED_CW_PIPELINE,
                    };
                    render_pass.set_pipeline(self.pipeline(name)?);
                    bound = Some(command.winding);
                }
                render_pass.set_bind_group(1, &self.draw_bind_group, &[offset(first_slot + i)]);
                render_pass.set_bind_group(2, self.texture_bind_group(command.texture)?, &[]);
                render_pass.draw_gpu_mesh(self.mesh(command.mesh)?);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}
