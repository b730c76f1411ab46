use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::device::{GpuContext, SurfaceBinding};
use crate::scene::{QuadInstance, SceneSnapshot};

use super::{FrameStatus, SkipReason};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Renders one scene snapshot per call and presents it.
///
/// GPU resources are created lazily and rebuilt when the surface format
/// changes; `reset` drops everything so a closed surface does not keep the
/// device alive through cached pipelines.
///
/// All methods must be called from the rendering thread.
#[derive(Default)]
pub struct FrameExecutor {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    frame_ubo: Option<wgpu::Buffer>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    depth_view: Option<wgpu::TextureView>,
    depth_size: (u32, u32),
}

impl FrameExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `scene` into the binding's current texture and presents it.
    ///
    /// Preconditions are checked, not assumed: an invalid binding yields
    /// `Skipped(SurfaceNotReady)` (expected during resize/backgrounding), a
    /// lost device yields `DeviceLost`. Nothing is presented unless the full
    /// frame was submitted.
    pub fn render_frame(
        &mut self,
        ctx: &GpuContext,
        binding: &mut SurfaceBinding,
        scene: &SceneSnapshot,
    ) -> FrameStatus {
        if ctx.is_lost() {
            return FrameStatus::DeviceLost;
        }
        if !binding.is_valid() {
            return FrameStatus::Skipped(SkipReason::SurfaceNotReady);
        }
        let Some(format) = binding.format() else {
            return FrameStatus::Skipped(SkipReason::SurfaceNotReady);
        };
        let Some(surface) = binding.surface() else {
            return FrameStatus::Skipped(SkipReason::SurfaceNotReady);
        };

        let surface_texture = match surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => return self.acquire_failed(ctx, binding, e),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.ensure_pipeline(ctx, format);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx);
        self.ensure_depth(ctx, binding.size());
        self.ensure_instance_capacity(ctx, scene.quads.len());

        self.write_frame_uniform(ctx, scene);
        if !scene.quads.is_empty() {
            let Some(instance_vbo) = self.instance_vbo.as_ref() else {
                return FrameStatus::Skipped(SkipReason::AllocationFailed);
            };
            ctx.queue()
                .write_buffer(instance_vbo, 0, bytemuck::cast_slice(&scene.quads));
        }

        let mut encoder = ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("courtside frame encoder"),
            });

        // Render pass — dropped before the encoder is finished.
        {
            let Some(depth_view) = self.depth_view.as_ref() else {
                return FrameStatus::Skipped(SkipReason::AllocationFailed);
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("courtside scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: scene.clear_color[0] as f64,
                            g: scene.clear_color[1] as f64,
                            b: scene.clear_color[2] as f64,
                            a: scene.clear_color[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if !scene.quads.is_empty() {
                let (Some(pipeline), Some(bind_group), Some(quad_vbo), Some(quad_ibo), Some(instance_vbo)) = (
                    self.pipeline.as_ref(),
                    self.bind_group.as_ref(),
                    self.quad_vbo.as_ref(),
                    self.quad_ibo.as_ref(),
                    self.instance_vbo.as_ref(),
                ) else {
                    return FrameStatus::Skipped(SkipReason::AllocationFailed);
                };

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, bind_group, &[]);
                rpass.set_vertex_buffer(0, quad_vbo.slice(..));
                rpass.set_vertex_buffer(1, instance_vbo.slice(..));
                rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..6, 0, 0..scene.quads.len() as u32);
            }
        }

        ctx.queue().submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        FrameStatus::Presented
    }

    /// Drops all cached GPU resources.
    ///
    /// Must be called when the owning surface closes; cached pipelines and
    /// buffers hold device references that would otherwise outlive the
    /// context handle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn acquire_failed(
        &self,
        ctx: &GpuContext,
        binding: &SurfaceBinding,
        err: wgpu::SurfaceError,
    ) -> FrameStatus {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                binding.reconfigure(ctx);
                FrameStatus::Skipped(SkipReason::SurfaceOutdated)
            }
            wgpu::SurfaceError::Timeout => FrameStatus::Skipped(SkipReason::SurfaceNotReady),
            wgpu::SurfaceError::OutOfMemory => {
                log::error!("surface acquire out of memory; dropping frame");
                FrameStatus::Skipped(SkipReason::AllocationFailed)
            }
            wgpu::SurfaceError::Other => FrameStatus::Skipped(SkipReason::SurfaceNotReady),
        }
    }

    fn ensure_pipeline(&mut self, ctx: &GpuContext, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader_src = include_str!("shaders/quad.wgsl");
        let shader = ctx
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("courtside quad shader"),
                source: wgpu::ShaderSource::Wgsl(shader_src.into()),
            });

        let bind_group_layout =
            ctx.device()
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("courtside frame bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(frame_ubo_min_binding_size()),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout =
            ctx.device()
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("courtside quad pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("courtside quad pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[QuadVertex::layout(), instance_layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // Cards stay visible from behind while the camera orbits.
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            });

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.frame_ubo = None;
    }

    fn ensure_static_buffers(&mut self, ctx: &GpuContext) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device().create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("courtside quad vbo"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            },
        ));

        self.quad_ibo = Some(ctx.device().create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("courtside quad ibo"),
                contents: bytemuck::cast_slice(&QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            },
        ));
    }

    fn ensure_bindings(&mut self, ctx: &GpuContext) {
        if self.bind_group.is_some() && self.frame_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let frame_ubo = ctx.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("courtside frame ubo"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("courtside frame bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });

        self.frame_ubo = Some(frame_ubo);
        self.bind_group = Some(bind_group);
    }

    fn ensure_depth(&mut self, ctx: &GpuContext, size: (u32, u32)) {
        if self.depth_view.is_some() && self.depth_size == size {
            return;
        }

        let texture = ctx.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("courtside depth texture"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        self.depth_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.depth_size = size;
    }

    fn write_frame_uniform(&mut self, ctx: &GpuContext, scene: &SceneSnapshot) {
        let Some(ubo) = self.frame_ubo.as_ref() else { return };
        let u = FrameUniforms {
            view_projection: scene.view_projection.to_cols_array_2d(),
        };
        ctx.queue().write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }

    fn ensure_instance_capacity(&mut self, ctx: &GpuContext, required_instances: usize) {
        if required_instances <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required_instances.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<QuadInstance>()) as u64;

        self.instance_vbo = Some(ctx.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("courtside instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_projection: [[f32; 4]; 4],
}

/// Minimum binding size for the frame uniform buffer.
///
/// `FrameUniforms` is a single mat4 (64 bytes), so the size is non-zero by
/// construction.
fn frame_ubo_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<FrameUniforms>() as u64)
        .expect("FrameUniforms has non-zero size by construction")
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    corner: [f32; 2], // -1..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, -1.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [-1.0, 1.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

const INSTANCE_ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    1 => Float32x3, // center
    2 => Float32x3, // right (half extent)
    3 => Float32x3, // up (half extent)
    4 => Float32x4  // color
];

fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRS,
    }
}
