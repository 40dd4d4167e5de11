use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use minegame_common::ChunkCoord;
use minegame_render::{FOG_FAR, FOG_NEAR, SKY_COLOR, Scene, SceneBatch, SceneChange, SceneNode};
use wgpu::util::DeviceExt;

use crate::camera::FirstPersonCamera;
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    sky_color: [f32; 4],
    fog: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    translation: [f32; 3],
    extent: [f32; 3],
    base_color: [f32; 3],
    accent_color: [f32; 3],
}

/// GPU buffers for one chunk node: one instance buffer per material batch.
struct ChunkBuffers {
    batches: Vec<(wgpu::Buffer, u32)>,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x3,
        3 => Float32x3,
        4 => Float32x3,
        5 => Float32x3,
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Faces of the unit box as (normal, u, v) with `u x v == normal`, so corners
/// walked (-u,-v) (+u,-v) (+u,+v) (-u,+v) wind counter-clockwise from outside.
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
];

/// Unit box centred on the origin, four vertices per face for flat normals.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in CUBE_FACES {
        let first = vertices.len() as u16;
        vertices.extend(corners.iter().map(|&(su, sv)| Vertex {
            position: ((normal + u * su + v * sv) * 0.5).to_array(),
            normal: normal.to_array(),
        }));
        indices.extend([0, 1, 2, 2, 3, 0].map(|i| first + i));
    }
    (vertices, indices)
}

fn create_block_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("block_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("block_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::BLOCK_SHADER.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("block_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout(), InstanceData::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// sRGB channel in `0..=1` to linear, for sRGB render targets.
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_rgb(rgb: [f32; 3], surface_is_srgb: bool) -> [f32; 3] {
    if surface_is_srgb {
        rgb.map(srgb_to_linear)
    } else {
        rgb
    }
}

fn batch_instances(batch: &SceneBatch, surface_is_srgb: bool) -> Vec<InstanceData> {
    let material = &batch.material;
    let extent = material.extent.to_array();
    let base_color = linear_rgb(material.base_rgb(), surface_is_srgb);
    let accent_color = linear_rgb(material.accent_rgb(), surface_is_srgb);
    batch
        .translations
        .iter()
        .map(|t| InstanceData {
            translation: t.to_array(),
            extent,
            base_color,
            accent_color,
        })
        .collect()
}

/// wgpu-based world renderer.
pub struct WgpuRenderer {
    block_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    chunks: HashMap<ChunkCoord, ChunkBuffers>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        // Uniform buffer
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                camera_pos: [0.0; 4],
                sky_color: [0.0; 4],
                fog: [FOG_NEAR, FOG_FAR, 0.0, 0.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let block_pipeline = create_block_pipeline(device, &bind_group_layout, surface_format);

        // Shared cube mesh
        let (cube_verts, cube_indices) = cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_vertex_buffer"),
            contents: bytemuck::cast_slice(&cube_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let cube_index_count = cube_indices.len() as u32;

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            block_pipeline,
            uniform_buffer,
            uniform_bind_group,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count,
            chunks: HashMap::new(),
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Number of chunks with live GPU buffers.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Apply queued scene changes: upload attached nodes, drop detached ones.
    pub fn sync_scene(&mut self, device: &wgpu::Device, scene: &mut Scene) {
        let changes = scene.drain_changes();
        if changes.is_empty() {
            return;
        }
        let (mut uploaded, mut released) = (0usize, 0usize);
        for change in changes {
            match change {
                SceneChange::Attached(coord) => {
                    // a node attached and detached within one frame has no entry left
                    if let Some(node) = scene.node(coord) {
                        let buffers = self.upload_node(device, node);
                        self.chunks.insert(coord, buffers);
                        uploaded += 1;
                    }
                }
                SceneChange::Detached(coord) => {
                    if let Some(buffers) = self.chunks.remove(&coord) {
                        for (buffer, _) in &buffers.batches {
                            buffer.destroy();
                        }
                        released += 1;
                    }
                }
            }
        }
        tracing::debug!(uploaded, released, resident = self.chunks.len(), "scene synced to GPU");
    }

    fn upload_node(&self, device: &wgpu::Device, node: &SceneNode) -> ChunkBuffers {
        let srgb = self.surface_format.is_srgb();
        let batches = node
            .batches
            .iter()
            .filter(|b| !b.translations.is_empty())
            .map(|batch| {
                let instances = batch_instances(batch, srgb);
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(batch.material.name()),
                    contents: bytemuck::cast_slice(&instances),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                (buffer, instances.len() as u32)
            })
            .collect();
        ChunkBuffers { batches }
    }

    /// Render one frame: clear to sky, then every chunk batch.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &FirstPersonCamera,
    ) {
        let srgb = self.surface_format.is_srgb();
        let sky = linear_rgb(SKY_COLOR.map(|c| f32::from(c) / 255.0), srgb);
        let p = camera.position;
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                camera_pos: [p.x, p.y, p.z, 1.0],
                sky_color: [sky[0], sky[1], sky[2], 1.0],
                fog: [FOG_NEAR, FOG_FAR, 0.0, 0.0],
            }),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(sky[0]),
                            g: f64::from(sky[1]),
                            b: f64::from(sky[2]),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.block_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
            pass.set_index_buffer(self.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            for buffers in self.chunks.values() {
                for (buffer, count) in &buffers.batches {
                    pass.set_vertex_buffer(1, buffer.slice(..));
                    pass.draw_indexed(0..self.cube_index_count, 0, 0..*count);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
