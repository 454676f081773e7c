//! A simple 2D mesh renderer.
//!
//! Draws a list of scene draw items (`scene::DrawItem2D`) with one solid-color
//! pipeline.
//!
//! - Items are sorted by `z` and baked on the CPU: each vertex is transformed by its
//!   item's `world_from_local` and tagged with the item's fill color.
//! - All items share one vertex buffer, one index buffer (u32) and one draw call.
//! - The uniform holds only `clip_from_px`, the orthographic projection of the
//!   logical display, written once per frame.
//! - No depth buffer; painter's order is the sorted item order.

use std::{borrow::Cow, mem};

use glam::Mat4;

use crate::render::gpu::Gpu;
use crate::scene::DrawItem2D;
use crate::ui::geometry::Size;

fn round_up_to(v: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (v + (align - 1)) & !(align - 1)
}

/// GPU vertex format: display-pixel position plus straight RGBA.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex2D {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex2D {
    pub const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    #[inline]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex2D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct SolidUniforms {
    clip_from_px: [[f32; 4]; 4],
}

/// Projection from y-down display pixels to clip space.
pub fn clip_from_px(display: Size) -> Mat4 {
    Mat4::orthographic_rh(
        0.0,
        display.width.max(1) as f32,
        display.height.max(1) as f32,
        0.0,
        -1.0,
        1.0,
    )
}

/// Flatten `items` into one vertex/index list in painter's order.
pub fn batch_items(items: &[DrawItem2D]) -> (Vec<Vertex2D>, Vec<u32>) {
    let mut order: Vec<&DrawItem2D> = items.iter().filter(|i| !i.mesh.is_empty()).collect();
    order.sort_by_key(|i| i.z);

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for item in order {
        let base = vertices.len() as u32;
        let color = item.fill.to_array();
        vertices.extend(item.mesh.positions.iter().map(|&[x, y]| {
            let (px, py) = item.world_from_local.transform_point(x, y);
            Vertex2D {
                position: [px, py],
                color,
            }
        }));
        indices.extend(item.mesh.indices.iter().map(|&i| base + u32::from(i)));
    }
    (vertices, indices)
}

/// Solid-color renderer for baked 2D meshes.
pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    // Reusable GPU buffers; resized on demand.
    vertex_buffer: wgpu::Buffer,
    vertex_capacity_bytes: u64,

    index_buffer: wgpu::Buffer,
    index_capacity_bytes: u64,
}

impl MeshRenderer {
    /// Create the renderer, targeting the SRGB view of the surface format.
    pub fn new(gpu: &Gpu) -> anyhow::Result<Self> {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("MeshRenderer Solid Shader"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                    "shaders/solid_mesh.wgsl"
                ))),
            });

        let uniform_size = mem::size_of::<SolidUniforms>() as u64;
        let uniform_bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("MeshRenderer Uniform BGL"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(uniform_size),
                        },
                        count: None,
                    }],
                });

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("MeshRenderer Uniform Buffer"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MeshRenderer Uniform BG"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("MeshRenderer Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("MeshRenderer Solid Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex2D::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.surface_format.add_srgb_suffix(),
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    // Negative em-heights mirror glyphs, flipping winding.
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        let initial_vb = 4096u64;
        let initial_ib = 4096u64;

        let vertex_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("MeshRenderer Vertex Buffer"),
            size: initial_vb,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("MeshRenderer Index Buffer"),
            size: initial_ib,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            vertex_capacity_bytes: initial_vb,
            index_buffer,
            index_capacity_bytes: initial_ib,
        })
    }

    /// Ensure the internal vertex/index buffers can hold at least `vb_bytes` / `ib_bytes`.
    fn ensure_capacity(&mut self, gpu: &Gpu, vb_bytes: u64, ib_bytes: u64) {
        if vb_bytes > self.vertex_capacity_bytes {
            let new_size = vb_bytes.next_power_of_two().max(4096);
            log::debug!("mesh renderer: vertex buffer -> {} bytes", new_size);
            self.vertex_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("MeshRenderer Vertex Buffer (resized)"),
                size: new_size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.vertex_capacity_bytes = new_size;
        }

        if ib_bytes > self.index_capacity_bytes {
            let new_size = ib_bytes.next_power_of_two().max(4096);
            log::debug!("mesh renderer: index buffer -> {} bytes", new_size);
            self.index_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("MeshRenderer Index Buffer (resized)"),
                size: new_size,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.index_capacity_bytes = new_size;
        }
    }

    /// `write_buffer` lengths must be multiples of COPY_BUFFER_ALIGNMENT; pad the tail.
    fn upload(gpu: &Gpu, buffer: &wgpu::Buffer, raw: &[u8]) {
        let len = raw.len() as u64;
        let padded_len = round_up_to(len, wgpu::COPY_BUFFER_ALIGNMENT);
        if padded_len == len {
            gpu.queue.write_buffer(buffer, 0, raw);
        } else {
            let mut padded = Vec::<u8>::with_capacity(padded_len as usize);
            padded.extend_from_slice(raw);
            padded.resize(padded_len as usize, 0);
            gpu.queue.write_buffer(buffer, 0, &padded);
        }
    }

    /// Draw all items into the provided render pass.
    ///
    /// The caller creates the pass and clears the background. Item vertices are in
    /// display pixels after `world_from_local`; `display` is the logical display
    /// size mapped onto the whole surface.
    pub fn draw_items(
        &mut self,
        gpu: &Gpu,
        pass: &mut wgpu::RenderPass<'_>,
        display: Size,
        items: &[DrawItem2D],
    ) -> anyhow::Result<()> {
        let (vertices, indices) = batch_items(items);
        if vertices.is_empty() || indices.is_empty() {
            return Ok(());
        }

        let vb_bytes = (vertices.len() * mem::size_of::<Vertex2D>()) as u64;
        let ib_bytes = (indices.len() * mem::size_of::<u32>()) as u64;
        self.ensure_capacity(
            gpu,
            round_up_to(vb_bytes, wgpu::COPY_BUFFER_ALIGNMENT),
            round_up_to(ib_bytes, wgpu::COPY_BUFFER_ALIGNMENT),
        );

        Self::upload(gpu, &self.vertex_buffer, bytemuck::cast_slice(&vertices));
        Self::upload(gpu, &self.index_buffer, bytemuck::cast_slice(&indices));

        let uniforms = SolidUniforms {
            clip_from_px: clip_from_px(display).to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..vb_bytes));
        pass.set_index_buffer(self.index_buffer.slice(..ib_bytes), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..(indices.len() as u32), 0, 0..1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Affine2, Mesh2D, Rgba};
    use glam::Vec4;

    fn item(z: i32, fill: Rgba, xf: Affine2) -> DrawItem2D {
        DrawItem2D {
            mesh: Mesh2D::rect(0.0, 0.0, 1.0, 1.0),
            fill,
            world_from_local: xf,
            z,
        }
    }

    #[test]
    fn batching_sorts_by_z_and_offsets_indices() {
        let items = vec![
            item(1, Rgba::BLACK, Affine2::translate(10.0, 0.0)),
            item(0, Rgba::WHITE, Affine2::IDENTITY),
        ];
        let (vertices, indices) = batch_items(&items);
        assert_eq!(vertices.len(), 8);
        assert_eq!(vertices[0].color, Rgba::WHITE.to_array());
        assert_eq!(vertices[4].color, Rgba::BLACK.to_array());
        assert_eq!(vertices[4].position, [10.0, 0.0]);
        assert_eq!(&indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn empty_meshes_are_dropped() {
        let mut empty = item(0, Rgba::BLACK, Affine2::IDENTITY);
        empty.mesh = Mesh2D::default();
        let (vertices, indices) = batch_items(&[empty]);
        assert!(vertices.is_empty());
        assert!(indices.is_empty());
    }

    #[test]
    fn projection_maps_display_corners_to_clip_corners() {
        let m = clip_from_px(Size::new(144, 168));
        let top_left = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = m * Vec4::new(144.0, 168.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-6 && (top_left.y - 1.0).abs() < 1e-6);
        assert!((bottom_right.x - 1.0).abs() < 1e-6 && (bottom_right.y + 1.0).abs() < 1e-6);
    }
}
