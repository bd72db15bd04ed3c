use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::device::{Gpu, DEPTH_FORMAT};

use super::program::ShaderProgram;

/// Projection/topology mode of a surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SurfaceMode {
    /// Point-field display: 2-component positions, point-list topology,
    /// identity projection.
    Flat,
    /// Perspective display: 3-component positions, triangle-list topology
    /// with quad indices expanded at upload.
    Spatial,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct TransformUniform {
    mvp: [[f32; 4]; 4],
}

/// Expands quad indices (4 per face) into triangle indices (6 per face).
///
/// The GPU has no quad topology; each face (a, b, c, d) becomes the two
/// triangles (a, b, c) and (a, c, d). A trailing partial quad is dropped.
pub fn expand_quad_indices(indices: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(indices.len() / 4 * 6);
    for quad in indices.chunks_exact(4) {
        out.extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
    }
    out
}

/// Geometry, shader program, and pipeline state for one surface.
///
/// Buffers are created on first upload and reused while the incoming data
/// fits; the pipeline is rebuilt lazily whenever the program, mode, or
/// surface format changes.
#[derive(Default)]
pub struct MeshRenderer {
    program: Option<ShaderProgram>,

    pipeline: Option<wgpu::RenderPipeline>,
    pipeline_key: Option<(wgpu::TextureFormat, SurfaceMode)>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    transform_ubo: Option<wgpu::Buffer>,

    position_vbo: Option<SlotBuffer>,
    color_vbo: Option<SlotBuffer>,
    depth_vbo: Option<SlotBuffer>,
    ibo: Option<SlotBuffer>,

    /// Element count of the last index upload, after any quad expansion.
    index_count: u32,
}

/// A reusable buffer plus its current byte capacity.
struct SlotBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a validated program and forces a pipeline rebuild.
    pub fn set_program(&mut self, program: ShaderProgram) {
        self.program = Some(program);
        self.pipeline = None;
        self.pipeline_key = None;
    }

    /// Forces a pipeline rebuild on the next draw (e.g. after a mode switch).
    pub fn invalidate_pipeline(&mut self) {
        self.pipeline = None;
        self.pipeline_key = None;
    }

    /// Number of index elements the next draw will issue.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Replaces the position buffer contents.
    ///
    /// Component count per vertex is dictated by the mode at draw time
    /// (2 for Flat, 3 for Spatial); the data is raw floats either way.
    pub fn upload_positions(&mut self, gpu: &Gpu<'_>, data: &[f32]) {
        upload_slot(
            gpu,
            &mut self.position_vbo,
            bytemuck::cast_slice(data),
            wgpu::BufferUsages::VERTEX,
            "mesh positions",
        );
    }

    /// Replaces the color buffer contents (3 components per vertex).
    pub fn upload_colors(&mut self, gpu: &Gpu<'_>, data: &[f32]) {
        upload_slot(
            gpu,
            &mut self.color_vbo,
            bytemuck::cast_slice(data),
            wgpu::BufferUsages::VERTEX,
            "mesh colors",
        );
    }

    /// Replaces the per-vertex depth buffer contents (1 component per vertex).
    ///
    /// Only Flat pipelines consume this attribute.
    pub fn upload_depths(&mut self, gpu: &Gpu<'_>, data: &[f32]) {
        upload_slot(
            gpu,
            &mut self.depth_vbo,
            bytemuck::cast_slice(data),
            wgpu::BufferUsages::VERTEX,
            "mesh depths",
        );
    }

    /// Replaces the index buffer contents and caches the element count.
    ///
    /// In Spatial mode the incoming indices describe quads and are expanded
    /// to triangles here; the cached count is the expanded one actually
    /// drawn. Each upload fully supersedes the previous count.
    pub fn upload_indices(&mut self, gpu: &Gpu<'_>, data: &[u32], mode: SurfaceMode) {
        let expanded;
        let effective: &[u32] = match mode {
            SurfaceMode::Flat => data,
            SurfaceMode::Spatial => {
                expanded = expand_quad_indices(data);
                &expanded
            }
        };

        self.index_count = effective.len() as u32;
        upload_slot(
            gpu,
            &mut self.ibo,
            bytemuck::cast_slice(effective),
            wgpu::BufferUsages::INDEX,
            "mesh indices",
        );
    }

    /// Records one indexed draw of the uploaded geometry.
    ///
    /// Clears color to black and depth to the far plane, then draws with the
    /// cached index count. Drawing without a program or geometry is not an
    /// error; the pass simply clears.
    pub fn draw(
        &mut self,
        gpu: &Gpu<'_>,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        mvp: Mat4,
        mode: SurfaceMode,
    ) {
        self.ensure_pipeline(gpu, mode);
        self.write_transform(gpu, mvp);

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("periscope mesh pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: gpu.depth_view(),
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

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(positions) = self.position_vbo.as_ref() else { return };
        let Some(colors) = self.color_vbo.as_ref() else { return };
        let Some(ibo) = self.ibo.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, positions.buffer.slice(..));
        rpass.set_vertex_buffer(1, colors.buffer.slice(..));
        if mode == SurfaceMode::Flat {
            let Some(depths) = self.depth_vbo.as_ref() else { return };
            rpass.set_vertex_buffer(2, depths.buffer.slice(..));
        }
        rpass.set_index_buffer(ibo.buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    fn write_transform(&mut self, gpu: &Gpu<'_>, mvp: Mat4) {
        let uniform = TransformUniform {
            mvp: mvp.to_cols_array_2d(),
        };

        if self.transform_ubo.is_none() {
            self.transform_ubo = Some(gpu.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("mesh transform ubo"),
                size: std::mem::size_of::<TransformUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.bind_group = None;
        }

        let layout = self.ensure_bind_group_layout(gpu);
        let ubo = self.transform_ubo.as_ref().expect("created above");
        gpu.queue().write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));

        if self.bind_group.is_none() {
            self.bind_group = Some(gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mesh transform bind group"),
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                }],
            }));
        }
    }

    fn ensure_bind_group_layout(&mut self, gpu: &Gpu<'_>) -> wgpu::BindGroupLayout {
        if self.bind_group_layout.is_none() {
            self.bind_group_layout = Some(gpu.device().create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some("mesh transform bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(
                                std::num::NonZeroU64::new(
                                    std::mem::size_of::<TransformUniform>() as u64
                                )
                                .expect("uniform has non-zero size"),
                            ),
                        },
                        count: None,
                    }],
                },
            ));
        }
        self.bind_group_layout.clone().expect("created above")
    }

    fn ensure_pipeline(&mut self, gpu: &Gpu<'_>, mode: SurfaceMode) {
        let key = (gpu.surface_format(), mode);
        if self.pipeline_key == Some(key) && self.pipeline.is_some() {
            return;
        }
        if self.program.is_none() {
            return;
        }

        let bind_group_layout = self.ensure_bind_group_layout(gpu);
        let program = self.program.as_ref().expect("checked above");

        let pipeline_layout =
            gpu.device()
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("mesh pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let position_attrs = [wgpu::VertexAttribute {
            format: match mode {
                SurfaceMode::Flat => wgpu::VertexFormat::Float32x2,
                SurfaceMode::Spatial => wgpu::VertexFormat::Float32x3,
            },
            offset: 0,
            shader_location: 0,
        }];
        let color_attrs = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 1,
        }];
        let depth_attrs = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32,
            offset: 0,
            shader_location: 2,
        }];

        let position_stride = match mode {
            SurfaceMode::Flat => 2,
            SurfaceMode::Spatial => 3,
        } * std::mem::size_of::<f32>() as u64;

        let mut buffers = vec![
            wgpu::VertexBufferLayout {
                array_stride: position_stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &position_attrs,
            },
            wgpu::VertexBufferLayout {
                array_stride: 3 * std::mem::size_of::<f32>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &color_attrs,
            },
        ];
        if mode == SurfaceMode::Flat {
            buffers.push(wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<f32>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &depth_attrs,
            });
        }

        let topology = match mode {
            SurfaceMode::Flat => wgpu::PrimitiveTopology::PointList,
            SurfaceMode::Spatial => wgpu::PrimitiveTopology::TriangleList,
        };

        let pipeline = gpu
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("mesh pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(program.vertex_entry()),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(program.fragment_entry()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.surface_format(),
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),

                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        self.pipeline = Some(pipeline);
        self.pipeline_key = Some(key);
    }
}

fn upload_slot(
    gpu: &Gpu<'_>,
    slot: &mut Option<SlotBuffer>,
    bytes: &[u8],
    usage: wgpu::BufferUsages,
    label: &str,
) {
    let len = bytes.len() as u64;

    match slot {
        Some(existing) if existing.capacity >= len && len > 0 => {
            gpu.queue().write_buffer(&existing.buffer, 0, bytes);
        }
        _ => {
            let buffer = gpu
                .device()
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytes,
                    usage: usage | wgpu::BufferUsages::COPY_DST,
                });
            *slot = Some(SlotBuffer {
                buffer,
                capacity: len,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── quad expansion ────────────────────────────────────────────────────

    #[test]
    fn expands_one_quad_to_two_triangles() {
        assert_eq!(
            expand_quad_indices(&[0, 1, 2, 3]),
            vec![0, 1, 2, 0, 2, 3]
        );
    }

    #[test]
    fn expands_cube_faces() {
        let quads: Vec<u32> = (0..24).collect();
        let tris = expand_quad_indices(&quads);
        assert_eq!(tris.len(), 36);
        // Every source index survives expansion.
        for i in 0..24 {
            assert!(tris.contains(&i));
        }
    }

    #[test]
    fn drops_trailing_partial_quad() {
        assert_eq!(expand_quad_indices(&[0, 1, 2]), Vec::<u32>::new());
        assert_eq!(expand_quad_indices(&[0, 1, 2, 3, 4]).len(), 6);
    }
}
