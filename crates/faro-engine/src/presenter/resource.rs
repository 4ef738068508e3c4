use std::fmt;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// One vertex of a renderable object: position plus texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertexData {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl VertexData {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x2  // tex_coord
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexData>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// One raw RGBA8 texture image, tightly packed (`4 * width * height` bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A contiguous run of indices (or vertices) drawn with one draw call,
/// sharing one texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FaceInfo {
    pub index_offset: u32,
    pub index_count: u32,
    pub textured: bool,
    pub texture_index: u32,
}

/// Geometry/texture descriptor for one renderable object.
///
/// Produced by asset loaders, consumed once by
/// [`Renderer::create_render_resource`](super::Renderer::create_render_resource).
/// Indices are optional; without them face groups address vertices directly.
#[derive(Debug, Clone, Default)]
pub struct RenderResourceData {
    pub vertices: Vec<VertexData>,
    pub indices: Vec<u16>,
    pub textures: Vec<TextureData>,
    pub faces: Vec<FaceInfo>,
}

impl RenderResourceData {
    pub fn validate(&self) -> Result<(), ResourceDataError> {
        if self.vertices.is_empty() {
            return Err(ResourceDataError::NoVertices);
        }
        for (index, tex) in self.textures.iter().enumerate() {
            let expected = 4 * tex.width as usize * tex.height as usize;
            if tex.pixels.len() != expected {
                return Err(ResourceDataError::TexturePixels {
                    index,
                    expected,
                    actual: tex.pixels.len(),
                });
            }
        }
        Ok(())
    }
}

/// Error rejecting a malformed descriptor before any device allocation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceDataError {
    /// The vertex sequence is empty.
    NoVertices,
    /// A texture's pixel buffer does not match its dimensions.
    TexturePixels {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for ResourceDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceDataError::NoVertices => {
                write!(f, "render resource descriptor has no vertices")
            }
            ResourceDataError::TexturePixels { index, expected, actual } => write!(
                f,
                "texture {index} has {actual} pixel bytes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ResourceDataError {}

/// A texture uploaded to the device, with the bind group that draws it.
pub(crate) struct TextureBinding {
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

/// GPU-side bundle for one renderable object.
///
/// Exclusively owned by the caller that requested its creation; the backend
/// never retains it. Immutable after creation; device memory is released
/// when the owner drops it.
pub struct RenderResource {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: Option<wgpu::Buffer>,
    pub(crate) texture_bindings: Vec<TextureBinding>,
    pub(crate) faces: Vec<FaceInfo>,
    /// Serial of the backend that created this resource. `render` refuses
    /// resources stamped by another backend.
    pub(crate) backend_serial: u64,
}

impl RenderResource {
    pub fn face_groups(&self) -> &[FaceInfo] {
        &self.faces
    }

    pub fn texture_count(&self) -> usize {
        self.texture_bindings.len()
    }

    pub fn has_index_buffer(&self) -> bool {
        self.index_buffer.is_some()
    }
}

/// Everything resource creation needs from the backend.
pub(crate) struct ResourceCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub texture_layout: &'a wgpu::BindGroupLayout,
    pub sampler: &'a wgpu::Sampler,
}

/// Uploads a descriptor into a fully populated [`RenderResource`].
///
/// All-or-nothing: the descriptor is validated before the first device call,
/// and device-level allocation failures are fatal under wgpu's error model,
/// so no partially initialized resource can escape.
pub(crate) fn create_resource(
    ctx: &ResourceCtx<'_>,
    backend_serial: u64,
    data: &RenderResourceData,
) -> Result<RenderResource, ResourceDataError> {
    data.validate()?;

    let vertex_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("faro resource vertex buffer"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

    let index_buffer = if data.indices.is_empty() {
        None
    } else {
        Some(
            ctx.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("faro resource index buffer"),
                    contents: bytemuck::cast_slice(&data.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
        )
    };

    // Views are collected in input order so FaceInfo::texture_index stays
    // valid against the uploaded sequence.
    let texture_bindings = data
        .textures
        .iter()
        .map(|tex| create_texture_binding(ctx, tex))
        .collect();

    Ok(RenderResource {
        vertex_buffer,
        index_buffer,
        texture_bindings,
        faces: data.faces.clone(),
        backend_serial,
    })
}

pub(crate) fn create_texture_binding(
    ctx: &ResourceCtx<'_>,
    data: &TextureData,
) -> TextureBinding {
    let size = wgpu::Extent3d {
        width: data.width.max(1),
        height: data.height.max(1),
        depth_or_array_layers: 1,
    };

    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("faro resource texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("faro resource texture bind group"),
        layout: ctx.texture_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(ctx.sampler),
            },
        ],
    });

    TextureBinding { view, bind_group }
}

/// One planned draw call for a face group.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct DrawStep {
    /// Index into the resource's texture bindings, or `None` for the
    /// fallback binding.
    pub texture: Option<usize>,
    pub first: u32,
    pub count: u32,
}

/// Maps face groups to draw calls.
///
/// A face group marked textured whose texture index is out of range, or
/// whose resource has no textures at all, draws with the fallback binding
/// instead of erroring; partially textured meshes keep rendering.
pub(crate) fn plan_face_draws(faces: &[FaceInfo], texture_count: usize) -> Vec<DrawStep> {
    faces
        .iter()
        .map(|face| {
            let texture = if face.textured && (face.texture_index as usize) < texture_count {
                Some(face.texture_index as usize)
            } else {
                None
            };
            DrawStep {
                texture,
                first: face.index_offset,
                count: face.index_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_descriptor() -> RenderResourceData {
        RenderResourceData {
            vertices: vec![
                VertexData { position: [0.0, 0.0, 0.0], tex_coord: [0.0, 0.0] },
                VertexData { position: [1.0, 0.0, 0.0], tex_coord: [1.0, 0.0] },
                VertexData { position: [1.0, 1.0, 0.0], tex_coord: [1.0, 1.0] },
                VertexData { position: [0.0, 1.0, 0.0], tex_coord: [0.0, 1.0] },
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            textures: vec![TextureData {
                width: 2,
                height: 2,
                pixels: vec![0xFF; 16],
            }],
            faces: vec![FaceInfo {
                index_offset: 0,
                index_count: 6,
                textured: true,
                texture_index: 0,
            }],
        }
    }

    #[test]
    fn empty_vertices_fail_validation() {
        let data = RenderResourceData::default();
        assert_eq!(data.validate(), Err(ResourceDataError::NoVertices));
    }

    #[test]
    fn mismatched_texture_pixels_fail_validation() {
        let mut data = quad_descriptor();
        data.textures[0].pixels.pop();
        assert!(matches!(
            data.validate(),
            Err(ResourceDataError::TexturePixels { index: 0, .. })
        ));
    }

    #[test]
    fn valid_descriptor_passes() {
        assert_eq!(quad_descriptor().validate(), Ok(()));
    }

    // ── draw planning ─────────────────────────────────────────────────────

    #[test]
    fn textured_quad_plans_one_textured_draw() {
        let data = quad_descriptor();
        let steps = plan_face_draws(&data.faces, data.textures.len());
        assert_eq!(
            steps,
            vec![DrawStep { texture: Some(0), first: 0, count: 6 }]
        );
    }

    #[test]
    fn untextured_triangle_plans_one_plain_draw() {
        let faces = [FaceInfo {
            index_offset: 0,
            index_count: 3,
            textured: false,
            texture_index: 0,
        }];
        let steps = plan_face_draws(&faces, 0);
        assert_eq!(steps, vec![DrawStep { texture: None, first: 0, count: 3 }]);
    }

    #[test]
    fn out_of_range_texture_index_falls_back() {
        let faces = [FaceInfo {
            index_offset: 0,
            index_count: 6,
            textured: true,
            texture_index: 5,
        }];
        let steps = plan_face_draws(&faces, 1);
        assert_eq!(steps[0].texture, None);
    }

    #[test]
    fn textured_face_with_no_textures_falls_back() {
        let faces = [FaceInfo {
            index_offset: 0,
            index_count: 6,
            textured: true,
            texture_index: 0,
        }];
        let steps = plan_face_draws(&faces, 0);
        assert_eq!(steps[0].texture, None);
    }

    #[test]
    fn face_groups_plan_in_order() {
        let faces = [
            FaceInfo { index_offset: 0, index_count: 6, textured: true, texture_index: 1 },
            FaceInfo { index_offset: 6, index_count: 3, textured: false, texture_index: 0 },
            FaceInfo { index_offset: 9, index_count: 9, textured: true, texture_index: 0 },
        ];
        let steps = plan_face_draws(&faces, 2);
        assert_eq!(
            steps,
            vec![
                DrawStep { texture: Some(1), first: 0, count: 6 },
                DrawStep { texture: None, first: 6, count: 3 },
                DrawStep { texture: Some(0), first: 9, count: 9 },
            ]
        );
    }

    // ── device-backed creation (skipped when no adapter exists) ───────────

    mod gpu {
        use super::*;
        use crate::device::HeadlessGpu;
        use crate::presenter::pipeline;

        fn with_ctx(f: impl FnOnce(&ResourceCtx<'_>)) {
            // Headless GPU init may fail in CI without an adapter; skip then.
            let Ok(gpu) = pollster::block_on(HeadlessGpu::new()) else {
                return;
            };
            let texture_layout = pipeline::texture_bind_group_layout(&gpu.device);
            let sampler = pipeline::default_sampler(&gpu.device);
            f(&ResourceCtx {
                device: &gpu.device,
                queue: &gpu.queue,
                texture_layout: &texture_layout,
                sampler: &sampler,
            });
        }

        #[test]
        fn quad_resource_matches_descriptor() {
            with_ctx(|ctx| {
                let data = quad_descriptor();
                let resource = create_resource(ctx, 7, &data).unwrap();

                assert_eq!(resource.face_groups(), data.faces.as_slice());
                assert_eq!(resource.texture_count(), data.textures.len());
                assert!(resource.has_index_buffer());
                assert_eq!(resource.backend_serial, 7);
            });
        }

        #[test]
        fn unindexed_descriptor_has_no_index_buffer() {
            with_ctx(|ctx| {
                let mut data = quad_descriptor();
                data.indices.clear();
                data.textures.clear();
                data.faces = vec![FaceInfo {
                    index_offset: 0,
                    index_count: 3,
                    textured: false,
                    texture_index: 0,
                }];

                let resource = create_resource(ctx, 1, &data).unwrap();
                assert!(!resource.has_index_buffer());
                assert_eq!(resource.texture_count(), 0);
            });
        }

        #[test]
        fn empty_descriptor_is_rejected_before_upload() {
            with_ctx(|ctx| {
                let err = create_resource(ctx, 1, &RenderResourceData::default());
                assert_eq!(err.err(), Some(ResourceDataError::NoVertices));
            });
        }
    }
}
