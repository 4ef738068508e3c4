use crate::presenter::resource::{
    create_texture_binding, ResourceCtx, TextureBinding, TextureData, VertexData,
};
use crate::presenter::uniforms::ObjectUniform;

/// Depth buffer format used by the default pipeline.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The default shader pair plus everything bound alongside it: bind group
/// layouts, the point sampler, and the 1x1 white fallback texture used for
/// non-textured draws.
pub(crate) struct CardPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub object_layout: wgpu::BindGroupLayout,
    pub texture_layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
    pub fallback: TextureBinding,
}

impl CardPipeline {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("faro card shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/card.wgsl").into()),
        });

        let object_layout = object_bind_group_layout(device);
        let texture_layout = texture_bind_group_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("faro card pipeline layout"),
            bind_group_layouts: &[&object_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("faro card pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[VertexData::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
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

        let sampler = default_sampler(device);

        // wgpu requires a texture bound wherever the layout declares one;
        // plain white stands in for D3D-style unset slots on non-textured
        // face groups.
        let fallback = create_texture_binding(
            &ResourceCtx {
                device,
                queue,
                texture_layout: &texture_layout,
                sampler: &sampler,
            },
            &TextureData {
                width: 1,
                height: 1,
                pixels: vec![0xFF, 0xFF, 0xFF, 0xFF],
            },
        );

        Self {
            pipeline,
            object_layout,
            texture_layout,
            sampler,
            fallback,
        }
    }
}

/// Group 0: one per-draw uniform slot, bound with a dynamic offset into the
/// frame's uniform ring.
pub(crate) fn object_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("faro object bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: Some(
                    std::num::NonZeroU64::new(std::mem::size_of::<ObjectUniform>() as u64)
                        .unwrap(),
                ),
            },
            count: None,
        }],
    })
}

/// Group 1: one texture view plus the shared sampler.
pub(crate) fn texture_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("faro texture bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
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
    })
}

/// Point sampling, clamped addressing — card art is authored pixel-exact.
pub(crate) fn default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("faro card sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}
