use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::error::RenderError;
use crate::geometry::VertexLayout;
use crate::shader::{AttributeLocation, CompiledStage, ShaderProgram, StageKind, UniformBlock};

use super::uniforms::UniformMirror;

/// GPU-side objects created when a program is activated.
pub(crate) struct ProgramModules {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    pub uniforms: Option<UniformResources>,
}

pub(crate) struct UniformResources {
    pub buffer: wgpu::Buffer,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    pub mirror: UniformMirror,
}

impl ProgramModules {
    pub fn new(device: &wgpu::Device, program: &ShaderProgram) -> Result<Self, RenderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex = create_module(device, program.vertex());
        let fragment = create_module(device, program.fragment());
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::Link(format!(
                "GPU rejected the shader program: {error}"
            )));
        }

        let uniforms = program
            .uniform_block()
            .map(|block| UniformResources::new(device, block))
            .transpose()?;

        Ok(Self {
            vertex,
            fragment,
            uniforms,
        })
    }
}

impl UniformResources {
    fn new(device: &wgpu::Device, block: UniformBlock) -> Result<Self, RenderError> {
        if block.group != 0 {
            return Err(RenderError::Link(format!(
                "uniform block must live in set 0, found set {}",
                block.group
            )));
        }

        let mirror = UniformMirror::new(block.size);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: mirror.size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: block.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: block.binding,
                resource: buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            buffer,
            layout,
            bind_group,
            mirror,
        })
    }
}

fn create_module(device: &wgpu::Device, stage: &CompiledStage) -> wgpu::ShaderModule {
    let (label, naga_stage) = match stage.kind() {
        StageKind::Vertex => ("tilewave vertex", ShaderStage::Vertex),
        StageKind::Fragment => ("tilewave fragment", ShaderStage::Fragment),
    };
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(stage.source().to_owned()),
            stage: naga_stage,
            defines: &[],
        },
    })
}

pub(crate) fn vertex_format(layout: VertexLayout) -> Option<wgpu::VertexFormat> {
    match layout.components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

/// Builds the triangle-strip pipeline for the active program and the bound
/// vertex attribute.
pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    modules: &ProgramModules,
    attribute: AttributeLocation,
    layout: VertexLayout,
    surface_format: wgpu::TextureFormat,
) -> Option<wgpu::RenderPipeline> {
    let format = vertex_format(layout)?;
    let attributes = [wgpu::VertexAttribute {
        format,
        offset: layout.offset,
        shader_location: attribute.index(),
    }];

    let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = modules
        .uniforms
        .as_ref()
        .map(|uniforms| vec![&uniforms.layout])
        .unwrap_or_default();
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("tilewave pipeline layout"),
        bind_group_layouts: &bind_group_layouts,
        push_constant_ranges: &[],
    });

    Some(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("tilewave pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &modules.vertex,
            entry_point: Some("main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: layout.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &modules.fragment,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_layout_maps_to_float32x2() {
        assert_eq!(
            vertex_format(VertexLayout::POSITION_2D),
            Some(wgpu::VertexFormat::Float32x2)
        );
        let wide = VertexLayout {
            components: 5,
            ..VertexLayout::POSITION_2D
        };
        assert_eq!(vertex_format(wide), None);
    }
}
