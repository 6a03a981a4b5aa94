//! wgpu implementation of [`GraphicsBackend`].
//!
//! - `context` owns the instance/device/surface wiring and reconfigures the
//!   swapchain when the viewport changes.
//! - `pipeline` turns the linked program into shader modules plus a uniform
//!   buffer, and builds the triangle-strip pipeline.
//! - `uniforms` mirrors the uniform block on the CPU so single members can be
//!   written through the queue.
//!
//! wgpu has no notion of a "current program" or loose vertex attribute state,
//! so the backend records both and (re)builds the render pipeline lazily on
//! the first draw after either changes.

mod context;
mod pipeline;
mod uniforms;

use std::sync::Arc;

use tracing::warn;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::backend::GraphicsBackend;
use crate::error::{FrameError, RenderError};
use crate::geometry::VertexLayout;
use crate::shader::{AttributeLocation, ShaderProgram, UniformLocation};
use crate::types::GpuPowerPreference;

use context::GpuContext;
use pipeline::{build_pipeline, vertex_format, ProgramModules};

pub struct WgpuBackend {
    context: GpuContext,
    program: Option<ProgramModules>,
    vertex_buffer: Option<wgpu::Buffer>,
    attribute: Option<(AttributeLocation, VertexLayout)>,
    pipeline: Option<wgpu::RenderPipeline>,
    viewport: (u32, u32),
}

impl WgpuBackend {
    /// Acquires an adapter, device and surface for `window`.
    pub fn new(
        window: Arc<Window>,
        power: GpuPowerPreference,
        vsync: bool,
    ) -> Result<Self, RenderError> {
        let context = GpuContext::new(window, power, vsync)?;
        let viewport = context.size();
        Ok(Self {
            context,
            program: None,
            vertex_buffer: None,
            attribute: None,
            pipeline: None,
            viewport,
        })
    }

    fn ensure_pipeline(&mut self) -> Result<(), FrameError> {
        if self.pipeline.is_some() {
            return Ok(());
        }
        let modules = self
            .program
            .as_ref()
            .ok_or(FrameError::NotReady("a program is active"))?;
        let (attribute, layout) = self
            .attribute
            .ok_or(FrameError::NotReady("a vertex attribute is bound"))?;
        let pipeline = build_pipeline(
            &self.context.device,
            modules,
            attribute,
            layout,
            self.context.surface_format,
        )
        .ok_or_else(|| {
            FrameError::Backend(format!(
                "unsupported vertex layout with {} components",
                layout.components
            ))
        })?;
        tracing::debug!("render pipeline built");
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn acquire_frame(&mut self) -> Result<Option<wgpu::SurfaceTexture>, FrameError> {
        match self.context.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Outdated) => {
                warn!("surface outdated; reconfiguring and dropping this frame");
                self.context.reconfigure();
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; dropping this frame");
                Ok(None)
            }
            Err(wgpu::SurfaceError::Lost) => Err(FrameError::SurfaceLost),
            Err(wgpu::SurfaceError::OutOfMemory) => Err(FrameError::OutOfMemory),
            Err(other) => Err(FrameError::Backend(other.to_string())),
        }
    }
}

impl GraphicsBackend for WgpuBackend {
    fn surface_size(&self) -> (u32, u32) {
        self.context.size()
    }

    fn use_program(&mut self, program: &ShaderProgram) -> Result<(), RenderError> {
        self.program = Some(ProgramModules::new(&self.context.device, program)?);
        self.pipeline = None;
        Ok(())
    }

    fn upload_vertices(&mut self, vertices: &[[f32; 2]]) -> Result<(), RenderError> {
        let buffer = self
            .context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quad vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.vertex_buffer = Some(buffer);
        Ok(())
    }

    fn bind_attribute(
        &mut self,
        location: AttributeLocation,
        layout: VertexLayout,
    ) -> Result<(), RenderError> {
        if vertex_format(layout).is_none() {
            return Err(RenderError::Link(format!(
                "vertex attribute with {} components is not supported",
                layout.components
            )));
        }
        self.attribute = Some((location, layout));
        self.pipeline = None;
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        self.viewport = (width, height);
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        let Some(uniforms) = self
            .program
            .as_mut()
            .and_then(|program| program.uniforms.as_mut())
        else {
            warn!(offset = location.offset(), "uniform write without an active uniform block");
            return;
        };
        match uniforms.mirror.write_f32(location, value) {
            Some((offset, bytes)) => {
                self.context.queue.write_buffer(&uniforms.buffer, offset, bytes);
            }
            None => warn!(offset = location.offset(), "uniform write outside the block"),
        }
    }

    fn draw_triangle_strip(&mut self, vertex_count: u32) -> Result<(), FrameError> {
        self.ensure_pipeline()?;
        let Some(frame) = self.acquire_frame()? else {
            return Ok(());
        };
        let (Some(pipeline), Some(vertex_buffer)) = (&self.pipeline, &self.vertex_buffer) else {
            return Err(FrameError::NotReady("vertices are uploaded"));
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let (surface_width, surface_height) = self.context.size();
            let width = self.viewport.0.min(surface_width).max(1);
            let height = self.viewport.1.min(surface_height).max(1);
            render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            render_pass.set_pipeline(pipeline);
            if let Some(uniforms) = self.program.as_ref().and_then(|p| p.uniforms.as_ref()) {
                render_pass.set_bind_group(0, &uniforms.bind_group, &[]);
            }
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.draw(0..vertex_count, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
