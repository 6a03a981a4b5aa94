//! The seam between the render loop and the graphics API.
//!
//! Operations mirror the handful of immediate-mode calls the loop needs:
//! activate a program, upload the static quad, describe its layout, size the
//! viewport, write a float uniform, draw. The wgpu implementation lives in
//! [`crate::gpu`]; tests use the recording backend below.

use crate::error::{FrameError, RenderError};
use crate::geometry::VertexLayout;
use crate::shader::{AttributeLocation, ShaderProgram, UniformLocation};

pub trait GraphicsBackend {
    /// Current drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Makes `program` the active program for every following draw.
    fn use_program(&mut self, program: &ShaderProgram) -> Result<(), RenderError>;

    /// Uploads immutable vertex data. Called once.
    fn upload_vertices(&mut self, vertices: &[[f32; 2]]) -> Result<(), RenderError>;

    fn bind_attribute(
        &mut self,
        location: AttributeLocation,
        layout: VertexLayout,
    ) -> Result<(), RenderError>;

    fn set_viewport(&mut self, width: u32, height: u32);

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32);

    /// Draws `vertex_count` vertices of the bound buffer as a triangle strip
    /// and presents the result.
    fn draw_triangle_strip(&mut self, vertex_count: u32) -> Result<(), FrameError>;
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        UseProgram,
        UploadVertices(Vec<[f32; 2]>),
        BindAttribute(AttributeLocation, VertexLayout),
        SetViewport(u32, u32),
        SetUniform(UniformLocation, f32),
        Draw(u32),
    }

    /// Backend that records every call instead of touching a GPU.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingBackend {
        size: (u32, u32),
        calls: Vec<Call>,
        draws_before_failure: Option<usize>,
    }

    impl RecordingBackend {
        pub(crate) fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                ..Self::default()
            }
        }

        /// Makes every draw after the first `draws` fail with a lost surface.
        pub(crate) fn fail_after(mut self, draws: usize) -> Self {
            self.draws_before_failure = Some(draws);
            self
        }

        /// Host-side resize; the renderer still has to react to it.
        pub(crate) fn resize_surface(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        pub(crate) fn calls(&self) -> &[Call] {
            &self.calls
        }

        pub(crate) fn clear(&mut self) {
            self.calls.clear();
        }

        pub(crate) fn uploaded_vertices(&self) -> Option<&[[f32; 2]]> {
            self.calls.iter().find_map(|call| match call {
                Call::UploadVertices(vertices) => Some(vertices.as_slice()),
                _ => None,
            })
        }

        pub(crate) fn draw_count(&self) -> usize {
            self.calls
                .iter()
                .filter(|call| matches!(call, Call::Draw(_)))
                .count()
        }
    }

    impl GraphicsBackend for RecordingBackend {
        fn surface_size(&self) -> (u32, u32) {
            self.size
        }

        fn use_program(&mut self, _program: &ShaderProgram) -> Result<(), RenderError> {
            self.calls.push(Call::UseProgram);
            Ok(())
        }

        fn upload_vertices(&mut self, vertices: &[[f32; 2]]) -> Result<(), RenderError> {
            self.calls.push(Call::UploadVertices(vertices.to_vec()));
            Ok(())
        }

        fn bind_attribute(
            &mut self,
            location: AttributeLocation,
            layout: VertexLayout,
        ) -> Result<(), RenderError> {
            self.calls.push(Call::BindAttribute(location, layout));
            Ok(())
        }

        fn set_viewport(&mut self, width: u32, height: u32) {
            self.calls.push(Call::SetViewport(width, height));
        }

        fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
            self.calls.push(Call::SetUniform(location, value));
        }

        fn draw_triangle_strip(&mut self, vertex_count: u32) -> Result<(), FrameError> {
            if let Some(limit) = self.draws_before_failure {
                if self.draw_count() >= limit {
                    return Err(FrameError::SurfaceLost);
                }
            }
            self.calls.push(Call::Draw(vertex_count));
            Ok(())
        }
    }
}
