use crate::backend::GraphicsBackend;
use crate::error::RenderError;
use crate::shader::{ShaderProgram, UniformLocation};

/// Tracks the drawable size and keeps the viewport and the `width`/`height`
/// uniforms in step with it.
#[derive(Debug, Clone, Copy)]
pub struct GraphicsContext {
    width: u32,
    height: u32,
    width_uniform: UniformLocation,
    height_uniform: UniformLocation,
}

impl GraphicsContext {
    /// Binds to the backend's surface and pushes its current size.
    ///
    /// `program` must already be active on `backend`.
    pub fn initialize<B: GraphicsBackend>(
        backend: &mut B,
        program: &ShaderProgram,
    ) -> Result<Self, RenderError> {
        let width_uniform = program.resolve_uniform("width")?;
        let height_uniform = program.resolve_uniform("height")?;
        let (width, height) = backend.surface_size();
        let mut context = Self {
            width: width.max(1),
            height: height.max(1),
            width_uniform,
            height_uniform,
        };
        context.apply(backend);
        tracing::debug!(width = context.width, height = context.height, "graphics context ready");
        Ok(context)
    }

    /// Applies a host resize. Zero-sized surfaces (minimised windows) are
    /// ignored; returns whether anything changed.
    pub fn on_resize<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> bool {
        if width == 0 || height == 0 {
            tracing::trace!(width, height, "ignoring zero-sized resize");
            return false;
        }
        self.width = width;
        self.height = height;
        self.apply(backend);
        tracing::debug!(width, height, "surface resized");
        true
    }

    fn apply<B: GraphicsBackend>(&mut self, backend: &mut B) {
        backend.set_viewport(self.width, self.height);
        backend.set_uniform_f32(self.width_uniform, self.width as f32);
        backend.set_uniform_f32(self.height_uniform, self.height as f32);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Call, RecordingBackend};

    #[test]
    fn initialize_pushes_current_surface_size() {
        let program = ShaderProgram::embedded().unwrap();
        let mut backend = RecordingBackend::new(800, 600);
        let context = GraphicsContext::initialize(&mut backend, &program).unwrap();
        assert_eq!(context.size(), (800, 600));

        let width = program.resolve_uniform("width").unwrap();
        let height = program.resolve_uniform("height").unwrap();
        assert_eq!(
            backend.calls(),
            &[
                Call::SetViewport(800, 600),
                Call::SetUniform(width, 800.0),
                Call::SetUniform(height, 600.0),
            ]
        );
    }

    #[test]
    fn resize_updates_viewport_and_uniforms_only() {
        let program = ShaderProgram::embedded().unwrap();
        let mut backend = RecordingBackend::new(800, 600);
        let mut context = GraphicsContext::initialize(&mut backend, &program).unwrap();
        backend.clear();

        backend.resize_surface(1024, 768);
        assert!(context.on_resize(&mut backend, 1024, 768));
        assert_eq!(context.size(), (1024, 768));

        let width = program.resolve_uniform("width").unwrap();
        let height = program.resolve_uniform("height").unwrap();
        assert_eq!(
            backend.calls(),
            &[
                Call::SetViewport(1024, 768),
                Call::SetUniform(width, 1024.0),
                Call::SetUniform(height, 768.0),
            ]
        );
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let program = ShaderProgram::embedded().unwrap();
        let mut backend = RecordingBackend::new(640, 480);
        let mut context = GraphicsContext::initialize(&mut backend, &program).unwrap();
        backend.clear();

        assert!(!context.on_resize(&mut backend, 0, 480));
        assert!(!context.on_resize(&mut backend, 640, 0));
        assert_eq!(context.size(), (640, 480));
        assert!(backend.calls().is_empty());
    }
}
