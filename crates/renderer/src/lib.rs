//! Renderer crate for tilewave.
//!
//! Draws one animated fragment shader over a full-screen quad. The flow is:
//!
//! ```text
//!   tilewave CLI
//!        │ RendererConfig
//!        ▼
//!   Renderer::run ──▶ ShaderProgram::embedded()   (naga compile + link)
//!        │        ──▶ WindowHost + WgpuBackend    (window, device, surface)
//!        ▼
//!   RendererState::initialize ──▶ RenderLoop::run(host)
//!                                      │ per redraw
//!                                      └─▶ tick ─▶ u_time ─▶ draw strip
//! ```
//!
//! Everything the loop touches lives in one [`RendererState`]; the graphics
//! API sits behind [`GraphicsBackend`] so the loop can be driven without a
//! GPU.

mod backend;
mod clock;
mod context;
mod error;
mod geometry;
mod gpu;
mod render_loop;
mod shader;
mod sources;
mod types;
mod window;

use anyhow::{Context, Result};

pub use backend::GraphicsBackend;
pub use clock::{Clock, DEFAULT_TIME_STEP};
pub use context::GraphicsContext;
pub use error::{FrameError, LocationKind, RenderError};
pub use geometry::{Geometry, VertexLayout, QUAD_VERTICES};
pub use gpu::WgpuBackend;
pub use render_loop::{FrameHost, HostEvent, LoopExit, LoopPhase, RenderLoop, RendererState};
pub use shader::{
    compile, link, AttributeLocation, AttributeShape, CompiledStage, ShaderProgram, StageKind,
    UniformBlock, UniformLocation,
};
pub use sources::{embedded_source, FRAGMENT_SHADER_GLSL, VERTEX_SHADER_GLSL};
pub use types::{GpuPowerPreference, RendererConfig};
pub use window::WindowHost;

/// Entry point used by the binary: opens the window and animates until it
/// closes.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn run(&mut self) -> Result<()> {
        let program = ShaderProgram::embedded().context("failed to build shader program")?;

        let mut host = WindowHost::new(&self.config).context("failed to open window")?;
        let backend = WgpuBackend::new(host.window(), self.config.power, self.config.vsync)
            .context("failed to initialise GPU")?;
        let state = RendererState::initialize(backend, program, self.config.time_step)
            .context("failed to initialise renderer")?;

        tracing::info!(
            width = state.surface_size().0,
            height = state.surface_size().1,
            time_step = self.config.time_step,
            "renderer initialised"
        );

        let mut render_loop = RenderLoop::new(state);
        match render_loop.run(&mut host) {
            LoopExit::HostClosed => {}
            LoopExit::Halted(err) => {
                tracing::debug!(error = %err, "frame production stopped");
            }
        }
        Ok(())
    }
}
