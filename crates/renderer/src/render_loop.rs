//! Frame driver.
//!
//! `RendererState` bundles everything created at startup; `RenderLoop` owns
//! it and advances one frame per host wake-up. The host's `next_event` is the
//! only place the loop yields, so frames run strictly one after another and
//! each clock tick is followed by exactly one `u_time` write and one draw.

use std::time::{Duration, Instant};

use crate::backend::GraphicsBackend;
use crate::clock::Clock;
use crate::context::GraphicsContext;
use crate::error::{FrameError, RenderError};
use crate::geometry::Geometry;
use crate::shader::{ShaderProgram, UniformLocation};

/// What the host hands the loop each time it resumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The drawable surface changed size.
    Resized { width: u32, height: u32 },
    /// The display is ready for the next frame.
    Frame,
    /// The surface is gone; stop producing frames.
    Closed,
}

/// The host side of the loop: blocks until something needs the renderer.
pub trait FrameHost {
    fn next_event(&mut self) -> HostEvent;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Running,
}

/// Why [`RenderLoop::run`] returned.
#[derive(Debug)]
pub enum LoopExit {
    HostClosed,
    Halted(FrameError),
}

/// Everything the loop needs, built once by [`RendererState::initialize`].
pub struct RendererState<B> {
    backend: B,
    program: ShaderProgram,
    context: GraphicsContext,
    geometry: Geometry,
    clock: Clock,
    time_uniform: UniformLocation,
}

impl<B: GraphicsBackend> RendererState<B> {
    /// Activates `program`, resolves its handles, pushes the surface size and
    /// uploads the quad. Any failure aborts startup.
    pub fn initialize(
        mut backend: B,
        program: ShaderProgram,
        time_step: f32,
    ) -> Result<Self, RenderError> {
        let time_uniform = program.resolve_uniform("u_time")?;
        backend.use_program(&program)?;
        let context = GraphicsContext::initialize(&mut backend, &program)?;
        let geometry = Geometry::build(&mut backend, &program)?;
        Ok(Self {
            backend,
            program,
            context,
            geometry,
            clock: Clock::new(time_step),
            time_uniform,
        })
    }

    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.context.size()
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

pub struct RenderLoop<B> {
    state: RendererState<B>,
    phase: LoopPhase,
    stats: FrameStats,
}

impl<B: GraphicsBackend> RenderLoop<B> {
    pub fn new(state: RendererState<B>) -> Self {
        Self {
            state,
            phase: LoopPhase::Idle,
            stats: FrameStats::new(Instant::now()),
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn state(&self) -> &RendererState<B> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RendererState<B> {
        &mut self.state
    }

    pub fn frames_rendered(&self) -> u64 {
        self.stats.total
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        let state = &mut self.state;
        state.context.on_resize(&mut state.backend, width, height);
    }

    /// Advances the clock, pushes `u_time` and draws the quad once.
    pub fn frame(&mut self) -> Result<(), FrameError> {
        self.phase = LoopPhase::Running;
        let state = &mut self.state;
        let time = state.clock.tick();
        state.backend.set_uniform_f32(state.time_uniform, time);
        state
            .backend
            .draw_triangle_strip(state.geometry.vertex_count())?;
        self.stats.record(Instant::now(), time);
        Ok(())
    }

    /// Services host events until the host closes or a frame fails.
    pub fn run<H: FrameHost>(&mut self, host: &mut H) -> LoopExit {
        tracing::info!(time_step = self.state.clock.dt(), "render loop started");
        loop {
            match host.next_event() {
                HostEvent::Resized { width, height } => self.on_resize(width, height),
                HostEvent::Frame => {
                    if let Err(err) = self.frame() {
                        tracing::error!(
                            error = %err,
                            frames = self.stats.total,
                            "frame failed; halting render loop"
                        );
                        return LoopExit::Halted(err);
                    }
                }
                HostEvent::Closed => {
                    tracing::info!(frames = self.stats.total, "host closed; render loop finished");
                    return LoopExit::HostClosed;
                }
            }
        }
    }
}

struct FrameStats {
    total: u64,
    since_report: u32,
    last_report: Instant,
}

impl FrameStats {
    const REPORT_INTERVAL: Duration = Duration::from_secs(1);

    fn new(now: Instant) -> Self {
        Self {
            total: 0,
            since_report: 0,
            last_report: now,
        }
    }

    fn record(&mut self, now: Instant, time: f32) {
        self.total += 1;
        self.since_report += 1;
        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed >= Self::REPORT_INTERVAL {
            let fps = self.since_report as f32 / elapsed.as_secs_f32();
            tracing::debug!(fps = fps.round(), frames = self.total, time, "render stats");
            self.since_report = 0;
            self.last_report = now;
        }
    }
}
