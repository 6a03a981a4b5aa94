use std::collections::VecDeque;
use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use crate::error::RenderError;
use crate::render_loop::{FrameHost, HostEvent};
use crate::types::RendererConfig;

/// A winit window driven by pumping its event loop from the render loop.
///
/// Each call to [`FrameHost::next_event`] requests one redraw and blocks in
/// the platform event queue until the window has something to report, so the
/// loop wakes at most once per redraw the compositor grants.
pub struct WindowHost {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    pending: VecDeque<HostEvent>,
    redraw_requested: bool,
    closed: bool,
}

impl WindowHost {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let event_loop = EventLoop::new().map_err(|err| {
            RenderError::ContextUnavailable(format!("failed to create event loop: {err}"))
        })?;
        let (width, height) = config.surface_size;
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
            .build(&event_loop)
            .map_err(|err| {
                RenderError::ContextUnavailable(format!("failed to create window: {err}"))
            })?;

        Ok(Self {
            event_loop,
            window: Arc::new(window),
            pending: VecDeque::new(),
            redraw_requested: false,
            closed: false,
        })
    }

    pub fn window(&self) -> Arc<Window> {
        Arc::clone(&self.window)
    }

    fn pump(&mut self) {
        let Self {
            event_loop,
            window,
            pending,
            redraw_requested,
            closed,
        } = self;
        let window_id = window.id();

        let status = event_loop.pump_events(None, |event, elwt| {
            let Event::WindowEvent { window_id: id, event } = event else {
                return;
            };
            if id != window_id {
                return;
            }
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    pending.push_back(HostEvent::Closed);
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    pending.push_back(HostEvent::Resized {
                        width: size.width,
                        height: size.height,
                    });
                }
                WindowEvent::RedrawRequested => {
                    *redraw_requested = false;
                    pending.push_back(HostEvent::Frame);
                }
                _ => {}
            }
        });

        if let PumpStatus::Exit(code) = status {
            tracing::debug!(code, "window event loop exited");
            *closed = true;
        }
    }
}

impl FrameHost for WindowHost {
    fn next_event(&mut self) -> HostEvent {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event == HostEvent::Closed {
                    self.closed = true;
                }
                return event;
            }
            if self.closed {
                return HostEvent::Closed;
            }
            if !self.redraw_requested {
                self.window.request_redraw();
                self.redraw_requested = true;
            }
            self.pump();
        }
    }
}
