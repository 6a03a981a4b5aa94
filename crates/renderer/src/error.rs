use std::fmt;

use thiserror::Error;

use crate::shader::StageKind;

/// Startup failures. Every variant is fatal: the renderer never falls back to
/// another shader or retries acquisition.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no compatible graphics context available: {0}")]
    ContextUnavailable(String),
    #[error("failed to compile {stage} shader:\n{log}")]
    Compile { stage: StageKind, log: String },
    #[error("failed to link shader program: {0}")]
    Link(String),
    #[error("{kind} `{name}` not found in linked program")]
    LocationNotFound { kind: LocationKind, name: String },
}

/// Which namespace a failed location lookup searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Attribute,
    Uniform,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKind::Attribute => f.write_str("attribute"),
            LocationKind::Uniform => f.write_str("uniform"),
        }
    }
}

/// Failures raised while producing a frame. Any of these halts the loop.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("drawing surface was lost")]
    SurfaceLost,
    #[error("GPU ran out of memory")]
    OutOfMemory,
    #[error("draw issued before {0}")]
    NotReady(&'static str),
    #[error("backend failure: {0}")]
    Backend(String),
}
