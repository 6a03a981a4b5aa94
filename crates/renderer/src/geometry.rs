use crate::backend::GraphicsBackend;
use crate::error::RenderError;
use crate::shader::{AttributeLocation, ShaderProgram};

/// Corners of the NDC square in triangle-strip order: top-left, bottom-left,
/// top-right, bottom-right.
pub const QUAD_VERTICES: [[f32; 2]; 4] = [[-1.0, 1.0], [-1.0, -1.0], [1.0, 1.0], [1.0, -1.0]];

/// Memory layout of a float vertex attribute inside the vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub components: u32,
    pub normalized: bool,
    pub stride: u64,
    pub offset: u64,
}

impl VertexLayout {
    /// Tightly packed `vec2<f32>` positions.
    pub const POSITION_2D: Self = Self {
        components: 2,
        normalized: false,
        stride: 2 * std::mem::size_of::<f32>() as u64,
        offset: 0,
    };
}

/// Write-once full-screen quad bound to the program's `position` input.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    position: AttributeLocation,
    layout: VertexLayout,
}

impl Geometry {
    /// Uploads [`QUAD_VERTICES`] and describes their layout to `position`.
    pub fn build<B: GraphicsBackend>(
        backend: &mut B,
        program: &ShaderProgram,
    ) -> Result<Self, RenderError> {
        let position = program.resolve_attribute("position")?;
        let layout = VertexLayout::POSITION_2D;
        match program.attribute_shape(position) {
            Some(shape) if shape.float32 && shape.components == layout.components => {}
            other => {
                return Err(RenderError::Link(format!(
                    "attribute `position` is declared as {other:?}, but the quad buffer holds {} x f32 per vertex",
                    layout.components
                )));
            }
        }

        backend.upload_vertices(&QUAD_VERTICES)?;
        backend.bind_attribute(position, layout)?;
        tracing::debug!(
            vertices = QUAD_VERTICES.len(),
            stride = layout.stride,
            "uploaded full-screen quad"
        );
        Ok(Self { position, layout })
    }

    pub fn vertex_count(&self) -> u32 {
        QUAD_VERTICES.len() as u32
    }

    pub fn position(&self) -> AttributeLocation {
        self.position
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }
}
