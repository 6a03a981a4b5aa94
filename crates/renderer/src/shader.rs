//! Shader compilation, linking and location lookup.
//!
//! Stages are parsed with naga's GLSL frontend and validated up front so a
//! broken shader is reported with its diagnostic before any GPU object is
//! created. Linking checks the varying interface between the two stages and
//! builds the name tables the render loop resolves its handles from.

use std::collections::BTreeMap;
use std::error::Error as _;
use std::fmt;

use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::{
    AddressSpace, Binding, EntryPoint, Handle, Module, ScalarKind, ShaderStage, Type, TypeInner,
};

use crate::error::{LocationKind, RenderError};

/// Pipeline stage a source text is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    fn naga_stage(self) -> ShaderStage {
        match self {
            StageKind::Vertex => ShaderStage::Vertex,
            StageKind::Fragment => ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// A single validated shader stage.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    kind: StageKind,
    source: String,
    module: Module,
}

impl CompiledStage {
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Original GLSL text; the GPU backend compiles from this.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn entry_point(&self) -> Option<&EntryPoint> {
        let stage = self.kind.naga_stage();
        self.module.entry_points.iter().find(|ep| ep.stage == stage)
    }
}

/// Opaque handle to a per-vertex input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLocation(u32);

impl AttributeLocation {
    /// Shader input location the attribute is bound to.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Opaque handle to a uniform-block member, expressed as its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(u32);

impl UniformLocation {
    pub fn offset(self) -> u32 {
        self.0
    }
}

/// Shape of a vertex input as declared by the vertex stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeShape {
    pub components: u32,
    pub float32: bool,
}

/// The uniform block the linked program reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    /// Size in bytes, rounded up to a 16-byte multiple.
    pub size: u32,
}

#[derive(Debug, Clone)]
struct InterfaceVar {
    location: u32,
    name: Option<String>,
    inner: TypeInner,
}

/// Compiles one stage from GLSL source.
pub fn compile(source: &str, kind: StageKind) -> Result<CompiledStage, RenderError> {
    let mut frontend = glsl::Frontend::default();
    let module = frontend
        .parse(&glsl::Options::from(kind.naga_stage()), source)
        .map_err(|errors| RenderError::Compile {
            stage: kind,
            log: errors
                .errors
                .iter()
                .map(|error| {
                    let at = error.meta.location(source);
                    format!("{}:{}: {error}", at.line_number, at.line_position)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        })?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(|error| RenderError::Compile {
            stage: kind,
            log: describe_validation_error(&error, source),
        })?;

    tracing::debug!(stage = %kind, "compiled shader stage");
    Ok(CompiledStage {
        kind,
        source: source.to_owned(),
        module,
    })
}

fn describe_validation_error(
    error: &wgpu::naga::WithSpan<wgpu::naga::valid::ValidationError>,
    source: &str,
) -> String {
    let mut log = error.to_string();
    let mut cause = std::error::Error::source(error.as_inner());
    while let Some(inner) = cause {
        log.push_str(&format!("\n  caused by: {inner}"));
        cause = inner.source();
    }
    for (span, label) in error.spans() {
        let at = span.location(source);
        log.push_str(&format!(
            "\n  {}:{}: {label}",
            at.line_number, at.line_position
        ));
    }
    log
}

/// A linked vertex/fragment pair with resolved name tables.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    vertex: CompiledStage,
    fragment: CompiledStage,
    attributes: BTreeMap<String, (AttributeLocation, Option<AttributeShape>)>,
    uniforms: BTreeMap<String, UniformLocation>,
    uniform_block: Option<UniformBlock>,
}

/// Links two compiled stages into a program.
pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<ShaderProgram, RenderError> {
    if vertex.kind != StageKind::Vertex {
        return Err(RenderError::Link(format!(
            "expected a vertex stage, got {}",
            vertex.kind
        )));
    }
    if fragment.kind != StageKind::Fragment {
        return Err(RenderError::Link(format!(
            "expected a fragment stage, got {}",
            fragment.kind
        )));
    }

    let vertex_ep = vertex
        .entry_point()
        .ok_or_else(|| RenderError::Link("vertex stage has no entry point".into()))?;
    let fragment_ep = fragment
        .entry_point()
        .ok_or_else(|| RenderError::Link("fragment stage has no entry point".into()))?;

    let outputs = entry_outputs(&vertex.module, vertex_ep);
    for input in entry_inputs(&fragment.module, fragment_ep) {
        let label = input.name.as_deref().unwrap_or("<unnamed>");
        let Some(output) = outputs.iter().find(|out| out.location == input.location) else {
            return Err(RenderError::Link(format!(
                "fragment input `{label}` at location {} has no matching vertex output",
                input.location
            )));
        };
        if output.inner != input.inner {
            return Err(RenderError::Link(format!(
                "fragment input `{label}` at location {} does not match the vertex output type",
                input.location
            )));
        }
    }

    let mut attributes = BTreeMap::new();
    for input in entry_inputs(&vertex.module, vertex_ep) {
        if let Some(name) = input.name.clone() {
            attributes.insert(
                name,
                (AttributeLocation(input.location), attribute_shape(&input.inner)),
            );
        }
    }

    let (uniform_block, uniforms) = merge_uniform_blocks(&vertex.module, &fragment.module)?;

    tracing::debug!(
        attributes = ?attributes.keys().collect::<Vec<_>>(),
        uniforms = ?uniforms.keys().collect::<Vec<_>>(),
        "linked shader program"
    );

    Ok(ShaderProgram {
        vertex,
        fragment,
        attributes,
        uniforms,
        uniform_block,
    })
}

impl ShaderProgram {
    /// Compiles and links the embedded vertex and fragment sources.
    pub fn embedded() -> Result<Self, RenderError> {
        let vertex = compile(crate::sources::VERTEX_SHADER_GLSL, StageKind::Vertex)?;
        let fragment = compile(crate::sources::FRAGMENT_SHADER_GLSL, StageKind::Fragment)?;
        link(vertex, fragment)
    }

    pub fn vertex(&self) -> &CompiledStage {
        &self.vertex
    }

    pub fn fragment(&self) -> &CompiledStage {
        &self.fragment
    }

    pub fn resolve_attribute(&self, name: &str) -> Result<AttributeLocation, RenderError> {
        self.attributes
            .get(name)
            .map(|(location, _)| *location)
            .ok_or_else(|| RenderError::LocationNotFound {
                kind: LocationKind::Attribute,
                name: name.to_owned(),
            })
    }

    pub fn resolve_uniform(&self, name: &str) -> Result<UniformLocation, RenderError> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::LocationNotFound {
                kind: LocationKind::Uniform,
                name: name.to_owned(),
            })
    }

    /// Declared shape of an attribute, `None` when it is not a float vector.
    pub fn attribute_shape(&self, location: AttributeLocation) -> Option<AttributeShape> {
        self.attributes
            .values()
            .find(|(candidate, _)| *candidate == location)
            .and_then(|(_, shape)| *shape)
    }

    pub fn uniform_block(&self) -> Option<UniformBlock> {
        self.uniform_block
    }

    /// Attribute and uniform names with their handles, sorted by name.
    pub fn attribute_names(&self) -> impl Iterator<Item = (&str, AttributeLocation)> {
        self.attributes
            .iter()
            .map(|(name, (location, _))| (name.as_str(), *location))
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = (&str, UniformLocation)> {
        self.uniforms
            .iter()
            .map(|(name, location)| (name.as_str(), *location))
    }
}

fn attribute_shape(inner: &TypeInner) -> Option<AttributeShape> {
    match inner {
        TypeInner::Scalar(scalar) => Some(AttributeShape {
            components: 1,
            float32: scalar.kind == ScalarKind::Float && scalar.width == 4,
        }),
        TypeInner::Vector { size, scalar } => Some(AttributeShape {
            components: *size as u32,
            float32: scalar.kind == ScalarKind::Float && scalar.width == 4,
        }),
        _ => None,
    }
}

fn entry_inputs(module: &Module, ep: &EntryPoint) -> Vec<InterfaceVar> {
    let mut vars = Vec::new();
    for argument in &ep.function.arguments {
        collect_located(
            module,
            argument.ty,
            argument.binding.as_ref(),
            argument.name.as_deref(),
            &mut vars,
        );
    }
    vars
}

fn entry_outputs(module: &Module, ep: &EntryPoint) -> Vec<InterfaceVar> {
    let mut vars = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_located(module, result.ty, result.binding.as_ref(), None, &mut vars);
    }
    vars
}

fn collect_located(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut Vec<InterfaceVar>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(InterfaceVar {
            location: *location,
            name: name.map(str::to_owned),
            inner: module.types[ty].inner.clone(),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_located(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        member.name.as_deref(),
                        out,
                    );
                }
            }
        }
    }
}

type BlockMembers = Vec<(String, u32)>;

fn uniform_blocks(module: &Module) -> Vec<((u32, u32), u32, BlockMembers)> {
    let mut blocks = Vec::new();
    for (_, global) in module.global_variables.iter() {
        if global.space != AddressSpace::Uniform {
            continue;
        }
        let Some(binding) = &global.binding else {
            continue;
        };
        let key = (binding.group, binding.binding);
        let ty = &module.types[global.ty];
        match &ty.inner {
            TypeInner::Struct { members, span } => {
                let members = members
                    .iter()
                    .filter_map(|member| member.name.clone().map(|name| (name, member.offset)))
                    .collect();
                blocks.push((key, *span, members));
            }
            _ => {
                if let Some(name) = global.name.clone() {
                    let size = ty.inner.size(module.to_ctx());
                    blocks.push((key, size, vec![(name, 0)]));
                }
            }
        }
    }
    blocks
}

fn merge_uniform_blocks(
    vertex: &Module,
    fragment: &Module,
) -> Result<(Option<UniformBlock>, BTreeMap<String, UniformLocation>), RenderError> {
    let mut merged: Option<((u32, u32), u32, BlockMembers)> = None;
    for block in uniform_blocks(vertex)
        .into_iter()
        .chain(uniform_blocks(fragment))
    {
        match &merged {
            None => merged = Some(block),
            Some((key, _, members)) if *key == block.0 => {
                if *members != block.2 {
                    return Err(RenderError::Link(format!(
                        "uniform block at set {} binding {} is declared differently in each stage",
                        key.0, key.1
                    )));
                }
            }
            Some(_) => {
                return Err(RenderError::Link(
                    "programs with more than one uniform block are not supported".into(),
                ));
            }
        }
    }

    let Some(((group, binding), span, members)) = merged else {
        return Ok((None, BTreeMap::new()));
    };
    let uniforms = members
        .into_iter()
        .map(|(name, offset)| (name, UniformLocation(offset)))
        .collect();
    let block = UniformBlock {
        group,
        binding,
        size: span.max(16).div_ceil(16) * 16,
    };
    Ok((Some(block), uniforms))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSTHROUGH_VERTEX: &str = r"#version 450
layout(location = 0) in vec2 position;
layout(location = 0) out vec2 v_uv;
void main() {
    v_uv = position * 0.5 + vec2(0.5);
    gl_Position = vec4(position, 0.0, 1.0);
}
";

    #[test]
    fn embedded_program_resolves_required_locations() {
        let program = ShaderProgram::embedded().expect("embedded shaders link");
        let position = program.resolve_attribute("position").unwrap();
        assert_eq!(position.index(), 0);
        assert_eq!(
            program.attribute_shape(position),
            Some(AttributeShape {
                components: 2,
                float32: true,
            })
        );
        for name in ["u_time", "width", "height"] {
            assert!(program.resolve_uniform(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn uniform_offsets_follow_std140_layout() {
        let program = ShaderProgram::embedded().unwrap();
        assert_eq!(program.resolve_uniform("width").unwrap().offset(), 0);
        assert_eq!(program.resolve_uniform("height").unwrap().offset(), 4);
        assert_eq!(program.resolve_uniform("u_time").unwrap().offset(), 8);
        let block = program.uniform_block().expect("uniform block");
        assert_eq!((block.group, block.binding), (0, 0));
        assert_eq!(block.size % 16, 0);
        assert!(block.size >= 12);
    }

    #[test]
    fn invalid_fragment_source_reports_compile_error() {
        let err = compile("#version 450\nvoid main() { this is not glsl }\n", StageKind::Fragment)
            .unwrap_err();
        match err {
            RenderError::Compile { stage, log } => {
                assert_eq!(stage, StageKind::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_names_report_location_not_found() {
        let program = ShaderProgram::embedded().unwrap();
        match program.resolve_uniform("u_tiem").unwrap_err() {
            RenderError::LocationNotFound { kind, name } => {
                assert_eq!(kind, LocationKind::Uniform);
                assert_eq!(name, "u_tiem");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            program.resolve_attribute("u_time"),
            Err(RenderError::LocationNotFound {
                kind: LocationKind::Attribute,
                ..
            })
        ));
    }

    #[test]
    fn link_rejects_mismatched_varying_types() {
        let vertex = compile(PASSTHROUGH_VERTEX, StageKind::Vertex).unwrap();
        let fragment = compile(
            r"#version 450
layout(location = 0) in vec3 v_uv;
layout(location = 0) out vec4 frag_color;
void main() {
    frag_color = vec4(v_uv, 1.0);
}
",
            StageKind::Fragment,
        )
        .unwrap();
        assert!(matches!(link(vertex, fragment), Err(RenderError::Link(_))));
    }

    #[test]
    fn link_rejects_unwritten_varying() {
        let vertex = compile(crate::sources::VERTEX_SHADER_GLSL, StageKind::Vertex).unwrap();
        let fragment = compile(
            r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 frag_color;
void main() {
    frag_color = vec4(v_uv, 0.0, 1.0);
}
",
            StageKind::Fragment,
        )
        .unwrap();
        let err = link(vertex, fragment).unwrap_err();
        assert!(matches!(err, RenderError::Link(_)));
        assert!(err.to_string().contains("location 0"), "{err}");
    }

    #[test]
    fn link_accepts_matching_varyings() {
        let vertex = compile(PASSTHROUGH_VERTEX, StageKind::Vertex).unwrap();
        let fragment = compile(
            r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 frag_color;
void main() {
    frag_color = vec4(v_uv, 0.0, 1.0);
}
",
            StageKind::Fragment,
        )
        .unwrap();
        let program = link(vertex, fragment).unwrap();
        assert!(program.uniform_block().is_none());
        assert!(program.resolve_attribute("position").is_ok());
    }

    #[test]
    fn link_rejects_swapped_stages() {
        let vertex = compile(crate::sources::VERTEX_SHADER_GLSL, StageKind::Vertex).unwrap();
        let fragment = compile(crate::sources::FRAGMENT_SHADER_GLSL, StageKind::Fragment).unwrap();
        assert!(matches!(link(fragment, vertex), Err(RenderError::Link(_))));
    }
}
