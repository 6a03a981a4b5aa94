//! GLSL sources compiled into the binary.
//!
//! Both stages target Vulkan-flavoured GLSL 450 so naga can parse them. The
//! fragment stage keeps its three scalar inputs in a single std140 block at
//! set 0, binding 0; the backend mirrors that block on the CPU and writes
//! individual members by byte offset.

use crate::shader::StageKind;

/// Passes the quad corners straight through; `position` is already in NDC.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";

/// Rotating tile grid with an undulating diagonal band.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
#define PI 3.14159265358979323846

layout(location = 0) out vec4 frag_color;

layout(std140, set = 0, binding = 0) uniform Params {
    float width;
    float height;
    float u_time;
};

vec2 rotate2d(vec2 st, float angle) {
    st -= vec2(0.5);
    st = mat2(cos(angle), -sin(angle), sin(angle), cos(angle)) * st;
    st += vec2(0.5);
    return st;
}

vec2 rotate_tile_pattern(vec2 st) {
    st *= 2.0;

    // quadrant index: 0 bottom-left, 1 bottom-right, 2 top-left, 3 top-right
    float index = 0.0;
    index += step(1.0, mod(st.x, 2.0));
    index += step(1.0, mod(st.y, 2.0)) * 2.0;
    st = fract(st);

    if (index == 1.0) {
        st = rotate2d(st, PI * 0.5);
    } else if (index == 2.0) {
        st = rotate2d(st, PI * -0.5);
    } else if (index == 3.0) {
        st = rotate2d(st, PI);
    }
    return st;
}

void main() {
    vec2 resolution = vec2(width, height);
    // Fragment origin is top-left here; the pattern is laid out bottom-left.
    vec2 frag_coord = vec2(gl_FragCoord.x, resolution.y - gl_FragCoord.y);

    vec2 st = frag_coord / resolution;
    float d = distance(st, vec2(0.5, 0.5));
    st.y *= resolution.y / resolution.x;
    float t = u_time / 2.0;

    st *= 10.0;
    st = rotate_tile_pattern(st);
    float rot = 3.0 * PI * sin(mod(t / 2.0, PI * 4.0));
    st = rotate2d(st, rot);

    vec2 uv = st - vec2(0.5);
    uv.x *= resolution.x / resolution.y;
    for (float i = 1.0; i < 3.0; i += 1.0) {
        st.x += 0.1 * sin((1.0 - d) + PI * t + i * 1.5 * st.y);
        st.y += 0.1 * cos((1.0 - d) + PI * t + i * 4.0 * st.y);
        st += vec2(0.25 * (1.0 - d) + 0.13 * (d * sin(t + d) * abs(sin(2.0 * length(uv)))));
    }

    float snake = step(st.y, st.x) - step(st.y, st.x * 0.8);
    snake *= step(1.0 - st.y, st.x) - step(1.0 - st.y, st.x * 0.1);

    vec3 color = vec3(t * 0.2 + PI * d) + st.xyx + vec3(0.0, 2.0, 4.0);
    color = vec3(0.5) + 0.5 * cos(color + vec3(d));
    frag_color = vec4(color * snake, 1.0);
}
";

/// Returns the embedded source for `kind`.
pub fn embedded_source(kind: StageKind) -> &'static str {
    match kind {
        StageKind::Vertex => VERTEX_SHADER_GLSL,
        StageKind::Fragment => FRAGMENT_SHADER_GLSL,
    }
}
