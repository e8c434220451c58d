//! WGSL sources for the renderer's pipelines.

/// Bindings shared by the lit, point and line pipelines.
const COMMON: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    ambient: vec4<f32>,
    light_direction: vec4<f32>,
    light_color: vec4<f32>,
    // x: shadows on, y: shadow texel size, z: depth bias
    shadow_params: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    // x: unlit, y: receives shadows, z: point size
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(0) @binding(1)
var shadow_map: texture_depth_2d;

@group(0) @binding(2)
var shadow_sampler: sampler_comparison;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;
"#;

const LIT: &str = r#"
const INV_PI: f32 = 0.31830988618;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(world_normal);
    return out;
}

fn shadow_factor(world_pos: vec3<f32>) -> f32 {
    let clip = globals.light_view_proj * vec4<f32>(world_pos, 1.0);
    let ndc = clip.xyz / clip.w;
    let uv = ndc.xy * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
    let depth = ndc.z - globals.shadow_params.z;
    let texel = globals.shadow_params.y;

    var visible = 0.0;
    for (var x = -1; x <= 1; x++) {
        for (var y = -1; y <= 1; y++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            visible += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, depth);
        }
    }
    let outside = any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || depth > 1.0;
    return select(visible / 9.0, 1.0, outside);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    if (object.params.x > 0.5) {
        return object.color;
    }
    let normal = normalize(input.normal);
    let n_dot_l = max(dot(normal, normalize(globals.light_direction.xyz)), 0.0);
    var shadow = 1.0;
    if (globals.shadow_params.x > 0.5 && object.params.y > 0.5) {
        shadow = shadow_factor(input.world_pos);
    }
    let irradiance = globals.ambient.rgb + globals.light_color.rgb * n_dot_l * shadow;
    return vec4<f32>(object.color.rgb * INV_PI * irradiance, object.color.a);
}
"#;

const POINTS: &str = r#"
struct PointInput {
    @location(0) center: vec4<f32>,
}

struct PointOutput {
    @builtin(position) position: vec4<f32>,
}

@vertex
fn vs_point(@builtin(vertex_index) index: u32, input: PointInput) -> PointOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[index % 6u] * object.params.z * 0.5;
    let world = input.center.xyz
        + globals.camera_right.xyz * corner.x
        + globals.camera_up.xyz * corner.y;
    var out: PointOutput;
    out.position = globals.view_proj * vec4<f32>(world, 1.0);
    return out;
}

@fragment
fn fs_point() -> @location(0) vec4<f32> {
    return object.color;
}
"#;

const LINES: &str = r#"
struct LineInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
}

struct LineOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_line(input: LineInput) -> LineOutput {
    var out: LineOutput;
    out.position = globals.view_proj * object.model * vec4<f32>(input.position, 1.0);
    out.color = input.color;
    return out;
}

@fragment
fn fs_line(input: LineOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(input.color, 1.0);
}
"#;

/// Depth-only pass rendered from the key light.
pub(crate) const SHADOW_SHADER: &str = r#"
struct ShadowUniform {
    light_view_proj: mat4x4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> shadow: ShadowUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@vertex
fn vs_shadow(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return shadow.light_view_proj * object.model * vec4<f32>(position, 1.0);
}
"#;

/// Lit, point and line entry points in one module.
pub(crate) fn scene_shader() -> String {
    [COMMON, LIT, POINTS, LINES].concat()
}
