/// WGSL shader for instanced block boxes with a two-tone pixel pattern and
/// distance fog.
pub const BLOCK_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    sky_color: vec4<f32>,
    // x = fog start, y = fog end
    fog: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) translation: vec3<f32>,
    @location(3) extent: vec3<f32>,
    @location(4) base_color: vec3<f32>,
    @location(5) accent_color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) local_pos: vec3<f32>,
    @location(3) base_color: vec3<f32>,
    @location(4) accent_color: vec3<f32>,
    @location(5) cell: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let world_pos = instance.translation + vertex.position * instance.extent;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(world_pos, 1.0);
    out.world_pos = world_pos;
    out.normal = vertex.normal;
    out.local_pos = vertex.position;
    out.base_color = instance.base_color;
    out.accent_color = instance.accent_color;
    out.cell = floor(instance.translation);
    return out;
}

fn texel_hash(p: vec3<f32>) -> f32 {
    return fract(sin(dot(p, vec3<f32>(12.9898, 78.233, 37.719))) * 43758.5453);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // 16x16 texels per face, picked from the two material tones
    let texel = floor((in.local_pos + vec3<f32>(0.5)) * 16.0);
    let pick = texel_hash(texel + in.cell * 17.0 + in.normal * 3.0);
    let albedo = select(in.base_color, in.accent_color, pick > 0.55);

    let light_dir = normalize(vec3<f32>(0.35, 1.0, 0.25));
    let ambient = 0.45;
    let diffuse = max(dot(in.normal, light_dir), 0.0);
    let lit = albedo * (ambient + diffuse * 0.55);

    let dist = distance(in.world_pos, uniforms.camera_pos.xyz);
    let fog = clamp((dist - uniforms.fog.x) / (uniforms.fog.y - uniforms.fog.x), 0.0, 1.0);
    return vec4<f32>(mix(lit, uniforms.sky_color.rgb, fog), 1.0);
}
"#;
