use std::rc::Rc;

use rending_group::*;
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    BufferUsages, ColorTargetState, DeviceDescriptor, Features, Instance, Limits,
    PowerPreference, RequestAdapterOptions, ShaderStages, TextureFormat, VertexFormat,
};

const PARTICLES: &str = r#"
@group(0) @binding(0) var<storage, read_write> positions: array<vec4<f32>>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    positions[id.x] = positions[id.x] + vec4<f32>(0.0, -0.01, 0.0, 0.0);
}
"#;

const MESH: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> camera: Camera;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = camera.view_proj * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

fn main() {
    env_logger::init();

    let instance = Instance::default();
    let adapter =
        futures_lite::future::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .expect("no suitable adapter found");
    let (device, _queue) = futures_lite::future::block_on(adapter.request_device(
        &DeviceDescriptor {
            label: Some("RenderDevice"),
            features: Features::default(),
            limits: Limits::default(),
        },
        None,
    ))
    .expect("failed to request a device");

    let positions = device.create_buffer_init(&BufferInitDescriptor {
        label: Some("positions"),
        contents: bytemuck::cast_slice(&[0.0f32; 4 * 64]),
        usage: BufferUsages::STORAGE | BufferUsages::VERTEX,
    });
    let camera = device.create_buffer_init(&BufferInitDescriptor {
        label: Some("camera"),
        contents: bytemuck::cast_slice(&[
            1.0f32, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });

    futures_lite::future::block_on(async {
        let mut particles = PipelineGroup::builder(&device, 1)
            .label("particles")
            .pipeline(ShaderPipeline::compute(ShaderSource::wgsl(PARTICLES)).label("simulate"))
            .finish();
        let storage: SharedBindGroup<wgpu::Device> = Rc::new(
            BufferBindGroup::new(0, ShaderStages::COMPUTE)
                .label("particle storage")
                .storage(0, positions, false),
        );
        particles.set_bind_groups([storage]).await?;
        particles.build().await?;
        println!("{particles:#?}");

        let mut mesh = PipelineGroup::builder(&device, 36)
            .label("mesh")
            .pipeline(
                ShaderPipeline::render(
                    ShaderSource::wgsl(MESH),
                    vec![Some(ColorTargetState::from(TextureFormat::Rgba8UnormSrgb))],
                )
                .label("colored mesh"),
            )
            .finish();
        mesh.add_vertex_attribute_object(
            VertexAttributeObject::per_vertex()
                .attribute(VertexFormat::Float32x3, 0)
                .attribute(VertexFormat::Float32x3, 1),
        );
        mesh.set_index_buffer(IndexData::from_u16(&[0, 1, 2, 2, 1, 3]).label("quad indices"))
            .await?;
        let camera: SharedBindGroup<wgpu::Device> = Rc::new(
            BufferBindGroup::new(0, ShaderStages::VERTEX)
                .label("camera")
                .uniform(0, camera),
        );
        mesh.set_bind_groups([camera]).await?;
        mesh.build().await?;
        println!("{mesh:#?}");

        Ok::<_, PipelineGroupError<BackendError>>(())
    })
    .unwrap();
}
