use std::future::Future;
use std::str::Utf8Error;

use thiserror::Error;
use wgpu::{ErrorFilter, PipelineLayoutDescriptor};

/// The device capabilities a [`PipelineGroup`](crate::PipelineGroup) consumes.
///
/// Every GPU object the group touches is an associated type, so a group can be driven by
/// [`wgpu::Device`] or by any other implementation that can hand out layouts and pipelines.
pub trait Device {
    type Error: std::error::Error + 'static;

    type BindGroupLayout;
    type BindGroup;
    type PipelineLayout;
    type ShaderModule;
    type Buffer;
    type VertexBufferLayout<'a>;
    type RenderPipelineDescriptor<'a>;
    type ComputePipelineDescriptor<'a>;
    type RenderPipeline;
    type ComputePipeline;

    fn create_pipeline_layout<'a>(
        &'a self,
        label: &'a str,
        bind_group_layouts: &'a [&'a Self::BindGroupLayout],
    ) -> impl Future<Output = Result<Self::PipelineLayout, Self::Error>> + 'a;

    fn create_render_pipeline<'a, 'd: 'a>(
        &'a self,
        descriptor: &'a Self::RenderPipelineDescriptor<'d>,
    ) -> impl Future<Output = Result<Self::RenderPipeline, Self::Error>> + 'a;

    fn create_compute_pipeline<'a, 'd: 'a>(
        &'a self,
        descriptor: &'a Self::ComputePipelineDescriptor<'d>,
    ) -> impl Future<Output = Result<Self::ComputePipeline, Self::Error>> + 'a;
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Wgpu(#[from] wgpu::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
}

/// Run `create` inside a validation error scope and surface whatever the device rejected.
///
/// The scope is popped before the first suspension point, so scopes opened by
/// interleaved tasks on the same device never nest into each other.
pub(crate) async fn scoped<T>(
    device: &wgpu::Device,
    create: impl FnOnce(&wgpu::Device) -> T,
) -> Result<T, BackendError> {
    device.push_error_scope(ErrorFilter::Validation);
    let value = create(device);
    let scope = device.pop_error_scope();

    match scope.await {
        Some(err) => Err(err.into()),
        None => Ok(value),
    }
}

impl Device for wgpu::Device {
    type Error = BackendError;

    type BindGroupLayout = wgpu::BindGroupLayout;
    type BindGroup = wgpu::BindGroup;
    type PipelineLayout = wgpu::PipelineLayout;
    type ShaderModule = wgpu::ShaderModule;
    type Buffer = wgpu::Buffer;
    type VertexBufferLayout<'a> = wgpu::VertexBufferLayout<'a>;
    type RenderPipelineDescriptor<'a> = wgpu::RenderPipelineDescriptor<'a>;
    type ComputePipelineDescriptor<'a> = wgpu::ComputePipelineDescriptor<'a>;
    type RenderPipeline = wgpu::RenderPipeline;
    type ComputePipeline = wgpu::ComputePipeline;

    fn create_pipeline_layout<'a>(
        &'a self,
        label: &'a str,
        bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    ) -> impl Future<Output = Result<wgpu::PipelineLayout, BackendError>> + 'a {
        scoped(self, move |device| {
            wgpu::Device::create_pipeline_layout(
                device,
                &PipelineLayoutDescriptor {
                    label: Some(label),
                    bind_group_layouts,
                    push_constant_ranges: &[],
                },
            )
        })
    }

    fn create_render_pipeline<'a, 'd: 'a>(
        &'a self,
        descriptor: &'a wgpu::RenderPipelineDescriptor<'d>,
    ) -> impl Future<Output = Result<wgpu::RenderPipeline, BackendError>> + 'a {
        scoped(self, move |device| {
            wgpu::Device::create_render_pipeline(device, descriptor)
        })
    }

    fn create_compute_pipeline<'a, 'd: 'a>(
        &'a self,
        descriptor: &'a wgpu::ComputePipelineDescriptor<'d>,
    ) -> impl Future<Output = Result<wgpu::ComputePipeline, BackendError>> + 'a {
        scoped(self, move |device| {
            wgpu::Device::create_compute_pipeline(device, descriptor)
        })
    }
}

#[test]
fn rejected_pipeline_layout_is_an_error() {
    use std::rc::Rc;

    use crate::testing::{wgpu_buffer, wgpu_device};
    use crate::{BufferBindGroup, PipelineGroup, PipelineGroupError, SharedBindGroup};

    let Some((device, _queue)) = wgpu_device() else {
        return;
    };

    // One more bind group than a single layout may hold.
    let bind_groups: Vec<SharedBindGroup<wgpu::Device>> = (0..=device.limits().max_bind_groups)
        .map(|index| {
            let buffer = wgpu_buffer(&device, wgpu::BufferUsages::UNIFORM);
            Rc::new(BufferBindGroup::new(index, wgpu::ShaderStages::VERTEX).uniform(0, buffer))
                as SharedBindGroup<wgpu::Device>
        })
        .collect();
    let mut group = PipelineGroup::new(&device, 3);

    let result = futures_lite::future::block_on(group.set_bind_groups(bind_groups));

    assert!(matches!(
        result,
        Err(PipelineGroupError::Device(BackendError::Wgpu(_)))
    ));
    assert!(group.pipeline_layout().is_none());
}
