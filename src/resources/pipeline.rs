use std::borrow::Cow;

use futures::future::{FutureExt, LocalBoxFuture};
use wgpu::{
    ColorTargetState, ComputePipelineDescriptor, FragmentState, MultisampleState,
    PipelineLayout, PrimitiveState, RenderPipelineDescriptor, VertexBufferLayout, VertexState,
};

use super::module::{module_from_source, ShaderSource};
use crate::device::BackendError;
use crate::{Device, Labeled};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Render,
    Compute,
}

/// A realized device pipeline of either kind.
pub enum GpuPipeline<D: Device> {
    Render(D::RenderPipeline),
    Compute(D::ComputePipeline),
}

impl<D: Device> GpuPipeline<D> {
    pub fn kind(&self) -> PipelineKind {
        match self {
            GpuPipeline::Render(_) => PipelineKind::Render,
            GpuPipeline::Compute(_) => PipelineKind::Compute,
        }
    }

    pub fn as_render(&self) -> Option<&D::RenderPipeline> {
        match self {
            GpuPipeline::Render(pipeline) => Some(pipeline),
            GpuPipeline::Compute(_) => None,
        }
    }

    pub fn as_compute(&self) -> Option<&D::ComputePipeline> {
        match self {
            GpuPipeline::Render(_) => None,
            GpuPipeline::Compute(pipeline) => Some(pipeline),
        }
    }
}

impl<D: Device> std::fmt::Debug for GpuPipeline<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GpuPipeline").field(&self.kind()).finish()
    }
}

/// A pipeline managed by a [`PipelineGroup`](crate::PipelineGroup).
///
/// The group drives it in a fixed order: [`build()`](Pipeline::build) first, which must leave
/// [`shader_module()`](Pipeline::shader_module) populated, then one of the descriptor methods
/// matching [`kind()`](Pipeline::kind), and finally
/// [`set_gpu_pipeline()`](Pipeline::set_gpu_pipeline) with the pipeline the device realized.
pub trait Pipeline<D: Device>: Labeled {
    fn kind(&self) -> PipelineKind;

    fn shader_module(&self) -> Option<&D::ShaderModule>;

    fn build<'a>(&'a mut self, device: &'a D) -> LocalBoxFuture<'a, Result<(), D::Error>>;

    /// Only called on [`PipelineKind::Render`] pipelines after a successful build.
    fn render_descriptor<'a, 'v: 'a>(
        &'a self,
        vertex_layouts: &'a [D::VertexBufferLayout<'v>],
        layout: &'a D::PipelineLayout,
    ) -> D::RenderPipelineDescriptor<'a>;

    /// Only called on [`PipelineKind::Compute`] pipelines after a successful build.
    fn compute_descriptor<'a>(
        &'a self,
        layout: &'a D::PipelineLayout,
    ) -> D::ComputePipelineDescriptor<'a>;

    fn gpu_pipeline(&self) -> Option<&GpuPipeline<D>>;

    fn set_gpu_pipeline(&mut self, pipeline: GpuPipeline<D>);
}

#[derive(Debug)]
enum Stages {
    Render {
        vertex_entry: Cow<'static, str>,
        fragment_entry: Option<Cow<'static, str>>,
        targets: Vec<Option<ColorTargetState>>,
        primitive: PrimitiveState,
        multisample: MultisampleState,
    },
    Compute {
        entry: Cow<'static, str>,
    },
}

/// A wgpu pipeline whose shader module is loaded from a [`ShaderSource`] when it is built.
#[derive(Debug)]
pub struct ShaderPipeline {
    label: Option<Cow<'static, str>>,
    source: ShaderSource,
    stages: Stages,
    shader_module: Option<wgpu::ShaderModule>,
    gpu_pipeline: Option<GpuPipeline<wgpu::Device>>,
}

impl ShaderPipeline {
    /// A render pipeline with entry points `vs_main` and `fs_main` writing to `targets`.
    pub fn render(source: ShaderSource, targets: Vec<Option<ColorTargetState>>) -> Self {
        Self {
            label: None,
            source,
            stages: Stages::Render {
                vertex_entry: "vs_main".into(),
                fragment_entry: Some("fs_main".into()),
                targets,
                primitive: PrimitiveState::default(),
                multisample: MultisampleState::default(),
            },
            shader_module: None,
            gpu_pipeline: None,
        }
    }

    /// A compute pipeline with entry point `main`.
    pub fn compute(source: ShaderSource) -> Self {
        Self {
            label: None,
            source,
            stages: Stages::Compute {
                entry: "main".into(),
            },
            shader_module: None,
            gpu_pipeline: None,
        }
    }

    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the vertex entry point of a render pipeline or the entry point of a compute pipeline.
    pub fn entry_point(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        match &mut self.stages {
            Stages::Render { vertex_entry, .. } => *vertex_entry = name.into(),
            Stages::Compute { entry } => *entry = name.into(),
        }
        self
    }

    /// Set the fragment entry point, or disable the fragment stage with `None`.
    ///
    /// The render-only settings below are ignored by compute pipelines.
    pub fn fragment_entry_point(mut self, name: Option<impl Into<Cow<'static, str>>>) -> Self {
        if let Stages::Render { fragment_entry, .. } = &mut self.stages {
            *fragment_entry = name.map(Into::into);
        }
        self
    }

    pub fn primitive(mut self, state: PrimitiveState) -> Self {
        if let Stages::Render { primitive, .. } = &mut self.stages {
            *primitive = state;
        }
        self
    }

    pub fn multisample(mut self, state: MultisampleState) -> Self {
        if let Stages::Render { multisample, .. } = &mut self.stages {
            *multisample = state;
        }
        self
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    fn module(&self) -> &wgpu::ShaderModule {
        self.shader_module
            .as_ref()
            .expect("descriptors should only be requested after the shader module is built")
    }
}

impl Labeled for ShaderPipeline {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Pipeline<wgpu::Device> for ShaderPipeline {
    fn kind(&self) -> PipelineKind {
        match self.stages {
            Stages::Render { .. } => PipelineKind::Render,
            Stages::Compute { .. } => PipelineKind::Compute,
        }
    }

    fn shader_module(&self) -> Option<&wgpu::ShaderModule> {
        self.shader_module.as_ref()
    }

    fn build<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
    ) -> LocalBoxFuture<'a, Result<(), BackendError>> {
        async move {
            if self.shader_module.is_none() {
                let module =
                    module_from_source(device, &self.source, self.label.as_deref()).await?;
                self.shader_module = Some(module);
            }
            Ok(())
        }
        .boxed_local()
    }

    fn render_descriptor<'a, 'v: 'a>(
        &'a self,
        vertex_layouts: &'a [VertexBufferLayout<'v>],
        layout: &'a PipelineLayout,
    ) -> RenderPipelineDescriptor<'a> {
        let Stages::Render {
            vertex_entry,
            fragment_entry,
            targets,
            primitive,
            multisample,
        } = &self.stages
        else {
            panic!("render descriptor requested for a compute pipeline");
        };

        let module = self.module();
        RenderPipelineDescriptor {
            label: self.label.as_deref(),
            layout: Some(layout),
            vertex: VertexState {
                module,
                entry_point: vertex_entry,
                buffers: vertex_layouts,
            },
            primitive: *primitive,
            depth_stencil: None,
            multisample: *multisample,
            fragment: fragment_entry.as_deref().map(|entry_point| FragmentState {
                module,
                entry_point,
                targets: &targets[..],
            }),
            multiview: None,
        }
    }

    fn compute_descriptor<'a>(
        &'a self,
        layout: &'a PipelineLayout,
    ) -> ComputePipelineDescriptor<'a> {
        let Stages::Compute { entry } = &self.stages else {
            panic!("compute descriptor requested for a render pipeline");
        };

        ComputePipelineDescriptor {
            label: self.label.as_deref(),
            layout: Some(layout),
            module: self.module(),
            entry_point: entry,
        }
    }

    fn gpu_pipeline(&self) -> Option<&GpuPipeline<wgpu::Device>> {
        self.gpu_pipeline.as_ref()
    }

    fn set_gpu_pipeline(&mut self, pipeline: GpuPipeline<wgpu::Device>) {
        self.gpu_pipeline = Some(pipeline);
    }
}

#[test]
fn compute_pipeline_is_realized_through_a_group() {
    use std::rc::Rc;

    use futures_lite::future::block_on;

    use crate::testing::{wgpu_buffer, wgpu_device};
    use crate::{BufferBindGroup, PipelineGroup, SharedBindGroup};

    const FILL: &str = r#"
@group(0) @binding(0) var<storage, read_write> values: array<u32>;

@compute @workgroup_size(1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    values[id.x] = id.x;
}
"#;

    let Some((device, _queue)) = wgpu_device() else {
        return;
    };
    // Render-only settings leave a compute pipeline untouched.
    let pipeline = ShaderPipeline::compute(ShaderSource::wgsl(FILL))
        .label("fill")
        .primitive(PrimitiveState::default())
        .fragment_entry_point(None::<&'static str>);
    assert!(matches!(pipeline.source(), ShaderSource::Wgsl(_)));
    assert_eq!(pipeline.kind(), PipelineKind::Compute);

    let storage: SharedBindGroup<wgpu::Device> = Rc::new(
        BufferBindGroup::new(0, wgpu::ShaderStages::COMPUTE)
            .storage(0, wgpu_buffer(&device, wgpu::BufferUsages::STORAGE), false),
    );
    let mut group = PipelineGroup::builder(&device, 1).pipeline(pipeline).finish();
    block_on(group.set_bind_groups([storage])).unwrap();

    block_on(group.build()).unwrap();

    let realized = group.pipelines()[0].gpu_pipeline().unwrap();
    assert_eq!(realized.kind(), PipelineKind::Compute);
    assert!(realized.as_compute().is_some());
}

#[test]
fn invalid_shader_fails_the_group_build() {
    use futures_lite::future::block_on;

    use crate::{PipelineGroup, PipelineGroupError};

    let Some((device, _queue)) = crate::testing::wgpu_device() else {
        return;
    };
    let mut group = PipelineGroup::builder(&device, 1)
        .pipeline(ShaderPipeline::compute(ShaderSource::wgsl("fn main( {")).label("broken"))
        .finish();
    block_on(group.set_bind_groups([])).unwrap();

    let result = block_on(group.build());

    assert!(matches!(
        result,
        Err(PipelineGroupError::Device(BackendError::Wgpu(_)))
    ));
    assert!(group.pipelines()[0].shader_module().is_none());
    assert!(group.pipelines()[0].gpu_pipeline().is_none());
}
