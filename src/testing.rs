//! An in-memory [`Device`] and collaborators that record what the pipeline group asks of them.

use std::cell::{Cell, OnceCell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use futures_lite::future::{block_on, yield_now};
use thiserror::Error;

use crate::{
    BindGroup, Device, GpuPipeline, IndexBuffer, Labeled, Pipeline, PipelineKind,
    SharedBindGroup, VertexAttributes,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub(crate) struct MockError(pub &'static str);

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MockPipelineLayout {
    pub label: String,
    pub bind_group_layouts: Vec<u32>,
}

pub(crate) struct MockRenderDescriptor<'a> {
    label: Option<&'a str>,
    vertex_layouts: &'a [u64],
    layout: &'a MockPipelineLayout,
}

pub(crate) struct MockComputeDescriptor<'a> {
    label: Option<&'a str>,
    layout: &'a MockPipelineLayout,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MockGpuPipeline {
    pub label: Option<String>,
    pub vertex_layouts: Vec<u64>,
    pub layout: MockPipelineLayout,
}

/// The layout a [`MockBindGroup`] at `index` realizes.
pub(crate) fn layout_id(index: u32) -> u32 {
    100 + index
}

#[derive(Default)]
pub(crate) struct MockDevice {
    pub layouts: RefCell<Vec<MockPipelineLayout>>,
    pub render_requests: Cell<usize>,
    pub compute_requests: Cell<usize>,
    pub reject_pipelines: Cell<bool>,
}

impl MockDevice {
    fn pipeline(
        &self,
        label: Option<&str>,
        vertex_layouts: &[u64],
        layout: &MockPipelineLayout,
    ) -> Result<MockGpuPipeline, MockError> {
        if self.reject_pipelines.get() {
            return Err(MockError("pipeline rejected"));
        }
        Ok(MockGpuPipeline {
            label: label.map(str::to_string),
            vertex_layouts: vertex_layouts.to_vec(),
            layout: layout.clone(),
        })
    }
}

impl Device for MockDevice {
    type Error = MockError;

    type BindGroupLayout = u32;
    type BindGroup = u32;
    type PipelineLayout = MockPipelineLayout;
    type ShaderModule = &'static str;
    type Buffer = Vec<u8>;
    type VertexBufferLayout<'a> = u64;
    type RenderPipelineDescriptor<'a> = MockRenderDescriptor<'a>;
    type ComputePipelineDescriptor<'a> = MockComputeDescriptor<'a>;
    type RenderPipeline = MockGpuPipeline;
    type ComputePipeline = MockGpuPipeline;

    fn create_pipeline_layout<'a>(
        &'a self,
        label: &'a str,
        bind_group_layouts: &'a [&'a u32],
    ) -> impl Future<Output = Result<MockPipelineLayout, MockError>> + 'a {
        async move {
            yield_now().await;
            let layout = MockPipelineLayout {
                label: label.to_string(),
                bind_group_layouts: bind_group_layouts.iter().map(|&&id| id).collect(),
            };
            self.layouts.borrow_mut().push(layout.clone());
            Ok(layout)
        }
    }

    fn create_render_pipeline<'a, 'd: 'a>(
        &'a self,
        descriptor: &'a MockRenderDescriptor<'d>,
    ) -> impl Future<Output = Result<MockGpuPipeline, MockError>> + 'a {
        async move {
            self.render_requests.set(self.render_requests.get() + 1);
            yield_now().await;
            self.pipeline(descriptor.label, descriptor.vertex_layouts, descriptor.layout)
        }
    }

    fn create_compute_pipeline<'a, 'd: 'a>(
        &'a self,
        descriptor: &'a MockComputeDescriptor<'d>,
    ) -> impl Future<Output = Result<MockGpuPipeline, MockError>> + 'a {
        async move {
            self.compute_requests.set(self.compute_requests.get() + 1);
            yield_now().await;
            self.pipeline(descriptor.label, &[], descriptor.layout)
        }
    }
}

pub(crate) struct MockBindGroup {
    index: u32,
    provides_layout: bool,
    fails: bool,
    layout: OnceCell<u32>,
    group: OnceCell<u32>,
    pub realizations: Cell<usize>,
}

impl MockBindGroup {
    pub fn new(index: u32) -> Rc<Self> {
        Rc::new(Self {
            index,
            provides_layout: true,
            fails: false,
            layout: OnceCell::new(),
            group: OnceCell::new(),
            realizations: Cell::new(0),
        })
    }

    /// Realizes its binding but never a layout.
    pub fn without_layout(index: u32) -> Rc<Self> {
        Rc::new(Self {
            provides_layout: false,
            ..Rc::into_inner(Self::new(index)).unwrap()
        })
    }

    pub fn failing(index: u32) -> Rc<Self> {
        Rc::new(Self {
            fails: true,
            ..Rc::into_inner(Self::new(index)).unwrap()
        })
    }

    /// Already realized before it is handed to a group.
    pub fn realized(index: u32) -> Rc<Self> {
        let group = Self::new(index);
        group.layout.set(layout_id(index)).unwrap();
        group.group.set(index).unwrap();
        group
    }
}

pub(crate) fn shared(group: &Rc<MockBindGroup>) -> SharedBindGroup<MockDevice> {
    group.clone()
}

impl BindGroup<MockDevice> for MockBindGroup {
    fn index(&self) -> u32 {
        self.index
    }

    fn layout(&self) -> Option<&u32> {
        self.layout.get()
    }

    fn group(&self) -> Option<&u32> {
        self.group.get()
    }

    fn realize<'a>(&'a self, _: &'a MockDevice) -> LocalBoxFuture<'a, Result<(), MockError>> {
        async move {
            self.realizations.set(self.realizations.get() + 1);
            yield_now().await;
            if self.fails {
                return Err(MockError("bind group realization failed"));
            }
            if self.provides_layout {
                let _ = self.layout.set(layout_id(self.index));
            }
            let _ = self.group.set(self.index);
            Ok(())
        }
        .boxed_local()
    }
}

pub(crate) type EventLog = Rc<RefCell<Vec<String>>>;

pub(crate) struct MockPipeline {
    label: Option<&'static str>,
    kind: PipelineKind,
    sets_module: bool,
    fails_build: bool,
    build_yields: usize,
    module: Option<&'static str>,
    gpu_pipeline: Option<GpuPipeline<MockDevice>>,
    events: Option<EventLog>,
}

impl MockPipeline {
    pub fn new(kind: PipelineKind, label: &'static str) -> Self {
        Self {
            label: Some(label),
            kind,
            sets_module: true,
            fails_build: false,
            build_yields: 1,
            module: None,
            gpu_pipeline: None,
            events: None,
        }
    }

    pub fn render(label: &'static str) -> Self {
        Self::new(PipelineKind::Render, label)
    }

    pub fn compute(label: &'static str) -> Self {
        Self::new(PipelineKind::Compute, label)
    }

    pub fn unlabeled(mut self) -> Self {
        self.label = None;
        self
    }

    /// Builds without ever loading a shader module.
    pub fn without_module(mut self) -> Self {
        self.sets_module = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fails_build = true;
        self
    }

    /// Suspend `yields` times inside `build()` before finishing it.
    pub fn yielding(mut self, yields: usize) -> Self {
        self.build_yields = yields;
        self
    }

    pub fn logging_to(mut self, events: &EventLog) -> Self {
        self.events = Some(events.clone());
        self
    }

    fn log(&self, event: &str) {
        if let Some(events) = &self.events {
            events
                .borrow_mut()
                .push(format!("{event} {}", self.label_or_default()));
        }
    }
}

impl Labeled for MockPipeline {
    fn label(&self) -> Option<&str> {
        self.label
    }
}

impl Pipeline<MockDevice> for MockPipeline {
    fn kind(&self) -> PipelineKind {
        self.kind
    }

    fn shader_module(&self) -> Option<&&'static str> {
        self.module.as_ref()
    }

    fn build<'a>(&'a mut self, _: &'a MockDevice) -> LocalBoxFuture<'a, Result<(), MockError>> {
        async move {
            self.log("start");
            for _ in 0..self.build_yields {
                yield_now().await;
            }
            if self.fails_build {
                return Err(MockError("pipeline build failed"));
            }
            if self.sets_module {
                self.module = Some("mock module");
            }
            self.log("end");
            Ok(())
        }
        .boxed_local()
    }

    fn render_descriptor<'a, 'v: 'a>(
        &'a self,
        vertex_layouts: &'a [u64],
        layout: &'a MockPipelineLayout,
    ) -> MockRenderDescriptor<'a> {
        MockRenderDescriptor {
            label: self.label,
            vertex_layouts,
            layout,
        }
    }

    fn compute_descriptor<'a>(&'a self, layout: &'a MockPipelineLayout) -> MockComputeDescriptor<'a> {
        MockComputeDescriptor {
            label: self.label,
            layout,
        }
    }

    fn gpu_pipeline(&self) -> Option<&GpuPipeline<MockDevice>> {
        self.gpu_pipeline.as_ref()
    }

    fn set_gpu_pipeline(&mut self, pipeline: GpuPipeline<MockDevice>) {
        self.gpu_pipeline = Some(pipeline);
    }
}

/// A vertex attribute object whose layout is just its stride.
pub(crate) struct MockVertexObject(pub Option<u64>);

impl VertexAttributes<MockDevice> for MockVertexObject {
    fn layout(&self) -> Option<u64> {
        self.0
    }
}

#[derive(Default)]
pub(crate) struct MockIndexBuffer {
    fails: bool,
    buffer: Option<Vec<u8>>,
}

impl MockIndexBuffer {
    pub fn failing() -> Self {
        Self {
            fails: true,
            buffer: None,
        }
    }
}

impl IndexBuffer<MockDevice> for MockIndexBuffer {
    fn realize_gpu_buffer<'a>(
        &'a mut self,
        _: &'a MockDevice,
    ) -> LocalBoxFuture<'a, Result<(), MockError>> {
        async move {
            yield_now().await;
            if self.fails {
                return Err(MockError("index buffer realization failed"));
            }
            self.buffer = Some(vec![0, 0, 1, 0, 2, 0]);
            Ok(())
        }
        .boxed_local()
    }

    fn gpu_buffer(&self) -> Option<&Vec<u8>> {
        self.buffer.as_ref()
    }

    fn index_count(&self) -> u32 {
        3
    }
}

/// A device on the first adapter found, or `None` on machines without one.
pub(crate) fn wgpu_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();
    let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))?;
    block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("test device"),
            features: wgpu::Features::empty(),
            limits: wgpu::Limits::downlevel_defaults(),
        },
        None,
    ))
    .ok()
}

pub(crate) fn wgpu_buffer(device: &wgpu::Device, usage: wgpu::BufferUsages) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("test buffer"),
        size: 256,
        usage,
        mapped_at_creation: false,
    })
}
