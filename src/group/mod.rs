//! A set of pipelines sharing one pipeline layout and one vertex input layout.
//!
//! A [`PipelineGroup`] is driven in two phases. Registration fills in the bind groups, vertex
//! attribute objects and index buffer; setting the bind groups derives the shared pipeline
//! layout. [`PipelineGroup::build()`] then realizes every pipeline against that layout,
//! concurrently, after checking that everything each pipeline depends on has been realized.

use std::borrow::Cow;
use std::rc::Rc;

use crate::resources::{BindGroup, IndexBuffer, Pipeline, VertexAttributes};
use crate::{Device, DeviceBound, Labeled};

mod build;
mod layout;
mod registry;


/// Names the device objects of a group that was given no label.
pub const DEFAULT_GROUP_LABEL: &str = "pipeline group";

/// A bind group associated with, but not owned by, one or more pipeline groups.
pub type SharedBindGroup<D> = Rc<dyn BindGroup<D>>;

pub struct PipelineGroup<'d, D: Device> {
    device: &'d D,
    label: Option<Cow<'static, str>>,
    pipelines: Vec<Box<dyn Pipeline<D>>>,
    instance_count: u32,
    vertex_count: u32,
    index_buffer: Option<Box<dyn IndexBuffer<D>>>,
    vertex_attribute_objects: Vec<Box<dyn VertexAttributes<D>>>,
    pipeline_layout: Option<D::PipelineLayout>,
    bind_groups: Vec<SharedBindGroup<D>>,
}

impl<'d, D: Device> PipelineGroup<'d, D> {
    /// Start building a group drawing `vertex_count` vertices per instance.
    ///
    /// Both `vertex_count` and the instance count are expected to be non-zero; they are not
    /// checked.
    pub fn builder(device: &'d D, vertex_count: u32) -> PipelineGroupBuilder<'d, D> {
        PipelineGroupBuilder {
            device,
            label: None,
            pipelines: vec![],
            instance_count: 1,
            vertex_count,
        }
    }

    pub fn new(device: &'d D, vertex_count: u32) -> Self {
        Self::builder(device, vertex_count).finish()
    }

    pub fn pipelines(&self) -> &[Box<dyn Pipeline<D>>] {
        &self.pipelines
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_buffer(&self) -> Option<&dyn IndexBuffer<D>> {
        self.index_buffer.as_deref()
    }

    pub fn vertex_attribute_objects(&self) -> &[Box<dyn VertexAttributes<D>>] {
        &self.vertex_attribute_objects
    }

    /// The layout derived from the current bind groups, if it has been built.
    pub fn pipeline_layout(&self) -> Option<&D::PipelineLayout> {
        self.pipeline_layout.as_ref()
    }

    /// The bind groups in the order they were set.
    pub fn bind_groups(&self) -> &[SharedBindGroup<D>] {
        &self.bind_groups
    }
}

impl<D: Device> Labeled for PipelineGroup<'_, D> {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl<D: Device> DeviceBound<D> for PipelineGroup<'_, D> {
    fn device(&self) -> &D {
        self.device
    }
}

impl<D: Device> std::fmt::Debug for PipelineGroup<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pipelines: Vec<_> = self
            .pipelines
            .iter()
            .map(|pipeline| (pipeline.label_or_default(), pipeline.kind()))
            .collect();
        let bind_groups: Vec<_> = self.bind_groups.iter().map(|group| group.index()).collect();

        f.debug_struct("PipelineGroup")
            .field("label", &self.label)
            .field("pipelines", &pipelines)
            .field("instance_count", &self.instance_count)
            .field("vertex_count", &self.vertex_count)
            .field("has_index_buffer", &self.index_buffer.is_some())
            .field("vertex_attribute_objects", &self.vertex_attribute_objects.len())
            .field("has_pipeline_layout", &self.pipeline_layout.is_some())
            .field("bind_groups", &bind_groups)
            .finish()
    }
}

/// Construction parameters of a [`PipelineGroup`].
///
/// See [`PipelineGroup::builder()`].
pub struct PipelineGroupBuilder<'d, D: Device> {
    device: &'d D,
    label: Option<Cow<'static, str>>,
    pipelines: Vec<Box<dyn Pipeline<D>>>,
    instance_count: u32,
    vertex_count: u32,
}

impl<'d, D: Device> PipelineGroupBuilder<'d, D> {
    /// Names the group in diagnostics and labels the pipeline layout it creates.
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn pipeline(mut self, pipeline: impl Pipeline<D> + 'static) -> Self {
        self.pipelines.push(Box::new(pipeline));
        self
    }

    pub fn pipelines(mut self, pipelines: impl IntoIterator<Item = Box<dyn Pipeline<D>>>) -> Self {
        self.pipelines.extend(pipelines);
        self
    }

    /// Defaults to 1.
    pub fn instance_count(mut self, count: u32) -> Self {
        self.instance_count = count;
        self
    }

    pub fn finish(self) -> PipelineGroup<'d, D> {
        PipelineGroup {
            device: self.device,
            label: self.label,
            pipelines: self.pipelines,
            instance_count: self.instance_count,
            vertex_count: self.vertex_count,
            index_buffer: None,
            vertex_attribute_objects: vec![],
            pipeline_layout: None,
            bind_groups: vec![],
        }
    }
}
