use futures::future::try_join_all;

use super::{PipelineGroup, SharedBindGroup};
use crate::resources::{IndexBuffer, Pipeline, VertexAttributes};
use crate::{Device, PipelineGroupError};

impl<'d, D: Device> PipelineGroup<'d, D> {
    /// Replace the bind groups and rebuild the pipeline layout from them.
    ///
    /// Every incoming group without a realized binding is realized first, concurrently. If any
    /// realization fails the error is returned and the previous groups and layout stay in
    /// place, though the groups that did realize keep their new state.
    pub async fn set_bind_groups(
        &mut self,
        bind_groups: impl IntoIterator<Item = SharedBindGroup<D>>,
    ) -> Result<(), PipelineGroupError<D::Error>> {
        let bind_groups: Vec<_> = bind_groups.into_iter().collect();
        let device = self.device;

        try_join_all(
            bind_groups
                .iter()
                .filter(|group| group.group().is_none())
                .map(|group| group.realize(device)),
        )
        .await
        .map_err(PipelineGroupError::Device)?;

        self.bind_groups = bind_groups;
        self.update_pipeline_layout().await
    }

    /// Append vertex attribute objects. They are only inspected when render pipelines are built.
    pub fn add_vertex_attribute_objects(
        &mut self,
        objects: impl IntoIterator<Item = Box<dyn VertexAttributes<D>>>,
    ) {
        self.vertex_attribute_objects.extend(objects);
    }

    pub fn add_vertex_attribute_object(&mut self, object: impl VertexAttributes<D> + 'static) {
        self.vertex_attribute_objects.push(Box::new(object));
    }

    pub fn add_pipeline(&mut self, pipeline: impl Pipeline<D> + 'static) {
        self.pipelines.push(Box::new(pipeline));
    }

    pub fn set_instance_count(&mut self, count: u32) {
        self.instance_count = count;
    }

    pub fn set_vertex_count(&mut self, count: u32) {
        self.vertex_count = count;
    }

    /// Replace the index buffer and realize its GPU buffer.
    pub async fn set_index_buffer(
        &mut self,
        buffer: impl IndexBuffer<D> + 'static,
    ) -> Result<(), PipelineGroupError<D::Error>> {
        let buffer = self.index_buffer.insert(Box::new(buffer));
        buffer
            .realize_gpu_buffer(self.device)
            .await
            .map_err(PipelineGroupError::Device)
    }
}
