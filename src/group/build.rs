use futures::future::try_join_all;

use super::{PipelineGroup, DEFAULT_GROUP_LABEL};
use crate::resources::{GpuPipeline, Pipeline, PipelineKind, VertexAttributes};
use crate::{Device, PipelineGroupError};

impl<'d, D: Device> PipelineGroup<'d, D> {
    /// Build and realize every pipeline of the group.
    ///
    /// [`set_bind_groups()`](PipelineGroup::set_bind_groups) must have succeeded first, even for
    /// a group without bind groups. The first failure of any pipeline is returned; pipelines that
    /// were realized before it keep their GPU pipelines, but the group should be considered
    /// unusable.
    pub async fn build(&mut self) -> Result<(), PipelineGroupError<D::Error>> {
        self.build_pipelines().await
    }

    pub async fn build_pipelines(&mut self) -> Result<(), PipelineGroupError<D::Error>> {
        let Self {
            device,
            label,
            pipelines,
            pipeline_layout,
            vertex_attribute_objects,
            ..
        } = self;

        let label = label.as_deref().unwrap_or(DEFAULT_GROUP_LABEL);
        log::debug!("building {} pipelines of `{label}`", pipelines.len());

        let device = *device;
        let layout = pipeline_layout.as_ref();
        let vertex_attribute_objects = &vertex_attribute_objects[..];

        try_join_all(pipelines.iter_mut().map(|pipeline| {
            build_pipeline(device, &mut **pipeline, layout, vertex_attribute_objects)
        }))
        .await?;

        log::debug!("built all pipelines of `{label}`");
        Ok(())
    }
}

async fn build_pipeline<D, P>(
    device: &D,
    pipeline: &mut P,
    layout: Option<&D::PipelineLayout>,
    vertex_attribute_objects: &[Box<dyn VertexAttributes<D>>],
) -> Result<(), PipelineGroupError<D::Error>>
where
    D: Device,
    P: Pipeline<D> + ?Sized,
{
    pipeline
        .build(device)
        .await
        .map_err(PipelineGroupError::Device)?;

    let layout = layout.ok_or(PipelineGroupError::PipelineLayoutNotBuilt)?;

    if pipeline.shader_module().is_none() {
        return Err(PipelineGroupError::ShaderModuleNotSet {
            label: pipeline.label_or_default().to_string(),
        });
    }

    let realized = match pipeline.kind() {
        PipelineKind::Render => {
            let vertex_layouts = vertex_attribute_objects
                .iter()
                .enumerate()
                .map(|(position, object)| {
                    object
                        .layout()
                        .ok_or(PipelineGroupError::VertexAttributeLayoutNotSet { position })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let descriptor = pipeline.render_descriptor(&vertex_layouts, layout);
            let realized = device
                .create_render_pipeline(&descriptor)
                .await
                .map_err(PipelineGroupError::Device)?;
            GpuPipeline::Render(realized)
        }
        PipelineKind::Compute => {
            let descriptor = pipeline.compute_descriptor(layout);
            let realized = device
                .create_compute_pipeline(&descriptor)
                .await
                .map_err(PipelineGroupError::Device)?;
            GpuPipeline::Compute(realized)
        }
    };

    log::trace!(
        "realized {:?} pipeline `{}`",
        pipeline.kind(),
        pipeline.label_or_default()
    );

    pipeline.set_gpu_pipeline(realized);
    Ok(())
}
