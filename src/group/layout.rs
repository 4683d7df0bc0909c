use smallvec::SmallVec;

use super::{PipelineGroup, DEFAULT_GROUP_LABEL};
use crate::{Device, PipelineGroupError};

impl<'d, D: Device> PipelineGroup<'d, D> {
    /// Rebuild the pipeline layout from the current bind groups, ordered by binding index.
    ///
    /// The previous layout is dropped before anything is checked, so a failure here leaves the
    /// group without a layout rather than with one that no longer matches its bind groups.
    pub async fn update_pipeline_layout(&mut self) -> Result<(), PipelineGroupError<D::Error>> {
        self.pipeline_layout = None;

        let mut sorted: SmallVec<[_; 4]> = self.bind_groups.iter().collect();
        sorted.sort_by_key(|group| group.index());

        let bind_group_layouts = sorted
            .iter()
            .map(|group| {
                group
                    .layout()
                    .ok_or(PipelineGroupError::MissingBindGroupLayout {
                        index: group.index(),
                    })
            })
            .collect::<Result<SmallVec<[_; 4]>, _>>()?;

        let label = self.layout_label();
        let layout = self
            .device
            .create_pipeline_layout(&label, &bind_group_layouts)
            .await
            .map_err(PipelineGroupError::Device)?;

        log::debug!(
            "built pipeline layout `{label}` from bind groups {:?}",
            sorted.iter().map(|group| group.index()).collect::<Vec<_>>()
        );

        self.pipeline_layout = Some(layout);
        Ok(())
    }

    pub(crate) fn layout_label(&self) -> String {
        format!(
            "{} pipeline layout",
            self.label.as_deref().unwrap_or(DEFAULT_GROUP_LABEL)
        )
    }
}
