use thiserror::Error;

/// The ways building a [`PipelineGroup`](crate::PipelineGroup) can fail.
///
/// `E` is the error type of the [`Device`](crate::Device) in use. Failures reported by the device
/// or by a collaborator's own realization are carried unchanged in [`PipelineGroupError::Device`].
#[derive(Debug, Error)]
pub enum PipelineGroupError<E> {
    #[error("bind group at binding index {index} has no realized layout")]
    MissingBindGroupLayout { index: u32 },
    #[error("pipeline layout has not been built; call `set_bind_groups` before building")]
    PipelineLayoutNotBuilt,
    #[error("pipeline `{label}` finished building without setting its shader module")]
    ShaderModuleNotSet { label: String },
    #[error("vertex attribute object {position} has no realized vertex buffer layout")]
    VertexAttributeLayoutNotSet { position: usize },
    #[error(transparent)]
    Device(E),
}
