pub use crate::device::{BackendError, Device};
pub use crate::error::PipelineGroupError;
pub use crate::group::{PipelineGroup, PipelineGroupBuilder, SharedBindGroup, DEFAULT_GROUP_LABEL};
pub use crate::label::{DeviceBound, Labeled};
pub use crate::resources::{
    module_from_source, BindGroup, BufferBindGroup, GpuPipeline, IndexBuffer, IndexData,
    Pipeline, PipelineKind, ShaderPipeline, ShaderSource, VertexAttributeObject,
    VertexAttributes,
};
