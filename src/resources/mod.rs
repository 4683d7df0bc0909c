pub use self::bindgroup::{BindGroup, BufferBindGroup};
pub use self::buffer::{IndexBuffer, IndexData};
pub use self::module::{module_from_source, ShaderSource};
pub use self::pipeline::{GpuPipeline, Pipeline, PipelineKind, ShaderPipeline};
pub use self::vertex::{VertexAttributeObject, VertexAttributes};

mod bindgroup;
mod buffer;
mod module;
mod pipeline;
mod vertex;
