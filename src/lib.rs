//! Build groups of wgpu render and compute pipelines that share one pipeline layout.
//!
//! A [`PipelineGroup`] owns a set of [`Pipeline`]s together with the vertex attribute objects
//! and index buffer they draw with. Its pipeline layout is derived from the [`BindGroup`]s it is
//! given, and [`PipelineGroup::build()`] realizes every pipeline against that layout once all of
//! their prerequisites are in place.
//!
//! Everything the group talks to is reached through traits: [`Device`] for the GPU, and
//! [`BindGroup`], [`Pipeline`], [`VertexAttributes`] and [`IndexBuffer`] for the objects it
//! coordinates. [`wgpu::Device`] implements [`Device`], and [`BufferBindGroup`],
//! [`ShaderPipeline`], [`VertexAttributeObject`] and [`IndexData`] are ready-made wgpu
//! implementations of the rest.

pub use prelude::*;

mod device;
mod error;
mod group;
mod label;
mod prelude;
mod resources;

#[cfg(test)]
mod testing;
