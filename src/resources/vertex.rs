use smallvec::SmallVec;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use crate::Device;

/// Describes how one vertex buffer is laid out for a render pipeline's vertex stage.
pub trait VertexAttributes<D: Device> {
    /// `None` until the layout has been derived.
    fn layout(&self) -> Option<D::VertexBufferLayout<'_>>;
}

/// Tightly packed vertex attributes of a single buffer, in the order they were added.
///
/// The layout is unrealized until at least one attribute has been added.
#[derive(Clone, Debug)]
pub struct VertexAttributeObject {
    step_mode: VertexStepMode,
    array_stride: BufferAddress,
    attributes: SmallVec<[VertexAttribute; 8]>,
}

impl VertexAttributeObject {
    pub fn new(step_mode: VertexStepMode) -> Self {
        Self {
            step_mode,
            array_stride: 0,
            attributes: SmallVec::new(),
        }
    }

    pub fn per_vertex() -> Self {
        Self::new(VertexStepMode::Vertex)
    }

    pub fn per_instance() -> Self {
        Self::new(VertexStepMode::Instance)
    }

    /// Append an attribute right after the previous one.
    pub fn attribute(mut self, format: VertexFormat, shader_location: u32) -> Self {
        self.attributes.push(VertexAttribute {
            format,
            offset: self.array_stride,
            shader_location,
        });
        self.array_stride += format.size();
        self
    }

    pub fn array_stride(&self) -> BufferAddress {
        self.array_stride
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }
}

impl VertexAttributes<wgpu::Device> for VertexAttributeObject {
    fn layout(&self) -> Option<VertexBufferLayout<'_>> {
        (!self.attributes.is_empty()).then(|| VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: &self.attributes,
        })
    }
}

#[test]
fn attributes_are_packed_in_order() {
    let object = VertexAttributeObject::per_vertex()
        .attribute(VertexFormat::Float32x3, 0)
        .attribute(VertexFormat::Float32x2, 1)
        .attribute(VertexFormat::Unorm8x4, 2);

    let offsets: Vec<_> = object.attributes().iter().map(|a| a.offset).collect();
    assert_eq!(offsets, [0, 12, 20]);
    assert_eq!(object.array_stride(), 24);

    let layout = VertexAttributes::<wgpu::Device>::layout(&object).unwrap();
    assert_eq!(layout.array_stride, 24);
    assert_eq!(layout.step_mode, VertexStepMode::Vertex);
    assert_eq!(layout.attributes.len(), 3);
}

#[test]
fn empty_object_has_no_layout() {
    let object = VertexAttributeObject::per_instance();
    assert!(VertexAttributes::<wgpu::Device>::layout(&object).is_none());
}
