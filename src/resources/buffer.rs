use std::borrow::Cow;

use futures::future::{FutureExt, LocalBoxFuture};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{BufferUsages, IndexFormat};

use crate::device::{scoped, BackendError};
use crate::{Device, Labeled};

/// Index data that is uploaded to the GPU on demand.
pub trait IndexBuffer<D: Device> {
    fn realize_gpu_buffer<'a>(&'a mut self, device: &'a D)
        -> LocalBoxFuture<'a, Result<(), D::Error>>;

    /// `None` until [`realize_gpu_buffer()`](IndexBuffer::realize_gpu_buffer) has completed.
    fn gpu_buffer(&self) -> Option<&D::Buffer>;

    fn index_count(&self) -> u32;
}

/// CPU-side `u16` or `u32` indices and, once realized, the buffer holding them.
#[derive(Debug)]
pub struct IndexData {
    label: Option<Cow<'static, str>>,
    format: IndexFormat,
    count: u32,
    bytes: Vec<u8>,
    buffer: Option<wgpu::Buffer>,
}

impl IndexData {
    pub fn from_u16(indices: &[u16]) -> Self {
        Self::from_bytes(IndexFormat::Uint16, indices.len(), bytemuck::cast_slice(indices))
    }

    pub fn from_u32(indices: &[u32]) -> Self {
        Self::from_bytes(IndexFormat::Uint32, indices.len(), bytemuck::cast_slice(indices))
    }

    fn from_bytes(format: IndexFormat, count: usize, bytes: &[u8]) -> Self {
        Self {
            label: None,
            format,
            count: u32::try_from(count).expect("index count should fit in a u32"),
            bytes: bytes.to_vec(),
            buffer: None,
        }
    }

    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }
}

impl Labeled for IndexData {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl IndexBuffer<wgpu::Device> for IndexData {
    fn realize_gpu_buffer<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
    ) -> LocalBoxFuture<'a, Result<(), BackendError>> {
        async move {
            let buffer = scoped(device, |device| {
                device.create_buffer_init(&BufferInitDescriptor {
                    label: self.label.as_deref(),
                    contents: &self.bytes[..],
                    usage: BufferUsages::INDEX | BufferUsages::COPY_DST,
                })
            })
            .await?;

            log::trace!(
                "realized index buffer `{}` with {} indices",
                self.label_or_default(),
                self.count
            );

            self.buffer = Some(buffer);
            Ok(())
        }
        .boxed_local()
    }

    fn gpu_buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    fn index_count(&self) -> u32 {
        self.count
    }
}

#[test]
fn index_data_keeps_format_and_count() {
    let data = IndexData::from_u16(&[0, 1, 2, 2, 1, 3]);
    assert_eq!(data.format(), IndexFormat::Uint16);
    assert_eq!(IndexBuffer::<wgpu::Device>::index_count(&data), 6);
    assert_eq!(data.bytes.len(), 12);

    let data = IndexData::from_u32(&[7, 8, 9]).label("tri");
    assert_eq!(data.format(), IndexFormat::Uint32);
    assert_eq!(data.bytes.len(), 12);
    assert_eq!(Labeled::label(&data), Some("tri"));
}
