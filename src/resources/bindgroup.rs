use std::borrow::Cow;
use std::cell::OnceCell;

use futures::future::{FutureExt, LocalBoxFuture};
use wgpu::{
    BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, Buffer, BufferBindingType, ShaderStages,
};

use crate::device::{scoped, BackendError};
use crate::{Device, Labeled};

/// A bundle of GPU resources exposed to shaders at a single bind group index.
///
/// `layout()` and `group()` stay `None` until [`realize()`](BindGroup::realize) has completed.
/// Realization goes through `&self` because a bind group can be shared between several pipeline
/// groups; implementors keep their realized handles behind something like a [`OnceCell`].
pub trait BindGroup<D: Device> {
    /// The index this group is bound at. Groups are ordered by it in a pipeline layout.
    fn index(&self) -> u32;

    fn layout(&self) -> Option<&D::BindGroupLayout>;

    fn group(&self) -> Option<&D::BindGroup>;

    fn realize<'a>(&'a self, device: &'a D) -> LocalBoxFuture<'a, Result<(), D::Error>>;
}

/// A bind group made of whole-buffer bindings, created on the first [`BindGroup::realize()`].
#[derive(Debug)]
pub struct BufferBindGroup {
    label: Option<Cow<'static, str>>,
    index: u32,
    visibility: ShaderStages,
    entries: Vec<(u32, BufferBindingType, Buffer)>,
    layout: OnceCell<wgpu::BindGroupLayout>,
    group: OnceCell<wgpu::BindGroup>,
}

impl BufferBindGroup {
    pub fn new(index: u32, visibility: ShaderStages) -> Self {
        Self {
            label: None,
            index,
            visibility,
            entries: vec![],
            layout: OnceCell::new(),
            group: OnceCell::new(),
        }
    }

    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn uniform(self, binding: u32, buffer: Buffer) -> Self {
        self.buffer(binding, BufferBindingType::Uniform, buffer)
    }

    pub fn storage(self, binding: u32, buffer: Buffer, read_only: bool) -> Self {
        self.buffer(binding, BufferBindingType::Storage { read_only }, buffer)
    }

    /// Bind `buffer` at `binding`. Has no effect on the GPU objects once the group is realized.
    pub fn buffer(mut self, binding: u32, ty: BufferBindingType, buffer: Buffer) -> Self {
        self.entries.push((binding, ty, buffer));
        self
    }

    pub fn buffers(&self) -> impl Iterator<Item = (u32, &Buffer)> {
        self.entries
            .iter()
            .map(|(binding, _, buffer)| (*binding, buffer))
    }
}

impl Labeled for BufferBindGroup {
    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl BindGroup<wgpu::Device> for BufferBindGroup {
    fn index(&self) -> u32 {
        self.index
    }

    fn layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.layout.get()
    }

    fn group(&self) -> Option<&wgpu::BindGroup> {
        self.group.get()
    }

    fn realize<'a>(
        &'a self,
        device: &'a wgpu::Device,
    ) -> LocalBoxFuture<'a, Result<(), BackendError>> {
        async move {
            let layout_entries: Vec<_> = self
                .entries
                .iter()
                .map(|&(binding, ty, _)| BindGroupLayoutEntry {
                    binding,
                    visibility: self.visibility,
                    ty: BindingType::Buffer {
                        ty,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                })
                .collect();

            let label = self.label.as_deref();
            let (layout, group) = scoped(device, |device| {
                let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                    label,
                    entries: &layout_entries[..],
                });

                let entries: Vec<_> = self
                    .entries
                    .iter()
                    .map(|(binding, _, buffer)| BindGroupEntry {
                        binding: *binding,
                        resource: buffer.as_entire_binding(),
                    })
                    .collect();

                let group = device.create_bind_group(&BindGroupDescriptor {
                    label,
                    layout: &layout,
                    entries: &entries[..],
                });

                (layout, group)
            })
            .await?;

            log::trace!(
                "realized bind group `{}` at index {}",
                self.label_or_default(),
                self.index
            );

            // A concurrent realization of the same group may have won; keep its handles.
            let _ = self.layout.set(layout);
            let _ = self.group.set(group);
            Ok(())
        }
        .boxed_local()
    }
}

#[test]
fn buffer_bind_group_realizes_its_layout_and_group() {
    use crate::testing::{wgpu_buffer, wgpu_device};

    let Some((device, _queue)) = wgpu_device() else {
        return;
    };
    let group = BufferBindGroup::new(2, ShaderStages::COMPUTE)
        .label("particles")
        .uniform(0, wgpu_buffer(&device, wgpu::BufferUsages::UNIFORM))
        .storage(1, wgpu_buffer(&device, wgpu::BufferUsages::STORAGE), true);

    let bindings: Vec<_> = group.buffers().map(|(binding, _)| binding).collect();
    assert_eq!(bindings, [0, 1]);
    assert!(group.group().is_none());

    futures_lite::future::block_on(group.realize(&device)).unwrap();

    assert_eq!(group.index(), 2);
    assert!(group.layout().is_some());
    assert!(group.group().is_some());
}

#[test]
fn realized_buffer_groups_build_a_pipeline_layout() {
    use std::rc::Rc;

    use crate::testing::{wgpu_buffer, wgpu_device};
    use crate::{PipelineGroup, SharedBindGroup};

    let Some((device, _queue)) = wgpu_device() else {
        return;
    };
    let bind_groups: Vec<SharedBindGroup<wgpu::Device>> = [1, 0]
        .into_iter()
        .map(|index| {
            let buffer = wgpu_buffer(&device, wgpu::BufferUsages::UNIFORM);
            Rc::new(BufferBindGroup::new(index, ShaderStages::VERTEX).uniform(0, buffer))
                as SharedBindGroup<wgpu::Device>
        })
        .collect();
    let mut group = PipelineGroup::builder(&device, 3).label("shared").finish();

    futures_lite::future::block_on(group.set_bind_groups(bind_groups)).unwrap();

    assert!(group.pipeline_layout().is_some());
    assert!(group.bind_groups().iter().all(|bind_group| bind_group.group().is_some()));
}
