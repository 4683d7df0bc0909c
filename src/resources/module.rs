use std::borrow::Cow;
use std::path::PathBuf;

use wgpu::{Label, ShaderModuleDescriptor};

use crate::device::{scoped, BackendError};

/// Where a pipeline's shader code comes from.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum ShaderSource {
    Wgsl(Cow<'static, str>),
    WgslFilePath(PathBuf),
    SpirvFilePath(PathBuf),
}

impl ShaderSource {
    pub fn wgsl(source: impl Into<Cow<'static, str>>) -> Self {
        ShaderSource::Wgsl(source.into())
    }

    pub fn wgsl_file_path(path: impl Into<PathBuf>) -> Self {
        ShaderSource::WgslFilePath(path.into())
    }

    pub fn spirv_file_path(path: impl Into<PathBuf>) -> Self {
        ShaderSource::SpirvFilePath(path.into())
    }
}

/// Load `source` and create a shader module from it, reporting compilation failures as errors.
pub async fn module_from_source(
    device: &wgpu::Device,
    source: &ShaderSource,
    label: Label<'_>,
) -> Result<wgpu::ShaderModule, BackendError> {
    let source = match source {
        ShaderSource::Wgsl(source) => wgpu::ShaderSource::Wgsl(source.clone()),
        ShaderSource::WgslFilePath(path) => {
            let bytes = std::fs::read(path)?;
            let source = std::str::from_utf8(&bytes[..])?;
            wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_string()))
        }
        ShaderSource::SpirvFilePath(path) => {
            let bytes = std::fs::read(path)?;
            match wgpu::util::make_spirv(&bytes[..]) {
                wgpu::ShaderSource::SpirV(words) => {
                    wgpu::ShaderSource::SpirV(Cow::Owned(words.into_owned()))
                }
                _ => unreachable!("`make_spirv` only produces SPIR-V sources"),
            }
        }
    };

    scoped(device, |device| {
        device.create_shader_module(ShaderModuleDescriptor { label, source })
    })
    .await
}

#[test]
fn missing_wgsl_file_is_an_io_error() {
    let Some((device, _queue)) = crate::testing::wgpu_device() else {
        return;
    };
    let source = ShaderSource::wgsl_file_path("shaders/does-not-exist.wgsl");

    let result = futures_lite::future::block_on(module_from_source(&device, &source, None));

    assert!(matches!(
        result,
        Err(BackendError::Io(ref err)) if err.kind() == std::io::ErrorKind::NotFound
    ));
}

#[test]
fn wgsl_file_must_be_utf8() {
    let Some((device, _queue)) = crate::testing::wgpu_device() else {
        return;
    };
    let path = std::env::temp_dir().join("rending_group_not_utf8.wgsl");
    std::fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();

    let result = futures_lite::future::block_on(module_from_source(
        &device,
        &ShaderSource::wgsl_file_path(&path),
        None,
    ));

    assert!(matches!(result, Err(BackendError::Utf8(_))));
    let _ = std::fs::remove_file(path);
}

#[test]
fn invalid_wgsl_is_rejected_by_the_device() {
    let Some((device, _queue)) = crate::testing::wgpu_device() else {
        return;
    };
    let source = ShaderSource::wgsl("fn main( {");

    let result =
        futures_lite::future::block_on(module_from_source(&device, &source, Some("broken")));

    assert!(matches!(result, Err(BackendError::Wgpu(_))));
}
