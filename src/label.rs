use crate::Device;

/// Something with an optional debug name, used when naming device objects and in errors.
pub trait Labeled {
    fn label(&self) -> Option<&str>;

    fn label_or_default(&self) -> &str {
        self.label().unwrap_or("unlabeled")
    }
}

/// Something that creates its GPU objects against a single device.
pub trait DeviceBound<D: Device> {
    fn device(&self) -> &D;
}
