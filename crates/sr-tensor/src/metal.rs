// Metal accelerator runtime queries (macOS only).

use crate::device::{DeviceDescriptor, DeviceKind};

/// Ask the Metal runtime for the system default GPU.
///
/// Returns a descriptor carrying the device name the runtime reports
/// (e.g. "Apple M2 Max"), or `None` when no Metal device exists.
pub fn system_default_device(index: usize) -> Option<DeviceDescriptor> {
    use objc2_metal::{MTLCreateSystemDefaultDevice, MTLDevice};

    let device = MTLCreateSystemDefaultDevice()?;
    let name = device.name().to_string();
    Some(DeviceDescriptor::new(index, DeviceKind::Metal, name))
}
