use std::fmt;

use crate::error::{Result, TensorError};

/// The kind of accelerator runtime a device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Apple Metal GPU.
    Metal,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Metal => write!(f, "metal"),
        }
    }
}

/// An opaque handle for a physical accelerator device.
///
/// Enumerated once at startup and passed around by value; never re-queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Index within the enumeration order.
    pub index: usize,
    /// Which accelerator runtime reported this device.
    pub kind: DeviceKind,
    /// Human-readable device name as reported by the runtime.
    pub name: String,
}

impl DeviceDescriptor {
    pub fn new(index: usize, kind: DeviceKind, name: impl Into<String>) -> Self {
        DeviceDescriptor {
            index,
            kind,
            name: name.into(),
        }
    }
}

/// Enumerate the accelerator devices visible to this process.
///
/// Queries each compiled-in accelerator runtime once and collects whatever
/// it reports. With no accelerator features enabled the list is empty.
/// Callers hold on to the returned list and pass it explicitly to
/// [`first_accelerator`]; nothing here is cached or re-queried.
pub fn enumerate_accelerators() -> Vec<DeviceDescriptor> {
    #[allow(unused_mut)]
    let mut devices = Vec::new();

    #[cfg(feature = "metal")]
    if let Some(desc) = crate::metal::system_default_device(devices.len()) {
        devices.push(desc);
    }

    devices
}

/// Returns the first device from an enumeration result.
///
/// An empty list is reported as [`TensorError::NoAccelerator`] rather than
/// panicking on an out-of-range index.
pub fn first_accelerator(devices: &[DeviceDescriptor]) -> Result<&DeviceDescriptor> {
    devices.first().ok_or(TensorError::NoAccelerator)
}
