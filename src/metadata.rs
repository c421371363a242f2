//! Attached-device metadata.
//!
//! [`AttachedDevice`] is a lightweight, cloneable description of one enumerated device.
//! Backends populate what they know; unknown fields remain `None`.
//!
//! ## Persistence notes
//! - `vendor_id`/`product_id` are what definitions are matched on.
//! - `path` is platform-specific and may change across ports and reconnects; treat it as
//!   diagnostic only.

use crate::device::DeviceId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedDevice {
    /// USB Vendor ID (VID).
    pub vendor_id: u16,

    /// USB Product ID (PID).
    pub product_id: u16,

    /// Human-readable product name from the driver/firmware.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_string: Option<String>,

    /// Device serial number supplied by firmware/OS, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    /// OS/topological path to the device. Opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl AttachedDevice {
    pub fn new(id: DeviceId) -> Self {
        Self {
            vendor_id: id.vendor_id,
            product_id: id.product_id,
            product_string: None,
            serial_number: None,
            path: None,
        }
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product_string = Some(product.into());
        self
    }

    pub fn id(&self) -> DeviceId {
        DeviceId::new(self.vendor_id, self.product_id)
    }
}

impl fmt::Display for AttachedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.id(),
            self.product_string.as_deref().unwrap_or("Unknown")
        )
    }
}
