//! Device backends.
//!
//! Implementations of [`DeviceEnumerator`](crate::device::DeviceEnumerator),
//! [`DeviceOpener`](crate::device::DeviceOpener) and
//! [`FrameSource`](crate::device::FrameSource).
//!
//! # Feature flags
//! - **`hid`**: enables the `hidapi` backend.
//!
//! The virtual backend is always available.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

pub mod virtual_input;
