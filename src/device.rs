//! Device identity and the I/O seams the decoder is driven through.
//!
//! The crate does not talk to hardware directly. Backends implement:
//! - [`DeviceEnumerator`]: list what is currently attached,
//! - [`DeviceOpener`]: open a [`FrameSource`] for one vendor/product pair,
//! - [`FrameSource`]: hand out raw reports one at a time.

use crate::error::Result;
use crate::metadata::AttachedDevice;
use serde::{Deserialize, Serialize};
use std::fmt;

/// USB vendor/product pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceId {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// A source of raw input reports for one open device.
///
/// Implementations own the underlying handle. [`close`](FrameSource::close) must be
/// idempotent; [`Session`](crate::session::Session) calls it on explicit close and again
/// from `Drop`.
pub trait FrameSource {
    /// Read one report into `buf`.
    ///
    /// Returns `Ok(Some(n))` for an `n`-byte report, `Ok(None)` if nothing arrived this poll.
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Release the underlying handle.
    fn close(&mut self);

    fn name(&self) -> &str;

    fn id(&self) -> DeviceId;
}

/// Lists devices currently attached to the host.
pub trait DeviceEnumerator {
    fn attached(&self) -> Result<Vec<AttachedDevice>>;

    /// Vendor/product pairs of [`attached`](DeviceEnumerator::attached), in enumeration order.
    fn attached_ids(&self) -> Result<Vec<DeviceId>> {
        Ok(self.attached()?.iter().map(AttachedDevice::id).collect())
    }
}

/// Opens a frame source for a vendor/product pair.
pub trait DeviceOpener {
    type Source: FrameSource;

    fn open(&self, id: DeviceId) -> Result<Self::Source>;
}
