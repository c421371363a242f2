//! In-memory device backend.
//!
//! [`VirtualBus`] pretends to be the host's device list; [`VirtualDevice`] is a
//! [`FrameSource`] that hands out frames pushed through a [`VirtualFeed`]. Useful for tests,
//! demos and replaying captured reports.

use crate::device::{DeviceEnumerator, DeviceId, DeviceOpener, FrameSource};
use crate::error::{Error, Result};
use crate::metadata::AttachedDevice;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Shared {
    frames: VecDeque<Vec<u8>>,
    closed: bool,
}

/// Producer side of a virtual device. Cloneable; all clones feed the same queue.
#[derive(Clone, Debug, Default)]
pub struct VirtualFeed {
    shared: Arc<Mutex<Shared>>,
}

impl VirtualFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue one raw frame.
    pub fn push(&self, frame: impl Into<Vec<u8>>) {
        self.lock().frames.push_back(frame.into());
    }

    pub fn pending(&self) -> usize {
        self.lock().frames.len()
    }

    /// `true` once the consuming [`VirtualDevice`] has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// Consumer side of a virtual device.
#[derive(Debug)]
pub struct VirtualDevice {
    id: DeviceId,
    name: String,
    feed: VirtualFeed,
}

impl VirtualDevice {
    pub fn new(id: DeviceId, name: &str, feed: VirtualFeed) -> Self {
        Self {
            id,
            name: name.to_string(),
            feed,
        }
    }

    /// Device preloaded with `frames`.
    pub fn with_frames<I, F>(id: DeviceId, name: &str, frames: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Vec<u8>>,
    {
        let feed = VirtualFeed::new();
        for frame in frames {
            feed.push(frame);
        }
        Self::new(id, name, feed)
    }

    pub fn feed(&self) -> VirtualFeed {
        self.feed.clone()
    }
}

impl FrameSource for VirtualDevice {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let mut shared = self.feed.lock();
        if shared.closed {
            return Err(Error::SessionClosed);
        }
        let Some(frame) = shared.frames.pop_front() else {
            return Ok(None);
        };
        // Longer frames are truncated to the buffer, like a short HID read.
        let n = frame.len().min(buf.len());
        buf[..n].copy_from_slice(&frame[..n]);
        Ok(Some(n))
    }

    fn close(&mut self) {
        self.feed.lock().closed = true;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> DeviceId {
        self.id
    }
}

/// A fake host: a list of attached devices, each backed by a [`VirtualFeed`].
#[derive(Clone, Debug, Default)]
pub struct VirtualBus {
    devices: Vec<(AttachedDevice, VirtualFeed)>,
}

impl VirtualBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device and return the feed used to push its frames.
    pub fn attach(&mut self, device: AttachedDevice) -> VirtualFeed {
        let feed = VirtualFeed::new();
        self.devices.push((device, feed.clone()));
        feed
    }

    /// Detach every device with this id.
    pub fn detach(&mut self, id: DeviceId) {
        self.devices.retain(|(dev, _)| dev.id() != id);
    }
}

impl DeviceEnumerator for VirtualBus {
    fn attached(&self) -> Result<Vec<AttachedDevice>> {
        Ok(self.devices.iter().map(|(dev, _)| dev.clone()).collect())
    }
}

impl DeviceOpener for VirtualBus {
    type Source = VirtualDevice;

    fn open(&self, id: DeviceId) -> Result<VirtualDevice> {
        let (dev, feed) = self
            .devices
            .iter()
            .find(|(dev, _)| dev.id() == id)
            .ok_or_else(|| Error::OpenFailed {
                device: id,
                reason: "not attached".into(),
            })?;
        let name = dev.product_string.as_deref().unwrap_or("Virtual Device");
        Ok(VirtualDevice::new(id, name, feed.clone()))
    }
}
