//! `hidapi` backend.
//!
//! [`HidBackend`] enumerates HID devices attached to the host and opens them by
//! vendor/product id. [`HidFrameSource`] reads input reports with a bounded timeout so a
//! polling loop can notice shutdown requests.
//!
//! Report IDs are not stripped: the frame handed to the decoder is exactly what
//! `hid_read` returned, so definition pins are offsets into that buffer.

use crate::device::{DeviceEnumerator, DeviceId, DeviceOpener, FrameSource};
use crate::error::{Error, Result};
use crate::metadata::AttachedDevice;
use hidapi::{HidApi, HidDevice};
use tracing::{debug, warn};

/// Default read timeout for [`HidFrameSource::read_frame`].
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 10;

pub struct HidBackend {
    api: HidApi,
    read_timeout_ms: i32,
}

impl HidBackend {
    pub fn new() -> Result<Self> {
        Ok(Self {
            api: HidApi::new()?,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        })
    }

    pub fn with_read_timeout(mut self, ms: i32) -> Self {
        self.read_timeout_ms = ms;
        self
    }
}

impl DeviceEnumerator for HidBackend {
    fn attached(&self) -> Result<Vec<AttachedDevice>> {
        let mut out: Vec<AttachedDevice> = Vec::new();
        for info in self.api.device_list() {
            let id = DeviceId::new(info.vendor_id(), info.product_id());
            // One physical device usually exposes several interfaces.
            if out.iter().any(|d| d.id() == id) {
                continue;
            }
            let mut dev = AttachedDevice::new(id);
            dev.product_string = info.product_string().map(str::to_owned);
            dev.serial_number = info.serial_number().map(str::to_owned);
            dev.path = Some(info.path().to_string_lossy().into_owned());
            out.push(dev);
        }
        Ok(out)
    }
}

impl DeviceOpener for HidBackend {
    type Source = HidFrameSource;

    fn open(&self, id: DeviceId) -> Result<HidFrameSource> {
        let raw = self
            .api
            .open(id.vendor_id, id.product_id)
            .map_err(|e| Error::OpenFailed {
                device: id,
                reason: e.to_string(),
            })?;
        let name = match raw.get_product_string() {
            Ok(Some(s)) => s,
            _ => "Unknown".to_string(),
        };
        debug!(device = %id, %name, "opened hid device");
        Ok(HidFrameSource {
            id,
            name,
            raw: Some(raw),
            read_timeout_ms: self.read_timeout_ms,
        })
    }
}

/// An open HID handle. Closing drops the handle; reads afterwards fail.
pub struct HidFrameSource {
    id: DeviceId,
    name: String,
    raw: Option<HidDevice>,
    read_timeout_ms: i32,
}

impl FrameSource for HidFrameSource {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let raw = self.raw.as_ref().ok_or(Error::SessionClosed)?;
        match raw.read_timeout(buf, self.read_timeout_ms) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(n)),
            Err(e) => {
                warn!(device = %self.id, error = %e, "hid read failed");
                Err(e.into())
            }
        }
    }

    fn close(&mut self) {
        if self.raw.take().is_some() {
            debug!(device = %self.id, "closed hid device");
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> DeviceId {
        self.id
    }
}
