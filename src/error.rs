//! Error type shared by the registry, resolver, decoder and backends.
//!
//! The configuration errors ([`Error::ConfigurationNotFound`], [`Error::DeviceNotDetected`],
//! [`Error::DefinitionNotFound`]) are fatal for device setup: retrying them without a change in
//! attached hardware or installed definitions cannot succeed.
//!
//! [`Error::MalformedFrame`] is per-frame. A session logs it and moves on to the next report.

use crate::device::DeviceId;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No definitions are registered under this vendor name.
    #[error("no configurations found for vendor `{vendor}`")]
    ConfigurationNotFound { vendor: String },

    /// None of the attached devices matches a definition of this vendor.
    #[error("no attached device matches any `{vendor}` configuration")]
    DeviceNotDetected { vendor: String },

    /// The qualified `<vendor>/<configuration>` id is not in the registry.
    #[error("device definition `{id}` not found")]
    DefinitionNotFound { id: String },

    /// A pin referenced by the definition lies beyond the end of the frame.
    #[error("frame too short: pin {pin} out of range for {len}-byte frame")]
    MalformedFrame { pin: usize, len: usize },

    #[error("invalid definition `{id}`: {reason}")]
    InvalidDefinition { id: String, reason: String },

    #[error("invalid device identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("listener limit reached ({max})")]
    TooManyListeners { max: usize },

    #[error("cannot open device {device}: {reason}")]
    OpenFailed { device: DeviceId, reason: String },

    #[error("session is closed")]
    SessionClosed,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(feature = "hid")]
    #[error("hid: {0}")]
    Hid(#[from] hidapi::HidError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
