//! stickmap: schema-driven decoding of raw HID input reports.
//!
//! A [`DeviceDefinition`] describes where a device puts its sticks, buttons and status
//! bytes. The [`DefinitionRegistry`] holds every known definition, [`resolve()`] picks the
//! one matching an attached device, and a [`FrameDecoder`] turns successive reports into
//! [`DeviceEvent`] transitions, published on an [`EventBus`] by a [`Session`].

pub mod backends;
pub mod config;
pub mod decoder;
pub mod definition;
pub mod device;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod logger;
pub mod metadata;
pub mod registry;
pub mod resolve;
pub mod session;
pub mod snapshot;

pub use config::AppConfig;
pub use decoder::{DeviceState, FrameDecoder, StickPosition};
pub use definition::*;
pub use device::*;
pub use error::{Error, Result};
pub use event::*;
pub use eventbus::*;
pub use filtered_listener::FilteredListener;
pub use logger::{JsonLinesListener, TracingListener};
pub use metadata::AttachedDevice;
pub use registry::{DefinitionRegistry, QualifiedId};
pub use resolve::{load, resolve, resolve_and_load, Overrides};
pub use session::{Session, SessionOptions, ShutdownFlag};
pub use snapshot::Snapshot;
