//! Device sessions.
//!
//! A [`Session`] owns everything that lives for as long as one device is connected: the
//! open [`FrameSource`], the [`FrameDecoder`] and its state, and the [`EventBus`] decoded
//! events are published on.
//!
//! The device handle is released exactly once, either by [`Session::close`] or, on every
//! other exit path (early return, `?`, unwinding), by `Drop`.
//!
//! ```no_run
//! use stickmap::backends::virtual_input::VirtualBus;
//! use stickmap::{DefinitionRegistry, Overrides, Session, SessionOptions};
//!
//! # fn main() -> stickmap::Result<()> {
//! let registry = DefinitionRegistry::load_dir("definitions")?;
//! let bus = VirtualBus::new();
//! let mut session = Session::connect(
//!     &registry,
//!     "logitech",
//!     &bus,
//!     Overrides::default(),
//!     SessionOptions::default(),
//! )?;
//! let (_, events) = session.subscribe(stickmap::EventFilter::All, None)?;
//! session.poll_events()?;
//! for ev in events.try_iter() {
//!     println!("{ev}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::decoder::FrameDecoder;
use crate::definition::DeviceDefinition;
use crate::device::{DeviceEnumerator, DeviceOpener, FrameSource};
use crate::error::{Error, Result};
use crate::event::DeviceEvent;
use crate::eventbus::{EventBus, EventFilter, EventListener, Subscription, MAX_LISTENERS_DEFAULT};
use crate::registry::{DefinitionRegistry, QualifiedId};
use crate::resolve::{resolve_and_load, Overrides};
use crate::snapshot::Snapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum number of reports drained per [`Session::poll_events`] call.
///
/// Prevents a chatty device from starving the caller's loop.
const MAX_REPORTS_PER_TICK: usize = 32;

/// Default report buffer size in bytes.
pub const DEFAULT_REPORT_LEN: usize = 64;

#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Size of the read buffer; longer reports are truncated by the source.
    pub report_len: usize,
    pub max_listeners: usize,
    /// Sleep in [`Session::run`] when the source had nothing to deliver.
    pub idle_sleep: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            report_len: DEFAULT_REPORT_LEN,
            max_listeners: MAX_LISTENERS_DEFAULT,
            idle_sleep: Duration::from_millis(5),
        }
    }
}

/// Cooperative stop signal for [`Session::run`]. Clones share the same flag, so one can be
/// handed to a signal handler or another thread.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Session<S: FrameSource> {
    id: QualifiedId,
    source: S,
    decoder: FrameDecoder,
    bus: EventBus,
    buf: Vec<u8>,
    idle_sleep: Duration,
    frames: u64,
    closed: bool,
}

impl<S: FrameSource> Session<S> {
    /// Wrap an already opened source.
    pub fn new(
        id: QualifiedId,
        source: S,
        definition: DeviceDefinition,
        options: SessionOptions,
    ) -> Self {
        info!(
            config = %id,
            device = %source.id(),
            name = source.name(),
            "session opened"
        );
        Self {
            id,
            source,
            decoder: FrameDecoder::new(definition),
            bus: EventBus::with_max_listeners(options.max_listeners),
            buf: vec![0u8; options.report_len],
            idle_sleep: options.idle_sleep,
            frames: 0,
            closed: false,
        }
    }

    /// Resolve `identifier`, load its definition and open the matching device.
    ///
    /// The device opened is the one the definition (after overrides) names.
    pub fn connect<B>(
        registry: &DefinitionRegistry,
        identifier: &str,
        backend: &B,
        overrides: Overrides,
        options: SessionOptions,
    ) -> Result<Self>
    where
        B: DeviceEnumerator + DeviceOpener<Source = S>,
    {
        let (id, definition) = resolve_and_load(registry, identifier, backend, overrides)?;
        let source = backend.open(definition.device_id())?;
        Ok(Self::new(id, source, definition, options))
    }

    pub fn id(&self) -> &QualifiedId {
        &self.id
    }

    pub fn definition(&self) -> &DeviceDefinition {
        self.decoder.definition()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of reports decoded so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn add_listener(
        &mut self,
        listener: impl EventListener + 'static,
        filter: EventFilter,
        field: Option<String>,
    ) -> Result<u64> {
        self.bus.add_listener(listener, filter, field)
    }

    pub fn subscribe(
        &mut self,
        filter: EventFilter,
        field: Option<String>,
    ) -> Result<(u64, Subscription)> {
        self.bus.subscribe(filter, field)
    }

    /// Current field values.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.decoder.state().clone())
    }

    /// Forget cached field values (e.g. after the device reports a reconnect).
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// Decode one report, publish its events and return them.
    ///
    /// Malformed reports are returned as errors and leave decoder state untouched.
    pub fn feed(&mut self, frame: &[u8]) -> Result<Vec<DeviceEvent>> {
        let events = self.decoder.on_frame(frame)?;
        self.frames += 1;
        self.bus.emit_all(&events);
        Ok(events)
    }

    /// Drain up to [`MAX_REPORTS_PER_TICK`] reports from the source, publish the resulting
    /// events and return them.
    ///
    /// Malformed reports are logged and skipped; source errors are returned.
    pub fn poll_events(&mut self) -> Result<Vec<DeviceEvent>> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        let mut out = Vec::new();
        for _ in 0..MAX_REPORTS_PER_TICK {
            let Some(n) = self.source.read_frame(&mut self.buf)? else {
                break;
            };
            match self.decoder.on_frame(&self.buf[..n]) {
                Ok(events) => {
                    self.frames += 1;
                    self.bus.emit_all(&events);
                    out.extend(events);
                }
                Err(err @ Error::MalformedFrame { .. }) => {
                    warn!(config = %self.id, error = %err, "skipping report");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(out)
    }

    /// Poll until `shutdown` is triggered or the source fails.
    ///
    /// Returns the number of reports decoded during this call.
    pub fn run(&mut self, shutdown: &ShutdownFlag) -> Result<u64> {
        self.run_until(shutdown, None)
    }

    /// Like [`run`](Self::run), but also stops once the session has decoded `max_frames`
    /// reports in total.
    pub fn run_until(&mut self, shutdown: &ShutdownFlag, max_frames: Option<u64>) -> Result<u64> {
        let start = self.frames;
        while !shutdown.is_triggered() {
            if max_frames.is_some_and(|limit| self.frames >= limit) {
                debug!(config = %self.id, frames = self.frames, "frame limit reached");
                return Ok(self.frames - start);
            }
            let before = self.frames;
            self.poll_events()?;
            if self.frames == before && !self.idle_sleep.is_zero() {
                std::thread::sleep(self.idle_sleep);
            }
        }
        debug!(config = %self.id, "shutdown requested");
        Ok(self.frames - start)
    }

    /// Release the device handle now.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.source.close();
        info!(config = %self.id, frames = self.frames, "session closed");
    }
}

impl<S: FrameSource> Drop for Session<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualDevice;
    use crate::definition::ButtonConfig;
    use crate::device::DeviceId;

    fn definition() -> DeviceDefinition {
        DeviceDefinition {
            name: None,
            vendor_id: 1,
            product_id: 2,
            joysticks: vec![],
            buttons: vec![ButtonConfig {
                name: "fire".into(),
                pin: 4,
                value: 1,
            }],
            statuses: vec![],
        }
    }

    fn session(frames: Vec<Vec<u8>>) -> Session<VirtualDevice> {
        let dev = VirtualDevice::with_frames(DeviceId::new(1, 2), "pad", frames);
        Session::new(
            QualifiedId::new("acme", "pad"),
            dev,
            definition(),
            SessionOptions::default(),
        )
    }

    #[test]
    fn poll_skips_malformed_reports() {
        let mut s = session(vec![vec![0, 0, 0, 0, 1], vec![0, 0], vec![0, 0, 0, 0, 0]]);
        let events = s.poll_events().unwrap();
        assert_eq!(
            events,
            vec![
                DeviceEvent::ButtonPressed {
                    name: "fire".into(),
                },
                DeviceEvent::ButtonReleased {
                    name: "fire".into(),
                },
            ]
        );
        assert_eq!(s.frames(), 2);
        assert!(!s.snapshot().button("fire"));
    }

    #[test]
    fn drop_closes_source() {
        let s = session(vec![]);
        let feed = s.source().feed();
        assert!(!feed.is_closed());
        drop(s);
        assert!(feed.is_closed());
    }

    #[test]
    fn explicit_close_releases_once() {
        let s = session(vec![]);
        let feed = s.source().feed();
        s.close();
        assert!(feed.is_closed());
    }

    #[test]
    fn run_stops_when_flag_is_triggered() {
        let mut s = session(vec![vec![0, 0, 0, 0, 1]]);
        let flag = ShutdownFlag::new();
        flag.trigger();
        assert_eq!(s.run(&flag).unwrap(), 0);
        assert_eq!(s.source().feed().pending(), 1);
    }

    #[test]
    fn run_until_stops_at_frame_limit() {
        let mut s = session(vec![vec![0, 0, 0, 0, 1]; 40]);
        let flag = ShutdownFlag::new();
        // The limit is checked between ticks, so one tick can overshoot it.
        assert_eq!(s.run_until(&flag, Some(3)).unwrap(), 32);
        assert_eq!(s.run_until(&flag, Some(3)).unwrap(), 0);
        assert_eq!(s.run_until(&flag, Some(40)).unwrap(), 8);
        assert_eq!(s.source().feed().pending(), 0);
    }

    #[test]
    fn feed_publishes_and_rejects_short_reports() {
        let mut s = session(vec![]);
        let (_, rx) = s.subscribe(EventFilter::All, None).unwrap();

        let events = s.feed(&[0, 0, 0, 0, 1]).unwrap();
        assert_eq!(events, rx.try_iter().collect::<Vec<_>>());
        assert_eq!(s.frames(), 1);

        let err = s.feed(&[0, 0]).unwrap_err();
        assert!(matches!(err, Error::MalformedFrame { pin: 4, len: 2 }));
        assert_eq!(s.frames(), 1);
        assert!(s.snapshot().button("fire"));
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn reset_reports_held_button_again() {
        let mut s = session(vec![]);
        let pressed = vec![DeviceEvent::ButtonPressed {
            name: "fire".into(),
        }];
        assert_eq!(s.feed(&[0, 0, 0, 0, 1]).unwrap(), pressed);
        assert!(s.feed(&[0, 0, 0, 0, 1]).unwrap().is_empty());

        s.reset();
        assert!(s.snapshot().0.is_empty());
        assert_eq!(s.feed(&[0, 0, 0, 0, 1]).unwrap(), pressed);
    }

    #[test]
    fn bus_mut_controls_listeners() {
        let mut s = session(vec![]);
        let (id, rx) = s.subscribe(EventFilter::All, None).unwrap();
        s.bus_mut().disable(id);
        s.feed(&[0, 0, 0, 0, 1]).unwrap();
        assert_eq!(rx.try_iter().count(), 0);

        s.bus_mut().enable(id);
        s.feed(&[0, 0, 0, 0, 0]).unwrap();
        assert_eq!(rx.try_iter().count(), 1);
        assert!(s.bus_mut().remove_listener(id));
    }

    #[test]
    fn run_propagates_source_errors() {
        let mut s = session(vec![vec![0, 0, 0, 0, 1]]);
        let feed = s.source().feed();
        // Closing the feed out from under the session makes the next read fail.
        let mut other = VirtualDevice::new(DeviceId::new(1, 2), "pad", feed);
        other.close();
        assert!(matches!(
            s.run(&ShutdownFlag::new()),
            Err(Error::SessionClosed)
        ));
    }
}
