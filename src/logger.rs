use crate::event::DeviceEvent;
use crate::eventbus::EventListener;
use std::io::Write;
use tracing::{info, warn};

/// A simple listener that logs all decoded events through `tracing`.
pub struct TracingListener {
    device: String,
}

impl TracingListener {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

impl EventListener for TracingListener {
    fn on_event(&mut self, event: &DeviceEvent) {
        info!(device = %self.device, topic = %event.topic(), "{event}");
    }
}

/// Writes each event as one JSON object per line and flushes after every line.
///
/// The first write error closes the listener.
pub struct JsonLinesListener<W> {
    out: W,
    closed: bool,
}

impl<W: Write + Send> JsonLinesListener<W> {
    pub fn new(out: W) -> Self {
        Self { out, closed: false }
    }

    fn write(&mut self, event: &DeviceEvent) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write + Send> EventListener for JsonLinesListener<W> {
    fn on_event(&mut self, event: &DeviceEvent) {
        if self.closed {
            return;
        }
        if let Err(err) = self.write(event) {
            warn!(error = %err, "event output closed");
            self.closed = true;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventbus::{EventBus, EventFilter};
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_tagged_object_per_line() {
        let out = Shared::default();
        let mut bus = EventBus::new();
        bus.add_listener(JsonLinesListener::new(out.clone()), EventFilter::All, None)
            .unwrap();
        bus.emit_all(&[
            DeviceEvent::ButtonPressed {
                name: "fire".into(),
            },
            DeviceEvent::StatusChanged {
                name: "hat".into(),
                label: None,
            },
        ]);

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                r#"{"event":"button_pressed","name":"fire"}"#,
                r#"{"event":"status_changed","name":"hat","label":null}"#,
            ]
        );
    }

    #[test]
    fn write_failure_unregisters_listener() {
        let mut bus = EventBus::new();
        bus.add_listener(JsonLinesListener::new(Broken), EventFilter::All, None)
            .unwrap();
        bus.emit_all(&[DeviceEvent::ButtonPressed {
            name: "fire".into(),
        }]);
        assert!(bus.is_empty());
    }
}
