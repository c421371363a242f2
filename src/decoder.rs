//! Report decoder.
//!
//! [`FrameDecoder`] turns raw input reports into [`DeviceEvent`]s according to one
//! [`DeviceDefinition`]. It caches the last decoded value of every field and only reports
//! transitions.
//!
//! Each report is processed as three independent passes, in this order:
//!
//! - **Sticks.** The first observation only establishes the baseline; a later change of
//!   either axis emits one `StickMoved` with the new pair.
//! - **Buttons.** Pressed means `frame[pin] == value`. A button already pressed at first
//!   observation emits `ButtonPressed`; afterwards only edges emit.
//! - **Statuses.** The byte is looked up in the state table (first match wins). Any change of
//!   the resolved label emits `StatusChanged`, including the very first observation, because
//!   the stored label starts out unset.
//!
//! Reports are atomic: all pins are bounds-checked before any state is touched, so a
//! too-short report fails with [`Error::MalformedFrame`] and leaves the state as it was.

use crate::definition::DeviceDefinition;
use crate::error::{Error, Result};
use crate::event::DeviceEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Last decoded two-axis position of a stick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickPosition {
    pub x: u8,
    pub y: u8,
}

/// Cached per-field state, keyed by field name.
///
/// A field only has an entry once at least one report has been decoded since the decoder was
/// created or [`reset`](FrameDecoder::reset).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub sticks: HashMap<String, StickPosition>,
    pub buttons: HashMap<String, bool>,
    /// `None` means the last byte matched no configured state.
    pub statuses: HashMap<String, Option<String>>,
}

impl DeviceState {
    pub fn stick(&self, name: &str) -> Option<StickPosition> {
        self.sticks.get(name).copied()
    }

    /// State of a named button (`false` if never observed).
    pub fn button(&self, name: &str) -> bool {
        self.buttons.get(name).copied().unwrap_or(false)
    }

    /// Label of a named status (`None` if unset or never observed).
    pub fn status(&self, name: &str) -> Option<&str> {
        self.statuses.get(name).and_then(|l| l.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.sticks.is_empty() && self.buttons.is_empty() && self.statuses.is_empty()
    }
}

/// Stateful decoder for one device session.
#[derive(Debug)]
pub struct FrameDecoder {
    definition: DeviceDefinition,
    /// Smallest report length that covers every configured pin.
    min_len: usize,
    state: DeviceState,
}

impl FrameDecoder {
    pub fn new(definition: DeviceDefinition) -> Self {
        let min_len = definition.max_pin().map_or(0, |p| p + 1);
        Self {
            definition,
            min_len,
            state: DeviceState::default(),
        }
    }

    pub fn definition(&self) -> &DeviceDefinition {
        &self.definition
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Forget all cached values; the next report is treated as a first observation.
    pub fn reset(&mut self) {
        self.state = DeviceState::default();
    }

    /// Decode one report and return the transitions it caused.
    pub fn on_frame(&mut self, frame: &[u8]) -> Result<Vec<DeviceEvent>> {
        if frame.len() < self.min_len {
            return Err(Error::MalformedFrame {
                pin: self.min_len - 1,
                len: frame.len(),
            });
        }

        let mut events = Vec::new();
        self.decode_sticks(frame, &mut events);
        self.decode_buttons(frame, &mut events);
        self.decode_statuses(frame, &mut events);

        if !events.is_empty() {
            trace!(count = events.len(), len = frame.len(), "decoded report");
        }
        Ok(events)
    }

    fn decode_sticks(&mut self, frame: &[u8], events: &mut Vec<DeviceEvent>) {
        for stick in &self.definition.joysticks {
            let pos = StickPosition {
                x: frame[stick.x_pin],
                y: frame[stick.y_pin],
            };
            match self.state.sticks.get_mut(&stick.name) {
                None => {
                    self.state.sticks.insert(stick.name.clone(), pos);
                }
                Some(last) if *last != pos => {
                    *last = pos;
                    events.push(DeviceEvent::StickMoved {
                        name: stick.name.clone(),
                        x: pos.x,
                        y: pos.y,
                    });
                }
                Some(_) => {}
            }
        }
    }

    fn decode_buttons(&mut self, frame: &[u8], events: &mut Vec<DeviceEvent>) {
        for button in &self.definition.buttons {
            let pressed = frame[button.pin] == button.value;
            let was = self.state.buttons.insert(button.name.clone(), pressed);
            match (was, pressed) {
                (None | Some(false), true) => events.push(DeviceEvent::ButtonPressed {
                    name: button.name.clone(),
                }),
                (Some(true), false) => events.push(DeviceEvent::ButtonReleased {
                    name: button.name.clone(),
                }),
                _ => {}
            }
        }
    }

    fn decode_statuses(&mut self, frame: &[u8], events: &mut Vec<DeviceEvent>) {
        for status in &self.definition.statuses {
            let label = status.label_for(frame[status.pin]).map(str::to_owned);
            let was = self
                .state
                .statuses
                .insert(status.name.clone(), label.clone())
                .flatten();
            if was != label {
                events.push(DeviceEvent::StatusChanged {
                    name: status.name.clone(),
                    label,
                });
            }
        }
    }
}
