//! Decoded events.
//!
//! The decoder reports field transitions as [`DeviceEvent`] values, one variant per
//! transition kind, each carrying its own payload.
//!
//! ## Value conventions
//! - **Sticks:** raw report bytes, `0..=255` per axis. No normalization or deadzone is
//!   applied here; that is application policy.
//! - **Buttons:** press/release edges.
//! - **Statuses:** the label of the matched state, or `None` when the byte matches no
//!   configured state.
//!
//! ## Topics
//! Consumers that route on strings can use [`DeviceEvent::topic`], which renders
//! `"<field>:<transition>"` (e.g. `"left:move"`, `"fire:press"`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// One field transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A stick moved; carries the new position.
    StickMoved { name: String, x: u8, y: u8 },

    /// A button transitioned to pressed (or was pressed at first observation).
    ButtonPressed { name: String },

    /// A button transitioned to released.
    ButtonReleased { name: String },

    /// A status byte resolved to a different label.
    StatusChanged { name: String, label: Option<String> },
}

/// Transition kind of a [`DeviceEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    Move,
    Press,
    Release,
    Change,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Move => "move",
            Transition::Press => "press",
            Transition::Release => "release",
            Transition::Change => "change",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DeviceEvent {
    /// Name of the field that produced this event.
    pub fn field(&self) -> &str {
        match self {
            DeviceEvent::StickMoved { name, .. }
            | DeviceEvent::ButtonPressed { name }
            | DeviceEvent::ButtonReleased { name }
            | DeviceEvent::StatusChanged { name, .. } => name,
        }
    }

    pub fn transition(&self) -> Transition {
        match self {
            DeviceEvent::StickMoved { .. } => Transition::Move,
            DeviceEvent::ButtonPressed { .. } => Transition::Press,
            DeviceEvent::ButtonReleased { .. } => Transition::Release,
            DeviceEvent::StatusChanged { .. } => Transition::Change,
        }
    }

    /// `"<field>:<transition>"`.
    pub fn topic(&self) -> String {
        format!("{}:{}", self.field(), self.transition())
    }
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceEvent::StickMoved { name, x, y } => write!(f, "{name}:move x={x} y={y}"),
            DeviceEvent::ButtonPressed { name } => write!(f, "{name}:press"),
            DeviceEvent::ButtonReleased { name } => write!(f, "{name}:release"),
            DeviceEvent::StatusChanged { name, label } => {
                write!(f, "{name}:change {}", label.as_deref().unwrap_or("-"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_joins_field_and_transition() {
        let ev = DeviceEvent::StickMoved {
            name: "left".into(),
            x: 10,
            y: 21,
        };
        assert_eq!(ev.topic(), "left:move");
        let release = DeviceEvent::ButtonReleased {
            name: "fire".into(),
        };
        assert_eq!(release.topic(), "fire:release");
    }

    #[test]
    fn serializes_with_event_tag() {
        let ev = DeviceEvent::StatusChanged {
            name: "mode".into(),
            label: None,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["name"], "mode");
        assert!(json["label"].is_null());
    }
}
