//! Point-in-time copy of decoder state.
//!
//! [`Snapshot`] is an **owned**, read-only view of one device's field values at a point in
//! time (typically "after the last report"). It is produced by
//! [`Session::snapshot`](crate::session::Session::snapshot) and is cheap to clone for
//! fan-out to consumers that poll state instead of subscribing to events.
//!
//! # Semantics
//! - A snapshot is **immutable**. To refresh, pump the session and take a new one.
//! - Fields that have not been observed yet are absent (sticks, statuses) or read as
//!   released (buttons).
//!
//! # Example
//! ```no_run
//! use stickmap::Snapshot;
//!
//! fn print_left(snap: &Snapshot) {
//!     if let Some(pos) = snap.stick("left") {
//!         println!("left: x={} y={} trigger={}", pos.x, pos.y, snap.button("trigger"));
//!     }
//! }
//! ```

use crate::decoder::{DeviceState, StickPosition};
use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize)]
pub struct Snapshot(pub DeviceState);

impl Snapshot {
    #[inline]
    pub fn stick(&self, name: &str) -> Option<StickPosition> {
        self.0.stick(name)
    }

    #[inline]
    pub fn button(&self, name: &str) -> bool {
        self.0.button(name)
    }

    #[inline]
    pub fn status(&self, name: &str) -> Option<&str> {
        self.0.status(name)
    }

    /// Names of buttons currently held, sorted.
    pub fn pressed(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .0
            .buttons
            .iter()
            .filter(|(_, &down)| down)
            .map(|(name, _)| name.as_str())
            .collect();
        out.sort_unstable();
        out
    }

    /// Consume the snapshot and return the inner state.
    #[inline]
    pub fn into_inner(self) -> DeviceState {
        self.0
    }
}
