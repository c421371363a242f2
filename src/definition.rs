//! Declarative device definitions.
//!
//! A [`DeviceDefinition`] maps byte offsets ("pins") of a raw input report to named fields.
//! Definitions are plain data; they are loaded once by the
//! [`DefinitionRegistry`](crate::registry::DefinitionRegistry) and never mutated afterwards
//! (except for the vendor/product overrides applied by [`load`](crate::resolve::load)).
//!
//! # Document format
//! Definitions are stored as TOML or JSON. Keys are snake_case; the camelCase spellings
//! `vendorID`, `productID`, `xPin` and `yPin` are accepted as aliases.
//!
//! ```toml
//! vendor_id = 0x046d
//! product_id = 0xc215
//!
//! [[joysticks]]
//! name = "left"
//! x_pin = 1
//! y_pin = 2
//!
//! [[buttons]]
//! name = "trigger"
//! pin = 4
//! value = 1
//!
//! [[statuses]]
//! name = "mode"
//! pin = 6
//! states = [{ value = 0, label = "manual" }, { value = 8, label = "auto" }]
//! ```

use crate::device::DeviceId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Field layout of one device model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    /// Optional display name; not used for matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(alias = "vendorID", alias = "vendorId")]
    pub vendor_id: u16,

    #[serde(alias = "productID", alias = "productId")]
    pub product_id: u16,

    /// Two-axis sticks, each axis one byte.
    #[serde(default)]
    pub joysticks: Vec<StickConfig>,

    /// Buttons pressed when their pin equals a specific byte value.
    #[serde(default)]
    pub buttons: Vec<ButtonConfig>,

    /// Enumerated status bytes with a value → label table.
    #[serde(default)]
    pub statuses: Vec<StatusConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickConfig {
    pub name: String,
    #[serde(alias = "xPin")]
    pub x_pin: usize,
    #[serde(alias = "yPin")]
    pub y_pin: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    pub name: String,
    pub pin: usize,
    /// Byte value that means "pressed".
    pub value: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    pub name: String,
    pub pin: usize,
    /// Ordered table; the first entry whose `value` matches wins.
    #[serde(default)]
    pub states: Vec<StatusState>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusState {
    pub value: u8,
    pub label: String,
}

impl StatusConfig {
    /// Label of the first state whose value equals `byte`.
    pub fn label_for(&self, byte: u8) -> Option<&str> {
        self.states
            .iter()
            .find(|s| s.value == byte)
            .map(|s| s.label.as_str())
    }
}

impl DeviceDefinition {
    /// Parse a TOML document. `id` is only used in error messages.
    pub fn from_toml_str(id: &str, raw: &str) -> Result<Self> {
        let def: DeviceDefinition = toml::from_str(raw).map_err(|e| Error::Toml {
            path: id.into(),
            source: e,
        })?;
        def.validate(id)?;
        Ok(def)
    }

    /// Parse a JSON document. `id` is only used in error messages.
    pub fn from_json_str(id: &str, raw: &str) -> Result<Self> {
        let def: DeviceDefinition = serde_json::from_str(raw).map_err(|e| Error::Json {
            path: id.into(),
            source: e,
        })?;
        def.validate(id)?;
        Ok(def)
    }

    /// Vendor/product pair used to match an attached device.
    pub fn device_id(&self) -> DeviceId {
        DeviceId::new(self.vendor_id, self.product_id)
    }

    /// Largest byte offset referenced by any field, or `None` for an empty layout.
    pub fn max_pin(&self) -> Option<usize> {
        let sticks = self.joysticks.iter().map(|s| s.x_pin.max(s.y_pin));
        let buttons = self.buttons.iter().map(|b| b.pin);
        let statuses = self.statuses.iter().map(|s| s.pin);
        sticks.chain(buttons).chain(statuses).max()
    }

    /// Reject duplicate field names within one field kind.
    ///
    /// Names may repeat across kinds: decoder state keeps sticks, buttons and statuses in
    /// separate maps.
    pub fn validate(&self, id: &str) -> Result<()> {
        check_unique(id, "joystick", self.joysticks.iter().map(|s| s.name.as_str()))?;
        check_unique(id, "button", self.buttons.iter().map(|b| b.name.as_str()))?;
        check_unique(id, "status", self.statuses.iter().map(|s| s.name.as_str()))?;
        Ok(())
    }
}

fn check_unique<'a>(id: &str, kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::InvalidDefinition {
                id: id.to_string(),
                reason: format!("duplicate {kind} name `{name}`"),
            });
        }
    }
    Ok(())
}
