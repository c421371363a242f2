//! Picking the definition for an attached device.
//!
//! [`resolve`] turns a user-supplied identifier into a [`QualifiedId`]:
//! - `"<vendor>/<configuration>"` is an explicit choice and is returned as-is, split at the
//!   first `/` without further checks; ids such as `"a/b/c"` or `"/x"` name nothing in the
//!   registry and fail in [`load`] with `DefinitionNotFound`,
//! - a bare `"<vendor>"` is matched against the attached devices, trying the vendor's
//!   configurations in name order and returning the first one whose vendor/product pair is
//!   attached.
//!
//! [`load`] then fetches the definition and applies caller overrides.

use crate::definition::DeviceDefinition;
use crate::device::{DeviceEnumerator, DeviceId};
use crate::error::{Error, Result};
use crate::registry::{DefinitionRegistry, QualifiedId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Optional vendor/product replacements applied by [`load`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

impl Overrides {
    pub fn apply(&self, definition: &mut DeviceDefinition) {
        if let Some(vid) = self.vendor_id {
            definition.vendor_id = vid;
        }
        if let Some(pid) = self.product_id {
            definition.product_id = pid;
        }
    }
}

/// Resolve `identifier` against the registry and the attached device list.
pub fn resolve(
    registry: &DefinitionRegistry,
    identifier: &str,
    attached: &[DeviceId],
) -> Result<QualifiedId> {
    if let Some((vendor, config)) = identifier.split_once('/') {
        let id = QualifiedId::new(vendor, config);
        debug!(%id, "explicit configuration selected");
        return Ok(id);
    }

    let vendor = identifier;
    let configs = registry
        .vendor(vendor)
        .ok_or_else(|| Error::ConfigurationNotFound {
            vendor: vendor.to_string(),
        })?;

    for (config, definition) in configs {
        let wanted = definition.device_id();
        if attached.contains(&wanted) {
            let id = QualifiedId::new(vendor, config);
            info!(%id, device = %wanted, "detected device");
            return Ok(id);
        }
    }

    Err(Error::DeviceNotDetected {
        vendor: vendor.to_string(),
    })
}

/// Fetch the definition for `id` and apply `overrides`.
pub fn load(
    registry: &DefinitionRegistry,
    id: &QualifiedId,
    overrides: Overrides,
) -> Result<DeviceDefinition> {
    let mut definition = registry
        .get(id)
        .cloned()
        .ok_or_else(|| Error::DefinitionNotFound { id: id.to_string() })?;
    overrides.apply(&mut definition);
    Ok(definition)
}

/// [`resolve`] against whatever `enumerator` reports as attached, then [`load`].
pub fn resolve_and_load(
    registry: &DefinitionRegistry,
    identifier: &str,
    enumerator: &impl DeviceEnumerator,
    overrides: Overrides,
) -> Result<(QualifiedId, DeviceDefinition)> {
    let id = if identifier.contains('/') {
        resolve(registry, identifier, &[])?
    } else {
        resolve(registry, identifier, &enumerator.attached_ids()?)?
    };
    let definition = load(registry, &id, overrides)?;
    Ok((id, definition))
}
