//! Registry of known device definitions.
//!
//! The registry is built once at startup, typically from a directory laid out as
//! `<root>/<vendor>/<configuration>.toml` (or `.json`), and is read-only afterwards.
//! Within a vendor, configurations are kept sorted by name so that detection order is
//! deterministic.

use crate::definition::DeviceDefinition;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Fully qualified `<vendor>/<configuration>` name of one definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedId {
    pub vendor: String,
    pub config: String,
}

impl QualifiedId {
    pub fn new(vendor: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            config: config.into(),
        }
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vendor, self.config)
    }
}

impl FromStr for QualifiedId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((vendor, config))
                if !vendor.is_empty() && !config.is_empty() && !config.contains('/') =>
            {
                Ok(QualifiedId::new(vendor, config))
            }
            _ => Err(Error::InvalidIdentifier(s.to_string())),
        }
    }
}

/// Vendor name → configuration name → definition.
#[derive(Clone, Debug, Default)]
pub struct DefinitionRegistry {
    vendors: BTreeMap<String, BTreeMap<String, DeviceDefinition>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one under the same id.
    pub fn insert(&mut self, id: QualifiedId, definition: DeviceDefinition) {
        self.vendors
            .entry(id.vendor)
            .or_default()
            .insert(id.config, definition);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, id: QualifiedId, definition: DeviceDefinition) -> Self {
        self.insert(id, definition);
        self
    }

    pub fn get(&self, id: &QualifiedId) -> Option<&DeviceDefinition> {
        self.vendors.get(&id.vendor)?.get(&id.config)
    }

    /// Configurations of one vendor in name order, or `None` if the vendor is unknown.
    pub fn vendor(
        &self,
        vendor: &str,
    ) -> Option<impl Iterator<Item = (&str, &DeviceDefinition)> + '_> {
        self.vendors
            .get(vendor)
            .map(|configs| configs.iter().map(|(name, def)| (name.as_str(), def)))
    }

    pub fn vendors(&self) -> impl Iterator<Item = &str> + '_ {
        self.vendors.keys().map(String::as_str)
    }

    /// Every registered id, sorted.
    pub fn ids(&self) -> Vec<QualifiedId> {
        self.vendors
            .iter()
            .flat_map(|(vendor, configs)| {
                configs
                    .keys()
                    .map(move |config| QualifiedId::new(vendor.as_str(), config.as_str()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.vendors.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every `<vendor>/<configuration>.{toml,json}` below `root`.
    ///
    /// Files with other extensions are ignored. Any unreadable or invalid definition fails the
    /// whole load, and so does a configuration name present as both `.toml` and `.json`.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut registry = Self::default();

        for vendor_dir in sorted_entries(root)? {
            if !vendor_dir.is_dir() {
                continue;
            }
            let Some(vendor) = file_name(&vendor_dir) else {
                warn!(path = %vendor_dir.display(), "skipping vendor directory with non-utf8 name");
                continue;
            };
            // An empty vendor directory still names a known vendor.
            registry.vendors.entry(vendor.clone()).or_default();
            let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();

            for path in sorted_entries(&vendor_dir)? {
                let Some(format) = Format::of(&path) else {
                    continue;
                };
                let Some(config) = file_stem(&path) else {
                    warn!(path = %path.display(), "skipping definition with non-utf8 name");
                    continue;
                };
                if let Some(first) = sources.get(&config) {
                    return Err(Error::InvalidDefinition {
                        id: QualifiedId::new(vendor.clone(), config).to_string(),
                        reason: format!(
                            "defined by both {} and {}",
                            first.display(),
                            path.display()
                        ),
                    });
                }
                sources.insert(config.clone(), path.clone());
                let id = QualifiedId::new(vendor.clone(), config);
                let definition = load_definition_file(&path, format, &id)?;
                debug!(%id, device = %definition.device_id(), "loaded definition");
                registry.insert(id, definition);
            }
        }

        info!(
            root = %root.display(),
            vendors = registry.vendors.len(),
            definitions = registry.len(),
            "definition registry loaded"
        );
        Ok(registry)
    }
}

#[derive(Clone, Copy, Debug)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Read and validate one definition file.
fn load_definition_file(
    path: &Path,
    format: Format,
    id: &QualifiedId,
) -> Result<DeviceDefinition> {
    let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let id = id.to_string();
    match format {
        Format::Toml => DeviceDefinition::from_toml_str(&id, &raw),
        Format::Json => DeviceDefinition::from_json_str(&id, &raw),
    }
    .map_err(|e| with_path(e, path))
}

/// Point parse errors at the file rather than the qualified id.
fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::Toml { source, .. } => Error::Toml {
            path: path.to_path_buf(),
            source,
        },
        Error::Json { source, .. } => Error::Json {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        out.push(entry.path());
    }
    out.sort();
    Ok(out)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_owned)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(vendor_id: u16, product_id: u16) -> DeviceDefinition {
        DeviceDefinition {
            name: None,
            vendor_id,
            product_id,
            joysticks: vec![],
            buttons: vec![],
            statuses: vec![],
        }
    }

    #[test]
    fn parses_qualified_ids() {
        let id: QualifiedId = "logitech/extreme3d".parse().unwrap();
        assert_eq!(id, QualifiedId::new("logitech", "extreme3d"));
        assert_eq!(id.to_string(), "logitech/extreme3d");

        for bad in ["logitech", "/x", "logitech/", "a/b/c"] {
            assert!(bad.parse::<QualifiedId>().is_err(), "{bad}");
        }
    }

    #[test]
    fn vendor_configs_iterate_in_name_order() {
        let reg = DefinitionRegistry::new()
            .with(QualifiedId::new("acme", "zeta"), def(1, 3))
            .with(QualifiedId::new("acme", "alpha"), def(1, 2))
            .with(QualifiedId::new("other", "pad"), def(9, 9));

        let names: Vec<&str> = reg.vendor("acme").unwrap().map(|(n, _)| n).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert!(reg.vendor("nobody").is_none());
        assert_eq!(reg.vendors().collect::<Vec<_>>(), ["acme", "other"]);
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.ids()[2], QualifiedId::new("other", "pad"));
    }

    #[test]
    fn insert_replaces_existing_definition() {
        let id = QualifiedId::new("acme", "pad");
        let reg = DefinitionRegistry::new()
            .with(id.clone(), def(1, 1))
            .with(id.clone(), def(1, 2));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&id).unwrap().product_id, 2);
    }
}
