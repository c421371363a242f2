//! Application configuration.
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! definitions_dir = "definitions"
//! device = "logitech"          # or "logitech/extreme3d"
//! product_id = 0xc216          # optional override
//! max_listeners = 16
//! report_len = 64
//! read_timeout_ms = 10
//! ```

use crate::error::{Error, Result};
use crate::eventbus::MAX_LISTENERS_DEFAULT;
use crate::resolve::Overrides;
use crate::session::{SessionOptions, DEFAULT_REPORT_LEN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the `<vendor>/<configuration>` definition tree.
    pub definitions_dir: PathBuf,
    /// Vendor name or qualified `<vendor>/<configuration>` id.
    pub device: Option<String>,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub max_listeners: usize,
    pub report_len: usize,
    pub read_timeout_ms: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from("definitions"),
            device: None,
            vendor_id: None,
            product_id: None,
            max_listeners: MAX_LISTENERS_DEFAULT,
            report_len: DEFAULT_REPORT_LEN,
            read_timeout_ms: 10,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Toml {
            path: PathBuf::from("<inline>"),
            source: e,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&raw).map_err(|e| Error::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            report_len: self.report_len,
            max_listeners: self.max_listeners,
            // Blocking reads already pace the loop.
            idle_sleep: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn reads_overrides_and_limits() {
        let cfg = AppConfig::from_toml_str(
            r#"
            definitions_dir = "/etc/stickmap"
            device = "logitech/f310"
            product_id = 0xc216
            max_listeners = 4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.definitions_dir, PathBuf::from("/etc/stickmap"));
        assert_eq!(cfg.device.as_deref(), Some("logitech/f310"));
        assert_eq!(
            cfg.overrides(),
            Overrides {
                vendor_id: None,
                product_id: Some(0xc216)
            }
        );
        assert_eq!(cfg.session_options().max_listeners, 4);
        assert_eq!(cfg.report_len, DEFAULT_REPORT_LEN);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AppConfig::load("/nonexistent/stickmap.toml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
