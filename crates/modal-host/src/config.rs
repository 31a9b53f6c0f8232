//! Host configuration for the modal lifecycle manager.

use std::{fs, path::Path};

use ron::{Options, extensions::Extensions};
use serde::{Deserialize, Serialize};

use crate::{Error, ModalProps, Result};

/// Default per-subscriber buffer capacity for dismiss streams.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration consumed by [`crate::ModalHostManager::with_config`].
///
/// Every field has a default, so an empty RON struct `()` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Buffer capacity of each [`crate::DismissStream`]; the oldest events are
    /// dropped (and counted as lost) beyond this.
    pub event_capacity: usize,
    /// Props applied by [`crate::ModalHostManager::create_default`].
    pub default_props: ModalProps,
    /// When set, overrides the animated flag of every present/dismiss request.
    pub animated: Option<bool>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            default_props: ModalProps::default(),
            animated: None,
        }
    }
}

impl HostConfig {
    /// Parse and validate a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        let options = Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
        let cfg: Self = options.from_str(text).map_err(|e| Error::Parse {
            path: None,
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::Read {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;
        Self::from_ron(&text).map_err(|e| e.with_path(path.to_path_buf()))
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::Validation {
                path: None,
                message: "event_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the animated flag for a request, honoring the override.
    pub fn resolve_animated(&self, requested: bool) -> bool {
        self.animated.unwrap_or(requested)
    }
}
