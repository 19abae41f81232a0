//! On-disk state file.
//!
//! ```json
//! {
//!   "version": 1,
//!   "resources": {
//!     "slack_conversation.eng": { "type": "slack_conversation", "attributes": { ... } }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slackctl_config::Address;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default state file name, next to the manifest.
pub const STATE_FILE: &str = "slackctl.state.json";

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to access state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse state file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported state file version {0}, expected {STATE_VERSION}")]
    UnsupportedVersion(u32),

    #[error("Invalid address in state file: {0}")]
    Address(#[from] slackctl_config::ConfigError),
}

/// Observed attributes of one managed resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    #[serde(rename = "type")]
    pub type_name: String,
    pub attributes: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub version: u32,
    #[serde(default)]
    resources: BTreeMap<String, ResourceRecord>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl StateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the state file; a missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        let document: Self = serde_json::from_str(&content)?;
        if document.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(document.version));
        }
        for address in document.resources.keys() {
            address.parse::<Address>()?;
        }
        Ok(document)
    }

    /// Writes to a sibling temp file and renames it over `path`.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = temp_path(path);
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceRecord> {
        self.resources.get(&address.to_string())
    }

    pub fn insert(&mut self, address: &Address, attributes: Value) {
        self.resources.insert(
            address.to_string(),
            ResourceRecord {
                type_name: address.type_name.clone(),
                attributes,
            },
        );
    }

    pub fn remove(&mut self, address: &Address) -> Option<ResourceRecord> {
        self.resources.remove(&address.to_string())
    }

    /// All tracked addresses in sorted order.
    pub fn addresses(&self) -> Vec<Address> {
        self.resources
            .keys()
            .filter_map(|key| key.parse().ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
