use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Default manifest file name, looked up in the working directory.
pub const MANIFEST_FILE: &str = "slackctl.toml";

/// Environment variable consulted when the manifest carries no token.
pub const TOKEN_ENV: &str = "SLACK_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to convert block body: {0}")]
    Convert(#[from] serde_json::Error),

    #[error("Invalid resource address '{0}', expected <type>.<label>")]
    InvalidAddress(String),

    #[error("No token configured: set provider.token or {TOKEN_ENV}")]
    MissingToken,
}

/// Provider section: the single secret used to build the API client.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub token: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProviderConfig {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// An explicitly given token wins over the manifest.
    pub fn with_override(self, token: Option<String>) -> Self {
        match token {
            Some(token) => Self::with_token(token),
            None => self,
        }
    }

    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)
    }
}

/// `<type>.<label>` identifying one declared block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    pub type_name: String,
    pub label: String,
}

impl Address {
    pub fn new(type_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.label)
    }
}

impl FromStr for Address {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((type_name, label)) if !type_name.is_empty() && !label.is_empty() => {
                Ok(Self::new(type_name, label))
            }
            _ => Err(ConfigError::InvalidAddress(s.to_string())),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// One declared resource or data block with its raw attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub address: Address,
    pub body: serde_json::Value,
}

type BlockTable = BTreeMap<String, BTreeMap<String, toml::Value>>;

/// The whole manifest.
///
/// ```toml
/// [provider]
/// token = "xoxb-..."
///
/// [resource.slack_conversation.eng]
/// name = "eng"
/// members = ["U1", "U2"]
///
/// [data.slack_user.alice]
/// email = "alice@example.com"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    resource: BlockTable,
    #[serde(default)]
    data: BlockTable,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Declared resource blocks, ordered by address.
    pub fn resources(&self) -> Result<Vec<Block>, ConfigError> {
        blocks(&self.resource)
    }

    /// Declared data blocks, ordered by address.
    pub fn data_sources(&self) -> Result<Vec<Block>, ConfigError> {
        blocks(&self.data)
    }
}

fn blocks(table: &BlockTable) -> Result<Vec<Block>, ConfigError> {
    let mut out = Vec::new();
    for (type_name, labelled) in table {
        for (label, body) in labelled {
            out.push(Block {
                address: Address::new(type_name, label),
                body: serde_json::to_value(body)?,
            });
        }
    }
    Ok(out)
}
