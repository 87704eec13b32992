//! Arcade configuration.

use serde::{Deserialize, Serialize};

use super::error::ArcadeError;
use super::ids::Identity;

/// Default maximum game title length.
pub const DEFAULT_MAX_TITLE_LEN: usize = 64;

/// Default maximum leaderboard name length.
pub const DEFAULT_MAX_NAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    /// Registry authority; owns the genesis game
    pub authority: Identity,

    /// Let any signer publish games they own, not just the authority
    pub open_publishing: bool,

    /// Title given to the genesis game
    pub genesis_title: String,

    pub max_title_len: usize,

    pub max_name_len: usize,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            authority: Identity::from("authority"),
            open_publishing: false,
            genesis_title: "genesis".to_string(),
            max_title_len: DEFAULT_MAX_TITLE_LEN,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl ArcadeConfig {
    pub fn new(authority: Identity) -> Self {
        Self {
            authority,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ArcadeError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ArcadeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ArcadeError> {
        if self.authority.as_str().is_empty() {
            return Err(ArcadeError::InvalidConfig("authority is empty".to_string()));
        }
        if self.max_title_len == 0 || self.max_name_len == 0 {
            return Err(ArcadeError::InvalidConfig(
                "length limits must be positive".to_string(),
            ));
        }
        self.check_title(&self.genesis_title)
    }

    pub fn check_title(&self, title: &str) -> Result<(), ArcadeError> {
        check_len("title", title, self.max_title_len)
    }

    pub fn check_name(&self, name: &str) -> Result<(), ArcadeError> {
        check_len("name", name, self.max_name_len)
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ArcadeError> {
    let len = value.chars().count();
    if len > max {
        Err(ArcadeError::TooLong { field, len, max })
    } else {
        Ok(())
    }
}
