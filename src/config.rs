use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

pub const DEFAULT_MAX_SEGMENT_SIZE: usize = 1500;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_REQUEST_LIFETIME_MS: u64 = 4000;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Settings of an attribute authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Upper bound on the content size of one key segment.
    pub max_segment_size: usize,
    /// Attribute universe handed to the scheme setup.
    pub attributes: Vec<String>,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        AuthorityConfig {
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            attributes: Vec::new(),
        }
    }
}

impl AuthorityConfig {
    pub fn new<S: Into<String>>(attributes: impl IntoIterator<Item = S>) -> AuthorityConfig {
        AuthorityConfig {
            attributes: attributes.into_iter().map(Into::into).collect(),
            ..AuthorityConfig::default()
        }
    }

    /// Loads a config; missing fields take their defaults. Checked by [`Self::validate`] when an
    /// authority is built from it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<AuthorityConfig> {
        read_json(path.as_ref())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_segment_size == 0 {
            return Err(Error::Config("max_segment_size must be positive".to_string()));
        }
        if self.attributes.is_empty() {
            return Err(Error::Config("attribute universe is empty".to_string()));
        }
        Ok(())
    }
}

/// Retry budget and request lifetime used by every consumer fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub request_lifetime_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_lifetime_ms: DEFAULT_REQUEST_LIFETIME_MS,
        }
    }
}

impl FetchConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<FetchConfig> {
        read_json(path.as_ref())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_lifetime(&self) -> Duration {
        Duration::from_millis(self.request_lifetime_ms)
    }
}
