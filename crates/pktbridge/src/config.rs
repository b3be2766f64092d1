//! # Builder Configuration
//!
//! Limits applied by `PacketBuilder` before and during a native build.
//! Every limit defaults to unbounded; set one to opt in.

use serde::{Deserialize, Serialize};

use crate::error::{PacketError, PacketResult};

/// Default ceiling on a packed packet (unbounded)
pub const DEFAULT_MAX_PACKET_SIZE: usize = usize::MAX;

/// Default ceiling on the header count (unbounded)
pub const DEFAULT_MAX_HEADERS: usize = usize::MAX;

/// Packet builder configuration
///
/// Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Largest buffer the allocation callback will hand out
    pub max_packet_size: usize,

    /// Largest number of headers accepted by `build`
    pub max_headers: usize,

    /// Reject headers whose key is empty
    pub reject_empty_keys: bool,
}

impl BuilderConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            max_headers: DEFAULT_MAX_HEADERS,
            reject_empty_keys: false,
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> PacketResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PacketError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Verify configuration validity
    pub fn is_valid(&self) -> bool {
        self.max_packet_size > 0
    }

    /// Like `is_valid`, but with a reason
    pub fn validate(&self) -> PacketResult<()> {
        if !self.is_valid() {
            return Err(PacketError::Config("max_packet_size must be nonzero".into()));
        }
        Ok(())
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self::new()
    }
}
