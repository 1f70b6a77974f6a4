//! Join configuration.

use std::time::Duration;

use pattiroom_chain::TOKEN_DECIMALS;
use serde::{Deserialize, Serialize};

/// Settings for a [`JoinOrchestrator`](crate::JoinOrchestrator).
///
/// On-chain calls are never bounded; a signed transaction can only be
/// waited for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// How long to wait for the server to resolve a short code.
    pub resolution_timeout: Duration,

    /// How long to wait for the server to confirm a join after the
    /// on-chain transaction. `None` waits forever.
    pub confirmation_timeout: Option<Duration>,

    /// Decimals used to express token amounts to the game server.
    pub token_decimals: u32,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            resolution_timeout: Duration::from_secs(10),
            confirmation_timeout: Some(Duration::from_secs(30)),
            token_decimals: TOKEN_DECIMALS,
        }
    }
}

impl JoinConfig {
    pub fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout = timeout;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_token_decimals(mut self, decimals: u32) -> Self {
        self.token_decimals = decimals;
        self
    }
}
