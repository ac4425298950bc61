//! Store configuration.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// Event name fired after every successful state update.
pub const STATE_CHANGED: &str = "stateChanged";

const DEFAULT_MAX_CASCADE: usize = 1024;
const DEFAULT_MAX_DEPTH: usize = 32;

/// How a state update requested from inside a listener is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reentrancy {
    /// Queue the update and apply it once the running notification cycle
    /// finishes. Cycles run breadth-first in request order.
    #[default]
    Queue,
    /// Apply the update immediately, nesting a new notification cycle inside
    /// the running one. Depth is counted per thread, so updates from other
    /// threads never count toward the limit.
    Recurse,
}

/// Tunables for a [`DataStore`](crate::DataStore).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use datastore::{Reentrancy, StoreConfig};
///
/// let config = StoreConfig::from_json(r#"{ "reentrancy": "recurse" }"#).unwrap();
/// assert_eq!(config.reentrancy, Reentrancy::Recurse);
/// assert_eq!(config.change_event, "stateChanged");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Event name notified after each update.
    pub change_event: String,
    /// Policy for updates issued by listeners.
    pub reentrancy: Reentrancy,
    /// Maximum notification cycles a single outermost update may cause
    /// under [`Reentrancy::Queue`].
    pub max_cascade: usize,
    /// Maximum nesting of notification cycles under [`Reentrancy::Recurse`],
    /// counted per thread.
    pub max_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            change_event: STATE_CHANGED.to_string(),
            reentrancy: Reentrancy::Queue,
            max_cascade: DEFAULT_MAX_CASCADE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(input: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that limits and the event name are usable.
    pub fn validate(&self) -> Result<()> {
        if self.change_event.is_empty() {
            return Err(StoreError::InvalidConfig(
                "change_event must not be empty".to_string(),
            ));
        }
        if self.max_cascade == 0 {
            return Err(StoreError::InvalidConfig(
                "max_cascade must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(StoreError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Use a different change event name.
    pub fn with_change_event(mut self, event: impl Into<String>) -> Self {
        self.change_event = event.into();
        self
    }

    /// Use a different re-entrancy policy.
    pub fn with_reentrancy(mut self, reentrancy: Reentrancy) -> Self {
        self.reentrancy = reentrancy;
        self
    }

    /// Cap the notification cycles of one queued cascade.
    pub fn with_max_cascade(mut self, max_cascade: usize) -> Self {
        self.max_cascade = max_cascade;
        self
    }

    /// Cap the nesting of recursive notification cycles.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
