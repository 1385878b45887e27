//! Toolkit configuration.
//!
//! Every value has a default, so an empty TOML document is a valid configuration:
//!
//! ```toml
//! [document]
//! rendering_enabled = true
//!
//! [stack]
//! transition_timeout_ms = 200
//! animate_delay_ms = 1
//! visibility_delay_ms = 500
//! locked = true
//!
//! [scroller]
//! velocity = 1.6
//! bump = 50.0
//! flick_threshold = 4.0
//! max_samples = 7
//! trim_delay_ms = 100
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub document: DocumentConfig,
    pub stack: StackConfig,
    pub scroller: ScrollerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// If false, no surfaces are ever created and widgets degrade to data holders.
    pub rendering_enabled: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            rendering_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Fallback for hosts that never report a finished transition.
    pub transition_timeout_ms: u64,
    /// Delay between inserting the incoming page and starting its transition.
    pub animate_delay_ms: u64,
    /// Delay before show/hide events fire, so CSS-driven transitions can finish.
    pub visibility_delay_ms: u64,
    /// Whether new stacks keep their first page when popped.
    pub locked: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            transition_timeout_ms: 200,
            animate_delay_ms: 1,
            visibility_delay_ms: 500,
            locked: true,
        }
    }
}

impl StackConfig {
    pub fn transition_timeout(&self) -> Duration {
        Duration::from_millis(self.transition_timeout_ms)
    }

    pub fn animate_delay(&self) -> Duration {
        Duration::from_millis(self.animate_delay_ms)
    }

    pub fn visibility_delay(&self) -> Duration {
        Duration::from_millis(self.visibility_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrollerConfig {
    /// Multiplier applied to the release velocity of a flick.
    pub velocity: f64,
    /// Overscroll allowance in points, past either end of the content.
    pub bump: f64,
    /// Aggregate sample delta above which a release counts as a flick.
    pub flick_threshold: f64,
    /// Number of pointer samples kept for velocity estimation.
    pub max_samples: usize,
    /// Delay after which a stale sample is dropped during a slow drag.
    pub trim_delay_ms: u64,
}

impl Default for ScrollerConfig {
    fn default() -> Self {
        ScrollerConfig {
            velocity: 1.6,
            bump: 50.,
            flick_threshold: 4.,
            max_samples: 7,
            trim_delay_ms: 100,
        }
    }
}

impl ScrollerConfig {
    pub fn trim_delay(&self) -> Duration {
        Duration::from_millis(self.trim_delay_ms)
    }
}

impl Config {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise parses it as TOML and validates it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml_str(&content)
    }

    /// Checks that the values can drive the scroller and stack state machines.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scroller = &self.scroller;
        if !scroller.velocity.is_finite() || scroller.velocity <= 0. {
            return Err(ConfigError::Validation {
                message: format!("scroller.velocity must be positive, got {}", scroller.velocity),
            });
        }
        if !scroller.bump.is_finite() || scroller.bump < 0. {
            return Err(ConfigError::Validation {
                message: format!("scroller.bump must not be negative, got {}", scroller.bump),
            });
        }
        if scroller.max_samples < 2 {
            return Err(ConfigError::Validation {
                message: "scroller.max_samples must be at least 2".to_string(),
            });
        }
        if self.stack.transition_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                message: "stack.transition_timeout_ms must be nonzero".to_string(),
            });
        }
        Ok(())
    }
}
