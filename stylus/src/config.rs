//! # Configuration Module - Runtime Behavior Settings
//!
//! Options for tuning how the engine reacts to input: how long a rejected keystroke
//! flashes, how aggressively saves are debounced, and how the strict-mode interceptor
//! treats indentation.
//!
//! ## Usage
//!
//! ```rust
//! use stylus::config::Configuration;
//! use stylus::progress::PersistMode;
//! use web_time::Duration;
//!
//! // Use default configuration
//! let config = Configuration::default();
//!
//! // Custom configuration
//! let config = Configuration {
//!     error_flash: Duration::from_millis(250),
//!     persist: PersistMode::CompletionFlag,
//!     ..Configuration::default()
//! };
//! ```

use web_time::Duration;

use crate::progress::PersistMode;

/// Runtime configuration for a lesson session
///
/// All settings have defaults matching a typical lesson player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// How long the error signal of a rejected keystroke stays active
    ///
    /// **Default**: 400ms
    pub error_flash: Duration,

    /// Quiet period after the last edit before progress is persisted
    ///
    /// Every edit restarts the period, so a burst of typing results in a single save.
    ///
    /// **Default**: 1000ms
    pub save_debounce: Duration,

    /// Smallest run of spaces a Tab press skips over in strict mode
    ///
    /// **Default**: 2
    pub min_indent_skip: usize,

    /// Largest run of spaces a single Tab press skips over in strict mode
    ///
    /// Longer runs need several presses.
    ///
    /// **Default**: 4
    pub max_indent_skip: usize,

    /// Whether Backspace may step back over accepted text in strict mode
    ///
    /// **Default**: true
    pub allow_backspace: bool,

    /// What the debounced save sends to the persistence collaborator
    ///
    /// **Default**: [`PersistMode::Snapshot`]
    pub persist: PersistMode,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            error_flash: Duration::from_millis(400),
            save_debounce: Duration::from_millis(1000),
            min_indent_skip: 2,
            max_indent_skip: 4,
            allow_backspace: true,
            persist: PersistMode::Snapshot,
        }
    }
}
