//! # tally-settings
//!
//! Layered configuration for Tally.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`TallySettings::default()`]
//! 2. **User file**: `~/.tally/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TALLY_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use tally_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("debounce: {}ms", settings.persistence.quiescence_ms);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_settings, load_settings_from_path, resolve_data_dir, settings_path,
    tally_home,
};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
static SETTINGS: OnceLock<TallySettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.tally/settings.json` with env var
/// overrides. If loading fails, logs the error and returns compiled defaults.
pub fn get_settings() -> &'static TallySettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|error| {
            tracing::warn!(%error, "failed to load settings, using defaults");
            TallySettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: TallySettings) -> std::result::Result<(), TallySettings> {
    SETTINGS.set(settings)
}
