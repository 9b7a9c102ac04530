//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may be partial: missing fields get their default value.

use serde::{Deserialize, Serialize};
use tally_core::ParticipantSet;
use tally_core::constants::DEFAULT_PARTICIPANTS;

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "participants": ["Anna", "Bella", "Chloe"],
///   "storage": { "dataDir": "data", "key": "tasks" },
///   "persistence": { "quiescenceMs": 500 },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TallySettings {
    /// Names tasks can be assigned to.
    pub participants: Vec<String>,
    /// Where the task collection is stored.
    pub storage: StorageSettings,
    /// Debounced write behaviour.
    pub persistence: PersistenceSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl TallySettings {
    /// The configured participants as a [`ParticipantSet`].
    pub fn participant_set(&self) -> ParticipantSet {
        ParticipantSet::new(self.participants.iter().cloned())
    }
}

impl Default for TallySettings {
    fn default() -> Self {
        Self {
            participants: DEFAULT_PARTICIPANTS.iter().map(ToString::to_string).collect(),
            storage: StorageSettings::default(),
            persistence: PersistenceSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Durable storage location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Data directory; relative paths resolve against `~/.tally`.
    pub data_dir: String,
    /// Name of the storage slot holding the task collection.
    pub key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            key: "tasks".to_string(),
        }
    }
}

/// Debounced persistence timings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistenceSettings {
    /// Quiet period after the last change before writing.
    pub quiescence_ms: u64,
    /// Minimum time the "saving" status stays visible.
    pub min_saving_visible_ms: u64,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            quiescence_ms: 500,
            min_saving_visible_ms: 300,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = TallySettings::default();
        assert_eq!(settings.participants, ["Anna", "Bella", "Chloe"]);
        assert_eq!(settings.storage.key, "tasks");
        assert_eq!(settings.persistence.quiescence_ms, 500);
        assert_eq!(settings.persistence.min_saving_visible_ms, 300);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(TallySettings::default()).unwrap();
        assert_eq!(json["storage"]["dataDir"], "data");
        assert_eq!(json["persistence"]["minSavingVisibleMs"], 300);
    }

    #[test]
    fn stray_version_key_is_ignored() {
        let json = serde_json::to_value(TallySettings::default()).unwrap();
        assert!(json.get("version").is_none());

        let settings: TallySettings =
            serde_json::from_str(r#"{"version": "0.1.0", "participants": ["Dana"]}"#).unwrap();
        assert_eq!(settings.participants, ["Dana"]);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: TallySettings =
            serde_json::from_str(r#"{"persistence": {"quiescenceMs": 50}}"#).unwrap();
        assert_eq!(settings.persistence.quiescence_ms, 50);
        assert_eq!(settings.persistence.min_saving_visible_ms, 300);
        assert_eq!(settings.storage.key, "tasks");
    }

    #[test]
    fn participant_set_from_settings() {
        let settings = TallySettings {
            participants: vec!["Dana".into(), "Eli".into()],
            ..TallySettings::default()
        };
        let set = settings.participant_set();
        assert!(set.contains("Dana"));
        assert!(!set.contains("Anna"));
    }
}
