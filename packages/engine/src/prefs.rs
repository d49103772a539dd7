//! Persisted narration preferences.
//!
//! Remembers the user's last-used engine and, per `(engine, language)`,
//! the last-used voice id. Backed by a JSON file written on every
//! mutation; a missing or unreadable file degrades to empty prefs.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PrefData {
    engine: Option<String>,
    /// `"engine/lang"` -> voice id.
    #[serde(default)]
    voices: HashMap<String, String>,
}

/// Key/value store for engine and voice preferences.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    data: RwLock<PrefData>,
}

impl PreferenceStore {
    /// Open a store backed by the given JSON file, creating it lazily.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed preference file");
                PrefData::default()
            }),
            Err(_) => PrefData::default(),
        };
        Self {
            path: Some(path),
            data: RwLock::new(data),
        }
    }

    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(PrefData::default()),
        }
    }

    /// Last-used engine name, if any.
    pub fn engine(&self) -> Option<String> {
        self.data.read().engine.clone()
    }

    /// Remember the last-used engine.
    pub fn set_engine(&self, name: impl Into<String>) {
        {
            self.data.write().engine = Some(name.into());
        }
        self.persist();
    }

    /// Last-used voice for an `(engine, language)` pair.
    pub fn voice_for(&self, engine: &str, lang: &str) -> Option<String> {
        self.data.read().voices.get(&key(engine, lang)).cloned()
    }

    /// Remember the last-used voice for an `(engine, language)` pair.
    pub fn set_voice(&self, engine: &str, lang: &str, voice_id: impl Into<String>) {
        {
            self.data
                .write()
                .voices
                .insert(key(engine, lang), voice_id.into());
        }
        self.persist();
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let data = self.data.read().clone();
        match serde_json::to_string_pretty(&data) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(path, raw) {
                    warn!(path = %path.display(), error = %e, "failed to persist preferences");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize preferences"),
        }
    }
}

fn key(engine: &str, lang: &str) -> String {
    format!("{engine}/{lang}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_preference_is_scoped_to_engine_and_lang() {
        let prefs = PreferenceStore::in_memory();
        prefs.set_voice("edge", "en-US", "en-US-JennyNeural");
        assert_eq!(
            prefs.voice_for("edge", "en-US").as_deref(),
            Some("en-US-JennyNeural")
        );
        assert!(prefs.voice_for("edge", "fr-FR").is_none());
        assert!(prefs.voice_for("other", "en-US").is_none());
    }

    #[test]
    fn preferences_survive_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        {
            let prefs = PreferenceStore::open(&path);
            prefs.set_engine("edge");
            prefs.set_voice("edge", "en-US", "en-US-AriaNeural");
        }
        let reopened = PreferenceStore::open(&path);
        assert_eq!(reopened.engine().as_deref(), Some("edge"));
        assert_eq!(
            reopened.voice_for("edge", "en-US").as_deref(),
            Some("en-US-AriaNeural")
        );
    }

    #[test]
    fn malformed_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();
        let prefs = PreferenceStore::open(&path);
        assert!(prefs.engine().is_none());
    }
}
