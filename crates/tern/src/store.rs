use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::StoreError;
use crate::models::conversation::Conversation;
use crate::settings::Settings;

pub const CONVERSATIONS_FILE: &str = "conversations.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Directory all persisted state lives under, `~/.config/tern`.
pub fn app_dir() -> Result<PathBuf, StoreError> {
    let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
    Ok(home.join(".config").join("tern"))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// On-disk conversation history.
#[derive(Debug)]
pub struct ConversationStore {
    path: PathBuf,
}

impl ConversationStore {
    pub fn new() -> Result<Self, StoreError> {
        Ok(ConversationStore {
            path: app_dir()?.join(CONVERSATIONS_FILE),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        ConversationStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved conversation list. A store that has never been
    /// written reads as empty.
    pub fn load(&self) -> Result<Vec<Conversation>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, conversations: &[Conversation]) -> Result<(), StoreError> {
        write_json(&self.path, &conversations)
    }
}

/// On-disk user settings.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Result<Self, StoreError> {
        Ok(SettingsStore {
            path: app_dir()?.join(SETTINGS_FILE),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        SettingsStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, falling back to the defaults when nothing has been
    /// saved yet. A roster with an invalid provider entry fails the load.
    pub fn load(&self) -> Result<Settings, StoreError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let json = fs::read_to_string(&self.path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        write_json(&self.path, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_conversation_round_trip() {
        let dir = tempdir().unwrap();
        let store = ConversationStore::at(dir.path().join(CONVERSATIONS_FILE));

        let mut conversation = Conversation::new("Test");
        conversation.push(Message::user("hello"));
        store.save(&[conversation.clone()]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, conversation.id);
        assert_eq!(loaded[0].messages[0].content, "hello");
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = ConversationStore::at(dir.path().join("nope.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONVERSATIONS_FILE);
        fs::write(&path, "definitely not json").unwrap();

        let store = ConversationStore::at(path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = ConversationStore::at(dir.path().join("deep/nested/history.json"));
        store.save(&[]).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join(SETTINGS_FILE));

        let mut settings = Settings::default();
        settings.set_active_provider("ollama");
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.active_provider().unwrap().id, "ollama");
    }

    #[test]
    fn test_missing_settings_load_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::at(dir.path().join(SETTINGS_FILE));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_provider_entry_fails_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let payload = json!({
            "providers": [
                {"id": "bad", "name": "Bad", "type": "ollama", "host": "not-a-url", "model": "llama3.2"}
            ]
        });
        fs::write(&path, payload.to_string()).unwrap();

        let store = SettingsStore::at(path);
        assert!(matches!(
            store.load(),
            Err(StoreError::InvalidProvider { id, .. }) if id == "bad"
        ));
    }
}
