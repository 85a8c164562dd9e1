use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::providers::configs::ProviderConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// One configured provider as the user sees it: a stable id, a display
/// name, the provider-specific config, and whether it is the one in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub config: ProviderConfig,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            providers: vec![
                ProviderEntry {
                    id: "openai".to_string(),
                    name: "OpenAI".to_string(),
                    config: ProviderConfig::openai(),
                    active: true,
                },
                ProviderEntry {
                    id: "anthropic".to_string(),
                    name: "Anthropic".to_string(),
                    config: ProviderConfig::anthropic(),
                    active: false,
                },
                ProviderEntry {
                    id: "ollama".to_string(),
                    name: "Ollama".to_string(),
                    config: ProviderConfig::ollama(),
                    active: false,
                },
            ],
            theme: Theme::default(),
            auto_save: default_auto_save(),
        }
    }
}

impl Settings {
    pub fn active_provider(&self) -> Option<&ProviderEntry> {
        self.providers.iter().find(|entry| entry.active)
    }

    pub fn provider(&self, id: &str) -> Option<&ProviderEntry> {
        self.providers.iter().find(|entry| entry.id == id)
    }

    pub fn provider_mut(&mut self, id: &str) -> Option<&mut ProviderEntry> {
        self.providers.iter_mut().find(|entry| entry.id == id)
    }

    /// Adds an entry, replacing any existing entry with the same id. An
    /// entry arriving active demotes the rest.
    pub fn add_provider(&mut self, entry: ProviderEntry) {
        let id = entry.id.clone();
        let make_active = entry.active;
        match self.provider_mut(&id) {
            Some(existing) => *existing = entry,
            None => self.providers.push(entry),
        }
        if make_active {
            self.set_active_provider(&id);
        }
    }

    pub fn remove_provider(&mut self, id: &str) -> bool {
        let before = self.providers.len();
        self.providers.retain(|entry| entry.id != id);
        self.providers.len() != before
    }

    /// Flips one entry's active flag. The roster may end up with several
    /// active entries or none; `active_provider` picks the first.
    pub fn toggle_provider(&mut self, id: &str) -> bool {
        match self.provider_mut(id) {
            Some(entry) => {
                entry.active = !entry.active;
                true
            }
            None => false,
        }
    }

    /// Marks exactly one entry active. Unknown ids leave the roster as is.
    pub fn set_active_provider(&mut self, id: &str) -> bool {
        if self.provider(id).is_none() {
            return false;
        }
        for entry in &mut self.providers {
            entry.active = entry.id == id;
        }
        true
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        for entry in &self.providers {
            entry
                .config
                .validate()
                .map_err(|source| StoreError::InvalidProvider {
                    id: entry.id.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

fn default_auto_save() -> bool {
    true
}
