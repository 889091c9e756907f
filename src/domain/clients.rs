use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `logo` holds either a stored path (`/client-logos/<slug>.<ext>`) or, on
/// the way in, an inline data URI that the registry store materializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ClientRegistry(BTreeMap<String, ClientEntry>);

impl ClientRegistry {
    pub fn new(entries: BTreeMap<String, ClientEntry>) -> Self {
        Self(entries)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&ClientEntry> {
        self.0.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &ClientEntry)> {
        self.0.iter()
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&String, &mut ClientEntry)> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (key, entry) in &self.0 {
            if key.trim().is_empty() {
                return Err("client names cannot be empty".to_string());
            }
            if key != &entry.name {
                return Err(format!(
                    "client key '{}' does not match entry name '{}'",
                    key, entry.name
                ));
            }
        }
        Ok(())
    }
}
