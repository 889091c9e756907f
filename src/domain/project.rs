use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use super::project_type::ProjectType;

/// One showcase instance as persisted in `project.json`.
///
/// `features` and `client` are soft references: they name entries in the
/// feature taxonomy and client registry but nothing enforces that those
/// entries exist. Dangling feature names are repaired by the cleanup pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub link: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: String,
}

fn default_active() -> bool {
    true
}

/// Caller-supplied fields for a new project. `screenshot`, when present, is
/// an inline `data:image/...;base64,` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub link: String,
    #[serde(rename = "type", default)]
    pub project_type: Option<ProjectType>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ProjectInput {
    pub fn validate(&self) -> Result<ProjectType, String> {
        if self.name.trim().is_empty() {
            return Err("project name is required".to_string());
        }
        if self.link.trim().is_empty() {
            return Err("project link is required".to_string());
        }
        self.project_type
            .ok_or_else(|| "project type is required".to_string())
    }

    /// Builds the record that will be written, minus any screenshot.
    pub fn into_project(self, id: String, created_at: String) -> Result<Project, String> {
        let project_type = self.validate()?;
        Ok(Project {
            id,
            name: self.name.trim().to_string(),
            link: self.link.trim().to_string(),
            project_type,
            features: normalize_features(self.features),
            screenshot: None,
            description: non_empty(self.description),
            client: non_empty(self.client),
            active: self.active.unwrap_or(true),
            created_at,
        })
    }
}

/// Partial update. Absent fields keep their current value; `id` and
/// `createdAt` are accepted on the wire but never applied.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(rename = "type", default)]
    pub project_type: Option<ProjectType>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub client: Option<Option<String>>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ProjectPatch {
    pub fn validate(&self) -> Result<(), String> {
        if self
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err("project name cannot be empty".to_string());
        }
        if self
            .link
            .as_deref()
            .is_some_and(|link| link.trim().is_empty())
        {
            return Err("project link cannot be empty".to_string());
        }
        Ok(())
    }

    /// Merges this patch over `current`. The screenshot is left alone: it is
    /// only replaced through an inline payload handled by the repository.
    pub fn apply(self, current: &Project) -> Project {
        let mut next = current.clone();
        if let Some(name) = self.name {
            next.name = name.trim().to_string();
        }
        if let Some(link) = self.link {
            next.link = link.trim().to_string();
        }
        if let Some(project_type) = self.project_type {
            next.project_type = project_type;
        }
        if let Some(features) = self.features {
            next.features = normalize_features(features);
        }
        if let Some(description) = self.description {
            next.description = non_empty(description);
        }
        if let Some(client) = self.client {
            next.client = non_empty(client);
        }
        if let Some(active) = self.active {
            next.active = active;
        }
        next.id = current.id.clone();
        next.created_at = current.created_at.clone();
        next
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims names, drops blanks and duplicates; first occurrence wins.
pub fn normalize_features(features: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    features
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    match value.map(|raw| raw.trim().to_string()) {
        Some(trimmed) if !trimmed.is_empty() => Some(trimmed),
        _ => None,
    }
}
