use std::path::Path;

use tracing::warn;

use crate::assets::{self, InlineImage, SCREENSHOT_EXTENSIONS};
use crate::domain::project::{Project, ProjectInput, ProjectPatch};
use crate::slug::{sanitize_id, unique_id};

use super::errors::StoreError;
use super::layout::{screenshot_path, CatalogLayout, SCREENSHOT_STEM};

/// CRUD over `projects/<id>/` storage units. Knows nothing about the read
/// index; the store facade projects it after each mutation.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    layout: CatalogLayout,
}

impl ProjectRepository {
    pub fn new(layout: CatalogLayout) -> Self {
        Self { layout }
    }

    /// Every readable record, oldest first. Units whose metadata cannot be
    /// parsed are logged and skipped; an unreadable projects directory yields
    /// an empty list.
    pub fn list(&self) -> Vec<Project> {
        let dir = self.layout.projects_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "unable to enumerate projects");
                return Vec::new();
            }
        };

        let mut projects = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable project entry");
                    continue;
                }
            };
            if !path.is_dir() {
                continue;
            }
            let Some(id) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            match self.read_unit(id) {
                Ok(Some(project)) => projects.push(project),
                Ok(None) => {}
                Err(err) => {
                    warn!(id = %id, error = %err, "skipping project with unreadable metadata");
                }
            }
        }
        projects.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        projects
    }

    pub fn get(&self, id: &str) -> Result<Option<Project>, StoreError> {
        if !is_storage_id(id) {
            return Ok(None);
        }
        self.read_unit(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        is_storage_id(id) && self.layout.project_dir(id).exists()
    }

    pub fn create(&self, input: ProjectInput, created_at: String) -> Result<Project, StoreError> {
        input.validate().map_err(StoreError::Validation)?;
        let image = decode_inline(input.screenshot.as_deref())?;
        let id = unique_id(&input.name, |candidate| {
            self.layout.project_dir(candidate).exists()
        });
        let project = input
            .into_project(id, created_at)
            .map_err(StoreError::Validation)?;
        self.write_unit(project, image.as_ref())
    }

    /// Writes a record under its existing id, replacing any unit already
    /// there. Used when restoring an export.
    pub fn restore(
        &self,
        mut project: Project,
        image: Option<&InlineImage>,
    ) -> Result<Project, StoreError> {
        if !is_storage_id(&project.id) {
            return Err(StoreError::Validation(format!(
                "'{}' is not a valid project id",
                project.id
            )));
        }
        let dir = self.layout.project_dir(&project.id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        project.screenshot = None;
        self.write_unit(project, image)
    }

    pub fn update(&self, id: &str, patch: ProjectPatch) -> Result<Project, StoreError> {
        let current = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.validate().map_err(StoreError::Validation)?;
        let image = decode_inline(patch.screenshot.as_deref())?;

        let mut next = patch.apply(&current);
        if let Some(image) = image.as_ref() {
            let dir = self.layout.project_dir(id);
            let file_name = assets::write_image(&dir, SCREENSHOT_STEM, image)?;
            warn_stale_screenshots(&dir, id, &file_name);
            next.screenshot = Some(screenshot_path(id, &file_name));
        }
        self.write_metadata(&next)?;
        Ok(self.get(id)?.unwrap_or(next))
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        if !self.exists(id) {
            return Ok(false);
        }
        std::fs::remove_dir_all(self.layout.project_dir(id))?;
        Ok(true)
    }

    /// Overwrites the metadata file only; assets are untouched.
    pub fn write_metadata(&self, project: &Project) -> Result<(), StoreError> {
        let path = self.layout.project_file(&project.id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut payload = serde_json::to_vec_pretty(project)?;
        payload.push(b'\n');
        std::fs::write(path, payload)?;
        Ok(())
    }

    /// Absolute file path of a record's screenshot, if one is on disk.
    pub fn screenshot_file(&self, id: &str) -> Option<std::path::PathBuf> {
        if !is_storage_id(id) {
            return None;
        }
        assets::probe(
            &self.layout.project_dir(id),
            SCREENSHOT_STEM,
            &SCREENSHOT_EXTENSIONS,
        )
    }

    fn write_unit(
        &self,
        mut project: Project,
        image: Option<&InlineImage>,
    ) -> Result<Project, StoreError> {
        std::fs::create_dir_all(self.layout.project_dir(&project.id))?;
        self.write_metadata(&project)?;
        if let Some(image) = image {
            let file_name =
                assets::write_image(&self.layout.project_dir(&project.id), SCREENSHOT_STEM, image)?;
            project.screenshot = Some(screenshot_path(&project.id, &file_name));
            self.write_metadata(&project)?;
        }
        Ok(project)
    }

    fn read_unit(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let path = self.layout.project_file(id);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut project: Project = serde_json::from_slice(&raw)?;
        if project.id != id {
            warn!(dir = %id, recorded = %project.id, "metadata id differs from directory; using directory name");
            project.id = id.to_string();
        }
        project.screenshot = self.screenshot_file(id).and_then(|file| {
            file.file_name()
                .and_then(|name| name.to_str())
                .map(|name| screenshot_path(id, name))
        });
        Ok(Some(project))
    }
}

/// Ids are sanitized slugs, so anything else cannot name a storage unit.
pub fn is_storage_id(id: &str) -> bool {
    !id.is_empty() && sanitize_id(id) == id
}

/// Decodes an inline screenshot. Stored paths pass through as `None`, and
/// formats the record reader would not find again are rejected.
pub fn decode_inline(value: Option<&str>) -> Result<Option<InlineImage>, StoreError> {
    let image = match value {
        Some(payload) if assets::is_inline_payload(payload) => assets::decode_data_uri(payload)?,
        _ => return Ok(None),
    };
    if !SCREENSHOT_EXTENSIONS.contains(&image.extension.as_str()) {
        return Err(StoreError::Validation(format!(
            "unsupported screenshot format '{}'",
            image.extension
        )));
    }
    Ok(Some(image))
}

fn warn_stale_screenshots(dir: &Path, id: &str, written: &str) {
    for ext in SCREENSHOT_EXTENSIONS {
        let candidate = format!("{SCREENSHOT_STEM}.{ext}");
        if candidate != written && dir.join(&candidate).is_file() {
            warn!(
                id = %id,
                stale = %candidate,
                current = %written,
                "previous screenshot left in place and still served; the new upload stays hidden until it is removed"
            );
        }
    }
}
