use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::assets::{self, InlineImage};
use crate::domain::clients::ClientRegistry;
use crate::domain::features::{FeatureTaxonomy, StoredTaxonomy};
use crate::domain::palette::{default_palette, validate_palette, DEFAULT_PALETTE};
use crate::domain::project::{normalize_features, Project};
use crate::slug::unique_id;

use super::config::ConfigStore;
use super::errors::StoreError;
use super::layout::{is_safe_stem, CatalogLayout, CATALOG_DIR};
use super::migration::migrate_taxonomy;
use super::projects::{decode_inline, is_storage_id, ProjectRepository};

pub const EXPORT_VERSION: &str = "1.0";

/// The whole catalog in one document, with every asset inlined as a data URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub export_date: String,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub clients: ClientRegistry,
    /// Logo file stem -> data URI.
    #[serde(default)]
    pub client_logos: BTreeMap<String, String>,
    #[serde(default)]
    pub features: StoredTaxonomy,
    #[serde(default)]
    pub featured_instances: Vec<String>,
    #[serde(default = "default_palette")]
    pub color_palette: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub projects: usize,
    pub client_logos: usize,
}

pub fn export_catalog(
    layout: &CatalogLayout,
    export_date: String,
) -> Result<ExportDocument, StoreError> {
    let repository = ProjectRepository::new(layout.clone());
    let configs = ConfigStore::new(layout.clone());

    let clients = configs.clients()?;
    let mut projects = Vec::new();
    for mut project in repository.list() {
        project.screenshot = match repository.screenshot_file(&project.id) {
            Some(path) => Some(assets::read_as_data_uri(&path)?),
            None => None,
        };
        projects.push(project);
    }
    let client_logos = read_logos(&layout.logos_dir(), &clients)?;

    Ok(ExportDocument {
        version: EXPORT_VERSION.to_string(),
        export_date,
        projects,
        clients,
        client_logos,
        features: configs.features()?.to_stored(),
        featured_instances: configs.featured()?,
        color_palette: configs.palette()?,
    })
}

/// Everything an import will write, decoded and validated up front.
#[derive(Debug)]
pub struct PreparedImport {
    projects: Vec<(Project, Option<InlineImage>)>,
    logos: Vec<(String, InlineImage)>,
    clients: ClientRegistry,
    features: FeatureTaxonomy,
    featured: Vec<String>,
    palette: Vec<String>,
}

impl PreparedImport {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            projects: self.projects.len(),
            client_logos: self.logos.len(),
        }
    }
}

pub fn prepare_import(document: ExportDocument) -> Result<PreparedImport, StoreError> {
    let major = document.version.split('.').next().unwrap_or_default();
    if !document.version.is_empty() && major != "1" {
        return Err(StoreError::Validation(format!(
            "unsupported export version '{}'",
            document.version
        )));
    }

    let mut seen = HashSet::new();
    let mut projects = Vec::with_capacity(document.projects.len());
    for mut project in document.projects {
        if project.name.trim().is_empty() || project.link.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "imported project '{}' is missing a name or link",
                project.id
            )));
        }
        if project.id.is_empty() {
            project.id = unique_id(&project.name, |candidate| seen.contains(candidate));
        }
        if !is_storage_id(&project.id) {
            return Err(StoreError::Validation(format!(
                "'{}' is not a valid project id",
                project.id
            )));
        }
        if !seen.insert(project.id.clone()) {
            return Err(StoreError::Validation(format!(
                "duplicate project id '{}' in import",
                project.id
            )));
        }

        let screenshot = project.screenshot.take();
        let image = decode_inline(screenshot.as_deref())?;
        if let (None, Some(path)) = (image.as_ref(), screenshot.as_deref()) {
            warn!(id = %project.id, screenshot = %path, "dropping non-inline screenshot from import");
        }
        project.features = normalize_features(project.features);
        projects.push((project, image));
    }

    let mut logos = Vec::with_capacity(document.client_logos.len());
    for (stem, payload) in document.client_logos {
        if !is_safe_stem(&stem) {
            return Err(StoreError::Validation(format!(
                "'{}' is not a valid client logo name",
                stem
            )));
        }
        let image = assets::decode_data_uri(&payload)?;
        logos.push((stem, image));
    }

    document
        .clients
        .validate()
        .map_err(StoreError::Validation)?;
    let features = migrate_taxonomy(document.features, &DEFAULT_PALETTE).taxonomy;
    features.validate().map_err(StoreError::Validation)?;
    validate_palette(&document.color_palette).map_err(StoreError::Validation)?;

    Ok(PreparedImport {
        projects,
        logos,
        clients: document.clients,
        features,
        featured: document.featured_instances,
        palette: document.color_palette,
    })
}

/// Writes a prepared import into an empty catalog tree.
pub fn build_catalog(layout: &CatalogLayout, prepared: PreparedImport) -> Result<(), StoreError> {
    let repository = ProjectRepository::new(layout.clone());
    std::fs::create_dir_all(layout.projects_dir())?;
    for (project, image) in prepared.projects {
        repository.restore(project, image.as_ref())?;
    }

    let logos_dir = layout.logos_dir();
    std::fs::create_dir_all(&logos_dir)?;
    for (stem, image) in &prepared.logos {
        assets::write_image(&logos_dir, stem, image)?;
    }

    let configs = ConfigStore::new(layout.clone());
    configs.put_clients(prepared.clients)?;
    configs.put_features(prepared.features)?;
    configs.put_featured(prepared.featured)?;
    configs.put_palette(prepared.palette)?;
    Ok(())
}

/// Writes an empty catalog: no records, no logos, default config documents.
pub fn build_empty_catalog(layout: &CatalogLayout) -> Result<(), StoreError> {
    std::fs::create_dir_all(layout.projects_dir())?;
    std::fs::create_dir_all(layout.logos_dir())?;
    ConfigStore::new(layout.clone()).reset()
}

/// Builds a replacement catalog in `<root>/.staging-<id>` and swaps it in
/// for `<root>/catalog`. A failed build leaves the live catalog untouched;
/// a failed swap puts the previous catalog back.
pub fn replace_catalog<F>(root: &Path, build: F) -> Result<(), StoreError>
where
    F: FnOnce(&CatalogLayout) -> Result<(), StoreError>,
{
    let token = Uuid::now_v7();
    let staging = root.join(format!(".staging-{token}"));
    let staged = CatalogLayout::new(&staging);
    let built = std::fs::create_dir_all(&staging)
        .map_err(StoreError::from)
        .and_then(|()| build(&staged));
    if let Err(err) = built {
        discard(&staging);
        return Err(err);
    }

    let live = root.join(CATALOG_DIR);
    let retired = root.join(format!(".retired-{token}"));
    let had_live = live.exists();
    if had_live {
        if let Err(err) = std::fs::rename(&live, &retired) {
            discard(&staging);
            return Err(err.into());
        }
    }
    if let Err(err) = std::fs::rename(&staging, &live) {
        if had_live {
            if let Err(rollback) = std::fs::rename(&retired, &live) {
                error!(
                    retired = %retired.display(),
                    error = %rollback,
                    "unable to restore previous catalog; it remains at the retired path"
                );
            }
        }
        discard(&staging);
        return Err(err.into());
    }
    if had_live {
        discard(&retired);
    }
    Ok(())
}

/// Logo files keyed by stem. When several formats share a stem, the one the
/// registry points at wins.
fn read_logos(
    dir: &Path,
    clients: &ClientRegistry,
) -> Result<BTreeMap<String, String>, StoreError> {
    let referenced: HashSet<String> = clients
        .entries()
        .filter_map(|(_, entry)| entry.logo.as_deref())
        .filter_map(|logo| logo.rsplit('/').next())
        .map(str::to_string)
        .collect();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => return Err(err.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let is_referenced = |candidate: &Path| {
        candidate
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| referenced.contains(name))
    };
    let mut chosen: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in files {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let replace = match chosen.get(stem) {
            None => true,
            Some(kept) => {
                let prefer_new = !is_referenced(kept.as_path()) && is_referenced(path.as_path());
                let skipped = if prefer_new { kept } else { &path };
                warn!(stem = %stem, skipped = %skipped.display(), "multiple logo files share a name");
                prefer_new
            }
        };
        if replace {
            chosen.insert(stem.to_string(), path.clone());
        }
    }

    let mut logos = BTreeMap::new();
    for (stem, path) in chosen {
        logos.insert(stem, assets::read_as_data_uri(&path)?);
    }
    Ok(logos)
}

fn discard(path: &Path) {
    if let Err(err) = std::fs::remove_dir_all(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "unable to remove temporary catalog");
        }
    }
}
