mod cleanup;
mod config;
mod errors;
mod index;
mod layout;
mod migration;
mod projects;
mod transfer;

use std::path::PathBuf;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::domain::clients::ClientRegistry;
use crate::domain::features::FeatureTaxonomy;
use crate::domain::project::{Project, ProjectInput, ProjectPatch};
use crate::locks::WriteLock;
use crate::settings::StoreSettings;

pub use errors::StoreError;

use cleanup::CleanupSummary;
use config::ConfigStore;
use layout::CatalogLayout;
use projects::ProjectRepository;
use transfer::{ExportDocument, ImportSummary};

/// Directory-backed catalog store rooted at one path. Every call goes to
/// disk; mutations hold the root's write lock and refresh the read index.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
    settings: StoreSettings,
    layout: CatalogLayout,
}

impl Store {
    /// Opens a store at `root`, reading `showcase.toml` when present.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let settings = StoreSettings::load(&root)?;
        Ok(Self::with_settings(root, settings))
    }

    pub fn with_settings(root: impl Into<PathBuf>, settings: StoreSettings) -> Self {
        let root = root.into();
        let layout = CatalogLayout::live(&root);
        Self {
            root,
            settings,
            layout,
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.settings.index_file)
    }

    pub fn list_projects(&self) -> Vec<Project> {
        self.projects().list()
    }

    pub fn list_active_projects(&self) -> Vec<Project> {
        self.list_projects()
            .into_iter()
            .filter(|project| project.active)
            .collect()
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        self.projects().get(id)
    }

    pub fn create_project(&self, input: ProjectInput) -> Result<Project, StoreError> {
        let _lock = self.lock()?;
        let project = self.projects().create(input, now_rfc3339())?;
        info!(id = %project.id, "created project");
        self.refresh_index();
        Ok(project)
    }

    pub fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Project, StoreError> {
        let _lock = self.lock()?;
        let project = self.projects().update(id, patch)?;
        self.refresh_index();
        Ok(project)
    }

    /// Returns `false` when no record has this id.
    pub fn delete_project(&self, id: &str) -> Result<bool, StoreError> {
        let _lock = self.lock()?;
        let removed = self.projects().delete(id)?;
        if removed {
            info!(id = %id, "deleted project");
        }
        self.refresh_index();
        Ok(removed)
    }

    pub fn features(&self) -> Result<FeatureTaxonomy, StoreError> {
        self.configs().features()
    }

    pub fn put_features(&self, taxonomy: FeatureTaxonomy) -> Result<FeatureTaxonomy, StoreError> {
        let _lock = self.lock()?;
        self.configs().put_features(taxonomy)
    }

    pub fn clients(&self) -> Result<ClientRegistry, StoreError> {
        self.configs().clients()
    }

    pub fn put_clients(&self, registry: ClientRegistry) -> Result<ClientRegistry, StoreError> {
        let _lock = self.lock()?;
        self.configs().put_clients(registry)
    }

    pub fn featured(&self) -> Result<Vec<String>, StoreError> {
        self.configs().featured()
    }

    pub fn put_featured(&self, ids: Vec<String>) -> Result<Vec<String>, StoreError> {
        let _lock = self.lock()?;
        self.configs().put_featured(ids)
    }

    pub fn palette(&self) -> Result<Vec<String>, StoreError> {
        self.configs().palette()
    }

    /// All-or-nothing: one malformed color rejects the batch and the stored
    /// palette stays as it was.
    pub fn put_palette(&self, colors: Vec<String>) -> Result<Vec<String>, StoreError> {
        let _lock = self.lock()?;
        self.configs().put_palette(colors)
    }

    pub fn cleanup_invalid_features(&self) -> Result<CleanupSummary, StoreError> {
        let _lock = self.lock()?;
        let taxonomy = self.configs().features()?;
        let summary = cleanup::remove_undefined_features(&self.projects(), &taxonomy)?;
        info!(
            cleaned = summary.cleaned,
            removed = summary.removed,
            "removed undefined feature references"
        );
        if summary.cleaned > 0 {
            self.refresh_index();
        }
        Ok(summary)
    }

    pub fn export_all(&self) -> Result<ExportDocument, StoreError> {
        let document = transfer::export_catalog(&self.layout, now_rfc3339())?;
        info!(
            projects = document.projects.len(),
            clients = document.clients.len(),
            client_logos = document.client_logos.len(),
            "exported catalog"
        );
        Ok(document)
    }

    /// Replaces the whole catalog with `document`. The document is validated
    /// and the replacement built off to the side before the live catalog is
    /// swapped out, so a rejected or failed import changes nothing.
    pub fn import_all(&self, document: ExportDocument) -> Result<ImportSummary, StoreError> {
        let prepared = transfer::prepare_import(document)?;
        let summary = prepared.summary();
        let _lock = self.lock()?;
        transfer::replace_catalog(&self.root, |staged| {
            transfer::build_catalog(staged, prepared)
        })?;
        info!(
            projects = summary.projects,
            client_logos = summary.client_logos,
            "imported catalog"
        );
        self.refresh_index();
        Ok(summary)
    }

    /// Empties the catalog and resets every config document to its default.
    pub fn delete_all(&self) -> Result<(), StoreError> {
        let _lock = self.lock()?;
        transfer::replace_catalog(&self.root, transfer::build_empty_catalog)?;
        info!("deleted all catalog content");
        self.refresh_index();
        Ok(())
    }

    /// Rebuilds the read index, surfacing any failure.
    pub fn reindex(&self) -> Result<usize, StoreError> {
        index::write_index(
            self.list_projects(),
            &self.index_path(),
            &self.settings.asset_url_prefix,
        )
    }

    /// Post-mutation projection. The mutation has already committed, so a
    /// failure here is only logged.
    fn refresh_index(&self) {
        if let Err(err) = self.reindex() {
            warn!(path = %self.index_path().display(), error = %err, "index projection failed");
        }
    }

    fn lock(&self) -> Result<WriteLock, StoreError> {
        Ok(WriteLock::acquire(&self.root, self.settings.lock_timeout())?)
    }

    fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(self.layout.clone())
    }

    fn configs(&self) -> ConfigStore {
        ConfigStore::new(self.layout.clone())
    }
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            now.year(),
            u8::from(now.month()),
            now.day(),
            now.hour(),
            now.minute(),
            now.second()
        )
    })
}

#[cfg(test)]
mod tests;
