use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::assets;
use crate::domain::clients::ClientRegistry;
use crate::domain::features::{FeatureTaxonomy, StoredTaxonomy};
use crate::domain::palette::{default_palette, validate_palette, DEFAULT_PALETTE};
use crate::slug::sanitize_id;

use super::errors::StoreError;
use super::layout::{logo_path, CatalogLayout, ConfigDocument, LOGOS_DIR};
use super::migration::migrate_taxonomy;

const FALLBACK_LOGO_STEM: &str = "client";

enum Loaded<T> {
    Present(T),
    Missing,
    Corrupt,
}

/// The four singleton documents under `config/`. `get` on a missing document
/// persists and returns its built-in default; `put` replaces the whole
/// document.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    layout: CatalogLayout,
}

impl ConfigStore {
    pub fn new(layout: CatalogLayout) -> Self {
        Self { layout }
    }

    pub fn features(&self) -> Result<FeatureTaxonomy, StoreError> {
        let stored = match self.load::<StoredTaxonomy>(ConfigDocument::Features)? {
            Loaded::Present(stored) => stored,
            Loaded::Missing => {
                return self.init_default(ConfigDocument::Features, FeatureTaxonomy::default())
            }
            Loaded::Corrupt => return Ok(FeatureTaxonomy::default()),
        };
        let migration = migrate_taxonomy(stored, &DEFAULT_PALETTE);
        if migration.changed() {
            self.write(ConfigDocument::Features, &migration.taxonomy)?;
            info!(upgraded = migration.upgraded, "migrated legacy feature names");
        }
        Ok(migration.taxonomy)
    }

    pub fn put_features(&self, taxonomy: FeatureTaxonomy) -> Result<FeatureTaxonomy, StoreError> {
        let taxonomy = FeatureTaxonomy::new(taxonomy.by_type().clone());
        taxonomy.validate().map_err(StoreError::Validation)?;
        self.write(ConfigDocument::Features, &taxonomy)?;
        Ok(taxonomy)
    }

    pub fn clients(&self) -> Result<ClientRegistry, StoreError> {
        self.get_or_init(ConfigDocument::Clients, ClientRegistry::default)
    }

    /// Inline logos are written to `client-logos/<slug>.<ext>` and replaced by
    /// their stored path before the registry itself is saved. A new logo
    /// removes any earlier `<slug>.*` file so only one format survives.
    pub fn put_clients(&self, mut registry: ClientRegistry) -> Result<ClientRegistry, StoreError> {
        registry.validate().map_err(StoreError::Validation)?;

        let mut decoded = Vec::new();
        for (name, entry) in registry.entries() {
            if let Some(logo) = entry.logo.as_deref().filter(|logo| assets::is_inline_payload(logo)) {
                decoded.push((name.clone(), assets::decode_data_uri(logo)?));
            }
        }
        check_logo_stems(&registry, &decoded)?;

        let logos_dir = self.layout.logos_dir();
        for (name, entry) in registry.entries_mut() {
            let Some(position) = decoded.iter().position(|(owner, _)| owner == name) else {
                continue;
            };
            let (_, image) = decoded.swap_remove(position);
            let stem = logo_stem(name);
            let file_name = assets::write_image(&logos_dir, &stem, &image)?;
            for stale in assets::remove_siblings(&logos_dir, &stem, &file_name)? {
                info!(client = %name, removed = %stale, "replaced client logo");
            }
            entry.logo = Some(logo_path(&file_name));
        }

        self.write(ConfigDocument::Clients, &registry)?;
        Ok(registry)
    }

    pub fn featured(&self) -> Result<Vec<String>, StoreError> {
        self.get_or_init(ConfigDocument::Featured, Vec::new)
    }

    /// Dangling ids are kept; duplicates are dropped.
    pub fn put_featured(&self, ids: Vec<String>) -> Result<Vec<String>, StoreError> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        self.write(ConfigDocument::Featured, &ids)?;
        Ok(ids)
    }

    pub fn palette(&self) -> Result<Vec<String>, StoreError> {
        self.get_or_init(ConfigDocument::Palette, default_palette)
    }

    pub fn put_palette(&self, colors: Vec<String>) -> Result<Vec<String>, StoreError> {
        validate_palette(&colors).map_err(StoreError::Validation)?;
        self.write(ConfigDocument::Palette, &colors)?;
        Ok(colors)
    }

    /// Writes every document's default, as used for a freshly emptied catalog.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.write(ConfigDocument::Features, &FeatureTaxonomy::default())?;
        self.write(ConfigDocument::Clients, &ClientRegistry::default())?;
        self.write(ConfigDocument::Featured, &Vec::<String>::new())?;
        self.write(ConfigDocument::Palette, &default_palette())?;
        Ok(())
    }

    fn get_or_init<T, F>(&self, document: ConfigDocument, default: F) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.load(document)? {
            Loaded::Present(value) => Ok(value),
            Loaded::Missing => self.init_default(document, default()),
            Loaded::Corrupt => Ok(default()),
        }
    }

    /// An unparsable document is logged and reported as corrupt; reads never
    /// overwrite it.
    fn load<T: DeserializeOwned>(&self, document: ConfigDocument) -> Result<Loaded<T>, StoreError> {
        let path = self.layout.config_file(document);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Loaded::Missing),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_slice(&raw) {
            Ok(value) => Ok(Loaded::Present(value)),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "config document is unreadable; serving built-in default"
                );
                Ok(Loaded::Corrupt)
            }
        }
    }

    fn init_default<T: Serialize>(
        &self,
        document: ConfigDocument,
        value: T,
    ) -> Result<T, StoreError> {
        if let Err(err) = self.write(document, &value) {
            warn!(document = document.file_name(), error = %err, "unable to persist default document");
        }
        Ok(value)
    }

    fn write<T: Serialize>(&self, document: ConfigDocument, value: &T) -> Result<(), StoreError> {
        let path = self.layout.config_file(document);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut payload = serde_json::to_vec_pretty(value)?;
        payload.push(b'\n');
        std::fs::write(path, payload)?;
        Ok(())
    }
}

/// Each inline logo needs a file stem no other client in the batch uses,
/// whether that client is uploading too or already points at a stored logo.
fn check_logo_stems(
    registry: &ClientRegistry,
    decoded: &[(String, assets::InlineImage)],
) -> Result<(), StoreError> {
    let mut uploads: HashMap<String, &str> = HashMap::new();
    for (name, _) in decoded {
        let stem = logo_stem(name);
        if let Some(previous) = uploads.insert(stem.clone(), name.as_str()) {
            return Err(shared_logo(previous, name, &stem));
        }
    }
    for (name, entry) in registry.entries() {
        let Some(stem) = entry.logo.as_deref().and_then(stored_logo_stem) else {
            continue;
        };
        match uploads.get(&stem) {
            Some(owner) if *owner != name.as_str() => {
                return Err(shared_logo(owner, name, &stem));
            }
            _ => {}
        }
    }
    Ok(())
}

fn shared_logo(first: &str, second: &str, stem: &str) -> StoreError {
    StoreError::Validation(format!(
        "clients '{}' and '{}' would share the logo file '{}'",
        first, second, stem
    ))
}

fn stored_logo_stem(logo: &str) -> Option<String> {
    let file_name = logo.strip_prefix(&format!("/{LOGOS_DIR}/"))?;
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

fn logo_stem(client_name: &str) -> String {
    let stem = sanitize_id(client_name);
    if stem.is_empty() {
        FALLBACK_LOGO_STEM.to_string()
    } else {
        stem
    }
}
