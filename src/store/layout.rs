use std::path::{Path, PathBuf};

pub const CATALOG_DIR: &str = "catalog";
pub const PROJECTS_DIR: &str = "projects";
pub const CONFIG_DIR: &str = "config";
pub const LOGOS_DIR: &str = "client-logos";
pub const PROJECT_FILE: &str = "project.json";
pub const SCREENSHOT_STEM: &str = "screenshot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigDocument {
    Features,
    Clients,
    Featured,
    Palette,
}

impl ConfigDocument {
    pub fn file_name(self) -> &'static str {
        match self {
            ConfigDocument::Features => "features.json",
            ConfigDocument::Clients => "clients.json",
            ConfigDocument::Featured => "featured.json",
            ConfigDocument::Palette => "palette.json",
        }
    }
}

/// Paths inside one catalog tree. The live tree is `<root>/catalog`; import
/// and delete-all build a replacement tree elsewhere with the same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLayout {
    dir: PathBuf,
}

impl CatalogLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn live(root: &Path) -> Self {
        Self::new(root.join(CATALOG_DIR))
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.dir.join(PROJECTS_DIR)
    }

    pub fn project_dir(&self, id: &str) -> PathBuf {
        self.projects_dir().join(id)
    }

    pub fn project_file(&self, id: &str) -> PathBuf {
        self.project_dir(id).join(PROJECT_FILE)
    }

    pub fn config_file(&self, document: ConfigDocument) -> PathBuf {
        self.dir.join(CONFIG_DIR).join(document.file_name())
    }

    pub fn logos_dir(&self) -> PathBuf {
        self.dir.join(LOGOS_DIR)
    }
}

pub fn screenshot_path(id: &str, file_name: &str) -> String {
    format!("/{PROJECTS_DIR}/{id}/{file_name}")
}

pub fn logo_path(file_name: &str) -> String {
    format!("/{LOGOS_DIR}/{file_name}")
}

/// Stem safe to use as a single file-name component.
pub fn is_safe_stem(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('.')
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}
