use std::path::Path;

use crate::domain::project::Project;

use super::errors::StoreError;

/// Writes the flattened read index: every record, with screenshot paths
/// rewritten from catalog-rooted (`/projects/a/screenshot.png`) to
/// prefix-relative (`catalog/projects/a/screenshot.png`). The file is
/// replaced by rename so readers never observe a half-written index.
pub fn write_index(
    projects: Vec<Project>,
    index_path: &Path,
    asset_url_prefix: &str,
) -> Result<usize, StoreError> {
    let count = projects.len();
    let entries: Vec<Project> = projects
        .into_iter()
        .map(|mut project| {
            project.screenshot = project
                .screenshot
                .as_deref()
                .map(|path| relative_asset_path(asset_url_prefix, path));
            project
        })
        .collect();

    if let Some(parent) = index_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut payload = serde_json::to_vec_pretty(&entries)?;
    payload.push(b'\n');
    let staging = index_path.with_extension("json.tmp");
    std::fs::write(&staging, payload)?;
    std::fs::rename(&staging, index_path)?;
    Ok(count)
}

pub fn relative_asset_path(prefix: &str, catalog_path: &str) -> String {
    let relative = catalog_path.trim_start_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{prefix}/{relative}")
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::{relative_asset_path, write_index};
    use crate::domain::project::Project;
    use crate::domain::project_type::ProjectType;

    fn unique_workspace() -> PathBuf {
        let root = std::env::temp_dir().join(format!("showcase-index-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&root).expect("workspace should be creatable");
        root
    }

    fn project(id: &str, screenshot: Option<&str>) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_string(),
            link: format!("https://demo.example.com/{id}"),
            project_type: ProjectType::Exterior,
            features: Vec::new(),
            screenshot: screenshot.map(str::to_string),
            description: None,
            client: None,
            active: true,
            created_at: "2026-03-01T09:00:00Z".to_string(),
        }
    }

    #[test]
    fn rewrites_catalog_paths_relative_to_prefix() {
        assert_eq!(
            relative_asset_path("catalog", "/projects/a/screenshot.png"),
            "catalog/projects/a/screenshot.png"
        );
        assert_eq!(
            relative_asset_path("/static/data/", "/projects/a/screenshot.png"),
            "static/data/projects/a/screenshot.png"
        );
        assert_eq!(
            relative_asset_path("", "/projects/a/screenshot.png"),
            "projects/a/screenshot.png"
        );
    }

    #[test]
    fn writes_full_list_and_leaves_no_temp_file() {
        let root = unique_workspace();
        let index = root.join("index.json");
        let written = write_index(
            vec![
                project("a", Some("/projects/a/screenshot.webp")),
                project("b", None),
            ],
            &index,
            "catalog",
        )
        .expect("index should write");
        assert_eq!(written, 2);

        let saved: Vec<Project> = serde_json::from_slice(
            &std::fs::read(&index).expect("index should be readable"),
        )
        .expect("index should parse");
        assert_eq!(saved.len(), 2);
        assert_eq!(
            saved[0].screenshot.as_deref(),
            Some("catalog/projects/a/screenshot.webp")
        );
        assert_eq!(saved[1].screenshot, None);
        assert!(!root.join("index.json.tmp").exists());

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn empty_catalog_writes_empty_array() {
        let root = unique_workspace();
        let index = root.join("index.json");
        assert_eq!(write_index(Vec::new(), &index, "catalog").expect("write"), 0);
        let raw = std::fs::read_to_string(&index).expect("index should exist");
        assert_eq!(raw.trim(), "[]");
        let _ = std::fs::remove_dir_all(root);
    }
}
