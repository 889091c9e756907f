use super::{Store, StoreError};
use crate::assets::{decode_data_uri, encode_data_uri};
use crate::domain::clients::{ClientEntry, ClientRegistry};
use crate::domain::features::{FeatureDefinition, FeatureTaxonomy};
use crate::domain::palette::{default_palette, DEFAULT_PALETTE};
use crate::domain::project::{Project, ProjectInput, ProjectPatch};
use crate::domain::project_type::ProjectType;
use crate::locks::{WriteLock, LOCK_FILE};
use crate::settings::StoreSettings;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

const PNG_BYTES: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("showcase-store-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn input(name: &str, project_type: ProjectType, features: &[&str]) -> ProjectInput {
    ProjectInput {
        name: name.to_string(),
        link: format!("https://demo.example.com/{}", name.to_lowercase()),
        project_type: Some(project_type),
        features: features.iter().map(|feature| feature.to_string()).collect(),
        ..ProjectInput::default()
    }
}

fn read_index(store: &Store) -> Vec<Project> {
    let raw = std::fs::read(store.index_path()).expect("index should exist");
    serde_json::from_slice(&raw).expect("index should parse")
}

fn write_legacy_taxonomy(root: &Path) {
    let dir = root.join("catalog/config");
    std::fs::create_dir_all(&dir).expect("config dir should be creatable");
    std::fs::write(
        dir.join("features.json"),
        r#"{"interior":["Floor plan","Styles"],"exterior":[]}"#,
    )
    .expect("legacy taxonomy should be writable");
}

#[test]
fn create_and_list_round_trip_with_defaults() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");

    let created = store
        .create_project(input("Loft", ProjectType::Interior, &["Styles"]))
        .expect("create should succeed");
    assert_eq!(created.id, "loft");
    assert!(created.active);
    assert!(!created.created_at.is_empty());

    let listed = store.list_projects();
    assert_eq!(listed, vec![created.clone()]);
    assert_eq!(
        store.get_project("loft").expect("get should succeed"),
        Some(created)
    );
    assert!(!root.join(LOCK_FILE).exists());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn every_mutation_refreshes_the_index() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");

    let mut with_image = input("Garden House", ProjectType::Exterior, &[]);
    with_image.screenshot = Some(encode_data_uri(&PNG_BYTES, "png"));
    store.create_project(with_image).expect("create");
    let index = read_index(&store);
    assert_eq!(index.len(), 1);
    assert_eq!(
        index[0].screenshot.as_deref(),
        Some("catalog/projects/garden-house/screenshot.png")
    );

    let patch: ProjectPatch =
        serde_json::from_str(r#"{"name":"Garden House II"}"#).expect("patch should parse");
    store.update_project("garden-house", patch).expect("update");
    assert_eq!(read_index(&store)[0].name, "Garden House II");

    assert!(store.delete_project("garden-house").expect("delete"));
    assert!(read_index(&store).is_empty());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn index_honors_configured_file_and_prefix() {
    let root = unique_workspace();
    std::fs::write(
        root.join("showcase.toml"),
        "index_file = \"instances.json\"\nasset_url_prefix = \"/static/data\"\n",
    )
    .expect("settings should be writable");
    let store = Store::open(&root).expect("store should open");
    assert_eq!(store.index_path(), root.join("instances.json"));

    let mut with_image = input("Loft", ProjectType::Interior, &[]);
    with_image.screenshot = Some(encode_data_uri(&PNG_BYTES, "jpeg"));
    store.create_project(with_image).expect("create");
    assert_eq!(
        read_index(&store)[0].screenshot.as_deref(),
        Some("static/data/projects/loft/screenshot.jpeg")
    );
    assert_eq!(store.reindex().expect("reindex"), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn index_failure_does_not_roll_back_the_mutation() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");
    std::fs::create_dir_all(store.index_path()).expect("block index path with a directory");

    let created = store
        .create_project(input("Loft", ProjectType::Interior, &[]))
        .expect("create should commit despite index failure");
    assert_eq!(store.list_projects(), vec![created]);
    assert!(store.reindex().is_err());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn migration_and_cleanup_scenario() {
    let root = unique_workspace();
    write_legacy_taxonomy(&root);
    let store = Store::open(&root).expect("store should open");

    let taxonomy = store.features().expect("features should load");
    let interior = taxonomy.features_for(ProjectType::Interior);
    assert_eq!(interior[0].name, "Floor plan");
    assert_eq!(interior[0].color, DEFAULT_PALETTE[0]);
    assert_eq!(interior[1].name, "Styles");
    assert_eq!(interior[1].color, DEFAULT_PALETTE[1]);

    store
        .create_project(input("Loft", ProjectType::Interior, &["Floor plan"]))
        .expect("create loft");
    store
        .create_project(input("Villa", ProjectType::Exterior, &["Balcony", "Styles"]))
        .expect("create villa");

    let summary = store.cleanup_invalid_features().expect("cleanup should run");
    assert_eq!(summary.cleaned, 1);
    assert_eq!(summary.removed, 1);

    let loft = store.get_project("loft").expect("get").expect("loft exists");
    assert_eq!(loft.features, vec!["Floor plan"]);
    let villa = store.get_project("villa").expect("get").expect("villa exists");
    // Names are valid across types, so an interior feature survives here.
    assert_eq!(villa.features, vec!["Styles"]);
    assert_eq!(read_index(&store)[1].features, vec!["Styles"]);

    let again = store.cleanup_invalid_features().expect("second cleanup");
    assert_eq!(again.cleaned, 0);
    assert_eq!(again.removed, 0);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn export_delete_import_reproduces_the_catalog() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");

    let mut by_type = BTreeMap::new();
    by_type.insert(
        ProjectType::Interior,
        vec![FeatureDefinition {
            name: "Styles".to_string(),
            color: "#8B5CF6".to_string(),
            icon: Some("brush".to_string()),
        }],
    );
    store
        .put_features(FeatureTaxonomy::new(by_type))
        .expect("features");
    let mut clients = BTreeMap::new();
    clients.insert(
        "Acme".to_string(),
        ClientEntry {
            name: "Acme".to_string(),
            logo: Some(encode_data_uri(b"<svg/>", "svg")),
            ..ClientEntry::default()
        },
    );
    store
        .put_clients(ClientRegistry::new(clients))
        .expect("clients");
    store
        .put_palette(vec!["#000000".to_string(), "#FFFFFF".to_string()])
        .expect("palette");

    let mut loft = input("Loft", ProjectType::Interior, &["Styles"]);
    loft.screenshot = Some(encode_data_uri(&PNG_BYTES, "webp"));
    loft.client = Some("Acme".to_string());
    loft.description = Some("Two levels".to_string());
    store.create_project(loft).expect("create loft");
    let mut villa = input("Villa", ProjectType::Exterior, &[]);
    villa.active = Some(false);
    store.create_project(villa).expect("create villa");
    store
        .put_featured(vec!["loft".to_string()])
        .expect("featured");

    let projects_before = store.list_projects();
    let features_before = store.features().expect("features");
    let clients_before = store.clients().expect("clients");
    let exported = store.export_all().expect("export should succeed");
    assert_eq!(exported.version, "1.0");
    assert_eq!(exported.projects.len(), 2);
    let inline = exported.projects[0]
        .screenshot
        .as_deref()
        .expect("screenshot should be inlined");
    assert_eq!(
        decode_data_uri(inline).expect("inline screenshot decodes").bytes,
        PNG_BYTES.to_vec()
    );
    assert!(exported.client_logos.contains_key("acme"));

    let wire = serde_json::to_string(&exported).expect("export should serialize");

    store.delete_all().expect("delete all should succeed");
    assert!(store.list_projects().is_empty());
    assert!(store.clients().expect("clients").is_empty());
    assert!(store.featured().expect("featured").is_empty());
    assert_eq!(store.palette().expect("palette"), default_palette());
    assert!(read_index(&store).is_empty());
    assert!(!root.join("catalog/client-logos/acme.svg").exists());

    let reparsed = serde_json::from_str(&wire).expect("export should reparse");
    let summary = store.import_all(reparsed).expect("import should succeed");
    assert_eq!(summary.projects, 2);
    assert_eq!(summary.client_logos, 1);

    assert_eq!(store.list_projects(), projects_before);
    assert_eq!(store.features().expect("features"), features_before);
    assert_eq!(store.clients().expect("clients"), clients_before);
    assert_eq!(store.featured().expect("featured"), vec!["loft"]);
    assert_eq!(
        store.palette().expect("palette"),
        vec!["#000000".to_string(), "#FFFFFF".to_string()]
    );
    assert_eq!(
        std::fs::read(root.join("catalog/projects/loft/screenshot.webp")).expect("screenshot"),
        PNG_BYTES.to_vec()
    );
    assert_eq!(
        std::fs::read(root.join("catalog/client-logos/acme.svg")).expect("logo"),
        b"<svg/>".to_vec()
    );
    assert_eq!(read_index(&store).len(), 2);

    let _ = std::fs::remove_dir_all(root);
}

fn single_client(name: &str, logo: String) -> ClientRegistry {
    let mut entries = BTreeMap::new();
    entries.insert(
        name.to_string(),
        ClientEntry {
            name: name.to_string(),
            logo: Some(logo),
            ..ClientEntry::default()
        },
    );
    ClientRegistry::new(entries)
}

#[test]
fn replaced_logo_format_survives_export_delete_import() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");

    store
        .put_clients(single_client("Acme", encode_data_uri(b"<svg/>", "svg")))
        .expect("svg logo");
    let saved = store
        .put_clients(single_client("Acme", encode_data_uri(&PNG_BYTES, "png")))
        .expect("png logo");
    let logo = saved
        .get("Acme")
        .and_then(|entry| entry.logo.clone())
        .expect("logo path should be stored");
    assert_eq!(logo, "/client-logos/acme.png");
    assert!(!root.join("catalog/client-logos/acme.svg").exists());

    let exported = store.export_all().expect("export");
    let inline = exported
        .client_logos
        .get("acme")
        .expect("logo should be exported");
    assert_eq!(
        decode_data_uri(inline).expect("logo decodes").extension,
        "png"
    );

    store.delete_all().expect("delete all");
    store.import_all(exported).expect("import");

    let restored = store.clients().expect("clients");
    assert_eq!(restored, saved);
    let on_disk = root.join("catalog").join(logo.trim_start_matches('/'));
    assert_eq!(
        std::fs::read(on_disk).expect("registry logo should exist after import"),
        PNG_BYTES.to_vec()
    );

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn export_prefers_the_logo_the_registry_points_at() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");
    store
        .put_clients(single_client("Acme", encode_data_uri(&PNG_BYTES, "png")))
        .expect("png logo");
    std::fs::write(root.join("catalog/client-logos/acme.svg"), b"<svg/>")
        .expect("leftover logo should be writable");

    let exported = store.export_all().expect("export");
    let inline = exported
        .client_logos
        .get("acme")
        .expect("logo should be exported");
    assert_eq!(
        decode_data_uri(inline).expect("logo decodes").bytes,
        PNG_BYTES.to_vec()
    );

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn rejected_import_changes_nothing() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");
    store
        .create_project(input("Loft", ProjectType::Interior, &[]))
        .expect("create");

    let mut document = store.export_all().expect("export");
    document.color_palette = vec!["#000000".to_string(), "nope".to_string()];
    assert!(matches!(
        store.import_all(document),
        Err(StoreError::Validation(_))
    ));
    assert_eq!(store.list_projects().len(), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn legacy_taxonomy_in_import_is_migrated() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");

    let document = serde_json::from_str(
        r#"{"version":"1.0","exportDate":"2026-01-01T00:00:00Z","features":{"interior":["Floor plan"]}}"#,
    )
    .expect("document should parse");
    store.import_all(document).expect("import should succeed");

    let taxonomy = store.features().expect("features");
    assert_eq!(
        taxonomy.features_for(ProjectType::Interior)[0].color,
        DEFAULT_PALETTE[0]
    );

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn list_active_filters_inactive_records() {
    let root = unique_workspace();
    let store = Store::open(&root).expect("store should open");
    store
        .create_project(input("Loft", ProjectType::Interior, &[]))
        .expect("create loft");
    let mut hidden = input("Villa", ProjectType::Exterior, &[]);
    hidden.active = Some(false);
    store.create_project(hidden).expect("create villa");

    let active: Vec<String> = store
        .list_active_projects()
        .into_iter()
        .map(|project| project.id)
        .collect();
    assert_eq!(active, vec!["loft"]);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn held_lock_blocks_writers_but_not_readers() {
    let root = unique_workspace();
    let settings = StoreSettings {
        lock_timeout_ms: 30,
        ..StoreSettings::default()
    };
    let store = Store::with_settings(&root, settings);
    store
        .create_project(input("Loft", ProjectType::Interior, &[]))
        .expect("create");

    let guard = WriteLock::acquire(&root, Duration::from_millis(30)).expect("external lock");
    assert!(matches!(
        store.delete_project("loft"),
        Err(StoreError::Lock(_))
    ));
    assert!(store
        .put_palette(vec!["#000000".to_string()])
        .is_err());
    assert_eq!(store.list_projects().len(), 1);
    drop(guard);

    assert!(store.delete_project("loft").expect("delete after release"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn open_rejects_invalid_settings() {
    let root = unique_workspace();
    std::fs::write(root.join("showcase.toml"), "index_fil = \"x.json\"\n")
        .expect("settings should be writable");
    assert!(matches!(Store::open(&root), Err(StoreError::Settings(_))));
    let _ = std::fs::remove_dir_all(root);
}
