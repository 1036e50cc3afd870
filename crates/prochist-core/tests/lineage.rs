//! End-to-end lineage tests: write, read back, navigate.
//!
//! Files live in a temporary directory with sidecar metadata, the same way a
//! processing script would use them. Facts are fixed so records are exact.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

use prochist_core::store::{HISTORY_ITEM, HISTORY_ITEM_PACKED};
use prochist_core::{
    Access, HistoryConfig, HistoryError, LineageNode, MemoryCatalog, MemoryStore, MetadataStore,
    NodePath, ParentSource, ParseError, RecordBuilder, SidecarOpener, SidecarStore, StaticFacts,
    StoreError, UserFields, View, ViewMode, codec, find_by_name, keys, navigate, read_history,
    write_history,
};

// ============================================================================
// Shared test setup
// ============================================================================

const STAMP: &str = "2024-03-01 10:00:00+1000";

fn facts() -> StaticFacts {
    StaticFacts::default()
        .with(keys::TIMESTAMP, STAMP)
        .with(keys::LOGIN, "alice")
        .with(keys::CWD, "/work")
        .with(keys::SCRIPT, "terrain")
        .with(keys::COMPONENT_VERSIONS, json!({"prochist-core": "0.1.0"}))
}

/// Create an (empty) data file, standing in for a raster.
fn make_file(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"\0\0\0\0").unwrap();
    path
}

/// Write history to `target` with sidecar parents.
fn write(target: &Path, user: &UserFields, parents: &[&PathBuf]) -> LineageNode {
    let facts = facts();
    let builder = RecordBuilder::new(&facts, &SidecarOpener);
    let sources: Vec<ParentSource<'_>> = parents.iter().map(|p| ParentSource::Path(p.as_path())).collect();
    let mut store = SidecarStore::open(target, Access::Update).unwrap();
    write_history(&builder, user, &sources, &mut store).unwrap()
}

fn read(path: &Path) -> LineageNode {
    let store = SidecarStore::open(path, Access::ReadOnly).unwrap();
    read_history(&store).unwrap()
}

fn user_fields() -> UserFields {
    UserFields::new()
        .with("DESCRIPTION", "A test file")
        .with("FIELD1", "Field value")
}

// ============================================================================
// Single file
// ============================================================================

#[test]
fn test_view_after_write_returns_user_and_automatic_fields() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "tst.img");

    let written = write(&path, &user_fields(), &[]);
    let node = read(&path);

    assert_eq!(node, written);
    assert_eq!(node.get("DESCRIPTION"), Some(&json!("A test file")));
    assert_eq!(node.get("FIELD1"), Some(&json!("Field value")));
    for key in [keys::TIMESTAMP, keys::LOGIN, keys::CWD, keys::SCRIPT, keys::COMPONENT_VERSIONS] {
        assert!(node.fields.contains_key(key), "automatic key {key} missing");
    }
    assert_eq!(node.filename(), Some("tst.img"));
    assert!(node.parents.is_empty());
}

#[test]
fn test_read_without_history_is_empty_node() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "fresh.img");
    assert!(read(&path).is_empty());
}

#[test]
fn test_read_of_corrupt_target_is_surfaced() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "bad.img");
    let mut store = SidecarStore::open(&path, Access::Update).unwrap();
    store.set_item(HISTORY_ITEM, "{\"fields\": ").unwrap();

    let err = read_history(&store).unwrap_err();
    assert!(matches!(err, HistoryError::Parse(ParseError::Syntax(_))));
}

#[test]
fn test_second_write_replaces_first() {
    let dir = TempDir::new().unwrap();
    let parent = make_file(&dir, "parent.img");
    let path = make_file(&dir, "target.img");
    write(&parent, &UserFields::new().with("DESCRIPTION", "parent"), &[]);

    write(&path, &UserFields::new().with("FIRST", "yes"), &[&parent]);
    write(&path, &UserFields::new().with("SECOND", "yes"), &[]);

    let node = read(&path);
    assert_eq!(node.get("SECOND"), Some(&json!("yes")));
    assert_eq!(node.get("FIRST"), None);
    assert!(node.parents.is_empty());
    assert!(find_by_name(&node, "target.img").iter().all(NodePath::is_root));
}

#[test]
fn test_unencodable_field_leaves_file_unmodified() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "target.img");
    write(&path, &UserFields::new().with("DESCRIPTION", "original"), &[]);

    let mut bad = std::collections::BTreeMap::new();
    bad.insert((1, 2), "pair keys have no JSON form");
    let user = UserFields::new().with("DESCRIPTION", "new").with("GRID", &bad);

    let facts = facts();
    let builder = RecordBuilder::new(&facts, &SidecarOpener);
    let mut store = SidecarStore::open(&path, Access::Update).unwrap();
    let err = write_history(&builder, &user, &[], &mut store).unwrap_err();
    assert!(matches!(err, HistoryError::UnencodableValue { ref key, .. } if key == "GRID"));

    assert_eq!(read(&path).get("DESCRIPTION"), Some(&json!("original")));
}

#[test]
fn test_non_finite_float_fails_write_naming_field() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "dem.img");
    write(&path, &UserFields::new().with("NODATA", &-9999.0), &[]);

    let facts = facts();
    let builder = RecordBuilder::new(&facts, &SidecarOpener);
    let mut store = SidecarStore::open(&path, Access::Update).unwrap();
    let user = UserFields::new().with("NODATA", &f64::NAN);
    let err = write_history(&builder, &user, &[], &mut store).unwrap_err();
    assert!(matches!(err, HistoryError::UnencodableValue { ref key, .. } if key == "NODATA"));

    assert_eq!(read(&path).get("NODATA"), Some(&json!(-9999.0)));
}

#[test]
fn test_over_nested_field_fails_write_and_file_stays_readable() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "dem.img");
    write(&path, &user_fields(), &[]);

    let deep = (0..130).fold(json!("core"), |inner, _| json!([inner]));
    let facts = facts();
    let builder = RecordBuilder::new(&facts, &SidecarOpener);
    let mut store = SidecarStore::open(&path, Access::Update).unwrap();
    let user = UserFields::new().with("LAYERS", &deep);
    let err = write_history(&builder, &user, &[], &mut store).unwrap_err();
    assert!(matches!(err, HistoryError::UnencodableValue { ref key, .. } if key == "LAYERS"));

    assert_eq!(read(&path).get("DESCRIPTION"), Some(&json!("A test file")));
}

#[test]
fn test_write_to_read_only_target_is_surfaced() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "target.img");

    let facts = facts();
    let builder = RecordBuilder::new(&facts, &SidecarOpener);
    let mut store = SidecarStore::open(&path, Access::ReadOnly).unwrap();
    let err = write_history(&builder, &user_fields(), &[], &mut store).unwrap_err();
    assert!(matches!(err, HistoryError::Store(StoreError::ReadOnly(_))));
    assert!(read(&path).is_empty());
}

// ============================================================================
// Parents and ancestry
// ============================================================================

#[test]
fn test_dem_slope_example() {
    let dir = TempDir::new().unwrap();
    let dem = make_file(&dir, "dem.img");
    let slope = make_file(&dir, "slope_aspect.img");

    write(
        &dem,
        &UserFields::new()
            .with("DESCRIPTION", "Elevation above sea level")
            .with("UNITS", "Metres"),
        &[],
    );
    let dem_node = read(&dem);
    assert_eq!(dem_node.get("DESCRIPTION"), Some(&json!("Elevation above sea level")));
    assert_eq!(dem_node.get("UNITS"), Some(&json!("Metres")));

    write(&slope, &UserFields::new().with("DESCRIPTION", "Slope and aspect"), &[&dem]);
    let root = read(&slope);

    assert_eq!(root.parents, vec![dem_node.clone()]);
    match navigate(&root, &NodePath::from(vec![0]), ViewMode::Fields).unwrap() {
        View::Fields(fields) => {
            assert_eq!(fields, &dem_node.fields);
            assert_eq!(fields["DESCRIPTION"], "Elevation above sea level");
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn test_full_ancestry_tree() {
    // tst0 is parent of tst1 and tst2, which are both parents of tst3
    let dir = TempDir::new().unwrap();
    let files: Vec<PathBuf> = (0..4)
        .map(|i| make_file(&dir, &format!("tst{i}.img")))
        .collect();

    let user = |index: i64| user_fields().with("INDEX", &index);
    write(&files[0], &user(0), &[]);
    write(&files[1], &user(1), &[&files[0]]);
    write(&files[2], &user(2), &[&files[0]]);
    write(&files[3], &user(3), &[&files[1], &files[2]]);

    let root = read(&files[3]);
    assert_eq!(root.node_count(), 5);
    assert_eq!(root.depth(), 2);

    let parent_names: Vec<_> = root.parents.iter().map(|p| p.filename().unwrap()).collect();
    assert_eq!(parent_names, vec!["tst1.img", "tst2.img"]);

    for parent in &root.parents {
        assert_eq!(parent.parents.len(), 1);
        assert_eq!(parent.parents[0].filename(), Some("tst0.img"));
        assert_eq!(parent.parents[0].get("INDEX"), Some(&json!(0)));
    }

    let grandparents = find_by_name(&root, "tst0.img");
    assert_eq!(
        grandparents,
        vec![NodePath::from(vec![0, 0]), NodePath::from(vec![1, 0])]
    );

    match navigate(&root, &NodePath::from(vec![1]), ViewMode::Parents).unwrap() {
        View::Parents(parents) => {
            assert_eq!(parents.len(), 1);
            assert_eq!(parents[0].filename.as_deref(), Some("tst0.img"));
            assert_eq!(parents[0].timestamp.as_deref(), Some(STAMP));
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn test_parent_without_history_is_empty_node() {
    let dir = TempDir::new().unwrap();
    let parent = make_file(&dir, "parent.img");
    let child = make_file(&dir, "child.img");

    write(&child, &user_fields(), &[&parent]);

    let root = read(&child);
    assert_eq!(root.parents, vec![LineageNode::empty()]);
    assert_eq!(root.get("DESCRIPTION"), Some(&json!("A test file")));
}

#[test]
fn test_corrupt_or_missing_parents_are_empty_nodes() {
    let dir = TempDir::new().unwrap();
    let garbage = make_file(&dir, "garbage.img");
    let bad_sidecar = make_file(&dir, "bad_sidecar.img");
    let child = make_file(&dir, "child.img");
    let missing = dir.path().join("never-existed.img");

    SidecarStore::open(&garbage, Access::Update)
        .unwrap()
        .set_item(HISTORY_ITEM, "\u{1}\u{2} definitely not history")
        .unwrap();
    fs::write(dir.path().join("bad_sidecar.img.aux.json"), "[1, 2, 3]").unwrap();

    write(&child, &user_fields(), &[&garbage, &bad_sidecar, &missing]);

    let root = read(&child);
    assert_eq!(root.parents.len(), 3);
    assert!(root.parents.iter().all(LineageNode::is_empty));
}

#[test]
fn test_exploding_legacy_parent_is_empty_node() {
    let dir = TempDir::new().unwrap();
    let legacy = make_file(&dir, "old.kea");
    let child = make_file(&dir, "child.img");

    // Each level names the next key twice
    let key = |level: usize| format!("('f{level}.kea', 't')");
    let mut metadata = serde_json::Map::new();
    let mut parents = serde_json::Map::new();
    metadata.insert("CURRENTFILE".to_string(), json!({"DESCRIPTION": "old"}));
    parents.insert("CURRENTFILE".to_string(), json!([key(0), key(0)]));
    for level in 0..40 {
        parents.insert(key(level), json!([key(level + 1), key(level + 1)]));
    }
    let stored = json!({"metadataByKey": metadata, "parentsByKey": parents});
    SidecarStore::open(&legacy, Access::Update)
        .unwrap()
        .set_item(HISTORY_ITEM, &stored.to_string())
        .unwrap();

    let store = SidecarStore::open(&legacy, Access::ReadOnly).unwrap();
    assert!(matches!(
        read_history(&store),
        Err(HistoryError::Parse(ParseError::TooManyNodes { .. }))
    ));

    write(&child, &user_fields(), &[&legacy]);
    assert_eq!(read(&child).parents, vec![LineageNode::empty()]);
}

#[test]
fn test_navigation_out_of_range() {
    let dir = TempDir::new().unwrap();
    let parent = make_file(&dir, "parent.img");
    let child = make_file(&dir, "child.img");
    write(&parent, &user_fields(), &[]);
    write(&child, &user_fields(), &[&parent]);
    let root = read(&child);

    let err = navigate(&root, &NodePath::from(vec![1]), ViewMode::Fields).unwrap_err();
    assert!(matches!(err, HistoryError::OutOfRange { index: 1, available: 1, .. }));

    let err = navigate(&root, &NodePath::from(vec![0, 0]), ViewMode::Parents).unwrap_err();
    assert!(matches!(err, HistoryError::OutOfRange { position: 1, index: 0, .. }));
}

// ============================================================================
// Stores and configuration
// ============================================================================

#[test]
fn test_size_limited_store_round_trips_packed() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "big.tif");
    let config = HistoryConfig::from_lookup(|name| {
        (name == prochist_core::config::SIZE_LIMIT_ENV).then(|| "2000".to_string())
    });

    let facts = facts();
    let builder = RecordBuilder::new(&facts, &SidecarOpener).with_config(&config);
    let user = UserFields::new().with("NOTES", &"repetitive ".repeat(1000));

    let mut store = SidecarStore::open_with_config(&path, Access::Update, &config).unwrap();
    let written = write_history(&builder, &user, &[], &mut store).unwrap();

    let store = SidecarStore::open(&path, Access::ReadOnly).unwrap();
    assert_eq!(store.get_item(HISTORY_ITEM).unwrap(), None);
    assert!(store.get_item(HISTORY_ITEM_PACKED).unwrap().is_some());
    assert_eq!(read_history(&store).unwrap(), written);
}

#[test]
fn test_small_history_stays_plain_under_configured_limit() {
    let dir = TempDir::new().unwrap();
    let path = make_file(&dir, "small.tif");
    let config = HistoryConfig::from_lookup(|name| {
        (name == prochist_core::config::SIZE_LIMIT_ENV).then(|| "2000".to_string())
    });

    let facts = facts();
    let builder = RecordBuilder::new(&facts, &SidecarOpener).with_config(&config);
    let mut store = SidecarStore::open_with_config(&path, Access::Update, &config).unwrap();
    write_history(&builder, &user_fields(), &[], &mut store).unwrap();

    let store = SidecarStore::open(&path, Access::ReadOnly).unwrap();
    assert!(store.get_item(HISTORY_ITEM).unwrap().is_some());
    assert_eq!(store.get_item(HISTORY_ITEM_PACKED).unwrap(), None);
}

#[test]
fn test_memory_catalog_lineage() {
    let facts = facts();
    let mut catalog = MemoryCatalog::new();

    let mut dem = MemoryStore::named("dem.img");
    {
        let builder = RecordBuilder::new(&facts, &catalog);
        write_history(&builder, &UserFields::new().with("UNITS", "Metres"), &[], &mut dem).unwrap();
    }
    catalog.insert("/data/dem.img", dem);

    let mut slope = MemoryStore::named("slope.img");
    let builder = RecordBuilder::new(&facts, &catalog);
    let node = write_history(
        &builder,
        &UserFields::new(),
        &[ParentSource::Path(Path::new("/data/dem.img"))],
        &mut slope,
    )
    .unwrap();

    assert_eq!(node.parents[0].get("UNITS"), Some(&json!("Metres")));
    assert_eq!(node.parents[0].filename(), Some("dem.img"));
    assert_eq!(read_history(&slope).unwrap(), node);
}

#[test]
fn test_stored_text_round_trips_through_codec() {
    let dir = TempDir::new().unwrap();
    let parent = make_file(&dir, "parent.img");
    let child = make_file(&dir, "child.img");
    write(&parent, &user_fields().with("NESTED", &json!({"a": [1, 2.5, null]})), &[]);
    let node = write(&child, &user_fields(), &[&parent]);

    let store = SidecarStore::open(&child, Access::ReadOnly).unwrap();
    let text = store.get_item(HISTORY_ITEM).unwrap().unwrap();
    assert_eq!(text, codec::serialize(&node).unwrap());
    assert_eq!(codec::deserialize(&text).unwrap(), node);
}
