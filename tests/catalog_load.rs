use std::fs;

use gamedeck::catalog::{load_catalog, CatalogStore, FileSource, LoadError};
use gamedeck::config::LauncherConfig;
use gamedeck::menu::MenuSelection;
use tempfile::TempDir;

const GAMES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
  <record>
    <title>Chrono Trigger</title>
    <rom>roms/chrono.smc</rom>
    <year>1995</year>
    <genre>RPG</genre>
    <text>Time travel across eras.</text>
  </record>
  <record>
    <title>Broken Entry</title>
  </record>
  <record>
    <title>F-Zero</title>
    <rom>roms/fzero.smc</rom>
    <image>boxes/fzero.png</image>
  </record>
</root>
"#;

#[test]
fn loads_catalog_named_by_config() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("games.xml");
    fs::write(&catalog, GAMES_XML).unwrap();

    let config_path = dir.path().join("launcher.toml");
    fs::write(
        &config_path,
        format!("catalog_path = {:?}\n", catalog.display().to_string()),
    )
    .unwrap();
    let config = LauncherConfig::load_from(&config_path).unwrap();

    let mut store = CatalogStore::new();
    let count = load_catalog(&FileSource::new(&config.catalog_path), &mut store).unwrap();

    assert_eq!(count, 2);
    assert_eq!(store.count(), 2);

    let first = store.record_at(0).unwrap();
    assert_eq!(first.title, "Chrono Trigger");
    assert_eq!(first.image_path(), "box_image.png");
    assert_eq!(first.genres, vec!["RPG".to_string()]);

    let second = store.record_at(1).unwrap();
    assert_eq!(second.rom, "roms/fzero.smc");
    assert_eq!(second.year_text(), "19XX");

    let mut menu = MenuSelection::new(store.count());
    menu.shift_down();
    menu.shift_down();
    assert_eq!(menu.selected(&store).unwrap().title, "F-Zero");
}

#[test]
fn missing_catalog_leaves_empty_menu() {
    let dir = TempDir::new().unwrap();
    let mut store = CatalogStore::new();

    let result = load_catalog(&FileSource::new(dir.path().join("games.xml")), &mut store);

    assert!(matches!(result, Err(LoadError::SourceUnavailable { .. })));
    assert!(store.is_empty());
    assert!(MenuSelection::new(store.count()).selected(&store).is_none());
}
