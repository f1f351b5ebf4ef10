use std::io::Write;

use assert_matches::assert_matches;

use bib_photo_mirror::catalog::{DEFAULT_HIGH_URL, EventCatalog};
use bib_photo_mirror::config::{Config, ConfigLoader, EventEntry};
use bib_photo_mirror::domain::Bib;
use bib_photo_mirror::error::PhotoError;

#[test]
fn explicit_catalog_file_replaces_builtin() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "schema_version": 1,
            "high_url": "https://photos.test/hd/{{}}",
            "events": [
                {{"key": "night_run", "year": "2023", "name": "Night Run", "url": "https://photos.test/search/{{}}"}},
                {{"key": "trail", "url": "https://photos.test/trail/{{}}", "high_url": "https://trail.test/{{}}"}}
            ]
        }}"#
    )
    .unwrap();

    let catalog = ConfigLoader::resolve(file.path().to_str()).unwrap();
    assert_eq!(catalog.events().len(), 2);

    let night = catalog.resolve("rosters/night_run_2023.csv").unwrap();
    let bib: Bib = "88".parse().unwrap();
    assert_eq!(night.listing_url_for(&bib), "https://photos.test/search/88");
    assert_eq!(night.high_url_for("5"), "https://photos.test/hd/5");

    let trail = catalog.resolve("trail.csv").unwrap();
    assert_eq!(trail.name, "trail");
    assert_eq!(trail.high_url_for("5"), "https://trail.test/5");

    assert_matches!(
        catalog.resolve("bpc_conde.csv"),
        Err(PhotoError::UnknownEvent(_))
    );
}

#[test]
fn missing_catalog_file_is_a_config_error() {
    assert_matches!(
        ConfigLoader::resolve(Some("/definitely/not/here/bibphotos.json")),
        Err(PhotoError::ConfigRead(_))
    );
}

#[test]
fn malformed_catalog_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    assert_matches!(
        ConfigLoader::resolve(file.path().to_str()),
        Err(PhotoError::ConfigParse(_))
    );
}

#[test]
fn empty_event_list_is_rejected() {
    let config = Config {
        schema_version: Some(1),
        high_url: None,
        events: Vec::new(),
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(PhotoError::ConfigParse(_))
    );
}

#[test]
fn entry_defaults_fill_name_and_high_url() {
    let config = Config {
        schema_version: None,
        high_url: None,
        events: vec![EventEntry {
            key: " city_10k ".to_string(),
            year: None,
            name: None,
            url: "https://photos.test/{}".to_string(),
            high_url: None,
        }],
    };

    let catalog = ConfigLoader::resolve_config(config).unwrap();
    let event = &catalog.events()[0];
    assert_eq!(event.key, "city_10k");
    assert_eq!(event.name, "city_10k");
    assert_eq!(event.year, "");
    assert_eq!(event.high_url, DEFAULT_HIGH_URL);
}

#[test]
fn builtin_catalog_knows_the_bpc_events() {
    let catalog = EventCatalog::builtin();
    let keys: Vec<&str> = catalog.events().iter().map(|event| event.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "bpc_jalapao",
            "bpc_pantanal",
            "bpc_alter_chao",
            "bpc_veadeiros",
            "bpc_milagres",
            "bpc_conde",
        ]
    );
    let conde = catalog.resolve("data/bpc_conde_2022.csv").unwrap();
    assert!(conde.listing_url_for(&"1234".parse().unwrap()).contains("/1234/evento/76437/"));
}
