//! Loading the settings file and the documents it names.

#[path = "../common/mod.rs"]
mod common;

use common::{expected, pairs, settings_path, Fixture};
use objformat::catalog::{Cardinality, Catalog};
use objformat::config::{AggregatorDef, Configuration, Settings, SettingsError};
use objformat::format::ObjectFormatter;
use objformat::sql::{validate_sql, Dialect};

fn load() -> Configuration {
    let settings = Settings::from_file(settings_path()).unwrap();
    Configuration::load(settings).unwrap()
}

#[test]
fn test_load_fixture_configuration() {
    let config = load();

    assert_eq!(config.settings.dialect, Dialect::Sqlite);
    assert_eq!(config.catalog.len(), 7);
    assert_eq!(config.definitions.aggregators.len(), 3);
    assert_eq!(config.scope.tree_defs_for("Taxon").len(), 3);
    assert!(config.scope.is_numeric_catalog_number());
    assert_eq!(config.check(), Vec::<String>::new());
}

#[test]
fn test_formatter_from_configuration() {
    let config = load();
    let fixture = Fixture::new();
    let engine = ObjectFormatter::from_config(&config);

    let query = engine.format_query("Agent", None).unwrap();
    validate_sql(&query.to_sql(config.settings.dialect), config.settings.dialect).unwrap();
    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[
            ("1", "User, Test MiddleInitial"),
            ("2", "Museum"),
            ("3", "Lovelace, Ada A"),
        ])
    );
}

#[test]
fn test_check_reports_dangling_references() {
    let mut config = load();
    config.definitions.aggregators.push(AggregatorDef {
        name: Some("Orphan".into()),
        class: Some("Locality".into()),
        format: Some("LocalityFull".into()),
        ..AggregatorDef::default()
    });
    config
        .scope
        .default_formats
        .insert("Agent".into(), "AgentShort".into());

    let problems = config.check();
    assert_eq!(problems.len(), 3, "{:?}", problems);
    assert!(problems.iter().any(|p| p.contains("Locality")));
    assert!(problems.iter().any(|p| p.contains("LocalityFull")));
    assert!(problems.iter().any(|p| p.contains("AgentShort")));
}

#[test]
fn test_missing_settings_file() {
    let err = Settings::from_file("does/not/exist.toml").unwrap_err();
    assert!(matches!(err, SettingsError::FileNotFound(_)));
}

#[test]
fn test_json_catalog() {
    let catalog = Catalog::from_json_str(
        r#"{
            "table": [
                {
                    "name": "Agent",
                    "id_column": "AgentID",
                    "field": [{ "name": "lastName", "column": "LastName", "type": "text" }],
                    "relationship": [
                        { "name": "addresses", "target": "Address", "type": "one-to-many", "other_side": "agent" }
                    ]
                },
                {
                    "name": "Address",
                    "id_column": "AddressID",
                    "relationship": [
                        { "name": "agent", "target": "Agent", "type": "many-to-one", "column": "AgentID" }
                    ]
                }
            ]
        }"#,
    )
    .unwrap();

    let agent = catalog.table_by_name("agent").unwrap();
    assert_eq!(agent.sql_table, "agent");
    assert_eq!(
        agent.relationship("addresses").unwrap().cardinality,
        Cardinality::OneToMany
    );
}
