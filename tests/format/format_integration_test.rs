//! Formatters compiled to SQL and executed against the sample database.

#[path = "../common/mod.rs"]
mod common;

use common::{expected, pairs, Fixture};
use objformat::catalog::CatalogError;
use objformat::config::{FormatterDefinitions, FormattingSettings};
use objformat::construct::QueryConstruct;
use objformat::format::{CycleStack, ObjectFormatter, CYCLE_DETECTED};
use objformat::sql::{validate_sql, Dialect};
use objformat::FormatError;

fn format_rows(fixture: &Fixture, table: &str, formatter: Option<&str>) -> Vec<(String, String)> {
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine.format_query(table, formatter).unwrap();
    pairs(&fixture.run(&query))
}

#[test]
fn test_single_field_blanks_nulls() {
    let fixture = Fixture::new();
    assert_eq!(
        format_rows(&fixture, "Accession", None),
        expected(&[("1", "1"), ("2", "")])
    );
}

#[test]
fn test_single_field_expression() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let accession = fixture.catalog.table_by_name("Accession").unwrap();

    let qc = QueryConstruct::new(&fixture.catalog, accession.id);
    let root = qc.root().clone();
    let (qc, expr) = engine.format(qc, &root, None, &CycleStack::new()).unwrap();

    assert!(qc.joins().is_empty());
    insta::assert_snapshot!(expr.to_sql(Dialect::Sqlite), @r#"IFNULL("accession"."AccessionNumber", '')"#);
}

#[test]
fn test_switch_on_agent_type() {
    let fixture = Fixture::new();
    assert_eq!(
        format_rows(&fixture, "Agent", None),
        expected(&[
            ("1", "User, Test MiddleInitial"),
            ("2", "Museum"),
            ("3", "Lovelace, Ada A"),
        ])
    );
}

#[test]
fn test_numeric_catalog_number() {
    let fixture = Fixture::new();
    assert_eq!(
        format_rows(&fixture, "CollectionObject", None),
        expected(&[("1", "1"), ("2", "2"), ("3", "3")])
    );

    let options = FormattingSettings {
        numeric_catalog_number: false,
        ..FormattingSettings::default()
    };
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope)
        .with_options(options);
    let query = engine.format_query("CollectionObject", None).unwrap();
    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "000000001"), ("2", "000000002"), ("3", "000000003")])
    );
}

#[test]
fn test_path_through_to_one_relationship() {
    let fixture = Fixture::new();
    assert_eq!(
        format_rows(&fixture, "CollectionObject", Some("CollectionObjectAccession")),
        expected(&[("1", "1"), ("2", ""), ("3", "")])
    );
}

#[test]
fn test_date_precision() {
    let fixture = Fixture::new();
    assert_eq!(
        format_rows(&fixture, "CollectionObject", Some("CollectionObjectDated")),
        expected(&[("1", "2020-05"), ("2", "2020"), ("3", "2020-05-17")])
    );
}

#[test]
fn test_join_reused_for_sibling_fields() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine
        .format_query("CollectionObject", Some("CollectionObjectCataloger"))
        .unwrap();

    let sql = query.to_sql(Dialect::Sqlite);
    assert_eq!(sql.matches("LEFT JOIN").count(), 1, "{}", sql);
    validate_sql(&sql, Dialect::Sqlite).unwrap();

    // The separator is kept when the value is empty
    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "Test User"), ("2", "Ada Lovelace"), ("3", " ")])
    );
}

#[test]
fn test_cycle_is_replaced_by_placeholder() {
    let fixture = Fixture::new();
    let rows = format_rows(&fixture, "CollectionObject", Some("CollectionObjectCycle"));

    let cycle = format!(
        "{}: CollectionObject(aggregating) -> Collector(formatting) -> CollectionObject",
        CYCLE_DETECTED
    );
    assert_eq!(
        rows,
        vec![
            (
                "1".to_string(),
                format!("User, Test MiddleInitial / {}; Museum / {}", cycle, cycle)
            ),
            ("2".to_string(), format!("Lovelace, Ada A / {}", cycle)),
            ("3".to_string(), String::new()),
        ]
    );
}

#[test]
fn test_missing_formatter_placeholder() {
    let fixture = Fixture::new();
    let definitions = FormatterDefinitions::default();
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);
    let query = engine.format_query("Accession", None).unwrap();

    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[
            ("1", "<Formatter not defined.>"),
            ("2", "<Formatter not defined.>"),
        ])
    );
}

#[test]
fn test_missing_aggregator_placeholder() {
    let fixture = Fixture::new();
    let definitions = FormatterDefinitions::from_toml_str(
        r#"
[[format]]
class = "CollectionObject"
[format.switch]
single = true
[[format.switch.fields]]
[[format.switch.fields.field]]
path = "collectors"
"#,
    )
    .unwrap();
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);
    let query = engine.format_query("CollectionObject", None).unwrap();

    let rows = pairs(&fixture.run(&query));
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|(_, v)| v == "<Aggregator not defined.>"));
}

#[test]
fn test_unknown_path_is_fatal() {
    let fixture = Fixture::new();
    let definitions = FormatterDefinitions::from_toml_str(
        r#"
[[format]]
class = "Agent"
[format.switch]
single = true
[[format.switch.fields]]
[[format.switch.fields.field]]
path = "nickname"
"#,
    )
    .unwrap();
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);

    let err = engine.format_query("Agent", None).unwrap_err();
    match err {
        FormatError::Catalog(CatalogError::UnknownField { table, path }) => {
            assert_eq!(table, "Agent");
            assert_eq!(path, "nickname");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unknown_table_is_fatal() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    assert!(matches!(
        engine.format_query("Locality", None),
        Err(FormatError::Catalog(CatalogError::UnknownTable(_)))
    ));
}

#[test]
fn test_aggregate_renders_per_dialect() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine
        .format_query("CollectionObject", Some("CollectionObjectCollectors"))
        .unwrap();

    for dialect in [Dialect::Sqlite, Dialect::Postgres] {
        validate_sql(&query.to_sql(dialect), dialect).unwrap();
    }
    let mysql = query.render(Dialect::MySql);
    assert!(mysql.sql.contains("SEPARATOR ''), CHAR_LENGTH(?) + 1)"), "{}", mysql.sql);
    assert_eq!(mysql.params.len(), 2);
    assert!(query.to_sql(Dialect::Postgres).contains("STRING_AGG("));
}

#[test]
fn test_switch_fallback_is_text_on_strict_backends() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine.format_query("Agent", None).unwrap();

    let postgres = query.to_sql(Dialect::Postgres);
    assert!(
        postgres.contains("ELSE CAST(\"agent\".\"AgentType\" AS TEXT) END"),
        "{}",
        postgres
    );
    validate_sql(&postgres, Dialect::Postgres).unwrap();

    let tsql = query.to_sql(Dialect::TSql);
    assert!(
        tsql.contains("ELSE CAST([agent].[AgentType] AS NVARCHAR(MAX)) END"),
        "{}",
        tsql
    );
    // Text columns are coalesced as they are
    assert!(tsql.contains("ISNULL([agent].[LastName], '')"), "{}", tsql);
}

