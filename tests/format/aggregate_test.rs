//! Aggregation of to-many relationships into correlated sub-queries.

#[path = "../common/mod.rs"]
mod common;

use common::{expected, pairs, Fixture};
use objformat::config::FormatterDefinitions;
use objformat::format::ObjectFormatter;
use objformat::sql::{validate_sql, Dialect};
use objformat::FormatError;

/// Collection objects with their collectors' cities and determined taxa.
const NESTED: &str = r#"
[[format]]
name = "CollectionObjectSummary"
class = "CollectionObject"
[format.switch]
single = true
[[format.switch.fields]]
[[format.switch.fields.field]]
path = "collectors"
aggregator = "CollectorCities"
[[format.switch.fields.field]]
path = "determinations"
sep = " | "

[[format]]
name = "CollectorCities"
class = "Collector"
[format.switch]
single = true
[[format.switch.fields]]
[[format.switch.fields.field]]
path = "agent.addresses"

[[format]]
name = "City"
class = "Address"
[format.switch]
single = true
[[format.switch.fields]]
[[format.switch.fields.field]]
path = "city"

[[format]]
name = "DeterminedTaxon"
class = "Determination"
[format.switch]
single = true
[[format.switch.fields]]
[[format.switch.fields.field]]
path = "taxon.name"

[[aggregator]]
name = "CollectorCities"
class = "Collector"
format = "CollectorCities"
separator = "; "
orderfieldname = "orderNumber"

[[aggregator]]
name = "Cities"
class = "Address"
format = "City"
separator = ", "

[[aggregator]]
name = "Taxa"
class = "Determination"
format = "DeterminedTaxon"
separator = ", "
"#;

#[test]
fn test_aggregate_in_declared_order() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine
        .format_query("CollectionObject", Some("CollectionObjectCollectors"))
        .unwrap();

    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[
            ("1", "User, Test MiddleInitial; Museum"),
            ("2", "Lovelace, Ada A"),
            ("3", ""),
        ])
    );
}

#[test]
fn test_aggregate_query() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine
        .aggregate_query("CollectionObject", "collectors", None)
        .unwrap();

    let rows = fixture.run(&query);
    assert_eq!(rows.columns, vec!["id", "collectors"]);
    assert_eq!(
        rows.column("collectors").unwrap(),
        vec![Some("User, Test MiddleInitial; Museum"), Some("Lovelace, Ada A"), Some("")]
    );
}

#[test]
fn test_limited_aggregate() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine
        .format_query("CollectionObject", Some("CollectionObjectFirstCollector"))
        .unwrap();

    let sql = query.to_sql(Dialect::Sqlite);
    assert!(sql.contains("LIMIT 1) AS \"sq1_rows\""), "{}", sql);
    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "User, Test MiddleInitial"), ("2", "Lovelace, Ada A"), ("3", "")])
    );
}

#[test]
fn test_aggregate_requires_to_many() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);

    let err = engine
        .aggregate_query("CollectionObject", "accession", None)
        .unwrap_err();
    assert!(matches!(err, FormatError::InvalidDefinition { .. }), "{}", err);
}

#[test]
fn test_nested_and_sibling_labels_are_unique() {
    let fixture = Fixture::new();
    let definitions = FormatterDefinitions::from_toml_str(NESTED).unwrap();
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);
    let query = engine
        .format_query("CollectionObject", Some("CollectionObjectSummary"))
        .unwrap();

    let sql = query.to_sql(Dialect::Sqlite);
    for label in ["sq1_agg", "sq1_sq1_agg", "sq2_agg"] {
        assert_eq!(
            sql.matches(&format!("AS \"{}\"", label)).count(),
            1,
            "{} in {}",
            label,
            sql
        );
    }
    validate_sql(&sql, Dialect::Sqlite).unwrap();

    // Collector 1 (agent Museum) has no addresses; the separator stays
    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[
            ("1", "Lawrence, Kansas City;  | Rosa canina, Rosaceae"),
            ("2", " | Felis catus"),
            ("3", " | Silicates"),
        ])
    );
}

#[test]
fn test_tree_rank_inside_aggregate() {
    let fixture = Fixture::new();
    let definitions = FormatterDefinitions::from_toml_str(
        r#"
[[format]]
name = "CollectionObjectFamilies"
class = "CollectionObject"
[format.switch]
single = true
[[format.switch.fields]]
[[format.switch.fields.field]]
path = "determinations"
aggregator = "Families"

[[format]]
name = "DeterminationFamily"
class = "Determination"
[format.switch]
single = true
[[format.switch.fields]]
[[format.switch.fields.field]]
path = "taxon.Family"

[[aggregator]]
name = "Families"
class = "Determination"
format = "DeterminationFamily"
separator = ", "
"#,
    )
    .unwrap();
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);
    let query = engine
        .format_query("CollectionObject", Some("CollectionObjectFamilies"))
        .unwrap();

    // Only taxonomies with a Family rank; the Minerals tree has none
    let sql = query.to_sql(Dialect::Sqlite);
    assert!(
        sql.contains("\"sq1_taxon_1\".\"TaxonTreeDefID\" IN (1, 2)"),
        "{}",
        sql
    );
    validate_sql(&sql, Dialect::Sqlite).unwrap();

    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "Rosaceae, Rosaceae"), ("2", "Felidae"), ("3", "")])
    );
}

#[test]
fn test_non_numeric_count_is_rejected() {
    let fixture = Fixture::new();
    let definitions = FormatterDefinitions::from_toml_str(
        r#"
[[aggregator]]
name = "Broken"
class = "Collector"
count = "many"
"#,
    )
    .unwrap();
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);

    let err = engine
        .aggregate_query("CollectionObject", "collectors", Some("Broken"))
        .unwrap_err();
    assert!(matches!(err, FormatError::InvalidDefinition { .. }), "{}", err);
}
