//! Named ranks of the taxon tree across several tree definitions.

#[path = "../common/mod.rs"]
mod common;

use common::{expected, pairs, Fixture};
use objformat::config::{CollectionScope, FormatterDefinitions};
use objformat::format::ObjectFormatter;
use objformat::sql::{validate_sql, Dialect};
use objformat::FormatError;

fn determination_format(paths: &[(&str, Option<&str>)]) -> FormatterDefinitions {
    let mut toml = String::from(
        r#"
[[format]]
class = "Determination"
[format.switch]
single = true
[[format.switch.fields]]
"#,
    );
    for (path, sep) in paths {
        toml.push_str("[[format.switch.fields.field]]\n");
        toml.push_str(&format!("path = \"{}\"\n", path));
        if let Some(sep) = sep {
            toml.push_str(&format!("sep = \"{}\"\n", sep));
        }
    }
    FormatterDefinitions::from_toml_str(&toml).unwrap()
}

#[test]
fn test_rank_across_tree_definitions() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine
        .format_query("Determination", Some("DeterminationFamily"))
        .unwrap();

    let sql = query.to_sql(Dialect::Sqlite);
    // Taxon itself plus three ancestors for the deepest definition
    assert_eq!(sql.matches("LEFT JOIN").count(), 4, "{}", sql);
    assert!(sql.contains("IN (1, 2)"), "{}", sql);
    validate_sql(&sql, Dialect::Sqlite).unwrap();

    // Determination 3 is a mineral; its tree has no families
    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "Rosaceae"), ("2", "Felidae"), ("4", "Rosaceae")])
    );
}

#[test]
fn test_rank_in_single_definition() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let query = engine
        .format_query("Determination", Some("DeterminationGenus"))
        .unwrap();

    // Determination 4 names a family, which has no genus above it
    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "Rosa"), ("4", "")])
    );
}

#[test]
fn test_rank_attribute() {
    let fixture = Fixture::new();
    let definitions = determination_format(&[("taxon.Family.author", None)]);
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);
    let query = engine.format_query("Determination", None).unwrap();

    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "Juss."), ("2", "Fischer"), ("4", "Juss.")])
    );

    let definitions = determination_format(&[("taxon.family.id", None)]);
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);
    let query = engine.format_query("Determination", None).unwrap();

    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "2"), ("2", "7"), ("4", "2")])
    );
}

#[test]
fn test_ranks_share_ancestor_chain() {
    let fixture = Fixture::new();
    let definitions =
        determination_format(&[("taxon.Family", None), ("taxon.Genus", Some(" "))]);
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);
    let query = engine.format_query("Determination", None).unwrap();

    let sql = query.to_sql(Dialect::Sqlite);
    assert_eq!(sql.matches("LEFT JOIN").count(), 4, "{}", sql);

    // Each rank restricts to its own definitions; the restrictions are OR'd
    assert_eq!(
        pairs(&fixture.run(&query)),
        expected(&[("1", "Rosaceae Rosa"), ("2", "Felidae "), ("4", "Rosaceae ")])
    );
}

#[test]
fn test_unknown_rank_is_fatal() {
    let fixture = Fixture::new();
    let definitions = determination_format(&[("taxon.Kingdom", None)]);
    let engine = ObjectFormatter::new(&fixture.catalog, &definitions, &fixture.scope);

    match engine.format_query("Determination", None).unwrap_err() {
        FormatError::UnknownRank { table, rank } => {
            assert_eq!(table, "Taxon");
            assert_eq!(rank, "Kingdom");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_rank_without_tree_definitions() {
    let fixture = Fixture::new();
    let scope = CollectionScope::default();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &scope);

    assert!(matches!(
        engine.format_query("Determination", Some("DeterminationFamily")),
        Err(FormatError::UnknownRank { .. })
    ));
}

#[test]
fn test_ambiguous_rank_is_fatal() {
    let fixture = Fixture::new();
    let scope = CollectionScope::from_toml_str(
        r#"
[[tree_defs.Taxon]]
id = 7
name = "Broken"
items = [
    { id = 70, name = "Family", rank_id = 140 },
    { id = 71, name = "family", rank_id = 150 },
]
"#,
    )
    .unwrap();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &scope);

    match engine
        .format_query("Determination", Some("DeterminationFamily"))
        .unwrap_err()
    {
        FormatError::AmbiguousRank { tree_def, .. } => assert_eq!(tree_def, 7),
        other => panic!("unexpected error: {}", other),
    }
}
