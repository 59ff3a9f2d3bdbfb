//! QueryConstruct used directly by a caller building its own query.

#[path = "../common/mod.rs"]
mod common;

use common::Fixture;
use objformat::catalog::CatalogError;
use objformat::construct::QueryConstruct;
use objformat::format::{CycleStack, ObjectFormatter};
use objformat::sql::{table_col, Dialect, ExprExt, OrderByExpr, Query, TableRef};
use objformat::FormatError;

#[test]
fn test_build_join_reuses_alias() {
    let fixture = Fixture::new();
    let co = fixture.catalog.table_by_name("CollectionObject").unwrap();

    let qc = QueryConstruct::new(&fixture.catalog, co.id);
    let root = qc.root().clone();
    let (qc, first, first_name) = qc.build_join(&root, "cataloger.firstName").unwrap();
    let (qc, last, last_name) = qc.build_join(&root, "cataloger.lastName").unwrap();

    assert_eq!(first, last);
    assert_eq!(first.alias, "agent_1");
    assert_eq!(first_name.unwrap().column, "FirstName");
    assert_eq!(last_name.unwrap().column, "LastName");
    assert_eq!(qc.joins().len(), 1);
}

#[test]
fn test_formatted_value_in_caller_query() {
    let fixture = Fixture::new();
    let engine = ObjectFormatter::new(&fixture.catalog, &fixture.definitions, &fixture.scope);
    let co = fixture.catalog.table_by_name("CollectionObject").unwrap();

    // Format the cataloger of each object next to its own columns
    let qc = QueryConstruct::new(&fixture.catalog, co.id);
    let root = qc.root().clone();
    let cataloger = co.relationship("cataloger").unwrap();
    let (qc, agent) = qc.join(&root, cataloger);
    let (qc, formatted) = engine.format(qc, &agent, None, &CycleStack::new()).unwrap();

    let query = Query::new()
        .select(vec![
            table_col(&root.alias, "CatalogNumber").alias("number"),
            formatted.alias("cataloger"),
        ])
        .from(TableRef::new(&co.sql_table).with_alias(&root.alias))
        .order_by(vec![OrderByExpr::asc(root.col(&co.id_column))]);
    let query = qc.apply_to(query);

    let rows = fixture.run(&query);
    assert_eq!(rows.columns, vec!["number", "cataloger"]);
    assert_eq!(
        rows.column("cataloger").unwrap(),
        vec![Some("User, Test MiddleInitial"), Some("Lovelace, Ada A"), Some("")]
    );
    assert!(query.to_sql(Dialect::Sqlite).contains("LEFT JOIN \"agent\" AS \"agent_1\""));
}

#[test]
fn test_to_many_inside_path_is_rejected() {
    let fixture = Fixture::new();
    let co = fixture.catalog.table_by_name("CollectionObject").unwrap();

    let qc = QueryConstruct::new(&fixture.catalog, co.id);
    let root = qc.root().clone();
    let err = qc.build_join(&root, "collectors.orderNumber").unwrap_err();
    assert!(matches!(
        err,
        FormatError::Catalog(CatalogError::ToManyInPath { .. })
    ));
}
