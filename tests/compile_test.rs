use pgpattern::clause::{self, WhereClause, process_name_pattern};
use pgpattern::config::Config;
use pgpattern::parser::parse;
use pgpattern::quote::string_literal;
use pgpattern::target::{self, Target};
use pretty_assertions::assert_eq;

fn tables() -> Target {
    target::builtin("tables").expect("tables target")
}

#[test]
fn test_no_separator_means_no_schema() {
    for pattern in ["foo", "f*o", "\"a.b\"", "x?y"] {
        let parsed = parse(pattern, false);
        assert_eq!(parsed.schema, None, "pattern {pattern}");
        assert!(parsed.name.is_some(), "pattern {pattern}");
    }
}

#[test]
fn test_one_separator_splits() {
    let parsed = parse("sales.orders_2024", false);
    assert_eq!(parsed.schema.as_deref(), Some("^(sales)$"));
    assert_eq!(parsed.name.as_deref(), Some("^(orders_2024)$"));
}

#[test]
fn test_full_wildcard_compiles_to_nothing() {
    let roles = Target::new("r.rolname");
    assert!(!clause::compile("*", false, false, &roles).added_clause);
    assert!(!clause::compile("*.*", false, false, &tables()).added_clause);
}

#[test]
fn test_quote_examples() {
    assert_eq!(string_literal("can't"), "E'can''t'");
    assert_eq!(string_literal("^(a\\$)$"), "E'^(a\\\\$)$'");
}

#[test]
fn test_psql_table_listing() {
    let mut sql = String::from(
        "SELECT n.nspname, c.relname\n\
         FROM pg_catalog.pg_class c\n     \
         LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace\n\
         WHERE c.relkind IN ('r','p','')\n",
    );
    let outcome = process_name_pattern(&mut sql, "Public.Order*", true, false, &tables());
    assert!(outcome.added_clause);
    assert_eq!(
        sql,
        "SELECT n.nspname, c.relname\n\
         FROM pg_catalog.pg_class c\n     \
         LEFT JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace\n\
         WHERE c.relkind IN ('r','p','')\n  \
         AND c.relname OPERATOR(pg_catalog.~) E'^(order.*)$'\n  \
         AND n.nspname OPERATOR(pg_catalog.~) E'^(public)$'\n"
    );
}

#[test]
fn test_type_listing_matches_formatted_name() {
    let types = target::builtin("types").expect("types target");
    let out = clause::compile("int*", false, false, &types);
    assert_eq!(
        out.sql,
        "WHERE (t.typname OPERATOR(pg_catalog.~) E'^(int.*)$'\n        \
         OR pg_catalog.format_type(t.oid, NULL) OPERATOR(pg_catalog.~) E'^(int.*)$')\n  \
         AND pg_catalog.pg_type_is_visible(t.oid)\n"
    );
}

#[test]
fn test_chaining_through_where_clause() {
    let mut query = WhereClause::new();
    assert!(query.push_pattern("", &tables()));
    assert!(query.push_pattern("accounts", &Target::new("a.name")));
    assert_eq!(
        query.as_str(),
        "WHERE pg_catalog.pg_table_is_visible(c.oid)\n  \
         AND a.name OPERATOR(pg_catalog.~) E'^(accounts)$'\n"
    );
}

#[test]
fn test_hostile_pattern_stays_in_literal() {
    let out = clause::compile("x'; DROP TABLE t; --", false, false, &Target::new("c.relname"));
    assert_eq!(
        out.sql,
        "WHERE c.relname OPERATOR(pg_catalog.~) E'^(x''; drop table t; --)$'\n"
    );
}

#[test]
fn test_unicode_pattern() {
    let out = clause::compile("\"Café\"", false, false, &Target::new("c.relname"));
    assert_eq!(
        out.sql,
        "WHERE c.relname OPERATOR(pg_catalog.~) E'^(Caf\\u00e9)$'\n"
    );
}

#[test]
fn test_config_target_end_to_end() {
    let config = Config::from_toml_str(
        r#"
        [targets.policies]
        schema_var = "n.nspname"
        name_var = "pol.polname"
        "#,
    )
    .expect("valid config");

    let target = config.target("policies").expect("configured target");
    let out = clause::compile("audit.*", false, config.force_escape, &target);
    assert_eq!(
        out.sql,
        "WHERE n.nspname OPERATOR(pg_catalog.~) E'^(audit)$'\n"
    );
}
