//! Catalog targets.
//!
//! A [`Target`] names the columns a pattern is matched against for one kind
//! of catalog object. Every expression in a target is trusted SQL and is
//! written to the query verbatim.

use serde::{Deserialize, Serialize};

use crate::error::{PatternError, PatternResult};

/// Column expressions for one kind of catalog object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Expression holding the schema name, if the object lives in a schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_var: Option<String>,
    /// Expression holding the object name.
    pub name_var: String,
    /// Alternative name expression (e.g. a formatted type name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_name_var: Option<String>,
    /// Predicate restricting to objects visible on the search path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_rule: Option<String>,
}

impl Target {
    /// A target matching only `name_var`.
    pub fn new(name_var: impl Into<String>) -> Self {
        Self {
            schema_var: None,
            name_var: name_var.into(),
            alt_name_var: None,
            visibility_rule: None,
        }
    }

    pub fn schema(mut self, schema_var: impl Into<String>) -> Self {
        self.schema_var = Some(schema_var.into());
        self
    }

    pub fn alt_name(mut self, alt_name_var: impl Into<String>) -> Self {
        self.alt_name_var = Some(alt_name_var.into());
        self
    }

    pub fn visibility(mut self, visibility_rule: impl Into<String>) -> Self {
        self.visibility_rule = Some(visibility_rule.into());
        self
    }

    /// Drop the visibility rule.
    pub fn without_visibility(mut self) -> Self {
        self.visibility_rule = None;
        self
    }

    /// Check that the target can produce a predicate.
    ///
    /// Empty optional expressions are treated as absent by the compiler,
    /// but an empty `name_var` would emit broken SQL.
    pub fn validate(&self, name: &str) -> PatternResult<()> {
        if self.name_var.trim().is_empty() {
            return Err(PatternError::invalid_target(name, "name_var is empty"));
        }
        Ok(())
    }

    pub(crate) fn schema_var(&self) -> Option<&str> {
        non_empty(&self.schema_var)
    }

    pub(crate) fn alt_name_var(&self) -> Option<&str> {
        non_empty(&self.alt_name_var)
    }

    pub(crate) fn visibility_rule(&self) -> Option<&str> {
        non_empty(&self.visibility_rule)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Targets for the usual PostgreSQL catalogs, as used by psql's `\d` family.
pub fn builtin_targets() -> Vec<(&'static str, Target)> {
    let relation = || {
        Target::new("c.relname")
            .schema("n.nspname")
            .visibility("pg_catalog.pg_table_is_visible(c.oid)")
    };

    vec![
        ("tables", relation()),
        ("views", relation()),
        ("indexes", relation()),
        ("sequences", relation()),
        (
            "functions",
            Target::new("p.proname")
                .schema("n.nspname")
                .visibility("pg_catalog.pg_function_is_visible(p.oid)"),
        ),
        (
            "types",
            Target::new("t.typname")
                .schema("n.nspname")
                .alt_name("pg_catalog.format_type(t.oid, NULL)")
                .visibility("pg_catalog.pg_type_is_visible(t.oid)"),
        ),
        (
            "operators",
            Target::new("o.oprname")
                .schema("n.nspname")
                .visibility("pg_catalog.pg_operator_is_visible(o.oid)"),
        ),
        (
            "collations",
            Target::new("c.collname")
                .schema("n.nspname")
                .visibility("pg_catalog.pg_collation_is_visible(c.oid)"),
        ),
        (
            "conversions",
            Target::new("c.conname")
                .schema("n.nspname")
                .visibility("pg_catalog.pg_conversion_is_visible(c.oid)"),
        ),
        ("schemas", Target::new("n.nspname")),
        ("roles", Target::new("r.rolname")),
        ("databases", Target::new("d.datname")),
        ("extensions", Target::new("e.extname")),
    ]
}

/// Look up a built-in target by name.
pub fn builtin(name: &str) -> Option<Target> {
    builtin_targets()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, t)| t)
}
