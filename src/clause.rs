//! WHERE clause compiler.
//!
//! Turns a name pattern into zero or more predicate lines appended to a
//! query under construction. The first predicate opens the clause with
//! `WHERE `, later ones continue it with `  AND `. Text already in the
//! buffer is expected to end with a newline, and every appended line ends
//! with one too.
//!
//! ```
//! use pgpattern::clause::process_name_pattern;
//! use pgpattern::target::Target;
//!
//! let target = Target::new("c.relname")
//!     .schema("n.nspname")
//!     .visibility("pg_catalog.pg_table_is_visible(c.oid)");
//!
//! let mut sql = String::new();
//! let outcome = process_name_pattern(&mut sql, "public.user*", false, false, &target);
//! assert!(outcome.added_clause);
//! assert_eq!(
//!     sql,
//!     "WHERE c.relname OPERATOR(pg_catalog.~) E'^(user.*)$'\n  \
//!      AND n.nspname OPERATOR(pg_catalog.~) E'^(public)$'\n"
//! );
//! ```

use std::fmt;

use serde::Serialize;

use crate::parser::{self, ParsedPattern};
use crate::quote::string_literal;
use crate::target::Target;

/// Case-sensitive regex match, schema-qualified so a hostile search path
/// cannot redirect it.
pub const REGEX_MATCH: &str = "OPERATOR(pg_catalog.~)";

/// State after one compiler call, to be threaded into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClauseOutcome {
    /// Whether this call wrote any predicate.
    pub added_clause: bool,
    /// Whether the query now has an open WHERE clause.
    pub have_where: bool,
}

/// Text appended by [`compile`] together with the resulting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledClause {
    pub sql: String,
    pub added_clause: bool,
    pub have_where: bool,
}

/// Append the predicates for `pattern` to `buf`.
///
/// An empty pattern matches everything and only emits the visibility rule,
/// if the target has one. The visibility rule is also applied when the
/// pattern does not name a schema.
pub fn process_name_pattern(
    buf: &mut String,
    pattern: &str,
    have_where: bool,
    force_escape: bool,
    target: &Target,
) -> ClauseOutcome {
    let mut emitter = Emitter::new(buf, have_where);

    if pattern.is_empty() {
        if let Some(rule) = target.visibility_rule() {
            emitter.predicate(rule);
        }
        return emitter.outcome();
    }

    let parsed = parser::parse(pattern, force_escape);
    tracing::debug!(
        "Compiled pattern '{}': schema={:?} name={:?}",
        pattern,
        parsed.schema,
        parsed.name
    );
    emit_parsed(&mut emitter, &parsed, target);
    emitter.outcome()
}

/// Compile `pattern` into a fresh string.
pub fn compile(pattern: &str, have_where: bool, force_escape: bool, target: &Target) -> CompiledClause {
    let mut sql = String::new();
    let outcome = process_name_pattern(&mut sql, pattern, have_where, force_escape, target);
    CompiledClause {
        sql,
        added_clause: outcome.added_clause,
        have_where: outcome.have_where,
    }
}

fn emit_parsed(emitter: &mut Emitter<'_>, parsed: &ParsedPattern, target: &Target) {
    if let Some(name) = parsed.name_regex() {
        let literal = string_literal(name);
        let predicate = match target.alt_name_var() {
            Some(alt) => format!(
                "({} {} {}\n        OR {} {} {})",
                target.name_var, REGEX_MATCH, literal, alt, REGEX_MATCH, literal
            ),
            None => format!("{} {} {}", target.name_var, REGEX_MATCH, literal),
        };
        emitter.predicate(&predicate);
    }

    if parsed.has_schema() {
        if let (Some(schema), Some(var)) = (parsed.schema_regex(), target.schema_var()) {
            let predicate = format!("{} {} {}", var, REGEX_MATCH, string_literal(schema));
            emitter.predicate(&predicate);
        }
    } else if let Some(rule) = target.visibility_rule() {
        // No schema given, so only objects on the search path.
        emitter.predicate(rule);
    }
}

/// Writes predicates with WHERE/AND threading.
struct Emitter<'a> {
    buf: &'a mut String,
    have_where: bool,
    added_clause: bool,
}

impl<'a> Emitter<'a> {
    fn new(buf: &'a mut String, have_where: bool) -> Self {
        Self {
            buf,
            have_where,
            added_clause: false,
        }
    }

    fn predicate(&mut self, sql: &str) {
        self.buf.push_str(if self.have_where { "  AND " } else { "WHERE " });
        self.buf.push_str(sql);
        self.buf.push('\n');
        self.have_where = true;
        self.added_clause = true;
    }

    fn outcome(&self) -> ClauseOutcome {
        ClauseOutcome {
            added_clause: self.added_clause,
            have_where: self.have_where,
        }
    }
}

/// A query buffer that tracks whether its WHERE clause is open.
///
/// Chains several patterns (and the caller's own predicates) into one
/// clause:
///
/// ```
/// use pgpattern::clause::WhereClause;
/// use pgpattern::target::Target;
///
/// let mut query = WhereClause::with_prefix("SELECT r.rolname\nFROM pg_catalog.pg_roles r\n");
/// query.push_predicate("r.rolcanlogin");
/// query.push_pattern("Admin*", &Target::new("r.rolname"));
/// assert_eq!(
///     query.as_str(),
///     "SELECT r.rolname\nFROM pg_catalog.pg_roles r\n\
///      WHERE r.rolcanlogin\n  \
///      AND r.rolname OPERATOR(pg_catalog.~) E'^(admin.*)$'\n"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    sql: String,
    have_where: bool,
    force_escape: bool,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing query text, which should end with a newline.
    pub fn with_prefix(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Mark the clause as already opened by the caller.
    pub fn have_where(mut self, have_where: bool) -> Self {
        self.have_where = have_where;
        self
    }

    /// Escape regex metacharacters outside quotes too.
    pub fn force_escape(mut self, force_escape: bool) -> Self {
        self.force_escape = force_escape;
        self
    }

    /// Compile a pattern into the clause. Returns whether anything was added.
    pub fn push_pattern(&mut self, pattern: &str, target: &Target) -> bool {
        let outcome = process_name_pattern(
            &mut self.sql,
            pattern,
            self.have_where,
            self.force_escape,
            target,
        );
        self.have_where = outcome.have_where;
        outcome.added_clause
    }

    /// Add a trusted predicate, written verbatim.
    pub fn push_predicate(&mut self, predicate: &str) {
        let mut emitter = Emitter::new(&mut self.sql, self.have_where);
        emitter.predicate(predicate);
        self.have_where = emitter.have_where;
    }

    pub fn has_where(&self) -> bool {
        self.have_where
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
