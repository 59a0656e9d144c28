//! # pgpattern — psql-style name patterns for catalog queries
//!
//! Compiles an object name filter such as `myschema.*tab?le*` or
//! `"Foo".Bar` into WHERE clause predicates for a PostgreSQL catalog query.
//!
//! ## Quick Example
//!
//! ```
//! use pgpattern::prelude::*;
//!
//! let target = Target::new("c.relname")
//!     .schema("n.nspname")
//!     .visibility("pg_catalog.pg_table_is_visible(c.oid)");
//!
//! let out = pgpattern::compile("order*", &target);
//! assert_eq!(
//!     out.sql,
//!     "WHERE c.relname OPERATOR(pg_catalog.~) E'^(order.*)$'\n  \
//!      AND pg_catalog.pg_table_is_visible(c.oid)\n"
//! );
//! ```
//!
//! ## Pattern Syntax
//!
//! | Symbol | Meaning                                    |
//! |--------|--------------------------------------------|
//! | `*`    | Any sequence of characters                 |
//! | `?`    | Any single character                       |
//! | `.`    | Schema / name separator                    |
//! | `"…"`  | Literal text, case preserved (`""` = `"`)  |
//! | `A-Z`  | Folded to lowercase outside quotes         |
//! | `$`    | Always literal                             |
//!
//! Other regex syntax passes through outside quotes unless
//! `force_escape` is set.

pub mod clause;
pub mod config;
pub mod error;
pub mod parser;
pub mod quote;
pub mod target;

pub mod prelude {
    pub use crate::clause::{ClauseOutcome, CompiledClause, WhereClause, process_name_pattern};
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::parser::{ParsedPattern, parse};
    pub use crate::quote::string_literal;
    pub use crate::target::Target;
}

/// Compile a pattern as the first clause of a query, without forced
/// escaping.
pub fn compile(pattern: &str, target: &target::Target) -> clause::CompiledClause {
    clause::compile(pattern, false, false, target)
}
