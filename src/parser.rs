//! Pattern parser using nom.
//!
//! Turns a psql-style name pattern into two anchored regular expressions,
//! one for the schema and one for the object name.
//!
//! # Examples
//!
//! ```text
//! pattern              schema          name
//! foo                  -               ^(foo)$
//! myschema.*tab?le*    ^(myschema)$    ^(.*tab.le.*)$
//! "Foo".Bar            ^(Foo)$         ^(bar)$
//! "a.b*"               -               ^(a\.b\*)$
//! ```
//!
//! Both fragments are wrapped in `^(...)$`. The parens matter: without them
//! a `|` in the pattern would bind the anchors to the first and last
//! alternatives only.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{anychar, char, none_of},
    combinator::{map, opt, value},
    multi::many0,
};
use serde::Serialize;

const PREFIX: &str = "^(";
const SUFFIX: &str = ")$";

/// A finalized fragment that matches every name.
pub const MATCH_ALL: &str = "^(.*)$";

/// Characters escaped with a backslash inside quotes or under `force_escape`.
const REGEX_SPECIALS: &str = "|*+?()[]{}.^$\\";

/// A lexical unit of a name pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A double-quoted segment with `""` already collapsed to `"`.
    Quoted { text: String, terminated: bool },
    /// Unquoted `*`.
    Star,
    /// Unquoted `?`.
    Question,
    /// Unquoted `.`, the schema/name separator.
    Separator,
    /// Any other unquoted character.
    Char(char),
}

/// Result of parsing a pattern: finalized regex sources.
///
/// A fragment is `None` when nothing was written to it, e.g. the schema
/// of a pattern without a dot or the name of `foo.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPattern {
    pub schema: Option<String>,
    pub name: Option<String>,
    pub unterminated_quote: bool,
}

impl ParsedPattern {
    /// The name regex, unless absent or optimized away.
    pub fn name_regex(&self) -> Option<&str> {
        self.name.as_deref().filter(|r| !is_unconstrained(r))
    }

    /// The schema regex, unless absent or optimized away.
    pub fn schema_regex(&self) -> Option<&str> {
        self.schema.as_deref().filter(|r| !is_unconstrained(r))
    }

    /// Whether the pattern named a schema at all (even `*`).
    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }
}

/// Whether a finalized fragment matches everything.
pub fn is_unconstrained(regex: &str) -> bool {
    regex == MATCH_ALL
}

/// Parse a non-empty pattern into schema and name regexes.
///
/// Never fails. Unterminated quotes are accepted and simply leave the
/// rest of the pattern quoted.
pub fn parse(pattern: &str, force_escape: bool) -> ParsedPattern {
    let mut scanner = Scanner::new(force_escape);
    for token in tokenize(pattern) {
        scanner.feed(token);
    }

    if scanner.unterminated_quote {
        tracing::debug!("Unterminated quote in pattern '{}'", pattern);
    }

    ParsedPattern {
        schema: scanner.schema.finish(),
        name: scanner.name.finish(),
        unterminated_quote: scanner.unterminated_quote,
    }
}

/// Split a pattern into tokens.
pub fn tokenize(pattern: &str) -> Vec<Token> {
    match many0(parse_token)(pattern) {
        Ok((_, tokens)) => tokens,
        // parse_token accepts any non-empty input
        Err(_) => Vec::new(),
    }
}

fn parse_token(input: &str) -> IResult<&str, Token> {
    alt((
        parse_quoted,
        value(Token::Star, char('*')),
        value(Token::Question, char('?')),
        value(Token::Separator, char('.')),
        map(anychar, Token::Char),
    ))(input)
}

/// Parse a quoted segment: `"..."`, with `""` standing for one quote.
fn parse_quoted(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('"')(input)?;
    let (input, chars) = many0(alt((value('"', tag("\"\"")), none_of("\""))))(input)?;
    let (input, close) = opt(char('"'))(input)?;

    Ok((
        input,
        Token::Quoted {
            text: chars.into_iter().collect(),
            terminated: close.is_some(),
        },
    ))
}

/// Regex source under construction, seeded with `^(`.
#[derive(Debug, Clone)]
struct Fragment(String);

impl Fragment {
    fn new() -> Self {
        Self(String::from(PREFIX))
    }

    fn is_blank(&self) -> bool {
        self.0.len() == PREFIX.len()
    }

    fn push(&mut self, c: char) {
        self.0.push(c);
    }

    fn push_str(&mut self, s: &str) {
        self.0.push_str(s);
    }

    fn finish(mut self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        self.0.push_str(SUFFIX);
        Some(self.0)
    }
}

/// Two independent accumulators; the schema one only ever receives a
/// whole name fragment at a separator.
struct Scanner {
    schema: Fragment,
    name: Fragment,
    force_escape: bool,
    unterminated_quote: bool,
}

impl Scanner {
    fn new(force_escape: bool) -> Self {
        Self {
            schema: Fragment::new(),
            name: Fragment::new(),
            force_escape,
            unterminated_quote: false,
        }
    }

    fn feed(&mut self, token: Token) {
        match token {
            Token::Quoted { text, terminated } => {
                for c in text.chars() {
                    self.literal(c, true);
                }
                if !terminated {
                    self.unterminated_quote = true;
                }
            }
            Token::Star => self.name.push_str(".*"),
            Token::Question => self.name.push('.'),
            Token::Separator => {
                // Last separator wins: an earlier schema is overwritten.
                self.schema = std::mem::replace(&mut self.name, Fragment::new());
            }
            Token::Char(c) if c.is_ascii_uppercase() => self.name.push(c.to_ascii_lowercase()),
            Token::Char(c) => self.literal(c, self.force_escape),
        }
    }

    fn literal(&mut self, c: char, escape_specials: bool) {
        // `$` is legal in identifiers and the pattern is anchored anyway,
        // so it never keeps its regex meaning.
        if c == '$' {
            self.name.push_str("\\$");
            return;
        }
        if escape_specials && REGEX_SPECIALS.contains(c) {
            self.name.push('\\');
        }
        self.name.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(pattern: &str) -> (Option<String>, Option<String>) {
        let parsed = parse(pattern, false);
        (parsed.schema, parsed.name)
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("a*\"B.\"?."),
            vec![
                Token::Char('a'),
                Token::Star,
                Token::Quoted {
                    text: "B.".to_string(),
                    terminated: true
                },
                Token::Question,
                Token::Separator,
            ]
        );
    }

    #[test]
    fn test_tokenize_doubled_quote() {
        assert_eq!(
            tokenize("\"a\"\"b\""),
            vec![Token::Quoted {
                text: "a\"b".to_string(),
                terminated: true
            }]
        );
    }

    #[test]
    fn test_tokenize_multibyte() {
        assert_eq!(
            tokenize("é\"ü\""),
            vec![
                Token::Char('é'),
                Token::Quoted {
                    text: "ü".to_string(),
                    terminated: true
                },
            ]
        );
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(fragments("foo"), (None, Some("^(foo)$".to_string())));
    }

    #[test]
    fn test_unquoted_letters_fold() {
        assert_eq!(fragments("FooBar"), (None, Some("^(foobar)$".to_string())));
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(
            fragments("myschema.*tab?le*"),
            (
                Some("^(myschema)$".to_string()),
                Some("^(.*tab.le.*)$".to_string())
            )
        );
    }

    #[test]
    fn test_quoted_schema() {
        assert_eq!(
            fragments("\"Foo\".Bar"),
            (Some("^(Foo)$".to_string()), Some("^(bar)$".to_string()))
        );
    }

    #[test]
    fn test_quoted_wildcards_are_literal() {
        assert_eq!(fragments("\"a.b*\""), (None, Some("^(a\\.b\\*)$".to_string())));
    }

    #[test]
    fn test_doubled_quote() {
        assert_eq!(fragments("\"a\"\"b\""), (None, Some("^(a\"b)$".to_string())));
    }

    #[test]
    fn test_dollar_always_escaped() {
        assert_eq!(fragments("a$b"), (None, Some("^(a\\$b)$".to_string())));
        assert_eq!(fragments("\"a$b\""), (None, Some("^(a\\$b)$".to_string())));
    }

    #[test]
    fn test_regex_passthrough_outside_quotes() {
        assert_eq!(fragments("a+b|c"), (None, Some("^(a+b|c)$".to_string())));
    }

    #[test]
    fn test_force_escape() {
        let parsed = parse("a+b|(c)", true);
        assert_eq!(parsed.name.as_deref(), Some("^(a\\+b\\|\\(c\\))$"));
        // Wildcards keep their meaning.
        let parsed = parse("a*", true);
        assert_eq!(parsed.name.as_deref(), Some("^(a.*)$"));
    }

    #[test]
    fn test_last_separator_wins() {
        assert_eq!(
            fragments("a.b.c"),
            (Some("^(b)$".to_string()), Some("^(c)$".to_string()))
        );
    }

    #[test]
    fn test_trailing_separator() {
        assert_eq!(fragments("foo."), (Some("^(foo)$".to_string()), None));
    }

    #[test]
    fn test_leading_separator() {
        assert_eq!(fragments(".foo"), (None, Some("^(foo)$".to_string())));
    }

    #[test]
    fn test_star_is_unconstrained() {
        let parsed = parse("*.*", false);
        assert!(parsed.has_schema());
        assert_eq!(parsed.schema_regex(), None);
        assert_eq!(parsed.name_regex(), None);
        assert_eq!(parsed.name.as_deref(), Some(MATCH_ALL));
    }

    #[test]
    fn test_unterminated_quote() {
        let parsed = parse("\"Foo.bar", false);
        assert!(parsed.unterminated_quote);
        assert_eq!(parsed.schema, None);
        assert_eq!(parsed.name.as_deref(), Some("^(Foo\\.bar)$"));
    }

    #[test]
    fn test_non_ascii_uppercase_untouched() {
        assert_eq!(fragments("ÉTÉ"), (None, Some("^(ÉtÉ)$".to_string())));
    }
}
