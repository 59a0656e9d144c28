//! pgpattern — compile name patterns from the command line
//!
//! # Usage
//!
//! ```bash
//! # Predicates for a table pattern
//! pgpattern 'public.user*'
//!
//! # Show how a pattern is translated
//! pgpattern explain '"Foo".Bar'
//!
//! # Custom columns
//! pgpattern 'pg_*' --name-var p.proname --no-visibility
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use pgpattern::clause;
use pgpattern::config::TargetSource;
use pgpattern::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgpattern")]
#[command(version)]
#[command(about = "Compile psql-style name patterns into catalog WHERE clauses", long_about = None)]
#[command(after_help = "EXAMPLES:
    pgpattern 'public.user*'
    pgpattern '\"Foo\".Bar' --target types
    pgpattern 'pg_*' --name-var p.proname --no-visibility --format json

A pattern spelled like a subcommand (explain, quote, targets) or starting
with '-' must follow '--':
    pgpattern -- explain
    pgpattern --target roles -- -admin")]
struct Cli {
    /// The pattern to compile ('' matches everything)
    pattern: Option<String>,

    /// Catalog target (see `pgpattern targets`)
    #[arg(short, long, global = true)]
    target: Option<String>,

    /// Override the schema column expression
    #[arg(long, global = true)]
    schema_var: Option<String>,

    /// Override the name column expression
    #[arg(long, global = true)]
    name_var: Option<String>,

    /// Override the alternative name column expression
    #[arg(long, global = true)]
    alt_name_var: Option<String>,

    /// Override the visibility rule
    #[arg(long, global = true, conflicts_with = "no_visibility")]
    visibility: Option<String>,

    /// Never emit the visibility rule
    #[arg(long, global = true)]
    no_visibility: bool,

    /// Escape regex metacharacters outside quotes too
    #[arg(short = 'e', long, global = true)]
    force_escape: bool,

    /// Turn off force_escape set in the configuration file
    #[arg(long, global = true, conflicts_with = "force_escape")]
    no_force_escape: bool,

    /// Continue an existing WHERE clause (start with AND)
    #[arg(long, global = true)]
    have_where: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Configuration file
    #[arg(short, long, env = "PGPATTERN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a pattern is translated
    Explain {
        /// The pattern to explain
        pattern: String,
    },
    /// Quote text as an extended string literal
    Quote {
        /// The text to quote
        text: String,
    },
    /// List available targets
    Targets,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pgpattern=debug" } else { "pgpattern=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match &cli.command {
        Some(Commands::Explain { pattern }) => explain_pattern(pattern, cli, &config),
        Some(Commands::Quote { text }) => {
            println!("{}", string_literal(text));
            Ok(())
        }
        Some(Commands::Targets) => {
            show_targets(&config);
            Ok(())
        }
        None => match &cli.pattern {
            Some(pattern) => compile_pattern(pattern, cli, &config),
            None => {
                println!("{}", "pgpattern — psql-style name patterns".cyan().bold());
                println!();
                println!("Usage: pgpattern <PATTERN> [OPTIONS]");
                println!();
                println!("Try: pgpattern --help");
                Ok(())
            }
        },
    }
}

/// The configured or named target with command-line overrides applied.
fn resolve_target(cli: &Cli, config: &Config) -> anyhow::Result<Target> {
    let name = cli
        .target
        .as_deref()
        .unwrap_or_else(|| config.default_target_name());
    let mut target = config.target(name)?;

    if let Some(var) = &cli.name_var {
        target.name_var = var.clone();
    }
    if let Some(var) = &cli.schema_var {
        target = target.schema(var.as_str());
    }
    if let Some(var) = &cli.alt_name_var {
        target = target.alt_name(var.as_str());
    }
    if let Some(rule) = &cli.visibility {
        target = target.visibility(rule.as_str());
    }
    if cli.no_visibility {
        target = target.without_visibility();
    }

    target.validate(name)?;
    Ok(target)
}

/// `-e` and `--no-force-escape` both override the configuration.
fn resolve_force_escape(cli: &Cli, config: &Config) -> bool {
    if cli.no_force_escape {
        return false;
    }
    cli.force_escape || config.force_escape
}

fn compile_pattern(pattern: &str, cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let target = resolve_target(cli, config)?;
    let force_escape = resolve_force_escape(cli, config);

    if cli.verbose {
        eprintln!("{} {}", "Pattern:".dimmed(), pattern.yellow());
    }

    let out = clause::compile(pattern, cli.have_where, force_escape, &target);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&out)?),
        OutputFormat::Text => {
            if out.added_clause {
                print!("{}", out.sql);
            } else {
                eprintln!("{}", "(no predicate: pattern matches everything)".dimmed());
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct Explanation<'a> {
    pattern: &'a str,
    target: &'a Target,
    parsed: Option<ParsedPattern>,
    schema_literal: Option<String>,
    name_literal: Option<String>,
    #[serde(flatten)]
    clause: CompiledClause,
}

fn explain_pattern(pattern: &str, cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let target = resolve_target(cli, config)?;
    let force_escape = resolve_force_escape(cli, config);

    // The empty pattern never reaches the parser.
    let parsed = (!pattern.is_empty()).then(|| parse(pattern, force_escape));
    let schema_literal = parsed
        .as_ref()
        .and_then(|p| p.schema_regex())
        .map(string_literal);
    let name_literal = parsed
        .as_ref()
        .and_then(|p| p.name_regex())
        .map(string_literal);
    let compiled = clause::compile(pattern, cli.have_where, force_escape, &target);

    if let OutputFormat::Json = cli.format {
        let explanation = Explanation {
            pattern,
            target: &target,
            parsed,
            schema_literal,
            name_literal,
            clause: compiled,
        };
        println!("{}", serde_json::to_string_pretty(&explanation)?);
        return Ok(());
    }

    println!("{}", "pgpattern Explanation".cyan().bold());
    println!();
    println!("{} {}", "Pattern:".dimmed(), pattern.yellow());
    println!();

    match &parsed {
        None => println!("  {}", "Empty pattern: matches everything".white()),
        Some(parsed) => {
            println!("{}", "Fragments:".green().bold());
            print_fragment("Schema:", parsed.schema.as_deref(), schema_literal.as_deref());
            print_fragment("Name:", parsed.name.as_deref(), name_literal.as_deref());
            if parsed.unterminated_quote {
                println!();
                println!(
                    "{}",
                    "⚠ Unterminated quote: the rest of the pattern was taken literally".yellow()
                );
            }
        }
    }

    println!();
    println!("{}", "Generated SQL:".green().bold());
    if compiled.added_clause {
        for line in compiled.sql.lines() {
            println!("  {}", line.white());
        }
    } else {
        println!("  {}", "(none)".dimmed());
    }
    Ok(())
}

fn print_fragment(label: &str, regex: Option<&str>, literal: Option<&str>) {
    match (regex, literal) {
        (None, _) => println!("  {:8} {}", label.dimmed(), "(none)".dimmed()),
        (Some(regex), None) => println!(
            "  {:8} {} {}",
            label.dimmed(),
            regex.white(),
            "(matches everything, optimized away)".dimmed()
        ),
        (Some(regex), Some(literal)) => println!(
            "  {:8} {} → {}",
            label.dimmed(),
            regex.white(),
            literal.cyan()
        ),
    }
}

fn show_targets(config: &Config) {
    println!("{}", "pgpattern Targets".cyan().bold());
    println!();
    println!(
        "{:12} {:10} {:10} {}",
        "Target".white().bold(),
        "Name".white().bold(),
        "Schema".white().bold(),
        "Visibility".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    let default = config.default_target_name();
    for (name, target, source) in config.all_targets() {
        let mut label = name.clone();
        if name == default {
            label.push('*');
        }
        let visibility = target.visibility_rule.as_deref().unwrap_or("-");
        let suffix = match source {
            TargetSource::Builtin => String::new(),
            TargetSource::Configured => " (config)".to_string(),
        };
        println!(
            "{:12} {:10} {:10} {}{}",
            label.cyan().bold(),
            target.name_var.yellow(),
            target.schema_var.as_deref().unwrap_or("-").white(),
            visibility.dimmed(),
            suffix.green()
        );
        if let Some(alt) = &target.alt_name_var {
            println!("{:12} {} {}", "", "or".dimmed(), alt.yellow());
        }
    }

    println!();
    println!("{}", "* default target".dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaping_config() -> Config {
        Config {
            force_escape: true,
            ..Config::default()
        }
    }

    #[test]
    fn test_no_force_escape_overrides_config() {
        let cli = Cli::try_parse_from(["pgpattern", "a+b", "--no-force-escape"]).unwrap();
        assert!(!resolve_force_escape(&cli, &escaping_config()));
    }

    #[test]
    fn test_force_escape_from_config() {
        let cli = Cli::try_parse_from(["pgpattern", "a+b"]).unwrap();
        assert!(resolve_force_escape(&cli, &escaping_config()));
        assert!(!resolve_force_escape(&cli, &Config::default()));
    }

    #[test]
    fn test_force_escape_flags_conflict() {
        assert!(Cli::try_parse_from(["pgpattern", "x", "-e", "--no-force-escape"]).is_err());
    }

    #[test]
    fn test_double_dash_pattern_named_like_subcommand() {
        let cli = Cli::try_parse_from(["pgpattern", "--", "explain"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.pattern.as_deref(), Some("explain"));

        let cli = Cli::try_parse_from(["pgpattern", "--", "-admin"]).unwrap();
        assert_eq!(cli.pattern.as_deref(), Some("-admin"));
    }
}
