//! Lightweight inspection of ingestion statements.
//!
//! This is not a SQL parser. It only finds the target table of an
//! `INSERT INTO` / `REPLACE INTO` statement, which is all the wizard needs to
//! refuse submitting a plain `SELECT`.

use std::sync::LazyLock;

use regex::Regex;

// Literals and comments, matched left to right so `--` inside a string or a
// quote inside a comment is handled correctly.
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)'(?:[^']|'')*'|--[^\n]*|/\*.*?\*/").expect("noise regex should be valid")
});
static INGEST_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:INSERT|REPLACE)\s+INTO\s+("(?:[^"]|"")+"|[A-Za-z_][A-Za-z0-9_]*)"#)
        .expect("ingest target regex should be valid")
});

/// Return the datasource a statement ingests into, if any.
///
/// Quoted identifiers are unquoted (`"a""b"` becomes `a"b`). Matches inside
/// comments and string literals are ignored.
pub fn ingest_table(query: &str) -> Option<String> {
    let stripped = NOISE_RE.replace_all(query, " ");
    let caps = INGEST_TARGET_RE.captures(&stripped)?;
    let raw = caps.get(1)?.as_str();
    let name = match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None => raw.to_string(),
    };
    (!name.trim().is_empty()).then_some(name)
}

/// Quote an identifier for SQL (`a"b` becomes `"a""b"`).
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal for SQL (`it's` becomes `'it''s'`).
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
