//! Read-only guard for classifier-generated SQL.
//!
//! The classifier hands the executor a literal SQL string. When
//! `[database] read_only = true`, every statement passes through
//! [`ReadOnlyPolicy`] first: a single `SELECT`/`WITH`/`SHOW`/`DESCRIBE`/
//! `EXPLAIN` statement, no chained statements, no data-modifying keywords
//! outside string literals and comments.
//!
//! String and comment rules follow the backend's lexer. Anything the two
//! could read differently (MySQL `/*! */` executable comments, `--` not
//! followed by whitespace, `#` on SQLite) is rejected.

use async_trait::async_trait;
use relaybot_core::error::QueryError;
use relaybot_core::query::{QueryExecutor, Row};
use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::Arc;
use tracing::warn;

const READ_KEYWORDS: &[&str] = &["SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

const WRITE_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "REPLACE", "MERGE", "UPSERT", "DROP", "ALTER", "CREATE",
    "TRUNCATE", "RENAME", "GRANT", "REVOKE", "LOCK", "UNLOCK", "CALL", "LOAD", "HANDLER", "INTO",
    "ATTACH", "DETACH", "PRAGMA", "VACUUM",
];

/// SQL lexical flavour of the backend behind the guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// Backslash escapes in strings, `#` line comments
    #[default]
    MySql,
    Sqlite,
}

impl Dialect {
    /// Pick the dialect from an executor name (`"sqlite"`, `"mysql"`, ...).
    pub fn for_backend(name: &str) -> Self {
        match name {
            "sqlite" => Dialect::Sqlite,
            _ => Dialect::MySql,
        }
    }
}

/// Accepts only single read statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyPolicy {
    dialect: Dialect,
}

impl ReadOnlyPolicy {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn check(&self, sql: &str) -> Result<(), QueryError> {
        let statement = sql.trim().trim_end_matches(';').trim_end();
        if statement.is_empty() {
            return Err(rejected("empty statement"));
        }

        let words = unquoted_words(statement, self.dialect)?;

        let first = words
            .first()
            .map(|w| w.to_ascii_uppercase())
            .unwrap_or_default();
        if !READ_KEYWORDS.contains(&first.as_str()) {
            return Err(QueryError::Rejected(format!(
                "only read statements are allowed, got '{first}'"
            )));
        }

        if let Some(word) = words
            .iter()
            .map(|w| w.to_ascii_uppercase())
            .find(|w| WRITE_KEYWORDS.contains(&w.as_str()))
        {
            return Err(QueryError::Rejected(format!(
                "statement contains forbidden keyword '{word}'"
            )));
        }

        Ok(())
    }
}

fn rejected(reason: &str) -> QueryError {
    QueryError::Rejected(reason.into())
}

type Chars<'a> = Peekable<CharIndices<'a>>;

fn next_is(chars: &mut Chars<'_>, expected: char) -> bool {
    chars.peek().is_some_and(|&(_, c)| c == expected)
}

/// Split a statement into identifier-like words, skipping quoted sections
/// and comments.
///
/// A `;` outside quotes means a second statement and is rejected.
fn unquoted_words(statement: &str, dialect: Dialect) -> Result<Vec<&str>, QueryError> {
    let mut words = Vec::new();
    let mut word_start: Option<usize> = None;
    let mut chars = statement.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        match (is_word, word_start) {
            (true, None) => word_start = Some(i),
            (false, Some(start)) => {
                words.push(&statement[start..i]);
                word_start = None;
            }
            _ => {}
        }

        match c {
            '\'' | '"' | '`' => skip_quoted(&mut chars, c, dialect)?,
            ';' => return Err(rejected("multiple statements are not allowed")),
            '-' if next_is(&mut chars, '-') => {
                chars.next();
                match chars.peek() {
                    None => {}
                    Some(&(_, n)) if n.is_whitespace() => skip_line(&mut chars),
                    Some(_) => return Err(rejected("'--' must be followed by whitespace")),
                }
            }
            '/' if next_is(&mut chars, '*') => {
                chars.next();
                if next_is(&mut chars, '!') {
                    return Err(rejected("executable comments are not allowed"));
                }
                skip_block_comment(&mut chars)?;
            }
            '#' => match dialect {
                Dialect::MySql => skip_line(&mut chars),
                Dialect::Sqlite => return Err(rejected("unexpected '#'")),
            },
            _ => {}
        }
    }

    if let Some(start) = word_start {
        words.push(&statement[start..]);
    }
    Ok(words)
}

/// Consume up to and including the closing `quote`. A doubled quote stays
/// inside the literal; on MySQL a backslash escapes the next character.
fn skip_quoted(chars: &mut Chars<'_>, quote: char, dialect: Dialect) -> Result<(), QueryError> {
    while let Some((_, c)) = chars.next() {
        if c == '\\' && dialect == Dialect::MySql && quote != '`' {
            chars.next();
            continue;
        }
        if c == quote {
            if next_is(chars, quote) {
                chars.next();
                continue;
            }
            return Ok(());
        }
    }
    Err(rejected("unterminated quoted string"))
}

fn skip_line(chars: &mut Chars<'_>) {
    for (_, c) in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

fn skip_block_comment(chars: &mut Chars<'_>) -> Result<(), QueryError> {
    while let Some((_, c)) = chars.next() {
        if c == '*' && next_is(chars, '/') {
            chars.next();
            return Ok(());
        }
    }
    Err(rejected("unterminated comment"))
}

/// A [`QueryExecutor`] that applies [`ReadOnlyPolicy`] before delegating.
pub struct GuardedExecutor {
    inner: Arc<dyn QueryExecutor>,
    policy: ReadOnlyPolicy,
}

impl GuardedExecutor {
    pub fn new(inner: Arc<dyn QueryExecutor>) -> Self {
        let policy = ReadOnlyPolicy::new(Dialect::for_backend(inner.name()));
        Self { inner, policy }
    }
}

#[async_trait]
impl QueryExecutor for GuardedExecutor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        if let Err(e) = self.policy.check(sql) {
            warn!(sql, error = %e, "Query rejected by read-only guard");
            return Err(e);
        }
        self.inner.execute(sql).await
    }

    async fn health_check(&self) -> Result<bool, QueryError> {
        self.inner.health_check().await
    }
}
