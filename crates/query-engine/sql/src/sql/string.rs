//! Type definitions of a low-level SQL string representation.

/// Words we must quote when they are used as identifiers.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyze", "and", "any", "array", "as", "asc", "both", "case", "cast", "check",
    "collate", "column", "constraint", "create", "current_date", "current_time", "current_user",
    "default", "desc", "distinct", "do", "else", "end", "except", "false", "for", "foreign",
    "from", "grant", "group", "having", "in", "into", "join", "leading", "limit", "not", "null",
    "offset", "on", "only", "or", "order", "primary", "references", "returning", "select",
    "table", "then", "to", "trailing", "true", "union", "unique", "user", "using", "when",
    "where", "window", "with",
];

/// The indentation used for every nested block.
pub const INDENT: &str = "    ";

/// A SQL text buffer.
///
/// The statements we emit are COPY and DDL statements, which cannot be parameterized,
/// so literals are inlined and escaped here.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SQL {
    pub sql: String,
}

impl SQL {
    pub fn new() -> SQL {
        SQL { sql: String::new() }
    }

    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Append an identifier. Plain words are emitted bare, so the database folds them to
    /// lower case like any unquoted name. Reserved words and anything else are quoted.
    pub fn append_identifier(&mut self, identifier: &str) {
        if is_bare_identifier(identifier) {
            self.sql.push_str(identifier);
        } else {
            self.sql.push('"');
            self.sql.push_str(&identifier.replace('"', "\"\""));
            self.sql.push('"');
        }
    }

    /// Append a single-quoted string literal.
    pub fn append_string_literal(&mut self, value: &str) {
        self.sql.push('\'');
        self.sql.push_str(&value.replace('\'', "''"));
        self.sql.push('\'');
    }

    /// Append a nested block on its own lines, shifted right by one indentation level.
    pub fn append_block(&mut self, block: &SQL) {
        self.sql.push('\n');
        self.sql.push_str(&indent(&block.sql, INDENT));
        self.sql.push('\n');
    }
}

/// Prefix every non-empty line of `text` with `prefix`.
/// Empty lines stay empty so that the output has no trailing whitespace.
pub fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_bare_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    let starts_well = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&identifier.to_ascii_lowercase().as_str())
}
