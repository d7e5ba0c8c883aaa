//! Keyword classification for word tokens.
//!
//! Only words that act as grammar in the statements we complete are listed.
//! Common column-ish words that PostgreSQL accepts as identifiers (`name`,
//! `type`, `value`, `data`, ...) are deliberately absent so they tokenize as
//! [`TokenKind::Ident`](super::TokenKind::Ident).
use std::{collections::HashSet, sync::LazyLock};

static KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "abort", "access", "add", "after", "aggregate", "all", "alter", "always", "analyze",
        "and", "any", "array", "as", "asc", "before", "begin", "between", "both", "by", "call",
        "cascade", "case", "cast", "check", "checkpoint", "collate", "column", "comment",
        "commit", "concurrently", "conflict", "constraint", "copy", "create", "cross",
        "current_date", "current_role", "current_time", "current_timestamp", "current_user",
        "cycle", "database", "deallocate", "declare", "default", "deferrable", "delete", "desc",
        "disable", "discard", "distinct", "do", "drop", "each", "else", "enable", "end",
        "except", "execute", "exists", "explain", "extension", "false", "fetch", "filter",
        "first", "following", "for", "force", "foreign", "from", "full", "function", "generated",
        "grant", "group", "having", "identity", "if", "ilike", "in", "index", "inherits",
        "inner", "insert", "instead", "intersect", "into", "is", "isnull", "join", "key",
        "last", "lateral", "leading", "left", "like", "limit", "listen", "lock", "materialized",
        "natural", "not", "nothing", "notify", "notnull", "null", "nulls", "of", "offset", "on",
        "only", "or", "order", "ordinality", "outer", "over", "owned", "owner", "partition",
        "policy", "preceding", "prepare", "primary", "procedure", "publication", "range",
        "reassign", "recursive", "references", "refresh", "reindex", "release", "rename",
        "replace", "reset", "restrict", "returning", "returns", "revoke", "right", "role",
        "rollback", "row", "rows", "rule", "savepoint", "schema", "select", "sequence",
        "session_user", "set", "show", "similar", "some", "start", "stored", "subscription",
        "table", "tablespace", "temp", "temporary", "then", "ties", "to", "trailing",
        "transaction", "trigger", "true", "truncate", "unbounded", "union", "unique",
        "unlogged", "update", "user", "using", "vacuum", "values", "verbose", "view", "when",
        "where", "window", "with", "within",
    ]
    .into_iter()
    .collect()
});

/// Returns true if the lower-cased word is classified as a keyword.
pub fn is_keyword(word_lc: &str) -> bool {
    KEYWORDS.contains(word_lc)
}

/// Words that can begin a top-level statement, in the order they are offered
/// when the caret sits on an empty statement.
pub const STARTING_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "WITH", "CREATE", "ALTER", "DROP", "GRANT",
    "REVOKE", "COPY", "VACUUM", "ANALYZE", "REINDEX", "EXPLAIN", "TRUNCATE", "SET", "SHOW",
    "RESET", "COMMENT", "REASSIGN", "REFRESH", "CALL", "BEGIN", "COMMIT", "ROLLBACK",
    "LISTEN", "NOTIFY", "PREPARE", "EXECUTE", "DEALLOCATE", "DISCARD", "CHECKPOINT", "LOCK",
    "DO",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_grammar_words_only() {
        assert!(is_keyword("select"));
        assert!(is_keyword("join"));
        assert!(!is_keyword("name"));
        assert!(!is_keyword("users"));
        assert!(!is_keyword("SELECT"), "lookup expects lower case");
    }

    #[test]
    fn every_starting_keyword_is_a_keyword() {
        for kwd in STARTING_KEYWORDS {
            assert!(is_keyword(&kwd.to_lowercase()), "{kwd}");
        }
    }
}
