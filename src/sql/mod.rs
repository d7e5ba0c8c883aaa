//! Lenient SQL tokenization and caret-relative statement views.
//!
//! This module holds the building blocks the completion engine uses to reason
//! about an in-progress statement without a full parser:
//!
//! Modules:
//! - `keyword`    : Curated keyword set used to classify word tokens.
//! - `token_kind` : Classification of lexical atoms.
//! - `token`      : Token struct with span, line and parenthesis nesting path.
//! - `tokenizer`  : Single pass tokenizer that never fails on partial input.
//! - `identifier` : Escaping and unquoting of SQL identifiers.
//! - `code_block` : The statement around the caret, split into before/at/after views.
//!
//! Design Principles:
//! 1. Accept incomplete or syntactically invalid SQL (robust for live editing).
//! 2. Preserve original identifier casing; keep a lower-cased copy for matching.
//! 3. Record parenthesis nesting on every token so consumers can scope to the
//!    group the caret sits in.
//!
//! Example:
//! ```rust
//! use pgcomplete::sql::prelude::*;
//!
//! let cb = CodeBlock::new("SELECT a FROM my_table WHERE ", 29);
//! assert_eq!(cb.ltoken().map(|t| t.text_lc.as_str()), Some("where"));
//! assert_eq!(cb.table_identifiers(), vec!["my_table".to_string()]);
//! ```
//!
//! NOTE: This is **not** a full SQL parser. Dollar-quoted bodies are kept as a
//! single string token and never re-tokenized.

pub mod code_block;
pub mod identifier;
pub mod keyword;
pub mod token;
pub mod token_kind;
pub mod tokenizer;

pub use code_block::CodeBlock;
pub use identifier::{escape_identifier, unquote_identifier};
pub use keyword::{STARTING_KEYWORDS, is_keyword};
pub use token::{NestingFunc, NestingId, Token};
pub use token_kind::TokenKind;
pub use tokenizer::tokenize;

/// Convenience prelude re-exporting the most commonly used items.
pub mod prelude {
    pub use super::{CodeBlock, NestingId, Token, TokenKind, tokenize};
}
