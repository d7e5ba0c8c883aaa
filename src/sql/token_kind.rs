//! Token kind definitions for the lenient SQL tokenizer.
//!
//! Each `TokenKind` variant represents a syntactic atom discovered during
//! scanning. The tokenizer avoids strict SQL rules; anything unrecognized
//! becomes `Other`.

/// Classification for a token produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TokenKind {
    /// Unquoted word that is not a keyword.
    Ident,
    /// Double-quoted identifier, quotes included in the token text.
    QuotedIdent,
    /// Word found in the curated keyword set.
    Keyword,
    /// Single-quoted, `E'..'` or dollar-quoted string literal.
    #[display("String")]
    Str,
    Number,
    /// Run of operator characters such as `=`, `::`, `<>` or `?`.
    Operator,
    /// Positional parameter such as `$1`.
    Param,
    Comma,
    Dot,
    Semicolon,
    ParenOpen,
    ParenClose,
    /// `--` line comment or `/* */` block comment.
    Comment,
    /// Any other single character we do not specially classify.
    Other,
}

impl TokenKind {
    /// Plain or quoted identifier.
    pub fn is_identifier(self) -> bool {
        matches!(self, TokenKind::Ident | TokenKind::QuotedIdent)
    }

    /// Identifier or keyword, anything that reads as a word.
    pub fn is_word(self) -> bool {
        matches!(self, TokenKind::Ident | TokenKind::QuotedIdent | TokenKind::Keyword)
    }

    pub fn is_paren(self) -> bool {
        matches!(self, TokenKind::ParenOpen | TokenKind::ParenClose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        assert!(TokenKind::Ident.is_identifier());
        assert!(TokenKind::QuotedIdent.is_word());
        assert!(!TokenKind::Keyword.is_identifier());
        assert!(TokenKind::ParenClose.is_paren());
        assert_eq!(TokenKind::Str.to_string(), "String");
    }
}
