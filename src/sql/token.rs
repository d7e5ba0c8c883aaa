//! Token model tying a `TokenKind` to its source span and nesting.
//!
//! Besides its classification and byte offsets, every token records the
//! parenthesis group it lives in. A [`NestingId`] is the path of group
//! ordinals from the top level down, so `SELECT f(a, (b))` gives `a` the path
//! `[0]` and `b` the path `[0, 1]`. The parentheses themselves belong to the
//! enclosing level, which keeps `f(...)` a single unit at its own depth.
use crate::sql::token_kind::TokenKind;
use std::fmt;

/// Path of parenthesis group ordinals. Empty means top level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NestingId(Vec<u32>);

impl NestingId {
    pub fn top() -> Self {
        Self::default()
    }

    pub fn is_top(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child(&self, group: u32) -> Self {
        let mut path = self.0.clone();
        path.push(group);
        Self(path)
    }

    /// Enclosing level, or `None` at the top.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// True if `self` is `other` or nested somewhere inside it.
    pub fn is_within(&self, other: &NestingId) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Drops the first `depth` levels, re-rooting the path.
    pub fn strip_depth(&self, depth: usize) -> Self {
        Self(self.0.iter().skip(depth).copied().collect())
    }
}

impl fmt::Display for NestingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", path.join("."))
    }
}

impl<const N: usize> From<[u32; N]> for NestingId {
    fn from(path: [u32; N]) -> Self {
        Self(path.to_vec())
    }
}

/// The token right before an opening parenthesis, usually a function name or
/// the keyword owning an option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingFunc {
    pub text: String,
    pub text_lc: String,
    pub offset: usize,
}

/// A lexical token. Offsets are byte offsets into the tokenized text with an
/// exclusive `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub text_lc: String,
    pub kind: TokenKind,
    pub offset: usize,
    pub end: usize,
    /// Zero based line of `offset`.
    pub line: usize,
    pub nesting_id: NestingId,
    pub nesting_func: Option<NestingFunc>,
    /// Group ordinal opened or closed by a parenthesis token.
    pub group: Option<u32>,
}

impl Token {
    /// Byte length of this token (`end - offset`).
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive comparison against the token text.
    pub fn is(&self, text: &str) -> bool {
        self.text_lc.eq_ignore_ascii_case(text)
    }

    /// True if the token text matches any of the given words.
    pub fn is_any(&self, texts: &[&str]) -> bool {
        texts.iter().any(|t| self.is(t))
    }

    pub fn is_identifier(&self) -> bool {
        self.kind.is_identifier()
    }

    /// Nesting path of the group this parenthesis opens.
    pub fn inner_nesting_id(&self) -> Option<NestingId> {
        match self.kind {
            TokenKind::ParenOpen | TokenKind::ParenClose => {
                self.group.map(|g| self.nesting_id.child(g))
            }
            _ => None,
        }
    }
}
