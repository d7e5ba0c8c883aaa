//! The statement surrounding the caret.
//!
//! A [`CodeBlock`] is cut out of the document at top-level `;` tokens and at
//! blank lines, then split into three views relative to the caret:
//!
//! - *previous* tokens end strictly before the caret,
//! - the *current* token starts before the caret and ends at or after it,
//! - *next* tokens start at or after the caret.
//!
//! Matchers read almost everything through the helpers here (`ltoken`,
//! `prev_lc`, `table_identifiers`, ...), so the views are computed once.
use crate::sql::{
    keyword::STARTING_KEYWORDS,
    token::{NestingFunc, NestingId, Token},
    token_kind::TokenKind,
    tokenizer::tokenize,
};
use std::sync::Arc;

/// Keywords after which an identifier names a table.
const TABLE_INTRODUCERS: &[&str] = &[
    "from", "join", "table", "update", "truncate", "into", "analyze", "copy",
];

#[derive(Debug, Clone)]
pub struct CodeBlock {
    source: Arc<str>,
    /// Caret offset into the document.
    pub offset: usize,
    /// Non-comment tokens of the block, in document order.
    pub tokens: Vec<Token>,
    prev_len: usize,
    curr: Option<usize>,
    /// Nesting path of the parenthesis group the caret sits in.
    pub curr_nesting_id: NestingId,
    /// Token owning that group, usually a function name.
    pub curr_nesting_func: Option<NestingFunc>,
    pub is_commenting: bool,
    start: usize,
    end: usize,
    caret_line: usize,
}

impl CodeBlock {
    /// Builds the block containing `caret` from the whole document.
    pub fn new(source: &str, caret: usize) -> Self {
        let mut caret = caret.min(source.len());
        while !source.is_char_boundary(caret) {
            caret -= 1;
        }

        let all = tokenize(source);
        let is_commenting = all
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .any(|t| {
                let closed = t.text.starts_with("/*") && t.text.len() >= 4 && t.text.ends_with("*/");
                t.offset < caret && (caret < t.end || (!closed && caret == t.end))
            });
        let tokens: Vec<Token> = all.into_iter().filter(|t| t.kind != TokenKind::Comment).collect();
        let block = select_block(source, &tokens, caret);

        Self::from_tokens(Arc::from(source), block, caret, is_commenting)
    }

    fn from_tokens(source: Arc<str>, tokens: Vec<Token>, caret: usize, is_commenting: bool) -> Self {
        let prev_len = tokens.iter().take_while(|t| t.end < caret).count();
        let curr = tokens
            .get(prev_len)
            .filter(|t| t.offset < caret)
            .map(|_| prev_len);
        let start = tokens.first().map_or(caret, |t| t.offset.min(caret));
        let end = tokens.last().map_or(caret, |t| t.end.max(caret));
        let caret_line = source[..caret].matches('\n').count();

        let mut cb = Self {
            source,
            offset: caret,
            tokens,
            prev_len,
            curr,
            curr_nesting_id: NestingId::top(),
            curr_nesting_func: None,
            is_commenting,
            start,
            end,
            caret_line,
        };
        cb.curr_nesting_id = cb.compute_nesting_id();
        cb.curr_nesting_func = cb.compute_nesting_func();
        cb
    }

    fn compute_nesting_id(&self) -> NestingId {
        let curr_or_last = self.curr_token().or(self.ltoken());
        if let Some(open) = curr_or_last.filter(|t| t.kind == TokenKind::ParenOpen) {
            return open.inner_nesting_id().unwrap_or_default();
        }
        if let Some(close) = self.next_tokens().first().filter(|t| t.kind == TokenKind::ParenClose) {
            if let Some(id) = close.inner_nesting_id() {
                return id;
            }
        }
        curr_or_last.map(|t| t.nesting_id.clone()).unwrap_or_default()
    }

    fn compute_nesting_func(&self) -> Option<NestingFunc> {
        if self.curr_nesting_id.is_top() {
            return None;
        }
        let open = self.tokens.iter().position(|t| {
            t.kind == TokenKind::ParenOpen && t.inner_nesting_id().as_ref() == Some(&self.curr_nesting_id)
        });
        match open {
            Some(0) => None,
            Some(i) => {
                let owner = &self.tokens[i - 1];
                Some(NestingFunc {
                    text: owner.text.clone(),
                    text_lc: owner.text_lc.clone(),
                    offset: owner.offset,
                })
            }
            None => self
                .tokens
                .iter()
                .find(|t| t.nesting_id == self.curr_nesting_id)
                .and_then(|t| t.nesting_func.clone()),
        }
    }

    /// Re-slices the block to the tokens inside `[start, end]` and re-roots
    /// their nesting paths, keeping the caret.
    pub fn nested(&self, start: usize, end: usize) -> Self {
        let tokens: Vec<Token> = self
            .tokens
            .iter()
            .filter(|t| t.offset >= start && t.offset <= end)
            .cloned()
            .collect();
        let depth = tokens.first().map_or(0, |t| t.nesting_id.depth());
        let tokens = tokens
            .into_iter()
            .map(|mut t| {
                t.nesting_id = t.nesting_id.strip_depth(depth);
                if t.nesting_id.is_top() {
                    t.nesting_func = None;
                }
                t
            })
            .collect();
        Self::from_tokens(self.source.clone(), tokens, self.offset, self.is_commenting)
    }

    /// Tokens that end strictly before the caret.
    pub fn prev_tokens(&self) -> &[Token] {
        &self.tokens[..self.prev_len]
    }

    /// Token the caret is inside of or right at the end of.
    pub fn curr_token(&self) -> Option<&Token> {
        self.curr.map(|i| &self.tokens[i])
    }

    /// Tokens starting at or after the caret.
    pub fn next_tokens(&self) -> &[Token] {
        let from = self.curr.map_or(self.prev_len, |i| i + 1);
        &self.tokens[from.min(self.tokens.len())..]
    }

    fn prev_nth_back(&self, n: usize) -> Option<&Token> {
        self.prev_len.checked_sub(n + 1).map(|i| &self.tokens[i])
    }

    pub fn ltoken(&self) -> Option<&Token> {
        self.prev_nth_back(0)
    }

    pub fn l1token(&self) -> Option<&Token> {
        self.prev_nth_back(1)
    }

    pub fn l2token(&self) -> Option<&Token> {
        self.prev_nth_back(2)
    }

    /// First token of the statement, once the caret has moved past it.
    pub fn ftoken(&self) -> Option<&Token> {
        self.prev_tokens().first()
    }

    /// Block text from its first token to the caret.
    pub fn prev_text(&self) -> &str {
        &self.source[self.start.min(self.offset)..self.offset]
    }

    pub fn prev_lc(&self) -> String {
        self.prev_text().to_lowercase()
    }

    pub fn text(&self) -> &str {
        &self.source[self.start..self.end]
    }

    pub fn text_lc(&self) -> String {
        self.text().to_lowercase()
    }

    /// Current line up to the caret, lower-cased.
    pub fn this_line_lc(&self) -> String {
        let line_start = self.source[..self.offset].rfind('\n').map_or(0, |i| i + 1);
        self.source[line_start..self.offset].to_lowercase()
    }

    pub fn this_line_prev_tokens(&self) -> Vec<&Token> {
        self.prev_tokens()
            .iter()
            .filter(|t| t.line == self.caret_line)
            .collect()
    }

    pub fn caret_line(&self) -> usize {
        self.caret_line
    }

    /// Previous tokens at the given nesting level, parentheses excluded.
    pub fn prev_tokens_at(&self, nesting: &NestingId) -> Vec<&Token> {
        self.prev_tokens()
            .iter()
            .filter(|t| &t.nesting_id == nesting && !t.kind.is_paren())
            .collect()
    }

    /// Top-level statement keywords before the caret, most recent first.
    pub fn prev_top_kwds(&self) -> Vec<&Token> {
        self.prev_tokens()
            .iter()
            .rev()
            .filter(|t| {
                t.nesting_id.is_top()
                    && t.kind == TokenKind::Keyword
                    && STARTING_KEYWORDS.iter().any(|k| t.is(k))
            })
            .collect()
    }

    /// Identifier tokens of the block, skipping the name a CREATE introduces.
    pub fn identifiers(&self) -> Vec<&Token> {
        let is_create = self.tokens.first().is_some_and(|t| t.is("create"));
        let exists_at = self.tokens.get(4).is_some_and(|t| t.is("exists"));
        self.tokens
            .iter()
            .enumerate()
            .filter(|(i, t)| {
                t.is_identifier() && !(is_create && (*i == 2 || (exists_at && *i == 5)))
            })
            .map(|(_, t)| t)
            .collect()
    }

    /// Names following table-introducing keywords, schema-qualified when
    /// written that way.
    pub fn table_identifiers(&self) -> Vec<String> {
        let idents = self.identifiers();
        let mut tables = Vec::new();
        for (i, t) in self.tokens.iter().enumerate() {
            if !t.kind.is_word() || i == 0 || !idents.iter().any(|id| std::ptr::eq(*id, t)) {
                continue;
            }
            let prev = &self.tokens[i - 1];
            if prev.kind == TokenKind::Keyword && prev.is_any(TABLE_INTRODUCERS) {
                match (self.tokens.get(i + 1), self.tokens.get(i + 2)) {
                    (Some(dot), Some(name)) if dot.kind == TokenKind::Dot && name.kind.is_word() => {
                        tables.push(format!("{}.{}", t.text, name.text));
                    }
                    _ => tables.push(t.text.clone()),
                }
            }
        }
        tables
    }
}

/// Picks the tokens of the statement holding the caret.
fn select_block(source: &str, tokens: &[Token], caret: usize) -> Vec<Token> {
    let mut block_start = 0;
    for (i, t) in tokens.iter().enumerate() {
        let boundary = if t.kind == TokenKind::Semicolon && t.nesting_id.is_top() {
            Some(t.offset)
        } else {
            tokens
                .get(i + 1)
                .and_then(|next| blank_line_at(&source[t.end..next.offset]))
                .map(|nl| t.end + nl)
        };
        if let Some(boundary) = boundary {
            if caret <= boundary {
                return tokens[block_start..=i].to_vec();
            }
            block_start = i + 1;
        }
    }
    tokens[block_start.min(tokens.len())..].to_vec()
}

/// Offset of the newline starting a blank line within a token gap.
fn blank_line_at(gap: &str) -> Option<usize> {
    let mut newline = None;
    for (i, c) in gap.char_indices() {
        match c {
            '\n' if newline.is_some() => return newline,
            '\n' => newline = Some(i),
            c if c.is_whitespace() => {}
            _ => newline = None,
        }
    }
    None
}
