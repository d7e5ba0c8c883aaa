use crate::sql::{
    keyword::is_keyword,
    token::{NestingFunc, NestingId, Token},
    token_kind::TokenKind,
};
use sqlparser::dialect::{Dialect, PostgreSqlDialect};

const OPERATOR_CHARS: &str = "+-*/<>=~!@#%^&|`?:";

/// Lenient SQL tokenizer producing a flat stream of `Token`s.
///
/// Scope / Intent:
/// - Designed for caret-aware completion on partial statements.
/// - Identifier characters follow sqlparser's PostgreSQL dialect.
/// - Unterminated strings, quoted identifiers and comments run to the end of
///   the input instead of failing.
///
/// Behavior:
/// - Skips whitespace. Comments are emitted as [`TokenKind::Comment`] so
///   callers can tell when the caret sits inside one.
/// - Every token carries the nesting path of the parenthesis group it lives
///   in and the token preceding that group's `(`.
/// - Group ordinals are unique across the whole input, allocated in order of
///   the opening parentheses.
///
/// Guarantees:
/// - Never panics and never returns an error.
pub fn tokenize(sql: &str) -> Vec<Token> {
    Tokenizer::new(sql).run()
}

struct Tokenizer<'s> {
    sql: &'s str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    out: Vec<Token>,
    /// Open groups: nesting path inside the group, its ordinal and owning token.
    stack: Vec<(NestingId, u32, Option<NestingFunc>)>,
    next_group: u32,
}

impl<'s> Tokenizer<'s> {
    fn new(sql: &'s str) -> Self {
        Self {
            sql,
            chars: sql.char_indices().collect(),
            pos: 0,
            line: 0,
            out: Vec::new(),
            stack: Vec::new(),
            next_group: 0,
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn byte_at(&self, pos: usize) -> usize {
        self.chars.get(pos).map_or(self.sql.len(), |(b, _)| *b)
    }

    fn advance(&mut self) {
        if self.peek(0) == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn advance_while(&mut self, f: impl Fn(char) -> bool) {
        while self.peek(0).is_some_and(&f) {
            self.advance();
        }
    }

    fn current_nesting(&self) -> (NestingId, Option<NestingFunc>) {
        self.stack
            .last()
            .map(|(id, _, func)| (id.clone(), func.clone()))
            .unwrap_or_default()
    }

    fn run(mut self) -> Vec<Token> {
        let dialect = PostgreSqlDialect {};
        while let Some(c) = self.peek(0) {
            if c.is_whitespace() {
                self.advance();
                continue;
            }

            let start = self.pos;
            let line = self.line;
            let kind = match c {
                '-' if self.peek(1) == Some('-') => {
                    self.advance_while(|c| c != '\n');
                    TokenKind::Comment
                }
                '/' if self.peek(1) == Some('*') => {
                    self.block_comment();
                    TokenKind::Comment
                }
                '\'' => {
                    self.advance();
                    self.quoted('\'');
                    TokenKind::Str
                }
                'e' | 'E' if self.peek(1) == Some('\'') => {
                    self.advance();
                    self.advance();
                    self.escaped_string();
                    TokenKind::Str
                }
                '"' => {
                    self.advance();
                    self.quoted('"');
                    TokenKind::QuotedIdent
                }
                '$' => self.dollar(),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semicolon),
                '(' => self.single(TokenKind::ParenOpen),
                ')' => self.single(TokenKind::ParenClose),
                '.' if !self.peek(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.single(TokenKind::Dot)
                }
                c if c.is_ascii_digit() || c == '.' => {
                    self.number();
                    TokenKind::Number
                }
                c if dialect.is_identifier_start(c) => {
                    self.advance_while(|c| dialect.is_identifier_part(c));
                    TokenKind::Ident
                }
                c if OPERATOR_CHARS.contains(c) => {
                    self.operator();
                    TokenKind::Operator
                }
                _ => self.single(TokenKind::Other),
            };
            self.push(kind, start, line);
        }
        self.out
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn block_comment(&mut self) {
        self.advance();
        self.advance();
        let mut depth = 1;
        while let Some(c) = self.peek(0) {
            if c == '*' && self.peek(1) == Some('/') {
                self.advance();
                self.advance();
                depth -= 1;
                if depth == 0 {
                    return;
                }
            } else if c == '/' && self.peek(1) == Some('*') {
                self.advance();
                self.advance();
                depth += 1;
            } else {
                self.advance();
            }
        }
    }

    /// Consumes up to the closing quote. A doubled quote is an escaped quote.
    fn quoted(&mut self, quote: char) {
        while let Some(c) = self.peek(0) {
            self.advance();
            if c == quote {
                if self.peek(0) == Some(quote) {
                    self.advance();
                } else {
                    return;
                }
            }
        }
    }

    fn escaped_string(&mut self) {
        while let Some(c) = self.peek(0) {
            self.advance();
            match c {
                '\\' => self.advance(),
                '\'' if self.peek(0) == Some('\'') => self.advance(),
                '\'' => return,
                _ => {}
            }
        }
    }

    fn dollar(&mut self) -> TokenKind {
        if self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
            return TokenKind::Param;
        }

        let mut len = 1;
        while let Some(c) = self.peek(len) {
            if c == '$' {
                break;
            }
            if !(c.is_alphanumeric() || c == '_') {
                return self.single(TokenKind::Other);
            }
            len += 1;
        }
        if self.peek(len).is_none() {
            return self.single(TokenKind::Other);
        }

        let tag: String = (0..=len).filter_map(|i| self.peek(i)).collect();
        for _ in 0..=len {
            self.advance();
        }
        let body_start = self.byte_at(self.pos);
        match self.sql[body_start..].find(&tag) {
            Some(found) => {
                let close = body_start + found + tag.len();
                while self.byte_at(self.pos) < close {
                    self.advance();
                }
            }
            None => self.advance_while(|_| true),
        }
        TokenKind::Str
    }

    fn number(&mut self) {
        self.advance_while(|c| c.is_ascii_digit() || c == '_');
        if self.peek(0) == Some('.') && self.peek(1) != Some('.') {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(0), Some('e' | 'E')) {
            let sign = matches!(self.peek(1), Some('+' | '-')) as usize;
            if self.peek(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..=sign {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
            }
        }
    }

    fn operator(&mut self) {
        while let Some(c) = self.peek(0) {
            if !OPERATOR_CHARS.contains(c) {
                break;
            }
            let next = self.peek(1);
            if (c == '-' && next == Some('-')) || (c == '/' && next == Some('*')) {
                break;
            }
            self.advance();
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: usize) {
        let offset = self.byte_at(start);
        let end = self.byte_at(self.pos);
        let text = self.sql[offset..end].to_string();
        let text_lc = text.to_lowercase();
        let kind = match kind {
            TokenKind::Ident if is_keyword(&text_lc) => TokenKind::Keyword,
            other => other,
        };

        let (nesting_id, nesting_func) = self.current_nesting();
        let mut group = None;
        match kind {
            TokenKind::ParenOpen => {
                let ordinal = self.next_group;
                self.next_group += 1;
                group = Some(ordinal);
                let owner = self
                    .out
                    .iter()
                    .rev()
                    .find(|t| t.kind != TokenKind::Comment && t.end <= offset)
                    .map(|t| NestingFunc {
                        text: t.text.clone(),
                        text_lc: t.text_lc.clone(),
                        offset: t.offset,
                    });
                self.stack.push((nesting_id.child(ordinal), ordinal, owner));
            }
            TokenKind::ParenClose => {
                if let Some((_, ordinal, _)) = self.stack.pop() {
                    group = Some(ordinal);
                }
            }
            _ => {}
        }
        // Both parentheses report the enclosing level.
        let (nesting_id, nesting_func) = match kind {
            TokenKind::ParenClose => self.current_nesting(),
            _ => (nesting_id, nesting_func),
        };

        self.out.push(Token {
            text,
            text_lc,
            kind,
            offset,
            end,
            line,
            nesting_id,
            nesting_func,
            group,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn texts(sql: &str) -> Vec<String> {
        tokenize(sql).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn simple_select() {
        let toks = tokenize("SELECT a, b FROM t");
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Ident,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::Keyword,
                TokenKind::Ident
            ]
        );
        assert_eq!(toks[5].offset, 17);
        assert_eq!(toks[5].end, 18);
    }

    #[rstest]
    #[case("a::int", vec!["a", "::", "int"])]
    #[case("x <> 'it''s'", vec!["x", "<>", "'it''s'"])]
    #[case("\"My Table\".col", vec!["\"My Table\"", ".", "col"])]
    #[case("1.5e3 + .5", vec!["1.5e3", "+", ".5"])]
    #[case("$$ body; ( $$ ;", vec!["$$ body; ( $$", ";"])]
    #[case("$fn$ x $fn$", vec!["$fn$ x $fn$"])]
    #[case("$1 = 'unterminated", vec!["$1", "=", "'unterminated"])]
    #[case("E'a\\'b' x", vec!["E'a\\'b'", "x"])]
    #[case("a -- note\nb", vec!["a", "-- note", "b"])]
    #[case("a /* x /* y */ z */ b", vec!["a", "/* x /* y */ z */", "b"])]
    #[case("über_col", vec!["über_col"])]
    fn lexes(#[case] sql: &str, #[case] expected: Vec<&str>) {
        assert_eq!(texts(sql), expected);
    }

    #[test]
    fn keyword_classification_keeps_names_as_identifiers() {
        let toks = tokenize("select name from users");
        assert_eq!(toks[0].kind, TokenKind::Keyword);
        assert_eq!(toks[1].kind, TokenKind::Ident);
        assert_eq!(toks[3].kind, TokenKind::Ident);
    }

    #[test]
    fn nesting_paths_and_functions() {
        let toks = tokenize("SELECT f(a, (b)) FROM t");
        let by_text = |s: &str| toks.iter().find(|t| t.text == s).cloned();
        let f = by_text("f").unwrap();
        let a = by_text("a").unwrap();
        let b = by_text("b").unwrap();
        assert!(f.nesting_id.is_top());
        assert_eq!(a.nesting_id, NestingId::from([0]));
        assert_eq!(a.nesting_func.as_ref().map(|f| f.text_lc.as_str()), Some("f"));
        assert_eq!(b.nesting_id, NestingId::from([0, 1]));
        assert_eq!(b.nesting_func.as_ref().map(|f| f.text.as_str()), Some(","));

        let parens: Vec<_> = toks.iter().filter(|t| t.kind.is_paren()).collect();
        assert!(parens[0].nesting_id.is_top());
        assert_eq!(parens[1].nesting_id, NestingId::from([0]));
        assert_eq!(parens[2].nesting_id, NestingId::from([0]));
        assert!(parens[3].nesting_id.is_top());
        assert_eq!(parens[0].inner_nesting_id(), Some(NestingId::from([0])));
        assert!(by_text("FROM").unwrap().nesting_id.is_top());
    }

    #[test]
    fn unbalanced_close_stays_at_top() {
        let toks = tokenize("a ) b");
        assert!(toks.iter().all(|t| t.nesting_id.is_top()));
    }

    #[test]
    fn tracks_lines() {
        let toks = tokenize("SELECT\n  a\n\nFROM t");
        let lines: Vec<_> = toks.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![0, 1, 3, 3]);
    }
}
