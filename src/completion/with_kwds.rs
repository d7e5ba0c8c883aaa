//! Keyword grammar resolution.
//!
//! [`with_kwds`] locates the grammar keywords already written before the
//! caret, works out the last one ([`WithKwds::prev_kwd`]) and what may come
//! next ([`WithKwds::remaining`]). [`WithKwds::suggestion`] then produces
//! either values for the last keyword's expected input or the next keywords.
use crate::*;

#[derive(Debug, Clone, Copy, Default)]
pub struct KwdOpts {
    /// Any keyword may follow any other, ignoring declaration order.
    pub not_ordered: bool,
    /// Only tokens from the last occurrence of this keyword onward are
    /// considered, e.g. `SELECT` after `UNION`.
    pub top_reset_kwd: Option<&'static str>,
}

/// A grammar keyword found in the scoped tokens.
#[derive(Debug, Clone, Copy)]
pub struct UsedKwd<'a> {
    pub kwd: &'a Kwd,
    /// Declaration index within the grammar.
    pub idx: usize,
    /// Index of the first matched token within the scoped tokens.
    start: usize,
    /// Number of tokens the phrase spans.
    len: usize,
    pub offset: usize,
    pub end: usize,
    /// Last token ends before the caret, so the phrase is complete.
    complete: bool,
}

#[derive(Debug, Clone)]
pub struct RemainingKwd<'a> {
    pub kwd: &'a Kwd,
    pub sort_text: String,
    pub docs: Option<String>,
}

#[derive(Debug)]
pub struct WithKwds<'a> {
    cb: &'a CodeBlock,
    catalog: &'a Catalog,
    kwds: &'a [Kwd],
    scoped: Vec<&'a Token>,
    used: Vec<UsedKwd<'a>>,
    pub prev_kwd: Option<UsedKwd<'a>>,
    /// Identifiers written after the last keyword.
    pub prev_identifiers: Vec<&'a Token>,
    pub remaining: Vec<RemainingKwd<'a>>,
}

/// Resolves `kwds` against the tokens of the caret's nesting level.
pub fn with_kwds<'a>(
    kwds: &'a [Kwd],
    cb: &'a CodeBlock,
    catalog: &'a Catalog,
    opts: KwdOpts,
) -> WithKwds<'a> {
    let caret = cb.offset;
    let options_kwd = cb.curr_nesting_func.as_ref().and_then(|func| {
        kwds.iter().position(|k| {
            k.expects_options() && k.words().last().is_some_and(|w| *w == func.text_lc)
        })
    });

    let mut scoped: Vec<&Token> = cb
        .tokens
        .iter()
        .filter(|t| {
            t.nesting_id == cb.curr_nesting_id
                || (options_kwd.is_some()
                    && cb.curr_nesting_id.parent().as_ref() == Some(&t.nesting_id)
                    && cb.curr_nesting_func.as_ref().is_some_and(|f| t.offset <= f.offset))
        })
        .collect();
    if let Some(reset) = opts.top_reset_kwd {
        if let Some(start) = scoped.iter().rposition(|t| t.is(reset) && t.offset < caret) {
            scoped.drain(..start);
        }
    }

    let used = find_used(kwds, &scoped, caret);
    let prev_kwd = match options_kwd {
        Some(idx) => used.iter().rev().find(|u| u.idx == idx && u.complete).copied(),
        None => used.iter().rev().find(|u| u.complete).copied(),
    };

    let prev_identifiers = scoped
        .iter()
        .enumerate()
        .filter(|(i, t)| {
            t.offset < caret
                && t.is_identifier()
                && prev_kwd.is_none_or(|p| *i >= p.start + p.len)
        })
        .map(|(_, t)| *t)
        .collect();

    let mut resolved = WithKwds {
        cb,
        catalog,
        kwds,
        scoped,
        used,
        prev_kwd,
        prev_identifiers,
        remaining: Vec::new(),
    };
    resolved.remaining = resolved.compute_remaining(opts);
    resolved
}

fn find_used<'a>(kwds: &'a [Kwd], scoped: &[&Token], caret: usize) -> Vec<UsedKwd<'a>> {
    let mut found = Vec::new();
    for (idx, kwd) in kwds.iter().enumerate() {
        let words = kwd.words();
        if words.is_empty() || words.len() > scoped.len() {
            continue;
        }
        for start in 0..=(scoped.len() - words.len()) {
            let phrase = &scoped[start..start + words.len()];
            if phrase.iter().zip(&words).all(|(t, w)| t.text_lc == *w) {
                let (first, last) = (phrase[0], phrase[phrase.len() - 1]);
                found.push(UsedKwd {
                    kwd,
                    idx,
                    start,
                    len: words.len(),
                    offset: first.offset,
                    end: last.end,
                    complete: last.end < caret || (last.end == caret && !last.kind.is_word()),
                });
            }
        }
    }

    // The longer phrase wins where matches overlap: `LEFT JOIN` over `JOIN`.
    let weight = |u: &UsedKwd| (u.len, u.kwd.kwd.len());
    let mut used: Vec<UsedKwd> = found
        .iter()
        .filter(|k| {
            !found.iter().any(|l| {
                l.start < k.start + k.len && k.start < l.start + l.len && weight(l) > weight(k)
            })
        })
        .copied()
        .collect();
    used.sort_by_key(|u| (u.start, u.idx));
    used
}

impl<'a> WithKwds<'a> {
    fn prev_scoped(&self) -> impl Iterator<Item = &&'a Token> {
        self.scoped.iter().filter(|t| t.offset < self.cb.offset)
    }

    fn prev_text_lc(&self) -> String {
        self.prev_scoped()
            .map(|t| t.text_lc.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Previous tokens without the one being typed.
    fn completed_text_lc(&self) -> String {
        self.scoped
            .iter()
            .filter(|t| t.end < self.cb.offset)
            .map(|t| t.text_lc.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn next_text_lc(&self) -> String {
        self.scoped
            .iter()
            .filter(|t| t.offset >= self.cb.offset)
            .map(|t| t.text_lc.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Keywords matched in the scoped tokens, in text order.
    pub fn used(&self) -> &[UsedKwd<'a>] {
        &self.used
    }

    /// Tokens written after the last keyword, up to the caret.
    pub fn prev_kwd_input(&self) -> Vec<&'a Token> {
        let Some(prev) = self.prev_kwd else {
            return vec![];
        };
        self.scoped[prev.start + prev.len..]
            .iter()
            .filter(|t| t.offset < self.cb.offset)
            .copied()
            .collect()
    }

    fn compute_remaining(&self, opts: KwdOpts) -> Vec<RemainingKwd<'a>> {
        let caret = self.cb.offset;
        let prev_used = self
            .used
            .iter()
            .rev()
            .find(|u| u.complete && !u.kwd.can_repeat);
        let next_used = self
            .used
            .iter()
            .find(|u| u.offset >= caret && !u.kwd.can_repeat);

        let range = if opts.not_ordered {
            0..self.kwds.len()
        } else {
            let start = prev_used.map_or(0, |u| u.idx + 1);
            let end = next_used.map_or(self.kwds.len(), |u| u.idx);
            start..end.max(start)
        };

        let prev_text = self.prev_text_lc();
        let completed = self.completed_text_lc();
        let next_text = self.next_text_lc();
        let includes = |text: &str, v: &str| {
            let v = v.to_lowercase();
            format!(" {text} ").contains(&format!(" {v} ")) || text.starts_with(&format!("{v} "))
        };

        let mut remaining: Vec<RemainingKwd<'a>> = self.kwds[range.clone()]
            .iter()
            .zip(range)
            .filter(|(k, _)| k.can_repeat || !self.used.iter().any(|u| u.kwd.is(&k.kwd)))
            .filter(|(k, _)| {
                let mut show = true;
                if !k.just_after.is_empty() {
                    show &= k.just_after.iter().any(|j| includes(&prev_text, j));
                }
                if let Some(dep) = &k.depends_on {
                    show &= includes(&prev_text, dep);
                }
                if let Some(dep) = &k.depends_on_after {
                    show &= includes(&next_text, dep);
                }
                match &k.exclude_if {
                    Some(ExcludeIf::Words(words)) => {
                        show &= !words.iter().any(|w| includes(&completed, w));
                    }
                    Some(ExcludeIf::When(f)) => show &= !f(self.cb),
                    None => {}
                }
                if !k.exactly_after.is_empty() {
                    show &= k.exactly_after.iter().any(|e| {
                        let e = e.to_lowercase();
                        completed == e || completed.ends_with(&format!(" {e}"))
                    });
                }
                if let Some(include) = k.include {
                    show &= include(self.cb);
                }
                show
            })
            .map(|(kwd, idx)| RemainingKwd {
                kwd,
                sort_text: format!("{idx:02}"),
                docs: kwd
                    .docs
                    .clone()
                    .or_else(|| self.catalog.keyword_docs(&kwd.kwd).map(str::to_string)),
            })
            .collect();

        if let Some(prev) = self.prev_kwd {
            let follows_prev = |r: &RemainingKwd| r.kwd.just_after.iter().any(|j| prev.kwd.is(j));
            if remaining.iter().any(follows_prev) {
                remaining.retain(follows_prev);
            }
        }
        remaining
    }

    /// Values for the last keyword's expected input, or the keywords that
    /// may follow.
    ///
    /// Keyword insert texts are prefixed with `delimiter` unless the token
    /// before the caret already ends with it, with `(`, or with any of
    /// `exclude_if`.
    pub fn suggestion(&self, delimiter: Option<&str>, exclude_if: &[&str]) -> Vec<CompletionItem> {
        let cb = self.cb;
        if let Some(items) = suggest_func_args(cb, self.catalog) {
            return items;
        }
        if cb.curr_token().is_some_and(|t| t.kind == TokenKind::Semicolon) {
            return vec![];
        }

        if let Some(prev) = self.prev_kwd {
            let input: Vec<&Token> = self
                .prev_kwd_input()
                .into_iter()
                .filter(|t| !t.kind.is_paren())
                .collect();
            let first_input = input.first().filter(|t| t.end <= cb.offset);
            let has_gaps = input.windows(2).any(|w| w[0].end < w[1].offset);
            let still_writing = prev.kwd.expects_options()
                || (first_input.is_some() && !has_gaps && cb.curr_token().is_some());
            let missing_input = still_writing
                || first_input.is_none_or(|t| self.kwds.iter().any(|k| k.is(&t.text)));

            if missing_input && (prev.kwd.expects.is_some() || prev.kwd.options.is_some()) {
                let items = self.input_suggestions(prev.kwd);
                if !items.is_empty() {
                    return items;
                }
            }
        }

        let ltoken_text = cb.ltoken().map(|t| t.text.trim()).unwrap_or_default();
        let on_open_paren = cb.curr_token().is_some_and(|t| t.kind == TokenKind::ParenOpen);
        self.remaining
            .iter()
            .map(|r| {
                let add_delimiter = delimiter.is_some_and(|d| {
                    !on_open_paren
                        && !exclude_if
                            .iter()
                            .chain([&d, &"("])
                            .any(|e| ltoken_text.ends_with(e))
                });
                let insert = match (add_delimiter, delimiter) {
                    (true, Some(d)) => format!("{d} {}", r.kwd.kwd),
                    _ => r.kwd.kwd.clone(),
                };
                let mut item = CompletionItem::keyword(r.kwd.kwd.clone())
                    .insert(insert)
                    .sort(r.sort_text.clone());
                item.documentation = r.docs.clone();
                if r.kwd.optional {
                    item.detail = Some("(optional)".into());
                }
                item
            })
            .collect()
    }

    fn input_suggestions(&self, kwd: &Kwd) -> Vec<CompletionItem> {
        let cb = self.cb;
        let mut options = match &kwd.options {
            Some(KwdOptions::List(list)) => suggest_snippets(list.iter().cloned()),
            Some(KwdOptions::Dynamic(f)) => f(self.catalog, cb),
            None => vec![],
        };
        if kwd.expects == Some(Expect::EqOption) && !cb.prev_text().trim_end().ends_with('=') {
            for item in &mut options {
                item.insert_text = format!("= {}", item.insert_text);
            }
        }

        let expected = match &kwd.expects {
            Some(e) if e.is_column() && kwd.is("RETURNING") => {
                let mut columns = columns_in_scope(cb, self.catalog);
                columns.push(CompletionItem::keyword("*").docs("All columns").sort("!"));
                columns
            }
            Some(e) if e.is_column() => columns_in_scope(cb, self.catalog),
            Some(Expect::Condition) => suggest_column_like(cb, self.catalog),
            Some(e @ (Expect::Objects(_) | Expect::Wrapped(_))) => get_expected(e, cb, self.catalog),
            _ => vec![],
        };

        let written: Vec<&str> = self.prev_scoped().map(|t| t.text.as_str()).collect();
        let mut items: Vec<CompletionItem> = options
            .into_iter()
            .map(|o| {
                let sort = format!("0{}", o.sort_text);
                o.sort(sort)
            })
            .chain(expected.into_iter().map(|e| {
                let rank = if written.contains(&e.insert_text.as_str()) { "b" } else { "a" };
                let sort = format!("{rank}{}", e.sort_text);
                e.sort(sort)
            }))
            .collect();

        let inside_own_parens = cb
            .curr_nesting_func
            .as_ref()
            .is_some_and(|f| kwd.words().last().is_some_and(|w| *w == f.text_lc));
        if kwd.expects_options() && !inside_own_parens {
            for item in &mut items {
                item.insert_text = format!("({}$0)", item.insert_text);
            }
        }
        items
    }
}
