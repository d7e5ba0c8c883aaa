//! Final shaping of a suggestion list before it reaches the editor.
use crate::*;
use itertools::Itertools as _;

/// Orders, deduplicates and caps `items`, then fills in the replace range
/// and filter text of each one.
///
/// Items are sorted by `(sort_text, label)`; the sort is stable so matchers
/// keep control over ties through their own order. Of two items with the
/// same label and insert text the better ranked one is kept.
pub fn postprocess(items: Vec<CompletionItem>, cb: &CodeBlock, max: usize) -> Vec<CompletionItem> {
    let range = replace_range(cb);
    let typed = typed_prefix(cb);
    items
        .into_iter()
        .sorted_by(|a, b| (&a.sort_text, &a.label).cmp(&(&b.sort_text, &b.label)))
        .unique_by(|i| (i.label.clone(), i.insert_text.clone()))
        .take(max)
        .map(|mut item| {
            item.range = Some(range);
            item.filter_text = Some(filter_text(&item, &typed));
            item
        })
        .collect()
}

/// Span of the word being typed, or an empty range at the caret.
pub fn replace_range(cb: &CodeBlock) -> Range {
    match cb.curr_token().filter(|t| t.kind.is_word() || t.kind == TokenKind::Number) {
        Some(t) => Range {
            start: t.offset,
            end: t.end,
        },
        None => Range {
            start: cb.offset,
            end: cb.offset,
        },
    }
}

fn typed_prefix(cb: &CodeBlock) -> String {
    cb.curr_token()
        .filter(|t| t.kind.is_word())
        .map(|t| {
            let written = cb.offset.saturating_sub(t.offset);
            unquote_identifier(t.text.get(..written).unwrap_or(&t.text))
        })
        .unwrap_or_default()
}

/// The unquoted name, prefixed by its initials when those are what is
/// being typed, so `ua` finds `user_accounts`.
fn filter_text(item: &CompletionItem, typed: &str) -> String {
    let base = item.filter_text.as_deref().unwrap_or(&item.label);
    let name = match base.starts_with('"') {
        true => unquote_identifier(base),
        false => base.to_string(),
    };
    if typed.len() < 2 || name.to_lowercase().starts_with(typed) {
        return name;
    }
    let initials = short_alias(&name);
    match initials.starts_with(typed) {
        true => format!("{initials} {name}"),
        false => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn item(label: &str, sort: &str) -> CompletionItem {
        CompletionItem::keyword(label).sort(sort)
    }

    #[test]
    fn sorts_and_dedupes() {
        let cb = at_caret("SELECT |");
        let items = vec![
            item("b", "1"),
            item("a", "1"),
            item("c", "0"),
            item("a", "2"),
            item("a", "1").insert("a()"),
        ];
        let out = postprocess(items, &cb, 100);
        let got: Vec<(&str, &str)> = out
            .iter()
            .map(|i| (i.label.as_str(), i.insert_text.as_str()))
            .collect();
        assert_eq!(got, vec![("c", "c"), ("a", "a"), ("a", "a()"), ("b", "b")]);
        assert_eq!(out[1].sort_text, "1");
    }

    #[test]
    fn caps_the_list() {
        let cb = at_caret("SELECT |");
        let items = (0..10).map(|i| item(&format!("k{i}"), "a")).collect();
        assert_eq!(postprocess(items, &cb, 3).len(), 3);
    }

    #[rstest]
    #[case("SELECT * FROM use|", Range { start: 14, end: 17 })]
    #[case("SELECT * FROM us|ers", Range { start: 14, end: 19 })]
    #[case("SELECT * FROM |", Range { start: 14, end: 14 })]
    #[case("SELECT users.|", Range { start: 13, end: 13 })]
    fn replace_ranges(#[case] sql: &str, #[case] expected: Range) {
        assert_eq!(replace_range(&at_caret(sql)), expected);
    }

    #[test]
    fn filter_text_matches_initials() {
        let cb = at_caret("SELECT * FROM ua|");
        let items = vec![
            CompletionItem::new("user_accounts", ObjectType::Table),
            CompletionItem::new("\"Users\"", ObjectType::Table),
        ];
        let out = postprocess(items, &cb, 10);
        assert_eq!(out[0].filter_text.as_deref(), Some("Users"));
        assert_eq!(out[1].filter_text.as_deref(), Some("ua user_accounts"));
    }
}
