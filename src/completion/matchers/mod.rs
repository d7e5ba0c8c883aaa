//! Statement matchers, one module per command family.
//!
//! Every module exposes `result(ctx)`; [`Command`](crate::Command) decides
//! which one runs. [`first`] is a pre-pass for shapes that cut across
//! statements, such as `::` casts or `CASE`.
pub(crate) mod alter;
pub(crate) mod comment;
pub(crate) mod condition;
pub(crate) mod copy;
pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod drop;
pub(crate) mod first;
pub(crate) mod grant;
pub(crate) mod insert;
pub(crate) mod publication;
pub(crate) mod reassign;
pub(crate) mod reindex;
pub(crate) mod select;
pub(crate) mod set;
pub(crate) mod subscription;
pub(crate) mod update;
pub(crate) mod vacuum;
pub(crate) mod with;

use crate::*;
use std::sync::Arc;

/// Object phrases accepted after CREATE, ALTER, DROP and COMMENT ON.
pub(crate) const PG_OBJECTS: &[(&str, ObjectType)] = &[
    ("TABLE", ObjectType::Table),
    ("VIEW", ObjectType::View),
    ("MATERIALIZED VIEW", ObjectType::MView),
    ("FUNCTION", ObjectType::Function),
    ("PROCEDURE", ObjectType::Function),
    ("AGGREGATE", ObjectType::Function),
    ("INDEX", ObjectType::Index),
    ("SEQUENCE", ObjectType::Sequence),
    ("SCHEMA", ObjectType::Schema),
    ("TYPE", ObjectType::DataType),
    ("DOMAIN", ObjectType::DataType),
    ("ROLE", ObjectType::Role),
    ("USER", ObjectType::Role),
    ("POLICY", ObjectType::Policy),
    ("TRIGGER", ObjectType::Trigger),
    ("EVENT TRIGGER", ObjectType::EventTrigger),
    ("RULE", ObjectType::Rule),
    ("EXTENSION", ObjectType::Extension),
    ("DATABASE", ObjectType::Database),
    ("TABLESPACE", ObjectType::Tablespace),
    ("PUBLICATION", ObjectType::Publication),
    ("SUBSCRIPTION", ObjectType::Subscription),
];

/// The object phrase starting at token `idx`, longest phrase first.
///
/// Returns the phrase as declared, its type and the number of tokens it
/// spans.
pub(crate) fn object_at(cb: &CodeBlock, idx: usize) -> Option<(&'static str, ObjectType, usize)> {
    PG_OBJECTS
        .iter()
        .filter_map(|(phrase, object_type)| {
            let words: Vec<&str> = phrase.split(' ').collect();
            let matched = words
                .iter()
                .enumerate()
                .all(|(i, w)| cb.tokens.get(idx + i).is_some_and(|t| t.is(w) && t.end < cb.offset));
            matched.then_some((*phrase, *object_type, words.len()))
        })
        .max_by_key(|(_, _, len)| *len)
}

/// Completed tokens before the caret, lower-cased and space separated.
pub(crate) fn prev_words(cb: &CodeBlock) -> String {
    cb.prev_tokens()
        .iter()
        .map(|t| t.text_lc.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens after the last comma in `tokens`.
pub(crate) fn since_last_comma<'a>(tokens: &[&'a Token]) -> Vec<&'a Token> {
    let start = tokens
        .iter()
        .rposition(|t| t.kind == TokenKind::Comma)
        .map_or(0, |i| i + 1);
    tokens[start..].to_vec()
}

/// `$name` placeholders for a new object, also qualified by each user schema.
pub(crate) fn name_snippets(catalog: &Catalog, placeholder: &str) -> Vec<CompletionItem> {
    let schemas = user_schemas(catalog);
    suggest_snippets(
        std::iter::once(format!("${placeholder}"))
            .chain(schemas.iter().map(|s| format!("{s}.${placeholder}")))
            .map(Snippet::new),
    )
}

/// Keyword items in the given order.
pub(crate) fn suggest_kwds(kwds: &[&str]) -> Vec<CompletionItem> {
    suggest_snippets(kwds.iter().copied())
}

/// Server settings, with their current value and unit as detail.
pub(crate) fn setting_items(catalog: &Catalog) -> Vec<CompletionItem> {
    catalog
        .settings()
        .iter()
        .map(|s| {
            let mut item = CompletionItem::from_entry(s).sort("a");
            if let Some(info) = s.setting_info() {
                let value = info.setting.clone().unwrap_or_default();
                item.detail = Some(match &info.unit {
                    Some(unit) => format!("{value} {unit}"),
                    None => value,
                });
            }
            item
        })
        .collect()
}

/// Values a setting accepts, when they are enumerable.
pub(crate) fn setting_values(entry: &Entry) -> Vec<CompletionItem> {
    let Some(info) = entry.setting_info() else {
        return vec![];
    };
    let values: Vec<String> = match info.vartype.as_str() {
        "bool" => vec!["on".into(), "off".into()],
        "enum" => info.enum_values.clone(),
        _ => vec![],
    };
    let mut items: Vec<CompletionItem> = values
        .iter()
        .map(|v| CompletionItem::new(v.clone(), ObjectType::Setting).kind(ItemKind::Value))
        .collect();
    items.push(CompletionItem::keyword("DEFAULT"));
    suggest_ordered(items)
}

/// Keeps the given order by assigning index sort texts.
pub(crate) fn suggest_ordered(items: Vec<CompletionItem>) -> Vec<CompletionItem> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| item.sort(format!("{i:02}")))
        .collect()
}

/// Word operators that read like keywords inside expressions.
pub(crate) const WORD_OPERATORS: &[&str] = &[
    "and", "or", "not", "in", "is", "like", "ilike", "between", "similar", "exists",
];

pub(crate) fn is_operator(t: &Token) -> bool {
    t.kind == TokenKind::Operator || t.is_any(WORD_OPERATORS)
}

/// User-defined schemas, for `schema.$name` snippets.
pub(crate) fn user_schemas(catalog: &Catalog) -> Vec<String> {
    catalog
        .of_type(ObjectType::Schema)
        .filter(|s| s.name != "information_schema" && !s.name.starts_with("pg_"))
        .map(|s| s.escaped.clone())
        .collect()
}

/// Name written at the start of `tokens`, schema-qualified when written so.
pub(crate) fn written_name(tokens: &[Token]) -> Option<String> {
    match tokens {
        [schema, dot, name, ..]
            if schema.kind.is_word() && dot.kind == TokenKind::Dot && name.kind.is_word() =>
        {
            Some(format!("{}.{}", schema.text, name.text))
        }
        [name, ..] if name.kind.is_word() => Some(name.text.clone()),
        _ => None,
    }
}

/// Catalog table named right after the first top-level `kwd`, skipping `ONLY`.
pub(crate) fn table_after<'c>(cb: &CodeBlock, catalog: &'c Catalog, kwd: &str) -> Option<&'c Arc<Entry>> {
    let idx = cb
        .tokens
        .iter()
        .position(|t| t.nesting_id.is_top() && t.is(kwd))?;
    let rest = &cb.tokens[idx + 1..];
    let rest = match rest.first() {
        Some(t) if t.is("only") => &rest[1..],
        _ => rest,
    };
    catalog.find_table(&written_name(rest)?)
}

/// Columns of `table` in ordinal order, skipping the names in `written`.
pub(crate) fn table_columns(catalog: &Catalog, table: &Entry, written: &[&Token]) -> Vec<CompletionItem> {
    catalog
        .columns_of(table)
        .into_iter()
        .filter(|c| !written.iter().any(|t| unquote_identifier(&t.text) == c.name))
        .enumerate()
        .map(|(i, c)| CompletionItem::from_entry(c).sort(format!("a{i:03}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[rstest]
    #[case("DROP MATERIALIZED VIEW |", Some(("MATERIALIZED VIEW", ObjectType::MView, 2)))]
    #[case("DROP TABLE |", Some(("TABLE", ObjectType::Table, 1)))]
    #[case("DROP EVENT TRIGGER |", Some(("EVENT TRIGGER", ObjectType::EventTrigger, 2)))]
    #[case("DROP TAB|", None)]
    fn object_phrases(#[case] sql: &str, #[case] expected: Option<(&str, ObjectType, usize)>) {
        assert_eq!(object_at(&at_caret(sql), 1), expected);
    }

    #[rstest]
    #[case("UPDATE users SET |", "update", Some("users"))]
    #[case("DELETE FROM ONLY archive.old_orders |", "from", Some("old_orders"))]
    #[case("INSERT INTO missing (|", "into", None)]
    fn finds_the_target_table(#[case] sql: &str, #[case] kwd: &str, #[case] expected: Option<&str>) {
        let catalog = fixture_catalog();
        let table = table_after(&at_caret(sql), &catalog, kwd);
        assert_eq!(table.map(|t| t.name.as_str()), expected);
    }

    #[test]
    fn enum_setting_values() {
        let catalog = fixture_catalog();
        let setting = catalog.setting("client_min_messages").unwrap();
        let labels: Vec<_> = setting_values(setting).into_iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["debug1", "notice", "warning", "DEFAULT"]);
    }
}
