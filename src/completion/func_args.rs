use crate::*;

/// Owners of a parenthesis group that look like calls but are grammar.
const NOT_FUNCTIONS: &[&str] = &[
    "in", "exists", "values", "any", "all", "some", "over", "filter", "within", "using", "on",
    "as", "into", "table", "index", "lateral", "array", "with", "select", "where", "and", "or",
    "not", "when", "then", "else", "join", "from", "returns", "references", "check", "unique",
    "key", "partition", "by",
];

/// Argument suggestions when the caret sits inside a catalog function call.
///
/// Returns `None` when the enclosing parenthesis is not a known function
/// call so the caller can fall back to its own grammar.
pub fn suggest_func_args(cb: &CodeBlock, catalog: &Catalog) -> Option<Vec<CompletionItem>> {
    let func = cb.curr_nesting_func.as_ref()?;
    if NOT_FUNCTIONS.contains(&func.text_lc.as_str()) {
        return None;
    }
    let owner = cb.tokens.iter().find(|t| t.offset == func.offset)?;
    let after_relation_keyword = cb
        .tokens
        .iter()
        .rfind(|t| t.end <= owner.offset)
        .is_some_and(|t| t.is_any(&["into", "table", "on", "from", "join", "update"]));
    if !owner.kind.is_word() || after_relation_keyword {
        return None;
    }
    let functions = catalog.functions_named(&unquote_identifier(&owner.text));
    let function = functions.first()?;
    let info = function.function_info()?;

    let in_call: Vec<&Token> = cb.prev_tokens_at(&cb.curr_nesting_id);
    let arg_index = in_call.iter().filter(|t| t.kind == TokenKind::Comma).count();
    let after_argument = cb.curr_token().is_none()
        && in_call
            .last()
            .is_some_and(|t| t.kind != TokenKind::Comma && !t.is_any(&["distinct", "by"]));

    if after_argument {
        let mut items = Vec::new();
        if info.kind == FunctionKind::Aggregate && !in_call.iter().any(|t| t.is("order")) {
            items.push(CompletionItem::keyword("ORDER BY").docs("Order the aggregated rows"));
        }
        return Some(items);
    }

    let expected_type = info.arg_types.get(arg_index).map(|t| t.to_lowercase());
    let matches_type = |ty: Option<&str>| {
        expected_type
            .as_deref()
            .is_some_and(|e| ty.is_some_and(|t| t.to_lowercase() == e))
    };

    let mut items: Vec<CompletionItem> = suggest_column_like(cb, catalog)
        .into_iter()
        .map(|item| {
            let ty = item.source.as_ref().and_then(|e| match &e.info {
                EntryInfo::Column(c) => Some(c.data_type.as_str()),
                EntryInfo::Function(f) => Some(f.returns.as_str()),
                _ => None,
            });
            let rank = if matches_type(ty) { "a" } else { "b" };
            let sort = format!("{rank}{}", item.sort_text);
            item.sort(sort)
        })
        .collect();

    if info.kind == FunctionKind::Aggregate && arg_index == 0 {
        if function.name == "count" {
            items.push(CompletionItem::keyword("*").sort("!"));
        }
        items.push(CompletionItem::keyword("DISTINCT").sort("!"));
    }
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn ignores_non_function_groups() {
        let catalog = fixture_catalog();
        assert!(suggest_func_args(&at_caret("INSERT INTO orders (|"), &catalog).is_none());
        assert!(suggest_func_args(&at_caret("SELECT * FROM t WHERE a IN (|"), &catalog).is_none());
        assert!(suggest_func_args(&at_caret("SELECT unknown_fn(|"), &catalog).is_none());
        assert!(suggest_func_args(&at_caret("SELECT 1 |"), &catalog).is_none());
    }

    #[test]
    fn ranks_matching_argument_types_first() {
        let catalog = fixture_catalog();
        let items = suggest_func_args(&at_caret("SELECT lower(|) FROM users"), &catalog).unwrap();
        let email = items.iter().find(|i| i.label == "email").unwrap();
        let id = items.iter().find(|i| i.label == "id").unwrap();
        assert!(email.sort_text < id.sort_text);
    }

    #[test]
    fn count_offers_star_and_distinct() {
        let catalog = fixture_catalog();
        let items = suggest_func_args(&at_caret("SELECT count(|) FROM users"), &catalog).unwrap();
        assert!(items.iter().any(|i| i.label == "*"));
        assert!(items.iter().any(|i| i.label == "DISTINCT"));
    }

    #[test]
    fn aggregate_argument_followed_by_order_by() {
        let catalog = fixture_catalog();
        let items = suggest_func_args(&at_caret("SELECT sum(total |) FROM orders"), &catalog).unwrap();
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["ORDER BY"]);
    }
}
