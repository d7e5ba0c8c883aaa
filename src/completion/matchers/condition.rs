//! Boolean expression positions: `WHERE`, `ON`, `WHEN`, `HAVING` and the
//! `USING`/`WITH CHECK` clauses of policies.
use super::*;

/// Suggestions while writing a condition, or `None` when the caret is not
/// inside one.
///
/// Right after the condition keyword, `AND`/`OR` or an operator the columns
/// in scope are offered, ranked by the type of the left operand. After an
/// operand come the operators and `AND`/`OR`.
pub(crate) fn suggest_condition(ctx: &MatchContext<'_>) -> Option<Vec<CompletionItem>> {
    let cb = ctx.cb;
    let prev = cb.prev_tokens_at(&cb.curr_nesting_id);
    let prev_kwd = prev
        .iter()
        .rev()
        .find(|t| t.kind == TokenKind::Keyword && !t.is_any(WORD_OPERATORS) && !t.is_any(&["null", "true", "false"]))?;
    if cb.curr_token().is_some_and(|t| t.kind == TokenKind::Dot) || cb.this_line_prev_tokens().is_empty() {
        return None;
    }
    if cb.curr_nesting_func.as_ref().is_some_and(|f| f.text_lc == "as") && cb.ftoken().is_some_and(|t| t.is("with")) {
        return None;
    }

    let policy_like = cb
        .prev_tokens()
        .iter()
        .any(|t| t.is_any(&["policy", "publication", "subscription"]));
    let on_join = prev_kwd.is("on") && cb.prev_tokens().iter().any(|t| t.is("join"));
    let expects_condition = prev_kwd.is_any(&["where", "when", "having"])
        || on_join
        || (policy_like && prev_kwd.is_any(&["using", "check", "where"]));
    if !expects_condition {
        return None;
    }
    if prev
        .iter()
        .any(|t| t.is("exists") && t.offset > prev_kwd.offset)
    {
        return None;
    }

    let ltoken = cb.ltoken()?;
    if ltoken.offset == prev_kwd.offset || ltoken.is_any(&["and", "or"]) || is_operator(ltoken) {
        let left = is_operator(ltoken).then(|| cb.l1token()).flatten();
        return Some(columns_by_type(ctx, left));
    }

    let (ops, and_or) = operators(ctx.catalog);
    if ltoken.kind == TokenKind::ParenClose {
        return Some(ops.into_iter().chain(and_or).collect());
    }
    if cb.curr_token().is_some_and(|t| ops.iter().any(|o| o.label == t.text)) {
        return Some(vec![]);
    }
    if cb.l1token().is_some_and(|t| is_operator(t) && !t.is_any(&["and", "or"]))
        && cb.prev_text().ends_with(' ')
    {
        return Some(and_or);
    }
    if ltoken.is_identifier() || ltoken.kind == TokenKind::Number || ltoken.kind == TokenKind::Str {
        return Some(ops.into_iter().chain(and_or).collect());
    }
    None
}

fn operators(catalog: &Catalog) -> (Vec<CompletionItem>, Vec<CompletionItem>) {
    let mut ops: Vec<CompletionItem> = catalog
        .of_type(ObjectType::Operator)
        .map(|o| CompletionItem::from_entry(o).sort("a"))
        .collect();
    for (i, op) in ["IS NULL", "IS NOT NULL", "IN", "NOT IN", "LIKE", "ILIKE", "BETWEEN"]
        .into_iter()
        .enumerate()
    {
        if !ops.iter().any(|o| o.label == op) {
            ops.push(
                CompletionItem::new(op, ObjectType::Operator)
                    .insert(if op.ends_with("IN") { format!("{op} ($0)") } else { op.to_string() })
                    .sort(format!("b{i:02}")),
            );
        }
    }
    let and_or = ["AND", "OR"]
        .into_iter()
        .map(|k| CompletionItem::keyword(k).sort("c"))
        .collect();
    (ops, and_or)
}

/// Column-like items; those sharing the left operand's type rank first.
fn columns_by_type(ctx: &MatchContext<'_>, left: Option<&Token>) -> Vec<CompletionItem> {
    let items = ctx.column_like();
    let left_type = left.and_then(|l| {
        let name = unquote_identifier(&l.text);
        ctx.tabular_expressions()
            .into_iter()
            .flat_map(|e| e.columns)
            .find(|c| c.name == name)
            .and_then(|c| c.data_type)
    });
    let Some(left_type) = left_type else {
        return items;
    };
    items
        .into_iter()
        .map(|item| {
            let same = item.source.as_ref().is_some_and(|e| match &e.info {
                EntryInfo::Column(c) => c.data_type == left_type,
                EntryInfo::Function(f) => f.returns == left_type,
                _ => false,
            });
            let sort = format!("{}{}", if same { "a" } else { "b" }, item.sort_text);
            item.sort(sort)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn condition(sql: &str) -> Option<Vec<CompletionItem>> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        suggest_condition(&MatchContext::new(&cb, &catalog))
    }

    #[test]
    fn columns_right_after_where() {
        let items = condition("SELECT * FROM users WHERE |").unwrap();
        assert!(items.iter().any(|i| i.label == "email"));
    }

    #[test]
    fn operators_after_an_operand() {
        let items = condition("SELECT * FROM users WHERE email |").unwrap();
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"="));
        assert!(labels.contains(&"IS NULL"));
        assert!(labels.contains(&"AND"));
    }

    #[test]
    fn same_type_columns_rank_first() {
        let items = condition("SELECT * FROM users u JOIN orders o ON u.id = o.|");
        assert!(items.is_none(), "qualified columns are left to the statement");

        let items = condition("SELECT * FROM orders WHERE total > |").unwrap();
        let total = items.iter().find(|i| i.label == "total").unwrap();
        let user_id = items.iter().find(|i| i.label == "user_id").unwrap();
        assert!(total.sort_text < user_id.sort_text);
    }

    #[test]
    fn and_or_after_a_complete_comparison() {
        let items = condition("SELECT * FROM users WHERE id = 1 |").unwrap();
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["AND", "OR"]);
    }

    #[rstest]
    #[case("SELECT * FROM users |")]
    #[case("SELECT |")]
    #[case("UPDATE users SET |")]
    fn not_a_condition(#[case] sql: &str) {
        assert!(condition(sql).is_none());
    }
}
