use crate::*;

/// Name written right before the caret as `name.` or `name.partial`.
pub fn qualifier(cb: &CodeBlock) -> Option<String> {
    let is_dot = |t: Option<&Token>| t.is_some_and(|t| t.kind == TokenKind::Dot);
    let word = |t: Option<&Token>| t.filter(|t| t.kind.is_word()).map(|t| t.text.clone());
    match cb.curr_token() {
        Some(t) if t.kind == TokenKind::Dot => word(cb.ltoken()),
        Some(t) if t.kind.is_word() && is_dot(cb.ltoken()) => word(cb.l1token()),
        None if is_dot(cb.ltoken()) => word(cb.l1token()),
        _ => None,
    }
}

/// Columns of the relations visible from the caret.
///
/// After `alias.` only that relation's columns are returned. Without a
/// qualifier, ambiguous column names are inserted qualified.
pub fn columns_in_scope(cb: &CodeBlock, catalog: &Catalog) -> Vec<CompletionItem> {
    columns_from(&get_tabular_expressions(cb, catalog), cb, catalog)
}

/// Columns plus functions, for expression positions.
pub fn suggest_column_like(cb: &CodeBlock, catalog: &Catalog) -> Vec<CompletionItem> {
    column_like_from(&get_tabular_expressions(cb, catalog), cb, catalog)
}

pub(crate) fn column_like_from(
    exprs: &[TabularExpr],
    cb: &CodeBlock,
    catalog: &Catalog,
) -> Vec<CompletionItem> {
    let mut items = columns_from(exprs, cb, catalog);
    if qualifier(cb).is_none() {
        items.extend(
            catalog
                .of_type(ObjectType::Function)
                .filter(|f| f.function_info().is_none_or(|i| i.kind != FunctionKind::Procedure))
                .map(|f| CompletionItem::from_entry(f).sort(if f.is_public() { "c" } else { "d" })),
        );
    }
    items
}

pub(crate) fn columns_from(exprs: &[TabularExpr], cb: &CodeBlock, catalog: &Catalog) -> Vec<CompletionItem> {
    if let Some(q) = qualifier(cb) {
        if let Some(expr) = exprs.iter().rev().find(|e| e.is_named(&q)) {
            return expr
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| column_item(c, &expr.alias).sort(format!("a{i:03}")))
                .collect();
        }
        if catalog.has_schema(&unquote_identifier(&q)) {
            let types = [ObjectType::Table, ObjectType::View, ObjectType::MView, ObjectType::Function];
            return get_expected(&Expect::Objects(types.to_vec()), cb, catalog);
        }
        if let Some(table) = catalog.find_table(&q) {
            return catalog
                .columns_of(table)
                .into_iter()
                .map(|c| CompletionItem::from_entry(c).sort("a"))
                .collect();
        }
        return vec![];
    }

    if exprs.is_empty() {
        return catalog
            .of_type(ObjectType::Column)
            .map(|c| CompletionItem::from_entry(c).sort("e"))
            .collect();
    }

    let mut items = Vec::new();
    for (n, expr) in exprs.iter().enumerate() {
        for (i, column) in expr.columns.iter().enumerate() {
            let ambiguous = exprs
                .iter()
                .filter(|e| e.columns.iter().any(|c| c.name == column.name))
                .count()
                > 1;
            let mut item = column_item(column, &expr.alias).sort(format!("a{n:02}{i:03}"));
            if ambiguous {
                item.insert_text = format!(
                    "{}.{}",
                    escape_identifier(&expr.alias),
                    escape_identifier(&column.name)
                );
                item.label = item.insert_text.clone();
            }
            items.push(item);
        }
    }
    items
}

fn column_item(column: &TabularColumn, relation: &str) -> CompletionItem {
    let mut item = match &column.source {
        Some(entry) => CompletionItem::from_entry(entry),
        None => CompletionItem::new(escape_identifier(&column.name), ObjectType::Column),
    };
    item.detail = Some(match &column.data_type {
        Some(ty) => format!("{relation}: {ty}"),
        None => relation.to_string(),
    });
    item
}

/// Table-like relations for a FROM or JOIN position, with join inference
/// after `JOIN` and set-returning functions ranked last.
pub fn suggest_table_like(cb: &CodeBlock, catalog: &Catalog) -> Vec<CompletionItem> {
    let mut items = get_join_suggestions(cb, catalog);
    items.extend(get_expected(&"tableOrView".into(), cb, catalog));
    if typed_schema(cb).is_none() {
        items.extend(
            catalog
                .of_type(ObjectType::Function)
                .filter(|f| f.function_info().is_some_and(|i| i.returns_set))
                .map(|f| CompletionItem::from_entry(f).sort("c")),
        );
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn alias_qualifier_limits_to_relation() {
        let catalog = fixture_catalog();
        let items = columns_in_scope(&at_caret("SELECT o.| FROM orders o JOIN users u ON true"), &catalog);
        assert_eq!(labels(&items), vec!["id", "user_id", "total"]);
        assert!(items.iter().all(|i| i.source.is_some()));
    }

    #[test]
    fn ambiguous_columns_are_qualified() {
        let catalog = fixture_catalog();
        let items = columns_in_scope(&at_caret("SELECT | FROM orders o JOIN users u ON true"), &catalog);
        let names = labels(&items);
        assert!(names.contains(&"o.id"));
        assert!(names.contains(&"u.id"));
        assert!(names.contains(&"total"));
        assert!(names.contains(&"email"));
    }

    #[test]
    fn schema_qualifier_lists_schema_objects() {
        let catalog = fixture_catalog();
        let items = suggest_column_like(&at_caret("SELECT archive.| "), &catalog);
        assert_eq!(labels(&items), vec!["old_orders"]);
    }

    #[test]
    fn column_like_adds_functions() {
        let catalog = fixture_catalog();
        let items = suggest_column_like(&at_caret("SELECT * FROM users WHERE |"), &catalog);
        let names = labels(&items);
        assert!(names.contains(&"email"));
        assert!(names.contains(&"lower(text)"));
        assert!(!names.iter().any(|n| n.starts_with("refresh_totals")));
        let email = items.iter().find(|i| i.label == "email").unwrap();
        let lower = items.iter().find(|i| i.label == "lower(text)").unwrap();
        assert!(email.sort_text < lower.sort_text);
    }

    #[test]
    fn table_like_includes_set_returning_functions() {
        let catalog = fixture_catalog();
        let items = suggest_table_like(&at_caret("SELECT * FROM |"), &catalog);
        let names = labels(&items);
        assert!(names.contains(&"users"));
        assert!(names.contains(&"active_users"));
        assert!(names.iter().any(|n| n.starts_with("generate_series")));
        assert!(!names.iter().any(|n| n.starts_with("lower")));
    }
}
