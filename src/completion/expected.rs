use crate::*;

/// Catalog suggestions for an expectation such as `tableOrView` or `role`.
///
/// Writing `schema.` right before the caret narrows the result to that
/// schema's objects, inserted unqualified. Items keep their catalog entry in
/// `source`. When a known type yields nothing, a single inert
/// "No ... found" item is returned.
pub fn get_expected(expect: &Expect, cb: &CodeBlock, catalog: &Catalog) -> Vec<CompletionItem> {
    let types = expect.object_types();
    if types.is_empty() {
        return vec![];
    }
    let wrapped = matches!(expect, Expect::Wrapped(_));
    let schema = typed_schema(cb).filter(|s| catalog.has_schema(s));
    let tables_in_scope = cb.table_identifiers();

    let mut items: Vec<CompletionItem> = catalog
        .of_types(types)
        .filter(|e| schema.is_none() || e.schema == schema)
        .map(|entry| {
            let mut item = CompletionItem::from_entry(entry);
            if schema.is_some() {
                item.label = entry.escaped_name.clone();
                if entry.insert_text.is_none() && entry.function_info().is_none() {
                    item.insert_text = entry.escaped_name.clone();
                }
            }
            let scope_rank = match &entry.parent {
                Some(parent) if !tables_in_scope.is_empty() => {
                    let in_scope = tables_in_scope
                        .iter()
                        .any(|t| split_qualified(t).last().is_some_and(|n| n == parent));
                    if in_scope { "a" } else { "b" }
                }
                _ => "",
            };
            item.sort_text = match entry.priority {
                Some(p) => format!("{scope_rank}{p:04}"),
                None if entry.is_public() => format!("{scope_rank}a"),
                None => format!("{scope_rank}b"),
            };
            if wrapped {
                item.insert_text = format!("({})", item.insert_text);
            }
            item
        })
        .collect();

    if types.contains(&ObjectType::Column) && after_returning(cb) {
        items.push(CompletionItem::keyword("*").docs("All columns").sort("!"));
    }
    if types.contains(&ObjectType::Role) {
        items.extend(
            ["CURRENT_USER", "SESSION_USER", "CURRENT_ROLE"]
                .into_iter()
                .map(|r| CompletionItem::keyword(r).sort("c")),
        );
    }

    if items.is_empty() {
        let label = format!("No {} found", types[0].plural());
        return vec![CompletionItem::placeholder(label)];
    }
    items
}

/// Schema name written right before the caret as `schema.` or `schema.partial`.
pub fn typed_schema(cb: &CodeBlock) -> Option<String> {
    let is_dot = |t: Option<&Token>| t.is_some_and(|t| t.kind == TokenKind::Dot);
    let word = |t: Option<&Token>| t.filter(|t| t.kind.is_word()).map(|t| unquote_identifier(&t.text));
    match cb.curr_token() {
        Some(t) if t.kind == TokenKind::Dot => word(cb.ltoken()),
        Some(t) if t.kind.is_word() && is_dot(cb.ltoken()) => word(cb.l1token()),
        None if is_dot(cb.ltoken()) => word(cb.l1token()),
        _ => None,
    }
}

fn after_returning(cb: &CodeBlock) -> bool {
    cb.prev_tokens_at(&cb.curr_nesting_id)
        .iter()
        .any(|t| t.is("returning"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use std::sync::Arc;

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn table_or_view_covers_all_tabular_types() {
        let catalog = fixture_catalog();
        let items = get_expected(&"tableOrView".into(), &at_caret("DROP VIEW |"), &catalog);
        let types: std::collections::HashSet<_> = items.iter().map(|i| i.object_type).collect();
        assert!(types.contains(&ObjectType::Table));
        assert!(types.contains(&ObjectType::View));
        assert!(types.contains(&ObjectType::MView));
    }

    #[test]
    fn items_carry_their_catalog_entries() {
        let catalog = fixture_catalog();
        let items = get_expected(&"table".into(), &at_caret("TRUNCATE |"), &catalog);
        for item in &items {
            let source = item.source.as_ref().expect("catalog item");
            assert!(catalog.entries().iter().any(|e| Arc::ptr_eq(e, source)));
        }
    }

    #[test]
    fn public_before_other_schemas() {
        let catalog = fixture_catalog();
        let items = get_expected(&"table".into(), &at_caret("TRUNCATE |"), &catalog);
        let users = items.iter().find(|i| i.label == "users").unwrap();
        let archived = items.iter().find(|i| i.label == "archive.old_orders").unwrap();
        assert!(users.sort_text < archived.sort_text);
    }

    #[rstest]
    #[case("TRUNCATE archive.|")]
    #[case("TRUNCATE archive.ol|")]
    fn schema_prefix_narrows(#[case] sql: &str) {
        let catalog = fixture_catalog();
        let items = get_expected(&"table".into(), &at_caret(sql), &catalog);
        assert_eq!(labels(&items), vec!["old_orders"]);
        assert_eq!(items[0].insert_text, "old_orders");
    }

    #[test]
    fn roles_get_session_keywords() {
        let catalog = fixture_catalog();
        let items = get_expected(&"owner".into(), &at_caret("ALTER TABLE t OWNER TO |"), &catalog);
        let names = labels(&items);
        assert!(names.contains(&"postgres"));
        assert!(names.contains(&"CURRENT_USER"));
        assert!(names.contains(&"SESSION_USER"));
    }

    #[test]
    fn wrapped_expectations_insert_parentheses() {
        let catalog = fixture_catalog();
        let items = get_expected(&"(column)".into(), &at_caret("CREATE INDEX ON users |"), &catalog);
        let id = items.iter().find(|i| i.label == "id").unwrap();
        assert_eq!(id.insert_text, "(id)");
    }

    #[test]
    fn empty_result_becomes_placeholder() {
        let items = get_expected(&"policy".into(), &at_caret("DROP POLICY |"), &Catalog::default());
        assert_eq!(items.len(), 1);
        assert!(items[0].is_placeholder());
        assert_eq!(items[0].label, "No policies found");
    }

    #[test]
    fn returning_offers_star() {
        let catalog = fixture_catalog();
        let items = get_expected(
            &"column".into(),
            &at_caret("DELETE FROM users RETURNING |"),
            &catalog,
        );
        assert!(labels(&items).contains(&"*"));
    }

    #[test]
    fn columns_of_referenced_tables_first() {
        let catalog = fixture_catalog();
        let items = get_expected(&"column".into(), &at_caret("UPDATE orders SET |"), &catalog);
        let total = items.iter().find(|i| i.label == "total").unwrap();
        let email = items.iter().find(|i| i.label == "email").unwrap();
        assert!(total.sort_text < email.sort_text);
    }
}
