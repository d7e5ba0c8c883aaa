use super::*;
use std::sync::LazyLock;

static INSERT_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("INSERT INTO").expects("table"),
        Kwd::new("OVERRIDING")
            .options(["SYSTEM VALUE", "USER VALUE"])
            .optional()
            .docs("Controls whether values supplied for identity columns are used"),
        Kwd::new("DEFAULT VALUES").docs("All columns will be filled with their default values"),
        Kwd::new("VALUES")
            .exclude_if(["SELECT", "DEFAULT"])
            .docs("Row values to insert, one parenthesized list per row"),
        Kwd::new("SELECT")
            .expects("column")
            .exclude_if(["VALUES"])
            .docs("Inserts the rows returned by the query"),
        Kwd::new("ON CONFLICT")
            .optional()
            .docs("Alternative action when a row violates a unique or exclusion constraint"),
        Kwd::new("DO NOTHING").depends_on("ON CONFLICT"),
        Kwd::new("DO UPDATE SET")
            .expects("column")
            .depends_on("ON CONFLICT")
            .exclude_if(["NOTHING"]),
        Kwd::new("RETURNING")
            .expects("column")
            .optional()
            .docs("Values computed from each inserted row"),
    ]
});

/// `INSERT INTO table [(columns)] {VALUES | SELECT | DEFAULT VALUES} ...`
pub(crate) async fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let target = table_after(cb, ctx.catalog, "into");

    let query = cb
        .tokens
        .iter()
        .skip(1)
        .find(|t| t.nesting_id.is_top() && t.is_any(&["select", "with"]));
    if let Some(start) = query.filter(|t| t.end < cb.offset) {
        let end = cb.tokens.last().map_or(start.offset, |t| t.offset);
        let opts = MatchOptions { exclude_into: true };
        if let Some(items) = match_nested(ctx, start.offset, end, &[Command::With, Command::Select], opts).await {
            return items;
        }
    }

    if !cb.curr_nesting_id.is_top() {
        let func = cb.curr_nesting_func.as_ref().map(|f| f.text_lc.clone()).unwrap_or_default();
        let written = cb.prev_tokens_at(&cb.curr_nesting_id);
        let in_column_list = cb.curr_nesting_id.depth() == 1
            && target.is_some_and(|t| unquote_identifier(&func).eq_ignore_ascii_case(&t.name));
        if in_column_list || func == "conflict" {
            return match target {
                Some(table) => {
                    let written: Vec<&Token> = written.into_iter().filter(|t| t.is_identifier()).collect();
                    table_columns(ctx.catalog, table, &written)
                }
                None => ctx.columns(),
            };
        }
        if func == "values" {
            let mut items = ctx.column_like();
            items.push(CompletionItem::keyword("DEFAULT").sort("!"));
            return items;
        }
    }

    let typing = cb.curr_token().is_some();
    let ltoken = cb.ltoken();
    if ltoken.is_some_and(|t| t.is("values")) && !typing {
        return suggest_snippets([Snippet::new("( ... )").insert("( $0 )")]);
    }

    let resolved = ctx.with_kwds(&INSERT_KWDS, KwdOpts::default());
    let mut items = resolved.suggestion(None, &[]);
    if ltoken.is_some_and(|t| t.is("conflict")) && !typing {
        items.extend(suggest_snippets([
            Snippet::new("( column )").insert("( $0 )").sort("!0"),
            Snippet::new("ON CONSTRAINT").sort("!1"),
        ]));
    }
    let after_target = resolved.prev_kwd.is_some_and(|p| p.kwd.is("INSERT INTO"))
        && !typing
        && ltoken.is_some_and(|t| t.kind.is_word());
    if let Some(table) = target.filter(|_| after_target) {
        let names: Vec<String> = ctx
            .catalog
            .columns_of(table)
            .iter()
            .map(|c| c.escaped_name.clone())
            .collect();
        if !names.is_empty() {
            let list = format!("({})", names.join(", "));
            items.push(CompletionItem::keyword(list).docs("All columns").sort("!"));
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    async fn insert(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog)).await
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[tokio::test]
    async fn tables_after_into() {
        let items = insert("INSERT INTO |").await;
        assert!(labels(&items).contains(&"orders"));
    }

    #[tokio::test]
    async fn column_list_of_the_target_only() {
        let items = insert("INSERT INTO orders (|").await;
        assert_eq!(labels(&items), vec!["id", "user_id", "total"]);

        let items = insert("INSERT INTO orders (id, |").await;
        assert_eq!(labels(&items), vec!["user_id", "total"]);
    }

    #[tokio::test]
    async fn source_keywords_after_the_target() {
        let items = insert("INSERT INTO orders |").await;
        let names = labels(&items);
        assert!(names.contains(&"VALUES"));
        assert!(names.contains(&"DEFAULT VALUES"));
        assert!(names.contains(&"SELECT"));
        assert!(names.contains(&"(id, user_id, total)"));
    }

    #[tokio::test]
    async fn values_open_a_row() {
        let items = insert("INSERT INTO orders (id) VALUES |").await;
        assert_eq!(items[0].insert_text, "( $0 )");
    }

    #[tokio::test]
    async fn after_values() {
        let items = insert("INSERT INTO orders (id) VALUES (1) |").await;
        let names = labels(&items);
        assert!(names.contains(&"ON CONFLICT"));
        assert!(names.contains(&"RETURNING"));
        assert!(!names.contains(&"SELECT"));
    }

    #[tokio::test]
    async fn conflict_target_columns() {
        let items = insert("INSERT INTO orders (id) VALUES (1) ON CONFLICT (|").await;
        assert_eq!(labels(&items), vec!["id", "user_id", "total"]);

        let items = insert("INSERT INTO orders (id) VALUES (1) ON CONFLICT |").await;
        let names = labels(&items);
        assert!(names.contains(&"( column )"));
        assert!(names.contains(&"DO NOTHING"));
    }

    #[tokio::test]
    async fn insert_from_a_query() {
        let items = insert("INSERT INTO orders (id) SELECT id FROM |").await;
        assert!(labels(&items).contains(&"users"));
    }
}
