use super::*;
use std::sync::LazyLock;

static UPDATE_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("UPDATE")
            .expects("table")
            .options([Snippet::new("ONLY").docs("Update only the named table, not its descendants")]),
        Kwd::new("SET").expects("column"),
        Kwd::new("FROM")
            .expects("table")
            .depends_on("SET")
            .optional()
            .docs("Other tables whose columns may appear in the WHERE condition and the new values"),
        Kwd::new("WHERE").expects("column").depends_on("SET").optional(),
        Kwd::new("RETURNING")
            .expects("column")
            .depends_on("SET")
            .optional()
            .docs("Values computed from each updated row"),
    ]
});

/// `UPDATE table SET col = value, ... [FROM ...] [WHERE ...] [RETURNING ...]`
pub(crate) async fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if let Some(items) = match_nested_group(ctx, &Command::DML, MatchOptions { exclude_into: true }).await {
        return items;
    }
    if let Some(items) = suggest_func_args(cb, ctx.catalog) {
        return items;
    }

    let resolved = ctx.with_kwds(&UPDATE_KWDS, KwdOpts::default());
    if resolved.prev_kwd.is_some_and(|p| p.kwd.is("SET")) {
        if let Some(items) = assignments(&ctx, &resolved) {
            return items;
        }
    }
    resolved.suggestion(None, &[])
}

/// Inside the SET list: target columns, `=`, values, then the next clause.
fn assignments(ctx: &MatchContext<'_>, resolved: &WithKwds<'_>) -> Option<Vec<CompletionItem>> {
    let cb = ctx.cb;
    let input = resolved.prev_kwd_input();
    let typing = cb.curr_token().is_some();
    let ltoken = cb.ltoken()?;
    let target = table_after(cb, ctx.catalog, "update");

    let column_position = ltoken.is("set") || ltoken.kind == TokenKind::Comma;
    if column_position || (typing && input.len() <= 1) {
        let assigned: Vec<&Token> = input
            .windows(2)
            .filter(|w| w[1].is("="))
            .map(|w| w[0])
            .collect();
        return Some(match target {
            Some(table) => table_columns(ctx.catalog, table, &assigned),
            None => ctx.columns(),
        });
    }
    if ltoken.is("=") {
        let mut items = ctx.column_like();
        items.push(CompletionItem::keyword("DEFAULT").sort("!"));
        return Some(items);
    }
    if typing {
        return None;
    }
    let assigned_column = input
        .last()
        .is_some_and(|t| t.is_identifier() && input.len() >= 2 && input[input.len() - 2].kind == TokenKind::Comma)
        || input.len() == 1;
    if assigned_column {
        return Some(suggest_kwds(&["="]));
    }
    let mut items = suggest_kwds(&[","]);
    items.extend(resolved.suggestion(None, &[]));
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    async fn update(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog)).await
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[tokio::test]
    async fn tables_then_set() {
        let items = update("UPDATE |").await;
        assert!(labels(&items).contains(&"ONLY"));
        assert!(labels(&items).contains(&"users"));

        let items = update("UPDATE users |").await;
        assert_eq!(labels(&items), vec!["SET"]);
    }

    #[tokio::test]
    async fn assignment_flow() {
        let items = update("UPDATE orders SET |").await;
        assert_eq!(labels(&items), vec!["id", "user_id", "total"]);

        assert_eq!(labels(&update("UPDATE orders SET total |").await), vec!["="]);

        let items = update("UPDATE orders SET total = |").await;
        assert!(labels(&items).contains(&"DEFAULT"));

        let items = update("UPDATE orders SET total = 0 |").await;
        let names = labels(&items);
        assert!(names.contains(&","));
        assert!(names.contains(&"WHERE"));
        assert!(names.contains(&"RETURNING"));

        let items = update("UPDATE orders SET total = 0, |").await;
        assert_eq!(labels(&items), vec!["id", "user_id"]);
    }

    #[tokio::test]
    async fn where_columns() {
        let items = update("UPDATE orders SET total = 0 WHERE |").await;
        assert!(labels(&items).contains(&"user_id"));
    }
}
