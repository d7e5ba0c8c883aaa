use super::*;
use std::sync::LazyLock;

static DELETE_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("DELETE FROM")
            .expects("table")
            .options([Snippet::new("ONLY").docs("Delete only from the named table, not its descendants")]),
        Kwd::new("USING")
            .expects("table")
            .optional()
            .docs("Other tables whose columns may appear in the WHERE condition"),
        Kwd::new("WHERE").expects("column"),
        Kwd::new("RETURNING")
            .expects("column")
            .optional()
            .docs("Values computed from each deleted row"),
    ]
});

/// `DELETE FROM table [USING ...] [WHERE ...] [RETURNING ...]`
pub(crate) async fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    if let Some(items) = match_nested_group(ctx, &Command::DML, MatchOptions { exclude_into: true }).await {
        return items;
    }
    let resolved = ctx.with_kwds(&DELETE_KWDS, KwdOpts::default());
    if resolved.prev_kwd.is_some_and(|p| p.kwd.is("USING")) && ctx.cb.curr_token().is_none() {
        if ctx.cb.ltoken().is_some_and(|t| t.kind == TokenKind::Comma) {
            return ctx.table_like();
        }
        if ctx.cb.ltoken().is_some_and(|t| t.is_identifier()) {
            let mut items = suggest_kwds(&[","]);
            items.extend(resolved.suggestion(None, &[]));
            return items;
        }
    }
    resolved.suggestion(None, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    async fn delete(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog)).await
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[tokio::test]
    async fn grammar() {
        let items = delete("DELETE FROM |").await;
        assert!(labels(&items).contains(&"ONLY"));
        assert!(labels(&items).contains(&"orders"));

        let items = delete("DELETE FROM orders |").await;
        assert_eq!(labels(&items), vec!["USING", "WHERE", "RETURNING"]);

        let items = delete("DELETE FROM orders WHERE |").await;
        assert!(labels(&items).contains(&"total"));

        let items = delete("DELETE FROM orders WHERE id = 1 |").await;
        assert_eq!(labels(&items), vec!["RETURNING"]);
    }

    #[tokio::test]
    async fn using_list() {
        let items = delete("DELETE FROM orders USING users |").await;
        assert!(labels(&items).contains(&","));
        assert!(labels(&items).contains(&"WHERE"));

        let items = delete("DELETE FROM orders USING users, |").await;
        assert!(labels(&items).contains(&"t1"));
    }

    #[tokio::test]
    async fn returning_star() {
        let items = delete("DELETE FROM orders RETURNING |").await;
        assert!(labels(&items).contains(&"*"));
    }
}
