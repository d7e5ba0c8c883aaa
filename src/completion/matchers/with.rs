use super::*;

const DATA_MODIFYING_DOCS: &str = "Modifying the same row twice in a single statement is not \
    supported and only one of the modifications takes place. Avoid WITH sub-statements that \
    could affect rows changed by the main statement or a sibling sub-statement";

/// `WITH name AS ( ... ) statement`: CTE scaffolding at the top level, the
/// nested statement inside each `AS ( )` and the final statement after.
pub(crate) async fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let prev = cb.prev_tokens();
    let typing = cb.curr_token().is_some();

    if prev.len() == 1 && !typing {
        return suggest_snippets([
            Snippet::new("RECURSIVE"),
            Snippet::new("RECURSIVE...").insert(
                "RECURSIVE t(n) AS (\n  VALUES (1)\n  UNION ALL\n  SELECT n + 1\n  FROM t\n  WHERE n < 100\n)\nSELECT sum(n) FROM t;",
            ),
            Snippet::new("cte1").insert("cte1 AS (\n  SELECT 1\n  FROM $1\n)\nSELECT * FROM cte1;"),
        ]);
    }
    if prev.len() == 2 && !typing && prev[1].kind.is_word() && !prev[1].is("recursive") {
        let name = &prev[1].text;
        return suggest_snippets([
            Snippet::new("AS...").insert(format!("AS (\n  SELECT * FROM $1\n)\nSELECT * FROM {name}")),
            Snippet::new("AS ( )").insert("AS (\n  $0\n)"),
        ]);
    }

    if !cb.curr_nesting_id.is_top() {
        let in_cte_body = cb.curr_nesting_id.depth() == 1
            && cb.curr_nesting_func.as_ref().is_some_and(|f| f.text_lc == "as");
        if in_cte_body && cb.prev_tokens_at(&cb.curr_nesting_id).is_empty() {
            return cte_commands();
        }
        if let Some(items) = match_nested_group(ctx, &Command::DML, MatchOptions { exclude_into: true }).await {
            return items;
        }
    }

    let top: Vec<&Token> = prev
        .iter()
        .filter(|t| t.nesting_id.is_top() && !t.kind.is_paren())
        .collect();
    let final_statement = cb
        .tokens
        .iter()
        .skip(1)
        .find(|t| t.nesting_id.is_top() && t.is_any(&["select", "insert", "update", "delete"]));
    if let Some(start) = final_statement.filter(|t| t.end < cb.offset) {
        let end = cb.tokens.last().map_or(start.offset, |t| t.offset);
        return match_nested(ctx, start.offset, end, &Command::DML, MatchOptions::default())
            .await
            .unwrap_or_default();
    }

    if cb.curr_nesting_id.is_top() {
        let ltoken = cb.ltoken();
        if ltoken.is_some_and(|t| t.kind == TokenKind::ParenClose) {
            let mut items = suggest_snippets([Snippet::new(", cte AS ( )").insert(", ${1:cte} AS (\n  $2\n)")]);
            items.extend(suggest_kwds(&["SELECT", "INSERT INTO", "UPDATE", "DELETE FROM"]));
            return suggest_ordered(items);
        }
        if top.last().is_some_and(|t| t.kind == TokenKind::Comma) {
            return suggest_snippets([Snippet::new("cte AS ( )").insert("${1:cte} AS (\n  $2\n)")]);
        }
        if cb.l1token().is_some_and(|t| t.kind == TokenKind::Comma) && !typing {
            return suggest_snippets([Snippet::new("AS ( )").insert("AS (\n  $0\n)")]);
        }
    }
    vec![]
}

fn cte_commands() -> Vec<CompletionItem> {
    suggest_snippets(["SELECT", "INSERT INTO", "UPDATE", "DELETE FROM"].map(|kwd| {
        let snippet = Snippet::new(kwd);
        match kwd {
            "UPDATE" | "DELETE FROM" => snippet.docs(DATA_MODIFYING_DOCS),
            _ => snippet,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    async fn with(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog)).await
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[tokio::test]
    async fn scaffolding() {
        assert!(labels(&with("WITH |").await).contains(&"RECURSIVE"));

        let items = with("WITH recent |").await;
        assert!(items[0].insert_text.ends_with("SELECT * FROM recent"));
    }

    #[tokio::test]
    async fn commands_open_a_cte_body() {
        let items = with("WITH recent AS (|").await;
        assert_eq!(labels(&items), vec!["SELECT", "INSERT INTO", "UPDATE", "DELETE FROM"]);
        assert!(items[2].documentation.is_some());
    }

    #[tokio::test]
    async fn cte_body_is_completed_as_a_statement() {
        let items = with("WITH recent AS (SELECT * FROM |)").await;
        assert!(labels(&items).contains(&"orders"));
    }

    #[tokio::test]
    async fn after_a_cte() {
        let items = with("WITH recent AS (SELECT 1) |").await;
        assert!(labels(&items).contains(&"SELECT"));
        assert!(items.iter().any(|i| i.insert_text.starts_with(", ")));
    }

    #[tokio::test]
    async fn final_statement_sees_the_cte() {
        let items = with("WITH recent AS (SELECT id, total FROM orders) SELECT | FROM recent").await;
        assert!(labels(&items).contains(&"total"));
    }

    #[tokio::test]
    async fn final_statement_can_modify() {
        let items = with("WITH stale AS (SELECT 1) UPDATE users SET |").await;
        assert!(labels(&items).contains(&"email"));
        assert!(!labels(&items).contains(&"total"));
    }
}
