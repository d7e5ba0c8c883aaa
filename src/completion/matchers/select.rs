use super::*;
use std::sync::LazyLock;

const JOINS: [&str; 5] = ["JOIN", "INNER JOIN", "LEFT JOIN", "RIGHT JOIN", "CROSS JOIN"];
const SUBQUERY_OWNERS: &[&str] = &["in", "from", "join", "lateral", "exists"];
const UNION_DOCS: &str = "Appends the result of the following query. Duplicate rows are \
    removed unless UNION ALL is used";

fn select_kwds(with_into: bool) -> Vec<Kwd> {
    let mut kwds = vec![
        Kwd::new("SELECT").expects("column"),
        Kwd::new("DISTINCT").expects("column").exactly_after(["SELECT"]),
        Kwd::new("WHEN").expects("column").just_after(["CASE"]),
    ];
    if with_into {
        kwds.push(
            Kwd::new("INTO")
                .expects("table")
                .just_after(["SELECT"])
                .depends_on_after("FROM")
                .docs("Creates a table from the result of the select statement"),
        );
    }
    kwds.extend([
        Kwd::new("FROM")
            .expects("table")
            .just_after(["SELECT"])
            .docs("Specifies a table/view or function which returns a table-like result"),
        Kwd::new("JOIN")
            .expects("table")
            .can_repeat()
            .docs("Combine rows from one table with rows from a second table"),
        Kwd::new("JOIN LATERAL")
            .expects("table")
            .can_repeat()
            .docs("Lateral subqueries can reference columns of preceding FROM items"),
        Kwd::new("INNER JOIN")
            .expects("table")
            .depends_on("FROM")
            .can_repeat()
            .docs("Only rows with a match in both tables are returned"),
        Kwd::new("LEFT JOIN")
            .expects("table")
            .depends_on("FROM")
            .can_repeat()
            .docs("All rows of the first table plus the matching rows of the second"),
        Kwd::new("RIGHT JOIN")
            .expects("table")
            .depends_on("FROM")
            .can_repeat()
            .docs("All rows of the second table plus the matching rows of the first"),
        Kwd::new("CROSS JOIN")
            .expects("table")
            .depends_on("FROM")
            .can_repeat()
            .docs("Every combination of rows from both tables"),
        Kwd::new("ON")
            .expects("column")
            .just_after(JOINS)
            .can_repeat()
            .docs("Join condition"),
        Kwd::new("USING").expects("column").just_after(JOINS).docs(
            "Shorthand join condition on columns named the same in both tables: \
             USING (a, b) means ON t1.a = t2.a AND t1.b = t2.b",
        ),
        Kwd::new("WHERE")
            .expects("column")
            .docs("Condition/filter applied to the data"),
        Kwd::new("GROUP BY")
            .expects("column")
            .docs("Used with aggregate functions to split data into groups"),
        Kwd::new("HAVING")
            .expects("column")
            .docs("Allows filtering the aggregated results"),
        Kwd::new("ORDER BY")
            .expects("column")
            .docs("Sorts the returned rows by the given expressions"),
        Kwd::new("LIMIT")
            .expects("number")
            .docs("No more than that many rows will be returned"),
        Kwd::new("OFFSET")
            .expects("number")
            .docs("Skip that many rows before beginning to return rows"),
        Kwd::new("UNION").options(["SELECT"]).docs(UNION_DOCS),
        Kwd::new("UNION ALL").options(["SELECT"]).docs(UNION_DOCS),
    ]);
    kwds
}

static SELECT_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| select_kwds(true));
static SUBQUERY_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| select_kwds(false));

static WINDOW_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    let frame_docs = "The default frame is RANGE UNBOUNDED PRECEDING, which with ORDER BY \
        spans from the partition start to the current row's last peer";
    let offset_docs = "ROWS and GROUPS take a non-negative integer offset. RANGE takes an \
        offset of the ordering column's type, e.g. '1 day' for dates";
    let frame: Vec<Snippet> = vec![
        Snippet::new("BETWEEN").docs("Specifies a frame start and a frame end"),
        Snippet::new("UNBOUNDED PRECEDING").docs("The frame starts with the first row of the partition"),
        Snippet::new("$offset PRECEDING").insert("${1:offset} PRECEDING").docs(offset_docs),
        Snippet::new("CURRENT ROW"),
        Snippet::new("$offset FOLLOWING").insert("${1:offset} FOLLOWING").docs(offset_docs),
        Snippet::new("UNBOUNDED FOLLOWING").docs("The frame ends with the last row of the partition"),
        Snippet::new("EXCLUDE CURRENT ROW").docs("Excludes the current row from the frame"),
        Snippet::new("EXCLUDE GROUP").docs("Excludes the current row and its ordering peers"),
        Snippet::new("EXCLUDE TIES").docs("Excludes the peers of the current row, but not the row itself"),
        Snippet::new("EXCLUDE NO OTHERS").docs("Excludes nothing. This is the default"),
    ];
    vec![
        Kwd::new("PARTITION BY")
            .expects("column")
            .docs("Groups the rows into partitions processed separately by the window function"),
        Kwd::new("ORDER BY")
            .expects("column")
            .docs("Order in which the rows of a partition are processed"),
        Kwd::new(",").expects("column").can_repeat(),
        Kwd::new("ROWS").options(frame.clone()).docs(frame_docs),
        Kwd::new("RANGE").options(frame.clone()).docs(frame_docs),
        Kwd::new("GROUPS").options(frame).docs(frame_docs),
    ]
});

/// Suggestions for a SELECT statement, recursing into subqueries.
pub(crate) async fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let nested_opts = MatchOptions { exclude_into: true };
    if let Some(items) = match_nested_group(ctx, &[Command::With, Command::Select], nested_opts).await {
        return items;
    }

    let func = cb.curr_nesting_func.as_ref().map(|f| f.text_lc.as_str());
    if func == Some("over") {
        return ctx.with_kwds(&WINDOW_KWDS, KwdOpts::default()).suggestion(None, &[]);
    }
    if let Some(items) = suggest_func_args(cb, ctx.catalog) {
        return items;
    }
    if cb.curr_token().is_some_and(|t| t.kind == TokenKind::Str) {
        return vec![];
    }

    let (open, owner) = match cb.curr_token() {
        Some(t) if t.kind == TokenKind::ParenOpen => (Some(t), cb.ltoken()),
        _ => (cb.ltoken(), cb.l1token()),
    };
    if open.is_some_and(|t| t.kind == TokenKind::ParenOpen)
        && owner.is_some_and(|t| t.is_any(SUBQUERY_OWNERS))
    {
        return suggest_kwds(&["SELECT"]);
    }

    let prev_lc = cb.prev_lc();
    let prev_lc = prev_lc.trim_end();
    if ["group by", "order by", "having", "where", "when"]
        .iter()
        .any(|k| prev_lc.ends_with(&format!(" {k}")))
    {
        return ctx.column_like();
    }
    if func.is_some_and(|f| !["lateral", "from"].contains(&f)) {
        return ctx.column_like();
    }

    if let Some(items) = after_function_call(cb, ctx.catalog) {
        return items;
    }

    let kwds: &[Kwd] = if ctx.options.exclude_into { &SUBQUERY_KWDS } else { &SELECT_KWDS };
    let opts = KwdOpts {
        top_reset_kwd: Some("select"),
        ..Default::default()
    };
    let resolved = ctx.with_kwds(kwds, opts);
    let prev_kwd = resolved.prev_kwd.map(|p| p.kwd);
    let prev_is = |k: &str| prev_kwd.is_some_and(|p| p.is(k));
    let ltoken = cb.ltoken();
    let curr_is_dot = cb.curr_token().is_some_and(|t| t.kind == TokenKind::Dot);

    if prev_kwd.is_some_and(|p| p.expects == Some(Expect::Number))
        && ltoken.is_some_and(|t| prev_kwd.is_some_and(|p| p.is(&t.text)))
    {
        return suggest_kwds(&["10", "50", "100"]);
    }
    if ltoken.is_some_and(|t| t.is("using")) {
        return suggest_snippets([Snippet::new("( join_column_list )").insert("( $0 )")]);
    }

    let ltoken_is_name = ltoken.is_some_and(|t| {
        t.is_identifier() || t.is("*") || t.kind == TokenKind::ParenClose
    });
    let this_line = cb.this_line_prev_tokens();
    if prev_is("order by") && ltoken_is_name && !curr_is_dot && !this_line.is_empty() {
        return suggest_kwds(&["ASC", "DESC", ",", "NULLS LAST", "NULLS FIRST"]);
    }

    let select_complete = ltoken.is_some_and(|t| {
        t.kind != TokenKind::Comma
            && (t.is("*") || (t.kind != TokenKind::Operator && t.kind != TokenKind::Dot))
            && !(t.is_any(&["select", "distinct"]) && !this_line.is_empty())
    }) && !curr_is_dot;
    let condition_complete =
        ltoken.is_some_and(|t| t.kind != TokenKind::Operator && !t.is_any(&["where", "having"]));
    let is_number = ltoken.is_some_and(|t| t.kind == TokenKind::Number);
    let clause_complete = cb.text().trim().is_empty()
        || (prev_kwd.is_some_and(|p| p.is("select") || p.is("distinct")) && select_complete)
        || ((prev_is("into") || prev_is("from") || prev_kwd.is_some_and(|p| p.kwd.ends_with("JOIN")))
            && ltoken_is_name)
        || (prev_is("where") && condition_complete)
        || ((prev_is("limit") || prev_is("offset")) && is_number)
        || ((prev_is("group by") || prev_is("order by"))
            && ltoken.is_some_and(|t| t.kind != TokenKind::Comma && !t.is("by"))
            && cb.curr_token().is_none_or(|t| t.len() <= 1))
        || (prev_is("on") && this_line.is_empty());

    if !resolved.remaining.is_empty() && !curr_is_dot && clause_complete {
        let mut items = resolved.suggestion(None, &[]);
        if prev_is("where") {
            items.extend(suggest_kwds(&["AND", "OR"]).into_iter().map(|i| i.sort("z")));
        }
        return items;
    }

    if cb.this_line_lc().trim().is_empty() && prev_is("from") && !ltoken.is_some_and(|t| t.is("from")) {
        let mut items: Vec<CompletionItem> = resolved
            .remaining
            .iter()
            .map(|r| CompletionItem::keyword(r.kwd.kwd.clone()).sort(format!("0{}", r.sort_text)))
            .collect();
        items.extend(ctx.expected("tableOrView"));
        return items;
    }

    if prev_kwd.is_some_and(|p| p.expects.as_ref().is_some_and(|e| e.object_types().contains(&ObjectType::Table))) {
        return ctx.table_like();
    }

    if cb.ftoken().is_some_and(|t| t.is("select")) && cb.next_tokens().first().is_some_and(|t| t.is("select")) {
        return suggest_kwds(&["FROM"]);
    }
    ctx.column_like()
}

/// Follow-ups for the function call closed right before the caret:
/// `WITH ORDINALITY` for set-returning functions, `FILTER` for aggregates and
/// `OVER` for window functions.
fn after_function_call(cb: &CodeBlock, catalog: &Catalog) -> Option<Vec<CompletionItem>> {
    let close = cb.ltoken().filter(|t| t.kind == TokenKind::ParenClose)?;
    if !cb.this_line_lc().trim_end().ends_with(')') {
        return None;
    }
    let prev = cb.prev_tokens();
    let open_idx = prev.iter().position(|t| {
        t.kind == TokenKind::ParenOpen && t.group == close.group && t.nesting_id == close.nesting_id
    })?;
    let name = prev.get(open_idx.checked_sub(1)?).filter(|t| t.kind.is_word())?;
    let function = catalog.functions_named(&unquote_identifier(&name.text).to_lowercase());
    let info = function.first()?.function_info()?;

    let snippet = if info.returns_set {
        Snippet::new("WITH ORDINALITY")
            .insert("WITH ORDINALITY $0")
            .docs("Adds a bigint column numbering the rows of the function result, starting from 1")
    } else {
        match info.kind {
            FunctionKind::Aggregate => Snippet::new("FILTER (WHERE ...)")
                .insert("FILTER ( WHERE $0 )")
                .docs("Only rows for which the filter clause is true are fed to the aggregate"),
            FunctionKind::Window => Snippet::new("OVER ()")
                .insert("OVER ( $0 )")
                .docs("Window functions are evaluated over the partition of the current row"),
            _ => return None,
        }
    };
    Some(suggest_snippets([snippet.kind(ItemKind::Function)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    async fn select(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog)).await
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[tokio::test]
    async fn tables_after_from() {
        let items = select("SELECT * FROM |").await;
        let names = labels(&items);
        assert!(names.contains(&"users"));
        assert!(names.contains(&"active_users"));
        assert!(names.contains(&"order_totals"));
        assert!(!names.contains(&"email"));
    }

    #[tokio::test]
    async fn columns_of_the_from_table() {
        let items = select("SELECT | FROM users").await;
        let names = labels(&items);
        assert!(names.contains(&"email"));
        assert!(names.iter().any(|n| n.starts_with("lower(")));
    }

    #[rstest]
    #[case("SELECT * FROM users |", "WHERE")]
    #[case("SELECT * FROM users |", "LEFT JOIN")]
    #[case("SELECT id |", "FROM")]
    #[case("SELECT id FROM users WHERE id = 1 |", "ORDER BY")]
    #[case("SELECT id FROM users LIMIT 10 |", "OFFSET")]
    #[tokio::test]
    async fn next_clause_keywords(#[case] sql: &str, #[case] expected: &str) {
        let items = select(sql).await;
        assert!(labels(&items).contains(&expected), "{sql}: {:?}", labels(&items));
    }

    #[tokio::test]
    async fn and_or_after_a_complete_where() {
        let items = select("SELECT id FROM users WHERE id = 1 |").await;
        assert!(labels(&items).contains(&"AND"));
    }

    #[tokio::test]
    async fn no_into_once_from_is_written() {
        let items = select("SELECT id | FROM users").await;
        assert!(labels(&items).contains(&"INTO"));
        let items = select("SELECT id |").await;
        assert!(!labels(&items).contains(&"INTO"));
    }

    #[tokio::test]
    async fn limit_values() {
        let items = select("SELECT id FROM users LIMIT |").await;
        assert_eq!(labels(&items), vec!["10", "50", "100"]);
    }

    #[tokio::test]
    async fn order_by_direction() {
        let items = select("SELECT id FROM users ORDER BY id |").await;
        assert_eq!(labels(&items), vec!["ASC", "DESC", ",", "NULLS LAST", "NULLS FIRST"]);
    }

    #[tokio::test]
    async fn subquery_starts_with_select() {
        let items = select("SELECT * FROM users WHERE id IN (|").await;
        assert_eq!(labels(&items), vec!["SELECT"]);
    }

    #[tokio::test]
    async fn subquery_is_completed_on_its_own() {
        let items = select("SELECT * FROM users WHERE id IN (SELECT user_id FROM |)").await;
        assert!(labels(&items).contains(&"orders"));

        let items = select("SELECT * FROM users WHERE id IN (SELECT | FROM orders)").await;
        assert!(labels(&items).contains(&"total"));
    }

    #[tokio::test]
    async fn follow_ups_after_calls() {
        let items = select("SELECT * FROM generate_series(1, 3) |").await;
        assert_eq!(labels(&items), vec!["WITH ORDINALITY"]);

        let items = select("SELECT count(*) |").await;
        assert_eq!(labels(&items), vec!["FILTER (WHERE ...)"]);

        let items = select("SELECT row_number() |").await;
        assert_eq!(items[0].insert_text, "OVER ( $0 )");
    }

    #[tokio::test]
    async fn window_frame_grammar() {
        let items = select("SELECT row_number() OVER (|").await;
        assert!(labels(&items).contains(&"PARTITION BY"));

        let items = select("SELECT row_number() OVER (ORDER BY id ROWS |").await;
        assert!(labels(&items).contains(&"UNBOUNDED PRECEDING"));
    }

    #[tokio::test]
    async fn strings_get_nothing() {
        assert!(select("SELECT 'abc|'").await.is_empty());
    }

    #[tokio::test]
    async fn join_inference_after_join() {
        let items = select("SELECT t1.* FROM t1 JOIN |").await;
        assert!(labels(&items).contains(&"t2 t2 ON t2.t1_id = t1.id"));
    }

    #[tokio::test]
    async fn using_wraps_columns() {
        let items = select("SELECT * FROM t1 JOIN t2 USING |").await;
        assert_eq!(items[0].insert_text, "( $0 )");
    }
}
