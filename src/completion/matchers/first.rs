//! Shapes recognized before any statement matcher runs.
use super::*;
use std::sync::LazyLock;

/// Suggestions for shapes that do not depend on the statement, or `None` to
/// continue with the statement matchers.
pub(crate) async fn result(ctx: MatchContext<'_>) -> Option<Vec<CompletionItem>> {
    let cb = ctx.cb;
    let (ltoken, l1token, curr) = (cb.ltoken(), cb.l1token(), cb.curr_token());
    let ftoken = cb.ftoken();

    if curr.is_some_and(|t| t.kind == TokenKind::Str)
        && cb.curr_nesting_func.as_ref().is_some_and(|f| f.text_lc == "format")
    {
        return Some(format_placeholders());
    }

    if [l1token, ltoken, curr].iter().any(|t| t.is_some_and(|t| t.is("?"))) {
        return Some(wildcard(cb, ctx.catalog));
    }

    if ltoken.is_some_and(|t| t.is("case")) {
        return Some(suggest_kwds(&["WHEN"]));
    }

    if [ltoken, curr].iter().any(|t| t.is_some_and(|t| t.is("::"))) {
        return Some(
            ctx.catalog
                .of_type(ObjectType::DataType)
                .map(|t| {
                    let sort = t.priority.map_or_else(|| "z".to_string(), |p| format!("{p:04}"));
                    CompletionItem::from_entry(t).sort(sort)
                })
                .collect(),
        );
    }

    if let Some(items) = condition::suggest_condition(&ctx) {
        return Some(items);
    }

    let ftoken_is = |kwd: &str| ftoken.is_some_and(|t| t.is(kwd));
    if ftoken_is("table") {
        return Some(ctx.table_like());
    }
    if ftoken_is("explain") {
        return Some(explain(ctx).await);
    }
    if ftoken_is("truncate") {
        return Some(ctx.with_kwds(&TRUNCATE_KWDS, KwdOpts::default()).suggestion(None, &[]));
    }
    if ftoken_is("call") {
        if cb.prev_tokens().len() == 1 {
            return Some(
                ctx.catalog
                    .of_type(ObjectType::Function)
                    .filter(|f| f.function_info().is_some_and(|i| i.kind == FunctionKind::Procedure))
                    .map(|f| CompletionItem::from_entry(f).sort(if f.is_public() { "a" } else { "b" }))
                    .collect(),
            );
        }
        if !cb.curr_nesting_id.is_top() {
            return Some(ctx.column_like());
        }
    }
    if ftoken_is("refresh") {
        if cb.prev_tokens().iter().any(|t| t.is("view")) {
            return Some(ctx.expected(ObjectType::MView));
        }
        return Some(suggest_snippets([
            Snippet::new("MATERIALIZED VIEW").docs("Replace the contents of a materialized view"),
            Snippet::new("MATERIALIZED VIEW CONCURRENTLY")
                .docs("Refresh without locking out concurrent selects on the materialized view"),
        ]));
    }

    if ltoken.is_some_and(|t| t.is_any(&["inner", "left", "right", "full"])) && curr.is_none() {
        return Some(suggest_kwds(&["JOIN", "OUTER JOIN"]));
    }
    None
}

fn format_placeholders() -> Vec<CompletionItem> {
    suggest_snippets([
        Snippet::new("%s").docs("Value formatted as a simple string"),
        Snippet::new("%I").docs("Value treated as an SQL identifier, double-quoted if necessary"),
        Snippet::new("%L").docs("Value quoted as an SQL literal"),
        Snippet::new("%1$s").docs("Positional argument, here the first one"),
    ])
    .into_iter()
    .map(|i| i.kind(ItemKind::Text))
    .collect()
}

/// `?type` searches the catalog by object type; a lone `?` lists the types.
fn wildcard(cb: &CodeBlock, catalog: &Catalog) -> Vec<CompletionItem> {
    let typed = cb
        .ltoken()
        .filter(|t| t.kind.is_word())
        .filter(|_| cb.l1token().is_some_and(|t| t.is("?")));
    let Some(typed) = typed else {
        return suggest_ordered(
            WILDCARD_TYPES
                .iter()
                .map(|t| CompletionItem::new(t.to_string(), ObjectType::Snippet).kind(ItemKind::for_type(*t)))
                .collect(),
        );
    };
    if typed.is("setting") {
        return setting_items(catalog);
    }
    get_expected(&Expect::parse(&typed.text), cb, catalog)
}

const WILDCARD_TYPES: &[ObjectType] = &[
    ObjectType::Table,
    ObjectType::View,
    ObjectType::MView,
    ObjectType::Column,
    ObjectType::Function,
    ObjectType::DataType,
    ObjectType::Schema,
    ObjectType::Role,
    ObjectType::Policy,
    ObjectType::Trigger,
    ObjectType::Index,
    ObjectType::Extension,
    ObjectType::Database,
    ObjectType::Setting,
    ObjectType::Operator,
];

/// `EXPLAIN [(options)] statement`: options inside the parentheses, then
/// whatever the explained statement needs.
async fn explain(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if cb.curr_nesting_func.as_ref().is_some_and(|f| f.text_lc == "explain") {
        let opts = KwdOpts {
            not_ordered: true,
            ..Default::default()
        };
        return ctx.with_kwds(&EXPLAIN_OPTIONS, opts).suggestion(Some(","), &["(", ")"]);
    }

    let statement = cb.tokens.iter().skip(1).find(|t| {
        t.nesting_id.is_top() && !t.kind.is_paren() && !t.is_any(&["analyze", "verbose"])
    });
    if let Some(start) = statement.filter(|t| t.end < cb.offset) {
        let end = cb.tokens.last().map_or(start.offset, |t| t.offset);
        if let Some(items) = match_nested(ctx, start.offset, end, &Command::ALL, MatchOptions::default()).await {
            return items;
        }
    }
    let mut items = suggest_snippets([Snippet::new("( ...options )").insert("( $0 )").docs("Explain options")]);
    items.extend(suggest_kwds(&["ANALYZE", "SELECT", "INSERT INTO", "UPDATE", "DELETE FROM", "WITH"]));
    suggest_ordered(items)
}

static TRUNCATE_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("TRUNCATE").expects("table").options([Snippet::new("ONLY")
            .docs("Truncate only the named table, not its descendants")]),
        Kwd::new("RESTART IDENTITY")
            .depends_on("TRUNCATE")
            .docs("Restart sequences owned by columns of the truncated tables"),
        Kwd::new("CONTINUE IDENTITY")
            .depends_on("TRUNCATE")
            .exclude_if(["RESTART"])
            .docs("Do not change the values of sequences. This is the default"),
        Kwd::new("CASCADE")
            .depends_on("TRUNCATE")
            .docs("Also truncate tables with foreign keys to the named tables"),
        Kwd::new("RESTRICT")
            .depends_on("TRUNCATE")
            .exclude_if(["CASCADE"])
            .docs("Refuse to truncate if other tables reference the named ones. This is the default"),
    ]
});

static EXPLAIN_OPTIONS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    [
        ("ANALYZE", "Carry out the command and show actual run times and other statistics"),
        ("VERBOSE", "Display additional information regarding the plan"),
        ("COSTS", "Include estimated startup and total cost of each plan node"),
        ("SETTINGS", "Include configuration parameters that affect planning"),
        ("GENERIC_PLAN", "Allow parameter placeholders like $1 and plan generically"),
        ("BUFFERS", "Include information on buffer usage"),
        ("WAL", "Include information on WAL record generation. Requires ANALYZE"),
        ("TIMING", "Include actual startup time and time spent in each node. Requires ANALYZE"),
        ("SUMMARY", "Include summary information after the query plan"),
        ("FORMAT", "Output format: TEXT, XML, JSON or YAML"),
    ]
    .into_iter()
    .map(|(kwd, docs)| {
        let kwd = Kwd::new(kwd).docs(docs);
        match kwd.kwd.as_str() {
            "FORMAT" => kwd.options(["TEXT", "JSON", "YAML", "XML"]),
            _ => kwd,
        }
    })
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    async fn first(sql: &str) -> Option<Vec<CompletionItem>> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog)).await
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[tokio::test]
    async fn cast_offers_types_by_priority() {
        let items = first("SELECT id::|").await.unwrap();
        let integer = items.iter().find(|i| i.label == "integer").unwrap();
        let numeric = items.iter().find(|i| i.label == "numeric").unwrap();
        assert!(integer.sort_text < numeric.sort_text);
        assert!(items.iter().all(|i| i.object_type == ObjectType::DataType));
    }

    #[tokio::test]
    async fn case_is_followed_by_when() {
        assert_eq!(labels(&first("SELECT CASE |").await.unwrap()), vec!["WHEN"]);
    }

    #[tokio::test]
    async fn wildcard_search() {
        let types = first("?|").await.unwrap();
        assert!(labels(&types).contains(&"table"));

        let roles = first("? role |").await.unwrap();
        assert!(labels(&roles).contains(&"app_user"));

        let settings = first("? setting |").await.unwrap();
        assert!(labels(&settings).contains(&"work_mem"));
    }

    #[tokio::test]
    async fn format_string_placeholders() {
        let items = first("SELECT format('hello |')").await;
        assert!(items.is_some_and(|items| labels(&items).contains(&"%I")));
    }

    #[tokio::test]
    async fn truncate_grammar() {
        let items = first("TRUNCATE |").await.unwrap();
        assert!(labels(&items).contains(&"ONLY"));
        assert!(labels(&items).contains(&"users"));

        let items = first("TRUNCATE users |").await.unwrap();
        assert_eq!(
            labels(&items),
            vec!["RESTART IDENTITY", "CONTINUE IDENTITY", "CASCADE", "RESTRICT"]
        );
    }

    #[tokio::test]
    async fn explain_options_then_statement() {
        let items = first("EXPLAIN (|").await.unwrap();
        assert!(labels(&items).contains(&"ANALYZE"));
        assert!(items.iter().all(|i| !i.insert_text.starts_with(',')));

        let items = first("EXPLAIN (ANALYZE |").await.unwrap();
        assert!(items.iter().any(|i| i.insert_text == ", VERBOSE"));

        let items = first("EXPLAIN SELECT * FROM |").await.unwrap();
        assert!(labels(&items).contains(&"users"));
    }

    #[tokio::test]
    async fn call_lists_procedures() {
        let items = first("CALL |").await.unwrap();
        assert_eq!(labels(&items), vec!["refresh_totals(days integer)"]);
    }

    #[tokio::test]
    async fn refresh_materialized_views() {
        let items = first("REFRESH MATERIALIZED VIEW |").await.unwrap();
        assert_eq!(labels(&items), vec!["order_totals"]);
    }

    #[tokio::test]
    async fn join_after_side() {
        let items = first("SELECT * FROM users LEFT |").await.unwrap();
        assert_eq!(labels(&items), vec!["JOIN", "OUTER JOIN"]);
    }

    #[tokio::test]
    async fn statements_fall_through() {
        assert!(first("SELECT * FROM |").await.is_none());
    }
}
