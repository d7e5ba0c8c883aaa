//! `CREATE [UNIQUE] INDEX [CONCURRENTLY] [[IF NOT EXISTS] name] ON table ...`
use super::*;

const METHODS: &[(&str, &str)] = &[
    ("btree", "Default method. Equality and range queries on sortable data."),
    ("hash", "Equality comparisons only"),
    ("gist", "Geometric data, ranges and full text search"),
    ("spgist", "Non-balanced structures such as quad-trees and radix trees"),
    ("gin", "Values containing several elements: arrays, jsonb and tsvector"),
    ("brin", "Block ranges of very large, naturally ordered tables"),
];

fn has_column_list(cb: &CodeBlock) -> bool {
    cb.prev_tokens()
        .iter()
        .any(|t| t.nesting_id.is_top() && t.kind == TokenKind::ParenClose)
}

static INDEX_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("ON").expects("table"),
        Kwd::new("USING")
            .options(METHODS.iter().map(|(m, docs)| Snippet::new(*m).docs(*docs)))
            .exclude_when(has_column_list)
            .optional(),
        Kwd::new("INCLUDE")
            .options([Snippet::new("( column )").insert("( $0 )")])
            .include_when(has_column_list)
            .optional()
            .docs("Non-key columns stored in the index for index-only scans"),
        Kwd::new("NULLS NOT DISTINCT")
            .include_when(has_column_list)
            .optional()
            .docs("Treat NULL values as equal in a unique index"),
        Kwd::new("WITH")
            .options([Snippet::new("( storage_parameter = value )").insert("( ${1:fillfactor} = ${2:90} )")])
            .include_when(has_column_list)
            .optional(),
        Kwd::new("TABLESPACE")
            .expects("tablespace")
            .include_when(has_column_list)
            .optional(),
        Kwd::new("WHERE")
            .include_when(has_column_list)
            .docs("Builds a partial index over the rows matching the predicate"),
    ]
});

static INDEX_PARAMS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("fillfactor")
            .expects("=option")
            .options(["70", "90", "100"])
            .docs("How full the index method packs index pages"),
        Kwd::new("deduplicate_items")
            .expects("=option")
            .options(["on", "off"])
            .docs("B-tree deduplication of equal keys"),
        Kwd::new("fastupdate")
            .expects("=option")
            .options(["on", "off"])
            .docs("GIN pending list for faster inserts"),
        Kwd::new("buffering")
            .expects("=option")
            .options(["auto", "on", "off"])
            .docs("GiST buffering build technique"),
    ]
});

pub(super) fn result(ctx: MatchContext<'_>, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let prev = cb.prev_tokens();
    let head = prev.get(after..).unwrap_or_default();
    if !head.iter().any(|t| t.nesting_id.is_top() && t.is("on")) {
        return index_name(head);
    }

    let table = table_after(cb, ctx.catalog, "on");
    if cb.curr_nesting_id.depth() == 1 {
        let func = cb.curr_nesting_func.as_ref().map(|f| f.text_lc.as_str());
        return match func {
            Some("with") => {
                let opts = KwdOpts {
                    not_ordered: true,
                    ..Default::default()
                };
                ctx.with_kwds(&INDEX_PARAMS, opts).suggestion(Some(","), &[])
            }
            Some("include") => column_list(ctx, table, false),
            _ => column_list(ctx, table, true),
        };
    }
    if cb.curr_nesting_id.depth() > 1 {
        return table.map_or_else(Vec::new, |t| table_columns(ctx.catalog, t, &[]));
    }

    if prev.iter().any(|t| t.nesting_id.is_top() && t.is("where")) {
        let mut items = table.map_or_else(Vec::new, |t| table_columns(ctx.catalog, t, &[]));
        items.extend(ctx.expected("function").into_iter().map(|i| i.sort("b")));
        return items;
    }

    let mut items = ctx.with_kwds(&INDEX_KWDS, KwdOpts::default()).suggestion(None, &[]);
    let after_target = cb.ltoken().is_some_and(|t| !t.is_any(&["on", "only", "using"]));
    if table.is_some() && after_target && !has_column_list(cb) {
        items.push(
            CompletionItem::keyword("( column )")
                .insert("(${1:column})")
                .sort("!"),
        );
    }
    items
}

/// Between `INDEX` and `ON`.
fn index_name(head: &[Token]) -> Vec<CompletionItem> {
    let words: Vec<&str> = head.iter().map(|t| t.text_lc.as_str()).collect();
    match words.as_slice() {
        [] => suggest_kwds(&["CONCURRENTLY", "IF NOT EXISTS", "$index_name", "ON"]),
        ["concurrently"] => suggest_kwds(&["IF NOT EXISTS", "$index_name", "ON"]),
        [.., "if", "not", "exists"] => suggest_kwds(&["$index_name"]),
        [.., "if"] | [.., "if", "not"] => vec![],
        _ => suggest_kwds(&["ON"]),
    }
}

/// Key or included columns. Key columns take an ordering after the name.
fn column_list(ctx: MatchContext<'_>, table: Option<&Arc<Entry>>, ordering: bool) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let prev = cb.prev_tokens_at(&cb.curr_nesting_id);
    let column = since_last_comma(&prev);
    if column.is_empty() {
        return table.map_or_else(Vec::new, |t| table_columns(ctx.catalog, t, &prev));
    }
    if !ordering {
        return suggest_kwds(&[","]);
    }

    let written: Vec<&str> = column.iter().map(|t| t.text_lc.as_str()).collect();
    if written.last() == Some(&"nulls") {
        return suggest_kwds(&["FIRST", "LAST"]);
    }
    let mut kwds = vec![];
    if !written.iter().any(|w| *w == "asc" || *w == "desc") {
        kwds.extend(["ASC", "DESC"]);
    }
    if !written.contains(&"nulls") {
        kwds.extend(["NULLS LAST", "NULLS FIRST"]);
    }
    kwds.push(",");
    suggest_kwds(&kwds)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{create, labels};
    use crate::testing::*;

    #[tokio::test]
    async fn index_name_then_table() {
        let items = create("CREATE INDEX |").await;
        assert_eq!(labels(&items), vec!["CONCURRENTLY", "IF NOT EXISTS", "$index_name", "ON"]);

        assert_eq!(labels(&create("CREATE INDEX users_email_idx |").await), vec!["ON"]);

        let items = create("CREATE UNIQUE INDEX users_email_idx ON |").await;
        assert!(labels(&items).contains(&"users"));
    }

    #[tokio::test]
    async fn method_or_column_list_after_the_table() {
        let items = create("CREATE INDEX idx ON users |").await;
        let names = labels(&items);
        assert!(names.contains(&"( column )"));
        assert!(names.contains(&"USING"));
        assert!(!names.contains(&"INCLUDE"));

        let items = create("CREATE INDEX idx ON users USING |").await;
        let names = labels(&items);
        assert!(names.contains(&"btree"));
        assert!(names.contains(&"gin"));
    }

    #[rstest]
    #[case("CREATE INDEX idx ON users (|")]
    #[case("CREATE INDEX idx ON users USING btree (|")]
    #[tokio::test]
    async fn key_columns(#[case] sql: &str) {
        assert_eq!(labels(&create(sql).await), vec!["id", "email", "name"]);
    }

    #[tokio::test]
    async fn column_ordering() {
        let items = create("CREATE INDEX idx ON users (email |").await;
        assert_eq!(labels(&items), vec!["ASC", "DESC", "NULLS LAST", "NULLS FIRST", ","]);

        let items = create("CREATE INDEX idx ON users (email DESC |").await;
        assert_eq!(labels(&items), vec!["NULLS LAST", "NULLS FIRST", ","]);

        let items = create("CREATE INDEX idx ON users (email, |").await;
        assert_eq!(labels(&items), vec!["id", "name"]);
    }

    #[tokio::test]
    async fn partial_index_and_options() {
        let items = create("CREATE INDEX idx ON users (email) |").await;
        let names = labels(&items);
        assert!(names.contains(&"INCLUDE"));
        assert!(names.contains(&"WHERE"));
        assert!(!names.contains(&"USING"));

        let items = create("CREATE INDEX idx ON users (email) WHERE |").await;
        assert!(labels(&items).contains(&"name"));

        let items = create("CREATE INDEX idx ON users (email) WITH (|").await;
        assert!(labels(&items).contains(&"deduplicate_items"));
    }
}
