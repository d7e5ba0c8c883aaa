//! `REINDEX [(options)] {INDEX | TABLE | SCHEMA | DATABASE | SYSTEM} [CONCURRENTLY] name`
use super::*;
use std::sync::LazyLock;

const TARGETS: &[(&str, ObjectType, &str)] = &[
    ("INDEX", ObjectType::Index, "Recreate the specified index"),
    ("TABLE", ObjectType::Table, "Recreate all indexes of the table and of its TOAST table"),
    ("SCHEMA", ObjectType::Schema, "Recreate all indexes of the schema"),
    ("DATABASE", ObjectType::Database, "Recreate all indexes within the current database, except system catalogs"),
    ("SYSTEM", ObjectType::Database, "Recreate all indexes on system catalogs of the current database"),
];

static OPTION_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("CONCURRENTLY").docs("Rebuild without taking locks that prevent concurrent writes"),
        Kwd::new("TABLESPACE")
            .expects("tablespace")
            .docs("Tablespace where the rebuilt indexes are created"),
        Kwd::new("VERBOSE").docs("Print a progress report as each index is reindexed"),
    ]
});

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if cb.curr_nesting_func.as_ref().is_some_and(|f| f.text_lc == "reindex") {
        let opts = KwdOpts {
            not_ordered: true,
            ..Default::default()
        };
        return ctx.with_kwds(&OPTION_KWDS, opts).suggestion(Some(","), &["(", ")"]);
    }

    let words: Vec<&Token> = cb
        .prev_tokens()
        .iter()
        .filter(|t| t.nesting_id.is_top() && !t.kind.is_paren())
        .skip(1)
        .collect();
    let has_options = cb.prev_tokens().iter().any(|t| t.kind == TokenKind::ParenOpen);
    let Some((kind, rest)) = words.split_first() else {
        let mut items = match has_options {
            true => vec![],
            false => suggest_snippets([Snippet::new("( options )").insert("($0)")]),
        };
        items.extend(suggest_snippets(TARGETS.iter().map(|(t, _, docs)| Snippet::new(*t).docs(*docs))));
        return items;
    };
    let Some((phrase, object_type, _)) = TARGETS.iter().find(|(t, _, _)| kind.is(t)) else {
        return vec![];
    };
    let concurrently = rest.first().is_some_and(|t| t.is("concurrently"));
    match (rest.len(), concurrently) {
        (0, _) => {
            let mut items = ctx.expected(*object_type);
            if *phrase != "SYSTEM" {
                items.insert(0, CompletionItem::keyword("CONCURRENTLY").sort("!"));
            }
            items
        }
        (1, true) => ctx.expected(*object_type),
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn reindex(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn targets() {
        assert_eq!(
            labels(&reindex("REINDEX |")),
            vec!["( options )", "INDEX", "TABLE", "SCHEMA", "DATABASE", "SYSTEM"]
        );
        assert_eq!(
            labels(&reindex("REINDEX (VERBOSE) |")),
            vec!["INDEX", "TABLE", "SCHEMA", "DATABASE", "SYSTEM"]
        );
    }

    #[test]
    fn options() {
        assert_eq!(labels(&reindex("REINDEX (|")), vec!["CONCURRENTLY", "TABLESPACE", "VERBOSE"]);
        assert!(labels(&reindex("REINDEX (TABLESPACE |")).contains(&"pg_default"));
        assert_eq!(labels(&reindex("REINDEX (VERBOSE, |")), vec!["CONCURRENTLY", "TABLESPACE"]);
    }

    #[test]
    fn names() {
        let items = reindex("REINDEX INDEX |");
        assert_eq!(labels(&items), vec!["CONCURRENTLY", "users_pkey"]);

        let names = labels(&reindex("REINDEX TABLE CONCURRENTLY |")).into_iter().map(str::to_string).collect::<Vec<_>>();
        assert!(names.contains(&"users".to_string()));
        assert!(!names.contains(&"CONCURRENTLY".to_string()));

        let items = reindex("REINDEX SYSTEM |");
        assert!(labels(&items).contains(&"analytics"));
        assert!(!labels(&items).contains(&"CONCURRENTLY"));

        assert!(reindex("REINDEX INDEX users_pkey |").is_empty());
    }
}
