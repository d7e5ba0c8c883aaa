//! `CREATE`, `ALTER` and `DROP PUBLICATION`.
//!
//! The name, `IF EXISTS` and `OWNER TO`/`RENAME TO` handling is shared
//! with subscriptions.
use super::*;
use std::sync::LazyLock;

static WITH_OPTIONS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("publish")
            .expects("=option")
            .options(["'insert, update, delete, truncate'", "'insert'"])
            .docs("DML operations published to the subscribers. All of them by default"),
        Kwd::new("publish_via_partition_root")
            .expects("=option")
            .options(["true", "false"])
            .docs(
                "Publish changes of partitions using the identity and schema of the partitioned table. \
                 TRUNCATE on partitions is then not replicated",
            ),
    ]
});

fn create_kwds(cb: &CodeBlock) -> Vec<Kwd> {
    let in_schema = prev_words(cb).contains("tables in schema");
    vec![
        Kwd::new("FOR TABLE")
            .expects("table")
            .exclude_if(["FOR"])
            .docs("Tables to publish, optionally with a column list and a WHERE (row filter)"),
        Kwd::new("FOR ALL TABLES")
            .exclude_if(["FOR"])
            .docs("Replicate all tables of the database, including tables created in the future"),
        Kwd::new("FOR TABLES IN SCHEMA")
            .expects("schema")
            .exclude_if(["FOR"])
            .docs("Replicate all tables of the listed schemas, including tables created in the future"),
        Kwd::new(",")
            .expects(if in_schema { "schema" } else { "table" })
            .include_when(|cb| {
                let words = prev_words(cb);
                words.contains(" for ") && !words.contains(" all tables")
            })
            .can_repeat(),
        Kwd::new("WITH")
            .optional()
            .options([Snippet::new("( options )").insert("($0)")])
            .docs("publish, publish_via_partition_root"),
    ]
}

const ALTER_ACTIONS: &[(&str, &str)] = &[
    ("ADD TABLE", "ADD TABLE "),
    ("ADD TABLES IN SCHEMA", "ADD TABLES IN SCHEMA "),
    ("SET TABLE", "SET TABLE "),
    ("SET TABLES IN SCHEMA", "SET TABLES IN SCHEMA "),
    ("DROP TABLE", "DROP TABLE "),
    ("DROP TABLES IN SCHEMA", "DROP TABLES IN SCHEMA "),
    ("SET ( options )", "SET ($0)"),
    ("OWNER TO", "OWNER TO "),
    ("RENAME TO", "RENAME TO "),
];

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if let Some(func) = &cb.curr_nesting_func {
        if func.text_lc == "with" || func.text_lc == "set" {
            let opts = KwdOpts {
                not_ordered: true,
                ..Default::default()
            };
            return ctx.with_kwds(&WITH_OPTIONS, opts).suggestion(Some(","), &["(", ")"]);
        }
        return published_columns(ctx, &func.text);
    }
    if let Some(items) = replication_head(ctx, ObjectType::Publication) {
        return items;
    }

    let top: Vec<&Token> = cb.prev_tokens().iter().filter(|t| t.nesting_id.is_top()).collect();
    match cb.ftoken().map(|t| t.text_lc.as_str()) {
        Some("create") => {
            let kwds = create_kwds(cb);
            with_kwds(&kwds, cb, ctx.catalog, KwdOpts::default()).suggestion(None, &[])
        }
        Some("alter") if top.len() == 3 => suggest_snippets(
            ALTER_ACTIONS
                .iter()
                .map(|(label, insert)| Snippet::new(*label).insert(*insert)),
        ),
        Some("alter") => {
            let words = prev_words(cb);
            let last = top.last().copied();
            let after_comma = last.is_some_and(|t| t.kind == TokenKind::Comma);
            if words.ends_with("tables in schema") || (after_comma && words.contains("in schema")) {
                ctx.expected("schema")
            } else if words.ends_with(" table") || after_comma {
                ctx.expected("table")
            } else if last.is_some_and(|t| t.kind.is_word()) && !words.contains(" to ") {
                suggest_kwds(&[","])
            } else {
                vec![]
            }
        }
        _ => vec![],
    }
}

/// Everything up to and including the object name, plus `DROP`, `OWNER TO`
/// and `RENAME TO`. `None` once the object specific part starts.
pub(super) fn replication_head(ctx: MatchContext<'_>, object_type: ObjectType) -> Option<Vec<CompletionItem>> {
    let cb = ctx.cb;
    let command = cb.ftoken()?.text_lc.clone();
    let words = prev_words(cb);
    let noun = object_type.to_string().to_lowercase();
    let top: Vec<&Token> = cb.prev_tokens().iter().filter(|t| t.nesting_id.is_top()).collect();

    if top.len() == 2 {
        return Some(match command.as_str() {
            "create" => suggest_kwds(&[format!("$new_{noun}_name").as_str()]),
            "drop" => {
                let mut items = ctx.expected(object_type);
                items.push(CompletionItem::keyword("IF EXISTS").sort("!"));
                items
            }
            _ => ctx.expected(object_type),
        });
    }
    if command == "drop" {
        let last = top.last()?;
        return Some(if words.ends_with("if exists") || last.kind == TokenKind::Comma {
            ctx.expected(object_type)
        } else if last.is("if") {
            suggest_kwds(&["EXISTS"])
        } else if last.is_any(&["cascade", "restrict"]) {
            vec![]
        } else {
            suggest_kwds(&[",", "CASCADE", "RESTRICT"])
        });
    }
    if command == "alter" {
        if words.ends_with("owner to") {
            return Some(ctx.expected("role"));
        }
        if words.ends_with("rename to") {
            return Some(suggest_kwds(&[format!("$new_{noun}_name").as_str()]));
        }
        if top.iter().any(|t| t.is("owner") || t.is("rename")) {
            return Some(vec![]);
        }
    }
    None
}

/// Column list or row filter of a published table.
fn published_columns(ctx: MatchContext<'_>, func: &str) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let table_name = match func.eq_ignore_ascii_case("where") {
        true => {
            let top: Vec<&Token> = cb.prev_tokens().iter().filter(|t| t.nesting_id.is_top()).collect();
            let at = top.iter().rposition(|t| t.is("where"));
            at.and_then(|i| top[..i].iter().rev().find(|t| t.kind.is_word()).map(|t| t.text.clone()))
        }
        false => Some(func.to_string()),
    };
    let Some(table) = table_name.and_then(|n| ctx.catalog.find_table(&unquote_identifier(&n))) else {
        return vec![];
    };
    let written = cb.prev_tokens_at(&cb.curr_nesting_id);
    table_columns(ctx.catalog, table, &written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn publication(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[rstest]
    #[case("CREATE PUBLICATION |", vec!["$new_publication_name"])]
    #[case("CREATE PUBLICATION p |", vec!["FOR TABLE", "FOR ALL TABLES", "FOR TABLES IN SCHEMA", "WITH"])]
    #[case("CREATE PUBLICATION p FOR TABLE users |", vec![",", "WITH"])]
    #[case("CREATE PUBLICATION p FOR ALL TABLES |", vec!["WITH"])]
    #[case("CREATE PUBLICATION p FOR ALL TABLES WITH |", vec!["( options )"])]
    #[case("CREATE PUBLICATION p WITH (|", vec!["publish", "publish_via_partition_root"])]
    #[case("CREATE PUBLICATION p FOR TABLE users (|", vec!["id", "email", "name"])]
    #[case("CREATE PUBLICATION p FOR TABLE users (id, |", vec!["email", "name"])]
    #[case("DROP PUBLICATION pub_all |", vec![",", "CASCADE", "RESTRICT"])]
    #[case("ALTER PUBLICATION pub_all RENAME TO |", vec!["$new_publication_name"])]
    fn next(#[case] sql: &str, #[case] expected: Vec<&str>) {
        assert_eq!(labels(&publication(sql)), expected);
    }

    #[rstest]
    #[case("CREATE PUBLICATION p FOR TABLE |", "users")]
    #[case("CREATE PUBLICATION p FOR TABLE users, |", "orders")]
    #[case("CREATE PUBLICATION p FOR TABLES IN SCHEMA |", "archive")]
    #[case("CREATE PUBLICATION p FOR TABLES IN SCHEMA archive, |", "public")]
    #[case("CREATE PUBLICATION p FOR TABLE orders WHERE (|", "total")]
    #[case("DROP PUBLICATION |", "IF EXISTS")]
    #[case("DROP PUBLICATION IF EXISTS |", "pub_all")]
    #[case("ALTER PUBLICATION |", "pub_all")]
    #[case("ALTER PUBLICATION pub_all |", "ADD TABLE")]
    #[case("ALTER PUBLICATION pub_all ADD TABLE |", "t1")]
    #[case("ALTER PUBLICATION pub_all OWNER TO |", "app_user")]
    fn offers(#[case] sql: &str, #[case] label: &str) {
        assert!(labels(&publication(sql)).contains(&label), "{sql}");
    }

    #[test]
    fn options_are_inserted_as_assignments() {
        let items = publication("CREATE PUBLICATION p WITH (publish_via_partition_root |");
        assert_eq!(labels(&items), vec!["true", "false"]);
        assert_eq!(items[0].insert_text, "= true");
    }

    #[test]
    fn only_tables_are_published() {
        let names = labels(&publication("CREATE PUBLICATION p FOR TABLE |"))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert!(!names.contains(&"active_users".to_string()));
        assert!(!names.contains(&"order_totals".to_string()));
    }
}
