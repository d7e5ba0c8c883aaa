//! `COPY table [(columns)] FROM | TO 'path' | PROGRAM 'command' | STDIN [WITH] (options)`
use super::*;
use std::sync::LazyLock;

/// Entries of a server-side directory with their kind and size.
const LIST_DIR_SQL: &str = "SELECT f::text, s.isdir::text, pg_size_pretty(s.size)::text \
     FROM pg_ls_dir($1) AS f, LATERAL pg_stat_file($1 || f, true) AS s \
     WHERE f NOT LIKE '%.sys' ORDER BY s.isdir DESC, f";

const ENCODINGS: &[&str] = &["UTF8", "LATIN1", "SQL_ASCII", "WIN1252", "EUC_JP", "SJIS"];

static OPTION_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("FORMAT")
            .options(["text", "csv", "binary"])
            .docs("Data format to read or write. The default is text"),
        Kwd::new("FREEZE")
            .options(["true", "false"])
            .docs("Copy the rows already frozen, as after VACUUM FREEZE"),
        Kwd::new("DELIMITER")
            .options(["E'\\t'", "','", "';'"])
            .docs("Column separator. Tab in text format, comma in csv format"),
        Kwd::new("NULL")
            .options(["''", "'\\N'"])
            .docs("String that represents a null value"),
        Kwd::new("HEADER")
            .options(["true", "false", "match"])
            .docs("The file has a header line with the column names"),
        Kwd::new("QUOTE")
            .depends_on("csv")
            .options(["'\"'", "''''"])
            .docs("Quoting character. The default is double-quote"),
        Kwd::new("ESCAPE")
            .depends_on("csv")
            .options(["'\"'", "''''"])
            .docs("Character before a data character matching QUOTE"),
        Kwd::new("FORCE_QUOTE")
            .depends_on("csv")
            .options(["*"])
            .docs("Quote all non-NULL values of the listed columns. COPY TO only"),
        Kwd::new("FORCE_NOT_NULL")
            .depends_on("csv")
            .options(["*"])
            .docs("Never match the listed columns against the null string. COPY FROM only"),
        Kwd::new("FORCE_NULL")
            .depends_on("csv")
            .options(["*"])
            .docs("Match quoted values of the listed columns against the null string. COPY FROM only"),
        Kwd::new("ENCODING")
            .options(ENCODINGS.iter().map(|e| Snippet::new(format!("'{e}'"))))
            .docs("Encoding of the file. Defaults to the client encoding"),
    ]
});

pub(crate) async fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if let Some(items) = match_nested_group(ctx, &Command::DML, MatchOptions { exclude_into: true }).await {
        return items;
    }

    let prev = cb.prev_tokens();
    let direction = prev
        .iter()
        .position(|t| t.nesting_id.is_top() && t.is_any(&["from", "to"]));
    let table = table_after(cb, ctx.catalog, "copy");

    if !cb.curr_nesting_id.is_top() {
        return match direction {
            Some(_) => ctx
                .with_kwds(&OPTION_KWDS, KwdOpts { not_ordered: true, ..Default::default() })
                .suggestion(Some(","), &["(", ")"]),
            None => {
                let written = cb.prev_tokens_at(&cb.curr_nesting_id);
                table.map_or_else(Vec::new, |t| table_columns(ctx.catalog, t, &written))
            }
        };
    }

    let Some(direction) = direction else {
        return match prev.len() {
            0 | 1 => {
                let mut items = ctx.expected("table");
                items.push(
                    CompletionItem::keyword("( query )")
                        .insert("(\n  $0\n)")
                        .docs("Copy the result of a query")
                        .sort("!"),
                );
                items
            }
            _ => {
                let mut items = suggest_kwds(&["FROM", "TO"]);
                let has_column_list = prev.iter().any(|t| t.kind == TokenKind::ParenOpen);
                if let Some(table) = table.filter(|_| !has_column_list) {
                    let columns: Vec<String> = ctx
                        .catalog
                        .columns_of(table)
                        .iter()
                        .map(|c| c.escaped_name.clone())
                        .collect();
                    items.push(
                        CompletionItem::keyword("( columns )")
                            .insert(format!("( {} )", columns.join(", ")))
                            .sort("!"),
                    );
                }
                items
            }
        };
    };

    let after = &prev[direction + 1..];
    let is_from = prev[direction].is("from");
    match after {
        [] => {
            let mut items = match is_from {
                true => suggest_kwds(&["PROGRAM", "STDIN"]),
                false => suggest_kwds(&["PROGRAM", "STDOUT"]),
            };
            if cb.curr_token().is_some_and(|t| t.kind == TokenKind::Str) {
                items.clear();
            }
            items.extend(paths(ctx).await);
            items
        }
        [program] if program.is("program") => suggest_snippets([Snippet::new("'command'")
            .insert("'${1:command}'")
            .docs("Shell command run by the server. Its output is read, or the data written to its input")]),
        [.., last] if last.is("with") => options_snippet(),
        [_] | [_, _] if after.last().is_some_and(|t| t.kind == TokenKind::Str || t.is_any(&["stdin", "stdout"])) => {
            let mut items = suggest_kwds(&["WITH"]);
            items.extend(options_snippet());
            items
        }
        _ => vec![],
    }
}

fn options_snippet() -> Vec<CompletionItem> {
    suggest_snippets([Snippet::new("( options )")
        .insert("($0)")
        .docs("FORMAT, HEADER, DELIMITER, NULL, QUOTE, ESCAPE, ENCODING ...")])
}

/// Server-side files for the path being typed. Directories are listed
/// first; a failed listing becomes a single error placeholder.
async fn paths(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let Some(live) = ctx.live else {
        return vec![];
    };
    let typed = ctx
        .cb
        .curr_token()
        .filter(|t| t.kind == TokenKind::Str)
        .map(|t| t.text.trim_matches('\''))
        .unwrap_or_default();
    let dir = match typed.rfind('/') {
        Some(i) => typed[..=i].to_string(),
        None => "/".to_string(),
    };

    let rows = match live.query(LIST_DIR_SQL, std::slice::from_ref(&dir), ReturnType::Rows).await {
        Ok(output) => output.into_rows(),
        Err(e) => {
            warn!("Listing {dir} failed: {e}");
            return vec![CompletionItem::placeholder(format!("Error: {}", e.hint()))];
        }
    };
    if rows.is_empty() {
        return vec![CompletionItem::placeholder("Directory is empty")];
    }
    rows.into_iter()
        .filter_map(|row| {
            let mut row = row.into_iter();
            let name = row.next().flatten()?;
            let is_dir = row.next().flatten().is_some_and(|v| v == "true");
            let size = row.next().flatten();
            let item = match is_dir {
                true => CompletionItem::new(format!("{name}/"), ObjectType::Folder)
                    .insert(format!("'{dir}{name}/"))
                    .sort("a"),
                false => CompletionItem::new(name.clone(), ObjectType::File)
                    .insert(format!("'{dir}{name}'"))
                    .sort("b"),
            };
            Some(match size {
                Some(size) if !is_dir => item.detail(size),
                _ => item,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    async fn copy(sql: &str, live: Option<&dyn LiveQuery>) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog).with_live(live)).await
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[tokio::test]
    async fn table_then_direction() {
        let items = copy("COPY |", None).await;
        assert!(labels(&items).contains(&"users"));
        assert!(labels(&items).contains(&"( query )"));

        let items = copy("COPY users |", None).await;
        assert_eq!(labels(&items), vec!["FROM", "TO", "( columns )"]);
        assert_eq!(items[2].insert_text, "( id, email, name )");

        let items = copy("COPY users (email, |", None).await;
        assert_eq!(labels(&items), vec!["id", "name"]);
    }

    #[tokio::test]
    async fn query_source_uses_select() {
        let items = copy("COPY (SELECT * FROM |", None).await;
        assert!(labels(&items).contains(&"orders"));
    }

    #[tokio::test]
    async fn server_files() {
        let live = FakeLive::new().rows(
            "pg_ls_dir",
            &[&["imports", "true", "4096 bytes"], &["users.csv", "false", "12 kB"]],
        );
        let items = copy("COPY users FROM |", Some(&live)).await;
        assert_eq!(labels(&items), vec!["PROGRAM", "STDIN", "imports/", "users.csv"]);
        assert_eq!(items[3].insert_text, "'/users.csv'");
        assert_eq!(items[3].detail.as_deref(), Some("12 kB"));
        assert_eq!(items[2].kind, ItemKind::Folder);

        let items = copy("COPY users FROM '/data/imp|", Some(&live)).await;
        assert_eq!(labels(&items), vec!["imports/", "users.csv"]);
        assert_eq!(items[0].insert_text, "'/data/imports/");
        let calls = live.calls.lock().unwrap();
        assert_eq!(calls.last().unwrap().1, vec!["/data/".to_string()]);
    }

    #[tokio::test]
    async fn failed_listing_is_a_placeholder() {
        let live = FakeLive::new().fails("pg_ls_dir", "permission denied for function pg_ls_dir");
        let items = copy("COPY users TO |", Some(&live)).await;
        assert_eq!(labels(&items)[..2], ["PROGRAM", "STDOUT"]);
        assert!(items[2].is_placeholder());
        assert!(items[2].label.starts_with("Error: "));

        let empty = FakeLive::new();
        let items = copy("COPY users TO |", Some(&empty)).await;
        assert_eq!(items.last().unwrap().label, "Directory is empty");
    }

    #[tokio::test]
    async fn options() {
        let items = copy("COPY users FROM '/tmp/u.csv' |", None).await;
        assert_eq!(labels(&items), vec!["WITH", "( options )"]);

        let items = copy("COPY users FROM STDIN WITH (|", None).await;
        let names = labels(&items);
        assert!(names.contains(&"FORMAT"));
        assert!(names.contains(&"HEADER"));
        assert!(!names.contains(&"ESCAPE"));

        let items = copy("COPY users FROM STDIN (FORMAT |", None).await;
        assert_eq!(labels(&items), vec!["text", "csv", "binary"]);

        let items = copy("COPY users FROM STDIN (FORMAT csv, |", None).await;
        let names = labels(&items);
        assert!(names.contains(&"ESCAPE"));
        assert!(!names.contains(&"FORMAT"));
    }

    #[tokio::test]
    async fn program() {
        let items = copy("COPY users FROM PROGRAM |", None).await;
        assert_eq!(labels(&items), vec!["'command'"]);
    }
}
