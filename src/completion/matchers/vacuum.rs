//! `VACUUM` and `ANALYZE`.
use super::*;
use std::sync::LazyLock;

/// Option, accepted values, whether ANALYZE takes it too, docs.
const OPTIONS: &[(&str, &[&str], bool, &str)] = &[
    ("FULL", &[], false, "Rewrite the whole table to reclaim more space. Takes an exclusive lock"),
    ("FREEZE", &[], false, "Aggressively freeze tuples, as with zero freeze ages"),
    ("VERBOSE", &[], true, "Print a detailed activity report for each table"),
    ("ANALYZE", &[], false, "Also update the planner statistics"),
    ("DISABLE_PAGE_SKIPPING", &[], false, "Visit every page, ignoring the visibility map"),
    ("SKIP_LOCKED", &[], true, "Skip relations that cannot be locked immediately"),
    ("INDEX_CLEANUP", &["AUTO", "ON", "OFF"], false, "Whether to remove index entries pointing to dead tuples"),
    ("PROCESS_MAIN", &["true", "false"], false, "Process the main relation"),
    ("PROCESS_TOAST", &["true", "false"], false, "Process the TOAST table of each relation"),
    ("TRUNCATE", &["true", "false"], false, "Truncate empty pages at the end of the table"),
    ("PARALLEL", &["2", "4"], false, "Number of workers for the index vacuum and cleanup phases"),
    ("SKIP_DATABASE_STATS", &[], false, "Skip updating the database-wide oldest unfrozen XID"),
    ("ONLY_DATABASE_STATS", &[], false, "Only update the database-wide oldest unfrozen XID"),
    ("BUFFER_USAGE_LIMIT", &["'256kB'", "'16MB'"], true, "Ring buffer size of the buffer access strategy"),
];

fn option_kwds(analyze: bool) -> Vec<Kwd> {
    OPTIONS
        .iter()
        .filter(|(_, _, in_analyze, _)| !analyze || *in_analyze)
        .map(|(name, values, _, docs)| {
            let kwd = Kwd::new(*name).docs(*docs);
            match values.is_empty() {
                true => kwd,
                false => kwd.options(values.iter().copied()),
            }
        })
        .collect()
}

static VACUUM_OPTIONS: LazyLock<Vec<Kwd>> = LazyLock::new(|| option_kwds(false));
static ANALYZE_OPTIONS: LazyLock<Vec<Kwd>> = LazyLock::new(|| option_kwds(true));

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let is_vacuum = cb.ftoken().is_some_and(|t| t.is("vacuum"));

    if let Some(func) = &cb.curr_nesting_func {
        if func.text_lc == "vacuum" || func.text_lc == "analyze" {
            let kwds: &[Kwd] = if is_vacuum { &VACUUM_OPTIONS } else { &ANALYZE_OPTIONS };
            let opts = KwdOpts {
                not_ordered: true,
                ..Default::default()
            };
            return ctx.with_kwds(kwds, opts).suggestion(Some(","), &["(", ")"]);
        }
        let table = ctx.catalog.find_table(&unquote_identifier(&func.text));
        let written = cb.prev_tokens_at(&cb.curr_nesting_id);
        return table.map_or_else(Vec::new, |t| table_columns(ctx.catalog, t, &written));
    }

    let Some(ltoken) = cb.ltoken() else {
        return vec![];
    };
    if ltoken.is_any(&["vacuum", "analyze"]) && cb.prev_tokens().len() == 1 {
        let mut items = suggest_snippets([Snippet::new("( options )")
            .insert("($0)")
            .docs("Options in parentheses, e.g. (VERBOSE, SKIP_LOCKED)")]);
        if is_vacuum {
            items.extend(suggest_snippets(["FULL", "FREEZE", "VERBOSE", "ANALYZE"]));
        } else {
            items.extend(suggest_kwds(&["VERBOSE"]));
        }
        items.extend(relations(ctx));
        return items;
    }
    let top: Vec<&Token> = cb.prev_tokens().iter().filter(|t| t.nesting_id.is_top()).collect();
    let after_options = matches!(
        top.as_slice(),
        [_, open, close] if open.kind == TokenKind::ParenOpen && close.kind == TokenKind::ParenClose
    );
    if ltoken.kind == TokenKind::Comma || after_options || ltoken.is_any(&["full", "freeze", "verbose", "analyze"]) {
        return relations(ctx);
    }
    if ltoken.kind.is_identifier() || ltoken.kind == TokenKind::ParenClose {
        return suggest_kwds(&[","]);
    }
    vec![]
}

/// Tables and materialized views, which both keep statistics.
fn relations(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    ctx.expected(Expect::Objects(vec![ObjectType::Table, ObjectType::MView]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn vacuum(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn options_or_relations() {
        let items = vacuum("VACUUM |");
        let names = labels(&items);
        assert_eq!(names[0], "( options )");
        assert!(names.contains(&"FULL"));
        assert!(names.contains(&"users"));
        assert!(names.contains(&"order_totals"));
        assert!(!names.contains(&"active_users"));

        let names = labels(&vacuum("ANALYZE |")).into_iter().map(str::to_string).collect::<Vec<_>>();
        assert!(!names.contains(&"FULL".to_string()));
        assert!(names.contains(&"VERBOSE".to_string()));
    }

    #[test]
    fn parenthesized_options() {
        let items = vacuum("VACUUM (|");
        let names = labels(&items);
        assert!(names.contains(&"FULL"));
        assert!(names.contains(&"INDEX_CLEANUP"));

        let items = vacuum("VACUUM (FULL |");
        let verbose = items.iter().find(|i| i.label == "VERBOSE").unwrap();
        assert_eq!(verbose.insert_text, ", VERBOSE");
        assert!(!labels(&items).contains(&"FULL"));

        assert_eq!(labels(&vacuum("VACUUM (INDEX_CLEANUP |")), vec!["AUTO", "ON", "OFF"]);
        assert_eq!(
            labels(&vacuum("ANALYZE (|")),
            vec!["VERBOSE", "SKIP_LOCKED", "BUFFER_USAGE_LIMIT"]
        );
    }

    #[rstest]
    #[case("VACUUM (VERBOSE) |", "orders")]
    #[case("VACUUM FULL |", "orders")]
    #[case("VACUUM users, |", "t1")]
    #[case("VACUUM users (|", "email")]
    #[case("VACUUM users |", ",")]
    fn offers(#[case] sql: &str, #[case] label: &str) {
        assert!(labels(&vacuum(sql)).contains(&label));
    }
}
