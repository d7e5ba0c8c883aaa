#![cfg(test)]
use crate::testing::*;
use crate::*;

fn suggest(kwds: &[Kwd], sql: &str, opts: KwdOpts, delimiter: Option<&str>) -> Vec<CompletionItem> {
    let catalog = fixture_catalog();
    let cb = at_caret(sql);
    with_kwds(kwds, &cb, &catalog, opts).suggestion(delimiter, &[])
}

fn labels(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|i| i.label.as_str()).collect()
}

fn join_grammar() -> Vec<Kwd> {
    vec![
        Kwd::new("FROM").expects("table"),
        Kwd::new("LEFT JOIN").expects("table").can_repeat(),
        Kwd::new("JOIN").expects("table").can_repeat(),
        Kwd::new("ON").expects("condition").just_after(["JOIN", "LEFT JOIN"]).can_repeat(),
        Kwd::new("WHERE").expects("condition"),
    ]
}

#[test]
fn longer_phrase_wins_an_overlap() {
    let kwds = join_grammar();
    let catalog = fixture_catalog();
    let cb = at_caret("SELECT * FROM users LEFT JOIN |");
    let resolved = with_kwds(&kwds, &cb, &catalog, KwdOpts::default());

    let used: Vec<&str> = resolved.used().iter().map(|u| u.kwd.kwd.as_str()).collect();
    assert_eq!(used, vec!["FROM", "LEFT JOIN"]);
    assert!(resolved.prev_kwd.is_some_and(|p| p.kwd.is("left join")));
}

#[rstest]
#[case("SELECT * FROM t1 |", vec!["LEFT JOIN", "JOIN", "WHERE"])]
#[case("SELECT * FROM t1 JOIN t2 |", vec!["ON"])]
#[case("SELECT * FROM t1 LEFT JOIN t2 |", vec!["ON"])]
fn keywords_tied_to_the_previous_one_take_over(#[case] sql: &str, #[case] expected: Vec<&str>) {
    assert_eq!(labels(&suggest(&join_grammar(), sql, KwdOpts::default(), None)), expected);
}

#[test]
fn input_of_the_last_keyword() {
    let kwds = join_grammar();
    let catalog = fixture_catalog();
    let cb = at_caret("SELECT * FROM users u |");
    let resolved = with_kwds(&kwds, &cb, &catalog, KwdOpts::default());

    let input: Vec<&str> = resolved.prev_kwd_input().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(input, vec!["users", "u"]);
    let identifiers: Vec<&str> = resolved.prev_identifiers.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(identifiers, vec!["users", "u"]);
}

#[rstest]
#[case("CREATE SUBSCRIPTION s |", vec!["PUBLICATION", "WITH"])]
#[case("CREATE SUBSCRIPTION s PUBLICATION p |", vec![",", "WITH"])]
#[case("CREATE SUBSCRIPTION s PUBLICATION p, q |", vec![",", "WITH"])]
fn comma_needs_its_list(#[case] sql: &str, #[case] expected: Vec<&str>) {
    let kwds = vec![
        Kwd::new("PUBLICATION"),
        Kwd::new(",").depends_on("publication").can_repeat(),
        Kwd::new("WITH").optional(),
    ];
    let items = suggest(&kwds, sql, KwdOpts::default(), None);
    assert_eq!(labels(&items), expected);
    let with = items.iter().find(|i| i.label == "WITH").unwrap();
    assert_eq!(with.detail.as_deref(), Some("(optional)"));
}

#[rstest]
#[case("LOCK users |", vec!["IN", "NOWAIT"])]
#[case("LOCK ONLY users |", vec!["IN"])]
#[case("LOCK users ONLY|", vec!["IN", "NOWAIT"])]
fn excluded_by_completed_words_only(#[case] sql: &str, #[case] expected: Vec<&str>) {
    let kwds = vec![
        Kwd::new("IN").options(["ACCESS SHARE MODE"]),
        Kwd::new("NOWAIT").exclude_if(["ONLY"]),
    ];
    assert_eq!(labels(&suggest(&kwds, sql, KwdOpts::default(), None)), expected);
}

#[rstest]
#[case("SELECT * FROM users ORDER BY id DESC |", vec!["NULLS FIRST", "LIMIT"])]
#[case("SELECT * FROM users ORDER BY id |", vec!["LIMIT"])]
fn exactly_after_the_last_words(#[case] sql: &str, #[case] expected: Vec<&str>) {
    let kwds = vec![
        Kwd::new("ORDER BY").expects("column"),
        Kwd::new("NULLS FIRST").exactly_after(["ASC", "DESC"]),
        Kwd::new("LIMIT").expects("number"),
    ];
    assert_eq!(labels(&suggest(&kwds, sql, KwdOpts::default(), None)), expected);
}

#[rstest]
#[case("VACUUM (|", "FULL")]
#[case("VACUUM (FULL |", ", VERBOSE")]
#[case("VACUUM (FULL, |", "VERBOSE")]
fn delimiter_is_added_when_missing(#[case] sql: &str, #[case] insert: &str) {
    let kwds = vec![Kwd::new("FULL"), Kwd::new("VERBOSE"), Kwd::new("ANALYZE")];
    let opts = KwdOpts {
        not_ordered: true,
        ..Default::default()
    };
    let items = suggest(&kwds, sql, opts, Some(","));
    assert!(items.iter().any(|i| i.insert_text == insert), "{:?}", items);
}

#[test]
fn unordered_keywords_are_offered_once() {
    let kwds = vec![Kwd::new("FULL"), Kwd::new("VERBOSE"), Kwd::new("ANALYZE")];
    let opts = KwdOpts {
        not_ordered: true,
        ..Default::default()
    };
    let items = suggest(&kwds, "VACUUM (ANALYZE, |", opts, Some(","));
    assert_eq!(labels(&items), vec!["FULL", "VERBOSE"]);
}

#[test]
fn reset_keyword_starts_a_new_scope() {
    let kwds = vec![
        Kwd::new("SELECT").expects("column"),
        Kwd::new("FROM").expects("table"),
        Kwd::new("UNION"),
    ];
    let catalog = fixture_catalog();
    let cb = at_caret("SELECT id FROM users UNION SELECT id |");
    let remaining = |opts| -> Vec<String> {
        with_kwds(&kwds, &cb, &catalog, opts)
            .remaining
            .iter()
            .map(|r| r.kwd.kwd.clone())
            .collect()
    };

    let reset = KwdOpts {
        top_reset_kwd: Some("select"),
        ..Default::default()
    };
    assert!(remaining(reset).contains(&"FROM".to_string()));
    assert!(!remaining(KwdOpts::default()).contains(&"FROM".to_string()));
}

#[test]
fn options_come_before_catalog_objects() {
    let kwds = vec![
        Kwd::new("ON").expects("table"),
        Kwd::new("TO").expects("role").options(["PUBLIC"]),
    ];
    let items = suggest(&kwds, "GRANT SELECT ON users TO |", KwdOpts::default(), None);
    assert_eq!(items[0].label, "PUBLIC");
    assert!(items[0].sort_text.starts_with('0'));
    assert!(items[1..].iter().all(|i| !i.sort_text.starts_with('0')));
    assert!(labels(&items).contains(&"app_user"));
}

#[test]
fn already_written_values_rank_last() {
    let kwds = vec![
        Kwd::new("ON").expects("table"),
        Kwd::new("TO").expects("role"),
        Kwd::new(",").expects("role").can_repeat(),
    ];
    let items = suggest(&kwds, "GRANT SELECT ON users TO postgres, |", KwdOpts::default(), None);
    let sort = |label: &str| items.iter().find(|i| i.label == label).map(|i| i.sort_text.clone());
    assert!(sort("postgres").is_some_and(|s| s.starts_with('b')));
    assert!(sort("app_user").is_some_and(|s| s.starts_with('a')));
}

#[rstest]
#[case("VACUUM |", "(FULL$0)")]
#[case("VACUUM (|", "FULL")]
fn option_lists_open_their_parens(#[case] sql: &str, #[case] insert: &str) {
    let kwds = vec![Kwd::new("VACUUM").expects("(options)").options(["FULL", "VERBOSE"])];
    let items = suggest(&kwds, sql, KwdOpts::default(), None);
    assert_eq!(labels(&items), vec!["FULL", "VERBOSE"]);
    assert_eq!(items[0].insert_text, insert);
}
