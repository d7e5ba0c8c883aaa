//! `CREATE`, `ALTER` and `DROP SUBSCRIPTION`.
use super::publication::replication_head;
use super::*;
use std::sync::LazyLock;

/// Subscription parameter, accepted values, docs.
const PARAMETERS: &[(&str, &[&str], &str)] = &[
    ("connect", &["true", "false"], "Connect to the publisher at all. false also forces create_slot, enabled and copy_data to false"),
    ("create_slot", &["true", "false"], "Create the replication slot on the publisher"),
    ("enabled", &["true", "false"], "Start replicating right away"),
    ("slot_name", &["'$slot_name'", "NONE"], "Replication slot on the publisher. Defaults to the subscription name"),
    ("binary", &["true", "false"], "Request the data in binary format"),
    ("copy_data", &["true", "false"], "Copy the data already in the published tables when replication starts"),
    ("streaming", &["off", "on", "parallel"], "Stream in-progress transactions"),
    ("synchronous_commit", &["off", "local", "remote_write", "remote_apply", "on"], "synchronous_commit of the apply workers"),
    ("two_phase", &["true", "false"], "Enable two-phase commit"),
    ("disable_on_error", &["true", "false"], "Disable the subscription when replication hits an error"),
    ("password_required", &["true", "false"], "Connections to the publisher must use password authentication"),
    ("run_as_owner", &["true", "false"], "Perform all replication actions as the subscription owner"),
    ("origin", &["any", "none"], "Only receive changes without an origin, or all of them"),
    ("failover", &["true", "false"], "Synchronize the replication slot to the standbys"),
];

static WITH_OPTIONS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    PARAMETERS
        .iter()
        .map(|(name, values, docs)| {
            Kwd::new(*name)
                .expects("=option")
                .options(values.iter().copied())
                .docs(*docs)
        })
        .collect()
});

static CREATE_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("CONNECTION")
            .options([Snippet::new("'host= port=5432 user= dbname='")
                .insert("'host=${1:localhost} port=${2:5432} user=${3:postgres} dbname=${4:postgres}'")])
            .docs("libpq connection string of the publisher database"),
        Kwd::new("PUBLICATION")
            .options(["$publication_name"])
            .docs("Publications on the publisher to subscribe to"),
        Kwd::new(",").depends_on("publication").options(["$publication_name"]).can_repeat(),
        Kwd::new("WITH")
            .optional()
            .options([Snippet::new("( options )").insert("($0)")]),
    ]
});

const ALTER_ACTIONS: &[(&str, &str, &str)] = &[
    ("CONNECTION", "CONNECTION '$0'", "Change the connection string"),
    ("SET PUBLICATION", "SET PUBLICATION ", "Replace the subscribed publications"),
    ("ADD PUBLICATION", "ADD PUBLICATION ", ""),
    ("DROP PUBLICATION", "DROP PUBLICATION ", ""),
    ("REFRESH PUBLICATION", "REFRESH PUBLICATION", "Fetch missing table information from the publisher"),
    ("ENABLE", "ENABLE", ""),
    ("DISABLE", "DISABLE", ""),
    ("SET ( options )", "SET ($0)", ""),
    ("SKIP ( lsn = ... )", "SKIP ( lsn = '$0' )", "Skip applying the remote transaction that finishes at this LSN"),
    ("OWNER TO", "OWNER TO ", ""),
    ("RENAME TO", "RENAME TO ", ""),
];

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if cb.curr_nesting_func.as_ref().is_some_and(|f| matches!(f.text_lc.as_str(), "with" | "set")) {
        let opts = KwdOpts {
            not_ordered: true,
            ..Default::default()
        };
        return ctx.with_kwds(&WITH_OPTIONS, opts).suggestion(Some(","), &["(", ")"]);
    }
    if !cb.curr_nesting_id.is_top() {
        return vec![];
    }
    if let Some(items) = replication_head(ctx, ObjectType::Subscription) {
        return items;
    }

    let top: Vec<&Token> = cb.prev_tokens().iter().filter(|t| t.nesting_id.is_top()).collect();
    match cb.ftoken().map(|t| t.text_lc.as_str()) {
        Some("create") => ctx.with_kwds(&CREATE_KWDS, KwdOpts::default()).suggestion(None, &[]),
        Some("alter") if top.len() == 3 => suggest_snippets(ALTER_ACTIONS.iter().map(|(label, insert, docs)| {
            let snippet = Snippet::new(*label).insert(*insert);
            match docs.is_empty() {
                true => snippet,
                false => snippet.docs(*docs),
            }
        })),
        Some("alter") => {
            let last = top.last().copied();
            let publications_listed = top.iter().skip(3).any(|t| t.is("publication"));
            if last.is_some_and(|t| t.is("publication") || t.kind == TokenKind::Comma) && publications_listed {
                suggest_kwds(&["$publication_name"])
            } else if publications_listed && last.is_some_and(|t| t.kind.is_word() && !t.is("refresh")) {
                suggest_kwds(&[",", "WITH ( options )"])
            } else {
                vec![]
            }
        }
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn subscription(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[rstest]
    #[case("CREATE SUBSCRIPTION |", vec!["$new_subscription_name"])]
    #[case("CREATE SUBSCRIPTION s |", vec!["CONNECTION", "PUBLICATION", "WITH"])]
    #[case("CREATE SUBSCRIPTION s CONNECTION 'host=db' |", vec!["PUBLICATION", "WITH"])]
    #[case("CREATE SUBSCRIPTION s CONNECTION 'host=db' PUBLICATION |", vec!["$publication_name"])]
    #[case("CREATE SUBSCRIPTION s CONNECTION 'host=db' PUBLICATION p1 |", vec![",", "WITH"])]
    #[case("CREATE SUBSCRIPTION s CONNECTION 'host=db' PUBLICATION p1 WITH (copy_data |", vec!["true", "false"])]
    #[case("ALTER SUBSCRIPTION sub_main ADD PUBLICATION |", vec!["$publication_name"])]
    #[case("ALTER SUBSCRIPTION sub_main SET PUBLICATION p1 |", vec![",", "WITH ( options )"])]
    #[case("ALTER SUBSCRIPTION sub_main ENABLE |", vec![])]
    #[case("DROP SUBSCRIPTION IF EXISTS sub_main |", vec![",", "CASCADE", "RESTRICT"])]
    fn next(#[case] sql: &str, #[case] expected: Vec<&str>) {
        assert_eq!(labels(&subscription(sql)), expected);
    }

    #[rstest]
    #[case("ALTER SUBSCRIPTION |", "sub_main")]
    #[case("DROP SUBSCRIPTION |", "IF EXISTS")]
    #[case("ALTER SUBSCRIPTION sub_main |", "REFRESH PUBLICATION")]
    #[case("ALTER SUBSCRIPTION sub_main OWNER TO |", "postgres")]
    #[case("ALTER SUBSCRIPTION sub_main SET (|", "streaming")]
    fn offers(#[case] sql: &str, #[case] label: &str) {
        assert!(labels(&subscription(sql)).contains(&label), "{sql}");
    }

    #[test]
    fn parameters_are_listed_once() {
        let items = subscription("CREATE SUBSCRIPTION s CONNECTION '' PUBLICATION p WITH (enabled = false, |");
        let names = labels(&items);
        assert!(!names.contains(&"enabled"));
        assert!(names.contains(&"slot_name"));
        let slot = items.iter().find(|i| i.label == "slot_name").unwrap();
        assert_eq!(slot.insert_text, "slot_name");
    }
}
