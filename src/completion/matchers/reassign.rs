//! `REASSIGN OWNED BY old_role [, ...] TO new_role`
use super::*;
use std::sync::LazyLock;

static REASSIGN_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("REASSIGN OWNED BY")
            .expects("role")
            .docs("Change the ownership of database objects owned by these roles"),
        Kwd::new(",").expects("role").can_repeat(),
        Kwd::new("TO").expects("role").docs(
            "The new owner. Only affects the current database; shared objects such as databases \
             and tablespaces are not reassigned",
        ),
    ]
});

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    match prev_words(cb).as_str() {
        "reassign" => suggest_kwds(&["OWNED BY"]),
        "reassign owned" => suggest_kwds(&["BY"]),
        _ => ctx.with_kwds(&REASSIGN_KWDS, KwdOpts::default()).suggestion(None, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn reassign(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[rstest]
    #[case("REASSIGN |", vec!["OWNED BY"])]
    #[case("REASSIGN OWNED |", vec!["BY"])]
    #[case("REASSIGN OWNED BY app_user |", vec![",", "TO"])]
    #[case("REASSIGN OWNED BY app_user TO postgres |", vec![])]
    fn next(#[case] sql: &str, #[case] expected: Vec<&str>) {
        assert_eq!(labels(&reassign(sql)), expected);
    }

    #[rstest]
    #[case("REASSIGN OWNED BY |")]
    #[case("REASSIGN OWNED BY app_user, |")]
    #[case("REASSIGN OWNED BY app_user TO |")]
    fn roles(#[case] sql: &str) {
        let items = reassign(sql);
        assert!(labels(&items).contains(&"postgres"));
        assert!(labels(&items).contains(&"CURRENT_USER"));
    }
}
