//! `COMMENT ON <object> name IS 'text' | NULL`
use super::*;

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if !cb.curr_nesting_id.is_top() {
        return ctx.expected("datatype");
    }
    let mut prev: Vec<&Token> = cb.prev_tokens().iter().filter(|t| t.nesting_id.is_top()).collect();
    // A dot right before the caret is still the current token.
    prev.extend(cb.curr_token().filter(|t| t.kind == TokenKind::Dot));
    match prev.as_slice() {
        [_] => return suggest_kwds(&["ON"]),
        [_, on] if on.is("on") => return object_snippets(),
        _ => {}
    }
    if let Some(is) = prev.iter().position(|t| t.is("is")) {
        return match is + 1 == prev.len() {
            true => suggest_snippets([
                Snippet::new("'text'").insert("'$1'").docs("The new comment"),
                Snippet::new("NULL").docs("Drop the comment"),
            ]),
            false => vec![],
        };
    }
    if prev.get(2).is_some_and(|t| t.is("column")) {
        return column_target(ctx, &prev[3..]);
    }

    let Some((_, object_type, len)) = object_at(cb, 2) else {
        return vec![];
    };
    let attached = matches!(object_type, ObjectType::Policy | ObjectType::Trigger | ObjectType::Rule);
    let rest = prev.get(2 + len..).unwrap_or_default();
    match rest {
        [] => ctx.expected(object_type),
        [.., dot] if dot.kind == TokenKind::Dot => ctx.expected(object_type),
        [.., on] if attached && on.is("on") => ctx.expected("table"),
        [_] if attached => suggest_kwds(&["ON"]),
        _ => suggest_kwds(&["IS"]),
    }
}

fn object_snippets() -> Vec<CompletionItem> {
    let phrases = PG_OBJECTS.iter().flat_map(|(phrase, object_type)| {
        let snippet = Snippet::new(*phrase).kind(ItemKind::for_type(*object_type));
        match *phrase {
            "TABLE" => vec![snippet, Snippet::new("COLUMN").kind(ItemKind::for_type(ObjectType::Column))],
            _ => vec![snippet],
        }
    });
    suggest_snippets(phrases)
}

/// `COMMENT ON COLUMN [schema.]table.column`
fn column_target(ctx: MatchContext<'_>, rest: &[&Token]) -> Vec<CompletionItem> {
    match rest {
        [] => ctx.expected(Expect::Objects(vec![ObjectType::Table, ObjectType::View, ObjectType::MView])),
        [name @ .., dot] if dot.kind == TokenKind::Dot => {
            let written: String = name.iter().map(|t| t.text.as_str()).collect();
            match ctx.catalog.find_table(&written) {
                Some(table) => table_columns(ctx.catalog, table, &[]),
                None => ctx.expected(Expect::Objects(vec![ObjectType::Table, ObjectType::View])),
            }
        }
        _ => suggest_kwds(&["IS"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn comment(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn object_kinds() {
        assert_eq!(labels(&comment("COMMENT |")), vec!["ON"]);
        let items = comment("COMMENT ON |");
        assert_eq!(labels(&items)[..2], ["TABLE", "COLUMN"]);
        assert!(labels(&items).contains(&"MATERIALIZED VIEW"));
    }

    #[rstest]
    #[case("COMMENT ON TABLE |", "users")]
    #[case("COMMENT ON MATERIALIZED VIEW |", "order_totals")]
    #[case("COMMENT ON ROLE |", "app_user")]
    #[case("COMMENT ON POLICY users_own_rows ON |", "users")]
    #[case("COMMENT ON COLUMN |", "orders")]
    #[case("COMMENT ON TABLE archive.|", "old_orders")]
    fn names(#[case] sql: &str, #[case] label: &str) {
        assert!(labels(&comment(sql)).contains(&label));
    }

    #[rstest]
    #[case("COMMENT ON TABLE users |", vec!["IS"])]
    #[case("COMMENT ON FUNCTION lower(text) |", vec!["IS"])]
    #[case("COMMENT ON POLICY users_own_rows |", vec!["ON"])]
    #[case("COMMENT ON POLICY users_own_rows ON users |", vec!["IS"])]
    #[case("COMMENT ON COLUMN users.|", vec!["id", "email", "name"])]
    #[case("COMMENT ON COLUMN users.em|", vec!["id", "email", "name"])]
    #[case("COMMENT ON COLUMN users.email |", vec!["IS"])]
    #[case("COMMENT ON TABLE users IS |", vec!["'text'", "NULL"])]
    #[case("COMMENT ON TABLE users IS 'people' |", vec![])]
    fn next(#[case] sql: &str, #[case] expected: Vec<&str>) {
        assert_eq!(labels(&comment(sql)), expected);
    }
}
