//! `DROP <object> [IF EXISTS] name [, ...] [CASCADE | RESTRICT]` and
//! `DROP OWNED BY`.
use super::*;

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if prev_words(cb) == "drop" {
        return object_snippets();
    }
    if cb.ltoken().is_some_and(|t| t.is("owned")) {
        return suggest_kwds(&["BY"]);
    }
    if cb.tokens.get(1).is_some_and(|t| t.is("owned")) {
        let kwds = owned_kwds();
        return with_kwds(&kwds, cb, ctx.catalog, KwdOpts::default()).suggestion(None, &[]);
    }

    let Some((phrase, object_type, _)) = object_at(cb, 1) else {
        return vec![];
    };
    if object_type == ObjectType::Database && after_database_name(cb) {
        return suggest_snippets([Snippet::new("WITH (FORCE)").docs(
            "Terminate all existing connections to the target database before dropping it. \
             Fails when prepared transactions, logical replication slots or subscriptions are present",
        )]);
    }

    let kwds = object_kwds(phrase, object_type);
    let mut items = with_kwds(&kwds, cb, ctx.catalog, KwdOpts::default()).suggestion(None, &[]);
    items.retain(|i| {
        i.source.as_ref().is_none_or(|s| {
            s.object_type != ObjectType::Extension || s.is_installed()
        }) && fits_routine_phrase(phrase, i)
    });
    items.into_iter().map(drop_target).collect()
}

fn object_snippets() -> Vec<CompletionItem> {
    let mut snippets: Vec<Snippet> = PG_OBJECTS
        .iter()
        .flat_map(|(phrase, object_type)| {
            let kind = ItemKind::for_type(*object_type);
            [
                Snippet::new(format!("{phrase} IF EXISTS")).kind(kind),
                Snippet::new(*phrase).kind(kind),
            ]
        })
        .collect();
    snippets.push(Snippet::new("OWNED BY").docs(
        "Drops all objects in the current database owned by the given roles and revokes their privileges",
    ));
    suggest_snippets(snippets)
}

/// Name the same kind of object, so one never follows the other.
const ROLE_SYNONYMS: [&str; 2] = ["ROLE", "USER"];

fn object_kwds(phrase: &str, object_type: ObjectType) -> Vec<Kwd> {
    let label = object_type.to_string();
    let mut kwds = vec![
        Kwd::new(phrase).expects(object_type).options([Snippet::new("IF EXISTS")
            .insert("IF EXISTS ")
            .docs(format!("Do not throw an error if the {label} does not exist"))]),
        Kwd::new("IF EXISTS").expects(object_type).exactly_after([phrase]),
        Kwd::new(",").expects(object_type).can_repeat(),
    ];
    if object_type == ObjectType::Role {
        kwds.extend(
            ROLE_SYNONYMS
                .iter()
                .filter(|s| !s.eq_ignore_ascii_case(phrase))
                .map(|s| Kwd::new(*s).expects(object_type).exclude_if(ROLE_SYNONYMS)),
        );
    }
    if matches!(object_type, ObjectType::Policy | ObjectType::Trigger | ObjectType::Rule) {
        kwds.push(Kwd::new("ON").expects("table").depends_on(phrase));
    }
    kwds.extend([
        Kwd::new("CASCADE").depends_on(phrase).docs(format!(
            "Automatically drop objects that depend on the {label}, and in turn all objects that depend on those"
        )),
        Kwd::new("RESTRICT")
            .depends_on(phrase)
            .exclude_if(["CASCADE"])
            .docs(format!("Refuse to drop the {label} if any objects depend on it. This is the default")),
    ]);
    kwds
}

fn owned_kwds() -> Vec<Kwd> {
    vec![
        Kwd::new("OWNED BY").expects("role").docs(
            "Only affects the current database, so it usually has to be run in each database \
             holding objects of the roles being removed",
        ),
        Kwd::new(",").expects("role").can_repeat(),
        Kwd::new("CASCADE")
            .depends_on("OWNED BY")
            .docs("Also drop objects that depend on the affected objects"),
        Kwd::new("RESTRICT").depends_on("OWNED BY").exclude_if(["CASCADE"]),
    ]
}

/// `DROP DATABASE [IF EXISTS] name |`
fn after_database_name(cb: &CodeBlock) -> bool {
    cb.ltoken()
        .is_some_and(|t| t.kind.is_word() && !t.is_any(&["database", "if", "exists"]))
        && cb.l1token().is_some_and(|t| t.is_any(&["database", "exists"]))
}

/// PROCEDURE and AGGREGATE only list routines of that kind.
fn fits_routine_phrase(phrase: &str, item: &CompletionItem) -> bool {
    let Some(info) = item.source.as_ref().and_then(|s| s.function_info()) else {
        return true;
    };
    match phrase {
        "PROCEDURE" => info.kind == FunctionKind::Procedure,
        "AGGREGATE" => info.kind == FunctionKind::Aggregate,
        "FUNCTION" => info.kind != FunctionKind::Procedure,
        _ => true,
    }
}

/// Inserts what DROP needs to identify the object: the argument types of a
/// routine, or the table of a policy, trigger or rule.
fn drop_target(item: CompletionItem) -> CompletionItem {
    if item.insert_text.trim() == "IF EXISTS" {
        return item.sort("zz");
    }
    let Some(source) = item.source.clone() else {
        return item;
    };
    if let Some(info) = source.function_info() {
        let insert = match info.arg_types.is_empty() {
            true => source.escaped.clone(),
            false => format!("{}({})", source.escaped, info.arg_types.join(", ")),
        };
        return item.insert(insert);
    }
    match (&source.parent, source.object_type) {
        (Some(table), ObjectType::Policy | ObjectType::Trigger | ObjectType::Rule) => {
            let insert = format!("{} ON {}", item.insert_text, escape_identifier(table));
            item.insert(insert)
        }
        _ => item,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn drop(sql: &str) -> Vec<CompletionItem> {
        let catalog = fixture_catalog();
        let cb = at_caret(sql);
        result(MatchContext::new(&cb, &catalog))
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    fn insert_of<'a>(items: &'a [CompletionItem], label: &str) -> &'a str {
        &items.iter().find(|i| i.label == label).unwrap().insert_text
    }

    #[test]
    fn object_phrases() {
        let items = drop("DROP |");
        let names = labels(&items);
        assert!(names.contains(&"TABLE"));
        assert!(names.contains(&"MATERIALIZED VIEW IF EXISTS"));
        assert_eq!(names.last(), Some(&"OWNED BY"));
    }

    #[test]
    fn tables_then_options() {
        let items = drop("DROP TABLE |");
        let names = labels(&items);
        assert!(names.contains(&"users"));
        assert!(names.contains(&"archive.old_orders"));
        let if_exists = items.iter().find(|i| i.label == "IF EXISTS").unwrap();
        assert_eq!(if_exists.sort_text, "zz");

        assert_eq!(labels(&drop("DROP TABLE users |")), vec![",", "CASCADE", "RESTRICT"]);
        assert_eq!(labels(&drop("DROP TABLE users CASCADE |")), Vec::<&str>::new());
        assert!(labels(&drop("DROP TABLE IF EXISTS users, |")).contains(&"t1"));
    }

    #[rstest]
    #[case("DROP ROLE |")]
    #[case("DROP USER |")]
    #[case("DROP ROLE IF EXISTS |")]
    #[case("DROP USER app_user, |")]
    fn role_synonyms_never_follow_each_other(#[case] sql: &str) {
        let items = drop(sql);
        let names = labels(&items);
        assert!(names.contains(&"app_user"));
        assert!(!names.contains(&"USER"));
        assert!(!names.contains(&"ROLE"));
    }

    #[rstest]
    #[case("DROP ROLE app_user |")]
    #[case("DROP USER app_user |")]
    fn role_synonyms_are_part_of_the_grammar(#[case] sql: &str) {
        assert_eq!(labels(&drop(sql)), vec![",", "CASCADE", "RESTRICT"]);
    }

    #[test]
    fn attached_objects_name_their_table() {
        let items = drop("DROP POLICY |");
        assert_eq!(insert_of(&items, "users_own_rows"), "users_own_rows ON users");

        let items = drop("DROP TRIGGER IF EXISTS |");
        assert_eq!(insert_of(&items, "orders_audit"), "orders_audit ON orders");
    }

    #[test]
    fn routines_are_dropped_by_signature() {
        let items = drop("DROP PROCEDURE |");
        assert_eq!(labels(&items), vec!["IF EXISTS", "refresh_totals(days integer)"]);
        assert_eq!(insert_of(&items, "refresh_totals(days integer)"), "refresh_totals(integer)");

        let names = labels(&drop("DROP AGGREGATE |")).into_iter().map(str::to_string).collect::<Vec<_>>();
        assert!(names.iter().any(|n| n.starts_with("count(")));
        assert!(!names.iter().any(|n| n.starts_with("lower(")));
    }

    #[test]
    fn only_installed_extensions() {
        let items = drop("DROP EXTENSION |");
        let names = labels(&items);
        assert!(names.contains(&"plpgsql"));
        assert!(!names.contains(&"pgcrypto"));
    }

    #[rstest]
    #[case("DROP DATABASE analytics |")]
    #[case("DROP DATABASE IF EXISTS analytics |")]
    fn database_force(#[case] sql: &str) {
        assert_eq!(labels(&drop(sql)), vec!["WITH (FORCE)"]);
    }

    #[test]
    fn owned_by() {
        assert_eq!(labels(&drop("DROP OWNED |")), vec!["BY"]);
        assert!(labels(&drop("DROP OWNED BY |")).contains(&"postgres"));
        assert_eq!(labels(&drop("DROP OWNED BY app_user |")), vec![",", "CASCADE", "RESTRICT"]);
    }
}
