//! `GRANT` and `REVOKE`, for object privileges and for role membership.
use super::*;
use std::sync::LazyLock;

/// Privilege, its documentation and the object classes it applies to.
const PRIVILEGES: &[(&str, &str, &[&str])] = &[
    ("SELECT", "Read any or the listed columns. Also allows COPY TO", &["TABLE", "SEQUENCE"]),
    ("INSERT", "Insert rows, optionally only into the listed columns. Also allows COPY FROM", &["TABLE"]),
    ("UPDATE", "Update any or the listed columns", &["TABLE", "SEQUENCE"]),
    ("DELETE", "Delete rows", &["TABLE"]),
    ("TRUNCATE", "Truncate the table", &["TABLE"]),
    ("REFERENCES", "Create foreign keys referencing the table", &["TABLE"]),
    ("TRIGGER", "Create triggers on the table", &["TABLE"]),
    ("CREATE", "Create schemas and publications in a database, or objects in a schema", &["DATABASE", "SCHEMA", "TABLESPACE"]),
    ("CONNECT", "Connect to the database", &["DATABASE"]),
    ("TEMPORARY", "Create temporary tables while using the database", &["DATABASE"]),
    ("EXECUTE", "Call the function or procedure", &["FUNCTION"]),
    ("USAGE", "Look up objects in a schema, use a sequence or a type", &["SCHEMA", "SEQUENCE", "TYPE"]),
    ("SET", "Set a superuser-only parameter within the session", &["PARAMETER"]),
    ("ALTER SYSTEM", "Configure the parameter with ALTER SYSTEM", &["PARAMETER"]),
    ("ALL PRIVILEGES", "Every privilege that applies to the object type", &[]),
    ("ALL", "Every privilege that applies to the object type", &[]),
];

/// Privileges that accept a column list.
const COLUMN_PRIVILEGES: &[&str] = &["select", "insert", "update", "references"];

/// Object phrases after `ON`: the phrase, what follows it and its class.
const TARGETS: &[(&str, &str, &str)] = &[
    ("ALL TABLES IN SCHEMA", "schema", "TABLE"),
    ("ALL SEQUENCES IN SCHEMA", "schema", "SEQUENCE"),
    ("ALL FUNCTIONS IN SCHEMA", "schema", "FUNCTION"),
    ("ALL PROCEDURES IN SCHEMA", "schema", "FUNCTION"),
    ("TABLE", "tableOrView", "TABLE"),
    ("SEQUENCE", "sequence", "SEQUENCE"),
    ("DATABASE", "database", "DATABASE"),
    ("SCHEMA", "schema", "SCHEMA"),
    ("TABLESPACE", "tablespace", "TABLESPACE"),
    ("FUNCTION", "function", "FUNCTION"),
    ("PROCEDURE", "procedure", "FUNCTION"),
    ("ROUTINE", "function", "FUNCTION"),
    ("TYPE", "dataType", "TYPE"),
    ("DOMAIN", "dataType", "TYPE"),
    ("PARAMETER", "setting", "PARAMETER"),
];

fn role_kwds(is_grant: bool) -> Vec<Kwd> {
    let (command, target) = if is_grant { ("GRANT", "TO") } else { ("REVOKE", "FROM") };
    let mut kwds = vec![
        Kwd::new(command).expects("role"),
        Kwd::new(",").expects("role").can_repeat().exclude_if([target]),
        Kwd::new(target).expects("role"),
    ];
    match is_grant {
        true => kwds.push(
            Kwd::new("WITH ADMIN OPTION")
                .depends_on(target)
                .optional()
                .docs("Members may in turn grant membership in the role to others"),
        ),
        false => kwds.extend([
            Kwd::new("CASCADE").depends_on(target),
            Kwd::new("RESTRICT").depends_on(target).exclude_if(["CASCADE"]),
        ]),
    }
    kwds
}

static GRANT_ROLE_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| role_kwds(true));
static REVOKE_ROLE_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| role_kwds(false));

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let is_grant = cb.ftoken().is_some_and(|t| t.is("grant"));
    if cb.ltoken().is_some_and(|t| t.is("parameter")) {
        return setting_items(ctx.catalog);
    }
    if !cb.curr_nesting_id.is_top() {
        let in_column_list = cb
            .curr_nesting_func
            .as_ref()
            .is_some_and(|f| COLUMN_PRIVILEGES.contains(&f.text_lc.as_str()));
        return match in_column_list {
            true => ctx.expected(ObjectType::Column),
            false => vec![],
        };
    }

    let prev: Vec<&Token> = cb.prev_tokens().iter().filter(|t| t.nesting_id.is_top()).collect();
    let Some(on_idx) = prev.iter().position(|t| t.is("on")) else {
        let head = privilege_head(&prev);
        if head.first().is_some_and(|t| !is_privilege_word(t)) {
            let kwds: &[Kwd] = if is_grant { &GRANT_ROLE_KWDS } else { &REVOKE_ROLE_KWDS };
            return ctx.with_kwds(kwds, KwdOpts::default()).suggestion(None, &[]);
        }
        return privileges(ctx, is_grant, &head);
    };

    let target = target_at(&prev[on_idx + 1..]);
    let kwds = target_kwds(is_grant, target);
    with_kwds(&kwds, cb, ctx.catalog, KwdOpts::default()).suggestion(None, &[])
}

/// Top-level tokens between the command and `ON`, without `GRANT OPTION FOR`.
fn privilege_head<'a>(prev: &[&'a Token]) -> Vec<&'a Token> {
    let head = prev.get(1..).unwrap_or_default();
    let words: Vec<&str> = head.iter().take(3).map(|t| t.text_lc.as_str()).collect();
    match words.as_slice() {
        ["grant", "option", "for"] => head[3..].to_vec(),
        _ => head.to_vec(),
    }
}

fn is_privilege_word(t: &Token) -> bool {
    t.kind.is_paren()
        || t.kind == TokenKind::Comma
        || t.is_any(&["privileges", "system", "grant"])
        || PRIVILEGES
            .iter()
            .any(|(p, _, _)| p.split(' ').any(|w| t.is(w)))
}

fn privileges(ctx: MatchContext<'_>, is_grant: bool, head: &[&Token]) -> Vec<CompletionItem> {
    let written: Vec<&str> = head.iter().map(|t| t.text_lc.as_str()).collect();
    match head.last() {
        None => {
            let mut items = privilege_snippets(&[]);
            if !is_grant {
                items.insert(
                    0,
                    CompletionItem::keyword("GRANT OPTION FOR")
                        .docs("Only revoke the right to grant the privilege onwards")
                        .sort("!"),
                );
            }
            items.extend(ctx.expected(ObjectType::Role).into_iter().map(|i| {
                let sort = format!("b{}", i.sort_text);
                i.sort(sort)
            }));
            items
        }
        Some(t) if t.kind == TokenKind::Comma => privilege_snippets(&written)
            .into_iter()
            .filter(|i| !i.label.starts_with("ALL"))
            .collect(),
        Some(t) if t.is("alter") => suggest_kwds(&["SYSTEM"]),
        Some(t) => {
            let all = written.first().is_some_and(|w| *w == "all");
            let mut items = match all {
                true => suggest_kwds(&["ON"]),
                false => suggest_kwds(&["ON", ","]),
            };
            if t.is_any(COLUMN_PRIVILEGES) {
                items.extend(column_grants(ctx.catalog));
            }
            items
        }
    }
}

fn privilege_snippets(written: &[&str]) -> Vec<CompletionItem> {
    suggest_snippets(
        PRIVILEGES
            .iter()
            .filter(|(p, _, _)| !written.contains(&p.to_lowercase().as_str()))
            .map(|(p, docs, _)| Snippet::new(*p).docs(*docs)),
    )
}

/// `(column) ON table` for every known column.
fn column_grants(catalog: &Catalog) -> Vec<CompletionItem> {
    catalog
        .of_type(ObjectType::Column)
        .filter_map(|c| {
            let table = c.parent.as_deref()?;
            let table = match c.schema.as_deref() {
                Some(s) if s != "public" => format!("{}.{}", escape_identifier(s), escape_identifier(table)),
                _ => escape_identifier(table),
            };
            Some(
                CompletionItem::from_entry(c)
                    .insert(format!("({}) ON {table}", c.escaped_name))
                    .detail(table)
                    .sort("b"),
            )
        })
        .collect()
}

/// The object phrase right after `ON`, longest first.
fn target_at(tail: &[&Token]) -> Option<(&'static str, &'static str)> {
    TARGETS
        .iter()
        .filter(|(phrase, _, _)| {
            let words: Vec<&str> = phrase.split(' ').collect();
            words.len() <= tail.len() && words.iter().zip(tail).all(|(w, t)| t.is(w))
        })
        .max_by_key(|(phrase, _, _)| phrase.len())
        .map(|(phrase, expect, _)| (*phrase, *expect))
}

fn target_kwds(is_grant: bool, target: Option<(&str, &str)>) -> Vec<Kwd> {
    let to = if is_grant { "TO" } else { "FROM" };
    let expect = target.map_or("tableOrView", |(_, e)| e);
    let mut kwds = vec![Kwd::new("ON").dynamic_options(on_targets)];
    if let Some((phrase, expect)) = target {
        kwds.push(Kwd::new(phrase).expects(expect));
    }
    kwds.extend([
        Kwd::new(",").expects(expect).can_repeat().exclude_if([to]),
        Kwd::new(to)
            .expects("role")
            .options([Snippet::new("PUBLIC").docs("Every role, including those created later")]),
    ]);
    match is_grant {
        true => kwds.push(
            Kwd::new("WITH GRANT OPTION")
                .depends_on(to)
                .optional()
                .docs("The recipient may in turn grant the privilege to others"),
        ),
        false => kwds.extend([
            Kwd::new("CASCADE").depends_on(to),
            Kwd::new("RESTRICT").depends_on(to).exclude_if(["CASCADE"]),
        ]),
    }
    kwds
}

/// Object phrases and relations that suit the privileges written before `ON`.
fn on_targets(catalog: &Catalog, cb: &CodeBlock) -> Vec<CompletionItem> {
    let top: Vec<&Token> = cb
        .prev_tokens()
        .iter()
        .filter(|t| t.nesting_id.is_top())
        .take_while(|t| !t.is("on"))
        .collect();
    let text = format!(
        " {} ",
        top.iter().map(|t| t.text_lc.as_str()).collect::<Vec<_>>().join(" ")
    );
    let classes: Vec<&str> = PRIVILEGES
        .iter()
        .filter(|(p, _, _)| text.contains(&format!(" {} ", p.to_lowercase())))
        .flat_map(|(_, _, objects)| objects.iter().copied())
        .collect();
    let all = text.contains(" all ");
    let allowed = |class: &str| all || classes.contains(&class);

    let mut items = suggest_snippets(
        TARGETS
            .iter()
            .filter(|(_, _, class)| allowed(class))
            .map(|(phrase, _, _)| Snippet::new(*phrase)),
    );
    for item in &mut items {
        item.sort_text = format!("!{}", item.sort_text);
    }
    if !allowed("TABLE") {
        return items;
    }

    let columns: Vec<String> = cb
        .prev_tokens()
        .iter()
        .filter(|t| !t.nesting_id.is_top() && t.is_identifier())
        .map(|t| unquote_identifier(&t.text))
        .collect();
    items.extend(get_expected(&"tableOrView".into(), cb, catalog).into_iter().map(|i| {
        let has_columns = i
            .source
            .as_ref()
            .and_then(|s| s.table_info())
            .is_some_and(|t| columns.iter().all(|c| t.columns.iter().any(|tc| tc.name == *c)));
        let sort = format!("{}{}", if has_columns { "a" } else { "b" }, i.sort_text);
        i.sort(sort)
    }));
    items
}
