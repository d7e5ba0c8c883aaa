//! `SET`, `SHOW` and `RESET` of run-time settings.
use super::*;

const TIME_ZONES_SQL: &str =
    "SELECT name::text, utc_offset::text FROM pg_timezone_names ORDER BY name";
const CURRENT_USER_SQL: &str = "SELECT current_user::text";

pub(crate) async fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let prev = cb.prev_tokens();
    let Some((command, rest)) = prev.split_first() else {
        return vec![];
    };
    let rest: Vec<&Token> = rest.iter().collect();

    if command.is("show") {
        return match rest.as_slice() {
            [] => with_all(ctx.catalog, &[]),
            _ => vec![],
        };
    }
    if command.is("reset") {
        return match rest.as_slice() {
            [] => with_all(ctx.catalog, &["ROLE", "SESSION AUTHORIZATION"]),
            _ => vec![],
        };
    }

    let scoped = match rest.as_slice() {
        [session, authorization, ..] if session.is("session") && authorization.is("authorization") => &rest[..],
        [scope, ..] if scope.is_any(&["session", "local"]) => &rest[1..],
        _ => &rest[..],
    };
    let words: Vec<&str> = scoped.iter().map(|t| t.text_lc.as_str()).collect();
    match words.as_slice() {
        [] => {
            let mut items = match rest.is_empty() {
                true => suggest_kwds(&["SESSION", "LOCAL", "TIME ZONE", "ROLE", "SESSION AUTHORIZATION"]),
                false => suggest_kwds(&["TIME ZONE", "ROLE", "SESSION AUTHORIZATION"]),
            };
            items.extend(setting_items(ctx.catalog));
            items
        }
        ["time"] => suggest_kwds(&["ZONE"]),
        ["time", "zone"] => time_zones(ctx).await,
        ["role"] => role_or(ctx, "NONE").await,
        ["session", "authorization"] => role_or(ctx, "DEFAULT").await,
        ["search_path", "to" | "=", ..] => search_path(ctx),
        _ => assignment(ctx.catalog, scoped),
    }
}

fn with_all(catalog: &Catalog, extra: &[&str]) -> Vec<CompletionItem> {
    let mut kwds = vec!["ALL"];
    kwds.extend(extra);
    let mut items = suggest_kwds(&kwds);
    items.extend(setting_items(catalog));
    items
}

/// Roles to switch to, with the one the session runs as marked when the
/// server can be asked.
async fn role_or(ctx: MatchContext<'_>, kwd: &str) -> Vec<CompletionItem> {
    let mut items = ctx.expected(ObjectType::Role);
    items.push(CompletionItem::keyword(kwd).sort("d"));
    let Some(live) = ctx.live else {
        return items;
    };
    match live.query(CURRENT_USER_SQL, &[], ReturnType::Value).await {
        Ok(output) => {
            let current = output.into_rows().into_iter().flatten().flatten().next();
            if let Some(item) = current.and_then(|name| items.iter_mut().find(|i| i.label == name)) {
                item.detail = Some("current user".into());
            }
        }
        Err(e) => {
            warn!("Current user lookup failed: {e}");
            items.push(CompletionItem::placeholder(format!("Error: {}", e.hint())));
        }
    }
    items
}

/// `name TO value` or `name = value`, after the setting keyword.
pub(super) fn assignment(catalog: &Catalog, words: &[&Token]) -> Vec<CompletionItem> {
    match words {
        [] => setting_items(catalog),
        [_] => suggest_kwds(&["TO", "="]),
        [name, op] if op.is_any(&["to", "="]) => {
            let values = catalog
                .setting(&unquote_identifier(&name.text))
                .map(|s| setting_values(s))
                .unwrap_or_default();
            match values.len() > 1 {
                true => values,
                false => suggest_kwds(&["$value", "DEFAULT"]),
            }
        }
        _ => vec![],
    }
}

fn search_path(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let after_value = cb
        .ltoken()
        .is_some_and(|t| !t.is_any(&["to", "="]) && t.kind != TokenKind::Comma);
    if after_value && cb.curr_token().is_none() {
        return suggest_kwds(&[","]);
    }
    let mut items = ctx.expected(ObjectType::Schema);
    items.push(
        CompletionItem::keyword("\"$user\"")
            .docs("Schema named after the current user")
            .sort("!"),
    );
    items
}

/// Zone names from the server. A failed lookup leaves an explanatory
/// placeholder next to the fixed choices.
async fn time_zones(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let mut items = suggest_kwds(&["LOCAL", "DEFAULT"]);
    let Some(live) = ctx.live else {
        return items;
    };
    match live.query(TIME_ZONES_SQL, &[], ReturnType::Rows).await {
        Ok(output) => {
            items.extend(output.into_rows().into_iter().filter_map(|row| {
                let mut row = row.into_iter();
                let name = row.next().flatten()?;
                let mut item = CompletionItem::new(format!("'{name}'"), ObjectType::Setting)
                    .kind(ItemKind::Value)
                    .sort("b");
                item.detail = row.next().flatten();
                Some(item)
            }));
        }
        Err(e) => {
            warn!("Time zone lookup failed: {e}");
            items.push(CompletionItem::placeholder(format!("Error: {}", e.hint())));
        }
    }
    items
}
