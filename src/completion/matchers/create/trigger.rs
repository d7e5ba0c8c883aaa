//! Objects attached to a table: `CREATE TRIGGER`, `CREATE POLICY` and
//! `CREATE RULE`.
use super::*;

const EVENTS: &[&str] = &["INSERT", "UPDATE", "UPDATE OF", "DELETE", "TRUNCATE"];

fn has_timing(cb: &CodeBlock) -> bool {
    cb.prev_tokens()
        .iter()
        .any(|t| t.nesting_id.is_top() && t.is_any(&["before", "after", "instead"]))
}

static TRIGGER_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("BEFORE")
            .options(EVENTS.iter().copied())
            .exclude_if(["AFTER", "INSTEAD OF"])
            .docs("Fire before the operation is attempted on a row"),
        Kwd::new("AFTER")
            .options(EVENTS.iter().copied())
            .exclude_if(["BEFORE", "INSTEAD OF"])
            .docs("Fire after the operation has completed"),
        Kwd::new("INSTEAD OF")
            .options(EVENTS.iter().copied())
            .exclude_if(["BEFORE", "AFTER"])
            .docs("Replace the operation. Only for row-level triggers on views."),
        Kwd::new("OR")
            .options(EVENTS.iter().copied())
            .exactly_after(["INSERT", "UPDATE", "DELETE", "TRUNCATE"])
            .can_repeat(),
        Kwd::new("ON").expects("table").include_when(has_timing),
        Kwd::new("FOR EACH")
            .options([
                Snippet::new("ROW").docs("Fire once for every modified row"),
                Snippet::new("STATEMENT").docs("Fire once per statement. This is the default."),
            ])
            .depends_on("ON")
            .optional(),
        Kwd::new("WHEN")
            .options([Snippet::new("( condition )").insert("( $0 )")])
            .depends_on("ON")
            .optional()
            .docs("Fire only when the condition on NEW and OLD holds"),
        Kwd::new("EXECUTE FUNCTION")
            .dynamic_options(trigger_functions)
            .depends_on("ON"),
    ]
});

/// Functions returning `trigger`.
fn trigger_functions(catalog: &Catalog, _cb: &CodeBlock) -> Vec<CompletionItem> {
    let items: Vec<CompletionItem> = catalog
        .of_type(ObjectType::Function)
        .filter(|f| f.function_info().is_some_and(|info| info.returns.eq_ignore_ascii_case("trigger")))
        .map(CompletionItem::from_entry)
        .collect();
    if items.is_empty() {
        return vec![CompletionItem::placeholder("No trigger functions found")];
    }
    items
}

/// `NEW.column` and `OLD.column` for each column of `table`.
fn row_references(catalog: &Catalog, table: Option<&Arc<Entry>>) -> Vec<CompletionItem> {
    let Some(table) = table else {
        return vec![];
    };
    let columns = catalog.columns_of(table);
    ["NEW", "OLD"]
        .into_iter()
        .flat_map(|row| {
            columns.iter().map(move |c| {
                CompletionItem::new(format!("{row}.{}", c.escaped_name), ObjectType::Column)
                    .sort(format!("a{row}"))
            })
        })
        .collect()
}

/// `CREATE TRIGGER name {BEFORE | AFTER | INSTEAD OF} event ON table ...`
pub(super) fn trigger(ctx: MatchContext<'_>, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if cb.prev_tokens().len() == after {
        return suggest_kwds(&["$trigger_name"]);
    }
    if !cb.curr_nesting_id.is_top() {
        return match &cb.curr_nesting_func {
            Some(f) if f.text_lc == "when" => {
                row_references(ctx.catalog, table_after(cb, ctx.catalog, "on"))
            }
            _ => vec![],
        };
    }
    ctx.with_kwds(&TRIGGER_KWDS, KwdOpts::default()).suggestion(None, &[])
}

/// Command a policy applies to, as written after `FOR`.
fn policy_command(cb: &CodeBlock) -> Option<String> {
    let tokens = cb.prev_tokens();
    let idx = tokens.iter().position(|t| t.nesting_id.is_top() && t.is("for"))?;
    tokens.get(idx + 1).map(|t| t.text_lc.clone())
}

static POLICY_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    let condition = || [Snippet::new("( condition )").insert("( $0 )")];
    vec![
        Kwd::new("ON").expects("table"),
        Kwd::new("AS")
            .options([
                Snippet::new("PERMISSIVE").docs("Combined with other permissive policies using OR. This is the default."),
                Snippet::new("RESTRICTIVE").docs("Combined with other policies using AND"),
            ])
            .depends_on("ON")
            .optional(),
        Kwd::new("FOR")
            .options(["ALL", "SELECT", "INSERT", "UPDATE", "DELETE"])
            .depends_on("ON")
            .optional(),
        Kwd::new("TO").expects("role").depends_on("ON").optional(),
        Kwd::new("USING")
            .options(condition())
            .depends_on("ON")
            .exclude_when(|cb| policy_command(cb).is_some_and(|c| c == "insert"))
            .docs("Rows visible to the roles. Existing rows failing it are silently skipped."),
        Kwd::new("WITH CHECK")
            .options(condition())
            .depends_on("ON")
            .exclude_when(|cb| policy_command(cb).is_some_and(|c| c == "select" || c == "delete"))
            .docs("Rows the roles may write. New rows failing it raise an error."),
    ]
});

/// `CREATE POLICY name ON table [AS ...] [FOR ...] [TO ...] [USING (...)] [WITH CHECK (...)]`
pub(super) fn policy(ctx: MatchContext<'_>, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if cb.prev_tokens().len() == after {
        return suggest_kwds(&["$policy_name"]);
    }
    if !cb.curr_nesting_id.is_top() {
        let table = table_after(cb, ctx.catalog, "on");
        let mut items = table.map_or_else(Vec::new, |t| table_columns(ctx.catalog, t, &[]));
        items.extend(
            ["CURRENT_USER", "SESSION_USER"]
                .into_iter()
                .map(|k| CompletionItem::keyword(k).sort("b")),
        );
        items.extend(ctx.expected("function").into_iter().map(|i| i.sort("c")));
        return items;
    }
    ctx.with_kwds(&POLICY_KWDS, KwdOpts::default()).suggestion(None, &[])
}

static RULE_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("AS ON").options(["SELECT", "INSERT", "UPDATE", "DELETE"]),
        Kwd::new("TO").expects("table").depends_on("AS ON"),
        Kwd::new("WHERE")
            .dynamic_options(|catalog, cb| row_references(catalog, table_after(cb, catalog, "to")))
            .depends_on("TO")
            .optional(),
        Kwd::new("DO").depends_on("TO"),
    ]
});

const RULE_ACTIONS: &[&str] = &["SELECT", "INSERT INTO", "UPDATE", "DELETE FROM"];

/// `CREATE RULE name AS ON event TO table [WHERE ...] DO [ALSO | INSTEAD] action`
///
/// Actions are DML statements, alone or in parentheses, and are completed
/// by their own matchers.
pub(super) async fn rule(ctx: MatchContext<'_>, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if cb.prev_tokens().len() == after {
        return suggest_kwds(&["$rule_name"]);
    }
    if let Some(items) = match_nested_group(ctx, &Command::DML, MatchOptions::default()).await {
        return items;
    }

    let prev = cb.prev_tokens();
    let Some(do_idx) = prev.iter().position(|t| t.nesting_id.is_top() && t.is("do")) else {
        return ctx.with_kwds(&RULE_KWDS, KwdOpts::default()).suggestion(None, &[]);
    };
    let action = prev[do_idx + 1..]
        .iter()
        .find(|t| !t.is_any(&["also", "instead"]));
    if let Some(start) = action {
        let end = cb.tokens.last().map_or(start.offset, |t| t.offset);
        let nested = match_nested(ctx, start.offset, end, &Command::DML, MatchOptions::default()).await;
        if let Some(items) = nested {
            return items;
        }
        if start.kind != TokenKind::ParenOpen {
            return vec![];
        }
    }

    let on_paren = cb.curr_token().is_some_and(|t| t.kind == TokenKind::ParenOpen) || action.is_some();
    let mut kwds: Vec<&str> = vec![];
    if !on_paren {
        if cb.ltoken().is_some_and(|t| t.is("do")) {
            kwds.extend(["ALSO", "INSTEAD"]);
        }
        kwds.push("NOTHING");
    }
    kwds.extend(RULE_ACTIONS);
    let mut items = suggest_kwds(&kwds);
    if !on_paren {
        items.push(CompletionItem::keyword("( ... )").insert("(\n  $0\n)").docs("Several actions, separated by semicolons"));
    }
    items
}
