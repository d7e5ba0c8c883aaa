//! `ALTER` statements.
//!
//! The object phrase and name sit at fixed positions, so the flow branches
//! on them before looking at the action. Tables, roles, databases, policies
//! and `ALTER SYSTEM` have their own action grammars; other objects share
//! the rename / owner / schema actions.
use super::create::{COLUMN_CONSTRAINTS, column_definitions, referenced_columns, role_options};
use super::set::assignment;
use super::*;
use std::sync::LazyLock;

pub(crate) fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let words = prev_words(cb);
    if words == "alter" {
        return object_snippets();
    }
    if words.starts_with("alter system") {
        return system(ctx);
    }
    let Some((phrase, object_type, len)) = object_at(cb, 1) else {
        return vec![];
    };

    let prev = cb.prev_tokens();
    if prev.len() == 1 + len {
        let mut items = ctx.expected(object_type);
        items.push(CompletionItem::keyword("IF EXISTS").sort("0"));
        if phrase == "TABLE" {
            items.push(CompletionItem::keyword("ONLY").sort("0"));
        }
        return items;
    }
    let mut name_idx = 1 + len;
    if prev.get(name_idx).is_some_and(|t| t.is("if")) {
        name_idx += 2;
    }
    if prev.get(name_idx).is_some_and(|t| t.is("only")) {
        name_idx += 1;
    }
    let typing_schema = typed_schema(cb).is_some() && prev.len() <= name_idx + 2;
    if prev.len() <= name_idx || typing_schema {
        return match words.ends_with("if") || words.ends_with("if not") {
            true => suggest_kwds(&["EXISTS"]),
            false => ctx.expected(object_type),
        };
    }
    let name_len = match prev.get(name_idx + 1) {
        Some(t) if t.kind == TokenKind::Dot => 3,
        _ => 1,
    };
    if prev.len() < name_idx + name_len {
        return ctx.expected(object_type);
    }
    let target = Target {
        name_idx,
        rest_idx: name_idx + name_len,
    };
    trace!("ALTER {phrase}, actions from token {}", target.rest_idx);

    if let Some(items) = common_action(&ctx) {
        return items;
    }
    match phrase {
        "TABLE" => table(ctx, target),
        "ROLE" | "USER" => role(ctx, target),
        "DATABASE" => database(ctx, target),
        "POLICY" => ctx.with_kwds(&ALTER_POLICY_KWDS, KwdOpts::default()).suggestion(None, &[]),
        "TRIGGER" | "RULE" => attached(ctx, target),
        _ => generic(ctx, phrase, target),
    }
}

/// Token positions of the altered object's name and of the first action word.
#[derive(Debug, Clone, Copy)]
struct Target {
    name_idx: usize,
    rest_idx: usize,
}

impl Target {
    /// Top-level words of the action being written, after the last comma.
    fn action<'a>(&self, cb: &'a CodeBlock) -> Vec<&'a Token> {
        let top: Vec<&Token> = cb.prev_tokens()[self.rest_idx..]
            .iter()
            .filter(|t| t.nesting_id.is_top())
            .collect();
        since_last_comma(&top)
            .into_iter()
            .filter(|t| !t.kind.is_paren())
            .collect()
    }

    fn is_first_action(&self, cb: &CodeBlock) -> bool {
        cb.prev_tokens().len() == self.rest_idx
    }
}

fn object_snippets() -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = PG_OBJECTS
        .iter()
        .flat_map(|(phrase, object_type)| {
            let kind = ItemKind::for_type(*object_type);
            [
                CompletionItem::keyword(*phrase).insert(format!("{phrase} ")).kind(kind),
                CompletionItem::keyword(format!("{phrase} IF EXISTS"))
                    .insert(format!("{phrase} IF EXISTS "))
                    .kind(kind),
            ]
        })
        .collect();
    items.push(CompletionItem::keyword("SYSTEM").insert("SYSTEM ").docs("Change a server configuration parameter"));
    suggest_ordered(items)
}

/// Actions whose input does not depend on the object type.
fn common_action(ctx: &MatchContext<'_>) -> Option<Vec<CompletionItem>> {
    let words = prev_words(ctx.cb);
    let ends = |suffix: &str| words.ends_with(suffix);
    let items = if ends("rename to") {
        suggest_kwds(&["$new_name"])
    } else if ends("owner to") {
        ctx.expected("owner")
    } else if ends("set schema") {
        ctx.expected("schema")
    } else if ends("set tablespace") {
        ctx.expected("tablespace")
    } else if ends("depends on extension") {
        ctx.expected("extension")
    } else if ends("set storage") {
        suggest_kwds(&["PLAIN", "EXTERNAL", "EXTENDED", "MAIN"])
    } else if ends(" type") && words.contains(" column ") {
        ctx.expected("dataType")
    } else {
        return None;
    };
    Some(items)
}

const TABLE_ACTIONS: &[(&str, &str)] = &[
    ("ADD COLUMN", "Add a new column"),
    ("DROP COLUMN", "Drop a column along with its indexes and constraints"),
    ("ALTER COLUMN", "Change a column's type, default or nullability"),
    ("RENAME COLUMN", "Rename a column"),
    ("ADD CONSTRAINT", "Add a table constraint"),
    ("DROP CONSTRAINT", "Drop a table constraint"),
    ("RENAME TO", "Rename the table"),
    ("OWNER TO", "Change the owner of the table"),
    ("SET SCHEMA", "Move the table to another schema"),
    ("SET TABLESPACE", "Move the table's data files to another tablespace"),
    ("ENABLE ROW LEVEL SECURITY", "Apply the table's policies to non-owner roles"),
    ("DISABLE ROW LEVEL SECURITY", "Stop applying the table's policies"),
    ("FORCE ROW LEVEL SECURITY", "Apply the table's policies to the owner too"),
    ("ENABLE TRIGGER", "Fire a disabled trigger again"),
    ("DISABLE TRIGGER", "Stop firing a trigger"),
    ("SET LOGGED", "Write changes to the write-ahead log"),
    ("SET UNLOGGED", "Stop writing changes to the write-ahead log"),
    ("ATTACH PARTITION", "Attach a table as a partition"),
    ("DETACH PARTITION", "Detach a partition into a standalone table"),
];

const ALTER_COLUMN_ACTIONS: &[&str] = &[
    "SET DATA TYPE",
    "TYPE",
    "SET DEFAULT",
    "DROP DEFAULT",
    "SET NOT NULL",
    "DROP NOT NULL",
    "ADD GENERATED ALWAYS AS IDENTITY",
    "DROP IDENTITY",
    "SET STATISTICS",
    "SET STORAGE",
];

/// `ALTER TABLE [IF EXISTS] [ONLY] name action [, ...]`
fn table(ctx: MatchContext<'_>, target: Target) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let table = written_name(&cb.prev_tokens()[target.name_idx..]).and_then(|n| ctx.catalog.find_table(&n));
    let columns = || table.map_or_else(Vec::new, |t| table_columns(ctx.catalog, t, &[]));
    let children = |object_type: ObjectType| match table {
        Some(t) => ctx
            .catalog
            .of_type(object_type)
            .filter(|e| e.parent.as_deref() == Some(t.name.as_str()))
            .map(CompletionItem::from_entry)
            .collect(),
        None => ctx.expected(object_type),
    };

    if !cb.curr_nesting_id.is_top() {
        if let Some(items) = referenced_columns(ctx) {
            return items;
        }
        let mut items = columns();
        if cb.curr_nesting_func.as_ref().is_some_and(|f| f.text_lc == "check") {
            items.extend(ctx.expected("function").into_iter().map(|i| i.sort("b")));
        }
        return items;
    }

    let action = target.action(cb);
    let words: Vec<&str> = action.iter().map(|t| t.text_lc.as_str()).collect();
    match words.as_slice() {
        [] => suggest_snippets(TABLE_ACTIONS.iter().map(|(label, docs)| {
            Snippet::new(*label).insert(format!("{label} ")).docs(*docs)
        })),
        ["add"] => suggest_kwds(&["COLUMN", "CONSTRAINT", "COLUMN IF NOT EXISTS"]),
        ["add", "column", "if", "not", "exists", rest @ ..] | ["add", "column", rest @ ..] => {
            add_column(ctx, table, rest)
        }
        ["add", "constraint"] => suggest_kwds(&["$constraint_name"]),
        ["add", "constraint", .., "references"] => ctx.expected("table"),
        ["add", "constraint", _] => suggest_snippets([
            Snippet::new("PRIMARY KEY ( ... )").insert("PRIMARY KEY ( $0 )"),
            Snippet::new("FOREIGN KEY ( ... ) REFERENCES")
                .insert("FOREIGN KEY ( $1 ) REFERENCES ${2:table_name} ( $3 )"),
            Snippet::new("UNIQUE ( ... )").insert("UNIQUE ( $0 )"),
            Snippet::new("CHECK ( ... )").insert("CHECK ( $0 )"),
        ]),
        ["drop"] => suggest_kwds(&["COLUMN", "CONSTRAINT"]),
        ["drop", "column"] | ["drop", "column", "if", "exists"] => columns(),
        ["drop", "constraint"] | ["drop", "constraint", "if", "exists"] => children(ObjectType::Constraint),
        ["drop", "column" | "constraint", ..] => suggest_kwds(&["CASCADE", "RESTRICT", ","]),
        ["alter"] => {
            let mut items = suggest_kwds(&["COLUMN"]);
            items.extend(columns());
            items
        }
        ["alter", "column"] => columns(),
        ["alter", rest @ ..] => {
            let rest = match rest {
                ["column", rest @ ..] => rest,
                _ => rest,
            };
            match rest {
                [_] => suggest_kwds(ALTER_COLUMN_ACTIONS),
                [_, "set"] => suggest_kwds(&["DEFAULT", "NOT NULL", "DATA TYPE", "STORAGE", "STATISTICS"]),
                [_, "drop"] => suggest_kwds(&["DEFAULT", "NOT NULL", "IDENTITY IF EXISTS", "EXPRESSION"]),
                [_, "set", "default"] => {
                    let mut items = suggest_kwds(&["NULL"]);
                    items.extend(ctx.expected("function").into_iter().map(|i| i.sort("b")));
                    items
                }
                [_, "set", "statistics"] => suggest_kwds(&["100", "1000", "-1"]),
                _ => vec![],
            }
        }
        ["rename"] => {
            let mut items = suggest_kwds(&["COLUMN", "CONSTRAINT", "TO"]);
            items.extend(columns());
            items
        }
        ["rename", "column"] => columns(),
        ["rename", "constraint"] => children(ObjectType::Constraint),
        ["rename", _] | ["rename", "column" | "constraint", _] => suggest_kwds(&["TO"]),
        ["owner"] => suggest_kwds(&["TO"]),
        ["set"] => suggest_snippets([
            Snippet::new("SCHEMA"),
            Snippet::new("TABLESPACE"),
            Snippet::new("LOGGED"),
            Snippet::new("UNLOGGED"),
            Snippet::new("( storage_parameter = value )").insert("( ${1:fillfactor} = ${2:70} )"),
        ]),
        ["enable" | "disable"] => suggest_kwds(&["TRIGGER", "ROW LEVEL SECURITY", "RULE"]),
        ["enable" | "disable", "trigger"] => {
            let mut items = children(ObjectType::Trigger);
            items.extend(
                suggest_kwds(&["ALL", "USER"])
                    .into_iter()
                    .map(|i| i.docs("ALL includes constraint triggers; USER excludes them").sort("b")),
            );
            items
        }
        ["enable" | "disable", "rule"] => children(ObjectType::Rule),
        _ => vec![],
    }
}

/// Column definition after `ADD COLUMN`, skipping names the table already has.
fn add_column(ctx: MatchContext<'_>, table: Option<&Arc<Entry>>, rest: &[&str]) -> Vec<CompletionItem> {
    match rest.len() {
        0 => {
            let existing: Vec<&str> = table
                .map(|t| ctx.catalog.columns_of(t))
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.name.as_str())
                .collect();
            column_definitions(ctx.catalog, &[], false)
                .into_iter()
                .filter(|i| {
                    let name = i.label.split_whitespace().next().unwrap_or_default();
                    !existing.contains(&name)
                })
                .collect()
        }
        1 => ctx.expected("dataType"),
        _ => {
            let opts = KwdOpts {
                not_ordered: true,
                top_reset_kwd: Some(","),
            };
            ctx.with_kwds(&COLUMN_CONSTRAINTS, opts).suggestion(None, &[])
        }
    }
}

/// `ALTER {ROLE | USER} name [WITH] option ... | RENAME TO | SET | RESET`
fn role(ctx: MatchContext<'_>, target: Target) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if target.is_first_action(cb) {
        let mut items = suggest_kwds(&["WITH", "RENAME TO", "SET", "RESET", "IN DATABASE"]);
        items.extend(role_options(&ctx).into_iter().map(|i| {
            let sort = format!("b{}", i.sort_text);
            i.sort(sort)
        }));
        return items;
    }
    let action = target.action(cb);
    if let Some(items) = settings(ctx, &action) {
        return items;
    }
    if action.first().is_some_and(|t| t.is("in")) {
        return match action.len() {
            1 => suggest_kwds(&["DATABASE"]),
            2 => ctx.expected("database"),
            _ => suggest_kwds(&["SET", "RESET"]),
        };
    }
    role_options(&ctx)
}

/// `SET name {TO | =} value`, `RESET name`, `RESET ALL` somewhere in `action`.
fn settings(ctx: MatchContext<'_>, action: &[&Token]) -> Option<Vec<CompletionItem>> {
    let idx = action.iter().position(|t| t.is_any(&["set", "reset"]))?;
    let after = &action[idx + 1..];
    if action[idx].is("reset") {
        return Some(match after {
            [] => {
                let mut items = suggest_kwds(&["ALL"]);
                items.extend(setting_items(ctx.catalog));
                items
            }
            _ => vec![],
        });
    }
    Some(assignment(ctx.catalog, after))
}

const DATABASE_ACTIONS: &[&str] = &[
    "RENAME TO",
    "OWNER TO",
    "SET TABLESPACE",
    "REFRESH COLLATION VERSION",
    "SET",
    "RESET",
    "RESET ALL",
    "WITH",
];

/// `ALTER DATABASE name action`
fn database(ctx: MatchContext<'_>, target: Target) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if target.is_first_action(cb) {
        return suggest_kwds(DATABASE_ACTIONS);
    }
    let action = target.action(cb);
    if action.first().is_some_and(|t| t.is("with")) {
        return suggest_kwds(&["ALLOW_CONNECTIONS", "CONNECTION LIMIT", "IS_TEMPLATE"]);
    }
    settings(ctx, &action).unwrap_or_default()
}

static ALTER_POLICY_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    let condition = || [Snippet::new("( condition )").insert("( $0 )")];
    vec![
        Kwd::new("ON").expects("table"),
        Kwd::new("RENAME TO").options(["$new_name"]).depends_on("ON"),
        Kwd::new("TO")
            .expects("role")
            .depends_on("ON")
            .exclude_if(["RENAME TO"]),
        Kwd::new("USING")
            .options(condition())
            .depends_on("ON")
            .exclude_if(["RENAME TO"]),
        Kwd::new("WITH CHECK")
            .options(condition())
            .depends_on("ON")
            .exclude_if(["RENAME TO"]),
    ]
});

/// `ALTER {TRIGGER | RULE} name ON table RENAME TO new_name`
fn attached(ctx: MatchContext<'_>, target: Target) -> Vec<CompletionItem> {
    let action = target.action(ctx.cb);
    match action.as_slice() {
        [] => suggest_kwds(&["ON"]),
        [on] if on.is("on") => ctx.expected("table"),
        [on, ..] if on.is("on") => suggest_kwds(&["RENAME TO", "DEPENDS ON EXTENSION"]),
        _ => vec![],
    }
}

/// Objects sharing the basic rename / owner / schema actions.
fn generic(ctx: MatchContext<'_>, phrase: &str, target: Target) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if !target.is_first_action(cb) {
        return match target.action(cb).as_slice() {
            [t] if t.is("owner") => suggest_kwds(&["TO"]),
            [t] if t.is("rename") => suggest_kwds(&["TO"]),
            [t] if t.is("set") => suggest_kwds(&["SCHEMA"]),
            _ => vec![],
        };
    }
    let actions: &[&str] = match phrase {
        "FUNCTION" | "PROCEDURE" | "AGGREGATE" => &[
            "RENAME TO",
            "OWNER TO",
            "SET SCHEMA",
            "DEPENDS ON EXTENSION",
            "SECURITY DEFINER",
            "SECURITY INVOKER",
        ],
        "INDEX" => &["RENAME TO", "SET TABLESPACE", "ATTACH PARTITION", "DEPENDS ON EXTENSION"],
        "MATERIALIZED VIEW" => &["RENAME TO", "OWNER TO", "SET SCHEMA", "SET TABLESPACE", "RENAME COLUMN"],
        "VIEW" => &["RENAME TO", "OWNER TO", "SET SCHEMA", "RENAME COLUMN", "ALTER COLUMN"],
        "SEQUENCE" => &[
            "RESTART",
            "INCREMENT BY",
            "MINVALUE",
            "MAXVALUE",
            "OWNED BY",
            "RENAME TO",
            "OWNER TO",
            "SET SCHEMA",
        ],
        "EXTENSION" => &["UPDATE", "UPDATE TO", "SET SCHEMA", "ADD", "DROP"],
        "SCHEMA" | "TABLESPACE" | "PUBLICATION" | "SUBSCRIPTION" | "EVENT TRIGGER" => &["RENAME TO", "OWNER TO"],
        _ => &["RENAME TO", "OWNER TO", "SET SCHEMA"],
    };
    suggest_snippets(actions.iter().map(|a| Snippet::new(*a).insert(format!("{a} "))))
}

/// `ALTER SYSTEM {SET name {TO | =} value | RESET name | RESET ALL}`
fn system(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let action: Vec<&Token> = cb.prev_tokens().iter().skip(2).collect();
    if action.is_empty() {
        return suggest_kwds(&["SET", "RESET", "RESET ALL"]);
    }
    settings(ctx, &action).unwrap_or_default()
}
