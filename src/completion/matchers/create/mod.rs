//! `CREATE` statements.
//!
//! Right after `CREATE` the object snippets are offered. Once the object
//! phrase is known the statement is routed to a per-object grammar; the
//! larger ones (tables, indexes, triggers, policies, rules) live in
//! submodules.
mod index;
mod table;
mod trigger;

use super::*;
use std::sync::LazyLock;

pub(super) use table::{COLUMN_CONSTRAINTS, column_definitions, referenced_columns};

/// Words that may sit between `CREATE` and the object phrase.
const MODIFIERS: &[&str] = &[
    "or", "replace", "temp", "temporary", "unlogged", "unique", "recursive", "constraint",
    "global", "local", "trusted", "procedural",
];

const CREATE_OR_REPLACE: &[&str] = &["FUNCTION", "PROCEDURE", "VIEW", "TRIGGER", "RULE", "AGGREGATE"];

pub(crate) async fn result(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    match prev_words(cb).as_str() {
        "create" => return create_snippets(),
        "create or" => return suggest_kwds(&["REPLACE"]),
        "create or replace" => {
            return suggest_snippets(
                CREATE_OR_REPLACE
                    .iter()
                    .map(|w| Snippet::new(*w).insert(format!("{w} "))),
            );
        }
        _ => {}
    }

    let Some((phrase, object_type, after)) = subject(cb) else {
        return vec![];
    };
    trace!("CREATE {phrase}, name at token {after}");
    match phrase {
        "TABLE" => table::result(ctx, after).await,
        "INDEX" => index::result(ctx, after),
        "VIEW" | "MATERIALIZED VIEW" => view(ctx, object_type, after).await,
        "TRIGGER" => trigger::trigger(ctx, after),
        "POLICY" => trigger::policy(ctx, after),
        "RULE" => trigger::rule(ctx, after).await,
        "FUNCTION" | "PROCEDURE" => function(ctx, phrase, after),
        "ROLE" | "USER" => role(ctx, phrase, after),
        "DATABASE" => database(ctx, after),
        "EXTENSION" => extension(ctx),
        "SCHEMA" => schema(ctx, after),
        _ if is_naming(cb, after) => suggest_kwds(&[format!("${}_name", placeholder_word(phrase)).as_str()]),
        _ => vec![],
    }
}

/// Object phrase after `CREATE` and its modifiers, with the index of the
/// token following it.
fn subject(cb: &CodeBlock) -> Option<(&'static str, ObjectType, usize)> {
    let start = 1 + cb
        .tokens
        .iter()
        .skip(1)
        .take_while(|t| t.is_any(MODIFIERS))
        .count();
    let (phrase, object_type, len) = object_at(cb, start)?;
    Some((phrase, object_type, start + len))
}

/// The caret is where the new object's name goes.
fn is_naming(cb: &CodeBlock, after: usize) -> bool {
    let written = cb.prev_tokens().len();
    let if_not_exists = cb.tokens.get(after).is_some_and(|t| t.is("if"))
        && cb.tokens.get(after + 2).is_some_and(|t| t.is("exists"));
    written == after || (if_not_exists && written == after + 3)
}

fn placeholder_word(phrase: &str) -> String {
    phrase.to_lowercase().replace(' ', "_")
}

fn create_snippets() -> Vec<CompletionItem> {
    type O = ObjectType;
    let snippet = |label: &str, insert: &str, object_type: ObjectType| {
        Snippet::new(label)
            .insert(insert)
            .kind(ItemKind::for_type(object_type))
    };
    const TABLE: &str = "${1:table_name} (\n  $0\n);";
    const VIEW: &str = "${1:view_name} AS\n  SELECT $0";
    suggest_snippets([
        snippet("TABLE ...", &format!("TABLE {TABLE}"), O::Table)
            .docs("Define a new table"),
        snippet("TABLE IF NOT EXISTS ...", &format!("TABLE IF NOT EXISTS {TABLE}"), O::Table),
        snippet("VIEW ...", &format!("VIEW {VIEW}"), O::View).docs("Define a new view"),
        snippet("MATERIALIZED VIEW ...", &format!("MATERIALIZED VIEW {VIEW}"), O::MView)
            .docs("Define a new materialized view"),
        snippet("OR REPLACE", "OR REPLACE ", O::Keyword),
        snippet(
            "FUNCTION ...",
            "FUNCTION ${1:function_name} (${2:arguments})\nRETURNS ${3:void} AS $$\nBEGIN\n  $0\nEND;\n$$ LANGUAGE plpgsql;",
            O::Function,
        )
        .docs("Define a new function"),
        snippet("PROCEDURE ...", "PROCEDURE ${1:procedure_name} (${2:arguments})\nLANGUAGE sql\nAS $$\n  $0\n$$;", O::Function),
        snippet(
            "TRIGGER ...",
            "TRIGGER ${1:trigger_name}\n${2|AFTER,BEFORE,INSTEAD OF|} ${3|INSERT,UPDATE,DELETE|}\nON ${4:table_name}\nFOR EACH ${5|ROW,STATEMENT|}\nEXECUTE FUNCTION ${6:trigger_function}();",
            O::Trigger,
        ),
        snippet("INDEX", "INDEX ", O::Index).docs("Define a new index"),
        snippet("UNIQUE INDEX", "UNIQUE INDEX ", O::Index),
        snippet("EXTENSION", "EXTENSION ", O::Extension).docs("Install an extension"),
        snippet("EXTENSION IF NOT EXISTS", "EXTENSION IF NOT EXISTS ", O::Extension),
        snippet(
            "POLICY ...",
            "POLICY ${1:policy_name}\nON ${2:table_name}\nFOR ${3|ALL,SELECT,INSERT,UPDATE,DELETE|}\nTO ${4:role_name}\nUSING ($0)",
            O::Policy,
        )
        .docs("Define how a role interacts with the rows of a table. Row level security must be enabled on the table."),
        snippet("RULE ...", "RULE ${1:rule_name} AS ON ${2|SELECT,INSERT,UPDATE,DELETE|}\nTO ${3:table_name}\nDO $0", O::Rule),
        snippet("ROLE", "ROLE ", O::Role),
        snippet("USER", "USER ", O::Role),
        snippet("SCHEMA", "SCHEMA ", O::Schema),
        snippet("DATABASE", "DATABASE ", O::Database),
        snippet("SEQUENCE", "SEQUENCE ", O::Sequence),
        snippet("TYPE", "TYPE ", O::DataType),
        snippet("DOMAIN", "DOMAIN ", O::DataType),
        snippet("PUBLICATION", "PUBLICATION ", O::Publication),
        snippet(
            "SUBSCRIPTION ...",
            "SUBSCRIPTION ${1:subscription_name}\nCONNECTION '${2:host=localhost dbname=postgres}'\nPUBLICATION ${3:publication_name};",
            O::Subscription,
        ),
        snippet("TABLESPACE", "TABLESPACE ", O::Tablespace),
        snippet("EVENT TRIGGER", "EVENT TRIGGER ", O::EventTrigger),
    ])
}

/// `CREATE [MATERIALIZED] VIEW name AS query`
async fn view(ctx: MatchContext<'_>, object_type: ObjectType, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if is_naming(cb, after) {
        let mut items = name_snippets(ctx.catalog, "view_name");
        if object_type == ObjectType::MView && cb.prev_tokens().len() == after {
            items.extend(suggest_kwds(&["IF NOT EXISTS"]));
        }
        return items;
    }

    let as_token = cb.prev_tokens()[after..]
        .iter()
        .position(|t| t.nesting_id.is_top() && t.is("as"))
        .map(|i| after + i);
    let Some(as_idx) = as_token else {
        return suggest_snippets([
            Snippet::new("AS").insert("AS\n  SELECT $0"),
            Snippet::new("WITH ( options )").insert("WITH ( $0 )"),
        ]);
    };

    let query = cb.prev_tokens().get(as_idx + 1);
    if let Some(start) = query {
        let end = cb.tokens.last().map_or(start.offset, |t| t.offset);
        let nested = match_nested(
            ctx,
            start.offset,
            end,
            &[Command::With, Command::Select],
            MatchOptions { exclude_into: true },
        )
        .await;
        if let Some(items) = nested {
            return items;
        }
    }
    suggest_kwds(&["SELECT", "WITH", "VALUES"])
}

static FUNCTION_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("RETURNS")
            .expects("dataType")
            .options([
                Snippet::new("TABLE ( ... )").insert("TABLE ( $0 )"),
                Snippet::new("SETOF"),
                Snippet::new("TRIGGER"),
                Snippet::new("VOID"),
            ])
            .exclude_when(|cb| cb.tokens.iter().take(4).any(|t| t.is("procedure"))),
        Kwd::new("LANGUAGE").options(["sql", "plpgsql"]),
        Kwd::new("IMMUTABLE")
            .exclude_if(["STABLE", "VOLATILE"])
            .docs("Cannot modify the database and always returns the same result given the same arguments"),
        Kwd::new("STABLE")
            .exclude_if(["IMMUTABLE", "VOLATILE"])
            .docs("Cannot modify the database and returns the same result for the same arguments within a single statement"),
        Kwd::new("VOLATILE")
            .exclude_if(["IMMUTABLE", "STABLE"])
            .docs("The result can change even within a single table scan. This is the default."),
        Kwd::new("SECURITY DEFINER").docs("Executed with the privileges of the user that owns it"),
        Kwd::new("PARALLEL SAFE"),
        Kwd::new("AS").options([Snippet::new("$$ ... $$").insert("$$\nBEGIN\n  $0\nEND;\n$$")]),
    ]
});

const ARG_MODES: &[&str] = &["IN", "OUT", "INOUT", "VARIADIC"];

/// `CREATE [OR REPLACE] {FUNCTION | PROCEDURE} name (args) ...`
fn function(ctx: MatchContext<'_>, phrase: &str, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if is_naming(cb, after) {
        let mut items = name_snippets(ctx.catalog, &format!("{}_name", placeholder_word(phrase)));
        if cb.tokens.get(1).is_some_and(|t| t.is("or")) {
            let procedures = phrase == "PROCEDURE";
            items.extend(
                ctx.catalog
                    .of_type(ObjectType::Function)
                    .filter(|f| f.schema.as_deref() != Some("pg_catalog"))
                    .filter_map(|f| Some((f, f.function_info()?)))
                    .filter(|(_, info)| (info.kind == FunctionKind::Procedure) == procedures)
                    .map(|(f, info)| {
                        CompletionItem::from_entry(f)
                            .insert(format!("{}({})", f.escaped, info.arguments))
                            .sort("b")
                    }),
            );
        }
        return items;
    }
    if cb.curr_token().is_some_and(|t| t.kind == TokenKind::Str) {
        return vec![];
    }

    let args_group = cb
        .tokens
        .iter()
        .find(|t| t.nesting_id.is_top() && t.kind == TokenKind::ParenOpen)
        .and_then(Token::inner_nesting_id);
    if args_group.as_ref() == Some(&cb.curr_nesting_id) {
        let prev = cb.prev_tokens_at(&cb.curr_nesting_id);
        let arg = since_last_comma(&prev);
        let named: Vec<&&Token> = arg.iter().filter(|t| !t.is_any(ARG_MODES)).collect();
        return match named.len() {
            0 if arg.is_empty() => {
                let mut items = suggest_kwds(&["$arg_name"]);
                items.extend(suggest_kwds(ARG_MODES).into_iter().map(|i| i.sort("b")));
                items
            }
            0 => suggest_kwds(&["$arg_name"]),
            1 => ctx.expected("dataType"),
            _ => suggest_kwds(&["DEFAULT", ","]),
        };
    }

    if cb.ltoken().is_some_and(|t| t.is("setof")) {
        return ctx.expected("dataType");
    }
    let opts = KwdOpts {
        not_ordered: true,
        ..Default::default()
    };
    ctx.with_kwds(&FUNCTION_KWDS, opts).suggestion(None, &[])
}

pub(super) static ROLE_OPTIONS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    let pair = |on: &str, off: &str, docs: &str| {
        [
            Kwd::new(on).exclude_if([off]).docs(docs),
            Kwd::new(off).exclude_if([on]),
        ]
    };
    let mut kwds: Vec<Kwd> = [
        pair("SUPERUSER", "NOSUPERUSER", "Can override all access restrictions within the database"),
        pair("CREATEDB", "NOCREATEDB", "Can create databases"),
        pair("CREATEROLE", "NOCREATEROLE", "Can create, alter, drop, comment on and change the security label of roles"),
        pair("INHERIT", "NOINHERIT", "Inherits the privileges of roles it is a member of"),
        pair("LOGIN", "NOLOGIN", "Can log in, that is, can be given as the initial session authorization name"),
        pair("REPLICATION", "NOREPLICATION", "Can initiate streaming replication or put the system in and out of backup mode"),
        pair("BYPASSRLS", "NOBYPASSRLS", "Bypasses every row-level security policy"),
    ]
    .into_iter()
    .flatten()
    .collect();
    kwds.extend([
        Kwd::new("CONNECTION LIMIT")
            .options(["-1", "10", "100"])
            .docs("How many concurrent connections the role can make. -1 means no limit."),
        Kwd::new("PASSWORD").options([Snippet::new("'$password'"), Snippet::new("NULL")]),
        Kwd::new("VALID UNTIL")
            .options(["'infinity'", "'2030-01-01'"])
            .docs("Date and time after which the password is no longer valid"),
        Kwd::new("IN ROLE").expects("role").docs("Roles the new role becomes a member of"),
        Kwd::new("ADMIN").expects("role"),
    ]);
    kwds
});

/// Role attributes, in any order.
pub(super) fn role_options(ctx: &MatchContext<'_>) -> Vec<CompletionItem> {
    let opts = KwdOpts {
        not_ordered: true,
        ..Default::default()
    };
    ctx.with_kwds(&ROLE_OPTIONS, opts).suggestion(None, &[])
}

fn role(ctx: MatchContext<'_>, phrase: &str, after: usize) -> Vec<CompletionItem> {
    if is_naming(ctx.cb, after) {
        return suggest_kwds(&[format!("${}_name", placeholder_word(phrase)).as_str()]);
    }
    role_options(&ctx)
}

const LOCALES: &[&str] = &["en_US.UTF-8", "C.UTF-8"];

static CREATE_DB_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("OWNER").expects("role").docs(
            "The role that will own the new database, or DEFAULT to use the role executing the command",
        ),
        Kwd::new("TEMPLATE")
            .expects("database")
            .docs("The template to create the new database from. template1 by default."),
        Kwd::new("ENCODING")
            .options(["UTF8", "SQL_ASCII", "LATIN1", "WIN1252", "EUC_JP"])
            .docs("Character set encoding to use in the new database"),
        Kwd::new("STRATEGY").options(["wal_log", "file_copy"]).docs(
            "WAL_LOG copies the template block by block through the write-ahead log. FILE_COPY copies whole directories and forces checkpoints.",
        ),
        Kwd::new("LOCALE")
            .options(LOCALES.iter().copied())
            .docs("Shortcut for setting LC_COLLATE and LC_CTYPE at once"),
        Kwd::new("LC_COLLATE")
            .options(LOCALES.iter().copied())
            .docs("Collation order to use in the new database"),
        Kwd::new("LC_CTYPE")
            .options(LOCALES.iter().copied())
            .docs("Character classification to use in the new database"),
        Kwd::new("ICU_LOCALE").options(LOCALES.iter().copied()),
        Kwd::new("LOCALE_PROVIDER").options(["icu", "libc"]),
        Kwd::new("COLLATION_VERSION").expects("number"),
        Kwd::new("TABLESPACE").expects("tablespace"),
        Kwd::new("ALLOW_CONNECTIONS")
            .options(["true", "false"])
            .docs("If false then no one can connect to this database"),
        Kwd::new("CONNECTION LIMIT")
            .options(["10", "20", "100", "200"])
            .docs("How many concurrent connections can be made to this database. -1 means no limit."),
        Kwd::new("IS_TEMPLATE")
            .options(["TRUE", "FALSE"])
            .docs("If true, any user with CREATEDB privileges can clone this database"),
        Kwd::new("OID").expects("number"),
    ]
});

fn database(ctx: MatchContext<'_>, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if is_naming(cb, after) {
        return suggest_kwds(&["$database_name"]);
    }
    if cb.prev_tokens().len() == after + 1 {
        return suggest_kwds(&["WITH"]);
    }
    let opts = KwdOpts {
        not_ordered: true,
        ..Default::default()
    };
    ctx.with_kwds(&CREATE_DB_KWDS, opts).suggestion(None, &[])
}

static EXTENSION_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("SCHEMA").expects("schema"),
        Kwd::new("VERSION").options(["'$version'"]),
        Kwd::new("CASCADE").docs("Also install the extensions this one depends on"),
    ]
});

/// Not yet installed extensions first.
fn extension(ctx: MatchContext<'_>) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let at_name = cb.ltoken().is_some_and(|t| t.is("extension"));
    if at_name || prev_words(cb).ends_with("if not exists") {
        let mut items: Vec<CompletionItem> = ctx
            .catalog
            .of_type(ObjectType::Extension)
            .map(|e| CompletionItem::from_entry(e).sort(if e.is_installed() { "b" } else { "a" }))
            .collect();
        if at_name {
            items.push(CompletionItem::keyword("IF NOT EXISTS").sort("0"));
        }
        return items;
    }
    let opts = KwdOpts {
        not_ordered: true,
        ..Default::default()
    };
    ctx.with_kwds(&EXTENSION_KWDS, opts).suggestion(None, &[])
}

static SCHEMA_KWDS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![Kwd::new("AUTHORIZATION")
        .expects("role")
        .docs("The role that will own the new schema")]
});

fn schema(ctx: MatchContext<'_>, after: usize) -> Vec<CompletionItem> {
    if ctx.cb.prev_tokens().len() == after {
        return suggest_kwds(&["$schema_name", "IF NOT EXISTS", "AUTHORIZATION"]);
    }
    ctx.with_kwds(&SCHEMA_KWDS, KwdOpts::default()).suggestion(None, &[])
}
