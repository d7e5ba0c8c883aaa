//! `CREATE TABLE name ( column definitions ) [options]`
use super::*;

pub(super) async fn result(ctx: MatchContext<'_>, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    if is_naming(cb, after) {
        let mut items = name_snippets(ctx.catalog, "table_name");
        if cb.prev_tokens().len() == after {
            items.push(CompletionItem::keyword("IF NOT EXISTS").sort("0"));
        }
        return items;
    }

    let depth = cb.curr_nesting_id.depth();
    let func = cb.curr_nesting_func.as_ref();
    let top_close = cb
        .prev_tokens()
        .iter()
        .any(|t| t.nesting_id.is_top() && t.kind == TokenKind::ParenClose);

    if depth == 0 {
        if top_close {
            return ctx.with_kwds(&TABLE_OPTIONS, KwdOpts::default()).suggestion(None, &[]);
        }
        return as_query(ctx, after).await;
    }
    if top_close && depth == 1 && func.is_some_and(|f| f.text_lc == "with") {
        let opts = KwdOpts {
            not_ordered: true,
            ..Default::default()
        };
        return ctx.with_kwds(&STORAGE_PARAMS, opts).suggestion(Some(","), &[]);
    }
    if let Some(items) = referenced_columns(ctx) {
        return items;
    }
    if depth >= 2 {
        return match func {
            Some(f) if f.text_lc == "as" || f.text_lc == "check" => {
                let mut items = defined_columns(cb);
                items.extend(ctx.expected("function").into_iter().map(|i| i.sort("b")));
                items
            }
            Some(f) if ["key", "unique", "include"].contains(&f.text_lc.as_str()) => defined_columns(cb),
            _ => vec![],
        };
    }

    if cb.prev_lc().trim_end().ends_with("references") {
        return ctx.expected("table");
    }

    let prev = cb.prev_tokens_at(&cb.curr_nesting_id);
    let definition = since_last_comma(&prev);
    if definition.is_empty() {
        let after_comma = prev.last().is_some_and(|t| t.kind == TokenKind::Comma);
        return column_definitions(ctx.catalog, &prev, after_comma);
    }
    if definition.len() == 1 {
        return ctx.expected("dataType");
    }
    if definition[0].is_any(&["constraint", "primary", "foreign", "unique", "check"]) {
        return vec![];
    }
    let opts = KwdOpts {
        not_ordered: true,
        top_reset_kwd: Some(","),
    };
    ctx.with_kwds(&COLUMN_CONSTRAINTS, opts).suggestion(None, &[])
}

/// Right after the table name: a column list or a query.
async fn as_query(ctx: MatchContext<'_>, after: usize) -> Vec<CompletionItem> {
    let cb = ctx.cb;
    let prev = cb.prev_tokens();
    if let Some(as_idx) = prev[after..].iter().position(|t| t.is("as")).map(|i| after + i) {
        if let Some(start) = prev.get(as_idx + 1) {
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
        return suggest_kwds(&["SELECT", "WITH"]);
    }
    suggest_snippets([
        Snippet::new("( columns )").insert("(\n  $0\n)"),
        Snippet::new("AS").insert("AS\n  SELECT $0"),
        Snippet::new("PARTITION OF").insert("PARTITION OF "),
    ])
}

/// Column list of `REFERENCES table (`.
pub(in crate::completion::matchers) fn referenced_columns(ctx: MatchContext<'_>) -> Option<Vec<CompletionItem>> {
    let cb = ctx.cb;
    let func = cb.curr_nesting_func.as_ref()?;
    let idx = cb.tokens.iter().position(|t| t.offset == func.offset)?;
    let before = idx.checked_sub(1).and_then(|i| cb.tokens.get(i))?;
    if !before.is("references") {
        return None;
    }
    let table = ctx.catalog.find_table(&func.text)?;
    let written = cb.prev_tokens_at(&cb.curr_nesting_id);
    Some(table_columns(ctx.catalog, table, &written))
}

/// Columns declared so far in the table being created.
fn defined_columns(cb: &CodeBlock) -> Vec<CompletionItem> {
    let list = cb
        .tokens
        .iter()
        .find(|t| t.nesting_id.is_top() && t.kind == TokenKind::ParenOpen)
        .and_then(Token::inner_nesting_id);
    let Some(list) = list else {
        return vec![];
    };
    let level: Vec<&Token> = cb.tokens.iter().filter(|t| t.nesting_id == list).collect();
    level
        .iter()
        .enumerate()
        .filter(|(i, t)| {
            t.kind.is_word()
                && !t.is_any(&["constraint", "primary", "foreign", "unique", "check", "exclude"])
                && (*i == 0 || level[i - 1].kind == TokenKind::Comma)
        })
        .map(|(_, t)| CompletionItem::new(unquote_identifier(&t.text), ObjectType::Column).sort("a"))
        .collect()
}

/// Common column definitions, skipping names already declared.
pub(in crate::completion::matchers) fn column_definitions(catalog: &Catalog, prev: &[&Token], after_comma: bool) -> Vec<CompletionItem> {
    let declared = |def: &str| {
        let name = def.split_whitespace().next().unwrap_or_default();
        prev.iter().any(|t| t.text_lc == name)
    };
    let references = catalog
        .of_type(ObjectType::Table)
        .filter(|t| catalog.columns_of(t).iter().any(|c| c.name == "id"))
        .map(|t| {
            let singular = t.name.strip_suffix('s').unwrap_or(&t.name);
            format!("{singular}_id INTEGER REFERENCES {}", t.escaped)
        });
    let mut snippets: Vec<Snippet> = COMMON_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(references)
        .filter(|def| !declared(def))
        .map(|def| Snippet::new(def).kind(ItemKind::Field))
        .collect();
    snippets.push(Snippet::new("$column_name").kind(ItemKind::Field));
    snippets.push(
        Snippet::new("column_name data_type constraints")
            .insert("${1:column_name} ${2:data_type} ${3:NOT NULL}")
            .kind(ItemKind::Field),
    );
    if after_comma {
        snippets.extend([
            Snippet::new("CONSTRAINT").insert("CONSTRAINT ${1:constraint_name} "),
            Snippet::new("PRIMARY KEY ( ... )").insert("PRIMARY KEY ( $0 )"),
            Snippet::new("FOREIGN KEY ( ... ) REFERENCES")
                .insert("FOREIGN KEY ( $1 ) REFERENCES ${2:table_name} ( $3 )"),
            Snippet::new("UNIQUE ( ... )").insert("UNIQUE ( $0 )"),
            Snippet::new("CHECK ( ... )").insert("CHECK ( $0 )"),
        ]);
    }
    suggest_snippets(snippets)
}

const COMMON_COLUMNS: &[&str] = &[
    "id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY",
    "id BIGSERIAL PRIMARY KEY",
    "id UUID PRIMARY KEY DEFAULT gen_random_uuid()",
    "name TEXT NOT NULL",
    "email TEXT NOT NULL UNIQUE",
    "description TEXT",
    "status TEXT NOT NULL",
    "price NUMERIC(12,2) CHECK (price >= 0)",
    "quantity INTEGER NOT NULL CHECK (quantity > 0)",
    "created_at TIMESTAMPTZ NOT NULL DEFAULT now()",
    "updated_at TIMESTAMPTZ NOT NULL DEFAULT now()",
    "deleted_at TIMESTAMPTZ",
];

const REFERENTIAL_ACTIONS: &[(&str, &str)] = &[
    ("CASCADE", "Delete or update the referencing rows too"),
    ("SET NULL", "Set the referencing columns to NULL"),
    ("SET DEFAULT", "Set the referencing columns to their default values"),
    ("RESTRICT", "Fail immediately. Unlike NO ACTION the check is not deferrable."),
    ("NO ACTION", "Fail if referencing rows still exist when the constraint is checked. This is the default."),
];

fn referential_actions() -> Vec<Snippet> {
    REFERENTIAL_ACTIONS
        .iter()
        .map(|(label, docs)| Snippet::new(*label).docs(*docs))
        .collect()
}

pub(in crate::completion::matchers) static COLUMN_CONSTRAINTS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("GENERATED")
            .options([
                Snippet::new("BY DEFAULT AS IDENTITY")
                    .docs("Generate values unless a value is supplied on insert or update"),
                Snippet::new("ALWAYS AS IDENTITY").docs("Always generate values; supplying one is an error"),
                Snippet::new("ALWAYS AS ( ... ) STORED")
                    .insert("ALWAYS AS ( $0 ) STORED")
                    .docs("Computed from other columns when the row is written"),
            ])
            .docs("Identity or generated column"),
        Kwd::new("NOT NULL").exclude_if(["NULL"]).docs("The column cannot be NULL"),
        Kwd::new("NULL").exclude_if(["NOT NULL"]),
        Kwd::new("PRIMARY KEY").docs("Unique and not null identifier of the row"),
        Kwd::new("UNIQUE"),
        Kwd::new("DEFAULT")
            .dynamic_options(default_values)
            .docs("Value used when an insert does not specify one"),
        Kwd::new("CHECK").options([Snippet::new("( ... )").insert("( $0 )")]),
        Kwd::new("REFERENCES").expects("table"),
        Kwd::new("ON DELETE")
            .options(referential_actions())
            .depends_on("REFERENCES")
            .docs("Action when the referenced row is deleted"),
        Kwd::new("ON UPDATE")
            .options(referential_actions())
            .depends_on("REFERENCES")
            .docs("Action when the referenced columns are updated"),
    ]
});

/// Functions for a column default, those returning the column's type first.
fn default_values(catalog: &Catalog, cb: &CodeBlock) -> Vec<CompletionItem> {
    let prev = cb.prev_tokens_at(&cb.curr_nesting_id);
    let data_type = since_last_comma(&prev).get(1).map(|t| t.text_lc.clone());
    catalog
        .of_type(ObjectType::Function)
        .filter_map(|f| Some((f, f.function_info()?)))
        .filter(|(_, info)| info.kind == FunctionKind::Normal && !info.returns_set)
        .map(|(f, info)| {
            let matches = data_type
                .as_deref()
                .is_some_and(|t| info.returns.to_lowercase().starts_with(t));
            let sort = match (matches, info.arguments.is_empty()) {
                (true, true) => "a",
                (true, false) => "aa",
                _ => "b",
            };
            CompletionItem::from_entry(f).sort(sort)
        })
        .collect()
}

static TABLE_OPTIONS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    vec![
        Kwd::new("INHERITS").expects("(table)").optional(),
        Kwd::new("PARTITION BY")
            .options(["RANGE ( $0 )", "LIST ( $0 )", "HASH ( $0 )"])
            .optional(),
        Kwd::new("WITH")
            .expects("(options)")
            .options([
                "fillfactor = 70",
                "autovacuum_enabled = false",
                "parallel_workers = 4",
                "toast_tuple_target = 2040",
            ])
            .optional()
            .docs("Storage parameters for the table"),
        Kwd::new("TABLESPACE").expects("tablespace").optional(),
    ]
});

static STORAGE_PARAMS: LazyLock<Vec<Kwd>> = LazyLock::new(|| {
    let param = |name: &str, values: &[&str], docs: &str| {
        Kwd::new(name)
            .expects("=option")
            .options(values.iter().copied())
            .docs(docs)
    };
    vec![
        param(
            "fillfactor",
            &["70", "90", "100"],
            "Percentage between 10 and 100 to which table pages are packed on insert. Lower values leave room for updates.",
        ),
        param(
            "toast_tuple_target",
            &["2040"],
            "Minimum tuple length in bytes before long values are compressed or moved to TOAST",
        ),
        param(
            "parallel_workers",
            &["2", "4", "8"],
            "Number of workers used to assist a parallel scan of this table",
        ),
        param("autovacuum_enabled", &["true", "false"], "Enables or disables autovacuum for this table"),
        param(
            "vacuum_index_cleanup",
            &["AUTO", "ON", "OFF"],
            "Whether VACUUM cleans up indexes of this table",
        ),
        param(
            "vacuum_truncate",
            &["true", "false"],
            "Whether VACUUM may truncate empty pages at the end of the table",
        ),
        param(
            "user_catalog_table",
            &["true", "false"],
            "Declares the table a catalog table for logical replication",
        ),
    ]
});
