//! Tables, CTEs and subqueries visible from the caret, with their columns.
use crate::*;
use std::sync::Arc;

const INTRODUCERS: &[&str] = &["from", "join", "update", "into", "table", "using", "only", "lateral"];

/// Keywords closing a FROM list.
const CLAUSE_ENDS: &[&str] = &[
    "where", "group", "order", "having", "limit", "offset", "window", "union", "intersect",
    "except", "returning", "set", "values", "select", "fetch", "for", "into",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularKind {
    Table,
    Cte,
    Subquery,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabularColumn {
    pub name: String,
    pub data_type: Option<String>,
    pub source: Option<Arc<Entry>>,
}

/// A relation usable as a column source, as referenced in the statement.
#[derive(Debug, Clone)]
pub struct TabularExpr {
    pub kind: TabularKind,
    /// Unquoted name the relation is referred to by: its alias or its name.
    pub alias: String,
    pub table: Option<Arc<Entry>>,
    pub columns: Vec<TabularColumn>,
    /// Offset of the reference in the document.
    pub offset: usize,
}

impl TabularExpr {
    fn from_table(table: &Arc<Entry>, alias: String, offset: usize, catalog: &Catalog) -> Self {
        Self {
            kind: TabularKind::Table,
            alias,
            columns: catalog_columns(table, catalog),
            table: Some(table.clone()),
            offset,
        }
    }

    pub fn is_named(&self, written: &str) -> bool {
        self.alias == unquote_identifier(written)
            || self.table.as_ref().is_some_and(|t| t.is_written_as(written))
    }
}

fn catalog_columns(table: &Entry, catalog: &Catalog) -> Vec<TabularColumn> {
    catalog
        .columns_of(table)
        .into_iter()
        .map(|c| TabularColumn {
            name: c.name.clone(),
            data_type: c.column_info().map(|i| i.data_type.clone()),
            source: Some(c.clone()),
        })
        .collect()
}

/// Relations referenced at the caret's nesting level or any level enclosing it.
pub fn get_tabular_expressions(cb: &CodeBlock, catalog: &Catalog) -> Vec<TabularExpr> {
    let ctes = get_ctes(cb, catalog);
    let tokens = &cb.tokens;
    let allow_on = tokens
        .first()
        .is_some_and(|t| t.is_any(&["create", "alter", "drop", "comment", "grant", "revoke"]));
    let visible = |t: &Token| cb.curr_nesting_id.is_within(&t.nesting_id);

    let mut found: Vec<TabularExpr> = ctes.clone();
    let mut referenced: Vec<String> = Vec::new();
    let mut in_list = false;
    let mut i = 0;
    while i < tokens.len() {
        let t = &tokens[i];
        if !visible(t) {
            i += 1;
            continue;
        }
        let introduces = t.kind == TokenKind::Keyword
            && (t.is_any(INTRODUCERS) || (allow_on && t.is("on")));
        if introduces {
            if t.is_any(&["from", "using"]) {
                in_list = true;
            }
        } else if !(t.kind == TokenKind::Comma && in_list) {
            if t.kind == TokenKind::Keyword && t.is_any(CLAUSE_ENDS) {
                in_list = false;
            }
            i += 1;
            continue;
        }
        let allows_call = t.kind == TokenKind::Comma || t.is_any(&["from", "join", "lateral"]);

        let Some(next) = tokens.get(i + 1).filter(|n| n.nesting_id == t.nesting_id) else {
            i += 1;
            continue;
        };
        if next.kind == TokenKind::ParenOpen {
            if let Some((expr, consumed)) = subquery(cb, catalog, i + 1) {
                found.push(expr);
                i += consumed;
                continue;
            }
        } else if next.kind.is_word() && !next.is_any(&["only", "lateral", "select"]) {
            let (written, name_len) = qualified_name(tokens, i + 1);
            let after = i + 1 + name_len;
            let is_call =
                allows_call && tokens.get(after).is_some_and(|p| p.kind == TokenKind::ParenOpen);
            let alias_at = if is_call { close_of(tokens, after).map(|c| c + 1) } else { Some(after) };
            let alias = alias_at.and_then(|a| alias_after(tokens, a));
            let name = alias.clone().unwrap_or_else(|| {
                split_qualified(&written).last().cloned().unwrap_or_default()
            });

            if is_call {
                found.push(TabularExpr {
                    kind: TabularKind::Function,
                    alias: name,
                    table: None,
                    columns: vec![],
                    offset: next.offset,
                });
            } else if let Some(cte) = ctes.iter().find(|c| c.alias == unquote_identifier(&written)) {
                let mut cte = cte.clone();
                referenced.push(cte.alias.clone());
                cte.alias = name;
                cte.offset = next.offset;
                found.push(cte);
            } else if let Some(table) = catalog.find_table(&written) {
                found.push(TabularExpr::from_table(table, name, next.offset, catalog));
            }
        }
        i += 1;
    }
    // A referenced CTE is visible through its reference only.
    found
        .into_iter()
        .enumerate()
        .filter(|(i, e)| *i >= ctes.len() || !referenced.contains(&e.alias))
        .map(|(_, e)| e)
        .collect()
}

/// `WITH name [(cols)] AS [NOT] [MATERIALIZED] (...)` definitions.
fn get_ctes(cb: &CodeBlock, catalog: &Catalog) -> Vec<TabularExpr> {
    let tokens = &cb.tokens;
    if !tokens.first().is_some_and(|t| t.is("with")) {
        return vec![];
    }
    let mut ctes: Vec<TabularExpr> = Vec::new();
    let mut i = 1;
    while i < tokens.len() {
        let t = &tokens[i];
        let starts_cte = t.nesting_id.is_top()
            && t.kind.is_word()
            && !t.is("recursive")
            && tokens.get(i - 1).is_some_and(|p| p.is_any(&["with", "recursive", ","]));
        if !starts_cte {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        let mut explicit: Vec<String> = Vec::new();
        if tokens.get(j).is_some_and(|p| p.kind == TokenKind::ParenOpen) {
            let close = close_of(tokens, j).unwrap_or(tokens.len());
            explicit = tokens[j + 1..close.min(tokens.len())]
                .iter()
                .filter(|c| c.kind.is_word())
                .map(|c| unquote_identifier(&c.text))
                .collect();
            j = close + 1;
        }
        if !tokens.get(j).is_some_and(|p| p.is("as")) {
            i += 1;
            continue;
        }
        j += 1;
        while tokens.get(j).is_some_and(|p| p.is_any(&["not", "materialized"])) {
            j += 1;
        }
        if !tokens.get(j).is_some_and(|p| p.kind == TokenKind::ParenOpen) {
            i += 1;
            continue;
        }

        let mut expr = body_expr(cb, catalog, j, &ctes);
        expr.kind = TabularKind::Cte;
        expr.alias = unquote_identifier(&t.text);
        expr.offset = t.offset;
        if !explicit.is_empty() {
            expr.columns = explicit
                .into_iter()
                .map(|name| TabularColumn {
                    name,
                    data_type: None,
                    source: None,
                })
                .collect();
        }
        ctes.push(expr);
        i = close_of(tokens, j).unwrap_or(tokens.len());
    }
    ctes
}

/// `( SELECT ... ) [AS] alias` starting at the opening parenthesis.
fn subquery(cb: &CodeBlock, catalog: &Catalog, open: usize) -> Option<(TabularExpr, usize)> {
    let tokens = &cb.tokens;
    let close = close_of(tokens, open)?;
    let alias = alias_after(tokens, close + 1)?;
    let mut expr = body_expr(cb, catalog, open, &get_ctes(cb, catalog));
    expr.alias = alias;
    Some((expr, close + 1 - open))
}

/// Output columns of the parenthesized SELECT opening at `open`.
fn body_expr(cb: &CodeBlock, catalog: &Catalog, open: usize, ctes: &[TabularExpr]) -> TabularExpr {
    let tokens = &cb.tokens;
    let offset = tokens[open].offset;
    let mut expr = TabularExpr {
        kind: TabularKind::Subquery,
        alias: String::new(),
        table: None,
        columns: vec![],
        offset,
    };
    let Some(inner) = tokens[open].inner_nesting_id() else {
        return expr;
    };
    let body: Vec<&Token> = tokens[open + 1..]
        .iter()
        .take_while(|t| t.nesting_id.is_within(&inner))
        .filter(|t| t.nesting_id == inner)
        .collect();
    let Some(select) = body.iter().position(|t| t.is("select")) else {
        return expr;
    };
    let from = body.iter().position(|t| t.is("from")).unwrap_or(body.len());

    let sources: Vec<TabularExpr> = body
        .windows(2)
        .filter(|w| w[0].is_any(&["from", "join"]) && w[1].kind.is_word())
        .filter_map(|w| {
            let name = unquote_identifier(&w[1].text);
            ctes.iter()
                .find(|c| c.alias == name)
                .cloned()
                .or_else(|| {
                    catalog
                        .find_table(&w[1].text)
                        .map(|t| TabularExpr::from_table(t, name, w[1].offset, catalog))
                })
        })
        .collect();

    for item in body[select + 1..from.max(select + 1)].split(|t| t.kind == TokenKind::Comma) {
        let item: Vec<&&Token> = item.iter().filter(|t| !t.is("distinct")).collect();
        match item.as_slice() {
            [] => {}
            [star] if star.text == "*" => {
                expr.columns.extend(sources.iter().flat_map(|s| s.columns.clone()));
            }
            [.., q, dot, star] if star.text == "*" && dot.kind == TokenKind::Dot => {
                let q = unquote_identifier(&q.text);
                expr.columns.extend(
                    sources
                        .iter()
                        .filter(|s| s.alias == q)
                        .flat_map(|s| s.columns.clone()),
                );
            }
            [.., last] if last.kind.is_word() => {
                let name = unquote_identifier(&last.text);
                let source = sources
                    .iter()
                    .flat_map(|s| &s.columns)
                    .find(|c| c.name == name)
                    .cloned();
                expr.columns.push(source.unwrap_or(TabularColumn {
                    name,
                    data_type: None,
                    source: None,
                }));
            }
            _ => {}
        }
    }
    expr
}

/// Reads `word` or `schema . word`; returns the text and token count.
fn qualified_name(tokens: &[Token], at: usize) -> (String, usize) {
    match (tokens.get(at + 1), tokens.get(at + 2)) {
        (Some(dot), Some(name)) if dot.kind == TokenKind::Dot && name.kind.is_word() => {
            (format!("{}.{}", tokens[at].text, name.text), 3)
        }
        _ => (tokens[at].text.clone(), 1),
    }
}

/// Alias at `at`, with or without `AS`.
fn alias_after(tokens: &[Token], at: usize) -> Option<String> {
    let t = tokens.get(at)?;
    let t = if t.is("as") { tokens.get(at + 1)? } else { t };
    t.is_identifier().then(|| unquote_identifier(&t.text))
}

/// Index of the parenthesis closing the one opened at `open`.
fn close_of(tokens: &[Token], open: usize) -> Option<usize> {
    let group = tokens.get(open)?.group?;
    tokens[open + 1..]
        .iter()
        .position(|t| t.kind == TokenKind::ParenClose && t.group == Some(group))
        .map(|p| open + 1 + p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn aliases(sql: &str) -> Vec<(String, TabularKind, usize)> {
        let catalog = fixture_catalog();
        get_tabular_expressions(&at_caret(sql), &catalog)
            .into_iter()
            .map(|e| (e.alias, e.kind, e.columns.len()))
            .collect()
    }

    #[test]
    fn tables_with_and_without_aliases() {
        assert_eq!(
            aliases("SELECT | FROM users u JOIN orders AS o ON true, t1"),
            vec![
                ("u".into(), TabularKind::Table, 3),
                ("o".into(), TabularKind::Table, 3),
                ("t1".into(), TabularKind::Table, 1),
            ]
        );
    }

    #[test]
    fn schema_qualified_reference() {
        assert_eq!(
            aliases("SELECT | FROM archive.old_orders"),
            vec![("old_orders".into(), TabularKind::Table, 1)]
        );
    }

    #[test]
    fn cte_columns_from_select_list() {
        let found = aliases("WITH recent AS (SELECT id, total AS amount FROM orders) SELECT | FROM recent r");
        assert_eq!(found, vec![("r".into(), TabularKind::Cte, 2)]);

        let found = aliases("WITH recent AS (SELECT id FROM orders) SELECT |");
        assert_eq!(found, vec![("recent".into(), TabularKind::Cte, 1)]);
    }

    #[test]
    fn cte_star_and_explicit_columns() {
        let catalog = fixture_catalog();
        let exprs = get_tabular_expressions(
            &at_caret("WITH a AS (SELECT * FROM users), b(x, y) AS (SELECT 1, 2) SELECT | FROM a, b"),
            &catalog,
        );
        let a = exprs.iter().find(|e| e.alias == "a").unwrap();
        let cols: Vec<_> = a.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(cols, vec!["id", "email", "name"]);
        assert!(a.columns[0].source.is_some());
        let b = exprs.iter().find(|e| e.alias == "b").unwrap();
        assert_eq!(b.columns.len(), 2);
    }

    #[test]
    fn subquery_alias() {
        let found = aliases("SELECT s.| FROM (SELECT email FROM users) s");
        assert_eq!(found, vec![("s".into(), TabularKind::Subquery, 1)]);
    }

    #[test]
    fn inner_tables_are_not_visible_outside() {
        let found = aliases("SELECT | FROM orders WHERE user_id IN (SELECT id FROM users)");
        assert_eq!(found, vec![("orders".into(), TabularKind::Table, 3)]);
    }

    #[test]
    fn outer_tables_are_visible_inside() {
        let found = aliases("SELECT * FROM orders o WHERE EXISTS (SELECT 1 FROM users u WHERE u.id = |)");
        let names: Vec<_> = found.iter().map(|f| f.0.as_str()).collect();
        assert_eq!(names, vec!["o", "u"]);
    }

    #[test]
    fn set_returning_function() {
        let found = aliases("SELECT | FROM generate_series(1, 3) g");
        assert_eq!(found, vec![("g".into(), TabularKind::Function, 0)]);
    }

    #[test]
    fn statements_other_than_select() {
        assert_eq!(aliases("UPDATE orders SET |"), vec![("orders".into(), TabularKind::Table, 3)]);
        assert_eq!(aliases("INSERT INTO t1 (|"), vec![("t1".into(), TabularKind::Table, 1)]);
        assert_eq!(aliases("CREATE INDEX ON users (|"), vec![("users".into(), TabularKind::Table, 3)]);
    }
}
