use crate::*;
use itertools::Itertools as _;
use std::sync::Arc;

/// Join suggestions inferred from foreign keys, offered right after `JOIN`.
///
/// For every catalog table not yet referenced that has a foreign key to or
/// from a table already in the FROM clause, the item inserts the table, a
/// short alias and the join condition:
///
/// ```text
/// t2 t2
///   ON t2.t1_id = t1.id
/// ```
///
/// Multi-column keys are joined with `AND`; several keys between the same
/// pair of tables with `OR`.
pub fn get_join_suggestions(cb: &CodeBlock, catalog: &Catalog) -> Vec<CompletionItem> {
    if !cb.ltoken().is_some_and(|t| t.is("join")) || typed_schema(cb).is_some() {
        return vec![];
    }

    let joined: Vec<TabularExpr> = get_tabular_expressions(cb, catalog)
        .into_iter()
        .filter(|e| e.kind == TabularKind::Table && e.offset < cb.offset)
        .collect();
    if joined.is_empty() {
        return vec![];
    }
    let mut used_aliases: Vec<String> = joined.iter().map(|e| e.alias.clone()).collect();

    let mut items = Vec::new();
    for candidate in catalog.of_type(ObjectType::Table) {
        let already = joined
            .iter()
            .any(|j| j.table.as_ref().is_some_and(|t| Arc::ptr_eq(t, candidate)));
        if already {
            continue;
        }
        let alias = unique_alias(&candidate.name, &used_aliases);
        for existing in &joined {
            let Some(table) = &existing.table else { continue };
            let condition = join_condition(candidate, &alias, table, &existing.alias);
            if condition.is_empty() {
                continue;
            }
            let insert = format!("{} {alias}\n  ON {condition}", candidate.escaped);
            let mut item = CompletionItem::from_entry(candidate)
                .insert(insert.clone())
                .sort("0")
                .detail(format!("join {}", existing.alias));
            item.label = insert.split_whitespace().join(" ");
            item.filter_text = Some(candidate.escaped.clone());
            items.push(item);
        }
        used_aliases.push(alias);
    }
    items.into_iter().unique_by(|i| i.label.clone()).collect()
}

/// `ON` condition between two tables, in either key direction.
fn join_condition(candidate: &Entry, alias: &str, table: &Entry, table_alias: &str) -> String {
    let alias = escape_identifier(alias);
    let table_alias = escape_identifier(table_alias);
    let outgoing = candidate
        .table_info()
        .into_iter()
        .flat_map(|i| &i.foreign_keys)
        .filter(|fk| fk.references(table))
        .map(|fk| key_condition(fk, &alias, &table_alias));
    let incoming = table
        .table_info()
        .into_iter()
        .flat_map(|i| &i.foreign_keys)
        .filter(|fk| fk.references(candidate))
        .map(|fk| key_condition(fk, &table_alias, &alias));
    outgoing.chain(incoming).unique().join(" OR ")
}

/// `owner.col = target.fcol`, one equality per key column.
fn key_condition(fk: &ForeignKey, owner: &str, target: &str) -> String {
    fk.columns
        .iter()
        .zip(&fk.fcolumns)
        .map(|(c, f)| {
            format!(
                "{owner}.{} = {target}.{}",
                escape_identifier(c),
                escape_identifier(f)
            )
        })
        .join(" AND ")
}

/// Initials of each `_`, `-` or camelCase segment, keeping the segment's
/// trailing digits: `user_accounts` is `ua`, `t2` is `t2`.
pub fn short_alias(name: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' || c.is_whitespace() || (c.is_uppercase() && prev_lower) {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            if !c.is_alphanumeric() {
                prev_lower = false;
                continue;
            }
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
        .iter()
        .filter_map(|seg| {
            let first = seg.chars().next()?;
            let digits: String = seg
                .chars()
                .rev()
                .take_while(char::is_ascii_digit)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            Some(if first.is_ascii_digit() { digits } else { format!("{first}{digits}") })
        })
        .collect::<String>()
        .to_lowercase()
}

fn unique_alias(name: &str, used: &[String]) -> String {
    let base = short_alias(name);
    let base = if base.is_empty() || is_keyword(&base) { name.to_lowercase() } else { base };
    if !used.contains(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|a| !used.contains(a))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[rstest]
    #[case("t2", "t2")]
    #[case("user_accounts", "ua")]
    #[case("orderItems", "oi")]
    #[case("OrderItems", "oi")]
    #[case("log-2024-entries", "l2024e")]
    #[case("orders", "o")]
    #[case("v2_events_3", "v2e3")]
    fn aliases(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(short_alias(name), expected);
    }

    #[test]
    fn keyword_aliases_fall_back_to_the_name() {
        assert_eq!(unique_alias("one_name", &[]), "one_name");
        assert_eq!(unique_alias("orders", &["o".into()]), "o1");
    }

    #[test]
    fn infers_join_from_foreign_key() {
        let catalog = fixture_catalog();
        let items = get_join_suggestions(&at_caret("SELECT * FROM t1 JOIN |"), &catalog);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].insert_text, "t2 t2\n  ON t2.t1_id = t1.id");
        assert_eq!(items[0].label, "t2 t2 ON t2.t1_id = t1.id");
        assert!(items[0].source.as_ref().is_some_and(|s| s.name == "t2"));
    }

    #[test]
    fn infers_join_in_reverse_direction() {
        let catalog = fixture_catalog();
        let items = get_join_suggestions(&at_caret("SELECT * FROM orders o JOIN |"), &catalog);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].insert_text, "users u\n  ON o.user_id = u.id");
    }

    #[test]
    fn composite_keys_and_several_keys() {
        let catalog = Catalog::new([
            Entry::table("public", "parent", vec![], vec![]),
            Entry::table(
                "public",
                "child",
                vec![],
                vec![
                    ForeignKey::new(["a", "b"], "parent", ["x", "y"]),
                    ForeignKey::new(["c"], "parent", ["z"]),
                ],
            ),
        ]);
        let items = get_join_suggestions(&at_caret("SELECT * FROM parent p JOIN |"), &catalog);
        assert_eq!(
            items[0].insert_text,
            "child c\n  ON c.a = p.x AND c.b = p.y OR c.c = p.z"
        );
    }

    #[test]
    fn only_after_join() {
        let catalog = fixture_catalog();
        assert!(get_join_suggestions(&at_caret("SELECT * FROM t1 |"), &catalog).is_empty());
        assert!(get_join_suggestions(&at_caret("SELECT * FROM JOIN |"), &catalog).is_empty());
    }
}
