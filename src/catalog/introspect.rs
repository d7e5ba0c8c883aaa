use crate::*;
use itertools::Itertools as _;
use sqlx::PgPool;
use std::collections::HashMap;

const RELATIONS: &str = "
    SELECT n.nspname::text, c.relname::text, c.relkind::text, obj_description(c.oid, 'pg_class')
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f')
      AND n.nspname NOT IN ('pg_catalog', 'information_schema')
      AND n.nspname NOT LIKE 'pg_toast%'";

const COLUMNS: &str = "
    SELECT n.nspname::text, c.relname::text, a.attnum::int4, a.attname::text,
           format_type(a.atttypid, a.atttypmod), a.attnotnull, a.atthasdef
    FROM pg_attribute a
    JOIN pg_class c ON c.oid = a.attrelid
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f')
      AND a.attnum > 0 AND NOT a.attisdropped
      AND n.nspname NOT IN ('pg_catalog', 'information_schema')
      AND n.nspname NOT LIKE 'pg_toast%'";

const FOREIGN_KEYS: &str = "
    SELECT n.nspname::text, c.relname::text, fn.nspname::text, fc.relname::text,
        ARRAY(SELECT a.attname::text FROM unnest(con.conkey) WITH ORDINALITY k(attnum, ord)
              JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
              ORDER BY k.ord),
        ARRAY(SELECT a.attname::text FROM unnest(con.confkey) WITH ORDINALITY k(attnum, ord)
              JOIN pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.attnum
              ORDER BY k.ord)
    FROM pg_constraint con
    JOIN pg_class c ON c.oid = con.conrelid
    JOIN pg_namespace n ON n.oid = c.relnamespace
    JOIN pg_class fc ON fc.oid = con.confrelid
    JOIN pg_namespace fn ON fn.oid = fc.relnamespace
    WHERE con.contype = 'f'";

const FUNCTIONS: &str = "
    SELECT n.nspname::text, p.proname::text, pg_get_function_arguments(p.oid),
           coalesce(pg_get_function_result(p.oid), ''), p.prokind::text, p.proretset,
           obj_description(p.oid, 'pg_proc')
    FROM pg_proc p
    JOIN pg_namespace n ON n.oid = p.pronamespace
    WHERE n.nspname <> 'information_schema'";

const DATA_TYPES: &str = "
    SELECT n.nspname::text, format_type(t.oid, NULL), obj_description(t.oid, 'pg_type')
    FROM pg_type t
    JOIN pg_namespace n ON n.oid = t.typnamespace
    WHERE t.typtype IN ('b', 'd', 'e', 'r', 'm')
      AND t.typcategory <> 'A'
      AND n.nspname NOT IN ('information_schema')
      AND n.nspname NOT LIKE 'pg_toast%'";

/// Objects attached to a table: (type, schema, table, name).
const TABLE_CHILDREN: &str = "
    SELECT 'policy', schemaname::text, tablename::text, policyname::text FROM pg_policies
    UNION ALL
    SELECT 'trigger', n.nspname::text, c.relname::text, t.tgname::text
    FROM pg_trigger t JOIN pg_class c ON c.oid = t.tgrelid JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE NOT t.tgisinternal
    UNION ALL
    SELECT 'rule', schemaname::text, tablename::text, rulename::text FROM pg_rules
    UNION ALL
    SELECT 'index', schemaname::text, tablename::text, indexname::text FROM pg_indexes
    WHERE schemaname NOT IN ('pg_catalog', 'information_schema')
    UNION ALL
    SELECT 'constraint', n.nspname::text, c.relname::text, con.conname::text
    FROM pg_constraint con JOIN pg_class c ON c.oid = con.conrelid JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname NOT IN ('pg_catalog', 'information_schema')";

/// Unparented objects: (type, name, comment).
const NAMED_OBJECTS: &str = "
    SELECT 'schema', nspname::text, obj_description(oid, 'pg_namespace') FROM pg_namespace
    WHERE nspname NOT LIKE 'pg_toast%' AND nspname NOT LIKE 'pg_temp%'
    UNION ALL
    SELECT 'role', rolname::text, NULL FROM pg_roles
    UNION ALL
    SELECT 'database', datname::text, NULL FROM pg_database WHERE NOT datistemplate
    UNION ALL
    SELECT 'tablespace', spcname::text, NULL FROM pg_tablespace
    UNION ALL
    SELECT 'publication', pubname::text, NULL FROM pg_publication
    UNION ALL
    SELECT 'event trigger', evtname::text, NULL FROM pg_event_trigger
    UNION ALL
    SELECT DISTINCT 'operator', oprname::text, NULL FROM pg_operator
    UNION ALL
    SELECT 'keyword', upper(word), catdesc FROM pg_get_keywords()";

const SEQUENCES: &str = "SELECT schemaname::text, sequencename::text FROM pg_sequences";

const EXTENSIONS: &str = "SELECT name::text, installed_version IS NOT NULL, comment FROM pg_available_extensions";

const SUBSCRIPTIONS: &str = "SELECT subname::text FROM pg_subscription";

const SETTINGS: &str = "
    SELECT name, setting, unit, category, short_desc, vartype, coalesce(enumvals, '{}')
    FROM pg_settings";

type ColumnRow = (String, String, i32, String, String, bool, bool);
type ForeignKeyRow = (String, String, String, String, Vec<String>, Vec<String>);
type FunctionRow = (String, String, String, String, String, bool, Option<String>);
type SettingRow = (
    String,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    String,
    Vec<String>,
);

/// Reads a full catalog snapshot from the connected database.
///
/// Lookups needing elevated privileges (subscriptions) are skipped with a
/// warning when they fail.
pub async fn introspect(pool: &PgPool) -> Result<Catalog> {
    let mut entries = relations(pool).await?;

    let functions: Vec<FunctionRow> = sqlx::query_as(FUNCTIONS).fetch_all(pool).await?;
    entries.extend(functions.into_iter().map(
        |(schema, name, args, returns, kind, retset, comment)| {
            let kind = match kind.as_str() {
                "a" => FunctionKind::Aggregate,
                "w" => FunctionKind::Window,
                "p" => FunctionKind::Procedure,
                _ => FunctionKind::Normal,
            };
            let mut info = FunctionInfo::new(args, returns).kind(kind);
            info.returns_set = retset;
            with_comment(Entry::function(&schema, name, info), comment)
        },
    ));

    let types: Vec<(String, String, Option<String>)> =
        sqlx::query_as(DATA_TYPES).fetch_all(pool).await?;
    entries.extend(
        types
            .into_iter()
            .map(|(schema, name, comment)| with_comment(Entry::data_type(&schema, name), comment)),
    );

    let children: Vec<(String, String, String, String)> =
        sqlx::query_as(TABLE_CHILDREN).fetch_all(pool).await?;
    entries.extend(children.into_iter().filter_map(|(kind, schema, table, name)| {
        let object_type = ObjectType::parse_expect(&kind).into_iter().next()?;
        Some(Entry::child(object_type, &schema, &table, name))
    }));

    let named: Vec<(String, String, Option<String>)> =
        sqlx::query_as(NAMED_OBJECTS).fetch_all(pool).await?;
    entries.extend(named.into_iter().filter_map(|(kind, name, comment)| {
        let entry = match kind.as_str() {
            "keyword" => Entry::keyword(name),
            "operator" => Entry::operator(name),
            other => Entry::new(ObjectType::parse_expect(other).into_iter().next()?, None, name),
        };
        Some(with_comment(entry, comment))
    }));

    let sequences: Vec<(String, String)> = sqlx::query_as(SEQUENCES).fetch_all(pool).await?;
    entries.extend(
        sequences
            .into_iter()
            .map(|(schema, name)| Entry::new(ObjectType::Sequence, Some(&schema), name)),
    );

    let extensions: Vec<(String, bool, Option<String>)> =
        sqlx::query_as(EXTENSIONS).fetch_all(pool).await?;
    entries.extend(
        extensions
            .into_iter()
            .map(|(name, installed, comment)| with_comment(Entry::extension(name, installed), comment)),
    );

    match sqlx::query_as::<_, (String,)>(SUBSCRIPTIONS).fetch_all(pool).await {
        Ok(subs) => entries.extend(
            subs.into_iter()
                .map(|(name,)| Entry::new(ObjectType::Subscription, None, name)),
        ),
        Err(e) => warn!("Skipping subscriptions: {e}"),
    }

    let settings: Vec<SettingRow> = sqlx::query_as(SETTINGS).fetch_all(pool).await?;
    entries.extend(settings.into_iter().map(
        |(name, setting, unit, category, desc, vartype, enum_values)| {
            let info = SettingInfo {
                category,
                vartype,
                setting,
                unit,
                enum_values,
            };
            with_comment(Entry::setting(name, info), desc)
        },
    ));

    let catalog = Catalog::new(entries);
    debug!("Introspected {} catalog entries", catalog.len());
    Ok(catalog)
}

/// Tables, views and materialized views with their columns and foreign keys.
async fn relations(pool: &PgPool) -> Result<Vec<Entry>> {
    let relations: Vec<(String, String, String, Option<String>)> =
        sqlx::query_as(RELATIONS).fetch_all(pool).await?;
    let columns: Vec<ColumnRow> = sqlx::query_as(COLUMNS).fetch_all(pool).await?;
    let foreign_keys: Vec<ForeignKeyRow> = sqlx::query_as(FOREIGN_KEYS).fetch_all(pool).await?;

    let mut columns_by_table: HashMap<(String, String), Vec<ColumnInfo>> = columns
        .into_iter()
        .map(|(schema, table, ordinal, name, data_type, not_null, has_default)| {
            let mut column = ColumnInfo::new(ordinal.max(0) as u32, name, data_type);
            column.not_null = not_null;
            column.has_default = has_default;
            ((schema, table), column)
        })
        .into_group_map();
    let mut keys_by_table: HashMap<(String, String), Vec<ForeignKey>> = foreign_keys
        .into_iter()
        .map(|(schema, table, fschema, ftable, columns, fcolumns)| {
            ((schema, table), ForeignKey::new(columns, ftable, fcolumns).in_schema(fschema))
        })
        .into_group_map();

    Ok(relations
        .into_iter()
        .map(|(schema, name, relkind, comment)| {
            let key = (schema.clone(), name.clone());
            let mut columns = columns_by_table.remove(&key).unwrap_or_default();
            columns.sort_by_key(|c| c.ordinal);
            let entry = match relkind.as_str() {
                "v" => Entry::view(&schema, name, columns),
                "m" => Entry::mview(&schema, name, columns),
                _ => Entry::table(
                    &schema,
                    name,
                    columns,
                    keys_by_table.remove(&key).unwrap_or_default(),
                ),
            };
            with_comment(entry, comment)
        })
        .collect())
}

fn with_comment(entry: Entry, comment: Option<String>) -> Entry {
    match comment {
        Some(comment) if !comment.is_empty() => entry.with_docs(comment),
        _ => entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    async fn reads_tables_columns_and_foreign_keys(ctx: &mut IsolatedIntegrationTest) -> Result {
        sqlx::raw_sql(
            "CREATE TABLE t1 (id int PRIMARY KEY, label text);
             CREATE TABLE t2 (id int PRIMARY KEY, t1_id int REFERENCES t1(id));
             CREATE VIEW v1 AS SELECT id FROM t1;
             COMMENT ON TABLE t1 IS 'first table';",
        )
        .execute(&ctx.pool)
        .await?;

        let catalog = introspect(&ctx.pool).await?;
        let t1 = catalog.find_table("t1").expect("t1");
        assert_eq!(t1.documentation.as_deref(), Some("first table"));
        let columns: Vec<_> = catalog.columns_of(t1).iter().map(|c| c.name.clone()).collect();
        assert_eq!(columns, vec!["id", "label"]);

        let t2 = catalog.find_table("t2").expect("t2");
        let fk = &t2.table_info().expect("table info").foreign_keys[0];
        assert_eq!(fk.columns, vec!["t1_id"]);
        assert!(fk.references(t1));

        assert_eq!(catalog.find_table("v1").map(|v| v.object_type), Some(ObjectType::View));
        assert!(catalog.find(ObjectType::Schema, "public").is_some());
        assert!(catalog.functions_named("count").iter().any(|f| {
            f.function_info().map(|i| i.kind) == Some(FunctionKind::Aggregate)
        }));
        assert!(catalog.setting("statement_timeout").is_some());
        assert!(catalog.keyword_docs("SELECT").is_some());
        Ok(())
    }

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    async fn handle_refresh_picks_up_new_objects(ctx: &mut IsolatedIntegrationTest) -> Result {
        let handle = CatalogHandle::default();
        let before = handle.refresh(&ctx.pool).await?;
        assert!(before.find_table("late").is_none());

        sqlx::query("CREATE TABLE late (id int)").execute(&ctx.pool).await?;
        let after = handle.refresh(&ctx.pool).await?;
        assert!(after.find_table("late").is_some());
        assert!(before.find_table("late").is_none());
        Ok(())
    }
}
