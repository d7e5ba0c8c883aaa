use crate::*;
use std::sync::{Arc, LazyLock};
use tokio::sync::RwLock;

/// Immutable set of catalog entries plus server settings.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    entries: Vec<Arc<Entry>>,
    settings: Vec<Arc<Entry>>,
}

impl Catalog {
    /// Builds a snapshot. Setting entries are kept apart, and columns listed
    /// on table-like entries get their own column entries unless the input
    /// already provides them.
    pub fn new(entries: impl IntoIterator<Item = Entry>) -> Self {
        let (settings, entries): (Vec<Entry>, Vec<Entry>) = entries
            .into_iter()
            .partition(|e| e.object_type == ObjectType::Setting);

        let mut expanded = Vec::with_capacity(entries.len());
        for entry in &entries {
            let Some(info) = entry.table_info() else { continue };
            let schema = entry.schema.as_deref().unwrap_or("public");
            for column in &info.columns {
                let exists = entries.iter().any(|e| {
                    e.object_type == ObjectType::Column
                        && e.name == column.name
                        && e.parent.as_deref() == Some(entry.name.as_str())
                        && e.schema == entry.schema
                });
                if !exists {
                    expanded.push(Entry::column(schema, &entry.name, column.clone()));
                }
            }
        }

        Self {
            entries: entries.into_iter().chain(expanded).map(Arc::new).collect(),
            settings: settings.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    pub fn settings(&self) -> &[Arc<Entry>] {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn of_type(&self, object_type: ObjectType) -> impl Iterator<Item = &Arc<Entry>> {
        self.entries.iter().filter(move |e| e.object_type == object_type)
    }

    pub fn of_types<'a>(&'a self, types: &'a [ObjectType]) -> impl Iterator<Item = &'a Arc<Entry>> {
        self.entries
            .iter()
            .filter(move |e| types.contains(&e.object_type))
    }

    /// Table, view or materialized view written as `written`.
    pub fn find_table(&self, written: &str) -> Option<&Arc<Entry>> {
        let mut matches = self
            .entries
            .iter()
            .filter(|e| e.object_type.is_tabular() && e.is_written_as(written));
        let first = matches.next()?;
        // Unqualified names resolve to public first, as with a default search_path.
        Some(
            std::iter::once(first)
                .chain(matches)
                .find(|e| e.is_public())
                .unwrap_or(first),
        )
    }

    /// Column entries of a table-like entry, in ordinal order.
    pub fn columns_of(&self, table: &Entry) -> Vec<&Arc<Entry>> {
        let mut columns: Vec<_> = self
            .of_type(ObjectType::Column)
            .filter(|c| c.parent.as_deref() == Some(table.name.as_str()) && c.schema == table.schema)
            .collect();
        columns.sort_by_key(|c| c.column_info().map_or(u32::MAX, |i| i.ordinal));
        columns
    }

    pub fn find(&self, object_type: ObjectType, name: &str) -> Option<&Arc<Entry>> {
        self.of_type(object_type).find(|e| e.name == name)
    }

    /// Functions with the given lower-cased name, any schema.
    pub fn functions_named(&self, name_lc: &str) -> Vec<&Arc<Entry>> {
        self.of_type(ObjectType::Function)
            .filter(|f| f.name.to_lowercase() == name_lc)
            .collect()
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.find(ObjectType::Schema, name).is_some()
    }

    /// Documentation attached to a keyword entry.
    pub fn keyword_docs(&self, kwd: &str) -> Option<&str> {
        self.of_type(ObjectType::Keyword)
            .find(|k| k.name.eq_ignore_ascii_case(kwd))
            .and_then(|k| k.documentation.as_deref())
    }

    pub fn setting(&self, name: &str) -> Option<&Arc<Entry>> {
        self.settings.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// Shared, swappable catalog snapshot.
///
/// Requests take a snapshot once and keep using it, so a refresh never
/// changes the catalog underneath a running completion.
#[derive(Debug, Default)]
pub struct CatalogHandle {
    inner: RwLock<Arc<Catalog>>,
}

pub static CATALOG: LazyLock<CatalogHandle> = LazyLock::new(CatalogHandle::default);

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(Arc::new(catalog)),
        }
    }

    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.inner.read().await.clone()
    }

    /// Swaps in a new catalog, returning the previous one.
    pub async fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let mut guard = self.inner.write().await;
        std::mem::replace(&mut *guard, Arc::new(catalog))
    }

    /// Re-reads the catalog from the database and swaps it in.
    pub async fn refresh(&self, pool: &sqlx::PgPool) -> Result<Arc<Catalog>> {
        let catalog = introspect(pool).await?;
        info!("Catalog refreshed with {} entries", catalog.len());
        self.replace(catalog).await;
        Ok(self.snapshot().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn sample() -> Catalog {
        Catalog::new([
            Entry::table(
                "public",
                "users",
                vec![ColumnInfo::new(2, "name", "text"), ColumnInfo::new(1, "id", "integer")],
                vec![],
            ),
            Entry::table("audit", "users", vec![ColumnInfo::new(1, "at", "timestamp")], vec![]),
            Entry::schema("audit"),
            Entry::keyword("select").with_docs("Retrieve rows"),
            Entry::setting("work_mem", SettingInfo::default()),
        ])
    }

    #[test]
    fn expands_columns_and_splits_settings() {
        let catalog = sample();
        assert_eq!(catalog.of_type(ObjectType::Column).count(), 3);
        assert_eq!(catalog.settings().len(), 1);
        assert!(catalog.of_type(ObjectType::Setting).next().is_none());
        assert!(catalog.setting("WORK_MEM").is_some());
    }

    #[test]
    fn does_not_duplicate_explicit_columns() {
        let catalog = Catalog::new([
            Entry::table("public", "t", vec![ColumnInfo::new(1, "id", "int")], vec![]),
            Entry::column("public", "t", ColumnInfo::new(1, "id", "int")),
        ]);
        assert_eq!(catalog.of_type(ObjectType::Column).count(), 1);
    }

    #[test]
    fn resolves_tables_and_columns() {
        let catalog = sample();
        let users = catalog.find_table("users").unwrap();
        assert_eq!(users.schema.as_deref(), Some("public"));
        let names: Vec<_> = catalog.columns_of(users).iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["id", "name"]);

        let audit = catalog.find_table("audit.users").unwrap();
        assert_eq!(catalog.columns_of(audit).len(), 1);
        assert!(catalog.has_schema("audit"));
        assert_eq!(catalog.keyword_docs("SELECT"), Some("Retrieve rows"));
    }

    #[tokio::test]
    async fn handle_swaps_snapshots() {
        let handle = CatalogHandle::new(sample());
        let before = handle.snapshot().await;
        let old = handle.replace(Catalog::default()).await;
        assert!(Arc::ptr_eq(&before, &old));
        assert!(handle.snapshot().await.is_empty());
        assert!(!before.is_empty(), "held snapshots stay intact");
    }
}
