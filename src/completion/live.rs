use crate::*;
use futures::future::BoxFuture;
use sqlx::{PgPool, Row as _};
use std::{sync::Arc, time::Duration};

/// Rows of a live lookup, every value rendered as text.
pub type LiveRows = Vec<Vec<Option<String>>>;

/// Shape of the result a caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Rows,
    Row,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Arc<LiveRows>),
    Row(Option<Vec<Option<String>>>),
    Value(Option<String>),
}

impl QueryOutput {
    pub(crate) fn shaped(rows: Arc<LiveRows>, return_type: ReturnType) -> Self {
        match return_type {
            ReturnType::Rows => QueryOutput::Rows(rows),
            ReturnType::Row => QueryOutput::Row(rows.first().cloned()),
            ReturnType::Value => {
                QueryOutput::Value(rows.first().and_then(|r| r.first().cloned()).flatten())
            }
        }
    }

    /// All rows; a single row or value yields at most one row.
    pub fn into_rows(self) -> Vec<Vec<Option<String>>> {
        match self {
            QueryOutput::Rows(rows) => rows.as_ref().clone(),
            QueryOutput::Row(row) => row.into_iter().collect(),
            QueryOutput::Value(value) => value.map(|v| vec![vec![Some(v)]]).unwrap_or_default(),
        }
    }
}

/// Read-only access to the database while completing.
///
/// Matchers use this for lookups that cannot come from the catalog
/// snapshot, such as server-side directory listings. Queries must select
/// text columns.
pub trait LiveQuery: Send + Sync {
    fn query<'a>(
        &'a self,
        sql: &'a str,
        args: &'a [String],
        return_type: ReturnType,
    ) -> BoxFuture<'a, Result<QueryOutput>>;
}

/// [`LiveQuery`] over a connection pool.
///
/// Each query runs in its own rolled-back transaction with a local
/// `statement_timeout`, and results are cached for a short while keyed by
/// the SQL text and arguments.
#[derive(Clone)]
pub struct PgLiveQuery {
    pool: PgPool,
    timeout: Duration,
    cache: moka::future::Cache<(String, Vec<String>), Arc<LiveRows>>,
}

impl PgLiveQuery {
    pub fn new(pool: PgPool) -> Self {
        Self::with_limits(pool, config().statement_timeout(), config().live_cache_ttl())
    }

    pub fn with_limits(pool: PgPool, timeout: Duration, cache_ttl: Duration) -> Self {
        Self {
            pool,
            timeout,
            cache: moka::future::Cache::builder()
                .max_capacity(256)
                .time_to_live(cache_ttl)
                .build(),
        }
    }

    async fn run(&self, sql: &str, args: &[String]) -> Result<LiveRows> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(sqlx::AssertSqlSafe(format!(
            "SET LOCAL statement_timeout = {}",
            self.timeout.as_millis()
        )))
        .execute(&mut *tx)
        .await?;

        let mut query = sqlx::query(sqlx::AssertSqlSafe(sql.to_string()));
        for arg in args {
            query = query.bind(arg.clone());
        }
        let rows = query.fetch_all(&mut *tx).await?;
        tx.rollback().await?;

        Ok(rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| row.try_get::<Option<String>, _>(i).ok().flatten())
                    .collect()
            })
            .collect())
    }
}

impl LiveQuery for PgLiveQuery {
    fn query<'a>(
        &'a self,
        sql: &'a str,
        args: &'a [String],
        return_type: ReturnType,
    ) -> BoxFuture<'a, Result<QueryOutput>> {
        Box::pin(async move {
            let key = (sql.to_string(), args.to_vec());
            if let Some(rows) = self.cache.get(&key).await {
                trace!("Live query cache hit: {sql}");
                return Ok(QueryOutput::shaped(rows, return_type));
            }

            // The server-side timeout should fire first; this bounds pool waits.
            let rows = tokio::time::timeout(self.timeout * 5, self.run(sql, args))
                .await
                .map_err(|_| Error::Timeout(self.timeout))??;
            let rows = Arc::new(rows);
            self.cache.insert(key, rows.clone()).await;
            Ok(QueryOutput::shaped(rows, return_type))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    async fn returns_text_rows(ctx: &mut IsolatedIntegrationTest) -> Result {
        let live = PgLiveQuery::with_limits(
            ctx.pool.clone(),
            Duration::from_millis(500),
            Duration::from_secs(5),
        );
        let rows = live
            .query("SELECT $1::text, NULL::text", &["hello".into()], ReturnType::Rows)
            .await?;
        assert_eq!(rows.into_rows(), vec![vec![Some("hello".to_string()), None]]);

        let value = live
            .query("SELECT current_database()::text", &[], ReturnType::Value)
            .await?;
        assert_eq!(value, QueryOutput::Value(Some(ctx.database.clone())));
        Ok(())
    }

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    async fn slow_queries_fail(ctx: &mut IsolatedIntegrationTest) -> Result {
        let live = PgLiveQuery::with_limits(
            ctx.pool.clone(),
            Duration::from_millis(100),
            Duration::from_secs(5),
        );
        let result = live.query("SELECT pg_sleep(2)::text", &[], ReturnType::Value).await;
        assert!(result.is_err());
        Ok(())
    }

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    async fn caches_results(ctx: &mut IsolatedIntegrationTest) -> Result {
        let live = PgLiveQuery::with_limits(
            ctx.pool.clone(),
            Duration::from_millis(500),
            Duration::from_secs(60),
        );
        let sql = "SELECT count(*)::text FROM cached";
        sqlx::query("CREATE TABLE cached (id int)").execute(&ctx.pool).await?;
        let first = live.query(sql, &[], ReturnType::Value).await?;
        sqlx::query("INSERT INTO cached VALUES (1)").execute(&ctx.pool).await?;
        let second = live.query(sql, &[], ReturnType::Value).await?;
        assert_eq!(first, QueryOutput::Value(Some("0".into())));
        assert_eq!(first, second);
        Ok(())
    }
}
