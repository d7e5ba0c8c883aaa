use crate::testing::*;
use crate::*;
use sqlx::{PgPool, Postgres};
use test_context::AsyncTestContext;
pub use test_context::test_context;

/// A freshly created database on the shared test server, dropped afterwards.
pub struct IsolatedIntegrationTest {
    pub pool: PgPool,
    pub database: String,
}

impl IsolatedIntegrationTest {
    async fn create_database<'c, E: sqlx::Executor<'c, Database = Postgres>>(exec: E) -> String {
        use rand::Rng;
        let suffix: String = rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();
        let database = format!("pgcomplete_{}", suffix.to_lowercase());

        sqlx::query(sqlx::AssertSqlSafe(format!("CREATE DATABASE {database}")))
            .execute(exec)
            .await
            .expect("create test database");
        database
    }

    /// Runs a setup script against the isolated database.
    pub async fn seed(&self, script: &str) -> Result {
        sqlx::raw_sql(sqlx::AssertSqlSafe(script.to_string()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl AsyncTestContext for IsolatedIntegrationTest {
    async fn setup() -> Self {
        common_init();
        let admin = pool("postgres").await;
        let database = Self::create_database(&admin).await;
        admin.close().await;

        Self {
            pool: pool(&database).await,
            database,
        }
    }

    async fn teardown(self) {
        self.pool.close().await;

        let admin = pool("postgres").await;
        sqlx::query(sqlx::AssertSqlSafe(format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            self.database
        )))
        .execute(&admin)
        .await
        .expect("drop test database");
    }
}
