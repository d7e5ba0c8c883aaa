#![cfg(test)]
crate::reexport!(container);
crate::reexport!(context);
crate::reexport!(fixtures);
pub use rstest::*;

pub(crate) fn common_init() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

mod isolated_integration_tests {
    use super::{super::*, *};

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    async fn can_connect(ctx: &mut IsolatedIntegrationTest) -> Result {
        sqlx::query("SELECT 1;").fetch_one(&ctx.pool).await?;
        Ok(())
    }

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    async fn is_isolated_database(ctx: &mut IsolatedIntegrationTest) -> Result {
        let database: String = sqlx::query_scalar("SELECT current_database();")
            .fetch_one(&ctx.pool)
            .await?;
        assert_eq!(ctx.database, database);
        Ok(())
    }
}
