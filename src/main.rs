use pgcomplete::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: pgcomplete <sql> [caret]";

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let sql = args.next().ok_or_else(|| Error::Config(USAGE.into()))?;
    let caret = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|e| Error::Config(format!("invalid caret `{raw}`: {e}")))?,
        None => sql.len(),
    };
    if caret > sql.len() || !sql.is_char_boundary(caret) {
        return Err(Error::Config(format!("caret {caret} is not a position in the statement")));
    }

    let (catalog, live) = match &config().database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url).await?;
            let catalog = CATALOG.refresh(&pool).await?;
            (catalog, Some(PgLiveQuery::new(pool)))
        }
        None => (Arc::new(Catalog::default()), None),
    };

    let live = live.as_ref().map(|l| l as &dyn LiveQuery);
    for item in complete(&sql, caret, &catalog, live).await {
        println!("{}  {}  [{}]", item.sort_text, item.label, item.object_type);
    }
    Ok(())
}
