use crate::*;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::{Duration, Instant};
use testcontainers::{
    ContainerRequest, GenericImage, ImageExt,
    core::{IntoContainerPort as _, WaitFor, logs::LogFrame},
    runners::AsyncRunner as _,
};
use tokio::sync::OnceCell;

pub type Container = testcontainers::ContainerAsync<GenericImage>;

const PG_USER: &str = "postgres";
const PG_PASS: &str = "postgres";

// --- Shared server ---
/// One PostgreSQL server for the whole test binary, started on first use.
pub async fn postgres() -> &'static Container {
    static POSTGRES: OnceCell<Container> = OnceCell::const_new();
    const TRIES: u8 = 3;
    POSTGRES
        .get_or_init(|| async {
            for attempt in 1..=TRIES {
                match start().await {
                    Ok(container) => return container,
                    Err(e) => {
                        error!("Postgres start {attempt}/{TRIES} failed: {e:?}");
                        if attempt == TRIES {
                            std::process::exit(1);
                        }
                    }
                }
            }
            unreachable!()
        })
        .await
}

pub(super) async fn pool(database: &str) -> PgPool {
    let container = postgres().await;
    let url = format!(
        "postgres://{PG_USER}:{PG_PASS}@{}:{}/{database}",
        container.get_host().await.expect("container host"),
        container.get_host_port_ipv4(5432).await.expect("container port")
    );
    PgPoolOptions::new()
        .max_connections(3)
        .connect(&url)
        .await
        .expect("test pool connection")
}

async fn start() -> Result<Container> {
    let started = Instant::now();
    let container = image()
        .start()
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;
    debug!("Postgres ready in {:#.2?}", started.elapsed());
    Ok(container)
}

fn image() -> ContainerRequest<GenericImage> {
    // Durability off; the server only lives as long as the test run.
    const INIT_SQL: &[u8] = b"
        ALTER SYSTEM SET fsync = off;
        ALTER SYSTEM SET synchronous_commit = off;
        ALTER SYSTEM SET full_page_writes = off;";

    let mut image = GenericImage::new("postgres", "16-alpine")
        .with_exposed_port(5432.tcp())
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_copy_to("/docker-entrypoint-initdb.d/init.sql", INIT_SQL.to_vec())
        .with_env_var("POSTGRES_USER", PG_USER)
        .with_env_var("POSTGRES_PASSWORD", PG_PASS)
        .with_env_var("POSTGRES_DB", "postgres");

    if config().container_logs {
        image = image.with_log_consumer(|line: &LogFrame| trace!("[postgres] {line:?}"));
    }

    if config().container_ramdisked {
        image = image
            .with_env_var("PGDATA", "/dev/shm/pgdata")
            .with_shm_size(1024 * 1024 * 1024);
    }

    image.with_startup_timeout(Duration::from_secs(60))
}
