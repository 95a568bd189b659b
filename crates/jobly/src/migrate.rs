//! Schema migrations via [`refinery`].
//!
//! The SQL files under `crates/jobly/migrations/` are embedded at compile
//! time, so the server binary can bring an empty database up to date with
//! `--migrate`.

use crate::error::JoblyResult;

pub use refinery::{Report, Runner};

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Runner over the embedded migrations.
pub fn runner() -> Runner {
    embedded::migrations::runner()
}

/// Apply pending migrations on `client`.
pub async fn run(client: &mut tokio_postgres::Client) -> JoblyResult<Report> {
    let report = runner().run_async(client).await?;
    for migration in report.applied_migrations() {
        tracing::info!(
            version = migration.version(),
            name = migration.name(),
            "applied migration"
        );
    }
    Ok(report)
}

/// Apply pending migrations using a connection from `pool`.
#[cfg(feature = "pool")]
pub async fn run_pool(pool: &deadpool_postgres::Pool) -> JoblyResult<Report> {
    let mut client = pool.get().await?;
    run(&mut client).await
}
