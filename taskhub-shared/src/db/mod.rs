/// PostgreSQL plumbing
///
/// - `pool`: connection pool creation and health checks
/// - `migrations`: embedded schema migrations
///
/// Queries themselves live in [`crate::store::postgres`].
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
/// use taskhub_shared::store::Stores;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
///     run_migrations(&pool).await?;
///
///     let stores = Stores::postgres(pool);
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
