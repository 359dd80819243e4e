/// Persistence layer
///
/// Business logic talks to storage only through the traits in this module.
/// Two backends implement them:
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx (production)
/// - [`memory::MemoryStore`]: in-process vectors behind an async `RwLock`
///   (tests and `STORAGE=memory` development runs)
///
/// [`Stores`] bundles one implementation of each trait behind `Arc<dyn _>` so
/// it can be cloned into request handlers.
///
/// # Example
///
/// ```
/// use taskhub_shared::store::Stores;
/// use taskhub_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
///
/// let user = stores.users.create(CreateUser {
///     name: "Ana".to_string(),
///     email: "ana@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// assert!(stores.users.find_by_id(user.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::{CreateProject, Project};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;
pub mod query;

use query::{GroupCount, PageRequest, ProjectFilter, TaskField, TaskFilter, TaskSort};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated (e.g. email already registered)
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// A write targeted or referenced a record that no longer exists
    #[error("Record not found")]
    RowNotFound,

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::RowNotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Duplicate(
                    db_err
                        .constraint()
                        .unwrap_or("unique constraint")
                        .to_string(),
                )
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                StoreError::RowNotFound
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; fails with [`StoreError::Duplicate`] if the email is taken
    async fn create(&self, input: CreateUser) -> StoreResult<User>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Looks up a user by (already normalized) email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Loads the users with the given IDs; unknown IDs are skipped, order is unspecified
    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
}

/// Project records
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, input: CreateProject) -> StoreResult<Project>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Persists name and collaborators of an existing project and bumps
    /// `updated_at`. Fails with [`StoreError::RowNotFound`] if it was deleted.
    async fn save(&self, project: &Project) -> StoreResult<Project>;

    /// Deletes a project; returns whether it existed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    async fn count(&self, filter: &ProjectFilter) -> StoreResult<u64>;

    /// One page of matching projects, newest first
    async fn find(&self, filter: &ProjectFilter, page: PageRequest) -> StoreResult<Vec<Project>>;

    /// IDs of every matching project
    async fn ids(&self, filter: &ProjectFilter) -> StoreResult<Vec<Uuid>>;
}

/// Task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, input: CreateTask) -> StoreResult<Task>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Persists the mutable fields of an existing task and bumps `updated_at`
    async fn save(&self, task: &Task) -> StoreResult<Task>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Deletes every task of a project; returns how many were removed
    async fn delete_by_project(&self, project_id: Uuid) -> StoreResult<u64>;

    /// Whether any task matches
    async fn exists(&self, filter: &TaskFilter) -> StoreResult<bool>;

    async fn count(&self, filter: &TaskFilter) -> StoreResult<u64>;

    /// Matching tasks counted per value of `field`; empty groups are absent
    async fn count_by(&self, field: TaskField, filter: &TaskFilter) -> StoreResult<Vec<GroupCount>>;

    async fn find(&self, filter: &TaskFilter, sort: &TaskSort) -> StoreResult<Vec<Task>>;
}

/// Backend liveness probe
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// One implementation of every store trait
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Arc::new(postgres::PgStore::new(pool)))
    }

    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(memory::MemoryStore::new()))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + ProjectStore + TaskStore + HealthCheck + 'static,
    {
        Self {
            users: backend.clone(),
            projects: backend.clone(),
            tasks: backend.clone(),
            health: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
