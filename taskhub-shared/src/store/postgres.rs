/// PostgreSQL store
///
/// Implements every store trait over a single [`PgPool`]. Queries use
/// runtime-checked `sqlx::query_as` so the crate builds without a live
/// database; column lists are spelled out to match the `FromRow` structs.
///
/// Task filters compile to one parameterized `WHERE` clause where each
/// optional criterion is written as `($n IS NULL OR column = $n)`, so every
/// filter shape shares the same statement text per query kind.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::query::{GroupCount, PageRequest, ProjectFilter, TaskField, TaskFilter, TaskSort};
use super::{HealthCheck, ProjectStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::project::{CreateProject, Project};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, name, creator_id, collaborators, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, description, status, priority, project_id, assigned_to, created_at, updated_at";

const PROJECT_MEMBER_WHERE: &str = "creator_id = $1 OR $1 = ANY(collaborators)";
const TASK_FILTER_WHERE: &str = "project_id = ANY($1) \
     AND ($2::task_status IS NULL OR status = $2) \
     AND ($3::task_priority IS NULL OR priority = $3) \
     AND ($4::uuid IS NULL OR assigned_to = $4)";

/// PostgreSQL implementation of the store traits
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Binds a TaskFilter to a query built around TASK_FILTER_WHERE.
macro_rules! bind_task_filter {
    ($query:expr, $filter:expr) => {
        $query
            .bind($filter.project_ids.as_slice())
            .bind($filter.status)
            .bind($filter.priority)
            .bind($filter.assigned_to)
    };
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, input: CreateUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(input.name)
            .bind(input.email)
            .bind(input.password_hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);

        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create(&self, input: CreateProject) -> StoreResult<Project> {
        let sql = format!(
            "INSERT INTO projects (name, creator_id) VALUES ($1, $2) RETURNING {}",
            PROJECT_COLUMNS
        );

        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(input.name)
            .bind(input.creator_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(project)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);

        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    async fn save(&self, project: &Project) -> StoreResult<Project> {
        let sql = format!(
            "UPDATE projects SET name = $2, collaborators = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.name)
            .bind(project.collaborators.as_slice())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RowNotFound)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, filter: &ProjectFilter) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM projects WHERE {}", PROJECT_MEMBER_WHERE);

        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(filter.member_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn find(&self, filter: &ProjectFilter, page: PageRequest) -> StoreResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE {} \
             ORDER BY created_at DESC, id ASC LIMIT $2 OFFSET $3",
            PROJECT_COLUMNS, PROJECT_MEMBER_WHERE
        );

        let projects = sqlx::query_as::<_, Project>(&sql)
            .bind(filter.member_id)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(projects)
    }

    async fn ids(&self, filter: &ProjectFilter) -> StoreResult<Vec<Uuid>> {
        let sql = format!("SELECT id FROM projects WHERE {}", PROJECT_MEMBER_WHERE);

        let ids: Vec<(Uuid,)> = sqlx::query_as(&sql)
            .bind(filter.member_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create(&self, input: CreateTask) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (description, status, priority, project_id, assigned_to) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(input.description)
            .bind(input.status)
            .bind(input.priority)
            .bind(input.project_id)
            .bind(input.assigned_to)
            .fetch_one(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn save(&self, task: &Task) -> StoreResult<Task> {
        // project_id is immutable
        let sql = format!(
            "UPDATE tasks SET description = $2, status = $3, priority = $4, assigned_to = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.assigned_to)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RowNotFound)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_project(&self, project_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn exists(&self, filter: &TaskFilter) -> StoreResult<bool> {
        if filter.project_ids.is_empty() {
            return Ok(false);
        }

        let sql = format!("SELECT EXISTS (SELECT 1 FROM tasks WHERE {})", TASK_FILTER_WHERE);

        let (exists,): (bool,) = bind_task_filter!(sqlx::query_as(&sql), filter)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn count(&self, filter: &TaskFilter) -> StoreResult<u64> {
        if filter.project_ids.is_empty() {
            return Ok(0);
        }

        let sql = format!("SELECT COUNT(*) FROM tasks WHERE {}", TASK_FILTER_WHERE);

        let (count,): (i64,) = bind_task_filter!(sqlx::query_as(&sql), filter)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn count_by(
        &self,
        field: TaskField,
        filter: &TaskFilter,
    ) -> StoreResult<Vec<GroupCount>> {
        if filter.project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let column = field.column();
        let sql = format!(
            "SELECT {column}::text AS key, COUNT(*) AS count FROM tasks WHERE {} GROUP BY {column}",
            TASK_FILTER_WHERE
        );

        let groups = bind_task_filter!(sqlx::query_as::<_, GroupCount>(&sql), filter)
            .fetch_all(&self.pool)
            .await?;

        Ok(groups)
    }

    async fn find(&self, filter: &TaskFilter, sort: &TaskSort) -> StoreResult<Vec<Task>> {
        if filter.project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM tasks WHERE {} ORDER BY {}",
            TASK_COLUMNS,
            TASK_FILTER_WHERE,
            sort.order_by_sql()
        );

        let tasks = bind_task_filter!(sqlx::query_as::<_, Task>(&sql), filter)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
