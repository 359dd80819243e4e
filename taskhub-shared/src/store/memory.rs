/// In-memory store
///
/// Keeps every table in a `Vec` behind one `tokio::sync::RwLock`. Used by the
/// test suites and by `STORAGE=memory` development runs; nothing survives a
/// restart.
///
/// Behaves like the PostgreSQL store where callers can observe it:
///
/// - emails are unique ([`StoreError::Duplicate`])
/// - `save` on a deleted record fails with [`StoreError::RowNotFound`]
/// - creating a task for a missing project fails with [`StoreError::RowNotFound`]
/// - deleting a project deletes its tasks
/// - filtering and ordering use the shared definitions in [`super::query`]
///
/// Timestamps come from a monotonic clock so records created back to back
/// still order deterministically by `created_at`.
///
/// # Example
///
/// ```
/// use taskhub_shared::store::memory::MemoryStore;
/// use taskhub_shared::store::UserStore;
/// use taskhub_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let input = CreateUser {
///     name: "Ana".to_string(),
///     email: "ana@example.com".to_string(),
///     password_hash: "hash".to_string(),
/// };
///
/// UserStore::create(&store, input.clone()).await?;
/// assert!(UserStore::create(&store, input).await.is_err());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::query::{GroupCount, PageRequest, ProjectFilter, TaskField, TaskFilter, TaskSort};
use super::{HealthCheck, ProjectStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::project::{CreateProject, Project};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    // Strictly increasing wall clock
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }
}

/// In-process implementation of the store traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, input: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.email == input.email) {
            return Err(StoreError::Duplicate("users_email_key".to_string()));
        }

        let now = tables.now();
        let user = User {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            password_hash: input.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create(&self, input: CreateProject) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;

        let now = tables.now();
        let project = Project {
            id: Uuid::new_v4(),
            name: input.name,
            creator_id: input.creator_id,
            collaborators: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());

        Ok(project)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, project: &Project) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;

        let now = tables.now();
        let stored = tables
            .projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or(StoreError::RowNotFound)?;

        stored.name = project.name.clone();
        stored.collaborators = project.collaborators.clone();
        stored.updated_at = now;

        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        let existed = tables.projects.len() < before;

        // Same effect as ON DELETE CASCADE on tasks.project_id
        if existed {
            tables.tasks.retain(|t| t.project_id != id);
        }

        Ok(existed)
    }

    async fn count(&self, filter: &ProjectFilter) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn find(&self, filter: &ProjectFilter, page: PageRequest) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;

        let mut projects: Vec<Project> = tables
            .projects
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(projects
            .into_iter()
            .skip(offset)
            .take(page.limit as usize)
            .collect())
    }

    async fn ids(&self, filter: &ProjectFilter) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .filter(|p| filter.matches(p))
            .map(|p| p.id)
            .collect())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, input: CreateTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;

        // Foreign key on tasks.project_id
        if !tables.projects.iter().any(|p| p.id == input.project_id) {
            return Err(StoreError::RowNotFound);
        }

        let now = tables.now();
        let task = Task {
            id: Uuid::new_v4(),
            description: input.description,
            status: input.status,
            priority: input.priority,
            project_id: input.project_id,
            assigned_to: input.assigned_to,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(task.clone());

        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn save(&self, task: &Task) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;

        let now = tables.now();
        let stored = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(StoreError::RowNotFound)?;

        stored.description = task.description.clone();
        stored.status = task.status;
        stored.priority = task.priority;
        stored.assigned_to = task.assigned_to;
        stored.updated_at = now;

        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);

        Ok(tables.tasks.len() < before)
    }

    async fn delete_by_project(&self, project_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;

        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.project_id != project_id);

        Ok((before - tables.tasks.len()) as u64)
    }

    async fn exists(&self, filter: &TaskFilter) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().any(|t| filter.matches(t)))
    }

    async fn count(&self, filter: &TaskFilter) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().filter(|t| filter.matches(t)).count() as u64)
    }

    async fn count_by(
        &self,
        field: TaskField,
        filter: &TaskFilter,
    ) -> StoreResult<Vec<GroupCount>> {
        let tables = self.tables.read().await;

        let mut groups: Vec<GroupCount> = Vec::new();
        for task in tables.tasks.iter().filter(|t| filter.matches(t)) {
            let key = field.key_of(task);
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.count += 1,
                None => groups.push(GroupCount {
                    key: key.to_string(),
                    count: 1,
                }),
            }
        }

        Ok(groups)
    }

    async fn find(&self, filter: &TaskFilter, sort: &TaskSort) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;

        let mut tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| sort.compare(a, b));

        Ok(tasks)
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
