/// Per-user statistics
///
/// Rolls up the projects a user created or collaborates on, and the tasks in
/// those projects. Every status and priority appears in the breakdowns, with
/// zero for empty buckets.
///
/// # Response shape
///
/// ```json
/// {
///   "totalProjects": 2,
///   "totalTasks": 3,
///   "tasksByStatus": { "pending": 2, "in-progress": 0, "completed": 1 },
///   "tasksByPriority": { "low": 0, "medium": 3, "high": 0 },
///   "assignedToUser": 1,
///   "completionRate": 0.3333333333333333,
///   "avgTasksPerProject": 1.5
/// }
/// ```

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::task::{TaskPriority, TaskStatus};
use crate::store::query::{GroupCount, ProjectFilter, TaskField, TaskFilter};
use crate::store::Stores;

/// Statistics for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_projects: u64,
    pub total_tasks: u64,
    /// Ordered by status rank
    pub tasks_by_status: BTreeMap<TaskStatus, u64>,
    /// Ordered by priority rank
    pub tasks_by_priority: BTreeMap<TaskPriority, u64>,
    /// Tasks in the user's projects that are assigned to the user
    pub assigned_to_user: u64,
    /// Completed tasks over all tasks; 0 without tasks
    pub completion_rate: f64,
    /// Tasks over projects; 0 without projects
    pub avg_tasks_per_project: f64,
}

// Zero-fills every known key, then copies the store's counts over it.
fn breakdown<K>(all: &[K], groups: &[GroupCount]) -> BTreeMap<K, u64>
where
    K: Ord + Copy + std::str::FromStr,
{
    let mut map: BTreeMap<K, u64> = all.iter().map(|k| (*k, 0)).collect();
    for group in groups {
        match group.key.parse::<K>() {
            Ok(key) => {
                map.insert(key, group.count.max(0) as u64);
            }
            Err(_) => tracing::warn!(key = %group.key, "Ignoring unknown group key"),
        }
    }
    map
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Computes [`UserStats`] for `user_id`
///
/// The project lookups run concurrently, then the four task aggregates run
/// concurrently over the resulting project set.
pub async fn compute_user_stats(stores: &Stores, user_id: Uuid) -> DomainResult<UserStats> {
    let projects = ProjectFilter::accessible_by(user_id);

    let (project_ids, total_projects) = tokio::try_join!(
        stores.projects.ids(&projects),
        stores.projects.count(&projects),
    )?;

    let tasks = TaskFilter::in_projects(project_ids);
    let assigned = tasks.clone().assigned_to(user_id);

    let (total_tasks, by_status, by_priority, assigned_to_user) = tokio::try_join!(
        stores.tasks.count(&tasks),
        stores.tasks.count_by(TaskField::Status, &tasks),
        stores.tasks.count_by(TaskField::Priority, &tasks),
        stores.tasks.count(&assigned),
    )?;

    let tasks_by_status = breakdown(&TaskStatus::ALL, &by_status);
    let tasks_by_priority = breakdown(&TaskPriority::ALL, &by_priority);
    let completed = tasks_by_status
        .get(&TaskStatus::Completed)
        .copied()
        .unwrap_or(0);

    Ok(UserStats {
        total_projects,
        total_tasks,
        tasks_by_status,
        tasks_by_priority,
        assigned_to_user,
        completion_rate: ratio(completed, total_tasks),
        avg_tasks_per_project: ratio(total_tasks, total_projects),
    })
}
