/// Query descriptions understood by every store backend
///
/// Filters, pagination and sorting are plain values. Each backend interprets
/// them: the in-memory store through [`ProjectFilter::matches`],
/// [`TaskFilter::matches`] and [`TaskSort::compare`], PostgreSQL through the
/// SQL fragments produced here. Both interpretations come from the same
/// definitions, so the backends agree on results.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::models::project::Project;
use crate::models::task::{Task, TaskPriority, TaskStatus};

/// Default page size for project listings
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest accepted page size
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Selects the projects a user can see: created by them or shared with them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectFilter {
    /// User who must be the creator or a collaborator
    pub member_id: Uuid,
}

impl ProjectFilter {
    /// Projects where `user_id` is creator or collaborator
    pub fn accessible_by(user_id: Uuid) -> Self {
        Self { member_id: user_id }
    }

    pub fn matches(&self, project: &Project) -> bool {
        project.creator_id == self.member_id || project.has_collaborator(self.member_id)
    }
}

/// Selects tasks
///
/// `project_ids` is mandatory scope: an empty list matches no task at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project_ids: Vec<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
}

impl TaskFilter {
    /// Tasks of a single project
    pub fn in_project(project_id: Uuid) -> Self {
        Self {
            project_ids: vec![project_id],
            ..Default::default()
        }
    }

    /// Tasks of any of the given projects
    pub fn in_projects(project_ids: Vec<Uuid>) -> Self {
        Self {
            project_ids,
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn assigned_to(mut self, user_id: Uuid) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.project_ids.contains(&task.project_id)
            && self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
            && self.assigned_to.map_or(true, |u| task.assigned_to == u)
    }
}

/// Task column a count can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Status,
    Priority,
}

impl TaskField {
    /// Column name (fixed set, safe to splice into SQL)
    pub fn column(&self) -> &'static str {
        match self {
            TaskField::Status => "status",
            TaskField::Priority => "priority",
        }
    }

    /// String key of `task` under this field, as returned by grouped counts
    pub fn key_of(&self, task: &Task) -> &'static str {
        match self {
            TaskField::Status => task.status.as_str(),
            TaskField::Priority => task.priority.as_str(),
        }
    }
}

/// One bucket of a grouped count
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

/// Page of a listing, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a page request from raw query-string values
    ///
    /// Missing, non-numeric and zero values fall back to the defaults
    /// (page 1, limit 10). Negative values clamp to 1 and the limit is capped
    /// at [`MAX_PAGE_LIMIT`].
    ///
    /// # Example
    ///
    /// ```
    /// use taskhub_shared::store::query::PageRequest;
    ///
    /// let page = PageRequest::from_query(Some("3"), Some("abc"));
    /// assert_eq!((page.page, page.limit), (3, 10));
    ///
    /// let page = PageRequest::from_query(Some("-2"), Some("500"));
    /// assert_eq!((page.page, page.limit), (1, 100));
    /// ```
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let limit = parse_positive(limit)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT);

        Self { page, limit }
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }

    pub fn has_next_page(&self, total: u64) -> bool {
        u64::from(self.page) * u64::from(self.limit) < total
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }
}

// Zero is treated as "not given"; negatives clamp to 1.
fn parse_positive(raw: Option<&str>) -> Option<u32> {
    let value: i64 = raw?.trim().parse().ok()?;
    match value {
        0 => None,
        v if v < 0 => Some(1),
        v => Some(u32::try_from(v).unwrap_or(u32::MAX)),
    }
}

/// Sortable task attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    CreatedAt,
    UpdatedAt,
    Description,
    Status,
    Priority,
}

impl TaskSortField {
    /// Looks up a field by its wire name (`createdAt`, `priority`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "description" => Some(Self::Description),
            "status" => Some(Self::Status),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }

    /// SQL expression sorting by this field
    ///
    /// Status and priority sort by rank, not alphabetically.
    fn sql_expr(&self) -> String {
        match self {
            Self::CreatedAt => "created_at".to_string(),
            Self::UpdatedAt => "updated_at".to_string(),
            Self::Description => "description".to_string(),
            Self::Status => rank_case(
                "status",
                TaskStatus::ALL.iter().map(|s| (s.as_str(), s.rank())),
            ),
            Self::Priority => rank_case(
                "priority",
                TaskPriority::ALL.iter().map(|p| (p.as_str(), p.rank())),
            ),
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            Self::Description => a.description.cmp(&b.description),
            Self::Status => a.status.rank().cmp(&b.status.rank()),
            Self::Priority => a.priority.rank().cmp(&b.priority.rank()),
        }
    }
}

fn rank_case<'a>(column: &str, ranks: impl Iterator<Item = (&'a str, u8)>) -> String {
    let arms: String = ranks
        .map(|(value, rank)| format!(" WHEN '{}' THEN {}", value, rank))
        .collect();
    format!("CASE {}{} END", column, arms)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

/// Ordered list of sort keys for task listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSort {
    keys: Vec<SortKey>,
}

impl Default for TaskSort {
    /// Newest first
    fn default() -> Self {
        Self {
            keys: vec![SortKey {
                field: TaskSortField::CreatedAt,
                direction: SortDirection::Desc,
            }],
        }
    }
}

impl TaskSort {
    /// Parses a `sort` query value
    ///
    /// Entries are comma separated. `-field` sorts descending; `field:dir`
    /// sorts ascending when `dir` is `asc` or `1` and descending otherwise,
    /// including when `dir` is omitted. Unknown fields are skipped; a field
    /// given twice keeps its first position and its last direction. When no
    /// usable entry remains the default (newest first) applies.
    ///
    /// # Example
    ///
    /// ```
    /// use taskhub_shared::store::query::{SortDirection, TaskSort, TaskSortField};
    ///
    /// let sort = TaskSort::parse("priority:asc,-createdAt");
    /// let keys = sort.keys();
    /// assert_eq!(keys[0].field, TaskSortField::Priority);
    /// assert_eq!(keys[0].direction, SortDirection::Asc);
    /// assert_eq!(keys[1].direction, SortDirection::Desc);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut keys: Vec<SortKey> = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, direction) = match entry.strip_prefix('-') {
                Some(name) if !name.is_empty() => (name.trim(), SortDirection::Desc),
                _ => {
                    let mut parts = entry.splitn(2, ':').map(str::trim);
                    let name = parts.next().unwrap_or_default();
                    let direction = match parts.next() {
                        Some(dir) if dir.eq_ignore_ascii_case("asc") || dir == "1" => {
                            SortDirection::Asc
                        }
                        _ => SortDirection::Desc,
                    };
                    (name, direction)
                }
            };

            let Some(field) = TaskSortField::from_name(name) else {
                continue;
            };

            match keys.iter_mut().find(|k| k.field == field) {
                Some(existing) => existing.direction = direction,
                None => keys.push(SortKey { field, direction }),
            }
        }

        if keys.is_empty() {
            return Self::default();
        }
        Self { keys }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Compares two tasks; ties fall back to id so the order is total
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        self.keys
            .iter()
            .map(|key| {
                let ord = key.field.compare(a, b);
                match key.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }

    /// `ORDER BY` body for PostgreSQL, ending with the same id tiebreak
    pub fn order_by_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .keys
            .iter()
            .map(|key| {
                let dir = match key.direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                format!("{} {}", key.field.sql_expr(), dir)
            })
            .collect();
        parts.push("id ASC".to_string());
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn task(description: &str, status: TaskStatus, priority: TaskPriority) -> Task {
        Task {
            id: Uuid::new_v4(),
            description: description.to_string(),
            status,
            priority,
            project_id: Uuid::new_v4(),
            assigned_to: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_page_request_defaults() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest::default());
        assert_eq!(
            PageRequest::from_query(Some("0"), Some("0")),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::from_query(Some("two"), Some("")),
            PageRequest { page: 1, limit: 10 }
        );
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(
            PageRequest::from_query(Some("-5"), Some("-1")),
            PageRequest { page: 1, limit: 1 }
        );
        assert_eq!(PageRequest::from_query(None, Some("1000")).limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_page_math() {
        let page = PageRequest { page: 2, limit: 10 };
        assert_eq!(page.offset(), 10);
        assert_eq!(page.total_pages(25), 3);
        assert!(page.has_next_page(25));
        assert!(!page.has_next_page(20));
        assert!(page.has_prev_page());

        let first = PageRequest::default();
        assert_eq!(first.offset(), 0);
        assert_eq!(first.total_pages(0), 0);
        assert!(!first.has_prev_page());
    }

    #[test]
    fn test_sort_parse_directions() {
        let sort = TaskSort::parse("-priority, description:asc, status:1, updatedAt");
        let keys = sort.keys();
        assert_eq!(keys.len(), 4);
        let key = |field, direction| SortKey { field, direction };
        assert_eq!(keys[0], key(TaskSortField::Priority, SortDirection::Desc));
        assert_eq!(keys[1], key(TaskSortField::Description, SortDirection::Asc));
        assert_eq!(keys[2], key(TaskSortField::Status, SortDirection::Asc));
        assert_eq!(keys[3], key(TaskSortField::UpdatedAt, SortDirection::Desc));
    }

    #[test]
    fn test_sort_parse_ignores_unknown_and_empty() {
        assert_eq!(TaskSort::parse(""), TaskSort::default());
        assert_eq!(TaskSort::parse(" , -,bogus:asc"), TaskSort::default());

        let sort = TaskSort::parse("bogus,priority:ASC");
        assert_eq!(sort.keys().len(), 1);
        assert_eq!(sort.keys()[0].direction, SortDirection::Asc);
    }

    #[test]
    fn test_sort_parse_repeated_field_keeps_position() {
        let sort = TaskSort::parse("priority:asc,createdAt,priority:desc");
        assert_eq!(sort.keys()[0].field, TaskSortField::Priority);
        assert_eq!(sort.keys()[0].direction, SortDirection::Desc);
        assert_eq!(sort.keys().len(), 2);
    }

    #[test]
    fn test_compare_by_priority_rank() {
        let low = task("a", TaskStatus::Pending, TaskPriority::Low);
        let high = task("b", TaskStatus::Pending, TaskPriority::High);
        let medium = task("c", TaskStatus::Pending, TaskPriority::Medium);

        let mut tasks = vec![high.clone(), low.clone(), medium.clone()];
        tasks.sort_by(|a, b| TaskSort::parse("priority:asc").compare(a, b));
        assert_eq!(
            tasks.iter().map(|t| t.priority).collect::<Vec<_>>(),
            vec![TaskPriority::Low, TaskPriority::Medium, TaskPriority::High]
        );

        tasks.sort_by(|a, b| TaskSort::parse("-priority").compare(a, b));
        assert_eq!(tasks[0].id, high.id);
        assert_eq!(tasks[2].id, low.id);
    }

    #[test]
    fn test_compare_secondary_key() {
        let mut older = task("x", TaskStatus::Completed, TaskPriority::High);
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = task("y", TaskStatus::Completed, TaskPriority::High);
        let pending = task("z", TaskStatus::Pending, TaskPriority::High);

        let sort = TaskSort::parse("status:asc,createdAt:desc");
        let mut tasks = vec![older.clone(), pending.clone(), newer.clone()];
        tasks.sort_by(|a, b| sort.compare(a, b));

        assert_eq!(tasks[0].id, pending.id);
        assert_eq!(tasks[1].id, newer.id);
        assert_eq!(tasks[2].id, older.id);
    }

    #[test]
    fn test_order_by_sql() {
        assert_eq!(TaskSort::default().order_by_sql(), "created_at DESC, id ASC");
        assert_eq!(
            TaskSort::parse("priority:asc").order_by_sql(),
            "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 WHEN 'high' THEN 2 END ASC, id ASC"
        );
        assert_eq!(
            TaskSort::parse("-status").order_by_sql(),
            "CASE status WHEN 'pending' THEN 0 WHEN 'in-progress' THEN 1 WHEN 'completed' THEN 2 END DESC, id ASC"
        );
    }

    #[test]
    fn test_task_filter_matches() {
        let t = task("a", TaskStatus::Pending, TaskPriority::High);

        assert!(TaskFilter::in_project(t.project_id).matches(&t));
        assert!(!TaskFilter::in_projects(vec![]).matches(&t));
        assert!(TaskFilter::in_project(t.project_id)
            .with_status(TaskStatus::Pending)
            .with_priority(TaskPriority::High)
            .assigned_to(t.assigned_to)
            .matches(&t));
        assert!(!TaskFilter::in_project(t.project_id)
            .with_status(TaskStatus::Completed)
            .matches(&t));
        assert!(!TaskFilter::in_project(t.project_id)
            .assigned_to(Uuid::new_v4())
            .matches(&t));
    }

    #[test]
    fn test_project_filter_matches() {
        let creator = Uuid::new_v4();
        let collaborator = Uuid::new_v4();
        let project = Project {
            id: Uuid::new_v4(),
            name: "P".to_string(),
            creator_id: creator,
            collaborators: vec![collaborator],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(ProjectFilter::accessible_by(creator).matches(&project));
        assert!(ProjectFilter::accessible_by(collaborator).matches(&project));
        assert!(!ProjectFilter::accessible_by(Uuid::new_v4()).matches(&project));
    }
}
