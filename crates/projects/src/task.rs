use core::cmp::Ordering;
use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use teamspace_core::{DomainError, DomainResult, ProjectId, TaskId, TenantId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(DomainError::validation(format!("unknown status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Listing rank: high sorts before medium before low.
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::High => 1,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(DomainError::validation(format!(
                "unknown priority: {other}"
            ))),
        }
    }
}

/// A unit of work under a project. `tenant_id` is denormalized from the
/// owning project for fast scoping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// The product-contract listing order: priority rank first, then due
    /// date ascending with undated tasks last.
    pub fn listing_order(a: &Task, b: &Task) -> Ordering {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| due_date_nulls_last(a.due_date, b.due_date))
    }
}

fn due_date_nulls_last(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Validated input for task creation. New tasks always start in `todo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        priority: Option<TaskPriority>,
        assigned_to: Option<UserId>,
        due_date: Option<NaiveDate>,
    ) -> DomainResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("Task title is required"));
        }
        Ok(Self {
            title,
            description,
            priority: priority.unwrap_or(TaskPriority::Medium),
            assigned_to,
            due_date,
        })
    }
}

/// Partial task update. Double options mark nullable fields where "set to
/// null" (unassign, clear the due date) differs from "leave alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Option<UserId>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
            && self.due_date.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(DomainError::validation("Task title cannot be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn task(priority: TaskPriority, due_date: Option<NaiveDate>) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::new(),
            project_id: ProjectId::new(),
            tenant_id: TenantId::new(),
            title: "t".into(),
            description: None,
            status: TaskStatus::Todo,
            priority,
            assigned_to: None,
            due_date,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn priority_ranks_run_high_to_low() {
        assert!(TaskPriority::High.rank() < TaskPriority::Medium.rank());
        assert!(TaskPriority::Medium.rank() < TaskPriority::Low.rank());
    }

    #[test]
    fn undated_tasks_sort_after_dated_ones() {
        let dated = task(TaskPriority::Medium, Some(date("2024-06-01")));
        let undated = task(TaskPriority::Medium, None);
        assert_eq!(Task::listing_order(&dated, &undated), Ordering::Less);
        assert_eq!(Task::listing_order(&undated, &dated), Ordering::Greater);
    }

    #[test]
    fn listing_order_matches_the_product_contract() {
        // Priorities [low, high, medium, high] with due dates
        // [2024-01-01, none, 2024-01-02, 2023-12-31].
        let mut tasks = vec![
            task(TaskPriority::Low, Some(date("2024-01-01"))),
            task(TaskPriority::High, None),
            task(TaskPriority::Medium, Some(date("2024-01-02"))),
            task(TaskPriority::High, Some(date("2023-12-31"))),
        ];
        tasks.sort_by(Task::listing_order);

        let order: Vec<(TaskPriority, Option<NaiveDate>)> =
            tasks.iter().map(|t| (t.priority, t.due_date)).collect();
        assert_eq!(
            order,
            vec![
                (TaskPriority::High, Some(date("2023-12-31"))),
                (TaskPriority::High, None),
                (TaskPriority::Medium, Some(date("2024-01-02"))),
                (TaskPriority::Low, Some(date("2024-01-01"))),
            ]
        );
    }

    #[test]
    fn new_tasks_default_to_medium_priority() {
        let new_task = NewTask::new("Ship it", None, None, None, None).unwrap();
        assert_eq!(new_task.priority, TaskPriority::Medium);
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(NewTask::new("  ", None, None, None, None).is_err());
        let patch = TaskPatch {
            title: Some(String::new()),
            ..TaskPatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn status_and_priority_parse_their_wire_names() {
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("high".parse::<TaskPriority>().unwrap(), TaskPriority::High);
        assert!("urgent".parse::<TaskPriority>().is_err());
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn unassign_is_distinct_from_leave_alone() {
        let patch = TaskPatch {
            assigned_to: Some(None),
            ..TaskPatch::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(patch.assigned_to, Some(None));
    }
}
