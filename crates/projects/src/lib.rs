//! `teamspace-projects` — project and task domain types.
//!
//! Includes the canonical task listing order, which is a product contract
//! every storage backend must reproduce.

pub mod project;
pub mod task;

pub use project::{DEFAULT_PROJECT_STATUS, NewProject, Project, ProjectPatch};
pub use task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
