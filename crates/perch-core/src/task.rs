use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub notes: String,

    /// Action date as a plain `YYYY-MM-DD` string, empty when unset.
    #[serde(default)]
    pub recommended_date: String,

    /// Deadline as a plain `YYYY-MM-DD` string, empty when unset.
    #[serde(default)]
    pub deadline: String,

    /// Empty means uncategorized. May reference a category that no longer
    /// exists; dangling references are tolerated, not repaired.
    #[serde(default)]
    pub category_id: String,

    #[serde(default)]
    pub completed: bool,

    pub created_at: DateTime<Utc>,
}

/// Mutable fields of a task, used both for creation and for wholesale edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub notes: String,
    pub recommended_date: String,
    pub deadline: String,
    pub category_id: String,
}

impl Task {
    pub fn new(draft: TaskDraft, now: DateTime<Utc>, id: String) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            notes: draft.notes.trim().to_string(),
            recommended_date: draft.recommended_date,
            deadline: draft.deadline,
            category_id: draft.category_id,
            completed: false,
            created_at: now,
        }
    }

    /// Replaces every mutable field, keeping `id`, `completed` and
    /// `created_at` as they are.
    pub fn apply(&mut self, draft: TaskDraft) {
        self.title = draft.title.trim().to_string();
        self.notes = draft.notes.trim().to_string();
        self.recommended_date = draft.recommended_date;
        self.deadline = draft.deadline;
        self.category_id = draft.category_id;
    }

    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            notes: self.notes.clone(),
            recommended_date: self.recommended_date.clone(),
            deadline: self.deadline.clone(),
            category_id: self.category_id.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }
}
