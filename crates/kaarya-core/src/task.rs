use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;
pub type UserId = Uuid;

/// A user-owned to-do item as returned by the row store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(rename = "user_id")]
    pub owner_id: UserId,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn notes_text(&self) -> &str {
        self.notes.as_deref().unwrap_or_default()
    }
}

/// A row about to be inserted. The store assigns `id` and the timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    #[serde(rename = "user_id")]
    pub owner_id: UserId,
    pub completed: bool,
}

impl NewTask {
    pub fn from_draft(draft: TaskDraft, owner_id: UserId) -> Self {
        Self {
            title: draft.title,
            notes: draft.notes,
            owner_id,
            completed: false,
        }
    }
}

/// Title and notes as typed into a form or produced by a suggestion provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskDraft {
    pub title: String,
    pub notes: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, notes: Option<String>) -> Self {
        Self {
            title: title.into(),
            notes,
        }
    }

    /// Trimmed title, or `None` when the title is blank.
    pub fn valid_title(&self) -> Option<&str> {
        let trimmed = self.title.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Notes with surrounding whitespace removed; blank notes become `None`.
    pub fn normalized_notes(&self) -> Option<String> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(ToString::to_string)
    }
}

/// Fields sent with a remote update. Absent fields are left untouched by the store.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    pub updated_at: DateTime<Utc>,
}

impl TaskChanges {
    pub fn edit(title: String, notes: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            title: Some(title),
            notes: Some(notes),
            completed: None,
            updated_at: now,
        }
    }

    pub fn completion(completed: bool, now: DateTime<Utc>) -> Self {
        Self {
            title: None,
            notes: None,
            completed: Some(completed),
            updated_at: now,
        }
    }

    /// Patch a local copy in place. Identity and `created_at` are never touched.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(notes) = &self.notes {
            task.notes = notes.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        task.updated_at = self.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use super::{Task, TaskChanges, TaskDraft};

    #[test]
    fn decodes_store_rows_with_snake_case_owner() {
        let owner = Uuid::new_v4();
        let row = json!({
            "id": Uuid::new_v4(),
            "title": "Buy milk",
            "notes": null,
            "completed": false,
            "user_id": owner,
            "created_at": "2026-02-16T05:00:00Z",
            "updated_at": "2026-02-16T05:00:00Z"
        });

        let task: Task = serde_json::from_value(row).expect("decode row");
        assert_eq!(task.owner_id, owner);
        assert_eq!(task.notes_text(), "");
        assert!(!task.completed);
    }

    #[test]
    fn blank_titles_are_rejected_and_notes_normalized() {
        assert!(TaskDraft::new("   ", None).valid_title().is_none());

        let draft = TaskDraft::new("  Walk dog ", Some("  ".to_string()));
        assert_eq!(draft.valid_title(), Some("Walk dog"));
        assert_eq!(draft.normalized_notes(), None);
    }

    #[test]
    fn edit_changes_keep_identity_and_creation_time() {
        let created = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 2, 17, 5, 0, 0).unwrap();
        let mut task = Task {
            id: Uuid::new_v4(),
            title: "old".to_string(),
            notes: Some("n".to_string()),
            completed: true,
            owner_id: Uuid::new_v4(),
            created_at: created,
            updated_at: created,
        };
        let before = task.clone();

        TaskChanges::edit("new".to_string(), None, later).apply_to(&mut task);

        assert_eq!(task.id, before.id);
        assert_eq!(task.created_at, created);
        assert_eq!(task.updated_at, later);
        assert_eq!(task.title, "new");
        assert_eq!(task.notes, None);
        assert!(task.completed);
    }
}
