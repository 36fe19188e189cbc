use serde::{Deserialize, Serialize};

/// A task under a pocket. `pocket_id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTask")]
pub struct Task {
    pub id: String,
    pub description: String,
    pub is_completed: bool,
    pub pocket_id: String,
}

/// Wire form of a task. Both spellings of the id and of the completion flag
/// show up in remote payloads, sometimes in the same object.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTask {
    id: Option<String>,
    #[serde(rename = "_id")]
    legacy_id: Option<String>,
    #[serde(default)]
    description: String,
    is_completed: Option<bool>,
    completed: Option<bool>,
    #[serde(default)]
    pocket_id: String,
}

impl TryFrom<RawTask> for Task {
    type Error = String;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        Ok(Self {
            id: pick_id(raw.id, raw.legacy_id)?,
            description: raw.description,
            is_completed: raw.is_completed.or(raw.completed).unwrap_or(false),
            pocket_id: raw.pocket_id,
        })
    }
}

/// Prefers `id` over `_id`.
pub(crate) fn pick_id(id: Option<String>, legacy_id: Option<String>) -> Result<String, String> {
    id.or(legacy_id)
        .ok_or_else(|| "missing field `id`".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// Fields the remote echoes back after an update. Missing fields fall back to
/// what was requested.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawTaskPatch")]
pub struct TaskPatch {
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTaskPatch {
    description: Option<String>,
    is_completed: Option<bool>,
    completed: Option<bool>,
}

impl From<RawTaskPatch> for TaskPatch {
    fn from(raw: RawTaskPatch) -> Self {
        Self {
            description: raw.description,
            is_completed: raw.is_completed.or(raw.completed),
        }
    }
}

impl TaskPatch {
    pub fn or_requested(self, requested: &UpdateTaskRequest) -> Self {
        Self {
            description: self.description.or_else(|| requested.description.clone()),
            is_completed: self.is_completed.or(requested.is_completed),
        }
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(is_completed) = self.is_completed {
            task.is_completed = is_completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_legacy_field_names() {
        let task: Task = serde_json::from_str(
            r#"{"_id":"t1","description":"Buy milk","completed":true,"pocketId":"p1"}"#,
        )
        .unwrap();
        assert_eq!(task.id, "t1");
        assert!(task.is_completed);
        assert_eq!(task.pocket_id, "p1");
    }

    #[test]
    fn decodes_payload_carrying_both_spellings() {
        let task: Task = serde_json::from_str(
            r#"{"_id":"legacy","id":"t1","description":"x","completed":false,"isCompleted":true,"pocketId":"p1"}"#,
        )
        .unwrap();
        assert_eq!(task.id, "t1");
        assert!(task.is_completed);

        let patch: TaskPatch =
            serde_json::from_str(r#"{"completed":false,"isCompleted":true}"#).unwrap();
        assert_eq!(patch.is_completed, Some(true));
    }

    #[test]
    fn task_without_any_id_is_rejected() {
        assert!(serde_json::from_str::<Task>(r#"{"description":"x"}"#).is_err());
    }

    #[test]
    fn patch_falls_back_to_requested_values() {
        let requested = UpdateTaskRequest {
            description: None,
            is_completed: Some(true),
        };
        let patch = TaskPatch::default().or_requested(&requested);
        let mut task = Task {
            id: "t1".into(),
            description: "keep me".into(),
            is_completed: false,
            pocket_id: "p1".into(),
        };
        patch.apply(&mut task);
        assert!(task.is_completed);
        assert_eq!(task.description, "keep me");
    }

    #[test]
    fn update_request_omits_unset_fields() {
        let body = serde_json::to_value(UpdateTaskRequest {
            description: None,
            is_completed: Some(false),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "isCompleted": false }));
    }
}
