use serde::{Deserialize, Serialize};

use super::Task;
use super::task::pick_id;

/// A named, emoji-tagged group of tasks. `id` is assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPocket")]
pub struct Pocket {
    pub id: String,
    pub name: String,
    pub emoji: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

#[derive(Deserialize)]
struct RawPocket {
    id: Option<String>,
    #[serde(rename = "_id")]
    legacy_id: Option<String>,
    name: String,
    emoji: String,
    #[serde(default)]
    tasks: Option<Vec<Task>>,
}

impl TryFrom<RawPocket> for Pocket {
    type Error = String;

    fn try_from(raw: RawPocket) -> Result<Self, Self::Error> {
        Ok(Self {
            id: pick_id(raw.id, raw.legacy_id)?,
            name: raw.name,
            emoji: raw.emoji,
            tasks: raw.tasks,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPocketRequest {
    pub name: String,
    pub emoji: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_id_over_legacy_id() {
        let pocket: Pocket = serde_json::from_str(
            r#"{"_id":"old","id":"p1","name":"Home","emoji":"🏠"}"#,
        )
        .unwrap();
        assert_eq!(pocket.id, "p1");
        assert_eq!(pocket.tasks, None);
    }
}
