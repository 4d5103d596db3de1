//! Typed views over agent item payloads.
//!
//! The backend sends payloads as loose JSON. Every field defaults on its own,
//! so a partial item (an in-progress command with no output yet) or a field
//! of the wrong type (`"aggregated_output": null`) keeps the fields next to it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemProgress {
    InProgress,
    Completed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ItemProgress {
    pub fn is_in_progress(self) -> bool {
        self == Self::InProgress
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchChangeKind {
    Add,
    Delete,
    #[default]
    Update,
    #[serde(other)]
    Other,
}

impl PatchChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Other => "change",
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextPayload {
    #[serde(deserialize_with = "lenient")]
    pub text: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommandExecutionPayload {
    #[serde(deserialize_with = "lenient")]
    pub command: String,
    #[serde(deserialize_with = "lenient")]
    pub aggregated_output: String,
    #[serde(deserialize_with = "lenient")]
    pub exit_code: Option<i32>,
    #[serde(deserialize_with = "lenient")]
    pub status: ItemProgress,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileUpdateChange {
    #[serde(deserialize_with = "lenient")]
    pub path: String,
    #[serde(deserialize_with = "lenient")]
    pub kind: PatchChangeKind,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileChangePayload {
    #[serde(deserialize_with = "lenient_vec")]
    pub changes: Vec<FileUpdateChange>,
    #[serde(deserialize_with = "lenient")]
    pub status: ItemProgress,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct McpToolCallPayload {
    #[serde(deserialize_with = "lenient")]
    pub server: String,
    #[serde(deserialize_with = "lenient")]
    pub tool: String,
    #[serde(deserialize_with = "lenient")]
    pub arguments: serde_json::Value,
    #[serde(deserialize_with = "lenient")]
    pub result: Option<serde_json::Value>,
    #[serde(deserialize_with = "lenient")]
    pub error: Option<ErrorMessage>,
    #[serde(deserialize_with = "lenient")]
    pub status: ItemProgress,
}

#[derive(Clone, Debug, Default, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ErrorMessage {
    #[serde(deserialize_with = "lenient")]
    pub message: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebSearchPayload {
    #[serde(deserialize_with = "lenient")]
    pub query: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TodoItem {
    #[serde(deserialize_with = "lenient")]
    pub text: String,
    #[serde(deserialize_with = "lenient")]
    pub completed: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TodoListPayload {
    #[serde(deserialize_with = "lenient_vec")]
    pub items: Vec<TodoItem>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorPayload {
    #[serde(deserialize_with = "lenient")]
    pub message: String,
}

/// Decodes `payload` into `T`. A payload that is not an object at all yields
/// `T::default()`. Never fails.
pub fn decode_payload<T>(payload: &serde_json::Value) -> T
where
    T: DeserializeOwned + Default,
{
    T::deserialize(payload).unwrap_or_default()
}

/// Field-level fallback: `null` or a value of the wrong shape becomes the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Like [`lenient`], but drops only the list elements that do not decode.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let serde_json::Value::Array(values) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(values
        .into_iter()
        .filter_map(|value| T::deserialize(value).ok())
        .collect())
}
