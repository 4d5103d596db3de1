use crate::agent_item::{
    CommandExecutionPayload, ErrorPayload, FileChangePayload, ItemProgress, McpToolCallPayload,
    TextPayload, TodoListPayload, WebSearchPayload, decode_payload,
};
use strand_api::{AgentItem, AgentItemKind};

pub const RUNNING_PLACEHOLDER_TITLE: &str = "Running...";
pub const TURN_ERROR_TITLE: &str = "Turn error";
pub const TURN_CANCELED_TITLE: &str = "Turn canceled";

const RUNNING_PLACEHOLDER_ID: &str = "running-placeholder";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Thinking,
    ToolCall,
    FileEdit,
    Bash,
    Search,
    Complete,
    AssistantMessage,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Running,
    Done,
}

/// A displayable representation of one agent action.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct ActivityEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub status: ActivityStatus,
}

impl ActivityEvent {
    pub fn is_running(&self) -> bool {
        self.status == ActivityStatus::Running
    }

    pub fn is_running_placeholder(&self) -> bool {
        self.id == RUNNING_PLACEHOLDER_ID && self.title == RUNNING_PLACEHOLDER_TITLE
    }

    pub fn is_turn_canceled(&self) -> bool {
        self.title == TURN_CANCELED_TITLE
    }

    pub fn is_turn_error(&self) -> bool {
        self.title == TURN_ERROR_TITLE
    }

    pub(crate) fn running_placeholder() -> Self {
        Self {
            id: RUNNING_PLACEHOLDER_ID.to_owned(),
            activity_type: ActivityType::Thinking,
            title: RUNNING_PLACEHOLDER_TITLE.to_owned(),
            detail: None,
            status: ActivityStatus::Running,
        }
    }

    pub(crate) fn turn_error(id: String, message: &str) -> Self {
        Self {
            id,
            activity_type: ActivityType::ToolCall,
            title: TURN_ERROR_TITLE.to_owned(),
            detail: non_empty(message.to_owned()),
            status: ActivityStatus::Done,
        }
    }

    pub(crate) fn turn_canceled(id: String) -> Self {
        Self {
            id,
            activity_type: ActivityType::Complete,
            title: TURN_CANCELED_TITLE.to_owned(),
            detail: None,
            status: ActivityStatus::Done,
        }
    }
}

pub fn normalize_item(item: &AgentItem, forced_status: Option<ActivityStatus>) -> ActivityEvent {
    normalize_agent_item(&item.id, &item.kind, &item.payload, forced_status)
}

/// Maps one agent item to an [`ActivityEvent`].
///
/// Total over every input: missing fields fall back to generic titles and
/// kinds this build does not know are rendered as a literal `complete` entry.
pub fn normalize_agent_item(
    id: &str,
    kind: &AgentItemKind,
    payload: &serde_json::Value,
    forced_status: Option<ActivityStatus>,
) -> ActivityEvent {
    let done_unless_forced = forced_status.unwrap_or(ActivityStatus::Done);
    let from_progress = |in_progress: bool| {
        forced_status.unwrap_or(if in_progress {
            ActivityStatus::Running
        } else {
            ActivityStatus::Done
        })
    };

    let (activity_type, title, detail, status) = match kind {
        AgentItemKind::AgentMessage => {
            let payload: TextPayload = decode_payload(payload);
            (
                ActivityType::AssistantMessage,
                "Message".to_owned(),
                non_empty(payload.text),
                done_unless_forced,
            )
        }
        AgentItemKind::Reasoning => {
            let payload: TextPayload = decode_payload(payload);
            (
                ActivityType::Thinking,
                "Thinking".to_owned(),
                non_empty(payload.text),
                done_unless_forced,
            )
        }
        AgentItemKind::CommandExecution => {
            let payload: CommandExecutionPayload = decode_payload(payload);
            let title = non_empty(payload.command.trim().to_owned())
                .unwrap_or_else(|| "Command".to_owned());
            (
                ActivityType::Bash,
                title,
                non_empty(payload.aggregated_output),
                from_progress(payload.status.is_in_progress()),
            )
        }
        AgentItemKind::FileChange => {
            let payload: FileChangePayload = decode_payload(payload);
            let detail = payload
                .changes
                .iter()
                .map(|change| format!("{} {}", change.kind.as_str(), change.path))
                .collect::<Vec<_>>()
                .join("\n");
            (
                ActivityType::FileEdit,
                format!("File changes ({})", payload.changes.len()),
                non_empty(detail),
                done_unless_forced,
            )
        }
        AgentItemKind::McpToolCall => {
            let payload: McpToolCallPayload = decode_payload(payload);
            let in_progress = payload.status.is_in_progress();
            let title = match (payload.server.trim(), payload.tool.trim()) {
                ("", "") => "Tool call".to_owned(),
                ("", name) | (name, "") => name.to_owned(),
                (server, tool) => format!("{server}.{tool}"),
            };
            let dump = serde_json::json!({
                "arguments": payload.arguments,
                "result": payload.result,
                "error": payload.error,
                "status": status_label(payload.status),
            });
            (
                ActivityType::ToolCall,
                title,
                Some(safe_json(&dump, true)),
                from_progress(in_progress),
            )
        }
        AgentItemKind::WebSearch => {
            let payload: WebSearchPayload = decode_payload(payload);
            let title = non_empty(payload.query.trim().to_owned())
                .unwrap_or_else(|| "Web search".to_owned());
            (ActivityType::Search, title, None, done_unless_forced)
        }
        AgentItemKind::TodoList => {
            let payload: TodoListPayload = decode_payload(payload);
            let detail = payload
                .items
                .iter()
                .map(|item| {
                    let mark = if item.completed { "[x]" } else { "[ ]" };
                    format!("{mark} {}", item.text)
                })
                .collect::<Vec<_>>()
                .join("\n");
            (
                ActivityType::Complete,
                "Todo list".to_owned(),
                non_empty(detail),
                done_unless_forced,
            )
        }
        AgentItemKind::Error => {
            let payload: ErrorPayload = decode_payload(payload);
            (
                ActivityType::ToolCall,
                "Error".to_owned(),
                non_empty(payload.message),
                done_unless_forced,
            )
        }
        AgentItemKind::Unknown(raw) => (
            ActivityType::Complete,
            raw.clone(),
            Some(safe_json(payload, false)),
            done_unless_forced,
        ),
    };

    ActivityEvent {
        id: id.to_owned(),
        activity_type,
        title,
        detail,
        status,
    }
}

fn status_label(status: ItemProgress) -> &'static str {
    match status {
        ItemProgress::InProgress => "in_progress",
        ItemProgress::Completed => "completed",
        ItemProgress::Failed => "failed",
        ItemProgress::Unknown => "unknown",
    }
}

fn safe_json(value: &serde_json::Value, pretty: bool) -> String {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.unwrap_or_else(|_| format!("{value:?}"))
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
