use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceThreadId(pub u64);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    #[serde(default)]
    pub rev: u64,
    #[serde(rename = "workdir_id", alias = "workspace_id")]
    pub workspace_id: WorkspaceId,
    #[serde(rename = "task_id", alias = "thread_id")]
    pub thread_id: WorkspaceThreadId,
    #[serde(default)]
    pub agent_model_id: String,
    #[serde(default)]
    pub thinking_effort: ThinkingEffort,
    pub run_status: OperationStatus,
    pub entries: Vec<ConversationEntry>,
    /// Absolute log index of `entries[0]` when the backend truncated the head of the log.
    #[serde(default)]
    pub entries_start: u64,
    #[serde(default)]
    pub entries_total: u64,
    #[serde(default)]
    pub in_progress_items: Vec<AgentItem>,
    #[serde(default)]
    pub pending_prompts: Vec<QueuedPromptSnapshot>,
    #[serde(default)]
    pub title: String,
}

impl ConversationSnapshot {
    pub fn is_running(&self) -> bool {
        self.run_status == OperationStatus::Running
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueuedPromptSnapshot {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    pub run_config: AgentRunConfigSnapshot,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRunConfigSnapshot {
    pub model_id: String,
    pub thinking_effort: ThinkingEffort,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Idle,
    Running,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingEffort {
    Minimal,
    Low,
    #[default]
    Medium,
    High,
    #[serde(rename = "xhigh")]
    XHigh,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    #[default]
    Todo,
    #[serde(alias = "in_progress")]
    Iterating,
    #[serde(alias = "in_review")]
    Validating,
    Done,
    Canceled,
}

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Todo => "Todo",
            Self::Iterating => "Iterating",
            Self::Validating => "Validating",
            Self::Done => "Done",
            Self::Canceled => "Canceled",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEntry {
    UserMessage(UserMessage),
    AgentItem(AgentItem),
    TurnUsage {
        #[serde(default)]
        usage_json: Option<serde_json::Value>,
    },
    TurnDuration {
        duration_ms: u64,
    },
    TurnCanceled,
    TurnError {
        #[serde(default)]
        message: String,
    },
    SystemEvent(ConversationSystemEventEntry),
    TerminalCommandStarted(TerminalCommandStarted),
    TerminalCommandFinished(TerminalCommandFinished),
    /// Entry types added by newer backends. Kept in the log so indices stay stable.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationSystemEventEntry {
    #[serde(rename = "entry_id", alias = "id", default)]
    pub entry_id: String,
    #[serde(default)]
    pub created_at_unix_ms: u64,
    pub event: ConversationSystemEvent,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ConversationSystemEvent {
    TaskCreated,
    TaskStatusChanged {
        from: TaskStatus,
        to: TaskStatus,
    },
    TaskStatusSuggestion {
        from: TaskStatus,
        to: TaskStatus,
        #[serde(default)]
        title: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerminalCommandStarted {
    pub id: String,
    pub command: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerminalCommandFinished {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub output_byte_len: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: String,
    pub kind: AttachmentKind,
    pub name: String,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub byte_len: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Text,
    File,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentItem {
    pub id: String,
    pub kind: AgentItemKind,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Kind tag of an agent item. Kinds this build does not know about are kept
/// verbatim in `Unknown` instead of failing the whole snapshot.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentItemKind {
    AgentMessage,
    Reasoning,
    CommandExecution,
    FileChange,
    McpToolCall,
    WebSearch,
    TodoList,
    Error,
    Unknown(String),
}

impl AgentItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AgentMessage => "agent_message",
            Self::Reasoning => "reasoning",
            Self::CommandExecution => "command_execution",
            Self::FileChange => "file_change",
            Self::McpToolCall => "mcp_tool_call",
            Self::WebSearch => "web_search",
            Self::TodoList => "todo_list",
            Self::Error => "error",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "agent_message" => Self::AgentMessage,
            "reasoning" => Self::Reasoning,
            "command_execution" => Self::CommandExecution,
            "file_change" => Self::FileChange,
            "mcp_tool_call" => Self::McpToolCall,
            "web_search" => Self::WebSearch,
            "todo_list" => Self::TodoList,
            "error" => Self::Error,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for AgentItemKind {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<AgentItemKind> for String {
    fn from(kind: AgentItemKind) -> Self {
        match kind {
            AgentItemKind::Unknown(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}
