mod agent_item;
pub use agent_item::{
    CommandExecutionPayload, ErrorMessage, ErrorPayload, FileChangePayload, FileUpdateChange,
    ItemProgress, McpToolCallPayload, PatchChangeKind, TextPayload, TodoItem, TodoListPayload,
    WebSearchPayload, decode_payload,
};

mod activity;
pub use activity::{
    ActivityEvent, ActivityStatus, ActivityType, RUNNING_PLACEHOLDER_TITLE, TURN_CANCELED_TITLE,
    TURN_ERROR_TITLE, normalize_agent_item, normalize_item,
};

mod timeline;
pub use timeline::{
    AgentTurnMessage, AssistantMessage, EventMessage, EventSource, Message, MessageMetadata,
    TurnStatus, UserMessage, build_agent_turns, build_messages,
};

mod summary;
pub use summary::{activity_summary, completed_step_count, format_duration_ms, latest_snippet};

mod grouping;
pub use grouping::{COLLAPSE_TAIL_LEN, CollapsedGroup, ExpandedRuns, TimelineGroup, group_messages};

mod height_index;
mod window;
pub use window::{
    HeightEstimates, RowKind, ScrollAnchor, Viewport, VirtualList, WindowConfig, WindowItem,
    WindowPlan, estimate_message_height, flatten_rows,
};

mod view;
pub use view::{RenderPlan, ViewState};

mod fetch;
pub use fetch::{FetchPanel, FetchScope, FetchSequencer, FetchToken};
