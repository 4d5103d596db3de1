use crate::activity::{ActivityEvent, ActivityStatus, normalize_agent_item, normalize_item};
use std::collections::HashSet;
use strand_api::{
    AgentItemKind, AttachmentRef, ConversationEntry, ConversationSnapshot, ConversationSystemEvent,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    System,
    Terminal,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Running,
    Done,
    Canceled,
    Error,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct MessageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct UserMessage {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct AssistantMessage {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<ActivityEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    pub is_streaming: bool,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct EventMessage {
    pub id: String,
    pub content: String,
    pub status: ActivityStatus,
    pub source: EventSource,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct AgentTurnMessage {
    pub id: String,
    pub activities: Vec<ActivityEvent>,
    pub turn_status: TurnStatus,
}

#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
    Event(EventMessage),
    AgentTurn(AgentTurnMessage),
}

impl Message {
    pub fn id(&self) -> &str {
        match self {
            Message::User(m) => &m.id,
            Message::Assistant(m) => &m.id,
            Message::Event(m) => &m.id,
            Message::AgentTurn(m) => &m.id,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Message::Event(_))
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Message::Assistant(m) if m.is_streaming)
    }

    pub fn activities(&self) -> &[ActivityEvent] {
        match self {
            Message::Assistant(m) => &m.activities,
            Message::AgentTurn(m) => &m.activities,
            Message::User(_) | Message::Event(_) => &[],
        }
    }
}

/// Accumulator for the assistant output of the current turn.
#[derive(Default)]
struct OpenAggregate {
    start_index: Option<u64>,
    content: String,
    activities: Vec<ActivityEvent>,
    tool_call_count: u32,
    thinking_step_count: u32,
    duration_ms: Option<u64>,
    /// Ambient events seen while the turn was open, emitted ahead of its bubble.
    deferred: Vec<Message>,
}

impl OpenAggregate {
    fn touch(&mut self, index: u64) {
        self.start_index.get_or_insert(index);
    }

    fn push_text(&mut self, text: &str) {
        if !self.content.is_empty() {
            self.content.push_str("\n\n");
        }
        self.content.push_str(text);
    }

    fn has_running_activity(&self) -> bool {
        self.activities.iter().any(ActivityEvent::is_running)
    }

    fn is_open(&self) -> bool {
        self.start_index.is_some()
    }

    /// An ambient event never splits an open turn. It is held and emitted
    /// just before the turn's bubble, which keeps the live bubble at the tail.
    fn push_ambient(&mut self, message: Message, out: &mut Vec<Message>) {
        if self.is_open() {
            self.deferred.push(message);
        } else {
            out.push(message);
        }
    }

    /// Emits the held events, then the turn's bubble if it has anything to show.
    fn flush(&mut self, fallback_index: u64, out: &mut Vec<Message>) {
        let state = std::mem::take(self);
        out.extend(state.deferred);
        let content = state.content.trim();
        if content.is_empty() && state.activities.is_empty() {
            return;
        }

        let metadata = MessageMetadata {
            tool_calls: (state.tool_call_count > 0).then_some(state.tool_call_count),
            thinking_steps: (state.thinking_step_count > 0).then_some(state.thinking_step_count),
            duration_ms: state.duration_ms,
        };
        let metadata = (metadata != MessageMetadata::default()).then_some(metadata);

        out.push(Message::Assistant(AssistantMessage {
            id: format!("assistant-{}", state.start_index.unwrap_or(fallback_index)),
            content: content.to_owned(),
            activities: state.activities,
            metadata,
            is_streaming: false,
        }));
    }
}

/// Folds a conversation snapshot into display-ready messages.
///
/// Pure and linear in `entries + in_progress_items`. Rebuilding from the same
/// snapshot always yields the same messages.
pub fn build_messages(snapshot: &ConversationSnapshot) -> Vec<Message> {
    let running = snapshot.is_running();
    let base = snapshot.entries_start;
    let finished_terminal_ids: HashSet<&str> = snapshot
        .entries
        .iter()
        .filter_map(|entry| match entry {
            ConversationEntry::TerminalCommandFinished(finished) => Some(finished.id.as_str()),
            _ => None,
        })
        .collect();

    let mut out = Vec::with_capacity(snapshot.entries.len() / 2 + 1);
    let mut aggregate = OpenAggregate::default();

    for (offset, entry) in snapshot.entries.iter().enumerate() {
        let index = base + offset as u64;
        match entry {
            ConversationEntry::UserMessage(message) => {
                aggregate.flush(index, &mut out);
                out.push(Message::User(UserMessage {
                    id: format!("user-{index}"),
                    content: message.text.clone(),
                    attachments: message.attachments.clone(),
                }));
            }
            ConversationEntry::AgentItem(item) => {
                aggregate.touch(index);
                match &item.kind {
                    AgentItemKind::AgentMessage => {
                        let text = item
                            .payload
                            .get("text")
                            .and_then(serde_json::Value::as_str)
                            .unwrap_or_default();
                        aggregate.push_text(text);
                    }
                    kind => {
                        match kind {
                            AgentItemKind::Reasoning => aggregate.thinking_step_count += 1,
                            AgentItemKind::Error => {}
                            _ => aggregate.tool_call_count += 1,
                        }
                        aggregate.activities.push(normalize_item(item, None));
                    }
                }
            }
            ConversationEntry::TurnDuration { duration_ms } => {
                aggregate.touch(index);
                aggregate.duration_ms = Some(*duration_ms);
            }
            ConversationEntry::TurnUsage { .. } | ConversationEntry::Unknown => {}
            ConversationEntry::TurnError { message } => {
                aggregate.touch(index);
                aggregate
                    .activities
                    .push(ActivityEvent::turn_error(format!("turn-error-{index}"), message));
            }
            ConversationEntry::TurnCanceled => {
                aggregate.touch(index);
                aggregate
                    .activities
                    .push(ActivityEvent::turn_canceled(format!("turn-canceled-{index}")));
            }
            ConversationEntry::SystemEvent(entry) => {
                let event = Message::Event(EventMessage {
                    id: format!("event-{index}"),
                    content: system_event_text(&entry.event),
                    status: ActivityStatus::Done,
                    source: EventSource::System,
                });
                aggregate.push_ambient(event, &mut out);
            }
            ConversationEntry::TerminalCommandStarted(started) => {
                let status = if finished_terminal_ids.contains(started.id.as_str()) {
                    ActivityStatus::Done
                } else {
                    ActivityStatus::Running
                };
                let event = Message::Event(EventMessage {
                    id: format!("event-{index}"),
                    content: format!("$ {}", started.command),
                    status,
                    source: EventSource::Terminal,
                });
                aggregate.push_ambient(event, &mut out);
            }
            ConversationEntry::TerminalCommandFinished(finished) => {
                let event = Message::Event(EventMessage {
                    id: format!("event-{index}"),
                    content: format!(
                        "$ {} finished ({} bytes)",
                        finished.command, finished.output_byte_len
                    ),
                    status: ActivityStatus::Done,
                    source: EventSource::Terminal,
                });
                aggregate.push_ambient(event, &mut out);
            }
        }
    }

    let tail_index = base + snapshot.entries.len() as u64;
    if running {
        for item in &snapshot.in_progress_items {
            aggregate.touch(tail_index);
            aggregate.activities.push(normalize_agent_item(
                &item.id,
                &item.kind,
                &item.payload,
                Some(ActivityStatus::Running),
            ));
        }
        if !aggregate.has_running_activity() {
            aggregate.touch(tail_index);
            aggregate.activities.push(ActivityEvent::running_placeholder());
        }
    }
    aggregate.flush(tail_index, &mut out);

    if running {
        if let Some(Message::Assistant(last)) = out.last_mut() {
            last.is_streaming = true;
        }
    }

    out
}

/// Rewrites assistant bubbles into the compact turn layout: an `agent_turn`
/// card for the activities followed by the text, if any.
pub fn build_agent_turns(messages: &[Message]) -> Vec<Message> {
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        let Message::Assistant(assistant) = message else {
            out.push(message.clone());
            continue;
        };
        if !assistant.activities.is_empty() {
            let turn_status = if assistant.activities.iter().any(ActivityEvent::is_turn_error) {
                TurnStatus::Error
            } else if assistant
                .activities
                .iter()
                .any(ActivityEvent::is_turn_canceled)
            {
                TurnStatus::Canceled
            } else if assistant.is_streaming {
                TurnStatus::Running
            } else {
                TurnStatus::Done
            };
            out.push(Message::AgentTurn(AgentTurnMessage {
                id: format!("{}:turn", assistant.id),
                activities: assistant.activities.clone(),
                turn_status,
            }));
        }
        if !assistant.content.is_empty() {
            out.push(Message::Assistant(AssistantMessage {
                activities: Vec::new(),
                ..assistant.clone()
            }));
        }
    }
    out
}

fn system_event_text(event: &ConversationSystemEvent) -> String {
    match event {
        ConversationSystemEvent::TaskCreated => "Task created".to_owned(),
        ConversationSystemEvent::TaskStatusChanged { from, to } => {
            format!("Status changed: {} → {}", from.label(), to.label())
        }
        ConversationSystemEvent::TaskStatusSuggestion { to, title, .. } => {
            if title.trim().is_empty() {
                format!("Suggested status: {}", to.label())
            } else {
                format!("Suggested status: {} ({})", to.label(), title.trim())
            }
        }
    }
}
