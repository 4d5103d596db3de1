use crate::summary::clip_chars;
use crate::timeline::Message;
use std::collections::HashSet;
use std::ops::Range;

/// Runs longer than this collapse; this many trailing members stay visible.
pub const COLLAPSE_TAIL_LEN: usize = 3;
const SUMMARY_MAX_CHARS: usize = 80;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TimelineGroup {
    /// Index into the message list.
    Single(usize),
    Collapsed(CollapsedGroup),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollapsedGroup {
    /// Index of the first member, also the expansion key.
    pub start: usize,
    pub members: Range<usize>,
    pub member_ids: Vec<String>,
    pub visible_tail_ids: Vec<String>,
    pub hidden_count: usize,
    pub summary: String,
    pub expanded: bool,
}

impl CollapsedGroup {
    pub fn header_label(&self) -> String {
        let noun = if self.hidden_count == 1 { "event" } else { "events" };
        if self.expanded {
            format!("Hide {} earlier {noun}", self.hidden_count)
        } else {
            format!("Show {} earlier {noun}: {}", self.hidden_count, self.summary)
        }
    }

    /// Members rendered below the header.
    pub fn visible_members(&self) -> Range<usize> {
        if self.expanded {
            self.members.clone()
        } else {
            self.members.end - COLLAPSE_TAIL_LEN..self.members.end
        }
    }

    pub fn header_key(&self) -> String {
        match self.member_ids.first() {
            Some(id) => format!("group:{id}"),
            None => format!("group:{}", self.start),
        }
    }
}

/// Runs the viewer has expanded, keyed by the run's start index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExpandedRuns(HashSet<usize>);

impl ExpandedRuns {
    pub fn is_expanded(&self, start: usize) -> bool {
        self.0.contains(&start)
    }

    pub fn toggle(&mut self, start: usize) -> bool {
        if !self.0.remove(&start) {
            self.0.insert(start);
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Splits messages into passthrough entries and collapsible runs of adjacent
/// `event` messages. Never reorders.
pub fn group_messages(messages: &[Message], expanded: &ExpandedRuns) -> Vec<TimelineGroup> {
    let mut out = Vec::with_capacity(messages.len());
    let mut run_start: Option<usize> = None;

    for (idx, message) in messages.iter().enumerate() {
        if message.is_event() {
            run_start.get_or_insert(idx);
            continue;
        }
        if let Some(start) = run_start.take() {
            close_run(messages, start..idx, expanded, &mut out);
        }
        out.push(TimelineGroup::Single(idx));
    }
    if let Some(start) = run_start {
        close_run(messages, start..messages.len(), expanded, &mut out);
    }

    out
}

fn close_run(
    messages: &[Message],
    run: Range<usize>,
    expanded: &ExpandedRuns,
    out: &mut Vec<TimelineGroup>,
) {
    if run.len() <= COLLAPSE_TAIL_LEN {
        out.extend(run.map(TimelineGroup::Single));
        return;
    }

    let hidden = run.start..run.end - COLLAPSE_TAIL_LEN;
    let summary = messages[hidden.clone()]
        .iter()
        .filter_map(|m| match m {
            Message::Event(event) => Some(event.content.trim()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    out.push(TimelineGroup::Collapsed(CollapsedGroup {
        start: run.start,
        member_ids: messages[run.clone()]
            .iter()
            .map(|m| m.id().to_owned())
            .collect(),
        visible_tail_ids: messages[hidden.end..run.end]
            .iter()
            .map(|m| m.id().to_owned())
            .collect(),
        hidden_count: hidden.len(),
        summary: clip_chars(&summary, SUMMARY_MAX_CHARS),
        expanded: expanded.is_expanded(run.start),
        members: run,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::build_messages;
    use crate::timeline::tests::{item, snapshot, status_event, user};
    use serde_json::json;
    use strand_api::{ConversationEntry, OperationStatus, TaskStatus};

    fn events(n: usize) -> Vec<ConversationEntry> {
        let statuses = [
            TaskStatus::Backlog,
            TaskStatus::Todo,
            TaskStatus::Iterating,
            TaskStatus::Validating,
            TaskStatus::Done,
        ];
        (0..n)
            .map(|i| status_event(statuses[i % 5], statuses[(i + 1) % 5]))
            .collect()
    }

    fn messages_with_run(run: usize) -> Vec<Message> {
        let mut entries = vec![user("go")];
        entries.extend(events(run));
        entries.push(item("m1", "agent_message", json!({"text": "done"})));
        build_messages(&snapshot(OperationStatus::Idle, entries))
    }

    #[test]
    fn run_of_three_is_never_collapsed() {
        let messages = messages_with_run(3);
        let groups = group_messages(&messages, &ExpandedRuns::default());
        assert_eq!(groups.len(), 5);
        assert!(groups.iter().all(|g| matches!(g, TimelineGroup::Single(_))));
    }

    #[test]
    fn run_of_four_collapses_into_header_and_tail() {
        let messages = messages_with_run(4);
        let groups = group_messages(&messages, &ExpandedRuns::default());
        assert_eq!(groups.len(), 3);
        let TimelineGroup::Collapsed(group) = &groups[1] else {
            panic!("expected collapsed group, got {:?}", groups[1]);
        };
        assert_eq!(group.start, 1);
        assert_eq!(group.members, 1..5);
        assert_eq!(group.hidden_count, 1);
        assert_eq!(group.visible_tail_ids.len(), 3);
        assert_eq!(group.visible_members(), 2..5);
        assert_eq!(
            group.header_label(),
            "Show 1 earlier event: Status changed: Backlog → Todo"
        );
    }

    #[test]
    fn five_events_show_two_hidden_with_joined_summary() {
        let messages = build_messages(&snapshot(OperationStatus::Idle, events(5)));
        let groups = group_messages(&messages, &ExpandedRuns::default());
        assert_eq!(groups.len(), 1);
        let TimelineGroup::Collapsed(group) = &groups[0] else {
            panic!("expected collapsed group");
        };
        assert_eq!(group.member_ids.len(), 5);
        assert_eq!(group.visible_tail_ids, vec!["event-2", "event-3", "event-4"]);
        let label = group.header_label();
        assert!(label.starts_with("Show 2 earlier events: "), "{label}");
        assert!(label.contains("Backlog → Todo, Status changed: Todo → Iterating"));
    }

    #[test]
    fn long_summaries_are_truncated() {
        let messages = build_messages(&snapshot(OperationStatus::Idle, events(12)));
        let groups = group_messages(&messages, &ExpandedRuns::default());
        let TimelineGroup::Collapsed(group) = &groups[0] else {
            panic!("expected collapsed group");
        };
        assert!(group.summary.ends_with('…'));
        assert!(group.summary.chars().count() <= SUMMARY_MAX_CHARS + 1);
    }

    #[test]
    fn expanded_runs_render_every_member() {
        let messages = messages_with_run(6);
        let mut expanded = ExpandedRuns::default();
        assert!(expanded.toggle(1));
        let groups = group_messages(&messages, &expanded);
        let TimelineGroup::Collapsed(group) = &groups[1] else {
            panic!("expected collapsed group");
        };
        assert!(group.expanded);
        assert_eq!(group.visible_members(), 1..7);
        assert_eq!(group.header_label(), "Hide 3 earlier events");

        assert!(!expanded.toggle(1));
        let groups = group_messages(&messages, &expanded);
        assert!(matches!(&groups[1], TimelineGroup::Collapsed(g) if !g.expanded));
    }

    #[test]
    fn grouping_preserves_order() {
        let mut entries = events(4);
        entries.push(user("between"));
        entries.extend(events(2));
        let messages = build_messages(&snapshot(OperationStatus::Idle, entries));
        let groups = group_messages(&messages, &ExpandedRuns::default());

        let mut flattened = Vec::new();
        for group in &groups {
            match group {
                TimelineGroup::Single(idx) => flattened.push(*idx),
                TimelineGroup::Collapsed(group) => flattened.extend(group.members.clone()),
            }
        }
        assert_eq!(flattened, (0..messages.len()).collect::<Vec<_>>());
    }
}
