use std::fmt::Write as _;
use strand_api::QueuedPromptSnapshot;
use strand_domain::{
    ActivityEvent, ActivityStatus, EventSource, Message, RenderPlan, RowKind, TimelineGroup,
    TurnStatus, WindowPlan, activity_summary, format_duration_ms,
};

/// Plain-text rendering of the materialized rows of a plan.
pub fn render_text(messages: &[Message], plan: &RenderPlan) -> String {
    let mut out = String::new();

    if let WindowPlan::Window { range, .. } = &plan.window {
        if *range.start() > 0 {
            let _ = writeln!(out, "… {} rows above", range.start());
        }
    }

    for row in plan.materialized_rows() {
        match row.kind {
            RowKind::Message(idx) => {
                if let Some(message) = messages.get(idx) {
                    render_message(&mut out, message);
                }
            }
            RowKind::GroupHeader { start } => {
                let header = plan.groups.iter().find_map(|group| match group {
                    TimelineGroup::Collapsed(group) if group.start == start => {
                        Some(group.header_label())
                    }
                    _ => None,
                });
                if let Some(header) = header {
                    let _ = writeln!(out, "  ┬ {header}");
                }
            }
        }
    }

    if let WindowPlan::Window { range, .. } = &plan.window {
        let below = plan.rows.len().saturating_sub(range.end() + 1);
        if below > 0 {
            let _ = writeln!(out, "… {below} rows below");
        }
    }

    out
}

pub fn render_pending_prompts(prompts: &[QueuedPromptSnapshot]) -> String {
    let mut out = String::new();
    for prompt in prompts {
        let _ = writeln!(
            out,
            "queued #{} ({}): {}",
            prompt.id,
            prompt.run_config.model_id,
            prompt.text.trim()
        );
    }
    out
}

fn render_message(out: &mut String, message: &Message) {
    match message {
        Message::User(m) => {
            let _ = writeln!(out, "> {}", m.content.trim());
            for attachment in &m.attachments {
                let _ = writeln!(out, "  [attachment: {}]", attachment.name);
            }
        }
        Message::Assistant(m) => {
            let mut header = String::from("assistant");
            if !m.activities.is_empty() {
                let _ = write!(header, " · {}", activity_summary(&m.activities, m.is_streaming));
            }
            if let Some(duration_ms) = m.metadata.as_ref().and_then(|meta| meta.duration_ms) {
                let _ = write!(header, " · {}", format_duration_ms(duration_ms));
            }
            if m.is_streaming {
                header.push_str(" …");
            }
            let _ = writeln!(out, "{header}");
            render_activities(out, &m.activities);
            for line in m.content.lines() {
                let _ = writeln!(out, "  {line}");
            }
        }
        Message::Event(m) => {
            let source = match m.source {
                EventSource::System => "·",
                EventSource::Terminal => "$",
            };
            let running = if m.status == ActivityStatus::Running {
                " (running)"
            } else {
                ""
            };
            let _ = writeln!(out, "  {source} {}{running}", m.content);
        }
        Message::AgentTurn(m) => {
            let status = match m.turn_status {
                TurnStatus::Running => "running",
                TurnStatus::Done => "done",
                TurnStatus::Canceled => "canceled",
                TurnStatus::Error => "error",
            };
            let summary = activity_summary(&m.activities, m.turn_status == TurnStatus::Running);
            let _ = writeln!(out, "turn [{status}] {summary}");
            render_activities(out, &m.activities);
        }
    }
}

fn render_activities(out: &mut String, activities: &[ActivityEvent]) {
    for activity in activities {
        let mark = match activity.status {
            ActivityStatus::Running => "~",
            ActivityStatus::Done => "x",
        };
        let _ = writeln!(out, "  [{mark}] {}", activity.title);
    }
}
