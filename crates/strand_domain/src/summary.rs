use crate::activity::ActivityEvent;
use crate::timeline::Message;

const SNIPPET_MAX_CHARS: usize = 120;

/// Steps that finished. Turn markers (cancel, error) and the running
/// placeholder are not steps.
pub fn completed_step_count(activities: &[ActivityEvent]) -> usize {
    activities
        .iter()
        .filter(|a| {
            !a.is_running()
                && !a.is_turn_canceled()
                && !a.is_turn_error()
                && !a.is_running_placeholder()
        })
        .count()
}

pub fn activity_summary(activities: &[ActivityEvent], is_streaming: bool) -> String {
    let completed = completed_step_count(activities);
    if activities.iter().any(ActivityEvent::is_turn_error) {
        return format!("Failed after {}", steps(completed));
    }
    if activities.iter().any(ActivityEvent::is_turn_canceled) {
        return format!("Canceled after {}", steps(completed));
    }
    if is_streaming {
        return format!("Running step {}", completed + 1);
    }
    format!("Completed {}", steps(completed))
}

pub fn format_duration_ms(duration_ms: u64) -> String {
    if duration_ms < 1000 {
        return format!("{duration_ms}ms");
    }
    let secs = duration_ms / 1000;
    if secs < 60 {
        return format!("{secs}s");
    }
    format!("{}m {:02}s", secs / 60, secs % 60)
}

/// Preview text of the most recent user or assistant message.
pub fn latest_snippet(messages: &[Message]) -> Option<String> {
    messages.iter().rev().find_map(|message| match message {
        Message::User(m) => normalize_snippet(&m.content),
        Message::Assistant(m) => normalize_snippet(&m.content),
        Message::Event(_) | Message::AgentTurn(_) => None,
    })
}

fn normalize_snippet(input: &str) -> Option<String> {
    let text = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }
    Some(clip_chars(&text, SNIPPET_MAX_CHARS))
}

pub(crate) fn clip_chars(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let clipped: String = text.chars().take(limit).collect();
        format!("{}…", clipped.trim_end())
    } else {
        text.to_owned()
    }
}

fn steps(count: usize) -> String {
    if count == 1 {
        "1 step".to_owned()
    } else {
        format!("{count} steps")
    }
}
