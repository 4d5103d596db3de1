use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use strand_api::{
    AgentItem, AgentItemKind, ConversationEntry, ConversationSnapshot, OperationStatus,
    UserMessage, WorkspaceId, WorkspaceThreadId,
};
use strand_app::{ApplyOutcome, ConversationFetch, ConversationPanel, ViewerConfig};
use strand_domain::{FetchScope, FetchSequencer, Message};
use tokio::sync::oneshot;

fn scope(thread: u64) -> FetchScope {
    FetchScope::new(WorkspaceId(7), WorkspaceThreadId(thread))
}

fn snapshot_for(scope: FetchScope) -> ConversationSnapshot {
    ConversationSnapshot {
        rev: 1,
        workspace_id: scope.workspace_id,
        thread_id: scope.thread_id,
        agent_model_id: "gpt-5".to_owned(),
        thinking_effort: Default::default(),
        run_status: OperationStatus::Idle,
        entries: vec![
            ConversationEntry::UserMessage(UserMessage {
                text: format!("thread {}", scope.thread_id.0),
                attachments: Vec::new(),
            }),
            ConversationEntry::AgentItem(AgentItem {
                id: "c1".to_owned(),
                kind: AgentItemKind::CommandExecution,
                payload: serde_json::json!({"command": "ls", "status": "completed"}),
            }),
        ],
        entries_start: 0,
        entries_total: 2,
        in_progress_items: Vec::new(),
        pending_prompts: Vec::new(),
        title: String::new(),
    }
}

/// Fetches block until the test releases the gate for that thread.
#[derive(Default)]
struct GatedFetch {
    gates: Mutex<HashMap<u64, oneshot::Receiver<()>>>,
}

impl GatedFetch {
    fn gate(&self, thread: u64) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().expect("gates lock").insert(thread, rx);
        tx
    }
}

impl ConversationFetch for GatedFetch {
    async fn fetch(&self, scope: FetchScope) -> anyhow::Result<ConversationSnapshot> {
        let gate = self
            .gates
            .lock()
            .expect("gates lock")
            .remove(&scope.thread_id.0);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(snapshot_for(scope))
    }
}

struct FailingFetch;

impl ConversationFetch for FailingFetch {
    async fn fetch(&self, _scope: FetchScope) -> anyhow::Result<ConversationSnapshot> {
        Err(anyhow::anyhow!("backend unavailable"))
    }
}

fn first_user_text(messages: &[Message]) -> Option<&str> {
    messages.iter().find_map(|m| match m {
        Message::User(m) => Some(m.content.as_str()),
        _ => None,
    })
}

#[tokio::test]
async fn late_response_for_previous_thread_is_discarded() {
    let fetch = Arc::new(GatedFetch::default());
    let release_a = fetch.gate(1);
    let release_b = fetch.gate(2);
    let sequencer = Arc::new(Mutex::new(FetchSequencer::new()));
    let mut panel = ConversationPanel::main(fetch, sequencer, &ViewerConfig::default());

    let token_a = panel.select(scope(1));
    let task_a = panel.spawn_fetch(token_a);
    let token_b = panel.select(scope(2));
    let task_b = panel.spawn_fetch(token_b);

    release_b.send(()).expect("release b");
    let (token, result) = task_b.await.expect("fetch b");
    assert_eq!(panel.apply(token, result), ApplyOutcome::Applied);

    release_a.send(()).expect("release a");
    let (token, result) = task_a.await.expect("fetch a");
    assert_eq!(panel.apply(token, result), ApplyOutcome::Stale);

    assert_eq!(panel.scope(), Some(scope(2)));
    assert_eq!(
        panel.snapshot().map(|s| s.thread_id),
        Some(WorkspaceThreadId(2))
    );
    assert_eq!(first_user_text(panel.messages()), Some("thread 2"));
}

#[tokio::test]
async fn early_response_for_previous_thread_is_discarded_too() {
    let fetch = Arc::new(GatedFetch::default());
    let sequencer = Arc::new(Mutex::new(FetchSequencer::new()));
    let mut panel = ConversationPanel::main(fetch, sequencer, &ViewerConfig::default());

    let token_a = panel.select(scope(1));
    let (token, result) = panel.spawn_fetch(token_a).await.expect("fetch a");
    let _token_b = panel.select(scope(2));
    assert_eq!(panel.apply(token, result), ApplyOutcome::Stale);
    assert!(panel.messages().is_empty());
    assert!(panel.snapshot().is_none());
}

#[tokio::test]
async fn main_and_preview_panels_keep_independent_tokens() {
    let fetch = Arc::new(GatedFetch::default());
    let sequencer = Arc::new(Mutex::new(FetchSequencer::new()));
    let config = ViewerConfig::default();
    let mut main = ConversationPanel::main(Arc::clone(&fetch), Arc::clone(&sequencer), &config);
    let mut preview = ConversationPanel::kanban_preview(fetch, sequencer, &config);

    let main_token = main.select(scope(1));
    let preview_token = preview.select(scope(3));
    let (token, result) = preview.spawn_fetch(preview_token).await.expect("preview");
    assert_eq!(preview.apply(token, result), ApplyOutcome::Applied);
    let (token, result) = main.spawn_fetch(main_token).await.expect("main");
    assert_eq!(main.apply(token, result), ApplyOutcome::Applied);

    assert!(matches!(main.messages()[1], Message::Assistant(_)));
    assert!(matches!(preview.messages()[1], Message::AgentTurn(_)));
}

#[tokio::test]
async fn failed_refresh_keeps_previous_timeline() {
    let sequencer = Arc::new(Mutex::new(FetchSequencer::new()));
    let mut panel = ConversationPanel::main(
        Arc::new(GatedFetch::default()),
        Arc::clone(&sequencer),
        &ViewerConfig::default(),
    );
    assert_eq!(panel.open(scope(1)).await, ApplyOutcome::Applied);
    let before = panel.messages().len();

    let token = panel.select(scope(1));
    let outcome = panel.apply(token, Err(anyhow::anyhow!("timeout")));
    assert_eq!(outcome, ApplyOutcome::Failed);
    assert_eq!(panel.messages().len(), before);

    let mut failing =
        ConversationPanel::main(Arc::new(FailingFetch), sequencer, &ViewerConfig::default());
    assert_eq!(failing.refresh().await, None);
    assert_eq!(failing.open(scope(4)).await, ApplyOutcome::Failed);
    assert!(failing.messages().is_empty());
}

#[tokio::test]
async fn mismatched_snapshot_is_rejected() {
    let sequencer = Arc::new(Mutex::new(FetchSequencer::new()));
    let mut panel = ConversationPanel::main(
        Arc::new(GatedFetch::default()),
        sequencer,
        &ViewerConfig::default(),
    );
    let token = panel.select(scope(1));
    let outcome = panel.apply(token, Ok(snapshot_for(scope(9))));
    assert_eq!(outcome, ApplyOutcome::Stale);
    assert!(panel.snapshot().is_none());
}
