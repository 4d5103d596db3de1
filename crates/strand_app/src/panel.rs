use crate::config::ViewerConfig;
use crate::fetch::ConversationFetch;
use std::sync::{Arc, Mutex, MutexGuard};
use strand_api::ConversationSnapshot;
use strand_domain::{
    FetchPanel, FetchScope, FetchSequencer, FetchToken, Message, RenderPlan, ViewState, Viewport,
    build_agent_turns, build_messages,
};
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PanelLayout {
    /// One assistant bubble per turn.
    Bubbles,
    /// Compact turn cards, used by the kanban preview.
    Turns,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApplyOutcome {
    Applied,
    /// Superseded by a newer fetch, or for a conversation the panel no longer shows.
    Stale,
    Failed,
}

pub type FetchResult = (FetchToken, anyhow::Result<ConversationSnapshot>);

/// A view onto one conversation at a time. Every fetch is tagged with a token
/// from the shared sequencer and only the panel's latest token may update it.
pub struct ConversationPanel<F> {
    panel: FetchPanel,
    layout: PanelLayout,
    fetcher: Arc<F>,
    sequencer: Arc<Mutex<FetchSequencer>>,
    scope: Option<FetchScope>,
    snapshot: Option<ConversationSnapshot>,
    messages: Vec<Message>,
    view: ViewState,
    viewport_px: u64,
}

impl<F: ConversationFetch> ConversationPanel<F> {
    pub fn main(
        fetcher: Arc<F>,
        sequencer: Arc<Mutex<FetchSequencer>>,
        config: &ViewerConfig,
    ) -> Self {
        Self::new(FetchPanel::Main, PanelLayout::Bubbles, fetcher, sequencer, config)
    }

    pub fn kanban_preview(
        fetcher: Arc<F>,
        sequencer: Arc<Mutex<FetchSequencer>>,
        config: &ViewerConfig,
    ) -> Self {
        Self::new(
            FetchPanel::KanbanPreview,
            PanelLayout::Turns,
            fetcher,
            sequencer,
            config,
        )
    }

    fn new(
        panel: FetchPanel,
        layout: PanelLayout,
        fetcher: Arc<F>,
        sequencer: Arc<Mutex<FetchSequencer>>,
        config: &ViewerConfig,
    ) -> Self {
        Self {
            panel,
            layout,
            fetcher,
            sequencer,
            scope: None,
            snapshot: None,
            messages: Vec::new(),
            view: ViewState::new(config.window),
            viewport_px: config.viewport_px,
        }
    }

    pub fn scope(&self) -> Option<FetchScope> {
        self.scope
    }

    pub fn snapshot(&self) -> Option<&ConversationSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Points the panel at `scope` and issues the token for its fetch.
    /// Switching conversations clears the timeline and the per-view state.
    pub fn select(&mut self, scope: FetchScope) -> FetchToken {
        if self.scope != Some(scope) {
            self.scope = Some(scope);
            self.snapshot = None;
            self.messages.clear();
            self.view.set_list_key(&scope.list_key());
        }
        let token = lock(&self.sequencer).issue(self.panel, scope);
        tracing::debug!(
            panel = ?self.panel,
            workspace_id = scope.workspace_id.0,
            thread_id = scope.thread_id.0,
            seq = token.seq,
            "conversation fetch issued"
        );
        token
    }

    pub fn spawn_fetch(&self, token: FetchToken) -> JoinHandle<FetchResult> {
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            let result = fetcher.fetch(token.scope).await;
            (token, result)
        })
    }

    pub fn apply(
        &mut self,
        token: FetchToken,
        result: anyhow::Result<ConversationSnapshot>,
    ) -> ApplyOutcome {
        if self.scope != Some(token.scope) || !lock(&self.sequencer).accept(&token) {
            tracing::debug!(panel = ?self.panel, seq = token.seq, "discarding stale conversation snapshot");
            return ApplyOutcome::Stale;
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    workspace_id = token.scope.workspace_id.0,
                    thread_id = token.scope.thread_id.0,
                    "conversation fetch failed"
                );
                return ApplyOutcome::Failed;
            }
        };
        if snapshot.workspace_id != token.scope.workspace_id
            || snapshot.thread_id != token.scope.thread_id
        {
            tracing::warn!(
                workspace_id = snapshot.workspace_id.0,
                thread_id = snapshot.thread_id.0,
                "snapshot does not match the requested conversation"
            );
            return ApplyOutcome::Stale;
        }

        let messages = build_messages(&snapshot);
        self.messages = match self.layout {
            PanelLayout::Bubbles => messages,
            PanelLayout::Turns => build_agent_turns(&messages),
        };
        tracing::debug!(
            rev = snapshot.rev,
            entries = snapshot.entries.len(),
            messages = self.messages.len(),
            "conversation timeline rebuilt"
        );
        self.snapshot = Some(snapshot);
        ApplyOutcome::Applied
    }

    pub async fn open(&mut self, scope: FetchScope) -> ApplyOutcome {
        let token = self.select(scope);
        let result = self.fetcher.fetch(scope).await;
        self.apply(token, result)
    }

    /// Refetches the current conversation, keeping the shown timeline on failure.
    pub async fn refresh(&mut self) -> Option<ApplyOutcome> {
        let scope = self.scope?;
        Some(self.open(scope).await)
    }

    pub fn render(&mut self, scroll_top: u64) -> RenderPlan {
        self.view.render(
            &self.messages,
            Viewport {
                scroll_top,
                height: self.viewport_px,
            },
        )
    }
}

fn lock(sequencer: &Mutex<FetchSequencer>) -> MutexGuard<'_, FetchSequencer> {
    sequencer
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
