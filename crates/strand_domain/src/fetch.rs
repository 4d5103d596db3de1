use std::collections::HashMap;
use strand_api::{WorkspaceId, WorkspaceThreadId};

/// The conversation a fetch targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct FetchScope {
    pub workspace_id: WorkspaceId,
    pub thread_id: WorkspaceThreadId,
}

impl FetchScope {
    pub fn new(workspace_id: WorkspaceId, thread_id: WorkspaceThreadId) -> Self {
        Self {
            workspace_id,
            thread_id,
        }
    }

    /// Key used to scope per-view state (expansion, measurements).
    pub fn list_key(&self) -> String {
        format!("{}:{}", self.workspace_id.0, self.thread_id.0)
    }
}

/// A caller of the fetch collaborator. Each panel has its own latest token.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FetchPanel {
    Main,
    KanbanPreview,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FetchToken {
    pub panel: FetchPanel,
    pub scope: FetchScope,
    pub seq: u64,
}

/// Tags fetches with increasing sequence numbers so late responses for a
/// scope the panel already left can be dropped.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    next_seq: u64,
    latest: HashMap<FetchPanel, FetchToken>,
    accepted: HashMap<FetchPanel, u64>,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, panel: FetchPanel, scope: FetchScope) -> FetchToken {
        self.next_seq += 1;
        let token = FetchToken {
            panel,
            scope,
            seq: self.next_seq,
        };
        self.latest.insert(panel, token);
        token
    }

    pub fn is_current(&self, token: &FetchToken) -> bool {
        self.latest.get(&token.panel) == Some(token)
    }

    /// Takes delivery of a response. Accepts each current token once, so a
    /// duplicate delivery of the same response is rejected too.
    pub fn accept(&mut self, token: &FetchToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        let accepted = self.accepted.entry(token.panel).or_default();
        if *accepted >= token.seq {
            return false;
        }
        *accepted = token.seq;
        true
    }

    /// Drops any outstanding fetch for `panel`, e.g. when it closes.
    pub fn invalidate(&mut self, panel: FetchPanel) {
        self.latest.remove(&panel);
    }

    pub fn latest(&self, panel: FetchPanel) -> Option<FetchToken> {
        self.latest.get(&panel).copied()
    }
}
