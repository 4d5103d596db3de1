use anyhow::Context as _;
use std::future::Future;
use std::path::{Path, PathBuf};
use strand_api::ConversationSnapshot;
use strand_domain::FetchScope;

/// Source of conversation snapshots. Transport lives behind this trait.
pub trait ConversationFetch: Send + Sync + 'static {
    fn fetch(
        &self,
        scope: FetchScope,
    ) -> impl Future<Output = anyhow::Result<ConversationSnapshot>> + Send;
}

/// Reads snapshots laid out as `<root>/<workspace_id>/<thread_id>.json`.
#[derive(Clone, Debug)]
pub struct SnapshotDirFetch {
    root: PathBuf,
}

impl SnapshotDirFetch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn snapshot_path(&self, scope: FetchScope) -> PathBuf {
        self.root
            .join(scope.workspace_id.0.to_string())
            .join(format!("{}.json", scope.thread_id.0))
    }
}

impl ConversationFetch for SnapshotDirFetch {
    async fn fetch(&self, scope: FetchScope) -> anyhow::Result<ConversationSnapshot> {
        load_snapshot_file(&self.snapshot_path(scope)).await
    }
}

pub async fn load_snapshot_file(path: &Path) -> anyhow::Result<ConversationSnapshot> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    parse_snapshot(&bytes).with_context(|| format!("invalid snapshot {}", path.display()))
}

pub fn parse_snapshot(bytes: &[u8]) -> anyhow::Result<ConversationSnapshot> {
    serde_json::from_slice(bytes).context("failed to decode conversation snapshot")
}
