pub mod config;
pub mod fetch;
pub mod panel;
pub mod present;

pub use config::ViewerConfig;
pub use fetch::{ConversationFetch, SnapshotDirFetch, load_snapshot_file, parse_snapshot};
pub use panel::{ApplyOutcome, ConversationPanel, FetchResult, PanelLayout};

use strand_api::ConversationSnapshot;
use strand_domain::{
    FetchScope, Message, RenderPlan, ViewState, Viewport, build_agent_turns, build_messages,
};

#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    /// `None` follows the tail.
    pub scroll_top: Option<u64>,
    pub expand: Vec<usize>,
    pub layout_turns: bool,
}

/// One-shot rendering of a snapshot outside of a panel.
pub fn render_snapshot(
    snapshot: &ConversationSnapshot,
    options: &RenderOptions,
    config: &ViewerConfig,
) -> (Vec<Message>, RenderPlan) {
    let mut messages = build_messages(snapshot);
    if options.layout_turns {
        messages = build_agent_turns(&messages);
    }

    let mut view = ViewState::new(config.window);
    view.set_list_key(&FetchScope::new(snapshot.workspace_id, snapshot.thread_id).list_key());
    for start in &options.expand {
        view.toggle_group(*start);
    }

    let mut viewport = Viewport {
        scroll_top: 0,
        height: config.viewport_px,
    };
    let mut plan = view.render(&messages, viewport);
    if let Some(scroll_top) = options.scroll_top {
        viewport.scroll_top = scroll_top.min(plan.total_height_px.saturating_sub(viewport.height));
        view.on_scroll(viewport);
        plan = view.render(&messages, viewport);
    }
    (messages, plan)
}
