use crate::grouping::{ExpandedRuns, TimelineGroup, group_messages};
use crate::timeline::Message;
use crate::window::{
    ScrollAnchor, Viewport, VirtualList, WindowConfig, WindowItem, WindowPlan, flatten_rows,
};

/// What the host draws for one frame.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub groups: Vec<TimelineGroup>,
    pub rows: Vec<WindowItem>,
    pub window: WindowPlan,
    /// Scroll offset the host should apply, resolved from the scroll anchor.
    pub scroll_top: u64,
    pub total_height_px: u64,
}

impl RenderPlan {
    pub fn materialized_rows(&self) -> &[WindowItem] {
        match &self.window {
            WindowPlan::Full => &self.rows,
            WindowPlan::Window { range, .. } => &self.rows[range.clone()],
        }
    }
}

/// Per-view presentation state. Everything here belongs to one list key
/// (one workspace thread) and is dropped together when the key changes.
#[derive(Debug)]
pub struct ViewState {
    config: WindowConfig,
    list_key: Option<String>,
    expanded: ExpandedRuns,
    list: VirtualList,
}

impl ViewState {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            list_key: None,
            expanded: ExpandedRuns::default(),
            list: VirtualList::new(),
        }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn list_key(&self) -> Option<&str> {
        self.list_key.as_deref()
    }

    /// Switches to another list. Returns `true` when state was reset.
    pub fn set_list_key(&mut self, key: &str) -> bool {
        if self.list_key.as_deref() == Some(key) {
            return false;
        }
        self.list_key = Some(key.to_owned());
        self.expanded = ExpandedRuns::default();
        self.list = VirtualList::new();
        true
    }

    pub fn is_expanded(&self, start: usize) -> bool {
        self.expanded.is_expanded(start)
    }

    pub fn toggle_group(&mut self, start: usize) -> bool {
        self.expanded.toggle(start)
    }

    pub fn anchor(&self) -> &ScrollAnchor {
        self.list.anchor()
    }

    pub fn on_scroll(&mut self, viewport: Viewport) {
        self.list.update_anchor(viewport);
    }

    pub fn record_measurement(&mut self, key: impl Into<String>, height_px: u32) {
        self.list.record_measurement(key, height_px);
    }

    pub fn has_pending_measurements(&self) -> bool {
        self.list.has_pending_measurements()
    }

    /// Applies queued measurements; the host calls this from its idle/next-frame hook.
    pub fn flush_measurements(&mut self, viewport: Viewport) -> Option<u64> {
        self.list.flush_measurements(viewport)
    }

    pub fn render(&mut self, messages: &[Message], viewport: Viewport) -> RenderPlan {
        let groups = group_messages(messages, &self.expanded);
        let rows = flatten_rows(messages, &groups, &self.config.estimates);
        self.list.set_items(rows);

        let scroll_top = self
            .list
            .resolve_scroll_top(viewport.height)
            .unwrap_or(viewport.scroll_top);
        let window = self.list.plan(
            Viewport {
                scroll_top,
                height: viewport.height,
            },
            &self.config,
        );

        RenderPlan {
            groups,
            rows: self.list.items().to_vec(),
            window,
            scroll_top,
            total_height_px: self.list.total_height(),
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}
