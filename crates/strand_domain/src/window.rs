//! Row flattening and the windowed list model.
//!
//! Rows are keyed by message id so measured heights survive timeline rebuilds.
//! Row offsets live in a Fenwick tree over heights, so a measurement anywhere
//! in the list costs O(log n). Measurements are queued until the host flushes
//! them once per frame.

use crate::grouping::TimelineGroup;
use crate::height_index::HeightIndex;
use crate::timeline::Message;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Distance from the bottom within which the list keeps following the tail.
const FOLLOW_TAIL_SLACK_PX: u64 = 4;
const MAX_ESTIMATED_TEXT_LINES: u32 = 40;
const ESTIMATED_CHARS_PER_LINE: usize = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeightEstimates {
    pub user_px: u32,
    pub assistant_px: u32,
    pub text_line_px: u32,
    pub activity_px: u32,
    pub event_px: u32,
    pub group_header_px: u32,
}

impl Default for HeightEstimates {
    fn default() -> Self {
        Self {
            user_px: 56,
            assistant_px: 48,
            text_line_px: 20,
            activity_px: 28,
            event_px: 32,
            group_header_px: 32,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WindowConfig {
    pub overscan_px: u32,
    /// Lists with at most this many rows render in full.
    pub materialize_threshold: usize,
    pub estimates: HeightEstimates,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            overscan_px: 600,
            materialize_threshold: 80,
            estimates: HeightEstimates::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Viewport {
    pub scroll_top: u64,
    pub height: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowKind {
    Message(usize),
    GroupHeader { start: usize },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WindowItem {
    pub key: String,
    pub kind: RowKind,
    pub estimated_height_px: u32,
    pub measured_height_px: Option<u32>,
}

impl WindowItem {
    pub fn height_px(&self) -> u32 {
        self.measured_height_px.unwrap_or(self.estimated_height_px)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum ScrollAnchor {
    #[default]
    FollowTail,
    Block { key: String, offset_px: u64 },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WindowPlan {
    /// Below the materialization threshold: render every row.
    Full,
    Window {
        range: RangeInclusive<usize>,
        pad_top_px: u64,
        pad_bottom_px: u64,
    },
}

impl WindowPlan {
    pub fn contains(&self, idx: usize) -> bool {
        match self {
            WindowPlan::Full => true,
            WindowPlan::Window { range, .. } => range.contains(&idx),
        }
    }
}

/// Flattens the render plan into keyed rows, in display order.
pub fn flatten_rows(
    messages: &[Message],
    groups: &[TimelineGroup],
    estimates: &HeightEstimates,
) -> Vec<WindowItem> {
    let mut rows = Vec::with_capacity(messages.len());
    let push_message = |rows: &mut Vec<WindowItem>, idx: usize| {
        let Some(message) = messages.get(idx) else {
            return;
        };
        rows.push(WindowItem {
            key: message.id().to_owned(),
            kind: RowKind::Message(idx),
            estimated_height_px: estimate_message_height(message, estimates),
            measured_height_px: None,
        });
    };

    for group in groups {
        match group {
            TimelineGroup::Single(idx) => push_message(&mut rows, *idx),
            TimelineGroup::Collapsed(group) => {
                rows.push(WindowItem {
                    key: group.header_key(),
                    kind: RowKind::GroupHeader { start: group.start },
                    estimated_height_px: estimates.group_header_px,
                    measured_height_px: None,
                });
                for idx in group.visible_members() {
                    push_message(&mut rows, idx);
                }
            }
        }
    }
    rows
}

pub fn estimate_message_height(message: &Message, estimates: &HeightEstimates) -> u32 {
    match message {
        Message::User(m) => estimates.user_px + text_lines(&m.content) * estimates.text_line_px,
        Message::Assistant(m) => {
            estimates.assistant_px
                + text_lines(&m.content) * estimates.text_line_px
                + m.activities.len() as u32 * estimates.activity_px
        }
        Message::Event(_) => estimates.event_px,
        Message::AgentTurn(m) => {
            estimates.assistant_px + m.activities.len() as u32 * estimates.activity_px
        }
    }
}

fn text_lines(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let lines: usize = text
        .lines()
        .map(|line| line.chars().count().div_ceil(ESTIMATED_CHARS_PER_LINE).max(1))
        .sum();
    (lines as u32).min(MAX_ESTIMATED_TEXT_LINES)
}

#[derive(Debug)]
pub struct VirtualList {
    items: Vec<WindowItem>,
    index_by_key: HashMap<String, usize>,
    measured: HashMap<String, u32>,
    heights: HeightIndex,
    pending: Vec<(String, u32)>,
    anchor: ScrollAnchor,
}

impl Default for VirtualList {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualList {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index_by_key: HashMap::new(),
            measured: HashMap::new(),
            heights: HeightIndex::default(),
            pending: Vec::new(),
            anchor: ScrollAnchor::FollowTail,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[WindowItem] {
        &self.items
    }

    pub fn anchor(&self) -> &ScrollAnchor {
        &self.anchor
    }

    pub fn measured_height(&self, key: &str) -> Option<u32> {
        self.measured.get(key).copied()
    }

    /// Replaces the rows. Heights measured earlier are reapplied by key, and
    /// only rows after the unchanged prefix are reindexed.
    pub fn set_items(&mut self, mut items: Vec<WindowItem>) {
        for item in &mut items {
            item.measured_height_px = self.measured.get(&item.key).copied();
        }

        let unchanged_prefix = self
            .items
            .iter()
            .zip(items.iter())
            .take_while(|(old, new)| old.key == new.key && old.height_px() == new.height_px())
            .count();
        self.heights.truncate(unchanged_prefix);
        for item in &items[unchanged_prefix..] {
            self.heights.push(u64::from(item.height_px()));
        }

        self.index_by_key.clear();
        self.index_by_key.reserve(items.len());
        for (idx, item) in items.iter().enumerate() {
            self.index_by_key.insert(item.key.clone(), idx);
        }
        self.items = items;
    }

    /// Queues a height reported by the host. Applied by `flush_measurements`.
    pub fn record_measurement(&mut self, key: impl Into<String>, height_px: u32) {
        self.pending.push((key.into(), height_px));
    }

    pub fn has_pending_measurements(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Applies queued measurements in one pass and returns the scroll offset
    /// that keeps the anchored row in place, when it differs from the current one.
    pub fn flush_measurements(&mut self, viewport: Viewport) -> Option<u64> {
        if self.pending.is_empty() {
            return None;
        }
        self.update_anchor(viewport);

        for (key, height_px) in std::mem::take(&mut self.pending) {
            if self.measured.insert(key.clone(), height_px) == Some(height_px) {
                continue;
            }
            if let Some(&idx) = self.index_by_key.get(&key) {
                let item = &mut self.items[idx];
                if item.height_px() != height_px {
                    item.measured_height_px = Some(height_px);
                    self.heights.set(idx, u64::from(height_px));
                }
            }
        }

        let corrected = self.resolve_scroll_top(viewport.height)?;
        (corrected != viewport.scroll_top).then_some(corrected)
    }

    pub fn total_height(&self) -> u64 {
        self.heights.total()
    }

    pub fn item_top(&self, idx: usize) -> Option<u64> {
        (idx < self.items.len()).then(|| self.heights.prefix(idx))
    }

    /// Records where the viewer is, as a row key plus offset, or as following the tail.
    pub fn update_anchor(&mut self, viewport: Viewport) {
        let total = self.total_height();
        let max_scroll = total.saturating_sub(viewport.height);
        if self.items.is_empty() || viewport.scroll_top + FOLLOW_TAIL_SLACK_PX >= max_scroll {
            self.anchor = ScrollAnchor::FollowTail;
            return;
        }
        let idx = self.row_at(viewport.scroll_top);
        self.anchor = ScrollAnchor::Block {
            key: self.items[idx].key.clone(),
            offset_px: viewport.scroll_top - self.heights.prefix(idx),
        };
    }

    /// Scroll offset implied by the anchor under the current layout. `None`
    /// when the anchored row is gone.
    pub fn resolve_scroll_top(&self, viewport_height: u64) -> Option<u64> {
        let total = self.total_height();
        let max_scroll = total.saturating_sub(viewport_height);
        match &self.anchor {
            ScrollAnchor::FollowTail => Some(max_scroll),
            ScrollAnchor::Block { key, offset_px } => {
                let idx = *self.index_by_key.get(key)?;
                Some((self.heights.prefix(idx) + offset_px).min(max_scroll))
            }
        }
    }

    /// Rows intersecting `[scroll_top - overscan, scroll_top + height + overscan]`.
    pub fn visible_range(
        &self,
        viewport: Viewport,
        overscan_px: u32,
    ) -> Option<RangeInclusive<usize>> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        let overscan = u64::from(overscan_px);
        let lo_px = viewport.scroll_top.saturating_sub(overscan);
        let hi_px = viewport.scroll_top + viewport.height + overscan;

        // First row whose bottom is below `lo_px`, last row whose top is above `hi_px`.
        let lo = self.heights.rows_ending_by(lo_px).min(last);
        let hi = match hi_px.checked_sub(1) {
            Some(edge) => self.heights.rows_ending_by(edge).min(last),
            None => 0,
        };
        Some(lo..=hi.max(lo))
    }

    pub fn plan(&self, viewport: Viewport, config: &WindowConfig) -> WindowPlan {
        if self.items.len() <= config.materialize_threshold {
            return WindowPlan::Full;
        }
        let Some(range) = self.visible_range(viewport, config.overscan_px) else {
            return WindowPlan::Full;
        };
        let total = self.heights.total();
        WindowPlan::Window {
            pad_top_px: self.heights.prefix(*range.start()),
            pad_bottom_px: total - self.heights.prefix(*range.end() + 1),
            range,
        }
    }

    fn row_at(&self, offset_px: u64) -> usize {
        self.heights
            .rows_ending_by(offset_px)
            .min(self.heights.len().saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(heights: &[u32]) -> Vec<WindowItem> {
        heights
            .iter()
            .enumerate()
            .map(|(idx, height)| WindowItem {
                key: format!("row-{idx}"),
                kind: RowKind::Message(idx),
                estimated_height_px: *height,
                measured_height_px: None,
            })
            .collect()
    }

    fn list(heights: &[u32]) -> VirtualList {
        let mut list = VirtualList::new();
        list.set_items(rows(heights));
        list
    }

    #[test]
    fn offsets_are_prefix_sums_of_estimates() {
        let list = list(&[10, 20, 30]);
        assert_eq!(list.total_height(), 60);
        assert_eq!(list.item_top(0), Some(0));
        assert_eq!(list.item_top(2), Some(30));
        assert_eq!(list.item_top(3), None);
    }

    #[test]
    fn visible_range_includes_overscan() {
        let list = list(&[100; 20]);
        let viewport = Viewport {
            scroll_top: 500,
            height: 200,
        };
        assert_eq!(list.visible_range(viewport, 0), Some(5..=6));
        assert_eq!(list.visible_range(viewport, 150), Some(3..=8));
    }

    #[test]
    fn visible_range_clamps_past_the_end() {
        let list = list(&[100; 5]);
        let viewport = Viewport {
            scroll_top: 10_000,
            height: 200,
        };
        assert_eq!(list.visible_range(viewport, 0), Some(4..=4));
        assert_eq!(VirtualList::new().visible_range(viewport, 0), None);
    }

    #[test]
    fn midpoint_row_is_always_materialized() {
        let mut seed = 7u64;
        let heights: Vec<u32> = (0..500)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                20 + (seed >> 33) as u32 % 300
            })
            .collect();
        let list = list(&heights);
        let total = list.total_height();
        for overscan in [0, 64, 600] {
            for scroll_top in (0..total).step_by(37) {
                let viewport = Viewport {
                    scroll_top,
                    height: 700,
                };
                let range = list.visible_range(viewport, overscan).expect("range");
                let midpoint = (scroll_top + viewport.height / 2).min(total - 1);
                let row = list.row_at(midpoint);
                assert!(
                    range.contains(&row),
                    "row {row} under midpoint {midpoint} missing from {range:?}"
                );
            }
        }
    }

    #[test]
    fn small_lists_render_in_full() {
        let config = WindowConfig::default();
        let small = list(&[50; 10]);
        assert_eq!(small.plan(Viewport::default(), &config), WindowPlan::Full);

        let large = list(&[50; 200]);
        let plan = large.plan(
            Viewport {
                scroll_top: 5000,
                height: 500,
            },
            &config,
        );
        let WindowPlan::Window {
            range,
            pad_top_px,
            pad_bottom_px,
        } = plan
        else {
            panic!("expected windowed plan");
        };
        assert_eq!(range, 88..=121);
        assert_eq!(pad_top_px, 88 * 50);
        assert_eq!(pad_bottom_px, (200 - 122) * 50);
    }

    #[test]
    fn measurements_survive_rebuilds_by_key() {
        let mut list = list(&[50, 50, 50]);
        list.record_measurement("row-1", 120);
        assert!(list.has_pending_measurements());
        assert_eq!(list.total_height(), 150);

        list.flush_measurements(Viewport::default());
        assert!(!list.has_pending_measurements());
        assert_eq!(list.total_height(), 220);

        list.set_items(rows(&[50, 50, 50, 50]));
        assert_eq!(list.items()[1].measured_height_px, Some(120));
        assert_eq!(list.measured_height("row-1"), Some(120));
        assert_eq!(list.total_height(), 270);
    }

    #[test]
    fn rebuilds_reindex_only_changed_suffix() {
        let mut list = list(&[10, 10]);
        assert_eq!(list.total_height(), 20);
        list.set_items(rows(&[10, 10, 30]));
        assert_eq!(list.total_height(), 50);
        assert_eq!(list.item_top(2), Some(20));

        list.set_items(rows(&[10, 40]));
        assert_eq!(list.heights.len(), 2);
        assert_eq!(list.total_height(), 50);
        assert_eq!(list.item_top(1), Some(10));
    }

    #[test]
    fn measuring_the_first_row_shifts_every_later_row() {
        let mut list = list(&[100; 1000]);
        list.record_measurement("row-0", 40);
        list.flush_measurements(Viewport::default());
        assert_eq!(list.item_top(1), Some(40));
        assert_eq!(list.item_top(999), Some(40 + 998 * 100));
        assert_eq!(list.total_height(), 40 + 999 * 100);
        assert_eq!(list.row_at(140), 2);
    }

    #[test]
    fn measuring_rows_above_keeps_anchored_row_still() {
        let mut list = list(&[100; 50]);
        let viewport = Viewport {
            scroll_top: 1030,
            height: 300,
        };
        list.update_anchor(viewport);
        assert_eq!(
            list.anchor(),
            &ScrollAnchor::Block {
                key: "row-10".to_owned(),
                offset_px: 30,
            }
        );

        list.record_measurement("row-2", 180);
        list.record_measurement("row-3", 60);
        let corrected = list.flush_measurements(viewport);
        assert_eq!(corrected, Some(1070));
        assert_eq!(list.item_top(10), Some(1040));
    }

    #[test]
    fn follow_tail_tracks_growing_content() {
        let mut list = list(&[100; 10]);
        let viewport = Viewport {
            scroll_top: 700,
            height: 300,
        };
        list.update_anchor(viewport);
        assert_eq!(list.anchor(), &ScrollAnchor::FollowTail);

        list.record_measurement("row-9", 250);
        assert_eq!(list.flush_measurements(viewport), Some(850));

        list.set_items(rows(&[100; 12]));
        assert_eq!(list.resolve_scroll_top(300), Some(1050));
    }

    #[test]
    fn repeated_measurement_is_a_no_op() {
        let mut list = list(&[100; 3]);
        list.record_measurement("row-0", 100);
        assert_eq!(
            list.flush_measurements(Viewport {
                scroll_top: 0,
                height: 300,
            }),
            None
        );
        assert_eq!(list.total_height(), 300);
    }
}
