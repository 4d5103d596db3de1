//! Fenwick tree over row heights: point updates, prefix sums and
//! offset-to-row lookup in O(log n).

#[derive(Clone, Debug, Default)]
pub(crate) struct HeightIndex {
    heights: Vec<u64>,
    /// 1-based; `tree[i]` holds the sum of `heights[i - lowbit(i)..i]`.
    tree: Vec<u64>,
}

impl HeightIndex {
    pub(crate) fn len(&self) -> usize {
        self.heights.len()
    }

    /// Drops rows from `len` on. Nodes at or below `len` only cover earlier rows,
    /// so they stay valid.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.heights.truncate(len);
        self.tree.truncate(len + 1);
    }

    pub(crate) fn push(&mut self, height: u64) {
        if self.tree.is_empty() {
            self.tree.push(0);
        }
        let i = self.heights.len() + 1;
        let covered_from = i - lowbit(i);
        let node = height + self.prefix(i - 1) - self.prefix(covered_from);
        self.heights.push(height);
        self.tree.push(node);
    }

    pub(crate) fn set(&mut self, idx: usize, height: u64) {
        let Some(old) = self.heights.get(idx).copied() else {
            return;
        };
        if old == height {
            return;
        }
        self.heights[idx] = height;
        let mut i = idx + 1;
        while i < self.tree.len() {
            if height > old {
                self.tree[i] += height - old;
            } else {
                self.tree[i] -= old - height;
            }
            i += lowbit(i);
        }
    }

    /// Sum of the first `n` heights, i.e. the top of row `n`.
    pub(crate) fn prefix(&self, n: usize) -> u64 {
        let mut i = n.min(self.heights.len());
        let mut sum = 0;
        while i > 0 {
            sum += self.tree[i];
            i -= lowbit(i);
        }
        sum
    }

    pub(crate) fn total(&self) -> u64 {
        self.prefix(self.heights.len())
    }

    /// Number of leading rows whose bottom edge is at or above `offset`.
    pub(crate) fn rows_ending_by(&self, offset: u64) -> usize {
        let len = self.heights.len();
        let mut pos = 0;
        let mut remaining = offset;
        let mut step = if len == 0 { 0 } else { 1 << len.ilog2() };
        while step > 0 {
            let next = pos + step;
            if next <= len && self.tree[next] <= remaining {
                pos = next;
                remaining -= self.tree[next];
            }
            step >>= 1;
        }
        pos
    }
}

fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(heights: &[u64]) -> HeightIndex {
        let mut index = HeightIndex::default();
        for height in heights {
            index.push(*height);
        }
        index
    }

    fn naive_rows_ending_by(heights: &[u64], offset: u64) -> usize {
        let mut bottom = 0;
        heights
            .iter()
            .take_while(|height| {
                bottom += **height;
                bottom <= offset
            })
            .count()
    }

    #[test]
    fn prefix_sums_match_a_linear_scan() {
        let heights: Vec<u64> = (0..37).map(|i| (i * 7 % 11) + 1).collect();
        let index = index(&heights);
        for n in 0..=heights.len() {
            assert_eq!(index.prefix(n), heights[..n].iter().sum::<u64>(), "prefix {n}");
        }
        assert_eq!(index.total(), heights.iter().sum::<u64>());
    }

    #[test]
    fn updates_shift_every_later_prefix() {
        let mut heights = vec![10u64; 20];
        let mut index = index(&heights);
        index.set(3, 25);
        index.set(17, 4);
        index.set(50, 1);
        heights[3] = 25;
        heights[17] = 4;
        for n in 0..=heights.len() {
            assert_eq!(index.prefix(n), heights[..n].iter().sum::<u64>());
        }
        assert_eq!(index.prefix(4) - index.prefix(3), 25);
    }

    #[test]
    fn truncate_then_push_matches_fresh_build() {
        let mut index = index(&[5, 9, 2, 7, 3, 8, 1]);
        index.truncate(3);
        index.push(4);
        index.push(6);
        let fresh = self::index(&[5, 9, 2, 4, 6]);
        for n in 0..=5 {
            assert_eq!(index.prefix(n), fresh.prefix(n));
        }
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn offset_lookup_matches_a_linear_scan() {
        let heights: Vec<u64> = (0..29).map(|i| if i % 5 == 0 { 0 } else { i * 3 }).collect();
        let index = index(&heights);
        for offset in 0..index.total() + 5 {
            assert_eq!(
                index.rows_ending_by(offset),
                naive_rows_ending_by(&heights, offset),
                "offset {offset}"
            );
        }
        assert_eq!(HeightIndex::default().rows_ending_by(10), 0);
    }
}
