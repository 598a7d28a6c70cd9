use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::types::Piece;

/// Ordered pieces that are taken out one by one.
///
/// Taken slots are marked instead of removed so indices stay valid while a
/// fill is being planned and cloning for a lookahead is a flat copy.
#[derive(Debug, Clone)]
pub struct PieceBuffer<T> {
    items: Vec<T>,
    taken: Vec<bool>,
    live: usize,
    head: usize,
}

impl<T> PieceBuffer<T> {
    pub fn new(items: Vec<T>) -> Self {
        let live = items.len();
        Self {
            taken: vec![false; live],
            items,
            live,
            head: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live items with their stable slot index, in original order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .skip(self.head)
            .filter(|(i, _)| !self.taken[*i])
    }

    pub fn remaining(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, item)| item)
    }

    pub fn first(&self) -> Option<&T> {
        self.remaining().next()
    }

    pub fn take(&mut self, idx: usize) {
        if idx >= self.items.len() || self.taken[idx] {
            return;
        }
        self.taken[idx] = true;
        self.live -= 1;
        while self.head < self.items.len() && self.taken[self.head] {
            self.head += 1;
        }
    }

    pub fn take_all(&mut self, idxs: &[usize]) {
        for &idx in idxs {
            self.take(idx);
        }
    }
}

/// Expands demand rows into single piece lengths, longest first.
pub fn expand_lengths(rows: &[Piece]) -> Vec<u32> {
    let mut out: Vec<u32> = rows
        .iter()
        .flat_map(|r| std::iter::repeat_n(r.length, r.quantity as usize))
        .collect();
    out.sort_by_key(|&l| Reverse(l));
    out
}

/// Multiset of piece lengths (length -> count). Zero counts are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceCounts(BTreeMap<u32, u32>);

impl PieceCounts {
    pub fn from_lengths(lengths: impl IntoIterator<Item = u32>) -> Self {
        let mut counts = Self::default();
        for l in lengths {
            counts.add(l, 1);
        }
        counts
    }

    pub fn add(&mut self, length: u32, n: u32) {
        if n > 0 {
            *self.0.entry(length).or_insert(0) += n;
        }
    }

    pub fn get(&self, length: u32) -> u32 {
        self.0.get(&length).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn longest(&self) -> Option<u32> {
        self.0.keys().next_back().copied()
    }

    pub fn lengths_desc(&self) -> Vec<u32> {
        self.0.keys().rev().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0.iter().map(|(&l, &n)| (l, n))
    }

    /// How many times `pattern` can be taken out in full.
    pub fn max_repeat(&self, pattern: &PieceCounts) -> u32 {
        pattern
            .iter()
            .map(|(len, need)| self.get(len) / need)
            .min()
            .unwrap_or(0)
    }

    /// Removes `pattern` `times` times, saturating at zero.
    pub fn subtract(&mut self, pattern: &PieceCounts, times: u32) {
        for (len, need) in pattern.iter() {
            let have = self.get(len);
            let left = have.saturating_sub(need.saturating_mul(times));
            if left == 0 {
                self.0.remove(&len);
            } else {
                self.0.insert(len, left);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_take_keeps_indices() {
        let mut buf = PieceBuffer::new(vec![30, 20, 10]);
        buf.take(1);
        let live: Vec<(usize, u32)> = buf.iter().map(|(i, &v)| (i, v)).collect();
        assert_eq!(live, vec![(0, 30), (2, 10)]);
        assert_eq!(buf.len(), 2);

        buf.take(0);
        assert_eq!(buf.first(), Some(&10));
        buf.take(0);
        assert_eq!(buf.len(), 1);
        buf.take(2);
        assert!(buf.is_empty());
        assert_eq!(buf.first(), None);
    }

    #[test]
    fn test_expand_lengths_desc() {
        let rows = [Piece::new(1500, 2), Piece::new(2000, 1)];
        assert_eq!(expand_lengths(&rows), vec![2000, 1500, 1500]);
    }

    #[test]
    fn test_counts_repeat_and_subtract() {
        let mut counts = PieceCounts::from_lengths([1000, 1000, 1000, 1000, 1000, 500, 500]);
        assert_eq!(counts.total(), 7);
        assert_eq!(counts.longest(), Some(1000));
        assert_eq!(counts.lengths_desc(), vec![1000, 500]);

        let pattern = PieceCounts::from_lengths([1000, 1000, 500]);
        assert_eq!(counts.max_repeat(&pattern), 2);

        counts.subtract(&pattern, 2);
        assert_eq!(counts.get(1000), 1);
        assert_eq!(counts.get(500), 0);
        assert_eq!(counts.lengths_desc(), vec![1000]);
    }

    #[test]
    fn test_empty_pattern_repeats_zero() {
        let counts = PieceCounts::from_lengths([100]);
        assert_eq!(counts.max_repeat(&PieceCounts::default()), 0);
    }
}
