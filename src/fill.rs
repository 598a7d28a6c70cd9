use crate::demand::PieceBuffer;
use crate::types::{Bar, SourceType};

/// Whether a piece plus one kerf still fits in `remaining`.
pub fn fits(remaining: u32, length: u32, kerf: u32) -> bool {
    length as u64 + kerf as u64 <= remaining as u64
}

/// Result of filling one bar from the front of a piece buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarFill {
    pub stock_length: u32,
    pub cuts: Vec<u32>,
    /// Buffer slots of the cut pieces.
    pub picked: Vec<usize>,
    pub remainder: u32,
    pub kerf_total: u32,
}

impl BarFill {
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn into_bar(self, source: SourceType, repeat_count: u32) -> Bar {
        Bar {
            stock_length: self.stock_length,
            source,
            cuts: self.cuts,
            remainder: self.remainder,
            kerf_total: self.kerf_total,
            repeat_count,
        }
    }
}

/// Longest-first greedy fill of a single bar.
///
/// `pieces` must be ordered longest first; every piece that still fits is
/// cut, so each step places the largest piece that fits. One kerf is charged
/// per cut.
pub fn fill_bar(stock_length: u32, pieces: &PieceBuffer<u32>, kerf: u32) -> BarFill {
    let mut remaining = stock_length;
    let mut cuts = Vec::new();
    let mut picked = Vec::new();
    let mut kerf_total = 0;

    for (idx, &length) in pieces.iter() {
        if !fits(remaining, length, kerf) {
            continue;
        }
        cuts.push(length);
        picked.push(idx);
        remaining -= length + kerf;
        kerf_total += kerf;
        if remaining == 0 {
            break;
        }
    }

    BarFill {
        stock_length,
        cuts,
        picked,
        remainder: remaining,
        kerf_total,
    }
}
