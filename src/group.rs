use serde::Serialize;

use crate::types::{Bar, Placement};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarGroup {
    pub bar: Bar,
    /// Physical bars in the run, repeats included.
    pub count: u32,
    pub start_no: u32,
    pub end_no: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementGroup {
    pub placement: Placement,
    pub count: u32,
    pub start_no: u32,
    pub end_no: u32,
}

fn same_pattern(a: &Bar, b: &Bar) -> bool {
    a.source == b.source
        && a.stock_length == b.stock_length
        && a.remainder == b.remainder
        && a.kerf_total == b.kerf_total
        && a.cuts == b.cuts
}

pub fn group_bars(bars: &[Bar]) -> Vec<BarGroup> {
    let mut out: Vec<BarGroup> = Vec::new();
    let mut next_no = 1;

    for bar in bars {
        let rep = bar.repeat_count.max(1);
        match out.last_mut() {
            Some(last) if same_pattern(&last.bar, bar) => {
                last.count += rep;
                last.end_no += rep;
            }
            _ => out.push(BarGroup {
                bar: bar.clone(),
                count: rep,
                start_no: next_no,
                end_no: next_no + rep - 1,
            }),
        }
        next_no += rep;
    }

    out
}

pub fn group_placements(placements: &[Placement]) -> Vec<PlacementGroup> {
    let mut out: Vec<PlacementGroup> = Vec::new();
    let mut next_no = 1;

    for pl in placements {
        match out.last_mut() {
            Some(last)
                if last.placement.source == pl.source
                    && last.placement.sheet == pl.sheet
                    && last.placement.layout == pl.layout
                    && last.placement.made == pl.made =>
            {
                last.count += 1;
                last.end_no += 1;
            }
            _ => out.push(PlacementGroup {
                placement: pl.clone(),
                count: 1,
                start_no: next_no,
                end_no: next_no,
            }),
        }
        next_no += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Layout, Orientation, PartCount, Rect, SheetRef, SourceType};

    fn bar(cuts: &[u32], repeat_count: u32) -> Bar {
        let sum: u32 = cuts.iter().sum();
        Bar {
            stock_length: 6000,
            source: SourceType::Stock,
            cuts: cuts.to_vec(),
            remainder: 6000 - sum,
            kerf_total: 0,
            repeat_count,
        }
    }

    fn grid(made: u32) -> Placement {
        Placement {
            source: SourceType::Stock,
            sheet: SheetRef {
                id: Some("3x6".to_string()),
                name: "3x6".to_string(),
                width: 914,
                height: 1829,
            },
            layout: Layout::Grid {
                orientation: Orientation::B,
                nx: 3,
                ny: 3,
                part_width: 300,
                part_height: 500,
            },
            made,
            parts_summary: vec![PartCount {
                label: "500x300".to_string(),
                qty: made,
            }],
        }
    }

    #[test]
    fn test_group_bars_numbers_repeats() {
        let bars = vec![
            bar(&[2000, 2000, 2000], 2),
            bar(&[2000, 2000, 2000], 1),
            bar(&[1000], 1),
            bar(&[2000, 2000, 2000], 1),
        ];
        let groups = group_bars(&bars);
        assert_eq!(groups.len(), 3);
        assert_eq!((groups[0].start_no, groups[0].end_no, groups[0].count), (1, 3, 3));
        assert_eq!((groups[1].start_no, groups[1].end_no, groups[1].count), (4, 4, 1));
        assert_eq!((groups[2].start_no, groups[2].end_no, groups[2].count), (5, 5, 1));
    }

    #[test]
    fn test_group_placements() {
        let mut remnant = grid(9);
        remnant.source = SourceType::Remnant;
        remnant.sheet = SheetRef::remnant(Rect::new(914, 1829));

        let groups = group_placements(&[grid(9), grid(9), grid(1), remnant]);
        assert_eq!(groups.len(), 3);
        assert_eq!((groups[0].start_no, groups[0].end_no), (1, 2));
        assert_eq!(groups[1].placement.made, 1);
        assert_eq!((groups[2].start_no, groups[2].end_no), (4, 4));
    }

    #[test]
    fn test_group_empty() {
        assert!(group_bars(&[]).is_empty());
        assert!(group_placements(&[]).is_empty());
    }
}
