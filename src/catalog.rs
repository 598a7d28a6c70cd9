use std::cmp::Reverse;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Rect, RemnantBar, RemnantSheet, StockLength, StockSheet};

/// Steel section families with their usual mill lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    #[serde(rename = "FB")]
    FlatBar,
    #[serde(rename = "L")]
    Angle,
    #[serde(rename = "U")]
    Channel,
    #[serde(rename = "H")]
    HBeam,
    #[serde(rename = "SGP")]
    Pipe,
    #[serde(rename = "I")]
    IBeam,
    #[serde(rename = "SquarePipe")]
    SquarePipe,
}

impl SectionType {
    pub const ALL: [SectionType; 7] = [
        SectionType::FlatBar,
        SectionType::Angle,
        SectionType::Channel,
        SectionType::HBeam,
        SectionType::Pipe,
        SectionType::IBeam,
        SectionType::SquarePipe,
    ];

    pub fn default_lengths(self) -> &'static [u32] {
        match self {
            SectionType::FlatBar => &[5500, 6000],
            SectionType::HBeam | SectionType::SquarePipe => &[6000, 7000, 8000, 9000, 10000],
            SectionType::Angle | SectionType::Channel | SectionType::Pipe | SectionType::IBeam => {
                &[5500, 6000, 7000, 8000, 9000, 10000]
            }
        }
    }

    /// Looks a section up by its catalog code (`FB`, `L`, `U`, `H`, `SGP`,
    /// `I`, `SquarePipe`), ignoring case.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(code))
    }

    pub fn code(self) -> &'static str {
        match self {
            SectionType::FlatBar => "FB",
            SectionType::Angle => "L",
            SectionType::Channel => "U",
            SectionType::HBeam => "H",
            SectionType::Pipe => "SGP",
            SectionType::IBeam => "I",
            SectionType::SquarePipe => "SquarePipe",
        }
    }

    pub fn default_stock(self) -> Vec<StockLength> {
        self.default_lengths()
            .iter()
            .map(|&l| StockLength::new(l))
            .collect()
    }
}

/// 3x6, 4x8 and 5x10 plate.
pub fn default_stock_sheets() -> Vec<StockSheet> {
    vec![
        StockSheet::new("3x6", 914, 1829),
        StockSheet::new("4x8", 1219, 2438),
        StockSheet::new("5x10", 1524, 3048),
    ]
}

/// Drops repeated lengths (first wins) and sorts ascending.
pub fn normalize_stock_lengths(list: &[StockLength]) -> Vec<StockLength> {
    let mut seen = HashSet::new();
    let mut out: Vec<StockLength> = list
        .iter()
        .filter(|s| seen.insert(s.length))
        .cloned()
        .collect();
    out.sort_by_key(|s| s.length);
    out
}

/// Drops repeated ids (first wins) and sorts by area ascending.
pub fn normalize_stock_sheets(list: &[StockSheet]) -> Vec<StockSheet> {
    let mut seen = HashSet::new();
    let mut out: Vec<StockSheet> = list
        .iter()
        .filter(|s| seen.insert(s.id.clone()))
        .cloned()
        .collect();
    out.sort_by_key(|s| s.rect().area());
    out
}

/// One entry per physical remnant bar, longest first.
pub fn expand_bar_remnants(rows: &[RemnantBar]) -> Vec<u32> {
    let mut out: Vec<u32> = rows
        .iter()
        .flat_map(|r| std::iter::repeat_n(r.length, r.quantity as usize))
        .collect();
    out.sort_by_key(|&l| Reverse(l));
    out
}

/// One entry per physical remnant sheet, largest area first.
pub fn expand_sheet_remnants(rows: &[RemnantSheet]) -> Vec<Rect> {
    let mut out: Vec<Rect> = rows
        .iter()
        .flat_map(|r| std::iter::repeat_n(Rect::new(r.width, r.height), r.quantity as usize))
        .collect();
    out.sort_by_key(|r| Reverse(r.area()));
    out
}
