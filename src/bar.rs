use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{expand_bar_remnants, normalize_stock_lengths};
use crate::demand::{PieceBuffer, PieceCounts, expand_lengths};
use crate::error::{PlanError, Result};
use crate::fill::{BarFill, fill_bar, fits};
use crate::options::{BarOptions, OptimizeMode};
use crate::score::BestPick;
use crate::types::{Bar, Piece, RemnantBar, SourceType, StockLength};

pub struct BarSolver {
    stock: Vec<StockLength>,
    remnants: Vec<RemnantBar>,
    options: BarOptions,
}

/// A successful 1D solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPlan {
    pub bars: Vec<Bar>,
    pub summary: BarSummary,
}

/// Totals over a bar list; every field derives from the bars alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSummary {
    pub kerf_mm: u32,
    pub stacking_mode: bool,
    /// Yield scoring that ran; absent for stacking, which does not score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize_mode: Option<OptimizeMode>,
    pub purchased_bars_count: u32,
    pub by_stock_length: BTreeMap<u32, u32>,
    pub used_remnants_count: usize,
    pub used_remnants: Vec<u32>,
    pub total_gross: u64,
    pub total_used: u64,
    pub total_leftover: u64,
    pub total_kerf: u64,
    pub yield_pct: f64,
}

impl BarSummary {
    pub fn from_bars(options: &BarOptions, bars: &[Bar]) -> Self {
        let mut summary = BarSummary {
            kerf_mm: options.kerf_mm,
            stacking_mode: options.stacking_mode,
            optimize_mode: (!options.stacking_mode).then_some(options.optimize_mode),
            purchased_bars_count: 0,
            by_stock_length: BTreeMap::new(),
            used_remnants_count: 0,
            used_remnants: Vec::new(),
            total_gross: 0,
            total_used: 0,
            total_leftover: 0,
            total_kerf: 0,
            yield_pct: 0.0,
        };

        for bar in bars {
            let rep = bar.repeat_count as u64;
            summary.total_gross += bar.stock_length as u64 * rep;
            summary.total_used += bar.used() as u64 * rep;
            summary.total_leftover += bar.remainder as u64 * rep;
            summary.total_kerf += bar.kerf_total as u64 * rep;

            match bar.source {
                SourceType::Stock => {
                    summary.purchased_bars_count += bar.repeat_count;
                    *summary.by_stock_length.entry(bar.stock_length).or_insert(0) +=
                        bar.repeat_count;
                }
                SourceType::Remnant => {
                    for _ in 0..bar.repeat_count {
                        summary.used_remnants.push(bar.stock_length);
                    }
                }
            }
        }

        summary.used_remnants_count = summary.used_remnants.len();
        if summary.total_gross > 0 {
            summary.yield_pct = summary.total_used as f64 / summary.total_gross as f64 * 100.0;
        }
        summary
    }
}

/// Candidate score for yield mode, compared field by field.
///
/// `global` leaves `remnant_first` false everywhere and ranks by the
/// lookahead; `greedy` has no lookahead, so a remnant leads outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct YieldScore {
    remnant_first: bool,
    lookahead: Reverse<u64>,
    remainder: Reverse<u32>,
    cuts: usize,
    length: Reverse<u32>,
    remnant: bool,
}

#[derive(Debug, Clone, Copy)]
enum Candidate {
    /// Index into the live remnant pool.
    Remnant(usize, u32),
    Stock(u32),
}

impl Candidate {
    fn length(self) -> u32 {
        match self {
            Candidate::Remnant(_, len) | Candidate::Stock(len) => len,
        }
    }

    fn source(self) -> SourceType {
        match self {
            Candidate::Remnant(..) => SourceType::Remnant,
            Candidate::Stock(_) => SourceType::Stock,
        }
    }
}

/// A stacking pattern: one bar's cuts plus how many of each length it uses.
#[derive(Debug, Clone)]
struct Pattern {
    stock_length: u32,
    cuts: Vec<u32>,
    need: PieceCounts,
    remainder: u32,
    kerf_total: u32,
}

impl Pattern {
    fn into_bar(self, repeat_count: u32) -> Bar {
        Bar {
            stock_length: self.stock_length,
            source: SourceType::Stock,
            cuts: self.cuts,
            remainder: self.remainder,
            kerf_total: self.kerf_total,
            repeat_count,
        }
    }
}

impl BarSolver {
    pub fn new(stock: Vec<StockLength>, remnants: Vec<RemnantBar>, options: BarOptions) -> Self {
        Self {
            stock,
            remnants,
            options,
        }
    }

    pub fn solve(&self, demand: &[Piece]) -> Result<BarPlan> {
        let result = self.plan(demand);
        match &result {
            Ok(plan) => tracing::info!(
                bars = plan.bars.len(),
                purchased = plan.summary.purchased_bars_count,
                remnants = plan.summary.used_remnants_count,
                yield_pct = plan.summary.yield_pct,
                "bar plan solved"
            ),
            Err(e) => tracing::warn!(error = %e, "bar plan failed"),
        }
        result
    }

    fn plan(&self, demand: &[Piece]) -> Result<BarPlan> {
        let stock = self.validate(demand)?;
        let remnants = expand_bar_remnants(&self.remnants);
        let pieces = PieceBuffer::new(expand_lengths(demand));

        let bars = if self.options.stacking_mode {
            self.solve_stacking(pieces, &stock, remnants)?
        } else {
            self.solve_yield(pieces, &stock, remnants)?
        };

        let summary = BarSummary::from_bars(&self.options, &bars);
        Ok(BarPlan { bars, summary })
    }

    /// Checks inputs and returns the stock lengths in ascending order.
    fn validate(&self, demand: &[Piece]) -> Result<Vec<u32>> {
        if demand.is_empty() {
            return Err(PlanError::InvalidInput(
                "enter the required lengths and quantities".to_string(),
            ));
        }
        if self.stock.is_empty() {
            return Err(PlanError::InvalidInput(
                "the stock length list is empty".to_string(),
            ));
        }
        for p in demand {
            if p.length == 0 || p.quantity == 0 {
                return Err(PlanError::InvalidInput(format!(
                    "piece {} mm x {} must have a positive length and quantity",
                    p.length, p.quantity
                )));
            }
        }
        for s in &self.stock {
            if s.length == 0 {
                return Err(PlanError::InvalidInput(format!(
                    "stock '{}' has zero length",
                    s.name
                )));
            }
        }
        for r in &self.remnants {
            if r.length == 0 || r.quantity == 0 {
                return Err(PlanError::InvalidInput(format!(
                    "remnant {} mm x {} must have a positive length and quantity",
                    r.length, r.quantity
                )));
            }
        }

        let stock: Vec<u32> = normalize_stock_lengths(&self.stock)
            .iter()
            .map(|s| s.length)
            .collect();

        let kerf = self.options.kerf_mm;
        let max_stock = stock.last().copied().unwrap_or(0);
        let max_remnant = self.remnants.iter().map(|r| r.length).max().unwrap_or(0);
        let max_avail = max_stock.max(max_remnant);
        let longest = demand.iter().map(|p| p.length).max().unwrap_or(0);
        if !fits(max_avail, longest, kerf) {
            return Err(PlanError::Infeasible(format!(
                "piece {longest} mm plus {kerf} mm kerf needs {} mm, but the longest stock or remnant is {max_avail} mm",
                longest as u64 + kerf as u64
            )));
        }

        Ok(stock)
    }

    fn solve_yield(
        &self,
        mut pieces: PieceBuffer<u32>,
        stock: &[u32],
        mut remnants: Vec<u32>,
    ) -> Result<Vec<Bar>> {
        let kerf = self.options.kerf_mm;
        let mode = self.options.optimize_mode;
        let mut bars = Vec::new();

        while let Some(&longest) = pieces.first() {
            let candidates: Vec<Candidate> = remnants
                .iter()
                .enumerate()
                .filter(|&(_, &len)| fits(len, longest, kerf))
                .map(|(i, &len)| Candidate::Remnant(i, len))
                .chain(
                    stock
                        .iter()
                        .filter(|&&len| fits(len, longest, kerf))
                        .map(|&len| Candidate::Stock(len)),
                )
                .collect();

            if candidates.is_empty() {
                return Err(PlanError::Infeasible(format!(
                    "no stock or remnant left that holds a {longest} mm piece with {kerf} mm kerf"
                )));
            }

            let mut best = BestPick::new();
            for cand in candidates {
                let fill = fill_bar(cand.length(), &pieces, kerf);
                if fill.is_empty() {
                    continue;
                }
                let is_remnant = cand.source() == SourceType::Remnant;
                let score = match mode {
                    OptimizeMode::Global => {
                        let own = if is_remnant { 0 } else { cand.length() as u64 };
                        let mut rest = pieces.clone();
                        rest.take_all(&fill.picked);
                        YieldScore {
                            remnant_first: false,
                            lookahead: Reverse(own.saturating_add(estimate_purchase(
                                stock, rest, kerf,
                            ))),
                            remainder: Reverse(fill.remainder),
                            cuts: fill.cuts.len(),
                            length: Reverse(cand.length()),
                            remnant: is_remnant,
                        }
                    }
                    OptimizeMode::Greedy => YieldScore {
                        remnant_first: is_remnant,
                        lookahead: Reverse(0),
                        remainder: Reverse(fill.remainder),
                        cuts: fill.cuts.len(),
                        length: Reverse(cand.length()),
                        remnant: is_remnant,
                    },
                };
                best.offer(score, (cand, fill));
            }

            let Some((cand, fill)) = best.into_inner() else {
                return Err(PlanError::Internal(format!(
                    "no candidate bar took the {longest} mm piece"
                )));
            };

            if let Candidate::Remnant(idx, _) = cand {
                remnants.remove(idx);
            }
            pieces.take_all(&fill.picked);
            let bar = fill.into_bar(cand.source(), 1);
            tracing::debug!(
                stock_length = bar.stock_length,
                source = ?bar.source,
                cuts = bar.cuts.len(),
                remainder = bar.remainder,
                "committed bar"
            );
            bars.push(bar);
        }

        Ok(bars)
    }

    fn solve_stacking(
        &self,
        mut pieces: PieceBuffer<u32>,
        stock: &[u32],
        remnants: Vec<u32>,
    ) -> Result<Vec<Bar>> {
        let kerf = self.options.kerf_mm;
        let mut bars = Vec::new();

        // Remnants differ in length, so each one is filled on its own.
        for &len in &remnants {
            if pieces.is_empty() {
                break;
            }
            let fill: BarFill = fill_bar(len, &pieces, kerf);
            if fill.is_empty() {
                continue;
            }
            pieces.take_all(&fill.picked);
            bars.push(fill.into_bar(SourceType::Remnant, 1));
        }

        let mut counts = PieceCounts::from_lengths(pieces.remaining().copied());
        let Some(&fixed) = stock.last() else {
            return Err(PlanError::Internal("stock list emptied".to_string()));
        };

        while let Some(longest) = counts.longest() {
            let pattern = build_pattern(fixed, &counts, kerf);

            if pattern.cuts.is_empty() {
                let Some(&len) = stock.iter().find(|&&s| fits(s, longest, kerf)) else {
                    return Err(PlanError::Infeasible(format!(
                        "no stock length holds a {longest} mm piece with {kerf} mm kerf"
                    )));
                };
                let alt = build_pattern(len, &counts, kerf);
                if alt.cuts.is_empty() {
                    return Err(PlanError::Internal(format!(
                        "{len} mm stock produced an empty pattern"
                    )));
                }
                counts.subtract(&alt.need, 1);
                bars.push(alt.into_bar(1));
                continue;
            }

            let repeat = counts.max_repeat(&pattern.need);
            if repeat == 0 {
                return Err(PlanError::Internal(format!(
                    "pattern {:?} cannot be repeated",
                    pattern.cuts
                )));
            }
            counts.subtract(&pattern.need, repeat);
            tracing::debug!(
                stock_length = pattern.stock_length,
                cuts = pattern.cuts.len(),
                repeat,
                left = counts.total(),
                "committed pattern"
            );
            bars.push(pattern.into_bar(repeat));
        }

        Ok(bars)
    }
}

/// Total stock length bought to finish `rest` by repeatedly cutting the
/// smallest stock length that takes the longest piece. `u64::MAX` when the
/// stock list alone cannot finish.
fn estimate_purchase(stock: &[u32], mut rest: PieceBuffer<u32>, kerf: u32) -> u64 {
    let mut total = 0u64;
    while let Some(&longest) = rest.first() {
        let Some(&len) = stock.iter().find(|&&s| fits(s, longest, kerf)) else {
            return u64::MAX;
        };
        let fill = fill_bar(len, &rest, kerf);
        if fill.is_empty() {
            return u64::MAX;
        }
        total += len as u64;
        rest.take_all(&fill.picked);
    }
    total
}

/// Sweeps the lengths longest first, adding one of each that still fits and
/// is still in demand, until a sweep adds nothing.
fn build_pattern(stock_length: u32, counts: &PieceCounts, kerf: u32) -> Pattern {
    let lengths = counts.lengths_desc();
    let mut remaining = stock_length;
    let mut cuts = Vec::new();
    let mut need = PieceCounts::default();
    let mut kerf_total = 0;

    let mut progressed = true;
    while progressed && remaining > 0 {
        progressed = false;
        for &len in &lengths {
            if need.get(len) >= counts.get(len) || !fits(remaining, len, kerf) {
                continue;
            }
            cuts.push(len);
            need.add(len, 1);
            remaining -= len + kerf;
            kerf_total += kerf;
            progressed = true;
            if remaining == 0 {
                break;
            }
        }
    }

    Pattern {
        stock_length,
        cuts,
        need,
        remainder: remaining,
        kerf_total,
    }
}
