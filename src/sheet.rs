use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{expand_sheet_remnants, normalize_stock_sheets};
use crate::demand::PieceBuffer;
use crate::error::{PlanError, Result};
use crate::options::SheetOptions;
use crate::score::BestPick;
use crate::shelf::{SheetPiece, ShelfBin};
use crate::types::{
    Layout, Orientation, PartCount, Placement, Rect, Rectangle, RemnantSheet, SheetRef,
    SourceType, StockSheet,
};

pub struct SheetSolver {
    stock: Vec<StockSheet>,
    remnants: Vec<RemnantSheet>,
    options: SheetOptions,
}

/// A successful 2D solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetPlan {
    pub placements: Vec<Placement>,
    pub summary: SheetSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSummary {
    pub need_total: u32,
    pub made_total: u32,
    pub used_remnants_count: usize,
    pub used_remnants: Vec<Rect>,
    pub purchased_sheets_count: u32,
    /// Purchased sheets per stock id.
    pub by_stock: BTreeMap<String, u32>,
    pub mixed_mode: bool,
    pub ignore_direction: bool,
    pub force_direction: Option<Orientation>,
}

impl SheetSummary {
    pub fn from_placements(
        need_total: u32,
        options: &SheetOptions,
        placements: &[Placement],
    ) -> Self {
        let mut used_remnants = Vec::new();
        let mut by_stock = BTreeMap::new();
        let mut purchased_sheets_count = 0;

        for pl in placements {
            match pl.source {
                SourceType::Remnant => used_remnants.push(pl.sheet.rect()),
                SourceType::Stock => {
                    purchased_sheets_count += 1;
                    let id = pl.sheet.id.clone().unwrap_or_else(|| pl.sheet.name.clone());
                    *by_stock.entry(id).or_insert(0) += 1;
                }
            }
        }

        SheetSummary {
            need_total,
            made_total: placements.iter().map(|p| p.made).sum(),
            used_remnants_count: used_remnants.len(),
            used_remnants,
            purchased_sheets_count,
            by_stock,
            mixed_mode: options.mixed_mode,
            ignore_direction: options.ignore_direction,
            force_direction: options.force_direction,
        }
    }
}

/// Grid capacity of one rectangle type on one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridFit {
    pub orientation: Orientation,
    pub nx: u32,
    pub ny: u32,
    /// The rectangle as laid on the sheet.
    pub part: Rect,
}

impl GridFit {
    pub fn new(sheet: Rect, rect: Rect, orientation: Orientation) -> Self {
        let part = orientation.apply(rect);
        Self {
            orientation,
            nx: sheet.w / part.w,
            ny: sheet.h / part.h,
            part,
        }
    }

    pub fn count(&self) -> u32 {
        self.nx.saturating_mul(self.ny)
    }
}

/// Grid orientation for one rectangle type: the larger count (B only when
/// strictly larger) unless a forced direction applies. Row mesh directions
/// play no part here; they only restrict shelf packing.
pub fn best_grid(sheet: Rect, rect: Rect, options: &SheetOptions) -> Option<GridFit> {
    let a = GridFit::new(sheet, rect, Orientation::A);
    let b = GridFit::new(sheet, rect, Orientation::B);
    let fit = match options.force_direction {
        Some(Orientation::A) if !options.ignore_direction => a,
        Some(Orientation::B) if !options.ignore_direction => b,
        _ if b.count() > a.count() => b,
        _ => a,
    };
    (fit.count() > 0).then_some(fit)
}

/// Whether one `row` piece can go on an empty `sheet` under the rules of the
/// active mode.
fn fits_sheet(sheet: Rect, row: &Rectangle, options: &SheetOptions) -> bool {
    if !options.mixed_mode {
        return best_grid(sheet, row.rect(), options).is_some();
    }
    [Orientation::A, Orientation::B].into_iter().any(|o| {
        options.allows(row.mesh_direction, o) && o.apply(row.rect()).fits_in(&sheet)
    })
}

#[derive(Debug, Clone)]
struct WorkRow {
    row: Rectangle,
    label: String,
    remaining: u32,
}

#[derive(Debug, Clone, Copy)]
struct RowPick {
    row_idx: usize,
    fit: GridFit,
    made: u32,
}

impl RowPick {
    fn used_area(&self) -> u64 {
        self.made as u64 * self.fit.part.area()
    }
}

/// Row that yields the most pieces from one sheet, then the most area,
/// then the largest part.
fn pick_row(sheet: Rect, rows: &[WorkRow], options: &SheetOptions) -> Option<RowPick> {
    let mut best = BestPick::new();
    for (row_idx, w) in rows.iter().enumerate() {
        if w.remaining == 0 {
            continue;
        }
        let Some(fit) = best_grid(sheet, w.row.rect(), options) else {
            continue;
        };
        let pick = RowPick {
            row_idx,
            fit,
            made: w.remaining.min(fit.count()),
        };
        best.offer((pick.made, pick.used_area(), fit.part.area()), pick);
    }
    best.into_inner()
}

impl SheetSolver {
    pub fn new(stock: Vec<StockSheet>, remnants: Vec<RemnantSheet>, options: SheetOptions) -> Self {
        Self {
            stock,
            remnants,
            options,
        }
    }

    pub fn solve(&self, demand: &[Rectangle]) -> Result<SheetPlan> {
        let result = self.plan(demand);
        match &result {
            Ok(plan) => tracing::info!(
                sheets = plan.placements.len(),
                purchased = plan.summary.purchased_sheets_count,
                remnants = plan.summary.used_remnants_count,
                made = plan.summary.made_total,
                "sheet plan solved"
            ),
            Err(e) => tracing::warn!(error = %e, "sheet plan failed"),
        }
        result
    }

    fn plan(&self, demand: &[Rectangle]) -> Result<SheetPlan> {
        let stock = self.validate(demand)?;
        let remnants = expand_sheet_remnants(&self.remnants);

        let placements = if self.options.mixed_mode {
            self.solve_mixed(demand, &stock, &remnants)?
        } else {
            self.solve_grid(demand, &stock, &remnants)?
        };

        let need_total = demand.iter().map(|r| r.quantity).sum();
        let summary = SheetSummary::from_placements(need_total, &self.options, &placements);
        Ok(SheetPlan {
            placements,
            summary,
        })
    }

    /// Checks inputs and returns the stock sheets, smallest area first.
    fn validate(&self, demand: &[Rectangle]) -> Result<Vec<StockSheet>> {
        if demand.is_empty() {
            return Err(PlanError::InvalidInput(
                "enter the required width, height and quantity".to_string(),
            ));
        }
        if self.stock.is_empty() {
            return Err(PlanError::InvalidInput(
                "the stock sheet list is empty".to_string(),
            ));
        }
        for r in demand {
            if r.width == 0 || r.height == 0 || r.quantity == 0 {
                return Err(PlanError::InvalidInput(format!(
                    "rectangle {}x{} x {} must have positive dimensions and quantity",
                    r.width, r.height, r.quantity
                )));
            }
        }
        for s in &self.stock {
            if s.width == 0 || s.height == 0 {
                return Err(PlanError::InvalidInput(format!(
                    "stock sheet '{}' has a zero dimension",
                    s.name
                )));
            }
        }
        for r in &self.remnants {
            if r.width == 0 || r.height == 0 || r.quantity == 0 {
                return Err(PlanError::InvalidInput(format!(
                    "remnant {}x{} x {} must have positive dimensions and quantity",
                    r.width, r.height, r.quantity
                )));
            }
        }

        let stock = normalize_stock_sheets(&self.stock);
        let sheets: Vec<Rect> = stock
            .iter()
            .map(StockSheet::rect)
            .chain(self.remnants.iter().map(|r| Rect::new(r.width, r.height)))
            .collect();
        for r in demand {
            if !sheets.iter().any(|&s| fits_sheet(s, r, &self.options)) {
                return Err(PlanError::Infeasible(format!(
                    "rectangle {}x{} does not fit any stock sheet or remnant in an allowed orientation",
                    r.width, r.height
                )));
            }
        }

        Ok(stock)
    }

    fn solve_grid(
        &self,
        demand: &[Rectangle],
        stock: &[StockSheet],
        remnants: &[Rect],
    ) -> Result<Vec<Placement>> {
        let mut rows: Vec<WorkRow> = demand
            .iter()
            .map(|r| WorkRow {
                label: r.display_label(),
                remaining: r.quantity,
                row: r.clone(),
            })
            .collect();
        rows.sort_by_key(|w| Reverse(w.row.rect().area()));

        let mut placements = Vec::new();

        for &rem in remnants {
            if rows.iter().all(|w| w.remaining == 0) {
                break;
            }
            let Some(pick) = pick_row(rem, &rows, &self.options) else {
                continue;
            };
            let sheet = SheetRef::remnant(rem);
            placements.push(self.commit_grid(&mut rows, pick, SourceType::Remnant, sheet));
        }

        while rows.iter().any(|w| w.remaining > 0) {
            let mut best = BestPick::new();
            for st in stock {
                let Some(pick) = pick_row(st.rect(), &rows, &self.options) else {
                    continue;
                };
                best.offer(
                    (pick.made, pick.used_area(), Reverse(st.rect().area())),
                    (st, pick),
                );
            }

            let Some((st, pick)) = best.into_inner() else {
                return Err(self.no_stock_fits(
                    rows.iter().filter(|w| w.remaining > 0).map(|w| w.row.rect()),
                ));
            };
            if pick.made == 0 {
                return Err(PlanError::Internal(format!(
                    "sheet {} was chosen for zero pieces",
                    st.name
                )));
            }
            let sheet = SheetRef::stock(st);
            placements.push(self.commit_grid(&mut rows, pick, SourceType::Stock, sheet));
        }

        Ok(placements)
    }

    fn commit_grid(
        &self,
        rows: &mut [WorkRow],
        pick: RowPick,
        source: SourceType,
        sheet: SheetRef,
    ) -> Placement {
        let w = &mut rows[pick.row_idx];
        w.remaining -= pick.made;
        tracing::debug!(
            sheet = %sheet.rect(),
            source = ?source,
            orientation = %pick.fit.orientation,
            made = pick.made,
            "committed grid sheet"
        );
        Placement {
            source,
            sheet,
            layout: Layout::Grid {
                orientation: pick.fit.orientation,
                nx: pick.fit.nx,
                ny: pick.fit.ny,
                part_width: pick.fit.part.w,
                part_height: pick.fit.part.h,
            },
            made: pick.made,
            parts_summary: vec![PartCount {
                label: w.label.clone(),
                qty: pick.made,
            }],
        }
    }

    fn solve_mixed(
        &self,
        demand: &[Rectangle],
        stock: &[StockSheet],
        remnants: &[Rect],
    ) -> Result<Vec<Placement>> {
        let mut expanded: Vec<SheetPiece> = demand
            .iter()
            .flat_map(|r| {
                let piece = SheetPiece {
                    rect: r.rect(),
                    label: r.display_label(),
                    mesh: r.mesh_direction,
                };
                std::iter::repeat_n(piece, r.quantity as usize)
            })
            .collect();
        expanded.sort_by_key(|p| Reverse(p.rect.area()));
        let mut pieces = PieceBuffer::new(expanded);

        let mut placements = Vec::new();

        for &rem in remnants {
            if pieces.is_empty() {
                break;
            }
            let bin = ShelfBin::pack(rem, &pieces, &self.options);
            if bin.picked.is_empty() {
                continue;
            }
            pieces.take_all(&bin.picked);
            placements.push(mixed_placement(bin, SourceType::Remnant, SheetRef::remnant(rem)));
        }

        while !pieces.is_empty() {
            let mut best = BestPick::new();
            for st in stock {
                let bin = ShelfBin::pack(st.rect(), &pieces, &self.options);
                if bin.picked.is_empty() {
                    continue;
                }
                best.offer(
                    (bin.made(), bin.used_area(), Reverse(st.rect().area())),
                    (st, bin),
                );
            }

            let Some((st, bin)) = best.into_inner() else {
                return Err(self.no_stock_fits(pieces.remaining().map(|p| p.rect)));
            };
            let before = pieces.len();
            pieces.take_all(&bin.picked);
            if pieces.len() == before {
                return Err(PlanError::Internal(format!(
                    "sheet {} placed no pieces",
                    st.name
                )));
            }
            placements.push(mixed_placement(bin, SourceType::Stock, SheetRef::stock(st)));
        }

        Ok(placements)
    }

    /// Failure naming the largest rectangle still waiting.
    fn no_stock_fits(&self, remaining: impl Iterator<Item = Rect>) -> PlanError {
        let largest = remaining.fold(None, |acc: Option<Rect>, r| match acc {
            Some(a) if a.area() >= r.area() => Some(a),
            _ => Some(r),
        });
        match largest {
            Some(r) => PlanError::Infeasible(format!(
                "no stock sheet can cut the remaining {r} rectangle"
            )),
            None => PlanError::Internal("no stock sheet chosen with nothing left".to_string()),
        }
    }
}

fn mixed_placement(bin: ShelfBin, source: SourceType, sheet: SheetRef) -> Placement {
    let parts_summary = parts_summary(&bin);
    tracing::debug!(
        sheet = %sheet.rect(),
        source = ?source,
        made = bin.made(),
        "committed mixed sheet"
    );
    Placement {
        source,
        sheet,
        made: bin.made(),
        layout: Layout::Mixed {
            rects: bin.placements,
        },
        parts_summary,
    }
}

/// Label counts, most numerous first.
fn parts_summary(bin: &ShelfBin) -> Vec<PartCount> {
    let mut out: Vec<PartCount> = Vec::new();
    for p in &bin.placements {
        match out.iter_mut().find(|c| c.label == p.label) {
            Some(c) => c.qty += 1,
            None => out.push(PartCount {
                label: p.label.clone(),
                qty: 1,
            }),
        }
    }
    out.sort_by_key(|c| Reverse(c.qty));
    out
}

/// Quick per-stock estimate for a single rectangle type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateEstimate {
    pub stock: String,
    pub sheet: Rect,
    pub per_sheet: u32,
    pub sheets_needed: u32,
    /// `None` when the direction was left free.
    pub direction: Option<Orientation>,
}

/// Sheets of each stock size needed for `qty` pieces of `size`, fewest
/// sheets first.
pub fn estimate_plates(
    stocks: &[StockSheet],
    size: Rect,
    qty: u32,
    ignore_direction: bool,
) -> Vec<PlateEstimate> {
    if size.w == 0 || size.h == 0 {
        return Vec::new();
    }
    let options = SheetOptions {
        ignore_direction,
        ..Default::default()
    };
    let mut out: Vec<PlateEstimate> = stocks
        .iter()
        .filter_map(|st| {
            let fit = best_grid(st.rect(), size, &options)?;
            let per_sheet = fit.count();
            Some(PlateEstimate {
                stock: st.name.clone(),
                sheet: st.rect(),
                per_sheet,
                sheets_needed: qty.div_ceil(per_sheet),
                direction: (!ignore_direction).then_some(fit.orientation),
            })
        })
        .collect();
    out.sort_by_key(|e| e.sheets_needed);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_stock_sheets;
    use crate::types::MeshDirection;

    fn grid_opts() -> SheetOptions {
        SheetOptions::default()
    }

    fn mixed_opts() -> SheetOptions {
        SheetOptions {
            mixed_mode: true,
            ..Default::default()
        }
    }

    fn made_per_label(plan: &SheetPlan) -> BTreeMap<String, u32> {
        let mut out = BTreeMap::new();
        for pl in &plan.placements {
            for c in &pl.parts_summary {
                *out.entry(c.label.clone()).or_insert(0) += c.qty;
            }
        }
        out
    }

    /// Validates a complete plan:
    /// 1. Grids stay inside their sheet; mixed rects stay inside and apart
    /// 2. `made` agrees with the layout
    /// 3. Every label is produced exactly as often as requested
    fn assert_plan_valid(plan: &SheetPlan, demand: &[Rectangle]) {
        for (si, pl) in plan.placements.iter().enumerate() {
            let sheet = pl.sheet.rect();
            match &pl.layout {
                Layout::Grid {
                    nx,
                    ny,
                    part_width,
                    part_height,
                    ..
                } => {
                    assert!(nx * part_width <= sheet.w, "sheet {si}: grid too wide");
                    assert!(ny * part_height <= sheet.h, "sheet {si}: grid too tall");
                    assert!(pl.made <= nx * ny, "sheet {si}: made exceeds grid");
                }
                Layout::Mixed { rects } => {
                    assert_eq!(rects.len() as u32, pl.made, "sheet {si}");
                    for (i, a) in rects.iter().enumerate() {
                        assert!(a.x + a.w <= sheet.w && a.y + a.h <= sheet.h);
                        for b in rects.iter().skip(i + 1) {
                            let overlaps = a.x < b.x + b.w
                                && b.x < a.x + a.w
                                && a.y < b.y + b.h
                                && b.y < a.y + a.h;
                            assert!(!overlaps, "sheet {si}: {a:?} overlaps {b:?}");
                        }
                    }
                }
            }
        }

        let mut requested = BTreeMap::new();
        for r in demand {
            *requested.entry(r.display_label()).or_insert(0) += r.quantity;
        }
        assert_eq!(made_per_label(plan), requested);
        assert_eq!(plan.summary.made_total, plan.summary.need_total);
    }

    #[test]
    fn test_grid_picks_larger_orientation() {
        let demand = [Rectangle::new(500, 300, 10)];
        let solver = SheetSolver::new(
            vec![StockSheet::new("3x6", 914, 1829)],
            vec![],
            grid_opts(),
        );
        let plan = solver.solve(&demand).unwrap();
        assert_plan_valid(&plan, &demand);
        assert_eq!(plan.placements.len(), 2);
        match &plan.placements[0].layout {
            Layout::Grid {
                orientation,
                nx,
                ny,
                ..
            } => {
                assert_eq!(*orientation, Orientation::B);
                assert_eq!((*nx, *ny), (3, 3));
            }
            other => panic!("expected grid, got {other:?}"),
        }
        assert_eq!(plan.placements[0].made, 9);
        assert_eq!(plan.placements[1].made, 1);
        assert_eq!(plan.summary.by_stock.get("3x6"), Some(&2));
    }

    #[test]
    fn test_force_direction_overrides_best() {
        let demand = [Rectangle::new(500, 300, 6)];
        let opts = SheetOptions {
            force_direction: Some(Orientation::A),
            ..Default::default()
        };
        let solver = SheetSolver::new(vec![StockSheet::new("3x6", 914, 1829)], vec![], opts);
        let plan = solver.solve(&demand).unwrap();
        assert_plan_valid(&plan, &demand);
        assert_eq!(plan.placements.len(), 1);
        assert!(matches!(
            plan.placements[0].layout,
            Layout::Grid {
                orientation: Orientation::A,
                nx: 1,
                ny: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_grid_ignores_row_mesh() {
        // Mesh A would force 2x7; the grid takes the larger B layout.
        let demand = [Rectangle::new(342, 249, 3).with_mesh(MeshDirection::A)];
        let solver = SheetSolver::new(
            vec![StockSheet::new("3x6", 914, 1829)],
            vec![],
            grid_opts(),
        );
        let plan = solver.solve(&demand).unwrap();
        assert_plan_valid(&plan, &demand);
        assert!(matches!(
            plan.placements[0].layout,
            Layout::Grid {
                orientation: Orientation::B,
                nx: 3,
                ny: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_grid_force_direction_beats_row_mesh() {
        let demand = [
            Rectangle::new(500, 300, 6).with_mesh(MeshDirection::B),
            Rectangle::new(339, 148, 5).with_mesh(MeshDirection::A),
        ];
        let opts = SheetOptions {
            force_direction: Some(Orientation::A),
            ..Default::default()
        };
        let solver = SheetSolver::new(vec![StockSheet::new("3x6", 914, 1829)], vec![], opts);
        let plan = solver.solve(&demand).unwrap();
        assert_plan_valid(&plan, &demand);
        for pl in &plan.placements {
            match &pl.layout {
                Layout::Grid { orientation, .. } => assert_eq!(*orientation, Orientation::A),
                other => panic!("expected grid, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_grid_prefers_smaller_sheet_on_tie() {
        let demand = [Rectangle::new(900, 900, 1)];
        let solver = SheetSolver::new(default_stock_sheets(), vec![], grid_opts());
        let plan = solver.solve(&demand).unwrap();
        assert_eq!(plan.placements[0].sheet.id.as_deref(), Some("3x6"));
    }

    #[test]
    fn test_grid_uses_remnants_before_purchase() {
        let demand = [Rectangle::new(400, 400, 5)];
        let solver = SheetSolver::new(
            vec![StockSheet::new("3x6", 914, 1829)],
            vec![RemnantSheet::new(800, 800, 1)],
            grid_opts(),
        );
        let plan = solver.solve(&demand).unwrap();
        assert_plan_valid(&plan, &demand);
        assert_eq!(plan.placements[0].source, SourceType::Remnant);
        assert_eq!(plan.placements[0].made, 4);
        assert_eq!(plan.summary.used_remnants, vec![Rect::new(800, 800)]);
        assert_eq!(plan.summary.purchased_sheets_count, 1);
    }

    #[test]
    fn test_grid_unusable_remnant_skipped() {
        let demand = [Rectangle::new(400, 400, 1)];
        let solver = SheetSolver::new(
            vec![StockSheet::new("3x6", 914, 1829)],
            vec![RemnantSheet::new(300, 300, 2)],
            grid_opts(),
        );
        let plan = solver.solve(&demand).unwrap();
        assert_eq!(plan.summary.used_remnants_count, 0);
        assert_eq!(plan.summary.purchased_sheets_count, 1);
    }

    #[test]
    fn test_grid_mixed_rows_each_own_sheet() {
        let demand = [
            Rectangle::new(900, 900, 1).with_label("big"),
            Rectangle::new(100, 100, 3).with_label("small"),
        ];
        let solver = SheetSolver::new(
            vec![StockSheet::new("3x6", 914, 1829)],
            vec![],
            grid_opts(),
        );
        let plan = solver.solve(&demand).unwrap();
        assert_plan_valid(&plan, &demand);
        assert_eq!(plan.placements.len(), 2);
        assert_eq!(plan.placements[0].parts_summary[0].label, "small");
    }

    #[test]
    fn test_mixed_shares_sheet() {
        let demand = [
            Rectangle::new(900, 900, 1).with_label("big"),
            Rectangle::new(100, 100, 3).with_label("small"),
        ];
        let solver = SheetSolver::new(
            vec![StockSheet::new("3x6", 914, 1829)],
            vec![],
            mixed_opts(),
        );
        let plan = solver.solve(&demand).unwrap();
        assert_plan_valid(&plan, &demand);
        assert_eq!(plan.placements.len(), 1);
        assert_eq!(plan.placements[0].made, 4);
        assert_eq!(
            plan.placements[0].parts_summary,
            vec![
                PartCount {
                    label: "small".to_string(),
                    qty: 3
                },
                PartCount {
                    label: "big".to_string(),
                    qty: 1
                },
            ]
        );
    }

    #[test]
    fn test_mixed_respects_mesh_rows() {
        // A-only 1000x500 cannot go on a 600x1200 sheet; B-only can.
        let demand = [
            Rectangle::new(1000, 500, 1)
                .with_mesh(MeshDirection::B)
                .with_label("b-only"),
        ];
        let solver = SheetSolver::new(
            vec![StockSheet::new("tall", 600, 1200)],
            vec![],
            mixed_opts(),
        );
        let plan = solver.solve(&demand).unwrap();
        match &plan.placements[0].layout {
            Layout::Mixed { rects } => assert_eq!((rects[0].w, rects[0].h), (500, 1000)),
            other => panic!("expected mixed, got {other:?}"),
        }

        let demand = [Rectangle::new(1000, 500, 1).with_mesh(MeshDirection::A)];
        let err = solver.solve(&demand).unwrap_err();
        assert!(matches!(err, PlanError::Infeasible(_)));
        assert!(err.to_string().contains("1000x500"));
    }

    #[test]
    fn test_mixed_force_direction() {
        let opts = SheetOptions {
            force_direction: Some(Orientation::B),
            mixed_mode: true,
            ..Default::default()
        };
        let solver = SheetSolver::new(vec![StockSheet::new("sq", 600, 600)], vec![], opts);

        let demand = [Rectangle::new(500, 300, 1)];
        let plan = solver.solve(&demand).unwrap();
        match &plan.placements[0].layout {
            Layout::Mixed { rects } => assert_eq!((rects[0].w, rects[0].h), (300, 500)),
            other => panic!("expected mixed, got {other:?}"),
        }

        // Forced B and mesh A leave no orientation for shelf packing.
        let demand = [Rectangle::new(500, 300, 1).with_mesh(MeshDirection::A)];
        let err = solver.solve(&demand).unwrap_err();
        assert!(matches!(err, PlanError::Infeasible(_)));
    }

    #[test]
    fn test_mixed_remnant_only_fit_runs_out() {
        let demand = [Rectangle::new(1000, 1000, 2)];
        let solver = SheetSolver::new(
            vec![StockSheet::new("3x6", 914, 1829)],
            vec![RemnantSheet::new(1000, 1000, 1)],
            mixed_opts(),
        );
        let err = solver.solve(&demand).unwrap_err();
        assert!(matches!(err, PlanError::Infeasible(_)));
        assert!(err.to_string().contains("remaining 1000x1000"));
    }

    #[test]
    fn test_oversized_rectangle_named() {
        let demand = [Rectangle::new(2000, 2000, 1)];
        let solver = SheetSolver::new(default_stock_sheets(), vec![], grid_opts());
        let err = solver.solve(&demand).unwrap_err();
        assert!(matches!(err, PlanError::Infeasible(_)));
        assert!(err.to_string().contains("2000x2000"));
    }

    #[test]
    fn test_remnant_only_fit_runs_out() {
        // Only the remnant is big enough, and there is just one.
        let demand = [Rectangle::new(1000, 1000, 2)];
        let solver = SheetSolver::new(
            vec![StockSheet::new("3x6", 914, 1829)],
            vec![RemnantSheet::new(1000, 1000, 1)],
            grid_opts(),
        );
        let err = solver.solve(&demand).unwrap_err();
        assert!(err.to_string().contains("1000x1000"));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let solver = SheetSolver::new(default_stock_sheets(), vec![], grid_opts());
        assert!(matches!(
            solver.solve(&[]),
            Err(PlanError::InvalidInput(_))
        ));
        let solver = SheetSolver::new(vec![], vec![], grid_opts());
        assert!(matches!(
            solver.solve(&[Rectangle::new(10, 10, 1)]),
            Err(PlanError::InvalidInput(_))
        ));
        let solver = SheetSolver::new(default_stock_sheets(), vec![], grid_opts());
        assert!(matches!(
            solver.solve(&[Rectangle::new(0, 10, 1)]),
            Err(PlanError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_best_grid_tie_keeps_a() {
        let fit = best_grid(Rect::new(1000, 1000), Rect::new(500, 250), &grid_opts()).unwrap();
        assert_eq!(fit.orientation, Orientation::A);
        assert_eq!(fit.count(), 8);
    }

    #[test]
    fn test_estimate_plates() {
        let est = estimate_plates(&default_stock_sheets(), Rect::new(500, 300), 10, false);
        assert_eq!(est.len(), 3);
        assert_eq!(est[0].stock, "4x8");
        assert_eq!(est[0].per_sheet, 16);
        assert_eq!(est[0].sheets_needed, 1);
        let three_by_six = est.iter().find(|e| e.stock == "3x6").unwrap();
        assert_eq!(three_by_six.per_sheet, 9);
        assert_eq!(three_by_six.sheets_needed, 2);
        assert_eq!(three_by_six.direction, Some(Orientation::B));

        let free = estimate_plates(&default_stock_sheets(), Rect::new(500, 300), 10, true);
        assert!(free.iter().all(|e| e.direction.is_none()));
    }
}
