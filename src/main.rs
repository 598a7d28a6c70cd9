use clap::{Parser, Subcommand};
use cut_planner::catalog::{SectionType, default_stock_sheets};
use cut_planner::group::{group_bars, group_placements};
use cut_planner::sheet::estimate_plates;
use cut_planner::types::{
    Layout, MeshDirection, Orientation, Piece, Rect, Rectangle, RemnantBar, RemnantSheet,
    SourceType, StockLength, StockSheet,
};
use cut_planner::{BarOptions, BarSolver, OptimizeMode, Outcome, SheetOptions, SheetSolver};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "cut_planner",
    about = "Bar cutting and sheet nesting plans against stock and remnants"
)]
struct Cli {
    /// Log solver decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the plan as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cut pieces from stock bars
    Bars {
        /// Stock lengths in mm (e.g. 5500 6000)
        #[arg(long, num_args = 1.., required_unless_present = "section")]
        stock: Vec<u32>,

        /// Use the mill lengths of a section type (FB, L, U, H, SGP, I, SquarePipe)
        #[arg(long, conflicts_with = "stock", value_parser = parse_section)]
        section: Option<SectionType>,

        /// Pieces as length:qty (e.g. 1500:2 1800:2)
        #[arg(long = "cuts", num_args = 1.., required = true)]
        cuts: Vec<String>,

        /// On-hand remnants as length:qty
        #[arg(long, num_args = 1..)]
        remnants: Vec<String>,

        /// Blade kerf in mm
        #[arg(long, default_value_t = 0)]
        kerf: u32,

        /// Build repeatable patterns for stacked cutting
        #[arg(long)]
        stacking: bool,

        /// Yield scoring: global or greedy
        #[arg(long, default_value = "global", value_parser = parse_optimize_mode)]
        mode: OptimizeMode,
    },
    /// Nest rectangles on stock sheets
    Sheets {
        /// Stock sheets as WxH or name=WxH (default: 3x6, 4x8, 5x10)
        #[arg(long, num_args = 1..)]
        stock: Vec<String>,

        /// Rectangles as WxH:qty[:A|B|free]
        #[arg(long = "cuts", num_args = 1.., required = true)]
        cuts: Vec<String>,

        /// On-hand remnant sheets as WxH:qty
        #[arg(long, num_args = 1..)]
        remnants: Vec<String>,

        /// Let different rectangles share a sheet
        #[arg(long)]
        mixed: bool,

        /// Allow any rotation regardless of mesh direction
        #[arg(long)]
        ignore_direction: bool,

        /// Fix every rectangle to orientation A or B
        #[arg(long, value_parser = parse_orientation)]
        force: Option<Orientation>,
    },
    /// Sheets needed per stock size for one rectangle type
    Estimate {
        /// Rectangle as WxH
        #[arg(long, value_parser = parse_dimensions)]
        size: Rect,

        #[arg(long)]
        qty: u32,

        #[arg(long)]
        ignore_direction: bool,
    },
}

fn parse_optimize_mode(s: &str) -> Result<OptimizeMode, String> {
    match s {
        "global" => Ok(OptimizeMode::Global),
        "greedy" => Ok(OptimizeMode::Greedy),
        _ => Err(format!("invalid mode '{}', expected: global or greedy", s)),
    }
}

fn parse_section(s: &str) -> Result<SectionType, String> {
    SectionType::from_code(s).ok_or_else(|| format!("unknown section type '{}'", s))
}

fn parse_orientation(s: &str) -> Result<Orientation, String> {
    match s {
        "A" | "a" => Ok(Orientation::A),
        "B" | "b" => Ok(Orientation::B),
        _ => Err(format!("invalid direction '{}', expected: A or B", s)),
    }
}

fn parse_mesh(s: &str) -> Result<MeshDirection, String> {
    match s {
        "free" => Ok(MeshDirection::Free),
        _ => parse_orientation(s).map(|o| match o {
            Orientation::A => MeshDirection::A,
            Orientation::B => MeshDirection::B,
        }),
    }
}

fn parse_dimensions(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let w = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let h = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    if w == 0 || h == 0 {
        return Err(format!("dimensions must be non-zero in '{}'", s));
    }
    Ok(Rect::new(w, h))
}

fn parse_qty(s: &str, whole: &str) -> Result<u32, String> {
    let qty = s
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", whole))?;
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{}'", whole));
    }
    Ok(qty)
}

/// `length:qty`
fn parse_length_qty(s: &str) -> Result<(u32, u32), String> {
    let Some((len, qty)) = s.split_once(':') else {
        return Err(format!("invalid entry '{}', expected length:qty", s));
    };
    let len = len
        .parse::<u32>()
        .map_err(|_| format!("invalid length in '{}'", s))?;
    if len == 0 {
        return Err(format!("length must be non-zero in '{}'", s));
    }
    Ok((len, parse_qty(qty, s)?))
}

/// `WxH:qty[:A|B|free]`
fn parse_rectangle(s: &str) -> Result<Rectangle, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid cut '{}', expected WxH:qty[:A|B|free]", s));
    }
    let rect = parse_dimensions(parts[0])?;
    let qty = parse_qty(parts[1], s)?;
    let mesh = match parts.get(2) {
        Some(m) => parse_mesh(m)?,
        None => MeshDirection::Free,
    };
    Ok(Rectangle::new(rect.w, rect.h, qty).with_mesh(mesh))
}

/// `WxH` or `name=WxH`
fn parse_stock_sheet(s: &str) -> Result<StockSheet, String> {
    let (name, dims) = match s.split_once('=') {
        Some((name, dims)) => (name.to_string(), dims),
        None => (s.to_string(), s),
    };
    let rect = parse_dimensions(dims)?;
    Ok(StockSheet::new(name, rect.w, rect.h))
}

fn parse_remnant_sheet(s: &str) -> Result<RemnantSheet, String> {
    let Some((dims, qty)) = s.split_once(':') else {
        return Err(format!("invalid remnant '{}', expected WxH:qty", s));
    };
    let rect = parse_dimensions(dims)?;
    Ok(RemnantSheet::new(rect.w, rect.h, parse_qty(qty, s)?))
}

fn run_bars(
    json: bool,
    stock: Vec<StockLength>,
    cuts: &[String],
    remnants: &[String],
    options: BarOptions,
) -> Result<(), String> {
    let demand: Vec<Piece> = cuts
        .iter()
        .map(|c| parse_length_qty(c).map(|(l, q)| Piece::new(l, q)))
        .collect::<Result<Vec<_>, _>>()?;
    let remnants: Vec<RemnantBar> = remnants
        .iter()
        .map(|r| parse_length_qty(r).map(|(l, q)| RemnantBar::new(l, q)))
        .collect::<Result<Vec<_>, _>>()?;

    let solver = BarSolver::new(stock, remnants, options);
    let result = solver.solve(&demand);

    if json {
        let failed = result.is_err();
        let outcome: Outcome<_> = result.into();
        println!("{}", serde_json::to_string_pretty(&outcome).map_err(|e| e.to_string())?);
        return if failed { Err("no plan".to_string()) } else { Ok(()) };
    }

    let plan = result.map_err(|e| e.to_string())?;
    for g in group_bars(&plan.bars) {
        let source = match g.bar.source {
            SourceType::Stock => "stock",
            SourceType::Remnant => "remnant",
        };
        let range = if g.start_no == g.end_no {
            format!("No.{}", g.start_no)
        } else {
            format!("No.{}-{}", g.start_no, g.end_no)
        };
        let cuts: Vec<String> = g.bar.cuts.iter().map(|c| c.to_string()).collect();
        println!(
            "{} {} {} mm x{}: [{}] leftover {} mm, kerf {} mm",
            range,
            source,
            g.bar.stock_length,
            g.count,
            cuts.join(", "),
            g.bar.remainder,
            g.bar.kerf_total
        );
    }
    println!();

    let s = &plan.summary;
    let by_stock: Vec<String> = s
        .by_stock_length
        .iter()
        .map(|(len, n)| format!("{} mm x{}", len, n))
        .collect();
    println!(
        "Summary: {} bar{} to buy ({}), {} remnant{} used, {:.1}% yield",
        s.purchased_bars_count,
        if s.purchased_bars_count == 1 { "" } else { "s" },
        if by_stock.is_empty() { "none".to_string() } else { by_stock.join(", ") },
        s.used_remnants_count,
        if s.used_remnants_count == 1 { "" } else { "s" },
        s.yield_pct,
    );
    Ok(())
}

fn run_sheets(
    json: bool,
    stock: &[String],
    cuts: &[String],
    remnants: &[String],
    options: SheetOptions,
) -> Result<(), String> {
    let demand: Vec<Rectangle> = cuts
        .iter()
        .map(|c| parse_rectangle(c))
        .collect::<Result<Vec<_>, _>>()?;
    let remnants: Vec<RemnantSheet> = remnants
        .iter()
        .map(|r| parse_remnant_sheet(r))
        .collect::<Result<Vec<_>, _>>()?;
    let stock: Vec<StockSheet> = if stock.is_empty() {
        default_stock_sheets()
    } else {
        stock
            .iter()
            .map(|s| parse_stock_sheet(s))
            .collect::<Result<Vec<_>, _>>()?
    };

    let solver = SheetSolver::new(stock, remnants, options);
    let result = solver.solve(&demand);

    if json {
        let failed = result.is_err();
        let outcome: Outcome<_> = result.into();
        println!("{}", serde_json::to_string_pretty(&outcome).map_err(|e| e.to_string())?);
        return if failed { Err("no plan".to_string()) } else { Ok(()) };
    }

    let plan = result.map_err(|e| e.to_string())?;
    for g in group_placements(&plan.placements) {
        let pl = &g.placement;
        let range = if g.start_no == g.end_no {
            format!("Sheet {}", g.start_no)
        } else {
            format!("Sheets {}-{}", g.start_no, g.end_no)
        };
        let source = match pl.source {
            SourceType::Stock => pl.sheet.name.as_str(),
            SourceType::Remnant => "remnant",
        };
        println!("{} ({} {}) x{}:", range, source, pl.sheet.rect(), g.count);
        match &pl.layout {
            Layout::Grid {
                orientation,
                nx,
                ny,
                part_width,
                part_height,
            } => println!(
                "  {}x{} grid of {}x{} [{}], {} made",
                nx, ny, part_width, part_height, orientation, pl.made
            ),
            Layout::Mixed { rects } => {
                for r in rects {
                    println!("  {} {}x{} @ ({}, {})", r.label, r.w, r.h, r.x, r.y);
                }
            }
        }
        for c in &pl.parts_summary {
            println!("  {}: {}", c.label, c.qty);
        }
    }
    println!();

    let s = &plan.summary;
    println!(
        "Summary: {} sheet{} to buy, {} remnant{} used, {}/{} pieces",
        s.purchased_sheets_count,
        if s.purchased_sheets_count == 1 { "" } else { "s" },
        s.used_remnants_count,
        if s.used_remnants_count == 1 { "" } else { "s" },
        s.made_total,
        s.need_total,
    );
    Ok(())
}

fn run_estimate(json: bool, size: Rect, qty: u32, ignore_direction: bool) -> Result<(), String> {
    let estimates = estimate_plates(&default_stock_sheets(), size, qty, ignore_direction);
    if estimates.is_empty() {
        return Err(format!("{} does not fit any stock sheet", size));
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&estimates).map_err(|e| e.to_string())?);
        return Ok(());
    }
    for e in &estimates {
        let direction = match e.direction {
            Some(o) => o.to_string(),
            None => "free".to_string(),
        };
        println!(
            "{} ({}): {} per sheet, {} sheet{} [{}]",
            e.stock,
            e.sheet,
            e.per_sheet,
            e.sheets_needed,
            if e.sheets_needed == 1 { "" } else { "s" },
            direction
        );
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let result = match cli.command {
        Command::Bars {
            stock,
            section,
            cuts,
            remnants,
            kerf,
            stacking,
            mode,
        } => run_bars(
            cli.json,
            match section {
                Some(section) => section.default_stock(),
                None => stock.into_iter().map(StockLength::new).collect(),
            },
            &cuts,
            &remnants,
            BarOptions {
                kerf_mm: kerf,
                stacking_mode: stacking,
                optimize_mode: mode,
            },
        ),
        Command::Sheets {
            stock,
            cuts,
            remnants,
            mixed,
            ignore_direction,
            force,
        } => run_sheets(
            cli.json,
            &stock,
            &cuts,
            &remnants,
            SheetOptions {
                ignore_direction,
                force_direction: force,
                mixed_mode: mixed,
            },
        ),
        Command::Estimate {
            size,
            qty,
            ignore_direction,
        } => run_estimate(cli.json, size, qty, ignore_direction),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
