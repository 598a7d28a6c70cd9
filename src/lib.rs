pub mod bar;
pub mod catalog;
pub mod demand;
pub mod error;
pub mod fill;
pub mod group;
pub mod options;
pub mod score;
pub mod sheet;
pub mod shelf;
pub mod types;

pub use bar::{BarPlan, BarSolver, BarSummary};
pub use error::{Outcome, PlanError};
pub use options::{BarOptions, OptimizeMode, SheetOptions};
pub use sheet::{SheetPlan, SheetSolver, SheetSummary};
