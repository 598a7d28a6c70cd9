use serde::{Deserialize, Serialize};

use crate::types::{MeshDirection, Orientation, deserialize_u32_from_number};

/// How yield mode scores candidate bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeMode {
    /// Look ahead: minimize the estimated stock bought for the whole job.
    #[default]
    Global,
    /// Minimize the leftover of each bar in turn.
    Greedy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BarOptions {
    /// Blade loss charged once per cut piece.
    #[serde(alias = "kerfMm", deserialize_with = "deserialize_u32_from_number")]
    pub kerf_mm: u32,
    /// Build repeatable patterns for cutting stacked bars together.
    #[serde(alias = "stackingMode")]
    pub stacking_mode: bool,
    #[serde(alias = "optimizeMode")]
    pub optimize_mode: OptimizeMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    /// Any rotation is allowed; overrides `force_direction` and row mesh.
    #[serde(alias = "ignoreDirection")]
    pub ignore_direction: bool,
    #[serde(alias = "forceDirection")]
    pub force_direction: Option<Orientation>,
    /// Let different rectangle types share a sheet.
    #[serde(alias = "mixedMode")]
    pub mixed_mode: bool,
}

impl SheetOptions {
    /// Whether a row with the given mesh may be cut in `orientation`.
    pub fn allows(&self, mesh: MeshDirection, orientation: Orientation) -> bool {
        if self.ignore_direction {
            return true;
        }
        let forced_ok = self.force_direction.is_none_or(|f| f == orientation);
        forced_ok && mesh.permits(orientation)
    }
}
