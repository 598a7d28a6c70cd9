use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

/// Why a solve produced no plan. A failed solve never returns a partial plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Empty demand or catalog, or a zero dimension or quantity.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Some demand cannot be cut from any available stock or remnant.
    #[error("infeasible: {0}")]
    Infeasible(String),

    /// A fill that should have placed something placed nothing.
    #[error("internal inconsistency: {0}")]
    Internal(String),
}

impl PlanError {
    pub fn kind(&self) -> &'static str {
        match self {
            PlanError::InvalidInput(_) => "invalid_input",
            PlanError::Infeasible(_) => "infeasible",
            PlanError::Internal(_) => "internal",
        }
    }
}

/// Wire form of a solve: `{"ok": true, ...plan}` or `{"ok": false, "error": ...}`.
#[derive(Debug, Serialize)]
pub struct Outcome<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(flatten)]
    pub plan: Option<T>,
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(plan) => Outcome {
                ok: true,
                error: None,
                kind: None,
                plan: Some(plan),
            },
            Err(e) => Outcome {
                ok: false,
                error: Some(e.to_string()),
                kind: Some(e.kind()),
                plan: None,
            },
        }
    }
}
