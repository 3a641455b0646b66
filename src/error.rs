use thiserror::Error;

/// Errors raised while constructing scenarios, per-scenario models, or the
/// extensive form. All of these are detected eagerly, before any solve.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("invalid scenario `{id}`: {reason}")]
    InvalidScenario { id: String, reason: String },

    #[error("template references `{name}`, which scenario `{scenario}` does not realize")]
    TemplateMismatch { scenario: String, name: String },

    #[error("scenario `{scenario}` first-stage variables do not match the reference shape: {detail}")]
    InconsistentFirstStage { scenario: String, detail: String },

    #[error("cannot aggregate an empty scenario set")]
    EmptyScenarioSet,
}

/// Solver-reported failures, fatal to the current solve attempt only. The
/// solver's diagnostic message is carried along; solution values are never
/// readable behind one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("model is infeasible: {0}")]
    Infeasible(String),

    #[error("model is unbounded: {0}")]
    Unbounded(String),

    #[error("solver failure: {0}")]
    Failure(String),
}
