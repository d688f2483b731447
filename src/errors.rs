use thiserror::Error;

/// Typed failures raised by the report pipeline.
///
/// Leaf code returns these; everything above wraps with `anyhow::Context`
/// so the command boundary prints one chain and exits non-zero.
#[derive(Error, Debug)]
pub enum ReportError {
    // -- Input --------------------------------------------------------------
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    // -- Transport ----------------------------------------------------------
    #[error("{service} request failed: {reason}")]
    Transport { service: String, reason: String },

    // -- Data shape ---------------------------------------------------------
    #[error("unexpected response shape: {0}")]
    DataShape(String),
}

impl ReportError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn transport(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn shape(reason: impl Into<String>) -> Self {
        Self::DataShape(reason.into())
    }
}
