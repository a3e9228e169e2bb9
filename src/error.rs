/// Errors raised by the target, aggregate and evaluator calculations.
///
/// Failures of the record store, identity provider or food recognizer are
/// not represented here; the client layer reports those through `anyhow`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A categorical value outside its enumeration, or a non-positive
    /// value where positivity is required.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fails with `InvalidInput` unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{} must not be negative, got {}",
            name, value
        )))
    }
}
