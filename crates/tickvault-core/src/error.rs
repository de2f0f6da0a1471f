use thiserror::Error;

/// Validation errors for domain values and configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter, digit or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("resource key cannot be empty")]
    EmptyResourceKey,
    #[error("resource key must be a relative '/'-separated path: '{value}'")]
    InvalidResourceKey { value: String },

    #[error("configuration field '{field}' must be greater than zero")]
    ZeroConfigValue { field: &'static str },
    #[error("fx start year {year} is before the earliest supported year {min}")]
    FxStartYearTooEarly { year: i32, min: i32 },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("date cannot be formatted: {0}")]
    DateFormat(#[from] time::error::Format),

    #[error("date outside the supported calendar: {0}")]
    InvalidDate(#[from] time::error::ComponentRange),
}
