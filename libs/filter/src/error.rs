use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("missing required parameter '{0}'")]
    MissingRequiredParameter(&'static str),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("operator '{operator}' is not supported for field '{field}'")]
    UnknownOperator { field: String, operator: String },

    #[error("wrong number of values for '{0}'")]
    WrongArity(String),

    #[error("empty value for '{0}'")]
    EmptyValue(String),

    #[error("invalid value for '{param}': {value:?}")]
    InvalidValue { param: String, value: String },

    #[error("value for '{param}' is out of range: {reason}")]
    OutOfRange { param: String, reason: String },

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

impl Error {
    /// `true` for errors caused by the request; `false` for programmer defects.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Error::InternalInvariantViolation(_))
    }

    pub(crate) fn invalid(param: &str, value: &str) -> Self {
        Error::InvalidValue {
            param: param.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn out_of_range(param: &str, reason: impl Into<String>) -> Self {
        Error::OutOfRange {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}
