use crate::domain::money::Currency;
use thiserror::Error;

/// A single structural rejection reported by the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayErrorDetail {
    pub code: String,
    pub message: String,
}

impl GatewayErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Failures surfaced by the payment gateway capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("gateway rejected parameters: {0}")]
    ParameterValidation(String),
    #[error("gateway rejected order: {}", join_details(.0))]
    ErrorList(Vec<GatewayErrorDetail>),
    #[error("gateway transport failure: {0}")]
    Transport(String),
    #[error("gateway did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

fn join_details(details: &[GatewayErrorDetail]) -> String {
    details
        .iter()
        .map(|detail| detail.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Upstream entities that must exist before a charge can be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Customer,
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precondition::Customer => f.write_str("customer missing"),
        }
    }
}

/// The closed set of ways a checkout run can end without a gateway verdict.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("no exchange rate available for {0}")]
    RateUnavailable(Currency),
    #[error("{0}")]
    PreconditionMissing(Precondition),
    #[error("{}", join_details(.0))]
    GatewayErrorList(Vec<GatewayErrorDetail>),
    #[error("{0}")]
    Gateway(GatewayError),
    #[error("gateway contract violated: {0}")]
    InvariantViolation(String),
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for CheckoutError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ErrorList(details) => CheckoutError::GatewayErrorList(details),
            other => CheckoutError::Gateway(other),
        }
    }
}

/// Failures while reading requests, catalogs and rate tables.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
