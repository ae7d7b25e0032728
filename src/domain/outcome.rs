use super::gateway::CardDetails;
use super::money::Money;
use crate::error::CheckoutError;
use serde::{Deserialize, Serialize};

/// Verdict extracted from a gateway order.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Approved(Settlement),
    Declined(Decline),
}

/// Financial metadata of a paid order, taken from its first charge.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub transaction_id: String,
    pub gross: Money,
    /// Gateway fee in the charge currency, before localization.
    pub fee: Money,
    pub card: CardDetails,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decline {
    pub transaction_id: String,
    pub failure_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Approved,
    Declined,
    Error,
}

/// The single answer produced by every checkout run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl WorkflowResult {
    pub fn approved(redirect: String) -> Self {
        Self {
            status: WorkflowStatus::Approved,
            message: None,
            redirect: Some(redirect),
        }
    }

    pub fn declined(message: Option<String>) -> Self {
        Self {
            status: WorkflowStatus::Declined,
            message,
            redirect: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: WorkflowStatus::Error,
            message: Some(message.into()),
            redirect: None,
        }
    }

    /// Maps a failed run onto its terminal result.
    ///
    /// Structural gateway rejections are a decline (the card was refused
    /// before charging); everything else is an error.
    pub fn from_error(err: &CheckoutError) -> Self {
        match err {
            CheckoutError::GatewayErrorList(_) => Self::declined(Some(err.to_string())),
            other => Self::error(other.to_string()),
        }
    }
}
