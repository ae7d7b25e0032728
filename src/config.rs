//! Runtime policy for checkout runs.
//!
//! Values are handed to the orchestrator explicitly; nothing here reads
//! process-wide state. The binary builds this from CLI flags and environment.

use crate::domain::money::Currency;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Environment {
    Live,
    #[default]
    Sandbox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutConfig {
    pub environment: Environment,
    /// Used when the session has no currency.
    pub base_currency: Currency,
    /// Prefix of the redirect returned on approval.
    pub success_path: String,
}

impl CheckoutConfig {
    pub fn new(
        environment: Environment,
        base_currency: Currency,
        success_path: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            base_currency,
            success_path: success_path.into(),
        }
    }

    /// The anti-abuse challenge is only checked in live, and only when the
    /// visitor actually sent a response.
    pub fn requires_challenge(&self, challenge_response: Option<&str>) -> bool {
        self.environment == Environment::Live && challenge_response.is_some()
    }

    pub fn success_redirect(&self, pledge_id: u64) -> String {
        format!("{}/{pledge_id}/success", self.success_path.trim_end_matches('/'))
    }
}
