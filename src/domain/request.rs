use super::money::Currency;
use super::pledge::User;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-visitor state the checkout runs under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user: Option<User>,
    /// Display currency chosen by the visitor; falls back to the base currency.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Raw checkout form fields, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutParams {
    pub project_id: String,
    pub backing_amount: String,
    #[serde(default)]
    pub reward_id: Option<String>,
    #[serde(default)]
    pub payment_token: Option<String>,
    #[serde(default)]
    pub challenge_response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub session: Session,
    pub params: CheckoutParams,
}

/// Exchange rate of the visitor's currency, resolved once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct RateContext {
    pub rate: Decimal,
    pub currency: Currency,
}
