//! Gateway-side shapes: what is sent to the card gateway and what comes back.

use super::money::Currency;
use serde::{Deserialize, Serialize};

/// Who is paying, as registered with the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    pub email: String,
    pub payment_sources: Vec<PaymentSource>,
}

impl CustomerProfile {
    /// Profile with a single tokenized card as its payment source.
    pub fn with_card(name: impl Into<String>, email: impl Into<String>, token: &str) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            payment_sources: vec![PaymentSource::Card {
                token_id: token.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentSource {
    Card { token_id: String },
}

/// Opaque gateway customer handle. Lives only for one checkout run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub currency: Currency,
    pub customer_info: CustomerInfo,
    pub line_items: Vec<LineItem>,
    pub charges: Vec<ChargeRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub antifraud_info: AntifraudInfo,
}

/// Campaign context sent along with a line item for fraud scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntifraudInfo {
    pub project_id: String,
    pub starts_at: i64,
    pub ends_at: i64,
    pub target_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub payment_method: PaymentMethodRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentMethodRequest {
    /// Let the gateway charge the customer's default source.
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub payment_status: String,
    #[serde(default)]
    pub failure_code: Option<String>,
    #[serde(default)]
    pub charges: Vec<Charge>,
}

impl Order {
    pub const PAID: &'static str = "paid";

    pub fn is_paid(&self) -> bool {
        self.payment_status == Self::PAID
    }
}

/// A settled charge inside an order. Amounts are in minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub amount: i64,
    pub currency: Currency,
    pub fee: i64,
    pub payment_method: CardDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub last4: String,
    pub brand: String,
    pub name: String,
    pub issuer: String,
    pub exp_month: String,
    pub exp_year: String,
}
