use super::gateway::CardDetails;
use super::money::Currency;
use super::outcome::{Decline, Settlement};
use crate::error::{CheckoutError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A crowdfunding campaign. Read-only for the checkout workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub slug: String,
    pub name: String,
    /// Funding goal in the settlement currency.
    pub goal: Decimal,
    /// Settlement currency: pledges and goal are tracked in it.
    pub currency: Currency,
    pub publication_date: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: u64,
    pub project_id: u64,
    pub title: String,
    pub minimum_value: Decimal,
}

impl Reward {
    pub fn is_reachable_with(&self, value: Decimal) -> bool {
        value >= self.minimum_value
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CardGateway,
}

/// A pledge that has been validated but not yet stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPledge {
    pub project_id: u64,
    pub user_id: u64,
    /// Pledged amount in the project's settlement currency, two decimals.
    pub value: Decimal,
    /// The amount as typed, in `currency_code`.
    pub currency_value: Decimal,
    pub currency_code: Currency,
    pub reward_id: Option<u64>,
    pub country: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_token: Option<String>,
}

/// A stored pledge ("backer") and its payment outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pledge {
    pub id: u64,
    pub project_id: u64,
    pub user_id: u64,
    pub value: Decimal,
    pub currency_value: Decimal,
    pub currency_code: Currency,
    pub reward_id: Option<u64>,
    pub country: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_token: Option<String>,
    pub transaction_id: Option<String>,
    pub gross_amount: Option<Decimal>,
    pub gross_amount_currency: Option<Currency>,
    pub fee_amount: Option<Decimal>,
    pub card: Option<CardDetails>,
    pub failure_code: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Pledge {
    pub fn from_new(id: u64, new: NewPledge, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            project_id: new.project_id,
            user_id: new.user_id,
            value: new.value,
            currency_value: new.currency_value,
            currency_code: new.currency_code,
            reward_id: new.reward_id,
            country: new.country,
            payment_method: new.payment_method,
            payment_token: new.payment_token,
            transaction_id: None,
            gross_amount: None,
            gross_amount_currency: None,
            fee_amount: None,
            card: None,
            failure_code: None,
            confirmed_at: None,
            created_at,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Records an approved charge and confirms the pledge.
    ///
    /// `fee_amount` is the gateway fee already localized into the project's
    /// currency, or `None` when it could not be localized.
    pub fn confirm(
        &mut self,
        settlement: &Settlement,
        fee_amount: Option<Decimal>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_unsettled()?;
        self.transaction_id = Some(settlement.transaction_id.clone());
        self.gross_amount = Some(settlement.gross.amount);
        self.gross_amount_currency = Some(settlement.gross.currency.clone());
        self.fee_amount = fee_amount;
        self.card = Some(settlement.card.clone());
        self.confirmed_at = Some(at);
        Ok(())
    }

    /// Records a refused charge. No card metadata is kept.
    pub fn decline(&mut self, decline: &Decline) -> Result<()> {
        self.ensure_unsettled()?;
        self.transaction_id = Some(decline.transaction_id.clone());
        self.failure_code = Some(decline.failure_code.clone());
        Ok(())
    }

    /// Keeps track of an order the gateway accepted but that could not be settled.
    pub fn record_unsettled_order(&mut self, transaction_id: &str) {
        if self.transaction_id.is_none() {
            self.transaction_id = Some(transaction_id.to_string());
        }
    }

    fn ensure_unsettled(&self) -> Result<()> {
        match &self.transaction_id {
            Some(existing) => Err(CheckoutError::InvariantViolation(format!(
                "pledge {} already carries gateway outcome {existing}",
                self.id
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use rust_decimal_macros::dec;

    fn mxn() -> Currency {
        Currency::parse("mxn").unwrap()
    }

    fn pledge() -> Pledge {
        Pledge::from_new(
            1,
            NewPledge {
                project_id: 10,
                user_id: 7,
                value: dec!(100.00),
                currency_value: dec!(100.0),
                currency_code: mxn(),
                reward_id: None,
                country: Some("MX".into()),
                payment_method: PaymentMethod::CardGateway,
                payment_token: Some("tok_test_visa_4242".into()),
            },
            Utc::now(),
        )
    }

    fn card() -> CardDetails {
        CardDetails {
            last4: "4242".into(),
            brand: "visa".into(),
            name: "Ana Lopez".into(),
            issuer: "BANAMEX".into(),
            exp_month: "12".into(),
            exp_year: "30".into(),
        }
    }

    fn settlement() -> Settlement {
        Settlement {
            transaction_id: "ord_1".into(),
            gross: Money::new(dec!(100.00), mxn()),
            fee: Money::new(dec!(5.40), mxn()),
            card: card(),
        }
    }

    #[test]
    fn test_reward_threshold() {
        let reward = Reward {
            id: 1,
            project_id: 10,
            title: "Sticker".into(),
            minimum_value: dec!(50),
        };
        assert!(reward.is_reachable_with(dec!(50)));
        assert!(reward.is_reachable_with(dec!(50.01)));
        assert!(!reward.is_reachable_with(dec!(49.99)));
    }

    #[test]
    fn test_confirm_sets_settlement_fields() {
        let mut pledge = pledge();
        pledge.confirm(&settlement(), Some(dec!(5.40)), Utc::now()).unwrap();

        assert!(pledge.is_confirmed());
        assert_eq!(pledge.transaction_id.as_deref(), Some("ord_1"));
        assert_eq!(pledge.gross_amount, Some(dec!(100.00)));
        assert_eq!(pledge.fee_amount, Some(dec!(5.40)));
        assert_eq!(pledge.card, Some(card()));
        assert!(pledge.failure_code.is_none());
    }

    #[test]
    fn test_decline_keeps_card_metadata_empty() {
        let mut pledge = pledge();
        pledge
            .decline(&Decline {
                transaction_id: "ord_2".into(),
                failure_code: "card_declined".into(),
            })
            .unwrap();

        assert!(!pledge.is_confirmed());
        assert_eq!(pledge.failure_code.as_deref(), Some("card_declined"));
        assert!(pledge.card.is_none());
        assert!(pledge.gross_amount.is_none());
    }

    #[test]
    fn test_outcome_is_applied_once() {
        let mut pledge = pledge();
        pledge.confirm(&settlement(), Some(dec!(5.40)), Utc::now()).unwrap();

        let second = pledge.decline(&Decline {
            transaction_id: "ord_3".into(),
            failure_code: "declined".into(),
        });
        assert!(matches!(second, Err(CheckoutError::InvariantViolation(_))));
        assert_eq!(pledge.transaction_id.as_deref(), Some("ord_1"));
    }
}
