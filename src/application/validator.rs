use crate::config::CheckoutConfig;
use crate::domain::money::{Amount, Currency, round_cents};
use crate::domain::pledge::{NewPledge, PaymentMethod, Pledge, Project, Reward};
use crate::domain::ports::{ChallengeVerifier, PledgeStore, RateProvider, RewardStore};
use crate::domain::request::{CheckoutParams, RateContext, Session};
use crate::error::{CheckoutError, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, warn};

/// Resolves the visitor's currency and its rate against the base currency.
pub async fn resolve_rate_context(
    rates: &dyn RateProvider,
    session_currency: Option<&str>,
    base_currency: &Currency,
) -> Result<RateContext> {
    let currency = match session_currency {
        Some(code) => Currency::parse(code).map_err(|_| {
            CheckoutError::Validation(vec![format!("Currency {code} is not supported")])
        })?,
        None => base_currency.clone(),
    };
    let rate = lookup_rate(rates, &currency).await?;
    Ok(RateContext { rate, currency })
}

async fn lookup_rate(rates: &dyn RateProvider, currency: &Currency) -> Result<Decimal> {
    match rates.rate(currency).await? {
        Some(rate) if rate > Decimal::ZERO => Ok(rate),
        _ => Err(CheckoutError::RateUnavailable(currency.clone())),
    }
}

/// Builds, validates and persists the pledge for one checkout run.
pub struct PledgeValidator<'a> {
    pub rates: &'a dyn RateProvider,
    pub rewards: &'a dyn RewardStore,
    pub pledges: &'a dyn PledgeStore,
    pub verifier: &'a dyn ChallengeVerifier,
    pub config: &'a CheckoutConfig,
}

impl PledgeValidator<'_> {
    /// Returns the stored pledge.
    ///
    /// Field errors are collected together before anything is written. Input
    /// that fails here (no user, an amount that is not a positive number, no
    /// usable rate) leaves no pledge behind: an invalid record is never saved.
    /// Once a settlement value can be computed the pledge is stored, so a
    /// failed anti-abuse challenge still leaves a record of the attempt.
    pub async fn build(
        &self,
        params: &CheckoutParams,
        session: &Session,
        project: &Project,
        rate_context: &RateContext,
    ) -> Result<Pledge> {
        let mut reasons = Vec::new();

        if session.user.is_none() {
            reasons.push("User can't be blank".to_string());
        }

        let amount = match Decimal::from_str(params.backing_amount.trim()) {
            Ok(raw) => match Amount::new(raw) {
                Ok(amount) => Some(amount),
                Err(CheckoutError::Validation(mut messages)) => {
                    reasons.append(&mut messages);
                    None
                }
                Err(other) => return Err(other),
            },
            Err(_) => {
                reasons.push("Backing amount is not a number".to_string());
                None
            }
        };

        let (Some(user), Some(amount)) = (session.user.as_ref(), amount) else {
            return Err(CheckoutError::Validation(reasons));
        };

        let value = self.settlement_value(amount, project, rate_context).await?;
        if value <= Decimal::ZERO {
            return Err(CheckoutError::Validation(vec![
                "Value must be greater than 0".to_string(),
            ]));
        }

        let reward = self
            .resolve_reward(params.reward_id.as_deref(), project, value)
            .await?;

        let pledge = self
            .pledges
            .create(NewPledge {
                project_id: project.id,
                user_id: user.id,
                value,
                currency_value: amount.value(),
                currency_code: rate_context.currency.clone(),
                reward_id: reward.map(|r| r.id),
                country: session.country.clone(),
                payment_method: PaymentMethod::CardGateway,
                payment_token: params.payment_token.clone(),
            })
            .await?;
        debug!(pledge_id = pledge.id, %value, "pledge recorded");

        let challenge = params.challenge_response.as_deref();
        if let Some(response) = challenge
            && self.config.requires_challenge(challenge)
            && !self.verifier.verify(response).await
        {
            warn!(pledge_id = pledge.id, "anti-abuse challenge failed");
            return Err(CheckoutError::Validation(vec![
                "Failed anti-abuse challenge".to_string(),
            ]));
        }

        Ok(pledge)
    }

    /// `raw * rate(project) / rate(session)`, rounded to cents.
    async fn settlement_value(
        &self,
        amount: Amount,
        project: &Project,
        rate_context: &RateContext,
    ) -> Result<Decimal> {
        let project_rate = lookup_rate(self.rates, &project.currency).await?;
        amount
            .value()
            .checked_mul(project_rate)
            .and_then(|scaled| scaled.checked_div(rate_context.rate))
            .map(round_cents)
            .ok_or_else(|| {
                CheckoutError::Validation(vec!["Backing amount is out of range".to_string()])
            })
    }

    /// An unknown, foreign or unreachable reward leaves the pledge without one.
    async fn resolve_reward(
        &self,
        reward_id: Option<&str>,
        project: &Project,
        value: Decimal,
    ) -> Result<Option<Reward>> {
        let Some(raw_id) = reward_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let Ok(id) = raw_id.parse::<u64>() else {
            debug!(reward_id = raw_id, "ignoring malformed reward id");
            return Ok(None);
        };

        let reward = match self.rewards.find(id).await? {
            Some(reward) if reward.project_id == project.id => reward,
            Some(_) => {
                debug!(reward_id = id, "reward belongs to another project");
                return Ok(None);
            }
            None => {
                debug!(reward_id = id, "reward not found");
                return Ok(None);
            }
        };

        if reward.is_reachable_with(value) {
            Ok(Some(reward))
        } else {
            debug!(
                reward_id = id,
                %value,
                minimum = %reward.minimum_value,
                "pledge below reward minimum"
            );
            Ok(None)
        }
    }
}
