use crate::domain::money::{Currency, Money, round_cents};
use crate::domain::ports::{FeeLocalizer, RateProviderBox};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Converts fees through the shared rate cache: `fee * rate(target) / rate(source)`.
pub struct RateFeeLocalizer {
    rates: RateProviderBox,
}

impl RateFeeLocalizer {
    pub fn new(rates: RateProviderBox) -> Self {
        Self { rates }
    }

    async fn rate(&self, currency: &Currency) -> Result<Decimal> {
        match self.rates.rate(currency).await? {
            Some(rate) if rate > Decimal::ZERO => Ok(rate),
            _ => Err(CheckoutError::RateUnavailable(currency.clone())),
        }
    }
}

#[async_trait]
impl FeeLocalizer for RateFeeLocalizer {
    async fn localize(&self, fee: &Money, target: &Currency) -> Result<Decimal> {
        if &fee.currency == target {
            return Ok(round_cents(fee.amount));
        }
        let source_rate = self.rate(&fee.currency).await?;
        let target_rate = self.rate(target).await?;
        fee.amount
            .checked_mul(target_rate)
            .and_then(|scaled| scaled.checked_div(source_rate))
            .map(round_cents)
            .ok_or_else(|| CheckoutError::Internal(format!("fee {} overflowed", fee.amount)))
    }
}
