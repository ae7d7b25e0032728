use super::gateway::{Customer, CustomerProfile, Order, OrderSpec};
use super::money::{Currency, Money};
use super::pledge::{NewPledge, Pledge, Project, Reward};
use crate::error::{GatewayResult, Result, StoreResult};
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Units of `currency` per unit of the base currency, if known.
    async fn rate(&self, currency: &Currency) -> StoreResult<Option<Decimal>>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Project>>;
}

#[async_trait]
pub trait RewardStore: Send + Sync {
    async fn find(&self, reward_id: u64) -> StoreResult<Option<Reward>>;
}

#[async_trait]
pub trait PledgeStore: Send + Sync {
    /// Persists a new pledge and assigns its id.
    async fn create(&self, pledge: NewPledge) -> StoreResult<Pledge>;
    async fn update(&self, pledge: &Pledge) -> StoreResult<()>;
    async fn get(&self, pledge_id: u64) -> StoreResult<Option<Pledge>>;
}

/// Anti-abuse (CAPTCHA) check.
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    async fn verify(&self, response: &str) -> bool;
}

/// Converts a gateway fee into another currency.
#[async_trait]
pub trait FeeLocalizer: Send + Sync {
    async fn localize(&self, fee: &Money, target: &Currency) -> Result<Decimal>;
}

/// Card gateway capability. Calls are single-shot: no retries happen here.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_customer(&self, profile: &CustomerProfile) -> GatewayResult<Customer>;
    async fn create_order(&self, spec: &OrderSpec) -> GatewayResult<Order>;
}

/// Outbound notifications. Implementations must not block the caller.
pub trait Notifier: Send + Sync {
    fn successful_pledge(&self, pledge: &Pledge);
    fn failed_card(&self, pledge: &Pledge);
}

pub type RateProviderBox = Box<dyn RateProvider>;
pub type ProjectStoreBox = Box<dyn ProjectStore>;
pub type RewardStoreBox = Box<dyn RewardStore>;
pub type PledgeStoreBox = Box<dyn PledgeStore>;
pub type ChallengeVerifierBox = Box<dyn ChallengeVerifier>;
pub type FeeLocalizerBox = Box<dyn FeeLocalizer>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type NotifierBox = Box<dyn Notifier>;
