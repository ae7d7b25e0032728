#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pledge_engine::application::orchestrator::{Collaborators, PaymentOrchestrator};
use pledge_engine::config::{CheckoutConfig, Environment};
use pledge_engine::domain::gateway::{
    CardDetails, Charge, Customer, CustomerProfile, Order, OrderSpec,
};
use pledge_engine::domain::money::{Currency, Money};
use pledge_engine::domain::pledge::{NewPledge, Pledge, Project, Reward, User};
use pledge_engine::domain::ports::{
    FeeLocalizer, FeeLocalizerBox, PaymentGateway, PledgeStore, PledgeStoreBox,
};
use pledge_engine::domain::request::{CheckoutParams, CheckoutRequest, Session};
use pledge_engine::error::{
    CheckoutError, GatewayError, GatewayErrorDetail, GatewayResult, Result, StoreError,
    StoreResult,
};
use pledge_engine::infrastructure::challenge::SharedSecretVerifier;
use pledge_engine::infrastructure::fees::RateFeeLocalizer;
use pledge_engine::infrastructure::in_memory::{
    InMemoryPledgeStore, InMemoryProjectStore, InMemoryRateCache, InMemoryRewardStore,
};
use pledge_engine::infrastructure::mailer::{ChannelMailer, Notification};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc::UnboundedReceiver;

pub const PROJECT_SLUG: &str = "mexico-on-rails";
pub const REWARD_ID: u64 = 110902;
pub const PREMIUM_REWARD_ID: u64 = 110903;
pub const FOREIGN_REWARD_ID: u64 = 220001;

pub fn mxn() -> Currency {
    Currency::parse("mxn").unwrap()
}

pub fn project() -> Project {
    Project {
        id: 1,
        slug: PROJECT_SLUG.into(),
        name: "México on Rails".into(),
        goal: dec!(50000.50),
        currency: mxn(),
        publication_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        expires_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
    }
}

pub fn rewards() -> Vec<Reward> {
    vec![
        Reward {
            id: REWARD_ID,
            project_id: 1,
            title: "Sticker pack".into(),
            minimum_value: dec!(100),
        },
        Reward {
            id: PREMIUM_REWARD_ID,
            project_id: 1,
            title: "Conference ticket".into(),
            minimum_value: dec!(500),
        },
        Reward {
            id: FOREIGN_REWARD_ID,
            project_id: 2,
            title: "Someone else's mug".into(),
            minimum_value: dec!(10),
        },
    ]
}

pub fn user() -> User {
    User {
        id: 7,
        name: "Ana Lopez".into(),
        email: "ana@example.com".into(),
    }
}

pub fn request(amount: &str, reward_id: Option<&str>, token: Option<&str>) -> CheckoutRequest {
    CheckoutRequest {
        session: Session {
            user: Some(user()),
            currency: None,
            country: Some("MX".into()),
        },
        params: CheckoutParams {
            project_id: PROJECT_SLUG.into(),
            backing_amount: amount.into(),
            reward_id: reward_id.map(str::to_string),
            payment_token: token.map(str::to_string),
            challenge_response: None,
        },
    }
}

/// What the scripted gateway answers to `create_order`.
#[derive(Debug, Clone)]
pub enum Reply {
    Paid { fee: i64 },
    Declined(&'static str),
    /// Not paid, and no failure code given.
    Pending,
    PaidWithoutCharges,
    Errors(Vec<GatewayErrorDetail>),
    Transport(&'static str),
}

/// Deterministic gateway double that counts its calls.
#[derive(Clone)]
pub struct ScriptedGateway {
    reply: Reply,
    customer_error: Option<GatewayError>,
    customer_calls: Arc<AtomicUsize>,
    order_calls: Arc<AtomicUsize>,
}

impl ScriptedGateway {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            customer_error: None,
            customer_calls: Arc::new(AtomicUsize::new(0)),
            order_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every `create_customer` call fail with `err`.
    pub fn with_customer_error(mut self, err: GatewayError) -> Self {
        self.customer_error = Some(err);
        self
    }

    pub fn customer_calls(&self) -> usize {
        self.customer_calls.load(Ordering::SeqCst)
    }

    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_customer(&self, profile: &CustomerProfile) -> GatewayResult<Customer> {
        let n = self.customer_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = &self.customer_error {
            return Err(err.clone());
        }
        if profile.email.is_empty() {
            return Err(GatewayError::ParameterValidation("email is required".into()));
        }
        Ok(Customer {
            id: format!("cus_{n}"),
        })
    }

    async fn create_order(&self, spec: &OrderSpec) -> GatewayResult<Order> {
        let n = self.order_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("ord_{n}");
        let amount: i64 = spec.line_items.iter().map(|item| item.unit_price).sum();
        match &self.reply {
            Reply::Paid { fee } => Ok(Order {
                id,
                payment_status: "paid".into(),
                failure_code: None,
                charges: vec![Charge {
                    amount,
                    currency: spec.currency.clone(),
                    fee: *fee,
                    payment_method: CardDetails {
                        last4: "4242".into(),
                        brand: "visa".into(),
                        name: user().name,
                        issuer: "BANAMEX".into(),
                        exp_month: "12".into(),
                        exp_year: "30".into(),
                    },
                }],
            }),
            Reply::Declined(code) => Ok(Order {
                id,
                payment_status: "declined".into(),
                failure_code: Some(code.to_string()),
                charges: Vec::new(),
            }),
            Reply::Pending => Ok(Order {
                id,
                payment_status: "pending_payment".into(),
                failure_code: None,
                charges: Vec::new(),
            }),
            Reply::PaidWithoutCharges => Ok(Order {
                id,
                payment_status: "paid".into(),
                failure_code: None,
                charges: Vec::new(),
            }),
            Reply::Errors(details) => Err(GatewayError::ErrorList(details.clone())),
            Reply::Transport(reason) => Err(GatewayError::Transport(reason.to_string())),
        }
    }
}

/// Fee localizer that always fails, e.g. because a rate went missing.
pub struct BrokenFeeLocalizer;

#[async_trait]
impl FeeLocalizer for BrokenFeeLocalizer {
    async fn localize(&self, _fee: &Money, target: &Currency) -> Result<Decimal> {
        Err(CheckoutError::RateUnavailable(target.clone()))
    }
}

/// Pledge store that accepts new pledges but cannot record outcomes.
pub struct FrozenPledgeStore {
    inner: InMemoryPledgeStore,
}

#[async_trait]
impl PledgeStore for FrozenPledgeStore {
    async fn create(&self, pledge: NewPledge) -> StoreResult<Pledge> {
        self.inner.create(pledge).await
    }

    async fn update(&self, _pledge: &Pledge) -> StoreResult<()> {
        Err(StoreError::Backend("disk full".into()))
    }

    async fn get(&self, pledge_id: u64) -> StoreResult<Option<Pledge>> {
        self.inner.get(pledge_id).await
    }
}

/// Collaborators a test swaps out; the rest are the in-memory defaults.
#[derive(Default)]
pub struct Overrides {
    pub customer_error: Option<GatewayError>,
    pub fees: Option<FeeLocalizerBox>,
    pub frozen_pledges: bool,
}

pub struct Harness {
    pub orchestrator: PaymentOrchestrator,
    pub pledges: InMemoryPledgeStore,
    pub gateway: ScriptedGateway,
    pub inbox: UnboundedReceiver<Notification>,
}

impl Harness {
    pub async fn new(reply: Reply) -> Self {
        Self::with_overrides(reply, Overrides::default()).await
    }

    pub async fn with_overrides(reply: Reply, overrides: Overrides) -> Self {
        let config = CheckoutConfig::new(Environment::Sandbox, mxn(), "/pledges");
        Self::assemble(reply, config, SharedSecretVerifier::disabled(), overrides).await
    }

    pub async fn with_config(
        reply: Reply,
        config: CheckoutConfig,
        verifier: SharedSecretVerifier,
    ) -> Self {
        Self::assemble(reply, config, verifier, Overrides::default()).await
    }

    async fn assemble(
        reply: Reply,
        config: CheckoutConfig,
        verifier: SharedSecretVerifier,
        overrides: Overrides,
    ) -> Self {
        let projects = InMemoryProjectStore::new();
        projects.insert(project()).await;
        let reward_store = InMemoryRewardStore::new();
        for reward in rewards() {
            reward_store.insert(reward).await;
        }
        let rates = InMemoryRateCache::new();
        rates.write(mxn(), dec!(1)).await;
        rates.write(Currency::parse("usd").unwrap(), dec!(0.05)).await;

        let pledges = InMemoryPledgeStore::new();
        let pledge_store: PledgeStoreBox = if overrides.frozen_pledges {
            Box::new(FrozenPledgeStore {
                inner: pledges.clone(),
            })
        } else {
            Box::new(pledges.clone())
        };
        let fees = overrides
            .fees
            .unwrap_or_else(|| Box::new(RateFeeLocalizer::new(Box::new(rates.clone()))));

        let mut gateway = ScriptedGateway::new(reply);
        if let Some(err) = overrides.customer_error {
            gateway = gateway.with_customer_error(err);
        }
        let (mailer, inbox) = ChannelMailer::channel();

        let orchestrator = PaymentOrchestrator::new(
            Collaborators {
                projects: Box::new(projects),
                rewards: Box::new(reward_store),
                pledges: pledge_store,
                rates: Box::new(rates),
                gateway: Box::new(gateway.clone()),
                verifier: Box::new(verifier),
                fees,
                notifier: Box::new(mailer),
            },
            config,
        );

        Self {
            orchestrator,
            pledges,
            gateway,
            inbox,
        }
    }
}

/// The single pledge a test run is expected to have stored.
pub async fn only_pledge(store: &InMemoryPledgeStore) -> Pledge {
    let mut pledges = store.all().await;
    assert_eq!(pledges.len(), 1, "expected exactly one pledge");
    pledges.remove(0)
}
