use crate::domain::money::Currency;
use crate::domain::pledge::{NewPledge, Pledge, Project, Reward};
use crate::domain::ports::{PledgeStore, ProjectStore, RateProvider, RewardStore};
use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory catalog of projects, keyed by slug.
#[derive(Default, Clone)]
pub struct InMemoryProjectStore {
    projects: Arc<RwLock<HashMap<String, Project>>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, project: Project) {
        let mut projects = self.projects.write().await;
        projects.insert(project.slug.clone(), project);
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.get(slug).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRewardStore {
    rewards: Arc<RwLock<HashMap<u64, Reward>>>,
}

impl InMemoryRewardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, reward: Reward) {
        let mut rewards = self.rewards.write().await;
        rewards.insert(reward.id, reward);
    }
}

#[async_trait]
impl RewardStore for InMemoryRewardStore {
    async fn find(&self, reward_id: u64) -> StoreResult<Option<Reward>> {
        let rewards = self.rewards.read().await;
        Ok(rewards.get(&reward_id).cloned())
    }
}

#[derive(Default)]
struct PledgeTable {
    last_id: u64,
    pledges: HashMap<u64, Pledge>,
}

/// A thread-safe in-memory pledge store.
///
/// Clones share the same table, so a test can keep a handle and inspect what
/// the workflow persisted.
#[derive(Default, Clone)]
pub struct InMemoryPledgeStore {
    table: Arc<RwLock<PledgeTable>>,
}

impl InMemoryPledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Pledge> {
        let table = self.table.read().await;
        let mut pledges: Vec<Pledge> = table.pledges.values().cloned().collect();
        pledges.sort_by_key(|pledge| pledge.id);
        pledges
    }
}

#[async_trait]
impl PledgeStore for InMemoryPledgeStore {
    async fn create(&self, pledge: NewPledge) -> StoreResult<Pledge> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let stored = Pledge::from_new(table.last_id, pledge, Utc::now());
        table.pledges.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, pledge: &Pledge) -> StoreResult<()> {
        let mut table = self.table.write().await;
        table.pledges.insert(pledge.id, pledge.clone());
        Ok(())
    }

    async fn get(&self, pledge_id: u64) -> StoreResult<Option<Pledge>> {
        let table = self.table.read().await;
        Ok(table.pledges.get(&pledge_id).cloned())
    }
}

/// Exchange rates relative to the base currency, as loaded at startup.
#[derive(Default, Clone)]
pub struct InMemoryRateCache {
    rates: Arc<RwLock<HashMap<Currency, Decimal>>>,
}

impl InMemoryRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn write(&self, currency: Currency, rate: Decimal) {
        let mut rates = self.rates.write().await;
        rates.insert(currency, rate);
    }
}

#[async_trait]
impl RateProvider for InMemoryRateCache {
    async fn rate(&self, currency: &Currency) -> StoreResult<Option<Decimal>> {
        let rates = self.rates.read().await;
        Ok(rates.get(currency).copied())
    }
}
