use crate::domain::pledge::{Project, Reward};
use crate::error::InputError;
use crate::infrastructure::in_memory::{InMemoryProjectStore, InMemoryRewardStore};
use serde::Deserialize;
use std::io::Read;

/// Projects and rewards available to the checkout, loaded from JSON.
#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

impl Catalog {
    pub fn from_reader<R: Read>(source: R) -> Result<Self, InputError> {
        Ok(serde_json::from_reader(source)?)
    }

    pub async fn into_stores(self) -> (InMemoryProjectStore, InMemoryRewardStore) {
        let projects = InMemoryProjectStore::new();
        for project in self.projects {
            projects.insert(project).await;
        }
        let rewards = InMemoryRewardStore::new();
        for reward in self.rewards {
            rewards.insert(reward).await;
        }
        (projects, rewards)
    }
}
