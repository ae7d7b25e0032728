use crate::domain::ports::ChallengeVerifier;
use async_trait::async_trait;

/// Accepts a challenge response only when it matches a configured secret.
///
/// Stands in for a hosted CAPTCHA service when running offline.
#[derive(Clone)]
pub struct SharedSecretVerifier {
    secret: Option<String>,
}

impl SharedSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }

    /// A verifier with no secret rejects every response.
    pub fn disabled() -> Self {
        Self { secret: None }
    }
}

#[async_trait]
impl ChallengeVerifier for SharedSecretVerifier {
    async fn verify(&self, response: &str) -> bool {
        match &self.secret {
            Some(secret) => !response.is_empty() && response == secret,
            None => false,
        }
    }
}
