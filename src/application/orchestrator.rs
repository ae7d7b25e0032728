use super::classifier::OutcomeClassifier;
use super::order_builder::OrderBuilder;
use super::validator::{PledgeValidator, resolve_rate_context};
use crate::config::CheckoutConfig;
use crate::domain::gateway::{Customer, CustomerProfile, Order};
use crate::domain::outcome::{Outcome, WorkflowResult};
use crate::domain::pledge::{Pledge, Project, User};
use crate::domain::ports::{
    ChallengeVerifierBox, FeeLocalizerBox, NotifierBox, PaymentGatewayBox, PledgeStoreBox,
    ProjectStoreBox, RateProviderBox, RewardStoreBox,
};
use crate::domain::request::CheckoutRequest;
use crate::error::{CheckoutError, GatewayError, Precondition, Result};
use chrono::Utc;
use std::fmt;
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};

/// Everything a checkout run talks to.
pub struct Collaborators {
    pub projects: ProjectStoreBox,
    pub rewards: RewardStoreBox,
    pub pledges: PledgeStoreBox,
    pub rates: RateProviderBox,
    pub gateway: PaymentGatewayBox,
    pub verifier: ChallengeVerifierBox,
    pub fees: FeeLocalizerBox,
    pub notifier: NotifierBox,
}

/// Non-terminal states of a checkout run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    CustomerResolving,
    OrderSubmitting,
    Classifying,
    Finalizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::CustomerResolving => "customer_resolving",
            Stage::OrderSubmitting => "order_submitting",
            Stage::Classifying => "classifying",
            Stage::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// Drives one pledge from raw input to a recorded gateway outcome.
///
/// Each run is independent: the orchestrator keeps no per-request state, so a
/// single instance can serve concurrent requests. Stages pass their results
/// forward explicitly and the first failure ends the run.
pub struct PaymentOrchestrator {
    ports: Collaborators,
    config: CheckoutConfig,
}

impl PaymentOrchestrator {
    pub fn new(ports: Collaborators, config: CheckoutConfig) -> Self {
        Self { ports, config }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Runs the workflow. Every path ends in exactly one [`WorkflowResult`].
    pub async fn process(&self, request: &CheckoutRequest) -> WorkflowResult {
        let span = info_span!(
            "checkout",
            project = %request.params.project_id,
            pledge_id = field::Empty
        );
        async move {
            match self.run(request).await {
                Ok(result) => {
                    info!(status = ?result.status, "checkout finished");
                    result
                }
                Err(err) => {
                    log_failure(&err);
                    WorkflowResult::from_error(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &CheckoutRequest) -> Result<WorkflowResult> {
        let params = &request.params;
        let session = &request.session;

        enter(Stage::Validating);
        let project = self
            .ports
            .projects
            .find_by_slug(&params.project_id)
            .await?
            .ok_or_else(|| CheckoutError::ProjectNotFound(params.project_id.clone()))?;
        let rate_context = resolve_rate_context(
            self.ports.rates.as_ref(),
            session.currency.as_deref(),
            &self.config.base_currency,
        )
        .await?;
        let pledge = self
            .validator()
            .build(params, session, &project, &rate_context)
            .await?;
        Span::current().record("pledge_id", pledge.id);

        enter(Stage::CustomerResolving);
        let customer = self
            .resolve_customer(params.payment_token.as_deref(), session.user.as_ref())
            .await?
            .ok_or(CheckoutError::PreconditionMissing(Precondition::Customer))?;

        enter(Stage::OrderSubmitting);
        let spec = OrderBuilder::build(&pledge, &project, &customer)?;
        let order = self.ports.gateway.create_order(&spec).await?;

        // The card may have been charged from here on: the outcome has to be
        // written down whatever happens next.
        self.settle(pledge, &project, &order).await
    }

    fn validator(&self) -> PledgeValidator<'_> {
        PledgeValidator {
            rates: self.ports.rates.as_ref(),
            rewards: self.ports.rewards.as_ref(),
            pledges: self.ports.pledges.as_ref(),
            verifier: self.ports.verifier.as_ref(),
            config: &self.config,
        }
    }

    /// Registers the backer with the gateway. `None` means no customer could
    /// be obtained: no token, no user, or the gateway refused the profile.
    /// Only transport failures and timeouts end the run as an error.
    async fn resolve_customer(
        &self,
        token: Option<&str>,
        user: Option<&User>,
    ) -> Result<Option<Customer>> {
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            debug!("no payment token supplied");
            return Ok(None);
        };
        let Some(user) = user else {
            return Ok(None);
        };

        let profile = CustomerProfile::with_card(&user.name, &user.email, token);
        match self.ports.gateway.create_customer(&profile).await {
            Ok(customer) => Ok(Some(customer)),
            Err(GatewayError::ParameterValidation(reason)) => {
                warn!(%reason, "gateway rejected customer parameters");
                Ok(None)
            }
            Err(err @ GatewayError::ErrorList(_)) => {
                warn!(error = %err, "gateway refused to register customer");
                Ok(None)
            }
            Err(err @ (GatewayError::Transport(_) | GatewayError::Timeout(_))) => {
                Err(CheckoutError::Gateway(err))
            }
        }
    }

    async fn settle(
        &self,
        mut pledge: Pledge,
        project: &Project,
        order: &Order,
    ) -> Result<WorkflowResult> {
        enter(Stage::Classifying);
        let outcome = match OutcomeClassifier::classify(order) {
            Ok(outcome) => outcome,
            Err(err) => {
                pledge.record_unsettled_order(&order.id);
                self.persist_outcome(&pledge).await?;
                return Err(err);
            }
        };

        enter(Stage::Finalizing);
        match outcome {
            Outcome::Approved(settlement) => {
                let localized = self
                    .ports
                    .fees
                    .localize(&settlement.fee, &project.currency)
                    .await;
                let fee = match localized {
                    Ok(fee) => Some(fee),
                    Err(err) => {
                        warn!(error = %err, "could not localize gateway fee");
                        None
                    }
                };
                pledge.confirm(&settlement, fee, Utc::now())?;
                self.persist_outcome(&pledge).await?;
                self.ports.notifier.successful_pledge(&pledge);
                Ok(WorkflowResult::approved(self.config.success_redirect(pledge.id)))
            }
            Outcome::Declined(decline) => {
                pledge.decline(&decline)?;
                self.persist_outcome(&pledge).await?;
                self.ports.notifier.failed_card(&pledge);
                Ok(WorkflowResult::declined(None))
            }
        }
    }

    async fn persist_outcome(&self, pledge: &Pledge) -> Result<()> {
        self.ports.pledges.update(pledge).await.map_err(|err| {
            error!(
                transaction_id = ?pledge.transaction_id,
                error = %err,
                "failed to record gateway outcome"
            );
            CheckoutError::from(err)
        })
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "entering stage");
}

fn log_failure(err: &CheckoutError) {
    match err {
        CheckoutError::Validation(_)
        | CheckoutError::ProjectNotFound(_)
        | CheckoutError::PreconditionMissing(_) => info!(error = %err, "checkout rejected"),
        CheckoutError::RateUnavailable(_) | CheckoutError::GatewayErrorList(_) => {
            warn!(error = %err, "checkout failed")
        }
        CheckoutError::Gateway(_)
        | CheckoutError::InvariantViolation(_)
        | CheckoutError::Store(_)
        | CheckoutError::Internal(_) => error!(error = %err, "checkout failed"),
    }
}
