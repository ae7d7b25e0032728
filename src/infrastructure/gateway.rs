use crate::domain::gateway::{
    CardDetails, Charge, Customer, CustomerProfile, Order, OrderSpec, PaymentSource,
};
use crate::domain::ports::{PaymentGateway, PaymentGatewayBox};
use crate::error::{GatewayError, GatewayErrorDetail, GatewayResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

pub const TOKEN_PAID: &str = "tok_test_visa_4242";
pub const TOKEN_DECLINED: &str = "tok_test_card_declined";
pub const TOKEN_INSUFFICIENT_FUNDS: &str = "tok_test_insufficient_funds";
pub const TOKEN_ANTIFRAUD_REJECTED: &str = "tok_test_antifraud";

#[derive(Clone)]
struct SandboxCustomer {
    name: String,
    token: String,
}

/// Deterministic gateway keyed on well-known test tokens.
///
/// | token | result |
/// |---|---|
/// | `tok_test_visa_4242` | paid, one charge |
/// | `tok_test_card_declined` | declined, `card_declined` |
/// | `tok_test_insufficient_funds` | declined, `insufficient_funds` |
/// | `tok_test_antifraud` | order rejected with an error list |
///
/// Any other token fails customer creation with a parameter error.
#[derive(Default, Clone)]
pub struct SandboxGateway {
    customers: Arc<RwLock<HashMap<String, SandboxCustomer>>>,
    sequence: Arc<AtomicU64>,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_sandbox_{n}")
    }

    /// 2.9% plus a fixed 2.50, in minor units.
    fn fee_for(amount: i64) -> Option<i64> {
        amount.checked_mul(29)?.checked_div(1000)?.checked_add(250)
    }

    /// Sum of `unit_price * quantity` over the line items, if it fits.
    fn order_total(spec: &OrderSpec) -> Option<i64> {
        spec.line_items.iter().try_fold(0i64, |total, item| {
            item.unit_price
                .checked_mul(i64::from(item.quantity))
                .and_then(|line| total.checked_add(line))
        })
    }

    fn check_spec(spec: &OrderSpec) -> Vec<GatewayErrorDetail> {
        let mut details = Vec::new();
        if spec.line_items.is_empty() {
            details.push(GatewayErrorDetail::new(
                "parameter_validation_error",
                "line_items must not be empty",
            ));
        }
        for item in &spec.line_items {
            if item.unit_price <= 0 {
                details.push(GatewayErrorDetail::new(
                    "parameter_validation_error",
                    format!("unit_price of {} must be positive", item.name),
                ));
            }
            if item.antifraud_info.starts_at >= item.antifraud_info.ends_at {
                details.push(GatewayErrorDetail::new(
                    "antifraud_info_invalid",
                    "starts_at must be before ends_at",
                ));
            }
            if item.antifraud_info.target_amount <= 0 {
                details.push(GatewayErrorDetail::new(
                    "antifraud_info_invalid",
                    "target_amount must be positive",
                ));
            }
        }
        details
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_customer(&self, profile: &CustomerProfile) -> GatewayResult<Customer> {
        let token = profile
            .payment_sources
            .first()
            .map(|source| match source {
                PaymentSource::Card { token_id } => token_id.as_str(),
            })
            .ok_or_else(|| {
                GatewayError::ParameterValidation("a card payment source is required".into())
            })?;

        if ![
            TOKEN_PAID,
            TOKEN_DECLINED,
            TOKEN_INSUFFICIENT_FUNDS,
            TOKEN_ANTIFRAUD_REJECTED,
        ]
        .contains(&token)
        {
            return Err(GatewayError::ParameterValidation(format!(
                "token {token} is not valid"
            )));
        }

        let id = self.next_id("cus");
        let mut customers = self.customers.write().await;
        customers.insert(
            id.clone(),
            SandboxCustomer {
                name: profile.name.clone(),
                token: token.to_string(),
            },
        );
        debug!(customer_id = %id, "sandbox customer created");
        Ok(Customer { id })
    }

    async fn create_order(&self, spec: &OrderSpec) -> GatewayResult<Order> {
        let customer = {
            let customers = self.customers.read().await;
            customers.get(&spec.customer_info.customer_id).cloned()
        };
        let Some(customer) = customer else {
            return Err(GatewayError::ErrorList(vec![GatewayErrorDetail::new(
                "resource_not_found_error",
                format!("customer {} does not exist", spec.customer_info.customer_id),
            )]));
        };

        let mut details = Self::check_spec(spec);
        if customer.token == TOKEN_ANTIFRAUD_REJECTED {
            details.push(GatewayErrorDetail::new(
                "antifraud_info_invalid",
                "project_id was flagged by antifraud",
            ));
            details.push(GatewayErrorDetail::new(
                "antifraud_info_invalid",
                "target_amount was flagged by antifraud",
            ));
        }
        let charge = Self::order_total(spec)
            .and_then(|amount| Self::fee_for(amount).map(|fee| (amount, fee)));
        let (amount, fee) = match charge {
            Some(charge) if details.is_empty() => charge,
            Some(_) => return Err(GatewayError::ErrorList(details)),
            None => {
                details.push(GatewayErrorDetail::new(
                    "parameter_validation_error",
                    "order amount is out of range",
                ));
                return Err(GatewayError::ErrorList(details));
            }
        };

        let id = self.next_id("ord");

        let order = match customer.token.as_str() {
            TOKEN_PAID => Order {
                id,
                payment_status: Order::PAID.to_string(),
                failure_code: None,
                charges: vec![Charge {
                    amount,
                    currency: spec.currency.clone(),
                    fee,
                    payment_method: CardDetails {
                        last4: "4242".into(),
                        brand: "visa".into(),
                        name: customer.name,
                        issuer: "BANAMEX".into(),
                        exp_month: "12".into(),
                        exp_year: "30".into(),
                    },
                }],
            },
            TOKEN_INSUFFICIENT_FUNDS => Order {
                id,
                payment_status: "declined".into(),
                failure_code: Some("insufficient_funds".into()),
                charges: Vec::new(),
            },
            _ => Order {
                id,
                payment_status: "declined".into(),
                failure_code: Some("card_declined".into()),
                charges: Vec::new(),
            },
        };
        debug!(order_id = %order.id, status = %order.payment_status, "sandbox order created");
        Ok(order)
    }
}

/// Bounds every gateway call; an elapsed deadline becomes [`GatewayError::Timeout`].
pub struct TimeoutGateway {
    inner: PaymentGatewayBox,
    timeout: Duration,
}

impl TimeoutGateway {
    pub fn new(inner: PaymentGatewayBox, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl PaymentGateway for TimeoutGateway {
    async fn create_customer(&self, profile: &CustomerProfile) -> GatewayResult<Customer> {
        tokio::time::timeout(self.timeout, self.inner.create_customer(profile))
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
    }

    async fn create_order(&self, spec: &OrderSpec) -> GatewayResult<Order> {
        tokio::time::timeout(self.timeout, self.inner.create_order(spec))
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout))?
    }
}
