use crate::domain::gateway::Order;
use crate::domain::money::Money;
use crate::domain::outcome::{Decline, Outcome, Settlement};
use crate::error::{CheckoutError, Result};

/// Reads the gateway's verdict out of a returned order.
pub struct OutcomeClassifier;

impl OutcomeClassifier {
    /// A `paid` order is approved and settles on its first charge; anything
    /// else is a decline. A decline without a failure code is recorded under
    /// the order's payment status. A paid order without charges breaks the
    /// gateway contract and is reported as an invariant violation.
    pub fn classify(order: &Order) -> Result<Outcome> {
        if !order.is_paid() {
            let failure_code = order
                .failure_code
                .clone()
                .unwrap_or_else(|| order.payment_status.clone());
            return Ok(Outcome::Declined(Decline {
                transaction_id: order.id.clone(),
                failure_code,
            }));
        }

        let charge = order.charges.first().ok_or_else(|| {
            CheckoutError::InvariantViolation(format!(
                "order {} is paid but carries no charges",
                order.id
            ))
        })?;

        Ok(Outcome::Approved(Settlement {
            transaction_id: order.id.clone(),
            gross: Money::from_minor_units(charge.amount, charge.currency.clone()),
            fee: Money::from_minor_units(charge.fee, charge.currency.clone()),
            card: charge.payment_method.clone(),
        }))
    }
}
