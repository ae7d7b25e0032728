use crate::domain::gateway::{
    AntifraudInfo, ChargeRequest, Customer, CustomerInfo, LineItem, OrderSpec,
    PaymentMethodRequest,
};
use crate::domain::money::to_minor_units;
use crate::domain::pledge::{Pledge, Project};
use crate::error::Result;

/// Assembles the gateway order for a stored pledge.
pub struct OrderBuilder;

impl OrderBuilder {
    /// Pure construction. The only failure is an amount that cannot be
    /// expressed in minor units, which is an invariant violation.
    pub fn build(pledge: &Pledge, project: &Project, customer: &Customer) -> Result<OrderSpec> {
        Ok(OrderSpec {
            currency: project.currency.clone(),
            customer_info: CustomerInfo {
                customer_id: customer.id.clone(),
            },
            line_items: vec![LineItem {
                name: format!("{}-{}", pledge.id, parameterize(&project.name)),
                unit_price: to_minor_units(pledge.value)?,
                quantity: 1,
                antifraud_info: AntifraudInfo {
                    project_id: format!("{}_{}", project.id, project.slug),
                    starts_at: project.publication_date.timestamp(),
                    ends_at: project.expires_at.timestamp(),
                    target_amount: to_minor_units(project.goal)?,
                },
            }],
            charges: vec![ChargeRequest {
                payment_method: PaymentMethodRequest::Default,
            }],
        })
    }
}

/// URL-safe form of a name: lowercase ASCII words joined by hyphens.
pub fn parameterize(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        match transliterate(c) {
            Some(ascii) => {
                if pending_separator && !slug.is_empty() {
                    slug.push('-');
                }
                pending_separator = false;
                slug.push(ascii);
            }
            None => pending_separator = true,
        }
    }
    slug
}

fn transliterate(c: char) -> Option<char> {
    if c.is_ascii_alphanumeric() {
        return Some(c.to_ascii_lowercase());
    }
    let folded = match c.to_lowercase().next()? {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => return None,
    };
    Some(folded)
}
