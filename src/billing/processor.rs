use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config;

use super::adapters::{CreditCardCharger, CustomerSource};
use super::models::BillingPeriod;

/// key: billing-processor -> monthly charge pass over all customers
pub struct BillingProcessor {
    source: Arc<dyn CustomerSource>,
    charger: Arc<dyn CreditCardCharger>,
    max_failures: u32,
}

impl BillingProcessor {
    pub fn new(source: Arc<dyn CustomerSource>, charger: Arc<dyn CreditCardCharger>) -> Self {
        Self {
            source,
            charger,
            max_failures: *config::BILLING_MAX_CHARGE_FAILURES,
        }
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    /// Run one billing pass for the given period. Customers are handled
    /// independently; a charger fault for one customer never aborts the
    /// rest of the pass.
    pub async fn process_month(&self, year: i32, month: u32) -> Result<()> {
        let period = BillingPeriod::new(year, month)?;
        let customers = self.source.customers().await?;
        debug!(
            year = period.year,
            month = period.month,
            customers = customers.len(),
            "starting billing pass"
        );

        for handle in customers {
            let mut customer = handle.write().await;
            let due = match customer.subscription.as_ref() {
                None => {
                    debug!(customer = %customer.id, "no subscription, skipping");
                    continue;
                }
                // Cancelled subscriptions are terminal; dunning stops.
                Some(subscription) if !subscription.is_current() => {
                    debug!(customer = %customer.id, "subscription cancelled, skipping");
                    continue;
                }
                Some(subscription) => subscription.needs_billing(period),
            };
            if !due {
                debug!(customer = %customer.id, "paid through period, skipping");
                continue;
            }

            let charged = match self.charger.charge_customer(&customer).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(
                        ?err,
                        customer = %customer.id,
                        "charge attempt produced no outcome, leaving dunning state untouched"
                    );
                    continue;
                }
            };

            let customer_id = customer.id;
            if let Some(subscription) = customer.subscription.as_mut() {
                subscription.record_charged_result(charged, self.max_failures);
                if charged {
                    info!(customer = %customer_id, "charge collected, subscription renewed");
                } else if subscription.is_current() {
                    warn!(customer = %customer_id, "charge declined, failure recorded");
                } else {
                    warn!(
                        customer = %customer_id,
                        failures = self.max_failures,
                        "subscription cancelled after repeated charge failures"
                    );
                }
            }
        }

        Ok(())
    }
}
