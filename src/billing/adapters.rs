use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::Customer;

/// Shared handle to a customer record. The processor takes the write half
/// while it feeds a charge outcome back into the subscription; sources
/// only ever hand handles out.
pub type CustomerHandle = Arc<RwLock<Customer>>;

/// key: billing-charger -> payment provider seam
#[async_trait]
pub trait CreditCardCharger: Send + Sync {
    /// Attempt to collect one billing period's payment. `Ok(false)` is a
    /// decline; `Err` is a transport fault that produced no outcome at
    /// all. Retry policy lives above this seam, across billing periods.
    async fn charge_customer(&self, customer: &Customer) -> Result<bool>;
}

/// key: billing-customer-source -> read-only customer feed
#[async_trait]
pub trait CustomerSource: Send + Sync {
    async fn customers(&self) -> Result<Vec<CustomerHandle>>;
}

/// In-memory source for tests and single-process deployments.
pub struct StaticCustomerSource {
    customers: Vec<CustomerHandle>,
}

impl StaticCustomerSource {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self {
            customers: customers
                .into_iter()
                .map(|customer| Arc::new(RwLock::new(customer)))
                .collect(),
        }
    }

    pub fn from_handles(customers: Vec<CustomerHandle>) -> Self {
        Self { customers }
    }

    pub fn handles(&self) -> &[CustomerHandle] {
        &self.customers
    }
}

#[async_trait]
impl CustomerSource for StaticCustomerSource {
    async fn customers(&self) -> Result<Vec<CustomerHandle>> {
        Ok(self.customers.clone())
    }
}
