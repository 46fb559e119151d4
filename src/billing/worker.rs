use anyhow::{anyhow, Result};
use tokio::sync::mpsc::{channel, Sender};
use tracing::{error, info};

use super::processor::BillingProcessor;

/// key: billing-worker -> serialized billing runs
#[derive(Debug)]
pub enum BillingJob {
    ProcessMonth { year: i32, month: u32 },
}

/// key: billing-worker-handle -> enqueue interface
#[derive(Clone)]
pub struct BillingRunHandle {
    sender: Sender<BillingJob>,
}

impl BillingRunHandle {
    pub async fn dispatch(&self, job: BillingJob) -> Result<()> {
        self.sender
            .send(job)
            .await
            .map_err(|err| anyhow!("failed to enqueue billing job: {err}"))
    }
}

/// Spawn the worker that drains billing jobs one at a time, so no two
/// passes ever overlap on the same customer set.
pub fn start_billing_worker(processor: BillingProcessor) -> BillingRunHandle {
    let (tx, mut rx) = channel(64);
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match job {
                BillingJob::ProcessMonth { year, month } => {
                    if let Err(err) = processor.process_month(year, month).await {
                        error!(?err, year, month, "billing pass failed");
                    } else {
                        info!(year, month, "billing pass completed");
                    }
                }
            }
        }
    });

    BillingRunHandle { sender: tx }
}
