/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use crate::ports::InventoryReportingService;
use log::{debug, info};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Recurring timer driving the reporting job
///
/// Each cycle is awaited to completion before the next tick is taken, so
/// cycles never overlap. The first cycle runs immediately.
pub struct ReportScheduler {
    service: Arc<dyn InventoryReportingService>,
    interval: Duration,
}

impl ReportScheduler {
    pub fn new(service: Arc<dyn InventoryReportingService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Run cycles until Ctrl-C
    pub async fn run(&self) -> u64 {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run cycles until `shutdown` resolves; returns the number of cycles run
    ///
    /// Shutdown is observed between cycles only.
    pub async fn run_until<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles = 0;
        info!("Reporting every {}s", self.interval.as_secs());

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested after {} cycles", cycles);
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = self.service.run_cycle().await;
                    cycles += 1;
                    debug!("Cycle {} finished: {:?}", cycles, outcome);
                }
            }
        }

        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CycleOutcome, InventoryReport, PublishError, ReportError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingService {
        cycles: AtomicU32,
    }

    #[async_trait]
    impl InventoryReportingService for CountingService {
        async fn collect_report(&self) -> InventoryReport {
            InventoryReport::default()
        }

        async fn build_payload(&self) -> Result<String, ReportError> {
            Ok("{}".to_string())
        }

        async fn publish_payload(&self, _payload: &str) -> Result<(), PublishError> {
            Ok(())
        }

        async fn run_cycle(&self) -> CycleOutcome {
            let attempts = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
            CycleOutcome::Delivered { attempts }
        }
    }

    #[tokio::test]
    async fn test_first_cycle_runs_immediately() {
        let service = Arc::new(CountingService::default());
        let scheduler = ReportScheduler::new(service.clone(), Duration::from_secs(3600));

        let cycles = scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(cycles, 1);
        assert_eq!(service.cycles.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cycles_repeat_on_interval() {
        let service = Arc::new(CountingService::default());
        let scheduler = ReportScheduler::new(service.clone(), Duration::from_millis(20));

        let cycles = scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(150)))
            .await;

        assert!(cycles >= 3);
    }
}
