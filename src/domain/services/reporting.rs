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

use super::detector::Detector;
use crate::domain::serializer::serialize_report;
use crate::domain::{InventoryReport, PublishError, PublishTarget, ReportError, RetryPolicy};
use crate::ports::{DataPublisher, InventoryReportingService};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};

/// Where the reporting job is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Building,
    Sending { attempt: u32 },
    Retrying { attempt: u32 },
    Succeeded { attempts: u32 },
    GaveUp { attempts: u32 },
}

/// Result of one build-and-send cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Delivered { attempts: u32 },
    GaveUp { attempts: u32 },
}

/// Domain service that builds inventory reports and delivers them
///
/// Delivery failures are retried with a fixed delay and never escape a
/// cycle; the next timer tick simply starts over.
pub struct InventoryCollectionService {
    detector: Arc<Detector>,
    publisher: Arc<dyn DataPublisher>,
    target: PublishTarget,
    retry: RetryPolicy,
    include_priority: bool,
    state: Mutex<JobState>,
}

impl InventoryCollectionService {
    /// Create a new inventory collection service
    ///
    /// # Arguments
    /// * `detector` - Collector facade for this host
    /// * `publisher` - Where payloads are delivered
    /// * `target` - Endpoint and credentials
    /// * `retry` - Attempts per cycle and delay between them
    /// * `include_priority` - Whether envelopes carry `results_priority`
    pub fn new(
        detector: Arc<Detector>,
        publisher: Arc<dyn DataPublisher>,
        target: PublishTarget,
        retry: RetryPolicy,
        include_priority: bool,
    ) -> Self {
        Self {
            detector,
            publisher,
            target,
            retry,
            include_priority,
            state: Mutex::new(JobState::Idle),
        }
    }

    /// Current job state
    pub fn state(&self) -> JobState {
        self.state.lock().map(|state| *state).unwrap_or(JobState::Idle)
    }

    fn transition(&self, next: JobState) {
        if let Ok(mut state) = self.state.lock() {
            debug!("Reporting job: {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    async fn send_with_retry(&self, payload: &str) -> CycleOutcome {
        let max_tries = self.retry.max_tries.max(1);
        let endpoint = self.target.endpoint();

        for attempt in 1..=max_tries {
            self.transition(JobState::Sending { attempt });

            match self.publish_payload(payload).await {
                Ok(()) => {
                    self.transition(JobState::Succeeded { attempts: attempt });
                    info!("Report delivered to {} (attempt {})", endpoint, attempt);
                    return CycleOutcome::Delivered { attempts: attempt };
                }
                Err(e) => {
                    warn!(
                        "Report delivery to {} failed (attempt {}/{}): {}",
                        endpoint, attempt, max_tries, e
                    );
                    if let Some(body) = e.server_body() {
                        warn!("Server response: {}", body);
                    }

                    if attempt < max_tries {
                        self.transition(JobState::Retrying { attempt });
                        tokio::time::sleep(self.retry.retry_interval).await;
                    }
                }
            }
        }

        self.transition(JobState::GaveUp {
            attempts: max_tries,
        });
        error!(
            "Giving up on report delivery to {} after {} attempts",
            endpoint, max_tries
        );
        CycleOutcome::GaveUp {
            attempts: max_tries,
        }
    }
}

#[async_trait]
impl InventoryReportingService for InventoryCollectionService {
    async fn collect_report(&self) -> InventoryReport {
        self.detector.collect_all().await
    }

    async fn build_payload(&self) -> Result<String, ReportError> {
        let report = self.collect_report().await;
        serialize_report(&report, self.include_priority)
    }

    async fn publish_payload(&self, payload: &str) -> Result<(), PublishError> {
        self.publisher.publish(payload, &self.target).await
    }

    async fn run_cycle(&self) -> CycleOutcome {
        self.transition(JobState::Building);

        let payload = match self.build_payload().await {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to build report: {}", e);
                self.transition(JobState::GaveUp { attempts: 0 });
                return CycleOutcome::GaveUp { attempts: 0 };
            }
        };

        self.send_with_retry(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collectors::{FibreChannelProbe, HostProfile};
    use crate::testing::{
        FakeCommandExecutor, FakeInstrumentation, FakeRegistry, RecordingPublisher,
    };
    use std::time::{Duration, Instant};

    fn service(publisher: Arc<RecordingPublisher>, max_tries: u32) -> InventoryCollectionService {
        let detector = Detector::with_profile(
            Arc::new(FakeInstrumentation::new()),
            Arc::new(FakeRegistry::new()),
            FibreChannelProbe::new(
                Arc::new(FakeCommandExecutor::new()),
                "fcinfo",
                Duration::from_secs(1),
            ),
            HostProfile::default(),
        );
        InventoryCollectionService::new(
            Arc::new(detector),
            publisher,
            PublishTarget {
                base_url: "http://ralph.local".to_string(),
                ..Default::default()
            },
            RetryPolicy {
                max_tries,
                retry_interval: Duration::from_millis(20),
            },
            true,
        )
    }

    #[tokio::test]
    async fn test_retries_until_delivered() {
        let publisher = Arc::new(RecordingPublisher::failing_first(2));
        let service = service(publisher.clone(), 3);

        let started = Instant::now();
        let outcome = service.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::Delivered { attempts: 3 });
        assert_eq!(publisher.attempts(), 3);
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(service.state(), JobState::Succeeded { attempts: 3 });

        // every attempt sends the same payload
        let payloads = publisher.payloads();
        assert!(payloads.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_tries() {
        let publisher = Arc::new(RecordingPublisher::failing_first(10));
        let service = service(publisher.clone(), 3);

        let outcome = service.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::GaveUp { attempts: 3 });
        assert_eq!(publisher.attempts(), 3);
        assert_eq!(service.state(), JobState::GaveUp { attempts: 3 });
    }

    #[tokio::test]
    async fn test_first_attempt_success_does_not_sleep() {
        let publisher = Arc::new(RecordingPublisher::failing_first(0));
        let service = service(publisher.clone(), 3);
        assert_eq!(service.state(), JobState::Idle);

        let outcome = service.run_cycle().await;
        assert_eq!(outcome, CycleOutcome::Delivered { attempts: 1 });

        let payload: serde_json::Value = serde_json::from_str(&publisher.payloads()[0]).unwrap();
        assert_eq!(payload["data"]["plugin"], "donpedro");
        assert!(payload["data"].get("results_priority").is_some());
    }
}
