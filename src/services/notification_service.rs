use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("notification endpoint returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingConfirmation {
    pub booking_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub tour_title: String,
    pub start_date: NaiveDate,
    pub participants: u32,
    pub total_amount: f64,
    pub currency: String,
    pub payment_reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyRequest {
    pub booking_id: Uuid,
    pub customer_email: String,
    pub tour_id: Uuid,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationJob {
    BookingConfirmation(BookingConfirmation),
    SurveySchedule(SurveyRequest),
}

impl NotificationJob {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationJob::BookingConfirmation(_) => "booking confirmation",
            NotificationJob::SurveySchedule(_) => "survey scheduling",
        }
    }

    pub fn booking_id(&self) -> Uuid {
        match self {
            NotificationJob::BookingConfirmation(c) => c.booking_id,
            NotificationJob::SurveySchedule(s) => s.booking_id,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotifyError>;

    async fn schedule_survey(&self, request: &SurveyRequest) -> Result<(), NotifyError>;
}

/// Calls the hosted edge functions that send mail and schedule the post-trip survey.
pub struct SupabaseFunctionsNotifier {
    http: reqwest::Client,
    functions_url: String,
    service_key: String,
}

impl SupabaseFunctionsNotifier {
    pub fn new(base_url: &str, service_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            functions_url: format!("{}/functions/v1", base_url.trim_end_matches('/')),
            service_key: service_key.into(),
        }
    }

    async fn invoke<T: Serialize + Sync>(&self, function: &str, body: &T) -> Result<(), NotifyError> {
        let res = self
            .http
            .post(format!("{}/{}", self.functions_url, function))
            .bearer_auth(&self.service_key)
            .json(body)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        Err(NotifyError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Notifier for SupabaseFunctionsNotifier {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), NotifyError> {
        self.invoke("send-booking-confirmation", confirmation).await
    }

    async fn schedule_survey(&self, request: &SurveyRequest) -> Result<(), NotifyError> {
        self.invoke("schedule-survey", request).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// In-process outbox: jobs are queued by request handlers and handed out by one background
/// worker. Each job is delivered in its own task, retried per [`RetryPolicy`], so a failing
/// endpoint does not hold up the jobs behind it. Callers never wait on delivery.
#[derive(Clone)]
pub struct NotificationOutbox {
    sender: mpsc::UnboundedSender<NotificationJob>,
}

impl NotificationOutbox {
    pub fn start(notifier: Arc<dyn Notifier>, policy: RetryPolicy) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(receiver, notifier, policy));
        (Self { sender }, worker)
    }

    /// Returns `false` if the worker has stopped; the job is then dropped and logged.
    pub fn enqueue(&self, job: NotificationJob) -> bool {
        let kind = job.kind();
        let booking_id = job.booking_id();
        match self.sender.send(job) {
            Ok(()) => {
                log::debug!("Queued {} for booking {}", kind, booking_id);
                true
            }
            Err(_) => {
                log::warn!(
                    "Notification worker stopped; dropping {} for booking {}",
                    kind,
                    booking_id
                );
                false
            }
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<NotificationJob>,
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
) {
    let mut in_flight = JoinSet::new();
    while let Some(job) = receiver.recv().await {
        while in_flight.try_join_next().is_some() {}

        let notifier = Arc::clone(&notifier);
        in_flight.spawn(async move {
            deliver(notifier.as_ref(), &job, &policy).await;
        });
    }

    log::info!(
        "Notification worker shutting down, {} deliveries still running",
        in_flight.len()
    );
    while in_flight.join_next().await.is_some() {}
}

/// Attempts one job until it succeeds or the policy gives up.
pub async fn deliver(notifier: &dyn Notifier, job: &NotificationJob, policy: &RetryPolicy) -> bool {
    for attempt in 1..=policy.max_attempts {
        let result = match job {
            NotificationJob::BookingConfirmation(c) => notifier.send_booking_confirmation(c).await,
            NotificationJob::SurveySchedule(s) => notifier.schedule_survey(s).await,
        };

        match result {
            Ok(()) => {
                log::info!("Delivered {} for booking {}", job.kind(), job.booking_id());
                return true;
            }
            Err(e) => {
                log::warn!(
                    "{} for booking {} failed (attempt {}/{}): {}",
                    job.kind(),
                    job.booking_id(),
                    attempt,
                    policy.max_attempts,
                    e
                );
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.delay_after(attempt)).await;
                }
            }
        }
    }

    log::error!(
        "Giving up on {} for booking {} after {} attempts",
        job.kind(),
        job.booking_id(),
        policy.max_attempts
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyNotifier {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    impl FlakyNotifier {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: AtomicU32::new(times),
                calls: AtomicU32::new(0),
            }
        }

        fn attempt(&self) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(NotifyError::Api {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send_booking_confirmation(&self, _: &BookingConfirmation) -> Result<(), NotifyError> {
            self.attempt()
        }

        async fn schedule_survey(&self, _: &SurveyRequest) -> Result<(), NotifyError> {
            self.attempt()
        }
    }

    fn survey() -> NotificationJob {
        NotificationJob::SurveySchedule(SurveyRequest {
            booking_id: Uuid::new_v4(),
            customer_email: "guest@example.com".to_string(),
            tour_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2027, 1, 10).unwrap(),
        })
    }

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn retries_until_success() {
        let notifier = FlakyNotifier::failing(2);
        let delivered = tokio_test::block_on(deliver(&notifier, &survey(), &quick_policy(3)));

        assert!(delivered);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let notifier = FlakyNotifier::failing(10);
        let delivered = tokio_test::block_on(deliver(&notifier, &survey(), &quick_policy(3)));

        assert!(!delivered);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 3);
    }

    /// Confirmations always fail; surveys go through.
    #[derive(Default)]
    struct BrokenMailer {
        confirmation_calls: AtomicU32,
        surveys: AtomicU32,
    }

    #[async_trait]
    impl Notifier for BrokenMailer {
        async fn send_booking_confirmation(&self, _: &BookingConfirmation) -> Result<(), NotifyError> {
            self.confirmation_calls.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Request("connection reset".to_string()))
        }

        async fn schedule_survey(&self, _: &SurveyRequest) -> Result<(), NotifyError> {
            self.surveys.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn confirmation() -> NotificationJob {
        NotificationJob::BookingConfirmation(BookingConfirmation {
            booking_id: Uuid::new_v4(),
            customer_name: "Neema Lyimo".to_string(),
            customer_email: "neema@example.com".to_string(),
            tour_title: "3-Day Tarangire Safari".to_string(),
            start_date: NaiveDate::from_ymd_opt(2027, 1, 10).unwrap(),
            participants: 2,
            total_amount: 2250.0,
            currency: "USD".to_string(),
            payment_reference: "3C679366HH908993F".to_string(),
        })
    }

    #[test]
    fn failing_job_does_not_block_the_queue() {
        tokio_test::block_on(async {
            let notifier = Arc::new(BrokenMailer::default());
            let policy = RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_secs(5),
            };
            let (outbox, _worker) = NotificationOutbox::start(notifier.clone(), policy);

            assert!(outbox.enqueue(confirmation()));
            assert!(outbox.enqueue(survey()));

            for _ in 0..100 {
                if notifier.surveys.load(Ordering::SeqCst) == 1 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }

            // The confirmation is still waiting out its first backoff.
            assert_eq!(notifier.surveys.load(Ordering::SeqCst), 1);
            assert_eq!(notifier.confirmation_calls.load(Ordering::SeqCst), 1);
        });
    }

    #[test]
    fn outbox_delivers_in_background() {
        tokio_test::block_on(async {
            let notifier = Arc::new(FlakyNotifier::failing(1));
            let (outbox, worker) = NotificationOutbox::start(notifier.clone(), quick_policy(3));

            assert!(outbox.enqueue(survey()));
            drop(outbox);
            worker.await.unwrap();

            assert_eq!(notifier.calls.load(Ordering::SeqCst), 2);
        });
    }
}
