use crate::jobs::BatchOutcome;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// When a job fires, as an explicit next-fire-time computation
///
/// `Every` measures from the previous fire (wall-clock independent);
/// `DailyAt`/`WeeklyAt` pin firings to a UTC time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fixed period since the last firing
    Every(Duration),

    /// Once per day at the given UTC time
    DailyAt { hour: u32, minute: u32 },

    /// Once per week on the given day at the given UTC time
    WeeklyAt {
        weekday: Weekday,
        hour: u32,
        minute: u32,
    },
}

impl Cadence {
    /// Compute the next fire instant strictly after `after`
    pub fn next_fire(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Cadence::Every(period) => after + period,
            Cadence::DailyAt { hour, minute } => {
                let candidate = at_time(after, 0, hour, minute);
                if candidate > after {
                    candidate
                } else {
                    candidate + Duration::days(1)
                }
            }
            Cadence::WeeklyAt {
                weekday,
                hour,
                minute,
            } => {
                let days_ahead = (weekday.num_days_from_monday() + 7
                    - after.weekday().num_days_from_monday())
                    % 7;
                let candidate = at_time(after, days_ahead as i64, hour, minute);
                if candidate > after {
                    candidate
                } else {
                    candidate + Duration::days(7)
                }
            }
        }
    }
}

fn at_time(base: DateTime<Utc>, days_ahead: i64, hour: u32, minute: u32) -> DateTime<Utc> {
    let date = base.date_naive() + Duration::days(days_ahead);
    let time = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time).and_utc()
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Cadence::Every(period) => write!(f, "every {}s", period.num_seconds()),
            Cadence::DailyAt { hour, minute } => {
                write!(f, "daily at {:02}:{:02} UTC", hour, minute)
            }
            Cadence::WeeklyAt {
                weekday,
                hour,
                minute,
            } => write!(f, "weekly on {} at {:02}:{:02} UTC", weekday, hour, minute),
        }
    }
}

/// A periodic task the scheduler can drive
#[async_trait::async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<BatchOutcome, Box<dyn std::error::Error + Send + Sync>>;
}

/// Result of one firing attempt
#[derive(Debug)]
pub enum FireOutcome {
    /// The run finished; counts are in the outcome
    Completed(BatchOutcome),

    /// A previous run of the same job was still in flight; this firing was
    /// dropped, not queued
    Skipped,

    /// The run returned an error; it was logged and swallowed here
    Failed,
}

/// One registered job plus its self-exclusion guard
#[derive(Clone)]
pub struct JobHandle {
    job: Arc<dyn ScheduledJob>,
    in_flight: Arc<Mutex<()>>,
}

impl JobHandle {
    pub fn new(job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            job,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Fire the job once
    ///
    /// Mutually exclusive with itself: if the previous run has not finished
    /// the firing is skipped. Errors never escape this boundary, so the
    /// timer loop driving the handle survives any job failure.
    pub async fn fire(&self) -> FireOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!(
                job = self.job.name(),
                "previous run still in flight, skipping this firing"
            );
            return FireOutcome::Skipped;
        };

        tracing::info!(job = self.job.name(), "job starting");

        match self.job.run().await {
            Ok(outcome) => {
                tracing::info!(
                    job = self.job.name(),
                    succeeded = outcome.succeeded,
                    failed = outcome.failed(),
                    "job completed"
                );
                FireOutcome::Completed(outcome)
            }
            Err(e) => {
                tracing::error!(job = self.job.name(), error = %e, "job failed");
                FireOutcome::Failed
            }
        }
    }
}

/// Drives registered jobs on their cadences, one timer task per job
///
/// Jobs run independently: a slow or failing job never delays another, and
/// the scheduler loop itself never terminates because of one.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job and start its timer loop
    pub fn register(&mut self, job: Arc<dyn ScheduledJob>, cadence: Cadence) {
        tracing::info!(job = job.name(), %cadence, "job registered");

        let handle = JobHandle::new(job);
        let task = tokio::spawn(async move {
            let mut next = cadence.next_fire(Utc::now());
            loop {
                let delay = (next - Utc::now())
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO);
                tokio::time::sleep(delay).await;

                // Fire on a separate task so the timer grid stays fixed; the
                // handle's try-lock turns an overlapping firing into a skip
                let firing = handle.clone();
                tokio::spawn(async move {
                    firing.fire().await;
                });

                next = cadence.next_fire(Utc::now());
            }
        });
        self.tasks.push(task);
    }

    /// Stop all timer loops; in-flight runs are left to finish on their own
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::sync::Notify;

    #[test]
    fn test_interval_cadence_measures_from_last_fire() {
        let after = Utc.with_ymd_and_hms(2024, 5, 8, 10, 2, 13).unwrap();
        let next = Cadence::Every(Duration::minutes(5)).next_fire(after);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 8, 10, 7, 13).unwrap());
    }

    #[test]
    fn test_daily_cadence_same_day_and_rollover() {
        let cadence = Cadence::DailyAt { hour: 2, minute: 0 };

        let before_two = Utc.with_ymd_and_hms(2024, 5, 8, 1, 15, 0).unwrap();
        assert_eq!(
            cadence.next_fire(before_two),
            Utc.with_ymd_and_hms(2024, 5, 8, 2, 0, 0).unwrap()
        );

        let after_two = Utc.with_ymd_and_hms(2024, 5, 8, 3, 0, 0).unwrap();
        assert_eq!(
            cadence.next_fire(after_two),
            Utc.with_ymd_and_hms(2024, 5, 9, 2, 0, 0).unwrap()
        );

        // Exactly at the fire time: next fire is strictly after
        let at_two = Utc.with_ymd_and_hms(2024, 5, 8, 2, 0, 0).unwrap();
        assert_eq!(
            cadence.next_fire(at_two),
            Utc.with_ymd_and_hms(2024, 5, 9, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_weekly_cadence() {
        let cadence = Cadence::WeeklyAt {
            weekday: Weekday::Sun,
            hour: 1,
            minute: 0,
        };

        // 2024-05-08 is a Wednesday; next Sunday is 2024-05-12
        let wednesday = Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap();
        assert_eq!(
            cadence.next_fire(wednesday),
            Utc.with_ymd_and_hms(2024, 5, 12, 1, 0, 0).unwrap()
        );

        // Sunday after the fire time rolls to the following week
        let sunday_noon = Utc.with_ymd_and_hms(2024, 5, 12, 12, 0, 0).unwrap();
        assert_eq!(
            cadence.next_fire(sunday_noon),
            Utc.with_ymd_and_hms(2024, 5, 19, 1, 0, 0).unwrap()
        );
    }

    struct BlockingJob {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl ScheduledJob for BlockingJob {
        fn name(&self) -> &'static str {
            "blocking"
        }

        async fn run(&self) -> Result<BatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(BatchOutcome::from_count(1))
        }
    }

    struct FailingJob;

    #[async_trait::async_trait]
    impl ScheduledJob for FailingJob {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self) -> Result<BatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
            Err("store unreachable".into())
        }
    }

    #[tokio::test]
    async fn test_overlapping_firing_is_skipped_not_queued() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let handle = JobHandle::new(Arc::new(BlockingJob {
            started: started.clone(),
            release: release.clone(),
        }));

        let first = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.fire().await })
        };
        started.notified().await;

        // Second firing arrives while the first run is still in flight
        assert!(matches!(handle.fire().await, FireOutcome::Skipped));

        release.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            FireOutcome::Completed(outcome) if outcome.succeeded == 1
        ));

        // With the first run finished, firing works again
        let handle2 = handle.clone();
        let second = tokio::spawn(async move { handle2.fire().await });
        started.notified().await;
        release.notify_one();
        assert!(matches!(second.await.unwrap(), FireOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_job_failure_is_contained() {
        let handle = JobHandle::new(Arc::new(FailingJob));
        assert!(matches!(handle.fire().await, FireOutcome::Failed));
        // The guard was released; the next firing is not blocked
        assert!(matches!(handle.fire().await, FireOutcome::Failed));
    }
}
