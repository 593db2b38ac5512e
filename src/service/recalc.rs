//! Asynchronous recalculation queue.
//!
//! Triggers are submitted to one of several bounded channels, chosen by
//! employee id, so all jobs of one employee run in submission order on a
//! single worker while different employees proceed in parallel.
//!
//! ```text
//! trigger_*() ──► PendingSet (coalesce) ──► shard = hash(employee) % N
//!                                                  │
//!                        mpsc::channel(capacity)   ▼
//!                                         worker task per shard
//!                                                  │ spawn_blocking
//!                                                  ▼
//!                                 CalculationService::run_job (+ retry)
//! ```

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::QueueSettings;
use crate::error::{EngineError, EngineResult};

use super::CalculationService;

/// A unit of recalculation work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecalcJob {
    /// Recalculate one employee-day.
    Day {
        /// The employee.
        employee_id: String,
        /// The day.
        date: NaiveDate,
    },
    /// Re-aggregate one employee-month.
    Month {
        /// The employee.
        employee_id: String,
        /// Calendar year.
        year: i32,
        /// Calendar month (1-12).
        month: u32,
    },
}

impl RecalcJob {
    /// The employee the job belongs to.
    pub fn employee_id(&self) -> &str {
        match self {
            RecalcJob::Day { employee_id, .. } | RecalcJob::Month { employee_id, .. } => {
                employee_id
            }
        }
    }
}

/// Jobs that are queued but not yet started.
#[derive(Debug, Default)]
struct PendingSet {
    jobs: Mutex<HashSet<RecalcJob>>,
}

impl PendingSet {
    /// Returns false if an identical job is already waiting.
    fn insert(&self, job: &RecalcJob) -> bool {
        self.jobs.lock().insert(job.clone())
    }

    fn release(&self, job: &RecalcJob) {
        self.jobs.lock().remove(job);
    }

    fn contains(&self, job: &RecalcJob) -> bool {
        self.jobs.lock().contains(job)
    }

    fn len(&self) -> usize {
        self.jobs.lock().len()
    }
}

/// Bounded, sharded work queue running recalculations in the background.
///
/// Must be started inside a tokio runtime.
pub struct RecalcQueue {
    senders: RwLock<Vec<mpsc::Sender<RecalcJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    pending: Arc<PendingSet>,
}

impl RecalcQueue {
    /// Spawns one worker per shard.
    pub fn start(service: Arc<CalculationService>, settings: QueueSettings) -> Self {
        let shards = settings.shards.max(1);
        let pending = Arc::new(PendingSet::default());
        let mut senders = Vec::with_capacity(shards);
        let mut workers = Vec::with_capacity(shards);

        for shard in 0..shards {
            let (tx, rx) = mpsc::channel(settings.capacity.max(1));
            senders.push(tx);
            workers.push(tokio::spawn(run_worker(
                shard,
                rx,
                service.clone(),
                pending.clone(),
                settings,
            )));
        }

        info!(shards, capacity = settings.capacity, "Recalculation queue started");
        Self {
            senders: RwLock::new(senders),
            workers: Mutex::new(workers),
            pending,
        }
    }

    /// Queues a job unless an identical one is already waiting.
    ///
    /// Returns `Ok(false)` if the job was coalesced. Waits for channel
    /// capacity when the shard is full.
    pub async fn submit(&self, job: RecalcJob) -> EngineResult<bool> {
        let sender = {
            let senders = self.senders.read();
            if senders.is_empty() {
                return Err(EngineError::QueueClosed);
            }
            senders[shard_index(job.employee_id(), senders.len())].clone()
        };

        if !self.pending.insert(&job) {
            debug!(?job, "Recalc job coalesced");
            return Ok(false);
        }
        if let Err(mpsc::error::SendError(job)) = sender.send(job).await {
            self.pending.release(&job);
            return Err(EngineError::QueueClosed);
        }
        Ok(true)
    }

    /// Schedules recalculation of one employee-day.
    ///
    /// Once the day is recalculated, the worker also recalculates the
    /// neighbouring days sharing a midnight shift with it (see
    /// [`CalculationService::linked_days`]) unless they are queued anyway.
    /// Their months are not re-aggregated.
    pub async fn trigger_recalc(&self, employee_id: &str, date: NaiveDate) -> EngineResult<()> {
        self.submit(RecalcJob::Day {
            employee_id: employee_id.to_string(),
            date,
        })
        .await?;
        Ok(())
    }

    /// Schedules recalculation of every day in `from..=to`, followed by the
    /// months those days fall in, in calendar order.
    pub async fn trigger_recalc_range(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<()> {
        if from > to {
            return Err(EngineError::InvalidPeriod {
                message: format!("range start {} is after its end {}", from, to),
            });
        }
        for date in from.iter_days().take_while(|d| *d <= to) {
            self.trigger_recalc(employee_id, date).await?;
        }
        self.trigger_month_range(employee_id, (from.year(), from.month()), (to.year(), to.month()))
            .await
    }

    /// Schedules re-aggregation of the months `from..=to` (as `(year, month)`)
    /// in calendar order, so each month sees its predecessor's carryover.
    pub async fn trigger_month_range(
        &self,
        employee_id: &str,
        from: (i32, u32),
        to: (i32, u32),
    ) -> EngineResult<()> {
        let valid = |(_, m): (i32, u32)| (1..=12).contains(&m);
        if !valid(from) || !valid(to) || from > to {
            return Err(EngineError::InvalidPeriod {
                message: format!(
                    "invalid month range {}-{:02} to {}-{:02}",
                    from.0, from.1, to.0, to.1
                ),
            });
        }

        let (mut year, mut month) = from;
        while (year, month) <= to {
            self.submit(RecalcJob::Month {
                employee_id: employee_id.to_string(),
                year,
                month,
            })
            .await?;
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        Ok(())
    }

    /// Number of queued jobs that have not started yet.
    pub fn pending_jobs(&self) -> usize {
        self.pending.len()
    }

    /// Stops accepting jobs, lets the workers drain their queues and waits
    /// for them to finish.
    pub async fn shutdown(&self) {
        self.senders.write().clear();
        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Recalc worker terminated abnormally");
            }
        }
        info!("Recalculation queue stopped");
    }
}

fn shard_index(employee_id: &str, shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    employee_id.hash(&mut hasher);
    (hasher.finish() % shards as u64) as usize
}

async fn run_worker(
    shard: usize,
    mut jobs: mpsc::Receiver<RecalcJob>,
    service: Arc<CalculationService>,
    pending: Arc<PendingSet>,
    settings: QueueSettings,
) {
    while let Some(job) = jobs.recv().await {
        pending.release(&job);
        if !process(&service, job.clone(), &settings).await {
            continue;
        }
        for linked in linked_jobs(&service, &job).await {
            if !pending.contains(&linked) {
                process(&service, linked, &settings).await;
            }
        }
    }
    debug!(shard, "Recalc worker stopped");
}

/// Day jobs for the neighbours that share a midnight shift with a day job.
async fn linked_jobs(service: &Arc<CalculationService>, job: &RecalcJob) -> Vec<RecalcJob> {
    let RecalcJob::Day { employee_id, date } = job else {
        return Vec::new();
    };
    let lookup_service = service.clone();
    let (lookup_employee, lookup_date) = (employee_id.clone(), *date);
    let days = tokio::task::spawn_blocking(move || {
        lookup_service.linked_days(&lookup_employee, lookup_date)
    })
    .await;

    match days {
        Ok(Ok(days)) => days
            .into_iter()
            .map(|date| RecalcJob::Day {
                employee_id: employee_id.clone(),
                date,
            })
            .collect(),
        Ok(Err(e)) => {
            warn!(?job, error = %e, "Linked days not recalculated");
            Vec::new()
        }
        Err(e) => {
            error!(?job, error = %e, "Linked day lookup panicked");
            Vec::new()
        }
    }
}

/// Runs a job with retries. Returns true if it completed.
async fn process(
    service: &Arc<CalculationService>,
    job: RecalcJob,
    settings: &QueueSettings,
) -> bool {
    let mut attempt: u32 = 1;
    loop {
        let worker_service = service.clone();
        let worker_job = job.clone();
        let result =
            tokio::task::spawn_blocking(move || worker_service.run_job(&worker_job)).await;

        match result {
            Ok(Ok(())) => {
                debug!(?job, attempt, "Recalc job completed");
                return true;
            }
            Ok(Err(e)) if e.is_transient() && attempt < settings.max_attempts => {
                let delay_ms = backoff_ms(settings.base_backoff_ms, attempt);
                warn!(?job, attempt, delay_ms, error = %e, "Recalc job failed, retrying");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            Ok(Err(e)) if e.is_transient() => {
                error!(?job, attempts = attempt, error = %e, "Recalc job failed, giving up");
                return false;
            }
            Ok(Err(e)) => {
                warn!(?job, error = %e, "Recalc job rejected");
                return false;
            }
            Err(e) => {
                error!(?job, error = %e, "Recalc job panicked");
                return false;
            }
        }
    }
}

/// Delay before retry number `attempt`: the base doubled per earlier retry.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HolidayAverageSettings;
    use crate::models::{
        Booking, BookingCategory, BookingDirection, CreditType, DayPlanConfig, ErrorCode,
        MonthlyEvaluationRules,
    };
    use crate::service::Collaborators;
    use crate::store::{MemoryStore, ValueStore};

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day_job(date: &str) -> RecalcJob {
        RecalcJob::Day {
            employee_id: "emp_001".to_string(),
            date: make_date(date),
        }
    }

    fn settings() -> QueueSettings {
        QueueSettings {
            shards: 2,
            capacity: 16,
            max_attempts: 3,
            base_backoff_ms: 1,
        }
    }

    fn setup() -> (Arc<MemoryStore>, Arc<CalculationService>) {
        let store = Arc::new(MemoryStore::new());
        store.set_default_day_plan(DayPlanConfig::with_target("std", 480));
        store.set_default_evaluation_rules(MonthlyEvaluationRules {
            credit_type: CreditType::CompleteCarryover,
            ..Default::default()
        });
        let service = Arc::new(CalculationService::new(
            Collaborators::from_store(store.clone()),
            HolidayAverageSettings::default(),
        ));
        (store, service)
    }

    fn work(store: &MemoryStore, date: &str, from: i32, to: i32) {
        for (direction, time) in [(BookingDirection::In, from), (BookingDirection::Out, to)] {
            store.add_booking(Booking::new(
                "emp_001",
                make_date(date),
                direction,
                BookingCategory::Work,
                time,
            ));
        }
    }

    #[test]
    fn test_pending_set_coalesces_until_released() {
        let pending = PendingSet::default();
        assert!(pending.insert(&day_job("2026-03-02")));
        assert!(!pending.insert(&day_job("2026-03-02")));
        assert!(pending.insert(&day_job("2026-03-03")));
        assert_eq!(pending.len(), 2);

        pending.release(&day_job("2026-03-02"));
        assert!(pending.insert(&day_job("2026-03-02")));
    }

    #[test]
    fn test_shard_index_is_stable_per_employee() {
        let first = shard_index("emp_001", 4);
        assert_eq!(first, shard_index("emp_001", 4));
        assert!(first < 4);
        assert_eq!(shard_index("emp_001", 1), 0);
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_ms(100, 1), 100);
        assert_eq!(backoff_ms(100, 2), 200);
        assert_eq!(backoff_ms(100, 3), 400);
        assert_eq!(backoff_ms(u64::MAX, 5), u64::MAX);
    }

    #[tokio::test]
    async fn test_range_recalc_fills_days_and_month() {
        let (store, service) = setup();
        work(&store, "2026-03-02", 480, 1020);
        work(&store, "2026-03-03", 480, 990);

        let queue = RecalcQueue::start(service, settings());
        queue
            .trigger_recalc_range("emp_001", make_date("2026-03-02"), make_date("2026-03-03"))
            .await
            .unwrap();
        queue.shutdown().await;

        let monday = store.daily_value("emp_001", make_date("2026-03-02")).unwrap();
        assert_eq!(monday.map(|v| v.overtime), Some(60));
        let month = store.monthly_value("emp_001", 2026, 3).unwrap().unwrap();
        assert_eq!(month.total_overtime, 90);
        assert_eq!(month.flextime_end, 90);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (store, service) = setup();
        work(&store, "2026-03-02", 480, 1020);
        store.fail_next(2);

        let queue = RecalcQueue::start(service, settings());
        queue
            .trigger_recalc("emp_001", make_date("2026-03-02"))
            .await
            .unwrap();
        queue.shutdown().await;

        let value = store.daily_value("emp_001", make_date("2026-03-02")).unwrap();
        assert_eq!(value.map(|v| v.net_time), Some(540));
    }

    #[tokio::test]
    async fn test_closing_a_night_shift_recalculates_the_arrival_day() {
        let (store, service) = setup();
        store.add_booking(Booking::new(
            "emp_001",
            make_date("2026-03-02"),
            BookingDirection::In,
            BookingCategory::Work,
            1320,
        ));
        let before = service
            .calculate_day("emp_001", make_date("2026-03-02"))
            .unwrap()
            .value;
        assert!(before.errors.contains(&ErrorCode::MissingGo));

        store.add_booking(Booking::new(
            "emp_001",
            make_date("2026-03-03"),
            BookingDirection::Out,
            BookingCategory::Work,
            360,
        ));
        let queue = RecalcQueue::start(service, settings());
        queue
            .trigger_recalc("emp_001", make_date("2026-03-03"))
            .await
            .unwrap();
        queue.shutdown().await;

        let arrival_day = store
            .daily_value("emp_001", make_date("2026-03-02"))
            .unwrap()
            .unwrap();
        assert!(!arrival_day.has_error);
        assert_eq!(arrival_day.gross_time, 120);
        let departure_day = store
            .daily_value("emp_001", make_date("2026-03-03"))
            .unwrap()
            .unwrap();
        assert_eq!(departure_day.gross_time, 360);
    }

    #[tokio::test]
    async fn test_months_run_in_calendar_order() {
        let (store, service) = setup();
        work(&store, "2026-01-05", 480, 540); // -420
        work(&store, "2026-02-02", 480, 1080); // +120
        for date in ["2026-01-05", "2026-02-02"] {
            service.calculate_day("emp_001", make_date(date)).unwrap();
        }

        let queue = RecalcQueue::start(service, settings());
        queue
            .trigger_month_range("emp_001", (2026, 1), (2026, 2))
            .await
            .unwrap();
        queue.shutdown().await;

        let february = store.monthly_value("emp_001", 2026, 2).unwrap().unwrap();
        assert_eq!(february.flextime_start, -420);
        assert_eq!(february.flextime_end, -300);
    }

    #[tokio::test]
    async fn test_closed_queue_rejects_triggers() {
        let (_, service) = setup();
        let queue = RecalcQueue::start(service, settings());
        queue.shutdown().await;

        let result = queue.trigger_recalc("emp_001", make_date("2026-03-02")).await;
        assert!(matches!(result, Err(EngineError::QueueClosed)));
    }

    #[tokio::test]
    async fn test_invalid_ranges_are_rejected() {
        let (_, service) = setup();
        let queue = RecalcQueue::start(service, settings());

        let days = queue
            .trigger_recalc_range("emp_001", make_date("2026-03-05"), make_date("2026-03-01"))
            .await;
        assert!(matches!(days, Err(EngineError::InvalidPeriod { .. })));

        let months = queue.trigger_month_range("emp_001", (2026, 0), (2026, 2)).await;
        assert!(matches!(months, Err(EngineError::InvalidPeriod { .. })));
        queue.shutdown().await;
    }
}
