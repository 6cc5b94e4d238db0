//! Cron-driven triggers for the broadcast routines.
//!
//! Every entry gets its own timer task. When a timer fires, the routine is
//! spawned as a separate task, so a slow run never delays or cancels the next
//! firing, and runs from different cadences may overlap freely. Overlapping
//! writes to the same output label race; the last one to finish wins unless
//! the synthesizer serializes labels.

use chrono::{DateTime, Local, TimeZone};
use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{error::ScheduleError, routine::Broadcaster};

/// What a schedule entry does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trigger {
    /// Speak the time.
    Clock,
    /// Refresh the current-conditions narration.
    CurrentConditions,
    /// Refresh the daily and hourly narrations.
    Forecast,
}

impl Trigger {
    pub const fn all() -> &'static [Trigger] {
        &[Trigger::Clock, Trigger::CurrentConditions, Trigger::Forecast]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Clock => "clock",
            Trigger::CurrentConditions => "current-conditions",
            Trigger::Forecast => "forecast",
        }
    }

    /// Default cadence, in 6-field cron syntax (sec min hour dom month dow).
    pub fn cadence(&self) -> &'static str {
        match self {
            Trigger::Clock => "0 * * * * *",
            Trigger::CurrentConditions => "0 */15 * * * *",
            Trigger::Forecast => "0 0 * * * *",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    cadence: String,
    trigger: Trigger,
    schedule: cron::Schedule,
}

impl ScheduleEntry {
    pub fn new(cadence: &str, trigger: Trigger) -> Result<Self, ScheduleError> {
        let schedule = cron::Schedule::from_str(cadence).map_err(|e| ScheduleError::Cron {
            expr: cadence.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            cadence: cadence.to_string(),
            trigger,
            schedule,
        })
    }

    pub fn cadence(&self) -> &str {
        &self.cadence
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// First firing strictly after `after`.
    pub fn next_after<Z: TimeZone>(&self, after: &DateTime<Z>) -> Option<DateTime<Z>> {
        self.schedule.after(after).next()
    }
}

pub struct Scheduler {
    broadcaster: Arc<Broadcaster>,
    entries: Vec<ScheduleEntry>,
    handles: BTreeMap<String, JoinHandle<()>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("entries", &self.entries)
            .field("running", &self.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Scheduler {
    /// Scheduler with the standard clock, current-conditions and forecast cadences.
    pub fn new(broadcaster: Arc<Broadcaster>) -> Result<Self, ScheduleError> {
        let entries = Trigger::all()
            .iter()
            .map(|t| ScheduleEntry::new(t.cadence(), *t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_entries(broadcaster, entries))
    }

    pub fn with_entries(broadcaster: Arc<Broadcaster>, entries: Vec<ScheduleEntry>) -> Self {
        Self {
            broadcaster,
            entries,
            handles: BTreeMap::new(),
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// One-shot startup run: current conditions, then daily and hourly.
    pub async fn run_startup(&self) {
        info!("startup broadcast");
        run_trigger(&self.broadcaster, Trigger::CurrentConditions).await;
        run_trigger(&self.broadcaster, Trigger::Forecast).await;
    }

    /// Run `trigger` now, outside its cadence.
    pub fn fire(&self, trigger: Trigger) -> JoinHandle<()> {
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move { run_trigger(&broadcaster, trigger).await })
    }

    /// Spawn a timer task for every entry. Calling it again is a no-op.
    pub fn start(&mut self) {
        for entry in &self.entries {
            if self.handles.contains_key(entry.cadence()) {
                continue;
            }
            info!(trigger = %entry.trigger(), cadence = entry.cadence(), "schedule registered");
            let handle = tokio::spawn(timer_loop(entry.clone(), self.broadcaster.clone()));
            self.handles.insert(entry.cadence().to_string(), handle);
        }
    }

    /// Register the timers, then run the startup broadcast. Triggers that come
    /// due while the startup run is in flight fire on schedule.
    pub async fn launch(&mut self) {
        self.start();
        self.run_startup().await;
    }

    /// Stop all timers. Routines already in flight run to completion.
    pub fn shutdown(&mut self) {
        for (cadence, handle) in std::mem::take(&mut self.handles) {
            debug!(cadence = %cadence, "stopping timer");
            handle.abort();
        }
    }
}

async fn timer_loop(entry: ScheduleEntry, broadcaster: Arc<Broadcaster>) {
    let mut after = Local::now();
    loop {
        let Some(next) = entry.next_after(&after) else {
            warn!(trigger = %entry.trigger(), "cadence has no further occurrences");
            return;
        };

        let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;

        debug!(trigger = %entry.trigger(), at = %next, "trigger fired");
        let broadcaster = broadcaster.clone();
        let trigger = entry.trigger();
        tokio::spawn(async move { run_trigger(&broadcaster, trigger).await });

        after = next.max(Local::now());
    }
}

/// Execute one trigger. Failures are logged and stay inside this run.
async fn run_trigger(broadcaster: &Broadcaster, trigger: Trigger) {
    let outcome = match trigger {
        Trigger::Clock => {
            match broadcaster.announce_time().await {
                Ok(path) => debug!(%trigger, path = %path.display(), "cycle complete"),
                Err(e) => error!(%trigger, error = %e, "cycle failed"),
            }
            return;
        }
        Trigger::CurrentConditions => broadcaster.run_current_only().await,
        Trigger::Forecast => broadcaster.run_daily_and_hourly().await,
    };

    match outcome {
        Ok(report) if report.is_success() => {
            debug!(%trigger, labels = report.submissions.len(), "cycle complete");
        }
        Ok(report) => {
            let failed = report.failed().count();
            warn!(%trigger, failed, total = report.submissions.len(), "cycle finished with synthesis failures");
        }
        Err(e) => error!(%trigger, error = %e, "cycle failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        forecast::ForecastBuilder,
        model::OutputLabel,
        testing::{FakeSource, RecordingNarrator, RecordingSynthesizer, sample_document},
    };
    use chrono::Utc;
    use std::time::Duration;

    fn scheduler(source: FakeSource, synth: Arc<RecordingSynthesizer>) -> Scheduler {
        let builder = ForecastBuilder::new(Arc::new(source), Arc::new(RecordingNarrator::default()));
        let broadcaster = Arc::new(Broadcaster::new(builder, synth));
        Scheduler::new(broadcaster).unwrap()
    }

    fn every_second(
        trigger: Trigger,
        source: FakeSource,
        synth: Arc<RecordingSynthesizer>,
    ) -> Scheduler {
        let builder = ForecastBuilder::new(Arc::new(source), Arc::new(RecordingNarrator::default()));
        let broadcaster = Arc::new(Broadcaster::new(builder, synth));
        let entries = vec![ScheduleEntry::new("* * * * * *", trigger).unwrap()];
        Scheduler::with_entries(broadcaster, entries)
    }

    fn time_writes(synth: &RecordingSynthesizer) -> usize {
        synth
            .writes()
            .iter()
            .filter(|(l, _)| *l == OutputLabel::Time)
            .count()
    }

    fn entry(trigger: Trigger) -> ScheduleEntry {
        ScheduleEntry::new(trigger.cadence(), trigger).unwrap()
    }

    #[test]
    fn standard_cadences_fire_at_documented_instants() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 17, 5).unwrap();

        assert_eq!(
            entry(Trigger::Clock).next_after(&at).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 18, 0).unwrap()
        );
        assert_eq!(
            entry(Trigger::CurrentConditions).next_after(&at).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
        );
        assert_eq!(
            entry(Trigger::Forecast).next_after(&at).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn forecast_fires_at_top_of_every_hour() {
        let forecast = entry(Trigger::Forecast);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap();
        let next = forecast.next_after(&at).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn invalid_cadence_is_rejected() {
        let err = ScheduleEntry::new("every tuesday", Trigger::Clock).unwrap_err();
        assert!(err.to_string().contains("every tuesday"));
    }

    #[tokio::test]
    async fn scheduler_registers_one_entry_per_trigger() {
        let sched = scheduler(
            FakeSource::ok(sample_document(8)),
            Arc::new(RecordingSynthesizer::default()),
        );
        let cadences: Vec<_> = sched.entries().iter().map(|e| e.cadence()).collect();
        assert_eq!(cadences, vec!["0 * * * * *", "0 */15 * * * *", "0 0 * * * *"]);
    }

    #[tokio::test]
    async fn startup_runs_current_then_forecast() {
        let synth = Arc::new(RecordingSynthesizer::default());
        let sched = scheduler(FakeSource::ok(sample_document(24)), synth.clone());

        sched.run_startup().await;

        let labels: Vec<_> = synth.writes().into_iter().map(|(l, _)| l).collect();
        assert_eq!(
            labels,
            vec![OutputLabel::Current, OutputLabel::Daily, OutputLabel::Hourly]
        );
    }

    #[tokio::test]
    async fn fire_runs_trigger_without_waiting_for_clock() {
        let synth = Arc::new(RecordingSynthesizer::default());
        let sched = scheduler(FakeSource::ok(sample_document(24)), synth.clone());

        sched.fire(Trigger::Clock).await.unwrap();
        sched.fire(Trigger::CurrentConditions).await.unwrap();

        let writes = synth.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, OutputLabel::Time);
        assert!(writes[0].1.starts_with("The time is "));
        assert_eq!(writes[1], (OutputLabel::Current, "current narration".to_string()));
    }

    #[tokio::test]
    async fn overlapping_fires_both_complete() {
        let synth = Arc::new(RecordingSynthesizer::default());
        let sched = scheduler(FakeSource::ok(sample_document(24)), synth.clone());

        let a = sched.fire(Trigger::CurrentConditions);
        let b = sched.fire(Trigger::CurrentConditions);
        let _ = tokio::join!(a, b);

        let current_writes = synth
            .writes()
            .into_iter()
            .filter(|(l, _)| *l == OutputLabel::Current)
            .count();
        assert_eq!(current_writes, 2);
    }

    #[tokio::test]
    async fn failing_cycle_does_not_panic_the_task() {
        let synth = Arc::new(RecordingSynthesizer::default());
        let sched = scheduler(FakeSource::failing(), synth.clone());

        assert!(sched.fire(Trigger::Forecast).await.is_ok());
        assert!(synth.writes().is_empty());
    }

    #[tokio::test]
    async fn start_and_shutdown_manage_timer_handles() {
        let mut sched = scheduler(
            FakeSource::ok(sample_document(8)),
            Arc::new(RecordingSynthesizer::default()),
        );
        assert!(!sched.is_running());

        sched.start();
        sched.start();
        assert!(sched.is_running());
        assert_eq!(sched.handles.len(), 3);

        sched.shutdown();
        assert!(!sched.is_running());
    }

    #[tokio::test]
    async fn clock_failure_does_not_panic_the_task() {
        let synth = Arc::new(RecordingSynthesizer::failing_for(OutputLabel::Time));
        let sched = scheduler(FakeSource::ok(sample_document(8)), synth.clone());

        assert!(sched.fire(Trigger::Clock).await.is_ok());
        assert!(synth.writes().is_empty());
    }

    #[tokio::test]
    async fn timer_fires_repeatedly_until_shutdown() {
        let synth = Arc::new(RecordingSynthesizer::default());
        let mut sched =
            every_second(Trigger::Clock, FakeSource::ok(sample_document(8)), synth.clone());

        sched.start();
        tokio::time::sleep(Duration::from_millis(3200)).await;
        sched.shutdown();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let fired = time_writes(&synth);
        assert!((2..=4).contains(&fired), "fired {fired} times");

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(time_writes(&synth), fired);
    }

    #[tokio::test]
    async fn slow_firings_overlap_instead_of_queueing() {
        let synth =
            Arc::new(RecordingSynthesizer::default().with_delay(Duration::from_millis(1500)));
        let mut sched =
            every_second(Trigger::Clock, FakeSource::ok(sample_document(8)), synth.clone());

        sched.start();
        tokio::time::sleep(Duration::from_millis(3200)).await;
        sched.shutdown();

        assert!(synth.peak_in_flight() >= 2, "peak {}", synth.peak_in_flight());
    }

    #[tokio::test]
    async fn triggers_fire_while_startup_run_is_in_flight() {
        let synth = Arc::new(RecordingSynthesizer::default());
        let source = FakeSource::ok(sample_document(8)).with_delay(Duration::from_millis(2000));
        let mut sched = every_second(Trigger::Clock, source, synth.clone());

        sched.launch().await;
        sched.shutdown();

        let labels: Vec<_> = synth.writes().into_iter().map(|(l, _)| l).collect();
        let first_current = labels.iter().position(|l| *l == OutputLabel::Current).unwrap();
        assert!(labels[..first_current].contains(&OutputLabel::Time), "{labels:?}");
        assert!(labels.contains(&OutputLabel::Daily));
        assert!(labels.contains(&OutputLabel::Hourly));
    }
}
