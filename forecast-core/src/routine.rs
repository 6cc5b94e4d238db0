//! Orchestration routines: build a forecast, then hand each narration to the
//! synthesizer under its fixed output label.

use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

use crate::{
    error::{ForecastError, SynthesisError},
    forecast::ForecastBuilder,
    model::{Category, NarrationResult, OmissionSet, OutputLabel},
    normalize::{DisplayFormat, Normalizer},
    synthesis::Synthesizer,
};

/// Outcome of one synthesis submission.
#[derive(Debug)]
pub struct Submission {
    pub label: OutputLabel,
    pub result: Result<PathBuf, SynthesisError>,
}

/// Per-label outcomes of a routine whose build succeeded.
#[derive(Debug, Default)]
pub struct RoutineReport {
    pub submissions: Vec<Submission>,
}

impl RoutineReport {
    pub fn labels(&self) -> Vec<OutputLabel> {
        self.submissions.iter().map(|s| s.label).collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.iter().filter(|s| s.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Broadcaster {
    builder: ForecastBuilder,
    synthesizer: Arc<dyn Synthesizer>,
    clock_zone: Option<Tz>,
}

impl Broadcaster {
    pub fn new(builder: ForecastBuilder, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            builder,
            synthesizer,
            clock_zone: None,
        }
    }

    /// Zone for the clock announcement. Without one the host zone is used.
    pub fn with_clock_zone(mut self, zone: Option<Tz>) -> Self {
        self.clock_zone = zone;
        self
    }

    /// Narrate current conditions and write `current`.
    pub async fn run_current_only(&self) -> Result<RoutineReport, ForecastError> {
        let omission: OmissionSet = [Category::Daily, Category::Hourly].into_iter().collect();
        let result = self.builder.build(omission).await?;

        let mut report = RoutineReport::default();
        self.submit(&mut report, &result, Category::Current).await;
        Ok(report)
    }

    /// Narrate the daily and hourly forecasts and write `daily`, then `hourly`.
    /// A failed `daily` write does not stop the `hourly` one.
    pub async fn run_daily_and_hourly(&self) -> Result<RoutineReport, ForecastError> {
        let omission: OmissionSet = [Category::Current].into_iter().collect();
        let result = self.builder.build(omission).await?;

        let mut report = RoutineReport::default();
        self.submit(&mut report, &result, Category::Daily).await;
        self.submit(&mut report, &result, Category::Hourly).await;
        Ok(report)
    }

    /// Speak the current time into `time`.
    pub async fn announce_time(&self) -> Result<PathBuf, SynthesisError> {
        self.announce_time_at(self.now()).await
    }

    pub async fn announce_time_at(&self, now: DateTime<FixedOffset>) -> Result<PathBuf, SynthesisError> {
        let text = spoken_time(now);
        let result = self.synthesizer.synthesize(&text, OutputLabel::Time).await;
        log_submission(OutputLabel::Time, &result);
        result
    }

    fn now(&self) -> DateTime<FixedOffset> {
        match self.clock_zone {
            Some(zone) => Utc::now().with_timezone(&zone).fixed_offset(),
            None => Local::now().fixed_offset(),
        }
    }

    async fn submit(&self, report: &mut RoutineReport, result: &NarrationResult, category: Category) {
        let Some(text) = result.get(category) else {
            return;
        };

        let label = OutputLabel::from(category);
        let outcome = self.synthesizer.synthesize(text, label).await;
        log_submission(label, &outcome);
        report.submissions.push(Submission {
            label,
            result: outcome,
        });
    }
}

/// Announcement text for `now`, e.g. "The time is 7 05 PM."
pub fn spoken_time(now: DateTime<FixedOffset>) -> String {
    let clock = Normalizer::new(Tz::UTC).render(now, DisplayFormat::SpokenClock);
    format!("The time is {clock}.")
}

fn log_submission(label: OutputLabel, result: &Result<PathBuf, SynthesisError>) {
    match result {
        Ok(path) => info!(%label, path = %path.display(), "audio updated"),
        Err(e) => warn!(%label, error = %e, "synthesis failed"),
    }
}
