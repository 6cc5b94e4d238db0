//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use serde_json::json;
use std::{
    path::PathBuf,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{
    error::{FetchError, NarrationError, SynthesisError},
    forecast::instruction_for,
    model::{Category, OutputLabel, RawTelemetryDocument},
    narration::Narrator,
    provider::TelemetrySource,
    synthesis::Synthesizer,
};

/// A station document in America/Chicago with ten days and `hours` hourly
/// entries. Every record carries the bookkeeping fields the normalizer drops.
pub fn sample_document(hours: usize) -> RawTelemetryDocument {
    let daily: Vec<_> = (0..10i64)
        .map(|d| {
            json!({
                "day_start_local": 1699999000 + d * 86_400,
                "sunrise": 1700000000 + d * 86_400,
                "sunset": 1700030000 + d * 86_400,
                "day_num": 14 + d,
                "month_num": 11,
                "icon": "clear-day",
                "precip_icon": "chance-rain",
                "conditions": "Clear",
                "air_temp_high": 64,
                "air_temp_low": 41
            })
        })
        .collect();

    let hourly: Vec<_> = (0..hours as i64)
        .map(|h| {
            json!({
                "time": 1700000000 + h * 3_600,
                "air_temperature": 58,
                "wind_direction_cardinal": "SSW",
                "icon": "clear-night",
                "precip_icon": "chance-rain",
                "local_day": 14,
                "local_hour": 16 + h
            })
        })
        .collect();

    serde_json::from_value(json!({
        "timezone": "America/Chicago",
        "current_conditions": {
            "air_temperature": 61.2,
            "conditions": "Clear",
            "icon": "clear-day"
        },
        "forecast": { "daily": daily, "hourly": hourly }
    }))
    .expect("sample document is well-formed")
}

#[derive(Debug)]
pub struct FakeSource {
    doc: Option<RawTelemetryDocument>,
    fetches: AtomicUsize,
    delay: Duration,
}

impl FakeSource {
    pub fn ok(doc: RawTelemetryDocument) -> Self {
        Self {
            doc: Some(doc),
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            doc: None,
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Every fetch sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetrySource for FakeSource {
    async fn fetch(&self) -> Result<RawTelemetryDocument, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.doc.clone().ok_or_else(|| FetchError::Status {
            status: 503,
            body: "station offline".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NarrationCall {
    pub system: String,
    pub fragments: Vec<String>,
}

/// Answers each request with `"<category> narration"` and records it.
#[derive(Debug, Default)]
pub struct RecordingNarrator {
    calls: Mutex<Vec<NarrationCall>>,
    fail_on: Option<&'static str>,
}

impl RecordingNarrator {
    /// Fails the request whose first fragment is `instruction`.
    pub fn failing_on(instruction: &'static str) -> Self {
        Self {
            calls: Mutex::default(),
            fail_on: Some(instruction),
        }
    }

    pub fn calls(&self) -> Vec<NarrationCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Narrator for RecordingNarrator {
    async fn generate(&self, system: &str, fragments: &[&str]) -> Result<String, NarrationError> {
        self.calls.lock().unwrap().push(NarrationCall {
            system: system.to_string(),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
        });

        let instruction = fragments.first().copied().unwrap_or_default();
        if self.fail_on == Some(instruction) {
            return Err(NarrationError::Api {
                status: 429,
                message: "rate limited".to_string(),
            });
        }

        let category = Category::all()
            .iter()
            .find(|c| instruction_for(**c) == instruction)
            .map(|c| c.as_str())
            .unwrap_or("unknown");
        Ok(format!("{category} narration"))
    }
}

#[derive(Debug, Default)]
pub struct RecordingSynthesizer {
    writes: Mutex<Vec<(OutputLabel, String)>>,
    fail_for: Option<OutputLabel>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingSynthesizer {
    pub fn failing_for(label: OutputLabel) -> Self {
        Self {
            fail_for: Some(label),
            ..Self::default()
        }
    }

    /// Every synthesis sleeps for `delay` before it is recorded.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn writes(&self) -> Vec<(OutputLabel, String)> {
        self.writes.lock().unwrap().clone()
    }

    /// Most syntheses that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    async fn synthesize(&self, text: &str, label: OutputLabel) -> Result<PathBuf, SynthesisError> {
        if self.fail_for == Some(label) {
            return Err(SynthesisError::Api {
                status: 500,
                body: "tts unavailable".to_string(),
            });
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.writes.lock().unwrap().push((label, text.to_string()));
        Ok(PathBuf::from(label.file_name()))
    }
}
