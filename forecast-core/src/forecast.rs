//! Selective forecast builder: fetch once, normalize, then narrate only the
//! categories the caller did not omit.

use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::{
    error::ForecastError,
    model::{Category, NarrationResult, NormalizedDay, NormalizedHour, OmissionSet},
    narration::Narrator,
    normalize::Normalizer,
    provider::TelemetrySource,
};

/// Hours of forecast handed to the narrator.
pub const HOURLY_WINDOW: usize = 8;

pub const SYSTEM_INSTRUCTION: &str = "You are a weather reporting service. You will take in weather \
conditions represented in JSON format and generate a summary of them just like a NOAA Weather Radio \
Report, but do not refer to the report as a NOAA Weather Report. Just call it a weather report. \
Format times (7:33 AM) as 7 33 AM. For decimal numbers, like 34.5, reformat them like this: 34 point 5. \
Always say the unit that goes with a measurement. Spell out compass directions, so SSW becomes south southwest.";

pub const CURRENT_INSTRUCTION: &str = "Following are current weather conditions. This text will be \
fed to a TTS AI, optimize it for that.";

pub const DAILY_INSTRUCTION: &str = "Here is the daily forecast. Describe the forecast in paragraph \
format. Describe each day chronologically, from sunrise to sunset, and describe how the day might feel \
and what people might experience walking outside. This text will be fed to a TTS AI, optimize it for that.";

pub const HOURLY_INSTRUCTION: &str = "Here is the hourly forecast for the next eight hours. Describe \
the forecast in paragraph format. Describe each hour in terms of what it would feel like and what \
people might experience walking outside. This text will be fed to a TTS AI, optimize it for that.";

#[derive(Debug, Clone)]
pub struct ForecastBuilder {
    source: Arc<dyn TelemetrySource>,
    narrator: Arc<dyn Narrator>,
    fallback_zone: Tz,
}

/// Normalized payloads, one per category.
struct Payloads {
    current: String,
    daily: String,
    hourly: String,
}

impl Payloads {
    fn get(&self, category: Category) -> &str {
        match category {
            Category::Current => &self.current,
            Category::Daily => &self.daily,
            Category::Hourly => &self.hourly,
        }
    }
}

pub fn instruction_for(category: Category) -> &'static str {
    match category {
        Category::Current => CURRENT_INSTRUCTION,
        Category::Daily => DAILY_INSTRUCTION,
        Category::Hourly => HOURLY_INSTRUCTION,
    }
}

impl ForecastBuilder {
    pub fn new(source: Arc<dyn TelemetrySource>, narrator: Arc<dyn Narrator>) -> Self {
        Self {
            source,
            narrator,
            fallback_zone: Tz::UTC,
        }
    }

    /// Zone used when the provider document carries none.
    pub fn with_fallback_zone(mut self, zone: Tz) -> Self {
        self.fallback_zone = zone;
        self
    }

    /// Fetch, normalize and narrate every category not in `omission`.
    ///
    /// Categories are requested sequentially in current, daily, hourly order.
    /// The first failure aborts the build; no partial result is returned.
    pub async fn build(&self, omission: OmissionSet) -> Result<NarrationResult, ForecastError> {
        let doc = self.source.fetch().await?;
        let normalizer = Normalizer::for_document(&doc, self.fallback_zone);

        let daily: Vec<NormalizedDay> = doc
            .forecast
            .daily
            .into_iter()
            .map(|day| normalizer.day(day))
            .collect();
        let mut hourly: Vec<NormalizedHour> = doc
            .forecast
            .hourly
            .into_iter()
            .map(|hour| normalizer.hour(hour))
            .collect();
        hourly.truncate(HOURLY_WINDOW);

        let payloads = Payloads {
            current: to_payload(&doc.current_conditions)?,
            daily: to_payload(&daily)?,
            hourly: to_payload(&hourly)?,
        };

        let mut result = NarrationResult::default();
        for category in omission.requested() {
            let text = self
                .narrator
                .generate(
                    SYSTEM_INSTRUCTION,
                    &[instruction_for(category), payloads.get(category)],
                )
                .await?;
            info!(%category, chars = text.len(), "narration generated");
            result.set(category, text);
        }

        Ok(result)
    }
}

fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<String, ForecastError> {
    serde_json::to_string(value).map_err(ForecastError::Payload)
}
