//! Core library for the `forecast-radio` daemon.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider, narration and synthesis collaborators
//! - Normalization of provider telemetry
//! - The selective forecast builder, broadcast routines and scheduler
//!
//! It is used by `forecast-radio`, but can also drive the pipeline from tests
//! or other binaries through the collaborator traits.

pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod narration;
pub mod normalize;
pub mod provider;
pub mod routine;
pub mod scheduler;
pub mod synthesis;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{FetchError, ForecastError, NarrationError, ScheduleError, SynthesisError};
pub use forecast::ForecastBuilder;
pub use model::{Category, NarrationResult, OmissionSet, OutputLabel, RawTelemetryDocument, Units};
pub use narration::Narrator;
pub use provider::TelemetrySource;
pub use routine::{Broadcaster, RoutineReport};
pub use scheduler::{ScheduleEntry, Scheduler, Trigger};
pub use synthesis::Synthesizer;

/// Wire the real collaborators described by `config` into a broadcaster.
pub fn broadcaster_from_config(config: &Config) -> anyhow::Result<Broadcaster> {
    config.validate()?;
    let zone = config.zone()?;

    let builder = ForecastBuilder::new(
        provider::provider_from_config(config)?,
        narration::narrator_from_config(config)?,
    )
    .with_fallback_zone(zone.unwrap_or(chrono_tz::Tz::UTC));

    Ok(Broadcaster::new(builder, synthesis::synthesizer_from_config(config)?).with_clock_zone(zone))
}
