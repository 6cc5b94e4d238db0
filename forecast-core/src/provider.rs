use crate::{Config, error::FetchError, model::RawTelemetryDocument, provider::tempest::TempestProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod tempest;

/// Source of raw station telemetry.
#[async_trait]
pub trait TelemetrySource: Send + Sync + Debug {
    async fn fetch(&self) -> Result<RawTelemetryDocument, FetchError>;
}

/// Construct the Tempest provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn TelemetrySource>> {
    let provider = TempestProvider::new(
        config.station_id()?.to_owned(),
        config.token()?.to_owned(),
        config.units,
    )?
    .with_base_url(&config.provider_base_url);

    Ok(Arc::new(provider))
}
