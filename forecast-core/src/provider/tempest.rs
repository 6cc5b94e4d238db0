use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::DEFAULT_PROVIDER_BASE_URL,
    error::{FetchError, truncate_body},
    model::{RawTelemetryDocument, Units},
};

use super::TelemetrySource;

/// WeatherFlow Tempest `better_forecast` client.
#[derive(Debug, Clone)]
pub struct TempestProvider {
    station_id: String,
    token: String,
    units: Units,
    base_url: String,
    http: Client,
}

impl TempestProvider {
    pub fn new(station_id: String, token: String, units: Units) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            station_id,
            token,
            units,
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TelemetrySource for TempestProvider {
    async fn fetch(&self) -> Result<RawTelemetryDocument, FetchError> {
        let url = format!("{}/better_forecast", self.base_url);

        let mut query: Vec<(&str, &str)> = vec![
            ("station_id", self.station_id.as_str()),
            ("token", self.token.as_str()),
        ];
        query.extend(self.units.query_pairs());

        debug!(station_id = %self.station_id, "requesting better_forecast");

        let res = self.http.get(&url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: RawTelemetryDocument = serde_json::from_str(&body)?;

        debug!(
            daily = parsed.forecast.daily.len(),
            hourly = parsed.forecast.hourly.len(),
            "telemetry fetched"
        );

        Ok(parsed)
    }
}
