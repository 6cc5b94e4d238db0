use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::Units;

pub const DEFAULT_NARRATION_MODEL: &str = "gpt-4";
pub const DEFAULT_NARRATION_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SYNTHESIS_BASE_URL: &str = "https://translate.google.com";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://swd.weatherflow.com/swd/rest";

/// Text-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_NARRATION_MODEL.to_string(),
            base_url: DEFAULT_NARRATION_BASE_URL.to_string(),
        }
    }
}

/// Speech-synthesis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Voice locale, e.g. "en".
    pub voice: String,
    pub base_url: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            voice: "en".to_string(),
            base_url: DEFAULT_SYNTHESIS_BASE_URL.to_string(),
        }
    }
}

/// Top-level configuration.
///
/// Example TOML:
/// ```toml
/// station_id = "12345"
/// token = "..."
/// output_dir = "/var/lib/forecast-radio"
///
/// [units]
/// temperature = "f"
/// wind = "mph"
///
/// [narration]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub station_id: Option<String>,
    pub token: Option<String>,
    pub provider_base_url: String,

    /// IANA zone used when the provider does not report one, and for the
    /// clock announcement. Unset means the host's local zone.
    pub timezone: Option<String>,

    /// Directory that receives `<label>.mp3` files.
    pub output_dir: PathBuf,

    /// Serialize overlapping writes to the same output label.
    pub serialize_outputs: bool,

    pub units: Units,
    pub narration: NarrationConfig,
    pub synthesis: SynthesisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station_id: None,
            token: None,
            provider_base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            timezone: None,
            output_dir: PathBuf::from("."),
            serialize_outputs: false,
            units: Units::default(),
            narration: NarrationConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast-radio", "forecast-radio")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TEMPEST_STATION_ID") {
            self.station_id = Some(v);
        }
        if let Some(v) = get("TEMPEST_KEY") {
            self.token = Some(v);
        }
        if let Some(v) = get("OPENAI_KEY") {
            self.narration.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.narration.model = v;
        }
        if let Some(v) = get("FORECAST_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("FORECAST_TIMEZONE") {
            self.timezone = Some(v);
        }
        if let Some(v) = get("FORECAST_VOICE") {
            self.synthesis.voice = v;
        }
    }

    pub fn station_id(&self) -> Result<&str> {
        self.station_id.as_deref().ok_or_else(|| {
            anyhow!(
                "No weather station configured.\n\
                 Hint: set TEMPEST_STATION_ID or run `forecast-radio configure`."
            )
        })
    }

    pub fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| {
            anyhow!(
                "No weather provider token configured.\n\
                 Hint: set TEMPEST_KEY or run `forecast-radio configure`."
            )
        })
    }

    pub fn narration_api_key(&self) -> Result<&str> {
        self.narration.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No narration API key configured.\n\
                 Hint: set OPENAI_KEY or run `forecast-radio configure`."
            )
        })
    }

    /// Configured zone, if any. An unrecognized name is an error.
    pub fn zone(&self) -> Result<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| anyhow!("Unknown timezone '{name}' in configuration"))
            })
            .transpose()
    }

    /// Check every setting the pipeline needs before anything is scheduled.
    pub fn validate(&self) -> Result<()> {
        self.station_id()?;
        self.token()?;
        self.narration_api_key()?;
        self.zone()?;
        Ok(())
    }
}
