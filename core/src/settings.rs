//! Layered harness settings.
//!
//! Sources, lowest precedence first: `.env`, `config/base.toml`,
//! `config/{profile}.toml`, then `FAKEREST_<SECTION>__<KEY>` environment
//! variables. `FAKEREST_CONFIG_DIR` moves the config directory and
//! `FAKEREST_PROFILE` picks the profile (default `live`).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::{Deserialize, Serialize};

const DEFAULT_PROFILE: &str = "live";
const PROFILE_ENV: &str = "FAKEREST_PROFILE";
const CONFIG_DIR_ENV: &str = "FAKEREST_CONFIG_DIR";
const ENV_PREFIX: &str = "FAKEREST";

/// Which retry budget applies: unattended runs or interactive ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Run,
    Open,
}

/// Harness configuration, built once per run and passed down explicitly.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub retries: RetrySettings,
    #[serde(default)]
    pub budgets: LatencyBudgets,
    #[serde(default)]
    pub consistency: ConsistencySettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub fixtures_dir: Option<PathBuf>,
}

impl Settings {
    /// Load by layering `.env`, `config/base.toml`, `config/{profile}.toml`
    /// and `FAKEREST_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
        Self::load_profile(&profile)
    }

    pub fn load_profile(profile: &str) -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let builder = config::Config::builder()
            .add_source(config::File::from(config_dir.join("base.toml")).required(false))
            .add_source(config::File::from(config_dir.join(format!("{profile}.toml"))).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder).with_context(|| format!("failed to load settings for profile '{profile}'"))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;
        cfg.try_deserialize()
            .with_context(|| "failed to deserialize configuration")
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.command_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "ApiSettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiSettings::default_api_version")]
    pub api_version: String,
    #[serde(default = "ApiSettings::default_headers")]
    pub default_headers: BTreeMap<String, String>,
}

impl ApiSettings {
    fn default_base_url() -> String {
        "https://fakerestapi.azurewebsites.net".to_string()
    }

    fn default_api_version() -> String {
        "v1".to_string()
    }

    fn default_headers() -> BTreeMap<String, String> {
        BTreeMap::from([("accept".to_string(), "application/json".to_string())])
    }

    /// `{base_url}/api/{api_version}`, the prefix every resource path joins.
    pub fn base_api_url(&self) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), self.api_version)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_version: Self::default_api_version(),
            default_headers: Self::default_headers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "TimeoutSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "TimeoutSettings::default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    #[serde(default = "TimeoutSettings::default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl TimeoutSettings {
    fn default_request_timeout_ms() -> u64 {
        15000
    }

    fn default_response_timeout_ms() -> u64 {
        15000
    }

    fn default_command_timeout_ms() -> u64 {
        10000
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: Self::default_request_timeout_ms(),
            response_timeout_ms: Self::default_response_timeout_ms(),
            command_timeout_ms: Self::default_command_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "RetrySettings::default_run_mode")]
    pub run_mode: u32,
    #[serde(default)]
    pub open_mode: u32,
}

impl RetrySettings {
    fn default_run_mode() -> u32 {
        1
    }

    pub fn for_mode(&self, mode: RunMode) -> u32 {
        match mode {
            RunMode::Run => self.run_mode,
            RunMode::Open => self.open_mode,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            run_mode: Self::default_run_mode(),
            open_mode: 0,
        }
    }
}

/// Latency budgets scenarios assert against. The client never enforces them.
#[derive(Debug, Clone, Deserialize)]
pub struct LatencyBudgets {
    #[serde(default = "LatencyBudgets::default_ms")]
    pub default_ms: u64,
    #[serde(default = "LatencyBudgets::default_large_dataset_ms")]
    pub large_dataset_ms: u64,
}

impl LatencyBudgets {
    fn default_ms() -> u64 {
        3000
    }

    fn default_large_dataset_ms() -> u64 {
        5000
    }

    pub fn default_budget(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    pub fn large_dataset_budget(&self) -> Duration {
        Duration::from_millis(self.large_dataset_ms)
    }
}

impl Default for LatencyBudgets {
    fn default() -> Self {
        Self {
            default_ms: Self::default_ms(),
            large_dataset_ms: Self::default_large_dataset_ms(),
        }
    }
}

/// How long to keep re-reading a record that a write should have produced.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsistencySettings {
    #[serde(default = "ConsistencySettings::default_reread_attempts")]
    pub reread_attempts: u32,
    #[serde(default = "ConsistencySettings::default_reread_delay_ms")]
    pub reread_delay_ms: u64,
}

impl ConsistencySettings {
    fn default_reread_attempts() -> u32 {
        2
    }

    fn default_reread_delay_ms() -> u64 {
        250
    }

    pub fn reread_delay(&self) -> Duration {
        Duration::from_millis(self.reread_delay_ms)
    }
}

impl Default for ConsistencySettings {
    fn default() -> Self {
        Self {
            reread_attempts: Self::default_reread_attempts(),
            reread_delay_ms: Self::default_reread_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
