use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::TrackerSettings;
use crate::mapper::{
    PositionMapper, ServoPositions, ThresholdLadder, DEFAULT_DOWN_THRESHOLDS,
    DEFAULT_UP_THRESHOLDS,
};
use crate::retry::RetryPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const CONFIG_PATH_ENV: &str = "COIN_COASTER_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub servo: ServoConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    #[serde(default)]
    pub exchange: Option<String>,
    pub fiat: String,
    pub assets: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Unset means retry forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    pub tick_interval: String,
    pub window: String,
    pub depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdConfig {
    pub up: [f64; 4],
    pub down: [f64; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServoConfig {
    pub pin: u8,
    pub level: u32,
    pub up: [u32; 4],
    pub down: [u32; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    pub columns: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_log_file() -> String {
    "coin-coaster.log".to_string()
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            up: DEFAULT_UP_THRESHOLDS,
            down: DEFAULT_DOWN_THRESHOLDS,
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        let p = ServoPositions::default();
        Self {
            pin: 18,
            level: p.level,
            up: p.up,
            down: p.down,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: default_log_file(),
        }
    }
}

/// Parse an interval string (e.g. "30s", "5m", "1h", "1d", "1w", "1M") into milliseconds.
pub fn parse_interval_ms(s: &str) -> Result<u64> {
    if s.len() < 2 {
        bail!("invalid interval '{}': expected format like '5m'", s);
    }

    let suffix_start = s.char_indices().last().map_or(0, |(i, _)| i);
    let (num_str, suffix) = s.split_at(suffix_start);
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid interval '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid interval '{}': quantity must be > 0", s);
    }

    let unit_ms = match suffix {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 7 * 86_400_000,
        "M" => 30 * 86_400_000,
        _ => bail!(
            "invalid interval '{}': unsupported suffix '{}', expected one of s/m/h/d/w/M",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid interval '{}': value is too large", s))
}

impl FeedConfig {
    /// Upper-cased, trimmed, de-duplicated, configured order kept.
    pub fn tracked_assets(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for asset in &self.assets {
            let a = asset.trim().to_ascii_uppercase();
            if !a.is_empty() && !out.iter().any(|v| v == &a) {
                out.push(a);
            }
        }
        out
    }

    pub fn fiat_unit(&self) -> String {
        self.fiat.trim().to_ascii_uppercase()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_secs(self.retry_delay_secs);
        match self.max_attempts {
            Some(n) if n > 0 => RetryPolicy::bounded(n, delay),
            _ => RetryPolicy::forever(delay),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TrackerConfig {
    pub fn tick_interval_ms(&self) -> Result<u64> {
        parse_interval_ms(&self.tick_interval)
    }

    pub fn window_ms(&self) -> Result<u64> {
        parse_interval_ms(&self.window)
    }

    /// `window / tick_interval`, integer division.
    pub fn window_ticks(&self) -> Result<usize> {
        Ok((self.window_ms()? / self.tick_interval_ms()?) as usize)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("invalid config in {}", config_path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed.tracked_assets().is_empty() {
            bail!("feed.assets must name at least one asset");
        }
        if self.feed.fiat_unit().is_empty() {
            bail!("feed.fiat must not be empty");
        }
        if self.tracker.depth == 0 {
            bail!("tracker.depth must be > 0");
        }
        self.tracker
            .tick_interval_ms()
            .context("tracker.tick_interval is invalid")?;
        self.tracker.window_ms().context("tracker.window is invalid")?;
        if self.tracker.window_ticks()? == 0 {
            bail!(
                "tracker.window ({}) must cover at least one tick_interval ({})",
                self.tracker.window,
                self.tracker.tick_interval
            );
        }
        self.position_mapper()?;
        if self.display.columns == 0 || self.display.rows == 0 {
            bail!("display geometry must be at least 1x1");
        }
        Ok(())
    }

    pub fn tracker_settings(&self) -> Result<TrackerSettings> {
        Ok(TrackerSettings {
            assets: self.feed.tracked_assets(),
            fiat: self.feed.fiat_unit(),
            depth: self.tracker.depth,
            window_ticks: self.tracker.window_ticks()?,
            tick_interval: Duration::from_millis(self.tracker.tick_interval_ms()?),
        })
    }

    pub fn servo_positions(&self) -> Result<ServoPositions> {
        ServoPositions::new(self.servo.level, self.servo.up, self.servo.down)
            .context("servo positions are invalid")
    }

    pub fn position_mapper(&self) -> Result<PositionMapper> {
        let ladder = ThresholdLadder::new(self.thresholds.up, self.thresholds.down)
            .context("thresholds are invalid")?;
        Ok(PositionMapper::new(ladder, self.servo_positions()?))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.input.debounce_ms)
    }
}
