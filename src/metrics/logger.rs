//! CSV run logger for training curves.
//!
//! Entries are collected with [`RunLogger::log`] and committed as one CSV row
//! per [`RunLogger::write`]. The header is taken from the keys of the first
//! written entry, in the order they were first logged.
//!
//! Two keys are special:
//! - `_MeanReward`: shown on the console and tracked for the reward chart
//! - `_Episode`: shown on the console; logging it appends a point to the chart
//!
//! Keys starting with `_` are written to the file but left out of the
//! verbose console listing.

use std::borrow::Cow;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Key holding the batch mean reward.
pub const MEAN_REWARD_KEY: &str = "_MeanReward";
/// Key holding the running episode count.
pub const EPISODE_KEY: &str = "_Episode";

/// A single logged value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LogValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LogValue::Int(v) => Some(*v as f64),
            LogValue::Float(v) => Some(*v),
            LogValue::Text(_) => None,
        }
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Int(v) => write!(f, "{}", v),
            LogValue::Float(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            LogValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for LogValue {
    fn from(v: i64) -> Self {
        LogValue::Int(v)
    }
}

impl From<i32> for LogValue {
    fn from(v: i32) -> Self {
        LogValue::Int(v as i64)
    }
}

impl From<usize> for LogValue {
    fn from(v: usize) -> Self {
        LogValue::Int(v as i64)
    }
}

impl From<f64> for LogValue {
    fn from(v: f64) -> Self {
        LogValue::Float(v)
    }
}

impl From<f32> for LogValue {
    fn from(v: f32) -> Self {
        LogValue::Float(v as f64)
    }
}

impl From<&str> for LogValue {
    fn from(v: &str) -> Self {
        LogValue::Text(v.to_string())
    }
}

impl From<String> for LogValue {
    fn from(v: String) -> Self {
        LogValue::Text(v)
    }
}

/// Configuration for [`RunLogger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLoggerConfig {
    /// Environment name, used as the chart title.
    pub env_name: String,
    /// Directory receiving the CSV file and chart.
    pub log_dir: PathBuf,
    /// CSV file name inside `log_dir`.
    pub file_name: String,
    /// Print a summary line on every write.
    pub display: bool,
    /// Redraw the reward chart on every write.
    pub graph: bool,
    /// Chart file name inside `log_dir`.
    pub plot_file: String,
}

impl RunLoggerConfig {
    /// Create a config for the given environment and log directory.
    pub fn new(env_name: impl Into<String>, log_dir: impl AsRef<Path>) -> Self {
        Self {
            env_name: env_name.into(),
            log_dir: log_dir.as_ref().to_path_buf(),
            file_name: "log.csv".to_string(),
            display: true,
            graph: false,
            plot_file: "mean_reward.png".to_string(),
        }
    }

    /// Set the CSV file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Enable or disable the console summary.
    pub fn with_display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    /// Enable or disable the reward chart.
    pub fn with_graph(mut self, graph: bool) -> Self {
        self.graph = graph;
        self
    }

    /// Set the chart file name.
    pub fn with_plot_file(mut self, name: impl Into<String>) -> Self {
        self.plot_file = name.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.file_name.is_empty() {
            return Err(HarnessError::invalid_config("file_name", "must not be empty"));
        }
        if self.graph && self.plot_file.is_empty() {
            return Err(HarnessError::invalid_config(
                "plot_file",
                "must not be empty when graphing is enabled",
            ));
        }
        Ok(())
    }

    /// Full path of the CSV file.
    pub fn csv_path(&self) -> PathBuf {
        self.log_dir.join(&self.file_name)
    }

    /// Full path of the chart image.
    pub fn plot_path(&self) -> PathBuf {
        self.log_dir.join(&self.plot_file)
    }
}

/// Training run logger writing one CSV row per entry.
pub struct RunLogger {
    config: RunLoggerConfig,
    writer: Option<BufWriter<File>>,
    header: Option<Vec<String>>,
    entry: Vec<(String, LogValue)>,
    episodes: Vec<f64>,
    mean_rewards: Vec<f64>,
}

impl RunLogger {
    /// Create the log directory if needed and open the CSV file for writing.
    pub fn create(config: RunLoggerConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.log_dir)?;
        let file = File::create(config.csv_path())?;

        log::debug!("Logging run '{}' to {:?}", config.env_name, config.csv_path());

        Ok(Self {
            config,
            writer: Some(BufWriter::new(file)),
            header: None,
            entry: Vec::new(),
            episodes: Vec::new(),
            mean_rewards: Vec::new(),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &RunLoggerConfig {
        &self.config
    }

    /// Merge values into the pending entry. Later values overwrite earlier ones.
    ///
    /// Logging `_Episode` records a chart point using the pending
    /// `_MeanReward`, which must already be present.
    pub fn log<I, K, V>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<LogValue>,
    {
        let items: Vec<(String, LogValue)> = items
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        // Resolve the chart point up front so a rejected call changes nothing
        let point = match items.iter().rev().find(|(k, _)| k == EPISODE_KEY) {
            Some((_, value)) => {
                let episode = value.as_f64().ok_or_else(|| {
                    HarnessError::invalid_input(format!("{} must be numeric", EPISODE_KEY))
                })?;
                let mean_reward = items
                    .iter()
                    .rev()
                    .find(|(k, _)| k == MEAN_REWARD_KEY)
                    .map(|(_, v)| v)
                    .or_else(|| self.value(MEAN_REWARD_KEY))
                    .and_then(LogValue::as_f64)
                    .ok_or_else(|| {
                        HarnessError::invalid_input(format!(
                            "{} logged before {}",
                            EPISODE_KEY, MEAN_REWARD_KEY
                        ))
                    })?;
                Some((episode, mean_reward))
            }
            None => None,
        };

        for (key, value) in items {
            match self.entry.iter_mut().find(|(k, _)| *k == key) {
                Some((_, slot)) => *slot = value,
                None => self.entry.push((key, value)),
            }
        }

        if let Some((episode, mean_reward)) = point {
            self.episodes.push(episode);
            self.mean_rewards.push(mean_reward);
        }
        Ok(())
    }

    /// Look up a value in the pending entry.
    pub fn value(&self, key: &str) -> Option<&LogValue> {
        self.entry.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Commit the pending entry using the configured display/graph flags.
    pub fn write(&mut self) -> Result<()> {
        self.write_with(self.config.display, self.config.graph)
    }

    /// Commit the pending entry as one CSV row and clear it.
    ///
    /// The first call also writes the header row. Fields missing from a later
    /// entry are left empty; fields not in the header are rejected.
    pub fn write_with(&mut self, display: bool, graph: bool) -> Result<()> {
        if self.writer.is_none() {
            return Err(HarnessError::Closed);
        }

        let write_header = self.header.is_none();
        let header: Vec<String> = match &self.header {
            Some(header) => header.clone(),
            None => self.entry.iter().map(|(k, _)| k.clone()).collect(),
        };
        if let Some((key, _)) = self.entry.iter().find(|(k, _)| !header.contains(k)) {
            return Err(HarnessError::invalid_input(format!(
                "field '{}' is not in the log header",
                key
            )));
        }

        if display {
            self.display();
        }
        if graph {
            self.draw_chart();
        }

        let row: Vec<String> = header
            .iter()
            .map(|key| {
                self.value(key)
                    .map(|v| escape_field(&v.to_string()).into_owned())
                    .unwrap_or_default()
            })
            .collect();

        let writer = self.writer.as_mut().ok_or(HarnessError::Closed)?;
        if write_header {
            let names: Vec<Cow<'_, str>> = header.iter().map(|k| escape_field(k)).collect();
            writeln!(writer, "{}", names.join(","))?;
            self.header = Some(header);
        }
        writeln!(writer, "{}", row.join(","))?;

        self.entry.clear();
        Ok(())
    }

    /// Flush and close the file. Further writes fail with [`HarnessError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Whether [`RunLogger::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Episode numbers recorded for the chart.
    pub fn episodes(&self) -> &[f64] {
        &self.episodes
    }

    /// Mean rewards recorded for the chart.
    pub fn mean_rewards(&self) -> &[f64] {
        &self.mean_rewards
    }

    fn display(&self) {
        match (self.value(EPISODE_KEY), self.value(MEAN_REWARD_KEY)) {
            (Some(episode), Some(reward)) => {
                log::info!("***** Episode {}, Mean R = {:.1} *****", episode, reward);
            }
            _ => log::info!("***** {} *****", self.config.env_name),
        }

        let mut keys: Vec<&(String, LogValue)> =
            self.entry.iter().filter(|(k, _)| !k.starts_with('_')).collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in keys {
            log::debug!("{}: {:.3}", key, value);
        }
    }

    fn draw_chart(&self) {
        #[cfg(feature = "plot")]
        {
            if self.episodes.is_empty() {
                return;
            }
            let chart = super::plot::RewardPlot::default();
            if let Err(e) = chart.render_to_file(
                &self.config.env_name,
                &self.episodes,
                &self.mean_rewards,
                self.config.plot_path(),
            ) {
                log::warn!("Failed to draw reward chart: {}", e);
            }
        }
        #[cfg(not(feature = "plot"))]
        {
            log::warn!("Reward chart requested but the `plot` feature is disabled");
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

/// Quote a CSV field if it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
