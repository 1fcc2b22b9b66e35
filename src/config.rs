// src/config.rs
use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::dag::{retry::RetryPolicy, schedule::Schedule};

/// Paths and column used by one CSV → JSON conversion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Column whose value is emitted once per row.
    pub diagnostic_column: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data.csv"),
            output_path: PathBuf::from("fromAirflow.json"),
            diagnostic_column: "name".to_string(),
        }
    }
}

impl TransformConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            ..Self::default()
        }
    }
}

/// Everything the scheduler needs to host the workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagConfig {
    pub dag_id: String,
    pub owner: String,
    /// Earliest logical date eligible for a run.
    pub start_date: DateTime<Utc>,
    pub retries: u32,
    pub retry_delay_secs: u64,
    pub schedule_interval_secs: u64,
    /// Run every missed interval instead of only the latest one.
    pub catchup: bool,
    pub notify_message: String,
    pub transform: TransformConfig,
    pub history_dir: PathBuf,
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            dag_id: "MyCSVDAG".to_string(),
            owner: "paulcrickard".to_string(),
            // 2025-06-29T00:00:00Z
            start_date: DateTime::from_timestamp(1_751_155_200, 0).unwrap_or_default(),
            retries: 1,
            retry_delay_secs: 5 * 60,
            schedule_interval_secs: 5 * 60,
            catchup: false,
            notify_message: "I am reading the csv now.......".to_string(),
            transform: TransformConfig::default(),
            history_dir: PathBuf::from("history"),
        }
    }
}

impl DagConfig {
    /// Read a YAML config file. Missing keys fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: DagConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("validating config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dag_id.trim().is_empty() {
            bail!("dag_id must not be empty");
        }
        if self.schedule_interval_secs == 0 {
            bail!("schedule_interval_secs must be greater than zero");
        }
        let first_due = i64::try_from(self.schedule_interval_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|step| self.start_date.checked_add_signed(step));
        if first_due.is_none() {
            bail!(
                "schedule_interval_secs {} is too large for start_date {}",
                self.schedule_interval_secs,
                self.start_date
            );
        }
        if i64::try_from(self.retry_delay_secs).is_err() {
            bail!("retry_delay_secs {} is too large", self.retry_delay_secs);
        }
        if self.transform.input_path.as_os_str().is_empty()
            || self.transform.output_path.as_os_str().is_empty()
        {
            bail!("transform input_path and output_path must be set");
        }
        if self.transform.diagnostic_column.is_empty() {
            bail!("transform diagnostic_column must be set");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_secs(self.retry_delay_secs))
    }

    pub fn schedule(&self) -> Schedule {
        Schedule::new(
            self.start_date,
            Duration::from_secs(self.schedule_interval_secs),
            self.catchup,
        )
    }
}
