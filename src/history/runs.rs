// src/history/runs.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};
use tracing::warn;

use crate::dag::runner::RunReport;

/// Append-only ledger of run reports, one JSON line per run, one file per
/// DAG: `<dir>/<dag_id>_runs.jsonl`.
pub struct RunHistory {
    history_dir: PathBuf,
}

impl RunHistory {
    /// Open the ledger at `history_dir`, creating the directory if needed.
    pub fn new(history_dir: impl Into<PathBuf>) -> Result<Self> {
        let history_dir = history_dir.into();
        fs::create_dir_all(&history_dir)
            .with_context(|| format!("creating history directory {:?}", &history_dir))?;
        Ok(Self { history_dir })
    }

    pub fn path_for(&self, dag_id: &str) -> PathBuf {
        self.history_dir.join(format!("{}_runs.jsonl", dag_id))
    }

    pub fn record(&self, report: &RunReport) -> Result<()> {
        let path = self.path_for(&report.dag_id);
        let mut line = serde_json::to_vec(report).context("serializing run report")?;
        line.push(b'\n');
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening history file {:?}", &path))?;
        f.write_all(&line)
            .with_context(|| format!("appending to history file {:?}", &path))?;
        Ok(())
    }

    /// All recorded runs of `dag_id` in the order they were written.
    /// Unparseable lines are skipped with a warning.
    pub fn load(&self, dag_id: &str) -> Result<Vec<RunReport>> {
        let path = self.path_for(dag_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let f = fs::File::open(&path)
            .with_context(|| format!("opening history file {:?}", &path))?;
        let mut out = Vec::new();
        for (idx, line) in BufReader::new(f).lines().enumerate() {
            let line = line.with_context(|| format!("reading {:?}", &path))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RunReport>(&line) {
                Ok(r) => out.push(r),
                Err(e) => warn!(path = %path.display(), line = idx + 1, error = %e, "skipping bad history line"),
            }
        }
        Ok(out)
    }

    /// Latest logical date that has a recorded run, whatever its outcome.
    pub fn last_logical_date(&self, dag_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .load(dag_id)?
            .into_iter()
            .map(|r| r.logical_date)
            .max())
    }
}
