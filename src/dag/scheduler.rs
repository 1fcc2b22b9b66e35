// src/dag/scheduler.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

use super::{
    runner::{run_dag, RunReport, RunState, RunType},
    Dag,
};
use crate::history::RunHistory;

/// Drives a [`Dag`] on its schedule, one run at a time, recording every run
/// in the history ledger.
pub struct Scheduler {
    dag: Dag,
    history: RunHistory,
}

impl Scheduler {
    pub fn new(dag: Dag, history: RunHistory) -> Self {
        Self { dag, history }
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    /// Run the interval that is due at `now`, if any.
    pub async fn tick(
        &self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Option<RunReport>> {
        let Some(logical_date) = self.dag.schedule.next_due(last, now) else {
            return Ok(None);
        };
        let report = self.execute(logical_date, RunType::Scheduled).await?;
        Ok(Some(report))
    }

    /// Run the DAG once now, outside the schedule.
    pub async fn trigger(&self, logical_date: Option<DateTime<Utc>>) -> Result<RunReport> {
        self.execute(logical_date.unwrap_or_else(Utc::now), RunType::Manual)
            .await
    }

    async fn execute(&self, logical_date: DateTime<Utc>, run_type: RunType) -> Result<RunReport> {
        let report = run_dag(&self.dag, logical_date, run_type).await?;
        self.history.record(&report)?;
        match report.state {
            RunState::Success => info!(run_id = %report.run_id, "run succeeded"),
            RunState::Failed => error!(run_id = %report.run_id, "run failed"),
        }
        Ok(report)
    }

    /// Loop until Ctrl-C, or until `max_runs` scheduled runs have executed.
    /// Resumes after the last logical date found in history. Returns the
    /// number of runs executed.
    pub async fn run(&self, max_runs: Option<usize>) -> Result<usize> {
        let mut last = self.history.last_logical_date(&self.dag.dag_id)?;
        let mut completed = 0usize;
        info!(
            dag_id = %self.dag.dag_id,
            owner = %self.dag.owner,
            interval = ?self.dag.schedule.interval,
            last = ?last,
            "scheduler started"
        );

        loop {
            if max_runs.is_some_and(|m| completed >= m) {
                break;
            }

            let now = Utc::now();
            if let Some(report) = self.tick(last, now).await? {
                last = Some(report.logical_date);
                completed += 1;
                continue;
            }

            let Some(wake) = self.dag.schedule.next_wakeup(last, now) else {
                warn!(last = ?last, "no further interval fits the calendar");
                break;
            };
            let wait = (wake - now).to_std().unwrap_or(Duration::ZERO);
            info!(next = %wake, "waiting for next interval");
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        warn!("ctrl-c handler failed: {}", e);
                    }
                    info!("shutdown requested");
                    break;
                }
            }
        }

        info!(runs = completed, "scheduler stopped");
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DagConfig, TransformConfig};
    use chrono::TimeDelta;
    use std::fs;
    use tempfile::tempdir;

    fn setup(dir: &std::path::Path, catchup: bool, start: DateTime<Utc>) -> Scheduler {
        let mut cfg = DagConfig::default();
        cfg.transform = TransformConfig::new(dir.join("data.csv"), dir.join("out.json"));
        cfg.start_date = start;
        cfg.schedule_interval_secs = 60;
        cfg.retry_delay_secs = 0;
        cfg.catchup = catchup;
        let dag = Dag::from_config(&cfg).unwrap();
        Scheduler::new(dag, RunHistory::new(dir.join("history")).unwrap())
    }

    #[tokio::test]
    async fn catchup_runs_each_interval_and_records_history() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("data.csv"), "name\nAda\n")?;
        let start = Utc::now() - TimeDelta::minutes(10);
        let s = setup(dir.path(), true, start);

        assert_eq!(s.run(Some(3)).await?, 3);
        let runs = s.history().load("MyCSVDAG")?;
        let dates: Vec<_> = runs.iter().map(|r| r.logical_date).collect();
        assert_eq!(
            dates,
            vec![start, start + TimeDelta::minutes(1), start + TimeDelta::minutes(2)]
        );
        assert!(runs.iter().all(|r| r.state == RunState::Success));

        // a restarted scheduler resumes after the last recorded interval
        assert_eq!(s.run(Some(1)).await?, 1);
        let runs = s.history().load("MyCSVDAG")?;
        assert_eq!(runs[3].logical_date, start + TimeDelta::minutes(3));
        Ok(())
    }

    #[tokio::test]
    async fn failed_runs_are_recorded_too() -> Result<()> {
        let dir = tempdir()?;
        let start = Utc::now() - TimeDelta::minutes(5);
        let s = setup(dir.path(), false, start);

        let report = s.tick(None, Utc::now()).await?.expect("an interval is due");
        assert_eq!(report.state, RunState::Failed);
        assert_eq!(report.run_type, RunType::Scheduled);
        assert_eq!(s.history().load("MyCSVDAG")?.len(), 1);

        // nothing else is due right after the latest interval ran
        let again = s.tick(Some(report.logical_date), Utc::now()).await?;
        assert!(again.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn manual_trigger_ignores_the_schedule() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("data.csv"), "name\nAda\n")?;
        let s = setup(dir.path(), false, Utc::now() + TimeDelta::days(1));

        let report = s.trigger(None).await?;
        assert_eq!(report.run_type, RunType::Manual);
        assert!(report.run_id.starts_with("manual__"));
        assert_eq!(report.state, RunState::Success);
        Ok(())
    }
}
