// src/dag/mod.rs
use anyhow::{bail, Result};
use std::collections::HashSet;

use crate::config::DagConfig;

pub mod retry;
pub mod runner;
pub mod schedule;
pub mod scheduler;
pub mod task;

use retry::RetryPolicy;
use schedule::Schedule;
use task::TaskSpec;

pub const NOTIFY_TASK_ID: &str = "starting";
pub const CONVERT_TASK_ID: &str = "convertCSVtoJSON";

/// A workflow: an ordered task list where each task depends on the one
/// before it, plus the retry policy and schedule the host applies.
#[derive(Clone, Debug, PartialEq)]
pub struct Dag {
    pub dag_id: String,
    pub owner: String,
    pub tasks: Vec<TaskSpec>,
    pub retry: RetryPolicy,
    pub schedule: Schedule,
}

impl Dag {
    /// Build the notifier → CSV-to-JSON workflow from `cfg`.
    pub fn from_config(cfg: &DagConfig) -> Result<Self> {
        cfg.validate()?;
        let dag = Dag {
            dag_id: cfg.dag_id.clone(),
            owner: cfg.owner.clone(),
            tasks: vec![
                TaskSpec::echo(NOTIFY_TASK_ID, cfg.notify_message.clone()),
                TaskSpec::csv_to_json(CONVERT_TASK_ID, cfg.transform.clone()),
            ],
            retry: cfg.retry_policy(),
            schedule: cfg.schedule(),
        };
        dag.validate()?;
        Ok(dag)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            bail!("dag `{}` has no tasks", self.dag_id);
        }
        let mut seen = HashSet::new();
        for t in &self.tasks {
            if !seen.insert(t.task_id.as_str()) {
                bail!("dag `{}` has duplicate task id `{}`", self.dag_id, t.task_id);
            }
        }
        Ok(())
    }

    /// Dependency edges `(upstream, downstream)` implied by the list order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.tasks
            .windows(2)
            .map(|w| (w[0].task_id.as_str(), w[1].task_id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_dag_has_two_ordered_tasks() {
        let dag = Dag::from_config(&DagConfig::default()).unwrap();
        assert_eq!(dag.dag_id, "MyCSVDAG");
        assert_eq!(dag.edges(), vec![(NOTIFY_TASK_ID, CONVERT_TASK_ID)]);
        assert_eq!(dag.retry, RetryPolicy::new(1, Duration::from_secs(300)));
        assert_eq!(dag.schedule.interval, Duration::from_secs(300));
    }

    #[test]
    fn duplicate_or_missing_tasks_are_rejected() {
        let mut dag = Dag::from_config(&DagConfig::default()).unwrap();
        dag.tasks.push(TaskSpec::echo(NOTIFY_TASK_ID, "again"));
        assert!(dag.validate().is_err());
        dag.tasks.clear();
        assert!(dag.validate().is_err());
    }
}
