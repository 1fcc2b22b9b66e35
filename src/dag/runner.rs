// src/dag/runner.rs
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, field, info, info_span, Instrument};

use super::{task::TaskOutput, Dag};
use crate::error::TransformError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Success,
    Failed,
    /// Not executed because an earlier task failed.
    UpstreamFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Success,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    Scheduled,
    Manual,
}

impl RunType {
    pub fn as_str(&self) -> &str {
        match self {
            RunType::Scheduled => "scheduled",
            RunType::Manual => "manual",
        }
    }
}

/// Outcome of one task within a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub task_id: String,
    pub state: TaskState,
    pub tries: u32,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub output: Option<TaskOutput>,
    /// `IOError`, `SchemaError` or `ParseError` when the transform failed.
    pub error_kind: Option<String>,
    pub error: Option<String>,
}

/// One scheduled or manual execution of a DAG's task list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub dag_id: String,
    pub run_id: String,
    pub run_type: RunType,
    pub logical_date: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub state: RunState,
    pub tasks: Vec<TaskInstance>,
}

impl RunReport {
    pub fn task(&self, task_id: &str) -> Option<&TaskInstance> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }
}

pub fn run_id(run_type: RunType, logical_date: DateTime<Utc>) -> String {
    format!("{}__{}", run_type.as_str(), logical_date.to_rfc3339())
}

/// Execute every task of `dag` in list order. Each task gets the DAG's retry
/// budget; once one exhausts it the remaining tasks are marked upstream
/// failed and the run fails.
pub async fn run_dag(
    dag: &Dag,
    logical_date: DateTime<Utc>,
    run_type: RunType,
) -> Result<RunReport> {
    dag.validate()?;
    let run_id = run_id(run_type, logical_date);
    let span = info_span!("run", dag_id = %dag.dag_id, run_id = %run_id);

    let report = async move {
        info!("run started");
        let start = Utc::now();
        let mut tasks = Vec::with_capacity(dag.tasks.len());
        let mut failed = false;

        for spec in &dag.tasks {
            if failed {
                tasks.push(TaskInstance {
                    task_id: spec.task_id.clone(),
                    state: TaskState::UpstreamFailed,
                    tries: 0,
                    start: None,
                    end: None,
                    output: None,
                    error_kind: None,
                    error: None,
                });
                continue;
            }

            let task_start = Utc::now();
            let task_span = info_span!(
                "task",
                task_id = %spec.task_id,
                try_number = field::Empty
            );
            let attempts = dag
                .retry
                .execute(|try_number| {
                    task_span.record("try_number", try_number);
                    let spec = spec.clone();
                    // the blocking pool does not inherit the caller's span
                    let span = task_span.clone();
                    async move {
                        match tokio::task::spawn_blocking(move || span.in_scope(|| spec.execute()))
                            .await
                        {
                            Ok(res) => res,
                            Err(e) => Err(anyhow!("task panicked: {}", e)),
                        }
                    }
                })
                .instrument(task_span.clone())
                .await;
            let task_end = Utc::now();

            let instance = match attempts.result {
                Ok(output) => {
                    info!(task_id = %spec.task_id, tries = attempts.tries, "task succeeded");
                    TaskInstance {
                        task_id: spec.task_id.clone(),
                        state: TaskState::Success,
                        tries: attempts.tries,
                        start: Some(task_start),
                        end: Some(task_end),
                        output: Some(output),
                        error_kind: None,
                        error: None,
                    }
                }
                Err(e) => {
                    error!(task_id = %spec.task_id, tries = attempts.tries, error = %e, "task failed");
                    failed = true;
                    TaskInstance {
                        task_id: spec.task_id.clone(),
                        state: TaskState::Failed,
                        tries: attempts.tries,
                        start: Some(task_start),
                        end: Some(task_end),
                        output: None,
                        error_kind: e
                            .downcast_ref::<TransformError>()
                            .map(|te| te.kind().as_str().to_string()),
                        error: Some(format!("{:#}", e)),
                    }
                }
            };
            tasks.push(instance);
        }

        let state = if failed {
            RunState::Failed
        } else {
            RunState::Success
        };
        info!(?state, "run finished");

        RunReport {
            dag_id: dag.dag_id.clone(),
            run_id,
            run_type,
            logical_date,
            start,
            end: Utc::now(),
            state,
            tasks,
        }
    }
    .instrument(span)
    .await;

    Ok(report)
}
