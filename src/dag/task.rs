use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::TransformConfig,
    process::{convert, ConvertSummary},
};

/// What a task does when it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    /// Log a fixed message; never fails.
    Echo { message: String },
    /// Convert one CSV file to a JSON array of records.
    CsvToJson(TransformConfig),
}

/// One entry of a DAG's ordered task list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskSpec {
    pub task_id: String,
    pub operator: Operator,
}

/// Result of a successful task body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskOutput {
    Echoed { message: String },
    Converted(ConvertSummary),
}

impl TaskSpec {
    pub fn echo(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            operator: Operator::Echo {
                message: message.into(),
            },
        }
    }

    pub fn csv_to_json(task_id: impl Into<String>, cfg: TransformConfig) -> Self {
        Self {
            task_id: task_id.into(),
            operator: Operator::CsvToJson(cfg),
        }
    }

    /// Run the task body once. Blocking; callers on the runtime should use
    /// `spawn_blocking`.
    pub fn execute(&self) -> Result<TaskOutput> {
        match &self.operator {
            Operator::Echo { message } => {
                info!(target: "csvdag::notify", "{}", message);
                Ok(TaskOutput::Echoed {
                    message: message.clone(),
                })
            }
            Operator::CsvToJson(cfg) => Ok(TaskOutput::Converted(convert(cfg)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TransformError};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn echo_always_succeeds() {
        let t = TaskSpec::echo("starting", "hello");
        assert_eq!(
            t.execute().unwrap(),
            TaskOutput::Echoed {
                message: "hello".into()
            }
        );
    }

    #[test]
    fn csv_to_json_reports_summary_and_keeps_error_type() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("data.csv");
        fs::write(&input, "name\nAda\n")?;
        let cfg = TransformConfig::new(&input, dir.path().join("out.json"));

        match TaskSpec::csv_to_json("convert", cfg.clone()).execute()? {
            TaskOutput::Converted(s) => assert_eq!(s.rows, 1),
            other => panic!("unexpected {other:?}"),
        }

        fs::remove_file(&input)?;
        let err = TaskSpec::csv_to_json("convert", cfg).execute().unwrap_err();
        let kind = err.downcast_ref::<TransformError>().map(|e| e.kind());
        assert_eq!(kind, Some(ErrorKind::Io));
        Ok(())
    }
}
