use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use super::{infer::Scalar, table::load_table, write::write_json_atomic};
use crate::{config::TransformConfig, error::TransformError};

/// What one successful conversion produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSummary {
    pub rows: usize,
    pub columns: usize,
    pub output_path: PathBuf,
    pub bytes_written: u64,
}

/// Convert the configured CSV file into a JSON array of records, logging the
/// diagnostic column of every row under the `csvdag::diagnostic` target.
pub fn convert(cfg: &TransformConfig) -> Result<ConvertSummary, TransformError> {
    convert_with(cfg, |value| {
        info!(target: "csvdag::diagnostic", "{}", value);
    })
}

/// Same as [`convert`], handing each row's diagnostic value to `emit`.
///
/// Pipeline: read → validate → emit per row → serialize → write. Rows
/// emitted before a failure stay emitted; the output file is only replaced
/// once the whole array has been written.
#[tracing::instrument(
    level = "info",
    skip(cfg, emit),
    fields(input = %cfg.input_path.display(), output = %cfg.output_path.display())
)]
pub fn convert_with<F>(cfg: &TransformConfig, mut emit: F) -> Result<ConvertSummary, TransformError>
where
    F: FnMut(&Scalar),
{
    let table = load_table(&cfg.input_path)?;

    let idx = table.column_index(&cfg.diagnostic_column).ok_or_else(|| {
        TransformError::schema(
            &cfg.input_path,
            format!("missing column `{}` in header", cfg.diagnostic_column),
        )
    })?;

    for values in &table.rows {
        emit(&values[idx]);
    }

    let bytes_written = write_json_atomic(&table, &cfg.output_path)?;
    info!(
        rows = table.len(),
        columns = table.headers.len(),
        bytes = bytes_written,
        "wrote json"
    );

    Ok(ConvertSummary {
        rows: table.len(),
        columns: table.headers.len(),
        output_path: cfg.output_path.clone(),
        bytes_written,
    })
}
