// src/process/mod.rs
pub mod convert;
pub mod infer;
pub mod table;
pub mod write;

pub use convert::{convert, convert_with, ConvertSummary};
pub use infer::{ColumnType, Scalar};
pub use table::{load_table, read_table, Row, Table};
pub use write::write_json_atomic;
