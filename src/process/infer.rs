use serde::Serialize;
use std::fmt;

/// Cell spellings read as missing, matching the usual dataframe readers.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_VALUES: &[&str] = &["True", "TRUE", "true"];
const FALSE_VALUES: &[&str] = &["False", "FALSE", "false"];

/// One typed cell of a row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// Type shared by every cell of one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Only missing cells.
    Null,
    Bool,
    Int,
    Float,
    Str,
}

pub fn is_na(cell: &str) -> bool {
    NA_VALUES.contains(&cell)
}

fn parse_bool(cell: &str) -> Option<bool> {
    if TRUE_VALUES.contains(&cell) {
        Some(true)
    } else if FALSE_VALUES.contains(&cell) {
        Some(false)
    } else {
        None
    }
}

fn parse_int(cell: &str) -> Option<i64> {
    cell.trim().parse::<i64>().ok()
}

fn parse_float(cell: &str) -> Option<f64> {
    // "inf"/"nan" parse as f64 but have no JSON representation
    cell.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Classify a single non-missing cell.
fn cell_type(cell: &str) -> ColumnType {
    if parse_int(cell).is_some() {
        ColumnType::Int
    } else if parse_float(cell).is_some() {
        ColumnType::Float
    } else if parse_bool(cell).is_some() {
        ColumnType::Bool
    } else {
        ColumnType::Str
    }
}

/// Widen two cell types into the narrowest type that holds both.
fn unify(a: ColumnType, b: ColumnType) -> ColumnType {
    use ColumnType::*;
    match (a, b) {
        (Null, t) | (t, Null) => t,
        (x, y) if x == y => x,
        (Int, Float) | (Float, Int) => Float,
        _ => Str,
    }
}

/// Infer the type of a column from all of its cells.
pub fn infer_column<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnType {
    let mut ty = ColumnType::Null;
    for cell in cells {
        if is_na(cell) {
            continue;
        }
        ty = unify(ty, cell_type(cell));
        if ty == ColumnType::Str {
            break;
        }
    }
    ty
}

/// Convert a raw cell into a [`Scalar`] of the column's inferred type.
///
/// Missing cells become `Null` without widening the column: an integer
/// column with gaps is written as integers and `null`, where a dataframe
/// reader would turn the whole column into floats (`30.0`, `null`).
pub fn to_scalar(cell: &str, ty: ColumnType) -> Scalar {
    if is_na(cell) {
        return Scalar::Null;
    }
    match ty {
        ColumnType::Null => Scalar::Null,
        ColumnType::Bool => parse_bool(cell).map_or(Scalar::Null, Scalar::Bool),
        ColumnType::Int => parse_int(cell).map_or(Scalar::Null, Scalar::Int),
        ColumnType::Float => parse_float(cell).map_or(Scalar::Null, Scalar::Float),
        ColumnType::Str => Scalar::Str(cell.to_string()),
    }
}
