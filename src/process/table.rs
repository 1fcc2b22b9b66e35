// src/process/table.rs
use csv::ReaderBuilder;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::debug;

use super::infer::{infer_column, to_scalar, Scalar};
use crate::error::TransformError;

/// An ordered sequence of rows sharing the header's schema.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// Column names in file order.
    pub headers: Vec<String>,
    /// One entry per data line, each exactly `headers.len()` long.
    pub rows: Vec<Vec<Scalar>>,
}

/// Borrowed view of one row, serialized as a JSON object in header order.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    pub headers: &'a [String],
    pub values: &'a [Scalar],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Scalar> {
        self.headers
            .iter()
            .position(|h| h == column)
            .map(|i| &self.values[i])
    }
}

impl Table {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            headers: &self.headers,
            values,
        })
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.headers.len()))?;
        for (k, v) in self.headers.iter().zip(self.values) {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows() {
            seq.serialize_element(&row)?;
        }
        seq.end()
    }
}

fn csv_error(path: &Path, err: csv::Error) -> TransformError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let details = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => TransformError::io(path, e),
        _ => TransformError::parse(path, line, details),
    }
}

/// Open `path` and parse it with [`read_table`].
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table, TransformError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| TransformError::io(path, e))?;
    read_table(BufReader::new(file), path)
}

/// Parse comma-separated text whose first line is the header.
///
/// Every data line must carry exactly as many fields as the header; blank
/// lines are skipped. `origin` only labels errors.
pub fn read_table<R: Read>(reader: R, origin: &Path) -> Result<Table, TransformError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        // field counts are checked below so the error can name the line
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| csv_error(origin, e))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        return Err(TransformError::schema(origin, "no header row"));
    }
    let mut seen = HashSet::with_capacity(headers.len());
    for h in &headers {
        if !seen.insert(h.as_str()) {
            return Err(TransformError::schema(
                origin,
                format!("duplicate column `{}` in header", h),
            ));
        }
    }

    let mut raw: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(origin, e))?;
        if record.len() != headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(TransformError::parse(
                origin,
                line,
                format!(
                    "expected {} fields, found {}",
                    headers.len(),
                    record.len()
                ),
            ));
        }
        raw.push(record.iter().map(str::to_string).collect());
    }

    let types: Vec<_> = (0..headers.len())
        .map(|col| infer_column(raw.iter().map(|r| r[col].as_str())))
        .collect();
    debug!(columns = headers.len(), rows = raw.len(), ?types, "parsed csv");

    let rows = raw
        .iter()
        .map(|r| {
            r.iter()
                .zip(&types)
                .map(|(cell, ty)| to_scalar(cell, *ty))
                .collect()
        })
        .collect();

    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Table, TransformError> {
        read_table(Cursor::new(text.as_bytes().to_vec()), Path::new("test.csv"))
    }

    #[test]
    fn header_and_rows_in_file_order() {
        let t = parse("name,age\nAlice,30\nBob,25\n").unwrap();
        assert_eq!(t.headers, vec!["name", "age"]);
        assert_eq!(t.len(), 2);
        let names: Vec<String> = t.rows().map(|r| r.get("name").unwrap().to_string()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(t.rows[1][1], Scalar::Int(25));
    }

    #[test]
    fn quoted_fields_and_blank_lines() {
        let t = parse("name,city\n\"Smith, J\",\"New\nYork\"\n\nLee,Oslo\n").unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[0][0], Scalar::Str("Smith, J".into()));
        assert_eq!(t.rows[0][1], Scalar::Str("New\nYork".into()));
    }

    #[test]
    fn short_and_long_rows_are_parse_errors() {
        let err = parse("name,age\nAlice,30\nBob\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        match err {
            TransformError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected {other:?}"),
        }
        let err = parse("name,age\nAlice,30,extra\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn empty_input_and_duplicate_columns_are_schema_errors() {
        assert_eq!(parse("").unwrap_err().kind(), ErrorKind::Schema);
        assert_eq!(parse("a,a\n1,2\n").unwrap_err().kind(), ErrorKind::Schema);
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let bytes = b"name\n\xff\xfe\n".to_vec();
        let err = read_table(Cursor::new(bytes), Path::new("bin.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_table("/no/such/dir/data.csv").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
