//! CSV helpers for prediction and feature files.
//!
//! Supported format:
//! - UTF-8, comma-separated, one record per line
//! - Optional header row (auto-detected: first row is a header if any cell
//!   after the first is non-numeric)
//! - Double-quoted fields with `""` escapes; written fields are quoted only
//!   when needed

use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Rows of a feature file: optional identifier plus the numeric values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub id: Option<String>,
    pub values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Quotes `field` when it contains a comma, a quote or a line break.
pub fn escape_field(field: &str) -> String {
    if field.contains(|c: char| c == ',' || c == '"' || c == '\n' || c == '\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

/// Writes `header` and `rows` to `path`, replacing any existing file.
pub fn write_rows<I>(path: &Path, header: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = std::io::BufWriter::new(file);
    let mut emit = |cells: &[String]| -> std::io::Result<()> {
        let line: Vec<String> = cells.iter().map(|c| escape_field(c)).collect();
        writeln!(writer, "{}", line.join(","))
    };
    emit(header).map_err(|e| Error::io(path, e))?;
    for row in rows {
        emit(&row).map_err(|e| Error::io(path, e))?;
    }
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Writes `image_id,f0,f1,...` rows.
pub fn write_features(path: &Path, rows: &[(String, Vec<f64>)]) -> Result<()> {
    let dim = rows.first().map_or(0, |(_, v)| v.len());
    let mut header = vec!["image_id".to_owned()];
    header.extend((0..dim).map(|i| format!("f{}", i)));
    write_rows(
        path,
        &header,
        rows.iter().map(|(id, values)| {
            let mut cells = vec![id.clone()];
            cells.extend(values.iter().map(|v| v.to_string()));
            cells
        }),
    )
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Parses a feature CSV. The first column is the row identifier when the
/// header names it `image_id` (or `id`), or when its value is non-numeric;
/// every other cell must be a float and all rows must have the same width.
pub fn parse_features(text: &str) -> Result<Vec<FeatureRow>> {
    let mut lines = text.lines().peekable();
    let mut id_column = false;

    if let Some(first) = lines.peek() {
        if is_header(first) {
            id_column = parse_csv_row(first)
                .first()
                .map(|c| c.trim())
                .map_or(false, |c| c.eq_ignore_ascii_case("image_id") || c.eq_ignore_ascii_case("id"));
            lines.next();
        }
    }

    let mut rows: Vec<FeatureRow> = Vec::new();
    for (row_idx, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells = parse_csv_row(line);
        let (id, value_cells) = match cells.split_first() {
            Some((first, rest)) if id_column || first.trim().parse::<f64>().is_err() => {
                (Some(first.clone()), rest)
            }
            _ => (None, &cells[..]),
        };
        let values = parse_floats(value_cells, row_idx + 1)?;
        rows.push(FeatureRow { id, values });
    }

    let Some(first) = rows.first() else {
        return Err(Error::InvalidCsv("CSV contains no data rows after parsing".into()));
    };
    let n_feats = first.values.len();
    if n_feats == 0 {
        return Err(Error::InvalidCsv("rows have no numeric columns".into()));
    }
    for (i, row) in rows.iter().enumerate() {
        if row.values.len() != n_feats {
            return Err(Error::InvalidCsv(format!(
                "Row {}: feature count {} does not match first row's {}",
                i + 1, row.values.len(), n_feats
            )));
        }
    }
    Ok(rows)
}

pub fn read_features(path: &Path) -> Result<Vec<FeatureRow>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_features(&text)
}

/// Returns `true` if the row looks like a header: some cell past the first
/// is non-numeric (the first may be an identifier column).
fn is_header(line: &str) -> bool {
    let cells = parse_csv_row(line);
    cells.iter().skip(1).any(|c| {
        let t = c.trim();
        !t.is_empty() && t.parse::<f64>().is_err()
    }) || (cells.len() == 1 && cells[0].trim().parse::<f64>().is_err())
}

/// Parses a single CSV row, handling double-quoted fields.
pub fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                    // Escaped quote inside quoted field.
                    current.push('"');
                    i += 2;
                    continue;
                }
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            c => current.push(c),
        }
        i += 1;
    }
    fields.push(current);
    fields
}

/// Parses a slice of string cells as `f64`, returning an error with row info on failure.
fn parse_floats(cells: &[String], row_num: usize) -> Result<Vec<f64>> {
    cells.iter()
        .map(|c| {
            c.trim().parse::<f64>().map_err(|_| {
                Error::InvalidCsv(format!("Row {}: '{}' is not a valid number", row_num, c))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_round_trips_through_the_row_parser() {
        let fields = ["plain", "with,comma", "say \"hi\""];
        let line: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        assert_eq!(parse_csv_row(&line.join(",")), fields);
    }

    #[test]
    fn parses_features_with_header_and_ids() {
        let rows = parse_features("image_id,f0,f1\ncat,0.5,1\ndog,-2,3e-1\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id.as_deref(), Some("cat"));
        assert_eq!(rows[1].values, vec![-2.0, 0.3]);
    }

    #[test]
    fn parses_bare_numeric_rows() {
        let rows = parse_features("0.1,0.2\n\n0.3,0.4\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.id.is_none()));
    }

    #[test]
    fn rejects_ragged_and_non_numeric_rows() {
        assert!(parse_features("a,1,2\nb,1\n").is_err());
        assert!(parse_features("a,1,x\n").is_err());
        assert!(parse_features("h0,h1\n").is_err());
    }

    #[test]
    fn feature_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");
        let written = vec![
            ("a".to_owned(), vec![0.25, 1.5]),
            ("b,c".to_owned(), vec![-1.0, 0.0]),
            ("123".to_owned(), vec![2.0, 4.0]),
        ];
        write_features(&path, &written).unwrap();
        let rows = read_features(&path).unwrap();
        assert_eq!(rows[1].id.as_deref(), Some("b,c"));
        assert_eq!(rows[2].id.as_deref(), Some("123"));
        assert_eq!(rows[2].values, vec![2.0, 4.0]);
        assert_eq!(rows[0].values, vec![0.25, 1.5]);
    }
}
