use std::path::Path;

use crate::error::{Error, Result};
use crate::records::csv::{parse_csv_row, write_rows};

pub const PREDICTION_HEADER: [&str; 2] = ["image_id", "prediction_label"];

/// One output row. `label` is `None` when the image produced no prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRecord {
    pub image_id: String,
    pub label: Option<usize>,
}

impl PredictionRecord {
    pub fn new(image_id: impl Into<String>, label: Option<usize>) -> Self {
        PredictionRecord { image_id: image_id.into(), label }
    }
}

/// Writes `image_id,prediction_label` rows, blank label for `None`.
pub fn write_predictions(path: &Path, records: &[PredictionRecord]) -> Result<()> {
    let header: Vec<String> = PREDICTION_HEADER.iter().map(|h| h.to_string()).collect();
    write_rows(
        path,
        &header,
        records.iter().map(|r| {
            vec![r.image_id.clone(), r.label.map(|l| l.to_string()).unwrap_or_default()]
        }),
    )
}

/// Reads a file written by `write_predictions`.
pub fn read_predictions(path: &Path) -> Result<Vec<PredictionRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut lines = text.lines();

    let header = lines.next().map(parse_csv_row).unwrap_or_default();
    if header != PREDICTION_HEADER {
        return Err(Error::InvalidCsv(format!(
            "{}: expected header {}",
            path.display(),
            PREDICTION_HEADER.join(",")
        )));
    }

    lines
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, line)| {
            let cells = parse_csv_row(line);
            if cells.len() != 2 {
                return Err(Error::InvalidCsv(format!(
                    "Row {}: expected 2 columns, got {}",
                    i + 1,
                    cells.len()
                )));
            }
            let label = match cells[1].trim() {
                "" => None,
                s => Some(s.parse::<usize>().map_err(|_| {
                    Error::InvalidCsv(format!("Row {}: '{}' is not a cluster label", i + 1, s))
                })?),
            };
            Ok(PredictionRecord::new(cells[0].clone(), label))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_labels_are_written_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        let records = vec![
            PredictionRecord::new("cat", Some(1)),
            PredictionRecord::new("dog", None),
        ];
        write_predictions(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "image_id,prediction_label\ncat,1\ndog,\n");
        assert_eq!(read_predictions(&path).unwrap(), records);
    }

    #[test]
    fn writing_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        std::fs::write(&path, "stale\nstale\nstale\n").unwrap();
        write_predictions(&path, &[PredictionRecord::new("x", Some(0))]).unwrap();
        assert_eq!(read_predictions(&path).unwrap().len(), 1);
    }

    #[test]
    fn rejects_foreign_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        std::fs::write(&path, "id,label\na,1\n").unwrap();
        assert!(read_predictions(&path).is_err());
    }
}
