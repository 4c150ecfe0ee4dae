//! Fold manifest parsing.
//!
//! A manifest is a UTF-8 CSV with one sample per row:
//! `image_path,mask_path,label,intensity`. Paths are relative to the data
//! root. An optional header row is auto-detected: if the label or intensity
//! cell of the first row fails to parse as a number, the row is skipped.
//! Double-quoted fields with embedded commas are handled correctly.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One manifest row, paths not yet resolved against the data root.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub image: PathBuf,
    pub mask: PathBuf,
    pub label: usize,
    pub intensity: f64,
}

/// Path of one cross-validation fold's training manifest, e.g.
/// `foldA_train.csv` under the manifest directory.
pub fn fold_manifest_path<P: AsRef<Path>>(manifest_dir: P, fold: &str) -> PathBuf {
    manifest_dir
        .as_ref()
        .join(format!("fold{}_train.csv", fold))
}

pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<ManifestEntry>> {
    let text = fs::read_to_string(path)?;
    parse_manifest(&text)
}

/// Parses manifest text into entries. Empty lines are skipped; any other
/// malformed row aborts with its 1-based row number.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>> {
    let mut lines = text.lines().peekable();
    if let Some(first) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    let mut entries = Vec::new();
    for (row_idx, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells = parse_csv_row(line);
        if cells.len() != 4 {
            return Err(Error::Dataset(format!(
                "row {}: expected 4 columns (image, mask, label, intensity), got {}",
                row_idx + 1,
                cells.len()
            )));
        }

        let label = cells[2].trim().parse::<usize>().map_err(|_| {
            Error::Dataset(format!(
                "row {}: label '{}' is not a non-negative integer",
                row_idx + 1,
                cells[2]
            ))
        })?;
        let intensity = cells[3].trim().parse::<f64>().map_err(|_| {
            Error::Dataset(format!(
                "row {}: intensity '{}' is not a number",
                row_idx + 1,
                cells[3]
            ))
        })?;

        entries.push(ManifestEntry {
            image: PathBuf::from(cells[0].trim()),
            mask: PathBuf::from(cells[1].trim()),
            label,
            intensity,
        });
    }

    if entries.is_empty() {
        return Err(Error::Dataset(
            "manifest contains no data rows after parsing".to_string(),
        ));
    }
    Ok(entries)
}

/// Returns `true` if the row looks like a header: four cells whose label or
/// intensity column is non-numeric. The path columns are always non-numeric,
/// so only those two columns can tell a header from a data row. Rows with
/// the wrong cell count are left for `parse_manifest` to reject with a row
/// number.
fn is_header(line: &str) -> bool {
    let cells = parse_csv_row(line);
    if cells.len() != 4 {
        return false;
    }
    cells[2].trim().parse::<usize>().is_err() || cells[3].trim().parse::<f64>().is_err()
}

/// Parses a single CSV row, handling double-quoted fields.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote inside quoted field.
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_the_header() {
        let text = "image,mask,label,intensity\n\
                    img/a.png,msk/a.png,2,1\n\
                    \n\
                    img/b.png,msk/b.png,0,0\n";
        let entries = parse_manifest(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].image, PathBuf::from("img/a.png"));
        assert_eq!(entries[0].label, 2);
        assert_eq!(entries[1].intensity, 0.0);
    }

    #[test]
    fn headerless_manifest_keeps_its_first_row() {
        let entries = parse_manifest("a.png,b.png,1,0\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, 1);
    }

    #[test]
    fn quoted_paths_may_contain_commas() {
        let entries = parse_manifest("\"scans, batch 1/x.png\",m.png,0,1\n").unwrap();
        assert_eq!(entries[0].image, PathBuf::from("scans, batch 1/x.png"));
    }

    #[test]
    fn malformed_rows_report_their_row_number() {
        let err = parse_manifest("a.png,b.png,1,0\nc.png,d.png,oops,1\n").unwrap_err();
        assert!(err.to_string().contains("row 2"));

        let err = parse_manifest("a.png,b.png,1\n").unwrap_err();
        assert!(err.to_string().contains("4 columns"));
    }

    #[test]
    fn empty_manifest_is_an_error() {
        assert!(parse_manifest("image,mask,label,intensity\n").is_err());
        assert!(parse_manifest("").is_err());
    }

    #[test]
    fn fold_paths_follow_the_cross_validation_layout() {
        let path = fold_manifest_path("dataset/crossValidationCSVs", "A");
        assert_eq!(
            path,
            PathBuf::from("dataset/crossValidationCSVs/foldA_train.csv")
        );
    }
}
