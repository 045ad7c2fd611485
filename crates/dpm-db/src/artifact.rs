//! Artefact persistence (§5, §6): CSV/ARFF/model-blob storage behind a
//! trait, with a single file-based backend.
//!
//! Grounded on this crate's own file-based vector-index backend: writes go
//! to a temp file in the destination directory and are renamed into place,
//! so a reader never observes a half-written artefact (§5: "this project's
//! storage layer performs temp + rename unconditionally").

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{DbError, DbResult};

/// A parsed or about-to-be-written ARFF table: columns (class last) and a
/// row-major numeric matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArffTable {
    /// Column names, class attribute last.
    pub columns: Vec<String>,
    /// Row-major numeric matrix.
    pub rows: Vec<Vec<f64>>,
}

/// The artefact-persistence capability.
pub trait ArtifactStore {
    /// Write a CSV file with a header row and string-rendered data rows.
    /// All fields are quoted (§6).
    fn write_csv(&self, path: &Path, header: &[String], rows: &[Vec<String>]) -> DbResult<()>;

    /// Read back a CSV file written by [`ArtifactStore::write_csv`],
    /// returning its header and data rows as strings.
    fn read_csv(&self, path: &Path) -> DbResult<(Vec<String>, Vec<Vec<String>>)>;

    /// Write an ARFF file: `relation` names the `@RELATION`, `columns` are
    /// attribute names (class last, written as `{no,yes}`), `rows` holds the
    /// numeric matrix with the class value encoded as 0.0/1.0.
    fn write_arff(&self, path: &Path, relation: &str, table: &ArffTable) -> DbResult<()>;

    /// Read back an ARFF file written by [`ArtifactStore::write_arff`].
    fn read_arff(&self, path: &Path) -> DbResult<ArffTable>;

    /// Write an opaque binary blob (a serialized, tuned classifier).
    fn write_blob(&self, path: &Path, bytes: &[u8]) -> DbResult<()>;

    /// Read back a binary blob.
    fn read_blob(&self, path: &Path) -> DbResult<Vec<u8>>;

    /// Write a plain-text artefact (a rendered method source).
    fn write_text(&self, path: &Path, content: &str) -> DbResult<()>;

    /// Read a plain-text artefact.
    fn read_text(&self, path: &Path) -> DbResult<String>;

    /// Create `path` as an empty file if it does not already exist; never
    /// overwrites an existing file (§6: the refactored-source placeholder).
    fn touch_if_absent(&self, path: &Path) -> DbResult<()>;

    /// `true` if `path` exists and has length > 0 (the "exists and
    /// length>0" gate from §7).
    fn exists_and_nonempty(&self, path: &Path) -> bool;
}

/// A real, file-based [`ArtifactStore`].
#[derive(Debug, Clone, Default)]
pub struct FileArtifactStore;

impl FileArtifactStore {
    /// Construct a file-based store. Stateless: every call resolves
    /// directories from the path it is given.
    pub fn new() -> Self {
        Self
    }

    fn atomic_write(path: &Path, bytes: &[u8]) -> DbResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DbError::io(path, e.to_string()))?;
            }
        }
        let tmp_path = path.with_extension(format!(
            "{}.tmp",
            path.extension().and_then(|e| e.to_str()).unwrap_or("out")
        ));
        {
            let mut tmp = fs::File::create(&tmp_path).map_err(|e| DbError::io(path, e.to_string()))?;
            tmp.write_all(bytes).map_err(|e| DbError::io(path, e.to_string()))?;
            tmp.sync_all().map_err(|e| DbError::io(path, e.to_string()))?;
        }
        fs::rename(&tmp_path, path).map_err(|e| DbError::io(path, e.to_string()))?;
        Ok(())
    }

    fn render_arff(relation: &str, table: &ArffTable) -> String {
        let mut out = String::new();
        out.push_str(&format!("@RELATION {relation}\n\n"));
        for (i, name) in table.columns.iter().enumerate() {
            if i + 1 == table.columns.len() {
                out.push_str(&format!("@ATTRIBUTE {name} {{no,yes}}\n"));
            } else {
                out.push_str(&format!("@ATTRIBUTE {name} NUMERIC\n"));
            }
        }
        out.push_str("\n@DATA\n");
        for row in &table.rows {
            let rendered: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    if i + 1 == row.len() {
                        if *v >= 0.5 { "yes".to_string() } else { "no".to_string() }
                    } else {
                        format!("{v}")
                    }
                })
                .collect();
            out.push_str(&rendered.join(","));
            out.push('\n');
        }
        out
    }

    fn parse_arff(path: &Path, text: &str) -> DbResult<ArffTable> {
        let mut columns = Vec::new();
        let mut rows = Vec::new();
        let mut in_data = false;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('%') {
                continue;
            }
            let lower = trimmed.to_lowercase();
            if lower.starts_with("@attribute") {
                let name = trimmed
                    .split_whitespace()
                    .nth(1)
                    .ok_or_else(|| DbError::malformed_arff(path, "@ATTRIBUTE missing a name"))?;
                columns.push(name.to_string());
            } else if lower.starts_with("@data") {
                in_data = true;
            } else if in_data {
                let fields: Vec<&str> = trimmed.split(',').collect();
                if fields.len() != columns.len() {
                    return Err(DbError::malformed_arff(
                        path,
                        format!("row has {} fields, expected {}", fields.len(), columns.len()),
                    ));
                }
                let mut row = Vec::with_capacity(fields.len());
                for (i, field) in fields.iter().enumerate() {
                    let field = field.trim();
                    let value = if i + 1 == fields.len() {
                        match field {
                            "yes" => 1.0,
                            "no" => 0.0,
                            other => other.parse::<f64>().map_err(|_| {
                                DbError::malformed_arff(path, format!("bad class value `{other}`"))
                            })?,
                        }
                    } else {
                        field
                            .parse::<f64>()
                            .map_err(|_| DbError::malformed_arff(path, format!("bad numeric value `{field}`")))?
                    };
                    row.push(value);
                }
                rows.push(row);
            }
        }

        if columns.is_empty() {
            return Err(DbError::malformed_arff(path, "no @ATTRIBUTE declarations found"));
        }

        Ok(ArffTable { columns, rows })
    }
}

impl ArtifactStore for FileArtifactStore {
    fn write_csv(&self, path: &Path, header: &[String], rows: &[Vec<String>]) -> DbResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());
        writer
            .write_record(header)
            .map_err(|e| DbError::csv(path, e.to_string()))?;
        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| DbError::csv(path, e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| DbError::csv(path, e.to_string()))?;
        Self::atomic_write(path, &bytes)
    }

    fn read_csv(&self, path: &Path) -> DbResult<(Vec<String>, Vec<Vec<String>>)> {
        if !self.exists_and_nonempty(path) {
            return Err(DbError::not_found(path));
        }
        let mut reader = csv::ReaderBuilder::new()
            .from_path(path)
            .map_err(|e| DbError::csv(path, e.to_string()))?;
        let header: Vec<String> = reader
            .headers()
            .map_err(|e| DbError::csv(path, e.to_string()))?
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DbError::csv(path, e.to_string()))?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }
        Ok((header, rows))
    }

    fn write_arff(&self, path: &Path, relation: &str, table: &ArffTable) -> DbResult<()> {
        let text = Self::render_arff(relation, table);
        Self::atomic_write(path, text.as_bytes())
    }

    fn read_arff(&self, path: &Path) -> DbResult<ArffTable> {
        let text = self.read_text(path)?;
        Self::parse_arff(path, &text)
    }

    fn write_blob(&self, path: &Path, bytes: &[u8]) -> DbResult<()> {
        Self::atomic_write(path, bytes)
    }

    fn read_blob(&self, path: &Path) -> DbResult<Vec<u8>> {
        if !self.exists_and_nonempty(path) {
            return Err(DbError::not_found(path));
        }
        fs::read(path).map_err(|e| DbError::io(path, e.to_string()))
    }

    fn write_text(&self, path: &Path, content: &str) -> DbResult<()> {
        Self::atomic_write(path, content.as_bytes())
    }

    fn read_text(&self, path: &Path) -> DbResult<String> {
        if !self.exists_and_nonempty(path) {
            return Err(DbError::not_found(path));
        }
        fs::read_to_string(path).map_err(|e| DbError::io(path, e.to_string()))
    }

    fn touch_if_absent(&self, path: &Path) -> DbResult<()> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DbError::io(path, e.to_string()))?;
            }
        }
        fs::File::create(path).map_err(|e| DbError::io(path, e.to_string()))?;
        Ok(())
    }

    fn exists_and_nonempty(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
    }
}

/// Resolved paths for the six persisted artefacts in §6, derived from a
/// project name and an output directory.
#[derive(Debug, Clone)]
pub struct ArtefactPaths {
    project: String,
    out_dir: PathBuf,
}

impl ArtefactPaths {
    /// Resolve artefact paths for `project` under `out_dir`.
    pub fn new(project: impl Into<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            out_dir: out_dir.into(),
        }
    }

    /// `<PROJECT>.csv`.
    pub fn raw_dataset(&self) -> PathBuf {
        self.out_dir.join(format!("{}.csv", self.project))
    }

    /// `<PROJECT>_processed.arff`.
    pub fn processed_dataset(&self) -> PathBuf {
        self.out_dir.join(format!("{}_processed.arff", self.project))
    }

    /// `<PROJECT>_processed_balanced.arff`.
    pub fn balanced_dataset(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}_processed_balanced.arff", self.project))
    }

    /// `<PROJECT>_best.model`.
    pub fn trained_model(&self) -> PathBuf {
        self.out_dir.join(format!("{}_best.model", self.project))
    }

    /// `<PROJECT>_AFMethod.txt`.
    pub fn actionable_method_source(&self) -> PathBuf {
        self.out_dir.join(format!("{}_AFMethod.txt", self.project))
    }

    /// `AFMethod_refactored/<PROJECT>_AFMethod_refactored.txt`.
    pub fn refactored_method_source(&self) -> PathBuf {
        self.out_dir
            .join("AFMethod_refactored")
            .join(format!("{}_AFMethod_refactored.txt", self.project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn csv_round_trips_through_atomic_write() {
        let dir = tempdir().unwrap();
        let store = FileArtifactStore::new();
        let path = dir.path().join("out.csv");
        let header = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec!["1".to_string(), "2".to_string()]];
        store.write_csv(&path, &header, &rows).unwrap();
        let text = store.read_text(&path).unwrap();
        assert!(text.contains("\"a\",\"b\""));
        assert!(text.contains("\"1\",\"2\""));

        let (read_header, read_rows) = store.read_csv(&path).unwrap();
        assert_eq!(read_header, header);
        assert_eq!(read_rows, rows);
    }

    #[test]
    fn arff_round_trips() {
        let dir = tempdir().unwrap();
        let store = FileArtifactStore::new();
        let path = dir.path().join("out.arff");
        let table = ArffTable {
            columns: vec!["x".to_string(), "class".to_string()],
            rows: vec![vec![1.0, 1.0], vec![0.0, 0.0]],
        };
        store.write_arff(&path, "demo", &table).unwrap();
        let parsed = store.read_arff(&path).unwrap();
        assert_eq!(parsed.columns, table.columns);
        assert_eq!(parsed.rows, table.rows);
    }

    #[test]
    fn exists_and_nonempty_rejects_zero_length_file() {
        let dir = tempdir().unwrap();
        let store = FileArtifactStore::new();
        let path = dir.path().join("empty.txt");
        fs::write(&path, b"").unwrap();
        assert!(!store.exists_and_nonempty(&path));
    }

    #[test]
    fn touch_if_absent_never_overwrites() {
        let dir = tempdir().unwrap();
        let store = FileArtifactStore::new();
        let path = dir.path().join("placeholder.txt");
        store.write_text(&path, "original").unwrap();
        store.touch_if_absent(&path).unwrap();
        assert_eq!(store.read_text(&path).unwrap(), "original");
    }

    #[test]
    fn artefact_paths_follow_documented_naming() {
        let paths = ArtefactPaths::new("Demo", "/out");
        assert_eq!(paths.raw_dataset(), PathBuf::from("/out/Demo.csv"));
        assert_eq!(
            paths.processed_dataset(),
            PathBuf::from("/out/Demo_processed.arff")
        );
        assert_eq!(
            paths.refactored_method_source(),
            PathBuf::from("/out/AFMethod_refactored/Demo_AFMethod_refactored.txt")
        );
    }
}
