//! Dataset assembler (component 8, §4.9) and the feature-matrix renderer.

use std::path::Path;

use dpm_db::ArtifactStore;

use crate::errors::{DpmError, DpmResult};
use crate::types::{Dataset, FeatureRecord, FEATURE_RECORD_COLUMNS, NUMERIC_FEATURE_COLUMNS};

/// Render `records` into the canonical CSV header and rows (§3): all
/// numeric columns as integers except `avgChurn` (2-decimal fixed point).
pub fn render_rows(records: &[FeatureRecord]) -> (Vec<String>, Vec<Vec<String>>) {
    let header: Vec<String> = FEATURE_RECORD_COLUMNS.iter().map(|s| s.to_string()).collect();
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.project.clone(),
                r.method_name.clone(),
                r.release.clone(),
                r.code_smells.to_string(),
                r.cyclomatic_complexity.to_string(),
                r.parameter_count.to_string(),
                r.duplication.to_string(),
                r.nr.to_string(),
                r.n_auth.to_string(),
                r.stmt_added.to_string(),
                r.stmt_deleted.to_string(),
                r.max_churn.to_string(),
                format!("{:.2}", r.avg_churn),
                (if r.is_buggy { "yes" } else { "no" }).to_string(),
            ]
        })
        .collect();
    (header, rows)
}

/// Write the assembled dataset to `path`, via `store`. An existing,
/// non-empty artefact short-circuits the write (§5, §7).
pub fn write_dataset(store: &dyn ArtifactStore, path: &Path, records: &[FeatureRecord]) -> DpmResult<()> {
    if store.exists_and_nonempty(path) {
        return Ok(());
    }
    let (header, rows) = render_rows(records);
    store.write_csv(path, &header, &rows)?;
    Ok(())
}

/// Parse CSV rows in [`FEATURE_RECORD_COLUMNS`] order back into
/// [`FeatureRecord`]s, the inverse of [`render_rows`].
pub fn parse_records(header: &[String], rows: &[Vec<String>]) -> DpmResult<Vec<FeatureRecord>> {
    if header != FEATURE_RECORD_COLUMNS {
        return Err(DpmError::parse_failure(
            "dataset csv",
            format!("unexpected header {header:?}, expected {FEATURE_RECORD_COLUMNS:?}"),
        ));
    }
    rows.iter()
        .map(|row| {
            let field = |i: usize| -> DpmResult<&str> {
                row.get(i).map(|s| s.as_str()).ok_or_else(|| {
                    DpmError::parse_failure("dataset csv", format!("row has only {} fields", row.len()))
                })
            };
            let parse_u32 = |i: usize| -> DpmResult<u32> {
                field(i)?
                    .parse::<u32>()
                    .map_err(|e| DpmError::parse_failure("dataset csv", e.to_string()))
            };
            Ok(FeatureRecord {
                project: field(0)?.to_string(),
                method_name: field(1)?.to_string(),
                release: field(2)?.to_string(),
                code_smells: parse_u32(3)?,
                cyclomatic_complexity: parse_u32(4)?,
                parameter_count: parse_u32(5)?,
                duplication: parse_u32(6)?,
                nr: parse_u32(7)?,
                n_auth: parse_u32(8)?,
                stmt_added: parse_u32(9)?,
                stmt_deleted: parse_u32(10)?,
                max_churn: parse_u32(11)?,
                avg_churn: field(12)?
                    .parse::<f64>()
                    .map_err(|e| DpmError::parse_failure("dataset csv", e.to_string()))?,
                is_buggy: field(13)? == "yes",
            })
        })
        .collect()
}

/// Read back a dataset artefact written by [`write_dataset`].
pub fn read_dataset(store: &dyn ArtifactStore, path: &Path) -> DpmResult<Vec<FeatureRecord>> {
    let (header, rows) = store.read_csv(path)?;
    parse_records(&header, &rows)
}

/// Project `records` onto the numeric feature matrix the preprocessor
/// consumes: [`NUMERIC_FEATURE_COLUMNS`] followed by the class column
/// (§4.9 step 1).
pub fn records_to_dataset(records: &[FeatureRecord]) -> Dataset {
    let columns: Vec<String> = NUMERIC_FEATURE_COLUMNS
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once("class".to_string()))
        .collect();
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.code_smells as f64,
                r.cyclomatic_complexity as f64,
                r.parameter_count as f64,
                r.duplication as f64,
                r.nr as f64,
                r.n_auth as f64,
                r.stmt_added as f64,
                r.stmt_deleted as f64,
                r.max_churn as f64,
                r.avg_churn,
                if r.is_buggy { 1.0 } else { 0.0 },
            ]
        })
        .collect();
    Dataset { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpm_db::FileArtifactStore;
    use tempfile::tempdir;

    fn record(release: &str, buggy: bool) -> FeatureRecord {
        FeatureRecord {
            project: "Demo".to_string(),
            method_name: "Foo.java::bar()".to_string(),
            release: release.to_string(),
            code_smells: 0,
            cyclomatic_complexity: 1,
            parameter_count: 0,
            duplication: 0,
            nr: 2,
            n_auth: 1,
            stmt_added: 3,
            stmt_deleted: 1,
            max_churn: 2,
            avg_churn: 2.0,
            is_buggy: buggy,
        }
    }

    #[test]
    fn renders_avg_churn_with_two_decimals() {
        let (header, rows) = render_rows(&[record("R1", true)]);
        let expected: Vec<String> = FEATURE_RECORD_COLUMNS.iter().map(|s| s.to_string()).collect();
        assert_eq!(header, expected);
        assert_eq!(rows[0][12], "2.00");
        assert_eq!(rows[0].last().unwrap(), "yes");
    }

    #[test]
    fn write_then_read_dataset_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Demo.csv");
        let store = FileArtifactStore::new();
        let records = vec![record("R1", false), record("R2", true)];
        write_dataset(&store, &path, &records).unwrap();

        let read_back = read_dataset(&store, &path).unwrap();
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[0].release, "R1");
        assert!(!read_back[0].is_buggy);
        assert_eq!(read_back[1].release, "R2");
        assert!(read_back[1].is_buggy);
        assert_eq!(read_back[0].avg_churn, 2.0);
    }

    #[test]
    fn records_to_dataset_appends_class_column_last() {
        let ds = records_to_dataset(&[record("R1", true)]);
        assert_eq!(ds.columns.last().unwrap(), "class");
        assert_eq!(ds.rows[0].last().unwrap(), &1.0);
    }

    #[test]
    fn write_dataset_short_circuits_on_existing_artefact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Demo.csv");
        let store = FileArtifactStore::new();
        write_dataset(&store, &path, &[record("R1", false)]).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        // A second call with different data must not overwrite.
        write_dataset(&store, &path, &[record("R2", true)]).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }
}
