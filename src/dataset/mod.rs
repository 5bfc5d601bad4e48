//! Dataset loading (Arrow/CSV/Parquet)
//!
//! A [`Dataset`] is a single Arrow [`RecordBatch`] holding the whole table in
//! source order. Multi-batch readers are concatenated on load.
//!
//! Toyota Way Principles:
//! - Poka-Yoke: schema problems (missing target, nulls, text columns) fail at
//!   load/separation time, never inside the fit

pub mod split;

pub use split::{train_validation_split, Split};

use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

/// Name of the regression target column (Remaining Useful Life)
pub const TARGET_COLUMN: &str = "RUL";

/// In-memory tabular dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
}

/// Row-major feature matrix with its column names
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Dataset {
    /// Wrap an existing batch
    ///
    /// Useful for testing and for callers that already hold Arrow data
    #[must_use]
    pub const fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Build a dataset from named `f64` columns
    ///
    /// # Errors
    /// Returns error if columns have different lengths
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        use arrow::datatypes::{Field, Schema};

        let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns
            .into_iter()
            .map(|(name, values)| {
                (
                    Field::new(name, DataType::Float64, false),
                    Arc::new(Float64Array::from(values)) as ArrayRef,
                )
            })
            .unzip();

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(Self { batch })
    }

    /// Load a dataset from a `.csv` or `.parquet` file
    ///
    /// Files without a `.parquet` extension are read as comma-delimited text
    /// with a header row; column types are inferred from every record.
    ///
    /// # Errors
    /// Returns [`Error::FileAccess`] if the file cannot be opened or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_parquet = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

        let batches = if is_parquet {
            Self::read_parquet(path)?
        } else {
            Self::read_csv(path)?
        };

        let dataset = Self::from_batches(path, batches)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.num_rows(),
            columns = dataset.batch.num_columns(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn read_csv(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>)> {
        use arrow::csv::reader::Format;
        use arrow::csv::ReaderBuilder;

        let mut file = File::open(path).map_err(|e| Error::file_access(path, e))?;

        let format = Format::default().with_header(true);
        let (schema, _) = format
            .infer_schema(&mut file, None)
            .map_err(|e| Error::file_access(path, format!("failed to infer CSV schema: {e}")))?;
        file.rewind().map_err(|e| Error::file_access(path, e))?;

        let schema = Arc::new(schema);
        let reader = ReaderBuilder::new(Arc::clone(&schema))
            .with_header(true)
            .build(file)
            .map_err(|e| Error::file_access(path, e))?;

        let mut batches = Vec::new();
        for batch in reader {
            batches.push(batch.map_err(|e| {
                Error::file_access(path, format!("failed to read CSV record batch: {e}"))
            })?);
        }

        Ok((schema, batches))
    }

    fn read_parquet(path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>)> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path).map_err(|e| Error::file_access(path, e))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::file_access(path, format!("failed to parse Parquet file: {e}"))
        })?;
        let schema = Arc::clone(builder.schema());

        let reader = builder.build().map_err(|e| {
            Error::file_access(path, format!("failed to create Parquet reader: {e}"))
        })?;

        let mut batches = Vec::new();
        for batch in reader {
            batches.push(batch.map_err(|e| {
                Error::file_access(path, format!("failed to read record batch: {e}"))
            })?);
        }

        Ok((schema, batches))
    }

    fn from_batches(path: &Path, (schema, batches): (SchemaRef, Vec<RecordBatch>)) -> Result<Self> {
        let batch = concat_batches(&schema, &batches).map_err(|e| Error::file_access(path, e))?;
        Ok(Self { batch })
    }

    /// Underlying Arrow batch
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Column names in source order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// True if `name` is a column with a numeric Arrow type
    #[must_use]
    pub fn is_numeric(&self, name: &str) -> bool {
        self.batch
            .schema()
            .field_with_name(name)
            .is_ok_and(|f| f.data_type().is_numeric())
    }

    /// Column `name` widened to `f64`, nulls kept as `None`
    ///
    /// # Errors
    /// Returns [`Error::InputSchema`] if the column is missing or not numeric
    pub fn nullable_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| Error::InputSchema(format!("column '{name}' not found")))?;

        if !column.data_type().is_numeric() {
            return Err(Error::InputSchema(format!(
                "column '{name}' has non-numeric type {}",
                column.data_type()
            )));
        }

        let widened = cast(column, &DataType::Float64)?;
        let values = widened
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| Error::InputSchema(format!("column '{name}' is not castable to f64")))?;

        Ok(values.iter().collect())
    }

    /// Column `name` widened to `f64`
    ///
    /// # Errors
    /// Returns [`Error::InputSchema`] if the column is missing, not numeric or
    /// contains nulls
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        self.nullable_column(name)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    Error::InputSchema(format!("column '{name}' has a null value at row {row}"))
                })
            })
            .collect()
    }

    /// Separate `target` from every other column
    ///
    /// The feature matrix keeps the remaining columns in source order.
    ///
    /// # Errors
    /// Returns [`Error::InputSchema`] if the target is absent or holds a
    /// negative value, if no feature column remains, or if any involved
    /// column is non-numeric or null
    pub fn split_target(&self, target: &str) -> Result<(FeatureMatrix, Vec<f64>)> {
        if self.batch.column_by_name(target).is_none() {
            return Err(Error::InputSchema(format!(
                "target column '{target}' not found (columns: {})",
                self.column_names().join(", ")
            )));
        }

        let names: Vec<String> = self
            .column_names()
            .into_iter()
            .filter(|name| name != target)
            .collect();
        if names.is_empty() {
            return Err(Error::InputSchema(
                "dataset has no feature columns besides the target".to_string(),
            ));
        }

        let columns = names
            .iter()
            .map(|name| self.numeric_column(name))
            .collect::<Result<Vec<_>>>()?;
        let targets = self.numeric_column(target)?;
        // Remaining useful life counts down to zero
        if let Some((row, value)) = targets.iter().enumerate().find(|(_, v)| **v < 0.0) {
            return Err(Error::InputSchema(format!(
                "target column '{target}' has negative value {value} at row {row}"
            )));
        }

        let rows = (0..self.num_rows())
            .map(|row| columns.iter().map(|col| col[row]).collect())
            .collect();

        Ok((FeatureMatrix { names, rows }, targets))
    }

    /// Numeric columns present in both datasets, in `self`'s order
    #[must_use]
    pub fn shared_numeric_columns(&self, other: &Self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| self.is_numeric(name) && other.is_numeric(name))
            .collect()
    }
}

impl FeatureMatrix {
    /// Build a matrix from names and rows
    ///
    /// # Errors
    /// Returns [`Error::InputSchema`] if any row width differs from `names`
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != names.len()) {
            return Err(Error::InputSchema(format!(
                "row {idx} has {} values, expected {}",
                row.len(),
                names.len()
            )));
        }
        Ok(Self { names, rows })
    }

    /// Feature names in column order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of feature columns
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.names.len()
    }

    /// Subset of rows by index, in the given order
    #[must_use]
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv_preserves_columns_and_order() {
        let file = write_csv("feature_1,feature_2,RUL\n1.0,2,10\n3.5,4,20\n5.0,6,30\n");
        let dataset = Dataset::load(file.path()).unwrap();

        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.column_names(), vec!["feature_1", "feature_2", "RUL"]);
        assert_eq!(dataset.numeric_column("feature_1").unwrap(), vec![1.0, 3.5, 5.0]);
        // Integer columns are widened
        assert_eq!(dataset.numeric_column("RUL").unwrap(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_load_missing_file_is_file_access() {
        let err = Dataset::load("/nonexistent/maintenance_data.csv").unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
    }

    #[test]
    fn test_split_target_separates_rul() {
        let dataset = Dataset::from_columns(vec![
            ("feature_1", vec![1.0, 2.0]),
            ("RUL", vec![100.0, 90.0]),
            ("feature_2", vec![3.0, 4.0]),
        ])
        .unwrap();

        let (features, target) = dataset.split_target(TARGET_COLUMN).unwrap();
        assert_eq!(features.names(), ["feature_1", "feature_2"]);
        assert_eq!(features.rows(), [vec![1.0, 3.0], vec![2.0, 4.0]]);
        assert_eq!(target, vec![100.0, 90.0]);
    }

    #[test]
    fn test_split_target_rejects_negative_rul() {
        let dataset = Dataset::from_columns(vec![
            ("feature_1", vec![1.0, 2.0, 3.0]),
            ("RUL", vec![10.0, 0.0, -5.0]),
        ])
        .unwrap();

        let err = dataset.split_target(TARGET_COLUMN).unwrap_err();
        assert!(matches!(err, Error::InputSchema(_)));
        assert!(err.to_string().contains("negative value -5 at row 2"));
    }

    #[test]
    fn test_split_target_missing_target() {
        let dataset = Dataset::from_columns(vec![("feature_1", vec![1.0])]).unwrap();
        let err = dataset.split_target(TARGET_COLUMN).unwrap_err();
        assert!(matches!(err, Error::InputSchema(_)));
        assert!(err.to_string().contains("RUL"));
    }

    #[test]
    fn test_split_target_rejects_text_feature() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("machine", DataType::Utf8, false),
            Field::new("RUL", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["a", "b"])),
                Arc::new(Int64Array::from(vec![1, 2])),
            ],
        )
        .unwrap();

        let dataset = Dataset::new(batch);
        assert!(!dataset.is_numeric("machine"));
        assert!(matches!(
            dataset.split_target(TARGET_COLUMN),
            Err(Error::InputSchema(_))
        ));
    }

    #[test]
    fn test_numeric_column_rejects_nulls() {
        let file = write_csv("feature_1,RUL\n1.0,10\n,20\n");
        let dataset = Dataset::load(file.path()).unwrap();

        assert_eq!(
            dataset.nullable_column("feature_1").unwrap(),
            vec![Some(1.0), None]
        );
        let err = dataset.numeric_column("feature_1").unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_feature_matrix_take() {
        let matrix = FeatureMatrix::new(
            vec!["a".into()],
            vec![vec![0.0], vec![1.0], vec![2.0]],
        )
        .unwrap();
        let subset = matrix.take(&[2, 0]);
        assert_eq!(subset.rows(), [vec![2.0], vec![0.0]]);
        assert_eq!(subset.num_features(), 1);
    }

    #[test]
    fn test_feature_matrix_rejects_ragged_rows() {
        let err = FeatureMatrix::new(vec!["a".into(), "b".into()], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::InputSchema(_)));
    }
}
