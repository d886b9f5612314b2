use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int64Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use log::info;
use parquet::arrow::ArrowWriter;

use crate::{
    vars::{GenColumn, GenMatchOutput},
    GenMatchError, GenMatchResult,
};

/// Name of the column holding the matched mask.
pub const MATCHED_COLUMN: &str = "matched";

fn expand_output_path(file_path: &str) -> GenMatchResult<PathBuf> {
    Ok(PathBuf::from(&*shellexpand::full(file_path)?))
}

fn column_to_array(column: &GenColumn) -> (DataType, bool, ArrayRef) {
    match column {
        GenColumn::Float(values) => (
            DataType::Float64,
            true,
            Arc::new(Float64Array::from(values.clone())),
        ),
        GenColumn::Int(values) => (
            DataType::Int64,
            false,
            Arc::new(Int64Array::from(values.clone())),
        ),
        GenColumn::Bool(values) => (
            DataType::Boolean,
            false,
            Arc::new(BooleanArray::from(values.clone())),
        ),
        GenColumn::Nullable(values) => (
            DataType::Float64,
            true,
            Arc::new(Float64Array::from(values.clone())),
        ),
    }
}

fn output_to_record_batch(output: &GenMatchOutput) -> GenMatchResult<RecordBatch> {
    let n_events = output.matched.len();
    let mut fields = vec![Field::new(MATCHED_COLUMN, DataType::Boolean, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(BooleanArray::from(output.matched.clone()))];
    for (name, column) in output.vars.iter() {
        if column.len() != n_events {
            return Err(GenMatchError::LengthMismatch {
                context: format!("output column \"{}\"", name),
                expected: n_events,
                found: column.len(),
            });
        }
        let (data_type, nullable, array) = column_to_array(column);
        fields.push(Field::new(name, data_type, nullable));
        arrays.push(array);
    }
    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        arrays,
    )?)
}

/// Write the matched mask (as the `"matched"` column) followed by every output variable to a
/// Parquet file. The path may contain `~` and environment variables.
///
/// Boolean and integer columns keep their types. Float and nullable columns are both written as
/// nullable doubles, so that a column with a missing entry has the same schema as a complete one.
///
/// # Errors
///
/// Fails if a column does not have one entry per event, or if the file cannot be created or
/// written.
pub fn write_parquet(file_path: &str, output: &GenMatchOutput) -> GenMatchResult<()> {
    let path = expand_output_path(file_path)?;
    write_parquet_impl(&path, output)?;
    info!(
        "wrote {} events and {} variables to {}",
        output.matched.len(),
        output.vars.len(),
        path.display()
    );
    Ok(())
}

fn write_parquet_impl(path: &Path, output: &GenMatchOutput) -> GenMatchResult<()> {
    let batch = output_to_record_batch(output)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use super::*;
    use crate::vars::GenVars;

    fn make_temp_dir() -> PathBuf {
        let dir = env::temp_dir().join(format!("genmatch_test_{}", fastrand::u64(..)));
        fs::create_dir(&dir).expect("temp dir should be created");
        dir
    }

    fn test_output() -> GenMatchOutput {
        let mut vars = GenVars::new();
        vars.insert("fj_genH_pt", GenColumn::Float(vec![400.0, -99999.0]));
        vars.insert("fj_isHVV_munuqq", GenColumn::Int(vec![1, 0]));
        vars.insert("fj_H_VV_isMatched", GenColumn::Bool(vec![true, false]));
        vars.insert("gen_Vlep_pt", GenColumn::Nullable(vec![Some(100.0), None]));
        GenMatchOutput {
            matched: vec![true, false],
            vars,
        }
    }

    #[test]
    fn test_parquet_write_to_tempfile() {
        let dir = make_temp_dir();
        let path = dir.join("genmatch.parquet");
        let path_str = path.to_str().expect("path should be valid UTF-8");
        write_parquet(path_str, &test_output()).expect("writing parquet should succeed");

        let file = File::open(&path).expect("parquet file should exist");
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .expect("parquet file should be readable")
            .build()
            .expect("reader should build");
        let batches: Vec<RecordBatch> = reader
            .collect::<Result<_, _>>()
            .expect("batches should decode");
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "matched",
                "fj_genH_pt",
                "fj_isHVV_munuqq",
                "fj_H_VV_isMatched",
                "gen_Vlep_pt"
            ]
        );
        assert_eq!(batch.num_rows(), 2);
        let pt_field = schema.field(1);
        let lepton_field = schema.field(4);
        assert_eq!(pt_field.data_type(), lepton_field.data_type());
        assert_eq!(pt_field.is_nullable(), lepton_field.is_nullable());
        let matched = batch
            .column(0)
            .as_any()
            .downcast_ref::<BooleanArray>()
            .expect("matched should be boolean");
        assert!(matched.value(0));
        assert!(!matched.value(1));
        let labels = batch
            .column(2)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("labels should be integers");
        assert_eq!(labels.value(0), 1);
        let lepton_pt = batch
            .column(4)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("lepton pt should be doubles");
        assert_eq!(lepton_pt.value(0), 100.0);
        assert!(lepton_pt.is_null(1));
        fs::remove_dir_all(&dir).expect("temp dir cleanup should succeed");
    }

    #[test]
    fn test_parquet_rejects_ragged_columns() {
        let dir = make_temp_dir();
        let path = dir.join("ragged.parquet");
        let mut output = test_output();
        output.vars.insert("short", GenColumn::Float(vec![1.0]));
        let result = write_parquet(path.to_str().expect("valid path"), &output);
        assert!(matches!(result, Err(GenMatchError::LengthMismatch { .. })));
        assert!(!path.exists());
        fs::remove_dir_all(&dir).expect("temp dir cleanup should succeed");
    }
}
