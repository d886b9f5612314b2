//! The boundary to a jet-tagger inference service.
//!
//! A tagger receives a batch of named feature arrays sharing one leading (event) dimension, and
//! answers with one fixed-width row of scores per event, or fails for the whole batch. The
//! transport (for instance a remote inference server) lives behind [`TaggerInference`].

use genmatch_core::{GenColumn, GenMatchError, GenMatchResult, GenVars};
use indexmap::IndexMap;
use log::debug;
use nalgebra::DMatrix;

/// Named input features. Every matrix has one row per event.
pub type FeatureBatch = IndexMap<String, DMatrix<f32>>;

/// Names of the tagger output columns, in column order.
pub const TAGGER_OUTPUT_NAMES: [&str; 6] = [
    "fj_ttbar_bmerged",
    "fj_ttbar_bsplit",
    "fj_wjets_label",
    "fj_isHVV_elenuqq",
    "fj_isHVV_munuqq",
    "fj_isHVV_taunuqq",
];

/// A jet tagger which scores a batch of events.
pub trait TaggerInference {
    /// Score every event in `features`, returning one row per event.
    ///
    /// # Errors
    ///
    /// Any failure applies to the whole batch.
    fn infer(&self, features: &FeatureBatch) -> GenMatchResult<DMatrix<f32>>;
}

fn n_rows(inputs: &FeatureBatch) -> GenMatchResult<usize> {
    let mut rows = inputs.iter().map(|(name, matrix)| (name, matrix.nrows()));
    let Some((_, expected)) = rows.next() else {
        return Ok(0);
    };
    for (name, found) in rows {
        if found != expected {
            return Err(GenMatchError::LengthMismatch {
                context: format!("tagger input \"{}\"", name),
                expected,
                found,
            });
        }
    }
    Ok(expected)
}

/// Run `model` over `inputs` in chunks of at most `batch_size` events and stack the scores.
///
/// # Errors
///
/// Fails if the inputs do not all have the same number of events, if `batch_size` is zero, or
/// if any chunk fails or returns scores of the wrong shape. No partial result is returned.
pub fn infer_in_batches<M: TaggerInference + ?Sized>(
    model: &M,
    inputs: &FeatureBatch,
    batch_size: usize,
) -> GenMatchResult<DMatrix<f32>> {
    if batch_size == 0 {
        return Err(GenMatchError::InferenceError(
            "batch size must be positive".to_string(),
        ));
    }
    let n_events = n_rows(inputs)?;
    let mut scores: Option<DMatrix<f32>> = None;
    let mut start = 0;
    while start < n_events {
        let len = batch_size.min(n_events - start);
        let chunk: FeatureBatch = inputs
            .iter()
            .map(|(name, matrix)| (name.clone(), matrix.rows(start, len).into_owned()))
            .collect();
        debug!("running inference on events {}..{}", start, start + len);
        let chunk_scores = model.infer(&chunk)?;
        if chunk_scores.nrows() != len {
            return Err(GenMatchError::InferenceError(format!(
                "expected {} rows of scores, found {}",
                len,
                chunk_scores.nrows()
            )));
        }
        let all = scores.get_or_insert_with(|| DMatrix::zeros(n_events, chunk_scores.ncols()));
        if chunk_scores.ncols() != all.ncols() {
            return Err(GenMatchError::InferenceError(format!(
                "expected {} scores per event, found {}",
                all.ncols(),
                chunk_scores.ncols()
            )));
        }
        all.rows_mut(start, len).copy_from(&chunk_scores);
        start += len;
    }
    Ok(scores.unwrap_or_else(|| DMatrix::zeros(0, TAGGER_OUTPUT_NAMES.len())))
}

/// Tagger scores split into the named output columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaggerScores(IndexMap<String, Vec<f32>>);

impl TaggerScores {
    /// Name the first [`TAGGER_OUTPUT_NAMES`]`.len()` columns of `scores`.
    ///
    /// With no events every column is empty.
    ///
    /// # Errors
    ///
    /// Fails if there are events but fewer score columns than output names.
    pub fn from_matrix(scores: &DMatrix<f32>) -> GenMatchResult<Self> {
        if scores.nrows() == 0 {
            return Ok(Self(
                TAGGER_OUTPUT_NAMES
                    .iter()
                    .map(|name| (name.to_string(), Vec::new()))
                    .collect(),
            ));
        }
        if scores.ncols() < TAGGER_OUTPUT_NAMES.len() {
            return Err(GenMatchError::LengthMismatch {
                context: "tagger scores".to_string(),
                expected: TAGGER_OUTPUT_NAMES.len(),
                found: scores.ncols(),
            });
        }
        Ok(Self(
            TAGGER_OUTPUT_NAMES
                .iter()
                .enumerate()
                .map(|(index, name)| {
                    (name.to_string(), scores.column(index).iter().copied().collect())
                })
                .collect(),
        ))
    }

    /// The scores of one output, if `name` is one of [`TAGGER_OUTPUT_NAMES`].
    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.0.get(name).map(|scores| scores.as_slice())
    }

    /// Iterate over `(name, scores)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.0
            .iter()
            .map(|(name, scores)| (name.as_str(), scores.as_slice()))
    }

    /// Convert to output columns so the scores can be stored next to the matching variables.
    pub fn into_columns(self) -> GenVars {
        self.0
            .into_iter()
            .map(|(name, scores)| {
                let column = GenColumn::Float(scores.into_iter().map(f64::from).collect());
                (name, column)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use approx::assert_relative_eq;

    use super::*;

    /// Scores every event by the sum of its features times the column number.
    struct SumTagger {
        calls: Cell<usize>,
        fail_on_call: Option<usize>,
    }

    impl SumTagger {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                calls: Cell::new(0),
                fail_on_call,
            }
        }
    }

    impl TaggerInference for SumTagger {
        fn infer(&self, features: &FeatureBatch) -> GenMatchResult<DMatrix<f32>> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if Some(call) == self.fail_on_call {
                return Err(GenMatchError::InferenceError("server unavailable".to_string()));
            }
            let n_events = features.values().next().map_or(0, |m| m.nrows());
            Ok(DMatrix::from_fn(n_events, 6, |row, col| {
                let total: f32 = features.values().map(|m| m.row(row).sum()).sum();
                total * (col + 1) as f32
            }))
        }
    }

    fn features(n_events: usize) -> FeatureBatch {
        let mut batch = FeatureBatch::new();
        batch.insert(
            "fj_pt".to_string(),
            DMatrix::from_fn(n_events, 1, |row, _| row as f32),
        );
        batch.insert(
            "pf_points".to_string(),
            DMatrix::from_fn(n_events, 3, |row, col| (row * col) as f32 * 0.5),
        );
        batch
    }

    #[test]
    fn test_batches_are_stacked_in_order() {
        let tagger = SumTagger::new(None);
        let whole = tagger.infer(&features(10)).unwrap();
        let tagger = SumTagger::new(None);
        let chunked = infer_in_batches(&tagger, &features(10), 4).unwrap();
        assert_eq!(tagger.calls.get(), 3);
        assert_eq!(chunked.shape(), (10, 6));
        for (a, b) in whole.iter().zip(chunked.iter()) {
            assert_relative_eq!(*a, *b);
        }
    }

    #[test]
    fn test_any_failed_chunk_fails_the_call() {
        let tagger = SumTagger::new(Some(1));
        let result = infer_in_batches(&tagger, &features(10), 4);
        assert!(matches!(result, Err(GenMatchError::InferenceError(_))));
        assert_eq!(tagger.calls.get(), 2);
    }

    #[test]
    fn test_input_validation() {
        let tagger = SumTagger::new(None);
        assert!(infer_in_batches(&tagger, &features(3), 0).is_err());
        let mut ragged = features(3);
        ragged.insert("sv_mass".to_string(), DMatrix::zeros(2, 1));
        assert!(matches!(
            infer_in_batches(&tagger, &ragged, 2),
            Err(GenMatchError::LengthMismatch {
                expected: 3,
                found: 2,
                ..
            })
        ));
        assert_eq!(tagger.calls.get(), 0);
    }

    #[test]
    fn test_named_scores() {
        let tagger = SumTagger::new(None);
        let scores = TaggerScores::from_matrix(&infer_in_batches(&tagger, &features(2), 8).unwrap())
            .unwrap();
        let names: Vec<&str> = scores.iter().map(|(name, _)| name).collect();
        assert_eq!(names, TAGGER_OUTPUT_NAMES.to_vec());
        // event 1: 1 + (0 + 0.5 + 1.0) = 2.5
        assert_eq!(scores.get("fj_ttbar_bmerged"), Some(&[0.0, 2.5][..]));
        assert_eq!(scores.get("fj_isHVV_taunuqq"), Some(&[0.0, 15.0][..]));
        let columns = scores.into_columns();
        assert_eq!(
            columns.get("fj_wjets_label"),
            Some(&GenColumn::Float(vec![0.0, 7.5]))
        );
    }

    #[test]
    fn test_no_events() {
        let tagger = SumTagger::new(None);
        let scores = infer_in_batches(&tagger, &features(0), 4).unwrap();
        assert_eq!(scores.nrows(), 0);
        assert_eq!(tagger.calls.get(), 0);
        let named = TaggerScores::from_matrix(&scores).unwrap();
        assert!(named.iter().all(|(_, column)| column.is_empty()));
        assert!(TaggerScores::from_matrix(&DMatrix::zeros(2, 3)).is_err());
    }
}
