use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::{GenMatchError, GenMatchResult};

/// One per-event output value.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GenValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    /// The quantity is undefined for this event.
    Missing,
}

impl GenValue {
    /// The value as a float, or [`None`] if it is [`GenValue::Missing`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GenValue::Float(value) => Some(*value),
            GenValue::Int(value) => Some(*value as f64),
            GenValue::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            GenValue::Missing => None,
        }
    }

    /// A float value, or `fill` if `value` is [`None`].
    pub fn float_or(value: Option<f64>, fill: f64) -> Self {
        GenValue::Float(value.unwrap_or(fill))
    }

    /// A float value, or [`GenValue::Missing`] if `value` is [`None`].
    pub fn float_or_missing(value: Option<f64>) -> Self {
        value.map_or(GenValue::Missing, GenValue::Float)
    }
}

impl From<f64> for GenValue {
    fn from(value: f64) -> Self {
        GenValue::Float(value)
    }
}

impl From<i64> for GenValue {
    fn from(value: i64) -> Self {
        GenValue::Int(value)
    }
}

impl From<bool> for GenValue {
    fn from(value: bool) -> Self {
        GenValue::Bool(value)
    }
}

/// The variables computed for a single event, keyed by output name in insertion order.
pub type EventVars = IndexMap<String, GenValue>;

/// One output column, holding one entry per event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GenColumn {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    /// A float column in which some events have no value.
    Nullable(Vec<Option<f64>>),
}

impl GenColumn {
    /// Assemble a column from per-event values.
    ///
    /// A column made only of booleans (or only of integers) keeps that type. Any missing entry
    /// makes the column [`GenColumn::Nullable`], and every other mixture is promoted to floats.
    /// An empty column is an empty float column.
    pub fn from_values(values: &[GenValue]) -> Self {
        if values.is_empty() {
            return GenColumn::Float(Vec::new());
        }
        if values.iter().all(|v| matches!(v, GenValue::Bool(_))) {
            return GenColumn::Bool(
                values
                    .iter()
                    .map(|v| matches!(v, GenValue::Bool(true)))
                    .collect(),
            );
        }
        if values.iter().all(|v| matches!(v, GenValue::Int(_))) {
            return GenColumn::Int(
                values
                    .iter()
                    .map(|v| match v {
                        GenValue::Int(value) => *value,
                        _ => 0,
                    })
                    .collect(),
            );
        }
        if values.iter().any(|v| matches!(v, GenValue::Missing)) {
            return GenColumn::Nullable(values.iter().map(GenValue::as_f64).collect());
        }
        GenColumn::Float(values.iter().filter_map(GenValue::as_f64).collect())
    }

    /// A float column of `n` zeros.
    pub fn zeros(n: usize) -> Self {
        GenColumn::Float(vec![0.0; n])
    }

    pub fn len(&self) -> usize {
        match self {
            GenColumn::Float(values) => values.len(),
            GenColumn::Int(values) => values.len(),
            GenColumn::Bool(values) => values.len(),
            GenColumn::Nullable(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The entry for one event as a float, or [`None`] if it is missing or out of range.
    pub fn value(&self, index: usize) -> Option<f64> {
        match self {
            GenColumn::Float(values) => values.get(index).copied(),
            GenColumn::Int(values) => values.get(index).map(|v| *v as f64),
            GenColumn::Bool(values) => values.get(index).map(|v| if *v { 1.0 } else { 0.0 }),
            GenColumn::Nullable(values) => values.get(index).copied().flatten(),
        }
    }

    /// Convert the column to plain floats.
    ///
    /// # Errors
    ///
    /// Fails with [`GenMatchError::ConversionError`] if the column is nullable and has at least
    /// one missing entry.
    pub fn to_flat(&self, name: &str) -> GenMatchResult<Vec<f64>> {
        match self {
            GenColumn::Float(values) => Ok(values.clone()),
            GenColumn::Int(values) => Ok(values.iter().map(|v| *v as f64).collect()),
            GenColumn::Bool(values) => Ok(values
                .iter()
                .map(|v| if *v { 1.0 } else { 0.0 })
                .collect()),
            GenColumn::Nullable(values) => values
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    value.ok_or_else(|| GenMatchError::ConversionError {
                        name: name.to_string(),
                        reason: format!("entry {} is missing", index),
                    })
                })
                .collect(),
        }
    }
}

/// Output columns keyed by variable name, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenVars(IndexMap<String, GenColumn>);

impl GenVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one column for each of `names` from per-event variables. An event which did not
    /// produce a variable contributes a missing entry.
    pub fn from_events(names: &[String], per_event: &[EventVars]) -> Self {
        let columns = names
            .iter()
            .map(|name| {
                let values: Vec<GenValue> = per_event
                    .iter()
                    .map(|vars| vars.get(name).copied().unwrap_or(GenValue::Missing))
                    .collect();
                (name.clone(), GenColumn::from_values(&values))
            })
            .collect();
        Self(columns)
    }

    /// Insert (or replace) a column.
    pub fn insert<S: Into<String>>(&mut self, name: S, column: GenColumn) {
        self.0.insert(name.into(), column);
    }

    pub fn get(&self, name: &str) -> Option<&GenColumn> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Column names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GenColumn)> {
        self.0.iter().map(|(name, column)| (name.as_str(), column))
    }

    /// Convert every column to plain floats.
    ///
    /// Nullable columns with a missing entry cannot be converted and are left unchanged.
    pub fn flatten(&mut self) {
        for (name, column) in self.0.iter_mut() {
            if let GenColumn::Float(_) = column {
                continue;
            }
            match column.to_flat(name) {
                Ok(values) => *column = GenColumn::Float(values),
                Err(err) => trace!("leaving column nullable: {}", err),
            }
        }
    }
}

impl FromIterator<(String, GenColumn)> for GenVars {
    fn from_iter<T: IntoIterator<Item = (String, GenColumn)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The result of matching a batch of fat jets: the matched mask and the requested variables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenMatchOutput {
    /// One entry per event.
    pub matched: Vec<bool>,
    /// One column per requested variable, each with one entry per event.
    pub vars: GenVars,
}
