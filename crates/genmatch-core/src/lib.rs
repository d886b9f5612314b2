//! # genmatch-core
//!
//! This is an internal crate used by `genmatch`.
#![warn(clippy::perf, clippy::style)]
#![allow(clippy::excessive_precision)]

use dyn_clone::DynClone;
use thiserror::Error;

/// Methods for building and navigating generator-level particle trees.
pub mod data;
/// Closed-form neutrino longitudinal-momentum reconstruction.
pub mod neutrino;
/// Working-point configuration shared by all classifiers.
pub mod config;
/// Per-event and per-batch output columns.
pub mod vars;
/// Utility functions, enums, and traits
pub mod utils;
/// Useful traits for all crate structs
pub mod traits {
    pub use crate::utils::geometry::Direction;
    pub use crate::Classifier;
}

pub use crate::config::{DecayWeights, MatchingConfig};
pub use crate::data::io::write_parquet;
pub use crate::data::{FatJet, GenEvent, GenParticle, GenParticleData, GenParticles};
pub use crate::neutrino::{higgs_neutrino_p4, neutrino_p4, neutrino_p4_batch, neutrino_pz};
pub use crate::utils::enums::{GenFlag, StatusFlags, GEN_FLAGS};
pub use crate::utils::geometry::{closest, delta_phi, delta_r, is_matched};
pub use crate::utils::pid::{pid_mask, pid_mask_all, PdgIds};
pub use crate::utils::vectors::Vec4;
pub use crate::vars::{EventVars, GenColumn, GenMatchOutput, GenValue, GenVars};

/// Value used in place of a missing per-event quantity (for instance, the transverse momentum of
/// a Higgs boson in an event that has none).
pub const FILL_NONE_VALUE: f64 = -99999.0;

pub type GenMatchResult<T> = Result<T, GenMatchError>;

/// The error type used by all `genmatch` internal methods
#[derive(Error, Debug)]
pub enum GenMatchError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    /// An alias for [`parquet::errors::ParquetError`].
    #[error("Parquet Error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),
    /// An alias for [`arrow::error::ArrowError`].
    #[error("Arrow Error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
    /// An alias for [`shellexpand::LookupError`].
    #[error("Failed to expand path: {0}")]
    LookupError(#[from] shellexpand::LookupError<std::env::VarError>),
    /// An error which occurs when the user tries to parse an invalid string of text, typically
    /// into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed
        name: String,
        /// The name of the object it failed to parse into
        object: String,
    },
    /// Two inputs which must describe the same events (or particles) have different lengths.
    #[error("Length mismatch in {context}: expected {expected}, found {found}")]
    LengthMismatch {
        /// Where the mismatch was detected
        context: String,
        /// The reference length
        expected: usize,
        /// The offending length
        found: usize,
    },
    /// A mother index points outside of the event it belongs to.
    #[error("Particle {index} has mother index {mother} but the event only has {n_particles} particles")]
    InvalidParticleIndex {
        /// Index of the particle with the bad mother reference
        index: usize,
        /// The mother index as it was given
        mother: i64,
        /// Number of particles in the event
        n_particles: usize,
    },
    /// A column could not be converted to a flat numeric representation.
    #[error("Cannot convert column \"{name}\" to a flat array: {reason}")]
    ConversionError {
        /// Name of the column
        name: String,
        /// Why the conversion failed
        reason: String,
    },
    /// The tagger inference failed for an entire batch.
    #[error("Inference failed: {0}")]
    InferenceError(String),
    /// A custom fallback error for errors too complex or too infrequent to warrant their own error
    /// category.
    #[error("{0}")]
    Custom(String),
}

impl Clone for GenMatchError {
    // io, parquet and arrow errors are not cloneable, so keep the message only
    fn clone(&self) -> Self {
        let err_string = self.to_string();
        GenMatchError::Custom(err_string)
    }
}

/// A decay hypothesis which can label a fat jet from the generator-level particles of its event.
///
/// Implementors only need to provide the per-event [`Classifier::classify`]; the batched
/// [`Classifier::classify_batch`] evaluates it over every event (in parallel when the `rayon`
/// feature is enabled) and assembles one column per name in [`Classifier::var_names`].
pub trait Classifier: DynClone + Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Names of every variable this classifier produces, in output order.
    fn var_names(&self) -> Vec<String>;

    /// Label a single event. Returns the per-event variables and whether the event's fat jet is
    /// matched to the hypothesized decay.
    fn classify(&self, event: &GenEvent, config: &MatchingConfig) -> (EventVars, bool);

    /// Label every event in a batch, returning the matched mask and one column per variable.
    fn classify_batch(&self, events: &[GenEvent], config: &MatchingConfig) -> (Vec<bool>, GenVars) {
        #[cfg(feature = "rayon")]
        let results: Vec<(EventVars, bool)> = {
            use rayon::prelude::*;
            events
                .par_iter()
                .map(|event| self.classify(event, config))
                .collect()
        };
        #[cfg(not(feature = "rayon"))]
        let results: Vec<(EventVars, bool)> = events
            .iter()
            .map(|event| self.classify(event, config))
            .collect();
        let (per_event, matched): (Vec<EventVars>, Vec<bool>) = results.into_iter().unzip();
        (matched, GenVars::from_events(&self.var_names(), &per_event))
    }
}

dyn_clone::clone_trait_object!(Classifier);
