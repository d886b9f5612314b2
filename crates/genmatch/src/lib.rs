//! `genmatch` assigns generator-level truth labels to boosted fat jets. Given the generator
//! particles of each event and the reconstructed fat jet, it finds the heavy particle (Higgs,
//! $`W`$/$`Z`$, top, or QCD parton) the jet came from, counts which of its decay products lie
//! inside the jet, and encodes the decay channel as integer labels for tagger training.
//!
//! # Table of Contents
//! - [Key Features](#key-features)
//! - [Quick Start](#quick-start)
//! - [Sample Routing](#sample-routing)
//! - [Decay Codes](#decay-codes)
//! - [Output Format](#output-format)
//!
//! # Key Features
//! * An arena-based particle tree ([`GenParticles`]) with navigation through copies of the same
//!   particle to the distinct parent and distinct children.
//! * A single [`Classifier`](crate::traits::Classifier) trait implemented by one matcher per
//!   decay hypothesis, evaluated over event batches in parallel with
//!   [`rayon`](https://github.com/rayon-rs/rayon).
//! * A dispatcher ([`tagger_gen_matching`]) which picks the hypothesis from the sample label and
//!   always returns the same requested columns, whatever the sample.
//! * Closed-form reconstruction of the longitudinal neutrino momentum from a visible system and
//!   the missing transverse momentum under a parent-mass constraint ([`neutrino_p4`],
//!   [`higgs_neutrino_p4`]).
//! * Parquet output of the labels ([`write_parquet`]) and a boundary trait for tagger inference
//!   ([`inference::TaggerInference`]).
//!
//! # Quick Start
//! ```rust
//! use genmatch::{data::test_hww_event, tagger_gen_matching, write_parquet, MatchingConfig};
//!
//! let events = vec![test_hww_event(); 4];
//! let output = tagger_gen_matching(
//!     &events,
//!     &["fj_H_VV_munuqq", "fj_genH_pt", "fj_genjetmass"],
//!     "GluGluHToWW_Pt-200ToInf",
//!     &MatchingConfig::default(),
//! );
//! assert_eq!(output.matched, vec![true; 4]);
//! # let dir = std::env::temp_dir().join("genmatch_quick_start");
//! # std::fs::create_dir_all(&dir).unwrap();
//! # let path = dir.join("labels.parquet");
//! write_parquet(path.to_str().unwrap(), &output).unwrap();
//! ```
//!
//! # Sample Routing
//! The sample label chooses the hypothesis, checked in this order: any label containing an
//! upper-case `H` is a Higgs sample ($`\tau\tau`$ if it contains `tautau` in any case, otherwise
//! $`WW`$), then `QCD`, `VJets` and `Top`. Note that the Higgs check comes first, so a label like
//! `QCD_HT700to1000` is routed to the Higgs matcher. See [`SampleKind::from_label`].
//!
//! # Decay Codes
//! The $`\tau\tau`$, $`V`$ and top labels combine the channels present with the weights in
//! [`DecayWeights`]: hadronic $`= 1`$, electron $`= 3`$, muon $`= 5`$, multiple leptons or tau
//! $`= 7`$, summed over the channels found. For $`H\to\tau\tau`$, `fj_H_tt_elehad` is set for
//! code $`4`$, `fj_H_tt_muhad` for $`6`$, `fj_H_tt_leplep` for $`7`$ and `fj_H_tt_hadhad`
//! otherwise.
//!
//! The $`H\to WW`$ labels count the Higgs decay products instead: `fj_H_VV_4q` needs four quarks
//! and no lepton, while `fj_H_VV_elenuqq`, `fj_H_VV_munuqq` and `fj_H_VV_taunuqq` need two quarks
//! and exactly one lepton of the named flavor.
//!
//! # Output Format
//! Every column returned by [`tagger_gen_matching`] is a flat float column, so labels, flags
//! and zero-filled variables of every sample share one type. Only a column with a missing entry
//! (for instance `fj_genjetmass` for a jet without a generator jet) stays nullable.
//! [`write_parquet`] writes one row per event: a boolean `matched` column followed by every
//! requested variable in request order, with float columns stored as nullable 64-bit floats.
#![warn(clippy::perf, clippy::style, missing_docs)]

/// Sample routing and the batch entry point.
pub mod dispatch;
/// The boundary to an external jet tagger.
pub mod inference;

/// Methods for building and navigating generator-level events.
pub mod data {
    pub use genmatch_core::data::io::{write_parquet, MATCHED_COLUMN};
    pub use genmatch_core::data::{
        test_hww_event, test_qcd_event, FatJet, GenEvent, GenParticle, GenParticleData,
        GenParticles,
    };
}
/// Utility functions, enums, and traits
pub mod utils {
    pub use genmatch_core::utils::*;
}
/// Useful traits for all crate structs
pub mod traits {
    pub use genmatch_core::traits::{Classifier, Direction};
    pub use crate::inference::TaggerInference;
}
/// The decay hypotheses and their [`Classifier`](crate::traits::Classifier)s.
pub mod labels {
    pub use genmatch_labels::*;
}

pub use crate::dispatch::{known_var_names, tagger_gen_matching, GenMatcher, SampleKind, GENJET_MASS};
pub use crate::inference::{infer_in_batches, FeatureBatch, TaggerScores, TAGGER_OUTPUT_NAMES};
pub use genmatch_core::{
    closest, delta_phi, delta_r, higgs_neutrino_p4, is_matched, neutrino_p4, neutrino_p4_batch,
    neutrino_pz, pid_mask, pid_mask_all, write_parquet, DecayWeights, EventVars, FatJet,
    GenColumn, GenEvent, GenFlag, GenMatchError, GenMatchOutput, GenMatchResult, GenParticle,
    GenParticleData, GenParticles, GenValue, GenVars, MatchingConfig, PdgIds, StatusFlags, Vec4,
    FILL_NONE_VALUE, GEN_FLAGS,
};
pub use genmatch_labels::{HiggsDecay, HiggsMatcher, QcdMatcher, TopMatcher, VMatcher};
pub use serde::{Deserialize, Serialize};
