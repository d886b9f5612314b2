//! # genmatch-labels
//!
//! Decay-hypothesis classifiers used by `genmatch`. Each one implements
//! [`Classifier`](genmatch_core::Classifier) for a family of samples.
#![warn(clippy::perf, clippy::style)]

use genmatch_core::{
    utils::geometry::{count_matched, Direction},
    DecayWeights, GenValue,
};

/// Higgs boson decays to $`WW`$ and $`\tau\tau`$.
pub mod higgs;
pub use higgs::{HiggsDecay, HiggsMatcher};

/// Inclusive QCD jets labeled by their heavy-flavor hadron content.
pub mod qcd;
pub use qcd::QcdMatcher;

/// Top quark decays.
pub mod top;
pub use top::TopMatcher;

/// $`W`$ and $`Z`$ boson decays.
pub mod vboson;
pub use vboson::VMatcher;

/// Combine the decay channels present in an event into a single code.
pub(crate) fn decay_code(
    weights: &DecayWeights,
    hadronic: bool,
    electron: bool,
    muon: bool,
    multi: bool,
) -> i64 {
    weights.hadronic * hadronic as i64
        + weights.electron * electron as i64
        + weights.muon * muon as i64
        + weights.multi * multi as i64
}

/// An integer 0/1 label.
pub(crate) fn label(value: bool) -> GenValue {
    GenValue::Int(value as i64)
}

/// Number of `particles` within `radius` of `axis`, as an output value.
pub(crate) fn n_matched<A, B, I>(axis: &A, particles: I, radius: f64) -> GenValue
where
    A: Direction + ?Sized,
    B: Direction,
    I: IntoIterator<Item = B>,
{
    GenValue::Int(count_matched(axis, particles, radius) as i64)
}

pub(crate) fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_codes_are_distinct() {
        let weights = DecayWeights::default();
        assert_eq!(decay_code(&weights, true, false, false, false), 1);
        assert_eq!(decay_code(&weights, true, true, false, false), 4);
        assert_eq!(decay_code(&weights, true, false, true, false), 6);
        assert_eq!(decay_code(&weights, false, false, false, true), 7);
        assert_eq!(decay_code(&weights, false, false, false, false), 0);
    }
}
