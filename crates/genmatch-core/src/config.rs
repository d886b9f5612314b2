use serde::{Deserialize, Serialize};

use crate::FILL_NONE_VALUE;

/// Weights combined into a single decay code when an event's decay products are tallied.
///
/// A code is the sum of the weights of every decay channel present, so the four weights must be
/// distinct (and no weight may equal the sum of others) for a code to identify its channels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayWeights {
    /// Weight of a hadronic decay.
    pub hadronic: i64,
    /// Weight of a decay to an electron.
    pub electron: i64,
    /// Weight of a decay to a muon.
    pub muon: i64,
    /// Weight of a decay to a tau, or to two light leptons of the same flavor.
    pub multi: i64,
}

impl Default for DecayWeights {
    fn default() -> Self {
        Self {
            hadronic: 1,
            electron: 3,
            muon: 5,
            multi: 7,
        }
    }
}

/// Options shared by every classifier.
///
/// ```
/// use genmatch_core::MatchingConfig;
///
/// let config = MatchingConfig::new().jet_dr(1.5);
/// assert_eq!(config.jet_dr, 1.5);
/// assert_eq!(config.higgs_mass, 125.0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Cone radius used to associate generator particles with the fat jet.
    pub jet_dr: f64,
    /// Nominal Higgs mass reported as the resonance mass of Higgs jets.
    pub higgs_mass: f64,
    /// Value written for float variables which are undefined in an event.
    pub fill_none_value: f64,
    /// Weights used to build decay codes.
    pub decay_weights: DecayWeights,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            jet_dr: 0.8,
            higgs_mass: 125.0,
            fill_none_value: FILL_NONE_VALUE,
            decay_weights: DecayWeights::default(),
        }
    }
}

impl MatchingConfig {
    /// Create the default configuration (AK8 jets, $`m_H = 125`$ GeV).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jet_dr(mut self, jet_dr: f64) -> Self {
        self.jet_dr = jet_dr;
        self
    }

    pub fn higgs_mass(mut self, higgs_mass: f64) -> Self {
        self.higgs_mass = higgs_mass;
        self
    }

    pub fn fill_none_value(mut self, fill_none_value: f64) -> Self {
        self.fill_none_value = fill_none_value;
        self
    }

    pub fn decay_weights(mut self, decay_weights: DecayWeights) -> Self {
        self.decay_weights = decay_weights;
        self
    }
}
