use genmatch_core::{
    traits::Classifier,
    utils::{
        geometry::{any_matched, closest, is_matched},
        pdg,
    },
    EventVars, GenEvent, GenParticle, GenValue, MatchingConfig, GEN_FLAGS,
};
use serde::{Deserialize, Serialize};

use crate::{decay_code, label, n_matched, names};

const V_VARS: [&str; 8] = [
    "fj_nprongs",
    "fj_lepinprongs",
    "fj_ncquarks",
    "fj_V_isMatched",
    "fj_V_2q",
    "fj_V_elenu",
    "fj_V_munu",
    "fj_V_taunu",
];

/// Labels fat jets in $`W`$+jets and $`Z`$+jets samples.
///
/// The boson closest to the jet is selected among the last copies of hard-process $`W`$ and
/// $`Z`$ bosons, and its hard-process daughters are tallied into a decay code. A hadronic decay
/// requires exactly two daughters with $`|\text{PDG}| < 5`$, so decays to $`b`$ quarks are not
/// labeled hadronic. At most one of `fj_V_2q`, `fj_V_elenu`, `fj_V_munu` and `fj_V_taunu` is set.
///
/// The jet is matched when both the boson and at least one of its daughters lie within the
/// association radius.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VMatcher;

impl VMatcher {
    /// Construct a [`VMatcher`].
    pub fn new() -> Box<Self> {
        Self.into()
    }
}

impl Classifier for VMatcher {
    fn name(&self) -> &str {
        "match_V"
    }

    fn var_names(&self) -> Vec<String> {
        names(&V_VARS)
    }

    fn classify(&self, event: &GenEvent, config: &MatchingConfig) -> (EventVars, bool) {
        let jet = &event.jet;
        let radius = config.jet_dr;
        let bosons = event
            .particles
            .select([pdg::Z_BOSON, pdg::W_BOSON], &GEN_FLAGS);
        let matched_boson = closest(jet, &bosons).map(|index| bosons[index]);

        let daughters: Vec<GenParticle<'_>> = matched_boson
            .map(|boson| boson.distinct_children())
            .unwrap_or_default()
            .into_iter()
            .filter(|dau| dau.has_flags(&GEN_FLAGS))
            .collect();
        let n_with = |predicate: fn(i32) -> bool| {
            daughters
                .iter()
                .filter(|dau| predicate(dau.abs_pdg_id()))
                .count()
        };
        let weights = &config.decay_weights;
        let code = decay_code(
            weights,
            n_with(|id| id < pdg::BOTTOM) == 2,
            n_with(|id| id == pdg::ELECTRON) >= 1,
            n_with(|id| id == pdg::MUON) >= 1,
            n_with(|id| id == pdg::TAU) >= 1,
        );

        let prongs: Vec<&GenParticle<'_>> = daughters
            .iter()
            .filter(|dau| !pdg::is_neutrino(dau.pdg_id()))
            .collect();
        let matched = matched_boson.is_some_and(|boson| is_matched(jet, &boson, radius))
            && any_matched(jet, &daughters, radius);

        let mut vars = EventVars::new();
        vars.insert("fj_nprongs".to_string(), n_matched(jet, &prongs, radius));
        vars.insert(
            "fj_lepinprongs".to_string(),
            n_matched(
                jet,
                prongs.iter().filter(|dau| pdg::is_lepton(dau.pdg_id())),
                radius,
            ),
        );
        vars.insert(
            "fj_ncquarks".to_string(),
            n_matched(
                jet,
                prongs.iter().filter(|dau| dau.abs_pdg_id() == pdg::CHARM),
                radius,
            ),
        );
        vars.insert("fj_V_isMatched".to_string(), GenValue::Bool(matched));
        vars.insert("fj_V_2q".to_string(), label(code == weights.hadronic));
        vars.insert("fj_V_elenu".to_string(), label(code == weights.electron));
        vars.insert("fj_V_munu".to_string(), label(code == weights.muon));
        vars.insert("fj_V_taunu".to_string(), label(code == weights.multi));
        (vars, matched)
    }
}
