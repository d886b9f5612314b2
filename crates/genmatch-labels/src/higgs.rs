use std::{fmt::Display, str::FromStr};

use genmatch_core::{
    traits::Classifier,
    utils::{
        geometry::{any_matched, closest, delta_r, is_matched},
        pdg,
    },
    EventVars, GenEvent, GenFlag, GenMatchError, GenParticle, GenValue, MatchingConfig, GEN_FLAGS,
};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::{decay_code, label, n_matched, names};

const COMMON_VARS: [&str; 2] = ["fj_genH_pt", "fj_genRes_mass"];

const WW_VARS: [&str; 16] = [
    "fj_genH_jet",
    "fj_genV_dR",
    "fj_genVstar",
    "genV_genVstar_dR",
    "fj_nquarks",
    "fj_ncquarks",
    "fj_lepinprongs",
    "fj_H_VV_4q",
    "fj_H_VV_elenuqq",
    "fj_H_VV_munuqq",
    "fj_H_VV_taunuqq",
    "fj_H_VV_isVlepton",
    "fj_H_VV_isVstarlepton",
    "fj_H_VV_isMatched",
    "gen_Vlep_pt",
    "genlep_dR_lep",
];

const TAUTAU_VARS: [&str; 5] = [
    "fj_H_tt_hadhad",
    "fj_H_tt_elehad",
    "fj_H_tt_muhad",
    "fj_H_tt_leplep",
    "fj_H_tt_isMatched",
];

/// The Higgs decay a [`HiggsMatcher`] looks for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HiggsDecay {
    /// $`H\to WW^*`$
    WW,
    /// $`H\to\tau\tau`$
    TauTau,
}

impl HiggsDecay {
    /// The (absolute) PDG code of the Higgs daughters for this decay.
    pub fn daughter_pdg_id(&self) -> i32 {
        match self {
            HiggsDecay::WW => pdg::W_BOSON,
            HiggsDecay::TauTau => pdg::TAU,
        }
    }
}

impl Display for HiggsDecay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HiggsDecay::WW => write!(f, "WW"),
            HiggsDecay::TauTau => write!(f, "TauTau"),
        }
    }
}

impl FromStr for HiggsDecay {
    type Err = GenMatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ww" | "vv" => Ok(HiggsDecay::WW),
            "tautau" | "tt" => Ok(HiggsDecay::TauTau),
            _ => Err(GenMatchError::ParseError {
                name: s.to_string(),
                object: "HiggsDecay".to_string(),
            }),
        }
    }
}

/// Labels fat jets in Higgs samples.
///
/// The Higgs candidates are the last copies of hard-process Higgs bosons, and the one closest
/// to the jet is taken as the jet's Higgs. The jet is matched when that Higgs lies within the
/// association radius. For $`WW`$ decays at least one non-neutrino decay product of the $`W`$s
/// must lie within the radius as well.
///
/// # $`H\to WW^*`$
///
/// The lighter $`W`$ daughter is the off-shell $`V^*`$ and the heavier one is the on-shell $`V`$.
/// The decay products of both are counted to label the decay as fully hadronic
/// (`fj_H_VV_4q`) or semi-leptonic to an electron, muon or tau (`fj_H_VV_elenuqq`,
/// `fj_H_VV_munuqq`, `fj_H_VV_taunuqq`). Photons radiated by a $`W`$ are not counted.
///
/// Whether the generator lepton comes from $`V`$ or $`V^*`$ (`fj_H_VV_isVlepton`,
/// `fj_H_VV_isVstarlepton`) is decided by comparing the mass of the lepton's distinct parent
/// with the masses of $`V`$ and $`V^*`$ for exact equality.
///
/// # $`H\to\tau\tau`$
///
/// The visible decay products of both taus are tallied into a decay code, from which exactly one
/// of `fj_H_tt_hadhad`, `fj_H_tt_elehad`, `fj_H_tt_muhad` and `fj_H_tt_leplep` is set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HiggsMatcher {
    decay: HiggsDecay,
}

impl HiggsMatcher {
    /// Construct a [`HiggsMatcher`] for the given decay.
    pub fn new(decay: HiggsDecay) -> Box<Self> {
        Self { decay }.into()
    }

    pub fn decay(&self) -> HiggsDecay {
        self.decay
    }

    fn classify_ww(
        &self,
        event: &GenEvent,
        config: &MatchingConfig,
        higgs: &[GenParticle<'_>],
        matched_higgs: Option<GenParticle<'_>>,
        vars: &mut EventVars,
    ) -> bool {
        let jet = &event.jet;
        let fill = config.fill_none_value;
        let radius = config.jet_dr;

        let ws: Vec<GenParticle<'_>> = matched_higgs
            .map(|h| h.children())
            .unwrap_or_default()
            .into_iter()
            .filter(|child| child.abs_pdg_id() == self.decay.daughter_pdg_id())
            .collect();
        let v_star = ws
            .iter()
            .copied()
            .min_by(|a, b| a.mass().total_cmp(&b.mass()));
        let v = ws
            .iter()
            .copied()
            .max_by(|a, b| a.mass().total_cmp(&b.mass()));

        let first_higgs = higgs.first();
        vars.insert(
            "fj_genH_jet".to_string(),
            GenValue::float_or(first_higgs.map(|h| delta_r(jet, h)), fill),
        );
        vars.insert(
            "fj_genV_dR".to_string(),
            GenValue::float_or(v.map(|v| delta_r(jet, &v)), fill),
        );
        vars.insert(
            "fj_genVstar".to_string(),
            GenValue::float_or(v_star.map(|v_star| delta_r(jet, &v_star)), fill),
        );
        vars.insert(
            "genV_genVstar_dR".to_string(),
            GenValue::float_or(
                v.zip(v_star).map(|(v, v_star)| delta_r(&v, &v_star)),
                fill,
            ),
        );

        // decay products of every Higgs daughter, without photons radiated by a W
        let daughters: Vec<GenParticle<'_>> = higgs
            .iter()
            .flat_map(|h| h.children())
            .flat_map(|child| child.distinct_children_deep())
            .filter(|dau| !is_radiated_photon(dau))
            .collect();

        let n_quarks = count(&daughters, |id| pdg::is_light_quark(id));
        let n_leptons = count(&daughters, pdg::is_lepton);
        let n_electrons = count(&daughters, |id| id.abs() == pdg::ELECTRON);
        let n_muons = count(&daughters, |id| id.abs() == pdg::MUON);
        let n_taus = count(&daughters, |id| id.abs() == pdg::TAU);

        let prongs: Vec<&GenParticle<'_>> = daughters
            .iter()
            .filter(|dau| !pdg::is_neutrino(dau.pdg_id()))
            .collect();
        let leptons: Vec<&GenParticle<'_>> = daughters
            .iter()
            .filter(|dau| pdg::is_lepton(dau.pdg_id()))
            .collect();
        vars.insert(
            "fj_nquarks".to_string(),
            n_matched(
                jet,
                prongs.iter().filter(|dau| !pdg::is_lepton(dau.pdg_id())),
                radius,
            ),
        );
        vars.insert(
            "fj_ncquarks".to_string(),
            n_matched(
                jet,
                daughters
                    .iter()
                    .filter(|dau| dau.abs_pdg_id() == pdg::CHARM),
                radius,
            ),
        );
        vars.insert(
            "fj_lepinprongs".to_string(),
            n_matched(jet, leptons.iter(), radius),
        );

        let semileptonic = n_quarks == 2 && n_leptons == 1;
        vars.insert(
            "fj_H_VV_4q".to_string(),
            label(n_quarks == 4 && n_leptons == 0),
        );
        vars.insert(
            "fj_H_VV_elenuqq".to_string(),
            label(semileptonic && n_electrons == 1),
        );
        vars.insert(
            "fj_H_VV_munuqq".to_string(),
            label(semileptonic && n_muons == 1),
        );
        vars.insert(
            "fj_H_VV_taunuqq".to_string(),
            label(semileptonic && n_taus == 1),
        );

        let gen_lepton = leptons.first().copied();
        let lepton_parent = gen_lepton.and_then(|lepton| lepton.distinct_parent());
        // exact comparison: the parent is one of V and V* when the lepton comes from the Higgs
        let same_mass = |boson: Option<GenParticle<'_>>| match (lepton_parent, boson) {
            (Some(parent), Some(boson)) => GenValue::Bool(parent.mass() == boson.mass()),
            _ => GenValue::Missing,
        };
        vars.insert("fj_H_VV_isVlepton".to_string(), same_mass(v));
        vars.insert("fj_H_VV_isVstarlepton".to_string(), same_mass(v_star));
        vars.insert(
            "fj_H_VV_isMatched".to_string(),
            GenValue::Bool(!ws.is_empty()),
        );
        vars.insert(
            "gen_Vlep_pt".to_string(),
            GenValue::float_or_missing(gen_lepton.map(|lepton| lepton.pt())),
        );
        vars.insert(
            "genlep_dR_lep".to_string(),
            GenValue::float_or_missing(
                event
                    .candidate_lepton
                    .zip(gen_lepton)
                    .map(|(reco, gen)| delta_r(&reco, gen)),
            ),
        );

        matched_higgs.is_some_and(|h| is_matched(jet, &h, radius))
            && any_matched(jet, prongs, radius)
    }

    fn classify_tautau(
        &self,
        event: &GenEvent,
        config: &MatchingConfig,
        matched_higgs: Option<GenParticle<'_>>,
        vars: &mut EventVars,
    ) -> bool {
        let taus: Vec<GenParticle<'_>> = matched_higgs
            .map(|h| h.children())
            .unwrap_or_default()
            .into_iter()
            .filter(|child| child.abs_pdg_id() == self.decay.daughter_pdg_id())
            .collect();
        let visible: Vec<GenParticle<'_>> = taus
            .iter()
            .flat_map(|tau| tau.distinct_children_deep())
            .filter(|dau| dau.has_flags(&[GenFlag::IsLastCopy]) && !pdg::is_neutrino(dau.pdg_id()))
            .collect();
        let n_hadrons = count(&visible, |id| pdg::TAU_HADRONS.contains(&id.abs()));
        let n_electrons = count(&visible, |id| id.abs() == pdg::ELECTRON);
        let n_muons = count(&visible, |id| id.abs() == pdg::MUON);

        let weights = &config.decay_weights;
        let code = decay_code(
            weights,
            n_hadrons > 0,
            n_electrons == 1,
            n_muons == 1,
            n_electrons == 2 || n_muons == 2,
        );
        let elehad = code == weights.hadronic + weights.electron;
        let muhad = code == weights.hadronic + weights.muon;
        let leplep = code == weights.multi;
        vars.insert(
            "fj_H_tt_hadhad".to_string(),
            label(!elehad && !muhad && !leplep),
        );
        vars.insert("fj_H_tt_elehad".to_string(), label(elehad));
        vars.insert("fj_H_tt_muhad".to_string(), label(muhad));
        vars.insert("fj_H_tt_leplep".to_string(), label(leplep));
        vars.insert(
            "fj_H_tt_isMatched".to_string(),
            GenValue::Bool(!taus.is_empty()),
        );

        matched_higgs.is_some_and(|h| is_matched(&event.jet, &h, config.jet_dr))
    }
}

fn count(particles: &[GenParticle<'_>], predicate: impl Fn(i32) -> bool) -> usize {
    particles
        .iter()
        .filter(|particle| predicate(particle.pdg_id()))
        .count()
}

// W -> W gamma radiation which would otherwise be counted as a decay product
fn is_radiated_photon(particle: &GenParticle<'_>) -> bool {
    particle.abs_pdg_id() == pdg::PHOTON
        && particle
            .distinct_parent()
            .is_some_and(|parent| parent.abs_pdg_id() == pdg::W_BOSON)
}

impl Classifier for HiggsMatcher {
    fn name(&self) -> &str {
        match self.decay {
            HiggsDecay::WW => "match_H(WW)",
            HiggsDecay::TauTau => "match_H(TauTau)",
        }
    }

    fn var_names(&self) -> Vec<String> {
        let mut all = names(&COMMON_VARS);
        match self.decay {
            HiggsDecay::WW => all.extend(names(&WW_VARS)),
            HiggsDecay::TauTau => all.extend(names(&TAUTAU_VARS)),
        }
        all
    }

    fn classify(&self, event: &GenEvent, config: &MatchingConfig) -> (EventVars, bool) {
        let higgs = event.particles.select(pdg::HIGGS, &GEN_FLAGS);
        let matched_higgs = closest(&event.jet, &higgs).map(|index| higgs[index]);
        if matched_higgs.is_none() {
            trace!("no Higgs candidate in event");
        }
        let mut vars = EventVars::new();
        vars.insert(
            "fj_genH_pt".to_string(),
            GenValue::float_or(matched_higgs.map(|h| h.pt()), config.fill_none_value),
        );
        vars.insert(
            "fj_genRes_mass".to_string(),
            GenValue::Float(config.higgs_mass),
        );
        let matched = match self.decay {
            HiggsDecay::WW => self.classify_ww(event, config, &higgs, matched_higgs, &mut vars),
            HiggsDecay::TauTau => self.classify_tautau(event, config, matched_higgs, &mut vars),
        };
        (vars, matched)
    }
}
