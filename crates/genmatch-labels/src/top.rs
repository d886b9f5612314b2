use genmatch_core::{
    traits::Classifier,
    utils::{
        geometry::{any_matched, count_matched},
        pdg,
    },
    EventVars, GenEvent, GenFlag, GenParticle, GenValue, MatchingConfig, GEN_FLAGS,
};
use serde::{Deserialize, Serialize};

use crate::{decay_code, n_matched, names};

const TOP_VARS: [&str; 10] = [
    "fj_Top_isMatched",
    "fj_Top_numMatched",
    "fj_Top_nquarksnob",
    "fj_Top_nbquarks",
    "fj_Top_ncquarks",
    "fj_Top_nleptons",
    "fj_Top_nele",
    "fj_Top_nmu",
    "fj_Top_ntau",
    "fj_Top_taudecay",
];

/// Labels fat jets in top-quark samples.
///
/// Every hard-process top is followed to its $`b`$ quark and to the decay products of its
/// $`W`$ boson, and the products of each kind lying within the association radius are counted.
/// Taus are further classified by their last-copy children (hadronic, electronic or muonic),
/// and `fj_Top_taudecay` is the sum of the codes of every tau.
///
/// The jet is matched when at least one top and at least one top daughter lie within the
/// association radius.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TopMatcher;

impl TopMatcher {
    /// Construct a [`TopMatcher`].
    pub fn new() -> Box<Self> {
        Self.into()
    }
}

fn hard_distinct_children<'a>(particle: &GenParticle<'a>) -> Vec<GenParticle<'a>> {
    particle
        .distinct_children()
        .into_iter()
        .filter(|child| child.has_flags(&GEN_FLAGS))
        .collect()
}

impl Classifier for TopMatcher {
    fn name(&self) -> &str {
        "match_Top"
    }

    fn var_names(&self) -> Vec<String> {
        names(&TOP_VARS)
    }

    fn classify(&self, event: &GenEvent, config: &MatchingConfig) -> (EventVars, bool) {
        let jet = &event.jet;
        let radius = config.jet_dr;
        let tops = event.particles.select(pdg::TOP, &GEN_FLAGS);
        let daughters: Vec<GenParticle<'_>> =
            tops.iter().flat_map(hard_distinct_children).collect();
        let w_daughters: Vec<GenParticle<'_>> = daughters
            .iter()
            .filter(|dau| dau.abs_pdg_id() == pdg::W_BOSON)
            .flat_map(hard_distinct_children)
            .collect();

        let w_daus = &w_daughters;
        let of_kind = move |predicate: fn(i32) -> bool| {
            w_daus
                .iter()
                .filter(move |dau| predicate(dau.pdg_id()))
        };

        let weights = &config.decay_weights;
        let taudecay: i64 = of_kind(|id| id.abs() == pdg::TAU)
            .map(|tau| {
                let products: Vec<GenParticle<'_>> = tau
                    .children()
                    .into_iter()
                    .filter(|child| child.has_flags(&[GenFlag::IsLastCopy]))
                    .collect();
                let n_electrons = products
                    .iter()
                    .filter(|p| p.abs_pdg_id() == pdg::ELECTRON)
                    .count();
                let n_muons = products
                    .iter()
                    .filter(|p| p.abs_pdg_id() == pdg::MUON)
                    .count();
                decay_code(
                    weights,
                    n_electrons + n_muons == 0,
                    n_electrons == 1,
                    n_muons == 1,
                    false,
                )
            })
            .sum();

        let matched = any_matched(jet, &tops, radius) && any_matched(jet, &daughters, radius);

        let mut vars = EventVars::new();
        vars.insert("fj_Top_isMatched".to_string(), GenValue::Bool(matched));
        vars.insert(
            "fj_Top_numMatched".to_string(),
            GenValue::Int(count_matched(jet, &tops, radius) as i64),
        );
        vars.insert(
            "fj_Top_nquarksnob".to_string(),
            n_matched(
                jet,
                of_kind(|id| !pdg::is_lepton(id) && !pdg::is_neutrino(id)),
                radius,
            ),
        );
        vars.insert(
            "fj_Top_nbquarks".to_string(),
            n_matched(
                jet,
                daughters
                    .iter()
                    .filter(|dau| dau.abs_pdg_id() == pdg::BOTTOM),
                radius,
            ),
        );
        vars.insert(
            "fj_Top_ncquarks".to_string(),
            n_matched(jet, of_kind(|id| id.abs() == pdg::CHARM), radius),
        );
        vars.insert(
            "fj_Top_nleptons".to_string(),
            n_matched(jet, of_kind(pdg::is_lepton), radius),
        );
        vars.insert(
            "fj_Top_nele".to_string(),
            n_matched(jet, of_kind(|id| id.abs() == pdg::ELECTRON), radius),
        );
        vars.insert(
            "fj_Top_nmu".to_string(),
            n_matched(jet, of_kind(|id| id.abs() == pdg::MUON), radius),
        );
        vars.insert(
            "fj_Top_ntau".to_string(),
            n_matched(jet, of_kind(|id| id.abs() == pdg::TAU), radius),
        );
        vars.insert("fj_Top_taudecay".to_string(), GenValue::Int(taudecay));
        (vars, matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genmatch_core::{FatJet, GenParticleData, GenParticles, StatusFlags, Vec4};

    fn hard() -> StatusFlags {
        StatusFlags::from_flags([GenFlag::FromHardProcess, GenFlag::IsLastCopy])
    }

    /// t -> b W, W -> `w_products`; the tau (if any) decays to `tau_products`.
    fn top_event(w_products: &[i32], tau_products: &[i32], jet_eta: f64) -> GenEvent {
        let mut rows = vec![
            GenParticleData::new(6, Vec4::from_pt_eta_phi_m(500.0, 0.0, 0.0, 172.5), hard(), None),
            GenParticleData::new(5, Vec4::from_pt_eta_phi_m(200.0, 0.1, 0.2, 4.8), hard(), Some(0)),
            GenParticleData::new(
                24,
                Vec4::from_pt_eta_phi_m(300.0, -0.1, -0.1, 80.4),
                hard(),
                Some(0),
            ),
        ];
        for id in w_products {
            rows.push(GenParticleData::new(
                *id,
                Vec4::from_pt_eta_phi_m(150.0, -0.1, -0.2, 0.0),
                hard(),
                Some(2),
            ));
        }
        if let Some(tau) = rows.iter().position(|row| row.pdg_id.abs() == pdg::TAU) {
            for id in tau_products {
                rows.push(GenParticleData::new(
                    *id,
                    Vec4::from_pt_eta_phi_m(50.0, -0.1, -0.2, 0.0),
                    StatusFlags::from_flags([GenFlag::IsLastCopy]),
                    Some(tau),
                ));
            }
        }
        GenEvent::new(
            GenParticles::new(rows).unwrap(),
            FatJet::new(Vec4::from_pt_eta_phi_m(500.0, jet_eta, 0.0, 170.0)),
        )
    }

    fn get(vars: &EventVars, name: &str) -> GenValue {
        vars.get(name).copied().unwrap()
    }

    #[test]
    fn test_hadronic_top() {
        let (vars, matched) =
            TopMatcher::new().classify(&top_event(&[4, -3], &[], 0.0), &MatchingConfig::default());
        assert!(matched);
        assert_eq!(get(&vars, "fj_Top_isMatched"), GenValue::Bool(true));
        assert_eq!(get(&vars, "fj_Top_numMatched"), GenValue::Int(1));
        assert_eq!(get(&vars, "fj_Top_nquarksnob"), GenValue::Int(2));
        assert_eq!(get(&vars, "fj_Top_nbquarks"), GenValue::Int(1));
        assert_eq!(get(&vars, "fj_Top_ncquarks"), GenValue::Int(1));
        assert_eq!(get(&vars, "fj_Top_nleptons"), GenValue::Int(0));
        assert_eq!(get(&vars, "fj_Top_taudecay"), GenValue::Int(0));
    }

    #[test]
    fn test_muonic_top_counts_muons() {
        let (vars, _) = TopMatcher::new()
            .classify(&top_event(&[-13, 14], &[], 0.0), &MatchingConfig::default());
        assert_eq!(get(&vars, "fj_Top_nmu"), GenValue::Int(1));
        assert_eq!(get(&vars, "fj_Top_nele"), GenValue::Int(0));
        assert_eq!(get(&vars, "fj_Top_nleptons"), GenValue::Int(1));
        assert_eq!(get(&vars, "fj_Top_nquarksnob"), GenValue::Int(0));
    }

    #[test]
    fn test_tau_decays() {
        let config = MatchingConfig::default();
        for (products, expected) in [
            (&[-211, 111, 16][..], 1),
            (&[11, -12, 16][..], 3),
            (&[13, -14, 16][..], 5),
        ] {
            let (vars, _) = TopMatcher::new().classify(&top_event(&[-15, 16], products, 0.0), &config);
            assert_eq!(get(&vars, "fj_Top_taudecay"), GenValue::Int(expected));
            assert_eq!(get(&vars, "fj_Top_ntau"), GenValue::Int(1));
        }
    }

    #[test]
    fn test_far_jet_is_not_matched() {
        let (vars, matched) =
            TopMatcher::new().classify(&top_event(&[4, -3], &[], 2.5), &MatchingConfig::default());
        assert!(!matched);
        assert_eq!(get(&vars, "fj_Top_numMatched"), GenValue::Int(0));
        assert_eq!(get(&vars, "fj_Top_nbquarks"), GenValue::Int(0));
    }
}
