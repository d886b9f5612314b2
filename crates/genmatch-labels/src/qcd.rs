use genmatch_core::{
    traits::Classifier, utils::geometry::any_matched, utils::pdg, EventVars, GenEvent,
    MatchingConfig,
};
use serde::{Deserialize, Serialize};

use crate::{label, names};

const QCD_VARS: [&str; 5] = [
    "fj_QCDb",
    "fj_QCDbb",
    "fj_QCDc",
    "fj_QCDcc",
    "fj_QCDothers",
];

/// Labels fat jets in QCD multijet samples by the number of $`B`$ and $`D`$ hadrons clustered
/// in them. The jet is matched when any gluon or light-enough quark lies within the association
/// radius.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QcdMatcher;

impl QcdMatcher {
    /// Construct a [`QcdMatcher`].
    pub fn new() -> Box<Self> {
        Self.into()
    }
}

impl Classifier for QcdMatcher {
    fn name(&self) -> &str {
        "match_QCD"
    }

    fn var_names(&self) -> Vec<String> {
        names(&QCD_VARS)
    }

    fn classify(&self, event: &GenEvent, config: &MatchingConfig) -> (EventVars, bool) {
        let jet = &event.jet;
        let partons = event.particles.select(pdg::PARTONS, &[]);
        let matched = any_matched(jet, &partons, config.jet_dr);

        let (n_b, n_c) = (jet.n_b_hadrons, jet.n_c_hadrons);
        let mut vars = EventVars::new();
        vars.insert("fj_QCDb".to_string(), label(n_b == 1));
        vars.insert("fj_QCDbb".to_string(), label(n_b > 1));
        vars.insert("fj_QCDc".to_string(), label(n_c == 1 && n_b == 0));
        vars.insert("fj_QCDcc".to_string(), label(n_c > 1 && n_b == 0));
        vars.insert("fj_QCDothers".to_string(), label(n_b == 0 && n_c == 0));
        (vars, matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genmatch_core::{data::test_qcd_event, GenColumn, GenValue};

    fn labels(n_b: u32, n_c: u32) -> Vec<i64> {
        let mut event = test_qcd_event();
        event.jet = event.jet.with_hadron_counts(n_b, n_c);
        let (vars, _) = QcdMatcher::new().classify(&event, &MatchingConfig::default());
        QCD_VARS
            .iter()
            .map(|name| match vars.get(*name) {
                Some(GenValue::Int(value)) => *value,
                other => panic!("unexpected value for {}: {:?}", name, other),
            })
            .collect()
    }

    #[test]
    fn test_double_b() {
        let (vars, matched) =
            QcdMatcher::new().classify(&test_qcd_event(), &MatchingConfig::default());
        assert!(matched);
        assert_eq!(vars.get("fj_QCDbb"), Some(&GenValue::Int(1)));
        assert_eq!(labels(2, 1), vec![0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_labels_are_exclusive() {
        assert_eq!(labels(1, 0), vec![1, 0, 0, 0, 0]);
        assert_eq!(labels(1, 3), vec![1, 0, 0, 0, 0]);
        assert_eq!(labels(0, 1), vec![0, 0, 1, 0, 0]);
        assert_eq!(labels(0, 2), vec![0, 0, 0, 1, 0]);
        assert_eq!(labels(0, 0), vec![0, 0, 0, 0, 1]);
        for n_b in 0..4 {
            for n_c in 0..4 {
                assert_eq!(labels(n_b, n_c).iter().sum::<i64>(), 1);
            }
        }
    }

    #[test]
    fn test_parton_matching() {
        let mut event = test_qcd_event();
        event.jet.p4 = genmatch_core::Vec4::from_pt_eta_phi_m(290.0, 2.5, -1.0, 40.0);
        let (matched, vars) =
            QcdMatcher::new().classify_batch(&[test_qcd_event(), event], &MatchingConfig::default());
        assert_eq!(matched, vec![true, false]);
        assert_eq!(vars.get("fj_QCDbb"), Some(&GenColumn::Int(vec![1, 1])));
    }
}
