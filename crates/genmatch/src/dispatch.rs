use std::{fmt::Display, str::FromStr};

use genmatch_core::{
    Classifier, GenColumn, GenEvent, GenMatchError, GenMatchOutput, GenVars, MatchingConfig,
};
use genmatch_labels::{HiggsDecay, HiggsMatcher, QcdMatcher, TopMatcher, VMatcher};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Name of the generator-jet mass variable added to every sample.
pub const GENJET_MASS: &str = "fj_genjetmass";

/// The family of samples an event batch belongs to, which decides the decay hypothesis used to
/// label its fat jets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    /// Higgs samples decaying to $`WW^*`$.
    HiggsWW,
    /// Higgs samples decaying to $`\tau\tau`$.
    HiggsTauTau,
    /// $`W`$+jets and $`Z`$+jets samples.
    VJets,
    /// Top-quark samples.
    Top,
    /// QCD multijet samples.
    Qcd,
    /// Samples which are not labeled.
    Unknown,
}

impl SampleKind {
    /// Every kind, in the order they are listed above.
    pub const ALL: [SampleKind; 6] = [
        SampleKind::HiggsWW,
        SampleKind::HiggsTauTau,
        SampleKind::VJets,
        SampleKind::Top,
        SampleKind::Qcd,
        SampleKind::Unknown,
    ];

    /// Decide the kind of a sample from its dataset label.
    ///
    /// The first of these rules that applies wins:
    /// 1. a label containing `H` is a Higgs sample, decaying to $`\tau\tau`$ if the label also
    ///    contains `tautau` (in any case) and to $`WW^*`$ otherwise,
    /// 2. a label containing `QCD` is a QCD sample,
    /// 3. a label containing `VJets` is a vector-boson sample,
    /// 4. a label containing `Top` is a top sample.
    ///
    /// Everything else is [`SampleKind::Unknown`]. Note that the test for `H` is a plain
    /// substring test, so a label such as `"QCD_HT1000"` is treated as a Higgs sample.
    ///
    /// ```
    /// use genmatch::SampleKind;
    ///
    /// assert_eq!(SampleKind::from_label("GluGluHToWW_Pt-200ToInf"), SampleKind::HiggsWW);
    /// assert_eq!(SampleKind::from_label("VBFHToTauTau"), SampleKind::HiggsTauTau);
    /// assert_eq!(SampleKind::from_label("QCD_Pt_470to600"), SampleKind::Qcd);
    /// assert_eq!(SampleKind::from_label("SingleMuon"), SampleKind::Unknown);
    /// ```
    pub fn from_label(label: &str) -> Self {
        if label.contains('H') {
            if label.to_lowercase().contains("tautau") {
                SampleKind::HiggsTauTau
            } else {
                SampleKind::HiggsWW
            }
        } else if label.contains("QCD") {
            SampleKind::Qcd
        } else if label.contains("VJets") {
            SampleKind::VJets
        } else if label.contains("Top") {
            SampleKind::Top
        } else {
            SampleKind::Unknown
        }
    }

    /// The classifier used for this kind, or [`None`] for [`SampleKind::Unknown`].
    pub fn classifier(&self) -> Option<Box<dyn Classifier>> {
        match self {
            SampleKind::HiggsWW => Some(HiggsMatcher::new(HiggsDecay::WW)),
            SampleKind::HiggsTauTau => Some(HiggsMatcher::new(HiggsDecay::TauTau)),
            SampleKind::VJets => Some(VMatcher::new()),
            SampleKind::Top => Some(TopMatcher::new()),
            SampleKind::Qcd => Some(QcdMatcher::new()),
            SampleKind::Unknown => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SampleKind::HiggsWW => "HiggsWW",
            SampleKind::HiggsTauTau => "HiggsTauTau",
            SampleKind::VJets => "VJets",
            SampleKind::Top => "Top",
            SampleKind::Qcd => "QCD",
            SampleKind::Unknown => "Unknown",
        }
    }
}

impl Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SampleKind {
    type Err = GenMatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleKind::ALL
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| GenMatchError::ParseError {
                name: s.to_string(),
                object: "SampleKind".to_string(),
            })
    }
}

/// Names of every variable any classifier can produce, plus [`GENJET_MASS`].
pub fn known_var_names() -> Vec<String> {
    let mut names: Vec<String> = SampleKind::ALL
        .iter()
        .filter_map(|kind| kind.classifier())
        .flat_map(|classifier| classifier.var_names())
        .collect();
    names.push(GENJET_MASS.to_string());
    names.sort();
    names.dedup();
    names
}

/// Labels the fat jets of a sample and assembles a fixed set of output variables.
///
/// The output always holds exactly the requested variables, in the requested order, so that
/// outputs of different samples share a schema. Variables which the sample's classifier does
/// not produce are filled with zeros.
#[derive(Clone)]
pub struct GenMatcher {
    kind: SampleKind,
    classifier: Option<Box<dyn Classifier>>,
    config: MatchingConfig,
}

impl GenMatcher {
    /// Create a [`GenMatcher`] for the given kind of sample.
    pub fn new(kind: SampleKind, config: MatchingConfig) -> Self {
        Self {
            kind,
            classifier: kind.classifier(),
            config,
        }
    }

    /// Create a [`GenMatcher`] for a sample given its dataset label (see
    /// [`SampleKind::from_label`]).
    pub fn from_label(label: &str, config: MatchingConfig) -> Self {
        let kind = SampleKind::from_label(label);
        debug!("sample label \"{}\" resolved to {}", label, kind);
        Self::new(kind, config)
    }

    /// The kind of sample this matcher labels.
    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// The working point passed to the classifier.
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Label every event and return the matched mask together with the variables named in
    /// `gen_labels`.
    ///
    /// Unknown samples are never matched. The mass of the generator jet matched to each fat jet
    /// is available as [`GENJET_MASS`] for every sample, and is missing for jets without one.
    /// Every column is flattened to plain floats, so a requested name has the same column type
    /// whichever classifier ran. Only columns with a missing entry stay nullable.
    pub fn run<S: AsRef<str>>(&self, events: &[GenEvent], gen_labels: &[S]) -> GenMatchOutput {
        let n_events = events.len();
        let (matched, mut produced) = match &self.classifier {
            Some(classifier) => {
                debug!("running {} on {} events", classifier.name(), n_events);
                classifier.classify_batch(events, &self.config)
            }
            None => {
                debug!("no classifier for {} samples", self.kind);
                (vec![false; n_events], GenVars::new())
            }
        };
        produced.insert(
            GENJET_MASS,
            GenColumn::Nullable(
                events
                    .iter()
                    .map(|event| event.jet.matched_gen.map(|p4| p4.m()))
                    .collect(),
            ),
        );

        let known = known_var_names();
        let mut vars: GenVars = gen_labels
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let column = produced.get(name).cloned().unwrap_or_else(|| {
                    if !known.iter().any(|known| known == name) {
                        warn!("\"{}\" is not produced by any classifier", name);
                    }
                    GenColumn::zeros(n_events)
                });
                (name.to_string(), column)
            })
            .collect();
        vars.flatten();
        debug!("selected {} of {} variables", vars.len(), produced.len());
        GenMatchOutput { matched, vars }
    }
}

/// Label the fat jets of a sample given its dataset label, keeping only the variables named in
/// `gen_labels`.
///
/// This is a shortcut for [`GenMatcher::from_label`] followed by [`GenMatcher::run`].
///
/// ```
/// use genmatch::{data::test_hww_event, tagger_gen_matching, GenColumn, MatchingConfig};
///
/// let events = vec![test_hww_event()];
/// let output = tagger_gen_matching(
///     &events,
///     &["fj_H_VV_munuqq", "fj_QCDbb"],
///     "GluGluHToWW",
///     &MatchingConfig::default(),
/// );
/// assert_eq!(output.matched, vec![true]);
/// assert_eq!(output.vars.get("fj_H_VV_munuqq"), Some(&GenColumn::Float(vec![1.0])));
/// assert_eq!(output.vars.get("fj_QCDbb"), Some(&GenColumn::Float(vec![0.0])));
/// ```
pub fn tagger_gen_matching<S: AsRef<str>>(
    events: &[GenEvent],
    gen_labels: &[S],
    label: &str,
    config: &MatchingConfig,
) -> GenMatchOutput {
    GenMatcher::from_label(label, *config).run(events, gen_labels)
}
