use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{
    utils::{
        enums::{GenFlag, StatusFlags},
        geometry::Direction,
        pid::PdgIds,
        vectors::Vec4,
    },
    GenMatchError, GenMatchResult,
};

/// Methods for writing matching output to Parquet files
pub mod io;

/// An event that can be used to test the Higgs classifiers: a boosted
/// $`H\to W^+W^-\to (q\bar{q}')(\mu\bar{\nu})`$ decay with the fat jet placed on the
/// hadronically-decaying $`W`$.
///
/// | index | particle | mother |
/// |-------|----------|--------|
/// | 0 | $`H`$ (25) | - |
/// | 1 | $`W^+`$ (24) | 0 |
/// | 2 | $`W^-`$ (-24) | 0 |
/// | 3 | $`d`$ (1) | 1 |
/// | 4 | $`\bar{u}`$ (-2) | 1 |
/// | 5 | $`\mu^-`$ (13) | 2 |
/// | 6 | $`\bar{\nu}_\mu`$ (-14) | 2 |
pub fn test_hww_event() -> GenEvent {
    let hard = StatusFlags::from_flags([
        GenFlag::IsHardProcess,
        GenFlag::FromHardProcess,
        GenFlag::IsLastCopy,
    ]);
    let rows = vec![
        GenParticleData::new(25, Vec4::from_pt_eta_phi_m(400.0, 0.0, 0.0, 125.0), hard, None),
        GenParticleData::new(
            24,
            Vec4::from_pt_eta_phi_m(250.0, 0.1, 0.1, 80.4),
            hard,
            Some(0),
        ),
        GenParticleData::new(
            -24,
            Vec4::from_pt_eta_phi_m(170.0, -0.15, -0.3, 80.4),
            hard,
            Some(0),
        ),
        GenParticleData::new(1, Vec4::from_pt_eta_phi_m(130.0, 0.15, 0.25, 0.0), hard, Some(1)),
        GenParticleData::new(
            -2,
            Vec4::from_pt_eta_phi_m(120.0, 0.05, -0.05, 0.0),
            hard,
            Some(1),
        ),
        GenParticleData::new(
            13,
            Vec4::from_pt_eta_phi_m(100.0, -0.25, -0.35, 0.105),
            hard,
            Some(2),
        ),
        GenParticleData::new(
            -14,
            Vec4::from_pt_eta_phi_m(70.0, -0.05, -0.2, 0.0),
            hard,
            Some(2),
        ),
    ];
    let particles = GenParticles::new(rows).unwrap_or_default();
    GenEvent::new(
        particles,
        FatJet::new(Vec4::from_pt_eta_phi_m(250.0, 0.1, 0.1, 80.0))
            .with_matched_gen(Vec4::from_pt_eta_phi_m(245.0, 0.1, 0.1, 78.0)),
    )
}

/// An event that can be used to test the QCD classifier: a gluon recoiling against a bottom
/// quark, with the fat jet on the gluon and carrying two $`B`$ hadrons and one $`D`$ hadron.
pub fn test_qcd_event() -> GenEvent {
    let rows = vec![
        GenParticleData::new(
            21,
            Vec4::from_pt_eta_phi_m(300.0, 0.5, 1.0, 0.0),
            StatusFlags::default(),
            None,
        ),
        GenParticleData::new(
            5,
            Vec4::from_pt_eta_phi_m(200.0, -1.5, -2.0, 4.8),
            StatusFlags::default(),
            None,
        ),
    ];
    let particles = GenParticles::new(rows).unwrap_or_default();
    GenEvent::new(
        particles,
        FatJet::new(Vec4::from_pt_eta_phi_m(290.0, 0.6, 1.1, 40.0))
            .with_hadron_counts(2, 1)
            .with_matched_gen(Vec4::from_pt_eta_phi_m(295.0, 0.55, 1.05, 35.0)),
    )
}

/// A single generator-level particle as it is read from an ntuple row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenParticleData {
    /// The signed PDG code.
    pub pdg_id: i32,
    /// The four-momentum.
    pub p4: Vec4,
    /// The generator status flags.
    pub status_flags: StatusFlags,
    /// Index of the mother particle within the same event, if it has one.
    pub mother: Option<usize>,
}

impl GenParticleData {
    pub fn new(pdg_id: i32, p4: Vec4, status_flags: StatusFlags, mother: Option<usize>) -> Self {
        Self {
            pdg_id,
            p4,
            status_flags,
            mother,
        }
    }
}

/// The generator-level particles of one event, stored column-wise with the decay tree resolved
/// into index lists.
///
/// Besides the raw mother/children links, every particle records its *distinct parent* (the
/// nearest ancestor with a different PDG code, skipping the copies a generator makes of the
/// same particle as it radiates or recoils) and its *distinct children* (the particles which
/// have it as their distinct parent).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenParticles {
    pdg_ids: Vec<i32>,
    p4s: Vec<Vec4>,
    flags: Vec<StatusFlags>,
    mothers: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    distinct_parents: Vec<Option<usize>>,
    distinct_children: Vec<Vec<usize>>,
}

impl GenParticles {
    /// Build the particle tree from rows. Fails if any mother index does not point inside the
    /// event.
    pub fn new(rows: Vec<GenParticleData>) -> GenMatchResult<Self> {
        let n_particles = rows.len();
        for (index, row) in rows.iter().enumerate() {
            if let Some(mother) = row.mother {
                if mother >= n_particles {
                    return Err(GenMatchError::InvalidParticleIndex {
                        index,
                        mother: mother as i64,
                        n_particles,
                    });
                }
            }
        }
        let pdg_ids: Vec<i32> = rows.iter().map(|row| row.pdg_id).collect();
        let p4s = rows.iter().map(|row| row.p4).collect();
        let flags = rows.iter().map(|row| row.status_flags).collect();
        let mothers: Vec<Option<usize>> = rows.iter().map(|row| row.mother).collect();

        let mut children = vec![Vec::new(); n_particles];
        for (index, mother) in mothers.iter().enumerate() {
            if let Some(mother) = mother {
                children[*mother].push(index);
            }
        }
        let distinct_parents: Vec<Option<usize>> = (0..n_particles)
            .map(|index| Self::find_distinct_parent(&pdg_ids, &mothers, index))
            .collect();
        let mut distinct_children = vec![Vec::new(); n_particles];
        for (index, parent) in distinct_parents.iter().enumerate() {
            if let Some(parent) = parent {
                distinct_children[*parent].push(index);
            }
        }
        Ok(Self {
            pdg_ids,
            p4s,
            flags,
            mothers,
            children,
            distinct_parents,
            distinct_children,
        })
    }

    /// Build the particle tree from the NanoAOD columns `pdgId`, the four-momenta,
    /// `statusFlags` and `genPartIdxMother`. A negative mother index means "no mother".
    pub fn from_mother_indices(
        pdg_ids: &[i32],
        p4s: &[Vec4],
        status_flags: &[i32],
        mother_indices: &[i32],
    ) -> GenMatchResult<Self> {
        let n_particles = pdg_ids.len();
        for (context, found) in [
            ("GenPart p4", p4s.len()),
            ("GenPart statusFlags", status_flags.len()),
            ("GenPart genPartIdxMother", mother_indices.len()),
        ] {
            if found != n_particles {
                return Err(GenMatchError::LengthMismatch {
                    context: context.to_string(),
                    expected: n_particles,
                    found,
                });
            }
        }
        let rows = pdg_ids
            .iter()
            .zip(p4s)
            .zip(status_flags.iter().zip(mother_indices))
            .enumerate()
            .map(|(index, ((pdg_id, p4), (bits, mother)))| {
                let mother = match usize::try_from(*mother) {
                    Ok(mother) if mother < n_particles => Some(mother),
                    Ok(_) => {
                        return Err(GenMatchError::InvalidParticleIndex {
                            index,
                            mother: *mother as i64,
                            n_particles,
                        })
                    }
                    Err(_) => None,
                };
                Ok(GenParticleData::new(
                    *pdg_id,
                    *p4,
                    StatusFlags::from_bits(*bits),
                    mother,
                ))
            })
            .collect::<GenMatchResult<Vec<_>>>()?;
        Self::new(rows)
    }

    // Bounded by the event size so a malformed (cyclic) chain of copies terminates.
    fn find_distinct_parent(
        pdg_ids: &[i32],
        mothers: &[Option<usize>],
        index: usize,
    ) -> Option<usize> {
        let pdg_id = pdg_ids[index];
        let mut current = mothers[index];
        for _ in 0..=pdg_ids.len() {
            match current {
                Some(mother) if pdg_ids[mother] == pdg_id => current = mothers[mother],
                other => return other,
            }
        }
        None
    }

    /// Number of particles in the event.
    pub fn len(&self) -> usize {
        self.pdg_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pdg_ids.is_empty()
    }

    /// A view of the particle at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<GenParticle<'_>> {
        (index < self.len()).then_some(GenParticle {
            particles: self,
            index,
        })
    }

    /// Iterate over views of every particle, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = GenParticle<'_>> + '_ {
        (0..self.len()).map(move |index| GenParticle {
            particles: self,
            index,
        })
    }

    /// Every particle whose absolute PDG code matches `pdg_ids` and which carries all of
    /// `flags`.
    pub fn select<P: Into<PdgIds>>(&self, pdg_ids: P, flags: &[GenFlag]) -> Vec<GenParticle<'_>> {
        let pdg_ids = pdg_ids.into();
        self.iter()
            .filter(|particle| pdg_ids.matches(particle.pdg_id()) && particle.has_flags(flags))
            .collect()
    }
}

/// A borrowed view of one particle inside a [`GenParticles`] tree.
#[derive(Copy, Clone, Debug)]
pub struct GenParticle<'a> {
    particles: &'a GenParticles,
    index: usize,
}

impl PartialEq for GenParticle<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.particles, other.particles) && self.index == other.index
    }
}

impl Display for GenParticle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GenParticle(index = {}, pdg_id = {}, p4 = {})",
            self.index,
            self.pdg_id(),
            self.p4()
        )
    }
}

impl<'a> GenParticle<'a> {
    fn view(&self, index: usize) -> GenParticle<'a> {
        GenParticle {
            particles: self.particles,
            index,
        }
    }

    /// Position of the particle in its event.
    pub fn index(&self) -> usize {
        self.index
    }
    /// The signed PDG code.
    pub fn pdg_id(&self) -> i32 {
        self.particles.pdg_ids[self.index]
    }
    pub fn abs_pdg_id(&self) -> i32 {
        self.pdg_id().abs()
    }
    pub fn p4(&self) -> Vec4 {
        self.particles.p4s[self.index]
    }
    pub fn pt(&self) -> f64 {
        self.p4().pt()
    }
    pub fn mass(&self) -> f64 {
        self.p4().m()
    }
    pub fn status_flags(&self) -> StatusFlags {
        self.particles.flags[self.index]
    }
    /// `true` if the particle carries every one of `flags`.
    pub fn has_flags(&self, flags: &[GenFlag]) -> bool {
        self.status_flags().contains_all(flags)
    }

    /// The direct mother.
    pub fn parent(&self) -> Option<GenParticle<'a>> {
        self.particles.mothers[self.index].map(|index| self.view(index))
    }

    /// The nearest ancestor with a different PDG code.
    pub fn distinct_parent(&self) -> Option<GenParticle<'a>> {
        self.particles.distinct_parents[self.index].map(|index| self.view(index))
    }

    /// The direct daughters, in storage order.
    pub fn children(&self) -> Vec<GenParticle<'a>> {
        self.particles.children[self.index]
            .iter()
            .map(|index| self.view(*index))
            .collect()
    }

    /// Particles whose distinct parent is this particle, in storage order.
    pub fn distinct_children(&self) -> Vec<GenParticle<'a>> {
        self.particles.distinct_children[self.index]
            .iter()
            .map(|index| self.view(*index))
            .collect()
    }

    /// The first descendants with a PDG code different from this particle's, found by
    /// descending through the direct children and passing through every copy of the particle
    /// itself.
    ///
    /// Unlike [`GenParticle::distinct_children`] this follows the particle's own copies down
    /// the chain, so it returns the decay products of the last copy even when called on the
    /// first one.
    pub fn distinct_children_deep(&self) -> Vec<GenParticle<'a>> {
        let particles = self.particles;
        let pdg_id = self.pdg_id();
        let mut visited = vec![false; particles.len()];
        visited[self.index] = true;
        let mut stack: Vec<usize> = particles.children[self.index].iter().rev().copied().collect();
        let mut found = Vec::new();
        while let Some(index) = stack.pop() {
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            if particles.pdg_ids[index] == pdg_id {
                stack.extend(particles.children[index].iter().rev());
            } else {
                found.push(self.view(index));
            }
        }
        found
    }
}

impl Direction for GenParticle<'_> {
    fn eta(&self) -> f64 {
        self.p4().eta()
    }
    fn phi(&self) -> f64 {
        self.p4().phi()
    }
}

/// A large-radius reconstructed jet together with the generator-level information attached to
/// it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FatJet {
    /// The jet four-momentum.
    pub p4: Vec4,
    /// Number of $`B`$ hadrons clustered in the jet.
    pub n_b_hadrons: u32,
    /// Number of $`D`$ hadrons clustered in the jet.
    pub n_c_hadrons: u32,
    /// The four-momentum of the generator-level jet matched to this one, if any.
    pub matched_gen: Option<Vec4>,
}

impl FatJet {
    pub fn new(p4: Vec4) -> Self {
        Self {
            p4,
            ..Default::default()
        }
    }

    pub fn with_hadron_counts(mut self, n_b_hadrons: u32, n_c_hadrons: u32) -> Self {
        self.n_b_hadrons = n_b_hadrons;
        self.n_c_hadrons = n_c_hadrons;
        self
    }

    pub fn with_matched_gen(mut self, p4: Vec4) -> Self {
        self.matched_gen = Some(p4);
        self
    }
}

impl Direction for FatJet {
    fn eta(&self) -> f64 {
        self.p4.eta()
    }
    fn phi(&self) -> f64 {
        self.p4.phi()
    }
}

/// Everything the classifiers need to know about one event: its generator-level particles, the
/// fat jet under study and, optionally, the selected reconstructed lepton.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenEvent {
    pub particles: GenParticles,
    pub jet: FatJet,
    pub candidate_lepton: Option<Vec4>,
}

impl GenEvent {
    pub fn new(particles: GenParticles, jet: FatJet) -> Self {
        Self {
            particles,
            jet,
            candidate_lepton: None,
        }
    }

    pub fn with_candidate_lepton(mut self, p4: Vec4) -> Self {
        self.candidate_lepton = Some(p4);
        self
    }
}
