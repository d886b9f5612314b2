use crate::data::GenParticle;

/// One or several absolute PDG codes to select on.
///
/// Particles are compared by the absolute value of their own code, so `PdgIds::from(24)`
/// selects both $`W^+`$ and $`W^-`$.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PdgIds {
    /// A single code.
    Single(i32),
    /// Any of the listed codes.
    Any(Vec<i32>),
}

impl PdgIds {
    /// `true` if `|pdg_id|` equals the single code, or any of the listed codes.
    pub fn matches(&self, pdg_id: i32) -> bool {
        let id = pdg_id.abs();
        match self {
            PdgIds::Single(code) => id == *code,
            PdgIds::Any(codes) => codes.iter().any(|code| id == *code),
        }
    }
}

impl From<i32> for PdgIds {
    fn from(value: i32) -> Self {
        PdgIds::Single(value)
    }
}

impl From<&[i32]> for PdgIds {
    fn from(value: &[i32]) -> Self {
        PdgIds::Any(value.to_vec())
    }
}

impl<const N: usize> From<[i32; N]> for PdgIds {
    fn from(value: [i32; N]) -> Self {
        PdgIds::Any(value.to_vec())
    }
}

impl From<Vec<i32>> for PdgIds {
    fn from(value: Vec<i32>) -> Self {
        PdgIds::Any(value)
    }
}

/// Selection mask with one entry per particle: `true` where the particle's absolute code matches
/// `pdg_ids`.
pub fn pid_mask<P: Into<PdgIds>>(particles: &[GenParticle<'_>], pdg_ids: P) -> Vec<bool> {
    let pdg_ids = pdg_ids.into();
    particles
        .iter()
        .map(|particle| pdg_ids.matches(particle.pdg_id()))
        .collect()
}

/// Selection mask with one entry per *group* of particles: `true` only where every particle in
/// the group matches `pdg_ids` (an empty group passes).
///
/// This is the reduction used when a whole set of siblings, for example every daughter of a
/// boson, must be of the requested species.
pub fn pid_mask_all<'a, G, P>(groups: &[G], pdg_ids: P) -> Vec<bool>
where
    G: AsRef<[GenParticle<'a>]>,
    P: Into<PdgIds>,
{
    let pdg_ids = pdg_ids.into();
    groups
        .iter()
        .map(|group| {
            group
                .as_ref()
                .iter()
                .all(|particle| pdg_ids.matches(particle.pdg_id()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GenParticleData, GenParticles};
    use crate::utils::{enums::StatusFlags, pdg, vectors::Vec4};

    fn particles(ids: &[i32]) -> GenParticles {
        GenParticles::new(
            ids.iter()
                .map(|id| GenParticleData {
                    pdg_id: *id,
                    p4: Vec4::default(),
                    status_flags: StatusFlags::default(),
                    mother: None,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_code_uses_absolute_value() {
        let event = particles(&[24, -24, 23, 25]);
        let all: Vec<_> = event.iter().collect();
        assert_eq!(
            pid_mask(&all, pdg::W_BOSON),
            vec![true, true, false, false]
        );
    }

    #[test]
    fn test_code_list_is_a_logical_or() {
        let event = particles(&[1, -5, 21, 11, 6]);
        let all: Vec<_> = event.iter().collect();
        assert_eq!(
            pid_mask(&all, pdg::PARTONS),
            vec![true, true, true, false, false]
        );
        assert_eq!(pid_mask(&all, vec![11, 6]), vec![false, false, false, true, true]);
    }

    #[test]
    fn test_all_along_groups() {
        let event = particles(&[1, -2, 13, -14, 3, 4]);
        let all: Vec<_> = event.iter().collect();
        let groups = vec![all[0..2].to_vec(), all[2..4].to_vec(), all[4..6].to_vec(), vec![]];
        assert_eq!(
            pid_mask_all(&groups, [1, 2, 3, 4, 5]),
            vec![true, false, true, true]
        );
    }
}
