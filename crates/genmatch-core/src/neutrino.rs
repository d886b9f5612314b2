//! Reconstruction of the neutrino in a decay with a single invisible particle.
//!
//! The typical use is $`H\to WW^*\to q\bar{q}\ell\nu`$, where the visible system is the
//! two-prong jet plus the lepton and the parent mass is the Higgs mass (see
//! [`higgs_neutrino_p4`]). A leptonic $`W`$ decay works the same way with a lepton alone.
//!
//! Only the transverse components of the neutrino momentum are measured (as the missing
//! transverse momentum). The longitudinal component follows from requiring the visible system
//! and the neutrino to have the invariant mass of the parent, which gives a quadratic in
//! $`p_z^\nu`$:
//!
//! ```math
//! A\,p_z^2 + B\,p_z + C = 0,\quad
//! A = 4\left((p_z^\ell)^2 - E_\ell^2\right),\quad
//! B = 4a\,p_z^\ell,\quad
//! C = a^2 - 4E_\ell^2 (p_T^{\rm miss})^2
//! ```
//! with $`a = M^2 - m_\ell^2 + 2(p_x^\ell p_x^{\rm miss} + p_y^\ell p_y^{\rm miss})`$, where
//! $`\ell`$ stands for the whole visible system.
//!
//! When the discriminant is negative (the measured missing momentum is incompatible with an
//! on-shell parent) the real part $`-B/2A`$ is used. Otherwise the larger root is chosen.
//! Degenerate inputs which would produce a non-finite value yield $`p_z = 0`$.

use crate::{utils::vectors::Vec4, GenMatchError, GenMatchResult, MatchingConfig};

/// The longitudinal momentum of the neutrino in `parent_mass -> visible + neutrino`, where only
/// the transverse components of `met` are used.
pub fn neutrino_pz(visible: &Vec4, met: &Vec4, parent_mass: f64) -> f64 {
    let a = parent_mass * parent_mass - visible.m2()
        + 2.0 * (visible.px() * met.px() + visible.py() * met.py());
    let big_a = 4.0 * (visible.pz() * visible.pz() - visible.e() * visible.e());
    let big_b = 4.0 * a * visible.pz();
    let big_c = a * a - 4.0 * visible.e() * visible.e() * met.pt2();
    let delta = big_b * big_b - 4.0 * big_a * big_c;
    let pz = if delta < 0.0 {
        -big_b / (2.0 * big_a)
    } else {
        let root = delta.sqrt();
        let plus = (-big_b + root) / (2.0 * big_a);
        let minus = (-big_b - root) / (2.0 * big_a);
        plus.max(minus)
    };
    if pz.is_finite() {
        pz
    } else {
        0.0
    }
}

/// The massless neutrino four-momentum built from the transverse components of `met` and the
/// solved longitudinal momentum.
///
/// ```
/// use genmatch_core::{neutrino_p4, Vec4};
///
/// let muon = Vec4::from_pt_eta_phi_m(40.0, 0.3, 0.0, 0.105);
/// let met = Vec4::new(0.0, 40.0, 0.0, 40.0);
/// let nu = neutrino_p4(&muon, &met, 80.4);
/// assert!((nu + muon).m() > 80.0);
/// ```
pub fn neutrino_p4(visible: &Vec4, met: &Vec4, parent_mass: f64) -> Vec4 {
    Vec4::massless(met.px(), met.py(), neutrino_pz(visible, met, parent_mass))
}

/// [`neutrino_p4`] constrained to the Higgs mass of `config` (125 GeV by default).
///
/// ```
/// use genmatch_core::{neutrino::higgs_neutrino_p4, MatchingConfig, Vec4};
///
/// let visible = Vec4::from_pt_eta_phi_m(300.0, 0.2, 0.0, 60.0);
/// let met = Vec4::new(40.0, 10.0, 0.0, 41.2);
/// let nu = higgs_neutrino_p4(&visible, &met, &MatchingConfig::default());
/// assert!(((nu + visible).m() - 125.0).abs() < 1e-3);
/// ```
pub fn higgs_neutrino_p4(visible: &Vec4, met: &Vec4, config: &MatchingConfig) -> Vec4 {
    neutrino_p4(visible, met, config.higgs_mass)
}

/// Solve [`neutrino_p4`] for every pair of visible system and missing momentum.
///
/// # Errors
///
/// Returns [`GenMatchError::LengthMismatch`] if the two inputs have different lengths.
pub fn neutrino_p4_batch(
    visible: &[Vec4],
    met: &[Vec4],
    parent_mass: f64,
) -> GenMatchResult<Vec<Vec4>> {
    if visible.len() != met.len() {
        return Err(GenMatchError::LengthMismatch {
            context: "neutrino reconstruction".to_string(),
            expected: visible.len(),
            found: met.len(),
        });
    }
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        Ok(visible
            .par_iter()
            .zip(met.par_iter())
            .map(|(vis, met)| neutrino_p4(vis, met, parent_mass))
            .collect())
    }
    #[cfg(not(feature = "rayon"))]
    {
        Ok(visible
            .iter()
            .zip(met)
            .map(|(vis, met)| neutrino_p4(vis, met, parent_mass))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    use super::*;

    const W_MASS: f64 = 80.4;

    fn discriminant(visible: &Vec4, met: &Vec4, mass: f64) -> f64 {
        let a = mass * mass - visible.m2()
            + 2.0 * (visible.px() * met.px() + visible.py() * met.py());
        let big_a = 4.0 * (visible.pz() * visible.pz() - visible.e() * visible.e());
        let big_b = 4.0 * a * visible.pz();
        let big_c = a * a - 4.0 * visible.e() * visible.e() * met.pt2();
        big_b * big_b - 4.0 * big_a * big_c
    }

    #[test]
    fn test_recovers_parent_mass() {
        let mut rng = fastrand::Rng::with_seed(0);
        for _ in 0..500 {
            let lepton = Vec4::from_pt_eta_phi_m(
                20.0 + 200.0 * rng.f64(),
                4.0 * (rng.f64() - 0.5),
                TAU * (rng.f64() - 0.5),
                0.105,
            );
            let phi = TAU * (rng.f64() - 0.5);
            // place the true neutrino so that the pair is exactly on shell
            let nu_pt = 20.0 + 200.0 * rng.f64();
            let met = Vec4::massless(nu_pt * phi.cos(), nu_pt * phi.sin(), 0.0);
            let pz = neutrino_pz(&lepton, &met, W_MASS);
            let nu = Vec4::massless(met.px(), met.py(), pz);
            let mass = (lepton + nu).m();
            // only events whose transverse kinematics admit an on-shell parent are checked
            if discriminant(&lepton, &met, W_MASS) >= 0.0 {
                assert_relative_eq!(mass, W_MASS, epsilon = 1e-3, max_relative = 1e-6);
            } else {
                assert!(mass.is_finite());
            }
        }
    }

    #[test]
    fn test_recovers_higgs_mass_with_massive_visible_system() {
        let config = MatchingConfig::default();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut n_checked = 0;
        for _ in 0..500 {
            // two-prong jet plus lepton, well below the Higgs mass
            let visible = Vec4::from_pt_eta_phi_m(
                150.0 + 400.0 * rng.f64(),
                3.0 * (rng.f64() - 0.5),
                TAU * (rng.f64() - 0.5),
                20.0 + 80.0 * rng.f64(),
            );
            let phi = visible.phi() + 0.6 * (rng.f64() - 0.5);
            let nu_pt = 10.0 + 150.0 * rng.f64();
            let met = Vec4::massless(nu_pt * phi.cos(), nu_pt * phi.sin(), 0.0);
            let nu = higgs_neutrino_p4(&visible, &met, &config);
            assert_eq!(nu, neutrino_p4(&visible, &met, 125.0));
            let mass = (visible + nu).m();
            if discriminant(&visible, &met, config.higgs_mass) >= 0.0 {
                assert_relative_eq!(mass, 125.0, epsilon = 1e-3, max_relative = 1e-6);
                n_checked += 1;
            } else {
                assert!(mass.is_finite());
            }
        }
        assert!(n_checked > 0);
    }

    #[test]
    fn test_picks_larger_root() {
        let lepton = Vec4::from_pt_eta_phi_m(50.0, 1.0, 0.0, 0.0);
        let met = Vec4::massless(0.0, 30.0, 0.0);
        let pz = neutrino_pz(&lepton, &met, W_MASS);
        let a = W_MASS * W_MASS - lepton.m2()
            + 2.0 * (lepton.px() * met.px() + lepton.py() * met.py());
        let big_a = 4.0 * (lepton.pz() * lepton.pz() - lepton.e() * lepton.e());
        let big_b = 4.0 * a * lepton.pz();
        let big_c = a * a - 4.0 * lepton.e() * lepton.e() * met.pt2();
        let root = (big_b * big_b - 4.0 * big_a * big_c).sqrt();
        let larger = ((-big_b + root) / (2.0 * big_a)).max((-big_b - root) / (2.0 * big_a));
        assert_relative_eq!(pz, larger, max_relative = 1e-12);
    }

    #[test]
    fn test_negative_discriminant_uses_real_part() {
        // back-to-back lepton and missing momentum far above the parent mass
        let lepton = Vec4::from_pt_eta_phi_m(200.0, 0.5, 0.0, 0.0);
        let met = Vec4::massless(-200.0, 0.0, 0.0);
        let a = W_MASS * W_MASS - lepton.m2()
            + 2.0 * (lepton.px() * met.px() + lepton.py() * met.py());
        let big_a = 4.0 * (lepton.pz() * lepton.pz() - lepton.e() * lepton.e());
        let big_b = 4.0 * a * lepton.pz();
        let big_c = a * a - 4.0 * lepton.e() * lepton.e() * met.pt2();
        assert!(big_b * big_b - 4.0 * big_a * big_c < 0.0);
        assert_relative_eq!(
            neutrino_pz(&lepton, &met, W_MASS),
            -big_b / (2.0 * big_a),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_degenerate_inputs_are_finite() {
        let zero = Vec4::default();
        assert_eq!(neutrino_pz(&zero, &zero, W_MASS), 0.0);
        let nu = neutrino_p4(&zero, &Vec4::massless(10.0, 0.0, 0.0), W_MASS);
        assert!(nu.e().is_finite());
        assert_eq!(nu.pz(), 0.0);
    }

    #[test]
    fn test_batch() {
        let leptons = vec![
            Vec4::from_pt_eta_phi_m(50.0, 1.0, 0.0, 0.0),
            Vec4::from_pt_eta_phi_m(80.0, -0.5, 2.0, 0.0),
        ];
        let mets = vec![Vec4::massless(0.0, 30.0, 0.0), Vec4::massless(20.0, 5.0, 0.0)];
        let batch = neutrino_p4_batch(&leptons, &mets, W_MASS).unwrap();
        assert_eq!(batch.len(), 2);
        for ((lepton, met), nu) in leptons.iter().zip(&mets).zip(&batch) {
            assert_eq!(*nu, neutrino_p4(lepton, met, W_MASS));
        }
        assert!(matches!(
            neutrino_p4_batch(&leptons, &mets[..1], W_MASS),
            Err(GenMatchError::LengthMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }
}
