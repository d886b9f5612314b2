//! Absolute PDG codes. Antiparticles carry the negative code; every comparison in this crate is
//! made on the absolute value.

pub const DOWN: i32 = 1;
pub const CHARM: i32 = 4;
pub const BOTTOM: i32 = 5;
pub const TOP: i32 = 6;
pub const GLUON: i32 = 21;

pub const ELECTRON: i32 = 11;
pub const ELECTRON_NEUTRINO: i32 = 12;
pub const MUON: i32 = 13;
pub const MUON_NEUTRINO: i32 = 14;
pub const TAU: i32 = 15;
pub const TAU_NEUTRINO: i32 = 16;

pub const PHOTON: i32 = 22;
pub const Z_BOSON: i32 = 23;
pub const W_BOSON: i32 = 24;
pub const HIGGS: i32 = 25;

pub const PI_ZERO: i32 = 111;
pub const PI_PLUS: i32 = 211;
pub const ETA: i32 = 221;

/// Charged leptons.
pub const LEPTONS: [i32; 3] = [ELECTRON, MUON, TAU];
/// Neutrinos of all three generations.
pub const NEUTRINOS: [i32; 3] = [ELECTRON_NEUTRINO, MUON_NEUTRINO, TAU_NEUTRINO];
/// Light hadrons which mark a hadronic tau decay.
pub const TAU_HADRONS: [i32; 3] = [PI_PLUS, ETA, PI_ZERO];
/// Gluons and the five light-enough quark flavours.
pub const PARTONS: [i32; 6] = [GLUON, DOWN, 2, 3, CHARM, BOTTOM];

/// Returns `true` for the five quark flavours lighter than the top (`1 <= |id| <= 5`).
pub fn is_light_quark(pdg_id: i32) -> bool {
    (DOWN..=BOTTOM).contains(&pdg_id.abs())
}

/// Returns `true` for charged leptons.
pub fn is_lepton(pdg_id: i32) -> bool {
    LEPTONS.contains(&pdg_id.abs())
}

/// Returns `true` for neutrinos.
pub fn is_neutrino(pdg_id: i32) -> bool {
    NEUTRINOS.contains(&pdg_id.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_predicates() {
        assert!(is_light_quark(-5));
        assert!(is_light_quark(1));
        assert!(!is_light_quark(6));
        assert!(!is_light_quark(0));
        assert!(is_lepton(-13));
        assert!(!is_lepton(14));
        assert!(is_neutrino(-16));
        assert!(!is_neutrino(15));
    }
}
